use crate::pipeline::{SquadData, SquadPipeline};

use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::fmt::Display;
use std::time::Duration;

pub const DEFAULT_SQUAD_URL: &str =
    "https://www.transfermarkt.es/estac-troyes/kader/verein/1095/plus/1";
pub const DEFAULT_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    pipeline: SquadPipeline,
}

impl WebScraper {
    pub fn new(pipeline: SquadPipeline) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("es-ES,es;q=0.9,en;q=0.5"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, pipeline })
    }

    pub fn pipeline(&self) -> &SquadPipeline {
        &self.pipeline
    }

    pub async fn fetch_squad_page(&self, url: &str) -> Result<String, ScraperError> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        if html.trim().is_empty() {
            return Err(ScraperError::EmptyResponse(url.to_string()));
        }
        Ok(html)
    }

    /// Fetches and resolves the squad page up to `attempts` times, returning
    /// the first accepted scrape or else the last attempt's fallback.
    pub async fn fetch_squad(&self, url: &str, attempts: u32, today: NaiveDate) -> SquadData {
        log::info!("Fetching squad page: {}", url);
        resolve_with_retries(&self.pipeline, attempts, today, || self.fetch_squad_page(url)).await
    }
}

/// Runs `fetch` until the pipeline accepts its page or `attempts` run out.
/// `attempts` below one is treated as one.
pub async fn resolve_with_retries<F, Fut, E>(
    pipeline: &SquadPipeline,
    attempts: u32,
    today: NaiveDate,
    mut fetch: F,
) -> SquadData
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        log::info!("Scrape attempt {}/{}", attempt, attempts);
        let data = pipeline.resolve(fetch().await, today);

        if !data.is_fallback() || attempt >= attempts {
            return data;
        }
        attempt += 1;
    }
}
