use std::fmt::Display;

use crate::config::PipelineConfig;
use crate::extractor::extract_players;
use crate::fallback::fallback_dataset;
use crate::types::PlayerRecord;
use crate::validator::Rejection;

use chrono::NaiveDate;

fn join_rejections(rejections: &[Rejection]) -> String {
    rejections
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a pass served the fallback dataset. For logs only, never shown as a failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FallbackReason {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("no player rows extracted")]
    NoRows,
    #[error("scrape rejected: {}", join_rejections(.0))]
    Rejected(Vec<Rejection>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Scraped,
    Fallback(FallbackReason),
}

/// The dataset a pass resolved to, plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadData {
    pub records: Vec<PlayerRecord>,
    pub source: DataSource,
}

impl SquadData {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DataSource::Fallback(_))
    }
}

/// Extraction, validation and fallback for one squad page. Every path
/// resolves to a dataset.
#[derive(Debug, Clone, Default)]
pub struct SquadPipeline {
    config: PipelineConfig,
}

impl SquadPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolves the outcome of a fetch: a failed fetch goes straight to fallback.
    pub fn resolve<E: Display>(&self, fetched: Result<String, E>, today: NaiveDate) -> SquadData {
        match fetched {
            Ok(html) => self.run(&html, today),
            Err(e) => self.fallback(FallbackReason::FetchFailed(e.to_string()), today),
        }
    }

    pub fn run(&self, html: &str, today: NaiveDate) -> SquadData {
        let records = match extract_players(html, &self.config, today) {
            Ok(records) => records,
            Err(e) => return self.fallback(FallbackReason::ExtractionFailed(e.to_string()), today),
        };

        if records.is_empty() {
            return self.fallback(FallbackReason::NoRows, today);
        }

        match self.config.validation.check(&records) {
            Ok(()) => {
                log::info!("Scraped dataset accepted with {} player(s)", records.len());
                SquadData {
                    records,
                    source: DataSource::Scraped,
                }
            }
            Err(rejections) => self.fallback(FallbackReason::Rejected(rejections), today),
        }
    }

    pub fn fallback(&self, reason: FallbackReason, today: NaiveDate) -> SquadData {
        log::warn!("Serving fallback dataset, {}", reason);
        SquadData {
            records: fallback_dataset(today, &self.config.contract_window),
            source: DataSource::Fallback(reason),
        }
    }
}
