pub mod config;
pub mod extractor;
pub mod fallback;
pub mod parser;
pub mod pipeline;
pub mod scraper;
pub mod types;
pub mod utils;
pub mod validator;

pub use config::PipelineConfig;
pub use pipeline::{DataSource, FallbackReason, SquadData, SquadPipeline};
pub use scraper::WebScraper;
