pub mod config;
pub mod crawler;
pub mod extractor;
pub mod logger;
pub mod utils;

pub use config::{Config, Overrides};
pub use crawler::{ComicCrawler, RunSummary};
pub use utils::sanitize_filename;
