pub mod core;
pub mod http;
pub mod parser;
pub mod scrapers;
pub mod spiders;
pub mod stats;
pub mod storage;

pub use crate::core::Crawler;
pub use crate::core::{ScraperError, ScraperResult, Spider};
pub use http::{HttpRequest, HttpResponse};
pub use parser::LinkExtractor;
pub use scrapers::Scraper;
pub use stats::StatsTracker;
pub use storage::DiskStorage;
