mod crawling;
mod errors;
pub mod retry;
pub mod spider;

pub use crawling::{url_is_in_domains, Crawler};
pub use errors::{ScraperError, ScraperResult};
pub use spider::{ParseResult, Spider, SpiderCallback, SpiderConfig, SpiderResponse};
