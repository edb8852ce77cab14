use anyhow::Context;
use contents_spider::core::retry::RetryConfig;
use contents_spider::core::SpiderConfig;
use contents_spider::scrapers::HttpScraper;
use contents_spider::spiders::contents::{ContentsSpider, STORAGE_ROOT};
use contents_spider::{Crawler, DiskStorage, Spider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("contents_spider", log::LevelFilter::Info)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let spider_config = SpiderConfig::default()
        .with_retry(RetryConfig::transient_errors())
        .with_concurrency(16)
        .with_allow_url_revisit(false);

    let storage = DiskStorage::new(STORAGE_ROOT)
        .with_context(|| format!("failed to create storage root {STORAGE_ROOT:?}"))?;

    let scraper = HttpScraper::new().context("failed to build HTTP client")?;
    let crawler = Crawler::new(Box::new(scraper));

    let spider = ContentsSpider::new(Box::new(storage))?
        .with_stats(crawler.stats())
        .with_config(spider_config);

    crawler.run(spider).await?;

    Ok(())
}
