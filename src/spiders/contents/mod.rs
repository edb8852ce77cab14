//! Mirrors the public hitachi.co.jp sections to disk.
//!
//! Every page inside the allowed domain is saved under
//! `storage/<host>/<section>/<filename>`, and every link on it is requested
//! twice: once as a page to crawl further and once as a file to download.

mod policy;

pub use policy::{is_executable, MatchMode, SkipList};

use crate::core::{ParseResult, Spider, SpiderCallback, SpiderConfig, SpiderResponse};
use crate::http::{HttpRequest, HttpResponse};
use crate::parser::LinkExtractor;
use crate::storage::{extract_filename, StorageBackend};
use crate::{ScraperResult, StatsTracker};
use async_trait::async_trait;
use log::{debug, error, info};
use serde_json::json;
use std::sync::Arc;
use url::Url;

pub const START_URLS: [&str; 3] = [
    "https://www.hitachi.co.jp/New/cnews/index.html",
    "https://www.hitachi.co.jp/IR/index.html",
    "https://www.hitachi.co.jp/sustainability/index.html",
];

pub const ALLOWED_DOMAIN: &str = "hitachi.co.jp";

pub const SKIP_URLS: [&str; 4] = [
    "https://itpfdoc.hitachi.co.jp/manuals",
    "https://itpfdoc.hitachi.co.jp/Pages",
    "https://www.hitachi.co.jp/support/inquiry/index.html",
    "https://www.hitachi.co.jp/recruit/index.html",
];

pub const STORAGE_ROOT: &str = "storage";

pub struct ContentsSpider {
    config: SpiderConfig,
    start_urls: Vec<Url>,
    allowed_domains: Vec<String>,
    skip_list: SkipList,
    links: LinkExtractor,
    storage: Box<dyn StorageBackend>,
    stats: Arc<StatsTracker>,
}

impl ContentsSpider {
    pub fn new(storage: Box<dyn StorageBackend>) -> ScraperResult<Self> {
        let start_urls = START_URLS
            .iter()
            .map(|url| Url::parse(url))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config: SpiderConfig::default(),
            start_urls,
            allowed_domains: vec![ALLOWED_DOMAIN.to_string()],
            skip_list: SkipList::new(SKIP_URLS),
            links: LinkExtractor::new()?,
            storage,
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_start_urls(mut self, start_urls: Vec<Url>) -> Self {
        self.start_urls = start_urls;
        self
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn with_skip_list(mut self, skip_list: SkipList) -> Self {
        self.skip_list = skip_list;
        self
    }

    /// Reports saves and skips into the crawler's tracker.
    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn should_skip_url(&self, url: &Url) -> bool {
        self.skip_list.should_skip_url(url)
    }

    async fn parse_page(&self, response: &HttpResponse) -> ScraperResult<ParseResult> {
        let url = &response.url;
        let depth = response.from_request.depth + 1;
        let links = self.links.extract(response);

        if self.should_skip_url(url) {
            info!("Skipping URL: {}", url);
            self.stats.increment_skipped_urls();
            // Skipped pages are still crawled through, but nothing is downloaded from them.
            let requests = self.follow(url, &links, depth, &[SpiderCallback::ParsePage])?;
            return Ok(ParseResult::Continue(requests));
        }

        self.save(response).await?;

        let requests = self.follow(
            url,
            &links,
            depth,
            &[SpiderCallback::ParsePage, SpiderCallback::DownloadFile],
        )?;
        debug!("{} yielded {} requests", url, requests.len());
        Ok(ParseResult::Continue(requests))
    }

    async fn download_file(&self, response: &HttpResponse) -> ScraperResult<ParseResult> {
        let url = &response.url;
        if self.should_skip_url(url) {
            info!("Skipping URL: {}", url);
            self.stats.increment_skipped_urls();
            return Ok(ParseResult::Skip);
        }

        let filename = extract_filename(url);
        if is_executable(filename) {
            info!(
                "Skipping download of {} due to '.exe' extension",
                filename
            );
            self.stats.increment_skipped_executables();
            return Ok(ParseResult::Skip);
        }

        self.save(response).await?;
        Ok(ParseResult::Skip)
    }

    async fn save(&self, response: &HttpResponse) -> ScraperResult<()> {
        let path = self
            .storage
            .store(&response.url, &response.raw_body)
            .await?;
        self.stats.record_saved(response.raw_body.len());
        debug!("Saved {} to {}", response.url, path.display());
        Ok(())
    }

    fn follow(
        &self,
        parent: &Url,
        links: &[Url],
        depth: usize,
        callbacks: &[SpiderCallback],
    ) -> ScraperResult<Vec<HttpRequest>> {
        let mut requests = Vec::with_capacity(links.len() * callbacks.len());
        for callback in callbacks {
            for link in links {
                let request = HttpRequest::new(link.clone(), callback.clone(), depth)
                    .with_meta(json!({
                        "parent_url": parent.as_str(),
                        "parent_depth": depth - 1,
                    }))?;
                requests.push(request);
            }
        }
        Ok(requests)
    }
}

#[async_trait]
impl Spider for ContentsSpider {
    fn name(&self) -> String {
        "contents".to_string()
    }

    fn start_urls(&self) -> Vec<Url> {
        self.start_urls.clone()
    }

    fn allowed_domains(&self) -> Vec<String> {
        self.allowed_domains.clone()
    }

    fn config(&self) -> &SpiderConfig {
        &self.config
    }

    fn set_config(&mut self, config: SpiderConfig) {
        self.config = config;
    }

    async fn parse(&self, spider_response: SpiderResponse) -> ScraperResult<ParseResult> {
        match spider_response.callback {
            SpiderCallback::ParsePage => self.parse_page(&spider_response.response).await,
            SpiderCallback::DownloadFile => self.download_file(&spider_response.response).await,
            SpiderCallback::Custom(ref name) => {
                error!("Unhandled custom callback: {}", name);
                Ok(ParseResult::Skip)
            }
        }
    }
}
