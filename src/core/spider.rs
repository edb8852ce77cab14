use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::retry::RetryConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::ScraperResult;

const DEFAULT_CONCURRENCY: usize = 16;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Names the handler a fetched response is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpiderCallback {
    ParsePage,
    DownloadFile,
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct SpiderResponse {
    pub response: HttpResponse,
    pub callback: SpiderCallback,
}

#[derive(Debug)]
pub enum ParseResult {
    Continue(Vec<HttpRequest>),
    Skip,
    Stop,
}

#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// `None` follows links without a depth bound.
    pub max_depth: Option<usize>,
    pub max_concurrency: usize,
    pub allow_url_revisit: bool,
    pub headers: Vec<(String, String)>,
    pub request_timeout: Duration,
    pub retry_config: RetryConfig,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_concurrency: DEFAULT_CONCURRENCY,
            allow_url_revisit: false,
            headers: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_config: RetryConfig::default(),
        }
    }
}

impl SpiderConfig {
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_allow_url_revisit(mut self, allow: bool) -> Self {
        self.allow_url_revisit = allow;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth > max)
    }
}

#[async_trait]
pub trait Spider: Send + Sync {
    fn name(&self) -> String;

    fn start_urls(&self) -> Vec<Url>;

    /// Hosts the crawl may leave the start pages for. Empty means any host.
    fn allowed_domains(&self) -> Vec<String> {
        Vec::new()
    }

    fn config(&self) -> &SpiderConfig;

    fn set_config(&mut self, config: SpiderConfig);

    fn with_config(mut self, config: SpiderConfig) -> Self
    where
        Self: Sized,
    {
        self.set_config(config);
        self
    }

    fn start_requests(&self) -> Vec<HttpRequest> {
        self.start_urls()
            .into_iter()
            .map(|url| HttpRequest::new(url, SpiderCallback::ParsePage, 0))
            .collect()
    }

    async fn parse(&self, response: SpiderResponse) -> ScraperResult<ParseResult>;
}
