use crate::core::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse, ResponseType};
use crate::{ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::Scraper;

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    pub fn bytes(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Serves canned responses by URL. Each route replays its responses in
/// order, repeating the last one; unknown URLs get a 404.
#[derive(Clone, Default)]
pub struct MockScraper {
    routes: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,
    fetched: Arc<RwLock<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    stats: Arc<StatsTracker>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, url: &str, response: MockResponse) -> Self {
        self.routes
            .write()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every URL passed to `fetch_single`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.read().clone()
    }

    /// Highest number of `fetch_single` calls that were running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> MockResponse {
        let mut routes = self.routes.write();
        let next = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        next.unwrap_or_else(|| MockResponse::status(404))
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        _config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        self.fetched.write().push(request.url.to_string());
        let mock = self.next_response(request.url.as_str());

        if let Some(delay) = mock.delay {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let mut headers = HashMap::new();
        if let Some(content_type) = &mock.content_type {
            headers.insert("content-type".to_string(), content_type.clone());
        }
        let response_type = ResponseType::detect(&headers, &mock.body);

        Ok(HttpResponse {
            url: request.url.clone(),
            status: mock.status,
            headers,
            raw_body: mock.body,
            timestamp: Utc::now(),
            retry_count: 0,
            retry_history: HashMap::new(),
            meta: None,
            response_type,
            from_request: Box::new(request),
        })
    }

    fn box_clone(&self) -> Box<dyn Scraper> {
        Box::new(self.clone())
    }

    fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    fn set_stats(&mut self, stats: Arc<StatsTracker>) {
        self.stats = stats;
    }
}
