use super::offsite::url_is_in_domains;
use crate::core::spider::{ParseResult, SpiderCallback, SpiderConfig, SpiderResponse};
use crate::http::HttpRequest;
use crate::stats::StatsTracker;
use crate::{Scraper, ScraperError, ScraperResult, Spider};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::spawn;
use tokio::task::JoinHandle;

type TaskResult = Result<ParseResult, (ScraperError, Box<HttpRequest>)>;

/// Drives a spider: keeps the frontier, fetches up to `max_concurrency`
/// requests at a time and feeds responses to the spider's callbacks.
///
/// A request is identified by its callback and URL, so the same URL may be
/// fetched once per callback.
pub struct Crawler {
    scraper: Box<dyn Scraper>,
    visited_urls: Arc<RwLock<HashSet<(SpiderCallback, String)>>>,
    stats: Arc<StatsTracker>,
}

impl Crawler {
    pub fn new(scraper: Box<dyn Scraper>) -> Self {
        info!("Initializing crawler");
        let stats = Arc::new(StatsTracker::new());
        let mut scraper = scraper;
        scraper.set_stats(Arc::clone(&stats));

        Self {
            scraper,
            visited_urls: Arc::new(RwLock::new(HashSet::new())),
            stats,
        }
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        Arc::clone(&self.stats)
    }

    pub fn visited_count(&self) -> usize {
        self.visited_urls.read().len()
    }

    pub async fn run<S: Spider + 'static>(&self, spider: S) -> ScraperResult<()> {
        let spider = Arc::new(spider);
        let config = spider.config().clone();
        let allowed_domains = spider.allowed_domains();
        let max_concurrency = config.max_concurrency.max(1);
        let mut frontier = VecDeque::new();
        let mut futures: FuturesUnordered<JoinHandle<TaskResult>> = FuturesUnordered::new();

        info!("Starting spider: {}", spider.name());
        debug!("Max depth: {:?}", config.max_depth);

        // Start requests bypass the offsite filter.
        for request in spider.start_requests() {
            self.schedule(request, &config, &[], &mut frontier);
        }

        loop {
            while futures.len() < max_concurrency {
                let Some(request) = frontier.pop_front() else {
                    break;
                };
                futures.push(self.process_request(request, Arc::clone(&spider), &config));
            }

            let Some(result) = futures.next().await else {
                break;
            };

            match result {
                Ok(Ok(ParseResult::Continue(new_requests))) => {
                    debug!("Found {} new requests", new_requests.len());
                    for request in new_requests {
                        self.schedule(request, &config, &allowed_domains, &mut frontier);
                    }
                }
                Ok(Ok(ParseResult::Skip)) => {
                    trace!("Nothing to follow");
                }
                Ok(Ok(ParseResult::Stop)) => {
                    info!("Spider requested stop");
                    for task in futures.iter() {
                        task.abort();
                    }
                    break;
                }
                Ok(Err((error, request))) => self.handle_error(error, &request),
                Err(e) => {
                    warn!("Task error: {}", e);
                    self.stats.increment_other_errors();
                }
            }
        }

        info!(
            "Spider {} completed. Total requests scheduled: {}",
            spider.name(),
            self.visited_count()
        );
        self.stats.finish();
        self.stats.print_summary();
        Ok(())
    }

    fn schedule(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
        allowed_domains: &[String],
        frontier: &mut VecDeque<HttpRequest>,
    ) {
        if config.exceeds_depth(request.depth) {
            debug!("Skipping URL {} - max depth reached", request.url);
            return;
        }

        if !url_is_in_domains(&request.url, allowed_domains) {
            debug!("Filtered offsite request to {}", request.url);
            self.stats.increment_offsite_filtered();
            return;
        }

        let key = (request.callback.clone(), request.url.to_string());
        let first_visit = self.visited_urls.write().insert(key);
        if !first_visit && !config.allow_url_revisit {
            trace!(
                "Skipping URL {} ({:?}) - already seen",
                request.url,
                request.callback
            );
            return;
        }

        debug!(
            "Scheduling {} ({:?}) at depth {}",
            request.url, request.callback, request.depth
        );
        if let Some(meta) = &request.meta {
            trace!("Request metadata: {:?}", meta);
        }

        frontier.push_back(request);
    }

    fn process_request<S: Spider + 'static>(
        &self,
        request: HttpRequest,
        spider: Arc<S>,
        config: &SpiderConfig,
    ) -> JoinHandle<TaskResult> {
        let scraper = self.scraper.box_clone();
        let stats = Arc::clone(&self.stats);
        let config = config.clone();

        spawn(async move {
            let response = match scraper.fetch(request.clone(), &config).await {
                Ok(response) => response,
                Err(e) => return Err((e, Box::new(request))),
            };

            if !response.is_success() {
                info!(
                    "Ignoring response <{} {}>: HTTP status code is not handled",
                    response.status, response.url
                );
                stats.increment_ignored_responses();
                return Ok(ParseResult::Skip);
            }

            let spider_response = SpiderResponse {
                response,
                callback: request.callback.clone(),
            };
            spider
                .parse(spider_response)
                .await
                .map_err(|e| (e, Box::new(request)))
        })
    }

    fn handle_error(&self, error: ScraperError, request: &HttpRequest) {
        match error {
            ScraperError::StorageError(e) => {
                warn!("Storage error processing {}: {}", request.url, e);
                self.stats.increment_storage_errors();
            }
            other => {
                warn!("Error processing {}: {}", request.url, other);
                self.stats.increment_other_errors();
            }
        }
    }
}
