use crate::core::retry::{RetryCategory, RetryState};
use crate::core::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::{ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, trace, warn};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse>;
    fn box_clone(&self) -> Box<dyn Scraper>;
    fn stats(&self) -> &StatsTracker;
    fn set_stats(&mut self, stats: Arc<StatsTracker>);

    async fn fetch(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let start_time = Utc::now();
        let mut state = RetryState::new();
        let inspects_content = config.retry_config.inspects_content();

        loop {
            debug!("Fetching URL: {}", request.url);
            let response = match self.fetch_single(request.clone(), config).await {
                Ok(response) => response,
                Err(e) if e.is_transport() => {
                    let Some((category, delay)) =
                        config.retry_config.should_retry_transport(&mut state)
                    else {
                        return Err(e);
                    };
                    warn!("Request to {} failed: {}", request.url, e);
                    self.announce_retry(&request, config, &state, category, delay);
                    sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            debug!(
                "Received response: status={}, body_length={}",
                response.status,
                response.raw_body.len()
            );

            let retry = {
                let content = if inspects_content {
                    response.text()
                } else {
                    Cow::Borrowed("")
                };
                config
                    .retry_config
                    .should_retry(response.status, &content, &mut state)
            };
            if let Some((category, delay)) = retry {
                self.announce_retry(&request, config, &state, category, delay);
                sleep(delay).await;
                continue;
            }

            info!(
                "Crawled ({}) {} (total_retries={})",
                response.status, response.url, state.total_retries
            );
            trace!("Retry history for {}: {:?}", request.url, state.counts);

            let duration = Utc::now().signed_duration_since(start_time);
            self.stats()
                .record_request(response.status, response.raw_body.len(), duration);

            return Ok(HttpResponse {
                retry_count: state.total_retries,
                retry_history: state.counts,
                ..response
            });
        }
    }

    fn announce_retry(
        &self,
        request: &HttpRequest,
        config: &SpiderConfig,
        state: &RetryState,
        category: RetryCategory,
        delay: Duration,
    ) {
        let attempt = state.counts.get(&category).copied().unwrap_or(0);
        warn!(
            "Retry triggered for URL: {} (category={:?}, attempt={}/{}, delay={:?})",
            request.url,
            category,
            attempt,
            config
                .retry_config
                .categories
                .get(&category)
                .map(|c| c.max_retries)
                .unwrap_or(0),
            delay
        );
        self.stats().record_retry(format!("{:?}", category));
    }
}
