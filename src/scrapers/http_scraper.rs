use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, ClientBuilder};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::Scraper;
use crate::core::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse, ResponseType};
use crate::{ScraperError, ScraperResult, StatsTracker};

const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
);

#[derive(Debug, Error)]
pub enum HttpScraperError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] header::InvalidHeaderName),
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

impl From<HttpScraperError> for ScraperError {
    fn from(err: HttpScraperError) -> Self {
        match err {
            HttpScraperError::HttpError(e) => ScraperError::HttpError(e),
            other => ScraperError::ParsingError(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct HttpScraper {
    client: Client,
    stats: Arc<StatsTracker>,
}

impl HttpScraper {
    pub fn new() -> Result<Self, HttpScraperError> {
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Result<Self, HttpScraperError> {
        let mut header_map = header::HeaderMap::new();
        header_map.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(DEFAULT_USER_AGENT),
        );

        for (key, value) in headers {
            let name = header::HeaderName::from_bytes(key.as_bytes())?;
            let value = header::HeaderValue::from_str(value)?;
            header_map.insert(name, value);
        }

        self.client = ClientBuilder::new().default_headers(header_map).build()?;

        Ok(self)
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let mut req = self
            .client
            .get(request.url.clone())
            .timeout(config.request_timeout);

        for (key, value) in &config.headers {
            req = req.header(key, value);
        }

        let start_time = Utc::now();
        let response = req.send().await.map_err(HttpScraperError::HttpError)?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let headers = Self::extract_headers(&response);
        let raw_body = response
            .bytes()
            .await
            .map_err(HttpScraperError::HttpError)?
            .to_vec();

        let end_time = Utc::now();

        let meta = json!({
            "request": {
                "url": request.url.as_str(),
                "depth": request.depth,
            },
            "response": {
                "elapsed": (end_time - start_time).num_milliseconds(),
                "content_length": raw_body.len(),
                "encoding": headers.get("content-encoding").cloned().unwrap_or_default(),
            }
        });

        let response_type = ResponseType::detect(&headers, &raw_body);

        Ok(HttpResponse {
            url: final_url,
            status,
            headers,
            raw_body,
            timestamp: start_time,
            retry_count: 0,
            retry_history: HashMap::new(),
            meta: Some(meta),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::{RetryCategory, RetryConfig};
    use crate::core::SpiderCallback;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> Result<(HttpScraper, MockServer), HttpScraperError> {
        let server = MockServer::start().await;
        let scraper = HttpScraper::new()?;
        Ok((scraper, server))
    }

    fn request_for(server: &MockServer, route: &str) -> HttpRequest {
        let url = Url::parse(&server.uri()).unwrap().join(route).unwrap();
        HttpRequest::new(url, SpiderCallback::ParsePage, 0)
    }

    #[tokio::test]
    async fn test_get_html_page() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/IR/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>IR</body></html>", "text/html; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(
                request_for(&mock_server, "/IR/index.html"),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "<html><body>IR</body></html>");
        assert_eq!(response.response_type, ResponseType::Html);
    }

    #[tokio::test]
    async fn test_binary_body_is_kept_verbatim() {
        let (scraper, mock_server) = setup().await.unwrap();
        let payload: Vec<u8> = vec![0x25, 0x50, 0x44, 0x46, 0xff, 0xfe, 0x00, 0x80];

        Mock::given(method("GET"))
            .and(path("/IR/report.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(payload.clone())
                    .insert_header("content-type", "application/pdf"),
            )
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(
                request_for(&mock_server, "/IR/report.pdf"),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.raw_body, payload);
        assert_eq!(response.response_type, ResponseType::Binary);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(
                request_for(&mock_server, "/missing"),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert_eq!(response.text(), "Not Found");
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&mock_server)
            .await;

        let mut retry_config = RetryConfig::transient_errors();
        for category in retry_config.categories.values_mut() {
            category.initial_delay = Duration::from_millis(1);
        }
        let config = SpiderConfig::default().with_retry(retry_config);

        let response = scraper
            .fetch(request_for(&mock_server, "/flaky"), &config)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.retry_count, 1);
        assert_eq!(scraper.stats().get_stats().retry_count, 1);
    }

    fn fast_transient_retries() -> RetryConfig {
        let mut retry_config = RetryConfig::transient_errors();
        for category in retry_config.categories.values_mut() {
            category.initial_delay = Duration::from_millis(5);
        }
        retry_config
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_raised() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&mock_server)
            .await;

        let config = SpiderConfig::default()
            .with_retry(fast_transient_retries())
            .with_request_timeout(Duration::from_millis(50));

        let err = scraper
            .fetch(request_for(&mock_server, "/slow"), &config)
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
        assert_eq!(scraper.stats().get_stats().retry_count, 2);
    }

    #[tokio::test]
    async fn test_timeout_then_recovery() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/slow-once"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow-once"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let config = SpiderConfig::default()
            .with_retry(fast_transient_retries())
            .with_request_timeout(Duration::from_millis(50));

        let response = scraper
            .fetch(request_for(&mock_server, "/slow-once"), &config)
            .await
            .unwrap();

        assert_eq!(response.text(), "ok");
        assert_eq!(
            response.retry_history.get(&RetryCategory::Timeout),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_retried() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scraper = HttpScraper::new().unwrap();
        let url = Url::parse(&format!("http://{addr}/IR/index.html")).unwrap();
        let config = SpiderConfig::default().with_retry(fast_transient_retries());

        let err = scraper
            .fetch(HttpRequest::new(url, SpiderCallback::ParsePage, 0), &config)
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(scraper.stats().get_stats().retry_count, 2);
    }

    #[tokio::test]
    async fn test_timeout_not_retried_without_retry_config() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&mock_server)
            .await;

        let config = SpiderConfig::default().with_request_timeout(Duration::from_millis(50));
        let result = scraper
            .fetch(request_for(&mock_server, "/slow"), &config)
            .await;

        assert!(result.is_err());
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let (scraper, mock_server) = setup().await.unwrap();
        let target = format!("{}/sustainability/index.html", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/sustainability/"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", target.as_str()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sustainability/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(
                request_for(&mock_server, "/sustainability/"),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.url.path(), "/sustainability/index.html");
        assert_eq!(response.from_request.url.path(), "/sustainability/");
    }

    #[tokio::test]
    async fn test_config_headers_are_sent() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("accept-language", "ja"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let config = SpiderConfig::default().with_headers(vec![("accept-language", "ja")]);
        let response = scraper
            .fetch(request_for(&mock_server, "/"), &config)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_custom_user_agent() {
        let (scraper, mock_server) = setup().await.unwrap();
        let custom_ua = "CustomBot/1.0";
        let scraper = scraper
            .with_headers(vec![("user-agent", custom_ua)])
            .unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", custom_ua))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(request_for(&mock_server, "/"), &SpiderConfig::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn test_invalid_headers() {
        let scraper = HttpScraper::new().unwrap();
        let result = scraper.with_headers(vec![("invalid\0header", "value")]);
        assert!(result.is_err());
    }
}
