use crate::core::retry::RetryCategory;
use crate::http::HttpRequest;
use chrono::prelude::*;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use url::Url;

const HTML_OPENERS: [&str; 5] = ["<!doctype html", "<html", "<head", "<body", "<!--"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Html,
    Json,
    Text,
    Binary,
}

impl ResponseType {
    /// Classifies a body from its `content-type` header, sniffing the first
    /// bytes when the header is absent.
    pub fn detect(headers: &HashMap<String, String>, body: &[u8]) -> Self {
        if let Some(content_type) = headers.get("content-type") {
            let content_type = content_type.to_ascii_lowercase();
            if content_type.contains("text/html") || content_type.contains("application/xhtml") {
                ResponseType::Html
            } else if content_type.contains("application/json") {
                ResponseType::Json
            } else if content_type.starts_with("text/") {
                ResponseType::Text
            } else {
                ResponseType::Binary
            }
        } else {
            let head = String::from_utf8_lossy(&body[..body.len().min(512)]);
            let head = head.trim_start_matches('\u{feff}').trim_start();
            let lowered = head.to_ascii_lowercase();
            if HTML_OPENERS.iter().any(|opener| lowered.starts_with(opener)) {
                ResponseType::Html
            } else if head.starts_with('{') || head.starts_with('[') {
                ResponseType::Json
            } else if std::str::from_utf8(body).is_ok() {
                ResponseType::Text
            } else {
                ResponseType::Binary
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL, after redirects.
    pub url: Url,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub raw_body: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub retry_count: usize,
    pub retry_history: HashMap<RetryCategory, usize>,
    pub meta: Option<Value>,
    pub response_type: ResponseType,
    pub from_request: Box<HttpRequest>,
}

impl HttpResponse {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
