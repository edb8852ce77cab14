use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub retry_count: usize,
    pub bytes_downloaded: usize,
    pub status_codes: HashMap<u16, usize>,
    pub retry_reasons: HashMap<String, usize>,
    pub average_response_time: f64, // in milliseconds
    pub files_saved: usize,
    pub bytes_saved: usize,
    pub skipped_urls: usize,
    pub skipped_executables: usize,
    pub offsite_filtered: usize,
    pub ignored_responses: usize,
    pub storage_errors: usize,
    pub other_errors: usize,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                end_time: None,
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                retry_count: 0,
                bytes_downloaded: 0,
                status_codes: HashMap::new(),
                retry_reasons: HashMap::new(),
                average_response_time: 0.0,
                files_saved: 0,
                bytes_saved: 0,
                skipped_urls: 0,
                skipped_executables: 0,
                offsite_filtered: 0,
                ignored_responses: 0,
                storage_errors: 0,
                other_errors: 0,
            })),
        }
    }

    pub fn record_request(&self, status: u16, size: usize, duration: Duration) {
        let mut stats = self.stats.write();
        stats.total_requests += 1;

        if status < 400 {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }

        *stats.status_codes.entry(status).or_insert(0) += 1;
        stats.bytes_downloaded += size;

        let current_total = stats.average_response_time * (stats.total_requests - 1) as f64;
        let new_duration = duration.num_milliseconds() as f64;
        stats.average_response_time = (current_total + new_duration) / stats.total_requests as f64;
    }

    pub fn record_retry(&self, category: String) {
        let mut stats = self.stats.write();
        stats.retry_count += 1;
        *stats.retry_reasons.entry(category).or_insert(0) += 1;
    }

    pub fn record_saved(&self, size: usize) {
        let mut stats = self.stats.write();
        stats.files_saved += 1;
        stats.bytes_saved += size;
    }

    pub fn increment_skipped_urls(&self) {
        self.stats.write().skipped_urls += 1;
    }

    pub fn increment_skipped_executables(&self) {
        self.stats.write().skipped_executables += 1;
    }

    pub fn increment_offsite_filtered(&self) {
        self.stats.write().offsite_filtered += 1;
    }

    pub fn increment_ignored_responses(&self) {
        self.stats.write().ignored_responses += 1;
    }

    pub fn increment_storage_errors(&self) {
        self.stats.write().storage_errors += 1;
    }

    pub fn increment_other_errors(&self) {
        self.stats.write().other_errors += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nCrawl Statistics:");
        println!("=================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Total Requests: {}", stats.total_requests);
        println!("Successful Requests: {}", stats.successful_requests);
        println!("Failed Requests: {}", stats.failed_requests);
        println!("Retry Count: {}", stats.retry_count);
        println!(
            "Data Downloaded: {:.2} MB",
            stats.bytes_downloaded as f64 / 1_000_000.0
        );
        println!(
            "Average Response Time: {:.2}ms",
            stats.average_response_time
        );
        println!(
            "Files Saved: {} ({:.2} MB)",
            stats.files_saved,
            stats.bytes_saved as f64 / 1_000_000.0
        );
        println!("Skipped URLs: {}", stats.skipped_urls);
        println!("Skipped Executables: {}", stats.skipped_executables);
        println!("Offsite Requests Filtered: {}", stats.offsite_filtered);
        println!("Ignored Responses: {}", stats.ignored_responses);
        println!("Storage Errors: {}", stats.storage_errors);
        println!("Other Errors: {}", stats.other_errors);

        println!("\nStatus Codes:");
        for (code, count) in &stats.status_codes {
            println!("  {}: {}", code, count);
        }

        if !stats.retry_reasons.is_empty() {
            println!("\nRetry Reasons:");
            for (reason, count) in &stats.retry_reasons {
                println!("  {}: {}", reason, count);
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_response_time() {
        let tracker = StatsTracker::new();
        tracker.record_request(200, 100, Duration::milliseconds(10));
        tracker.record_request(404, 50, Duration::milliseconds(30));

        let stats = tracker.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.bytes_downloaded, 150);
        assert!((stats.average_response_time - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let tracker = StatsTracker::new();
        let clone = tracker.clone();
        clone.record_saved(42);
        clone.increment_skipped_executables();

        let stats = tracker.get_stats();
        assert_eq!(stats.files_saved, 1);
        assert_eq!(stats.bytes_saved, 42);
        assert_eq!(stats.skipped_executables, 1);
    }
}
