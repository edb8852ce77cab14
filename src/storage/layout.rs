//! Maps a URL onto `<root>/<host>/<section>/<filename>`.

use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub dir: PathBuf,
    pub file: PathBuf,
}

/// Returns the URL's hostname and its section: the first path segment, or
/// [`DEFAULT_SECTION`] when the path has at most one segment.
pub fn extract_site_and_section(url: &Url) -> (String, String) {
    let site = url.host_str().unwrap_or_default().to_string();

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    let section = if segments.len() > 1 {
        segments
            .iter()
            .find(|segment| !segment.is_empty())
            .copied()
            .unwrap_or(DEFAULT_SECTION)
    } else {
        DEFAULT_SECTION
    };

    (site, section.to_string())
}

/// Everything after the last `/` of the serialized URL, query included.
/// Empty for URLs ending in `/`.
pub fn extract_filename(url: &Url) -> &str {
    url.as_str().rsplit('/').next().unwrap_or_default()
}

pub fn destination(root: &Path, url: &Url) -> Destination {
    let (site, section) = extract_site_and_section(url);
    let dir = root.join(site).join(section);
    let file = dir.join(extract_filename(url));
    Destination { dir, file }
}
