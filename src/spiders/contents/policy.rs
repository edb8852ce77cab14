use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The URL string must equal an entry.
    #[default]
    Exact,
    /// The URL string must start with an entry.
    Prefix,
}

/// URLs whose responses are never written to storage.
#[derive(Debug, Clone, Default)]
pub struct SkipList {
    entries: Vec<String>,
    mode: MatchMode,
}

impl SkipList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            mode: MatchMode::Exact,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Compares the serialized URL against each entry verbatim, with no
    /// normalisation beyond what `Url` itself applies.
    pub fn should_skip_url(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.entries.iter().any(|entry| match self.mode {
            MatchMode::Exact => url == entry,
            MatchMode::Prefix => url.starts_with(entry.as_str()),
        })
    }
}

/// Case-sensitive: `setup.EXE` is not an executable here.
pub fn is_executable(filename: &str) -> bool {
    filename.ends_with(".exe")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip_list() -> SkipList {
        SkipList::new([
            "https://itpfdoc.hitachi.co.jp/manuals",
            "https://itpfdoc.hitachi.co.jp/Pages",
            "https://www.hitachi.co.jp/support/inquiry/index.html",
            "https://www.hitachi.co.jp/recruit/index.html",
        ])
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_exact_entries_are_skipped() {
        let list = skip_list();
        assert!(list.should_skip_url(&url("https://itpfdoc.hitachi.co.jp/manuals")));
        assert!(list.should_skip_url(&url("https://www.hitachi.co.jp/recruit/index.html")));
    }

    #[test]
    fn test_sub_paths_are_not_skipped_in_exact_mode() {
        let list = skip_list();
        assert!(!list.should_skip_url(&url("https://itpfdoc.hitachi.co.jp/manuals/foo.pdf")));
        assert!(!list.should_skip_url(&url("https://itpfdoc.hitachi.co.jp/manuals/")));
        assert!(!list.should_skip_url(&url("https://www.hitachi.co.jp/recruit/index.html?x=1")));
    }

    #[test]
    fn test_prefix_mode_covers_sub_paths() {
        let list = skip_list().with_mode(MatchMode::Prefix);
        assert!(list.should_skip_url(&url("https://itpfdoc.hitachi.co.jp/manuals/foo.pdf")));
        assert!(!list.should_skip_url(&url("https://www.hitachi.co.jp/IR/index.html")));
    }

    #[test]
    fn test_executable_check_is_case_sensitive() {
        assert!(is_executable("setup.exe"));
        assert!(!is_executable("setup.EXE"));
        assert!(!is_executable("setup.exe.zip"));
        assert!(!is_executable(""));
    }
}
