use url::Url;

/// True when the URL's host is one of `domains` or a subdomain of one.
/// An empty domain list allows every host.
pub fn url_is_in_domains(url: &Url, domains: &[String]) -> bool {
    if domains.is_empty() {
        return true;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    domains.iter().any(|domain| {
        let domain = domain.trim_start_matches('.').to_ascii_lowercase();
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["hitachi.co.jp".to_string()]
    }

    #[test]
    fn test_domain_and_subdomains_are_allowed() {
        for raw in [
            "https://hitachi.co.jp/",
            "https://www.hitachi.co.jp/IR/index.html",
            "https://itpfdoc.hitachi.co.jp/manuals",
            "https://WWW.Hitachi.co.jp/",
        ] {
            assert!(url_is_in_domains(&Url::parse(raw).unwrap(), &allowed()), "{raw}");
        }
    }

    #[test]
    fn test_other_hosts_are_offsite() {
        for raw in [
            "https://example.com/",
            "https://nothitachi.co.jp/",
            "https://hitachi.co.jp.example.com/",
            "mailto:ir@hitachi.co.jp",
        ] {
            assert!(!url_is_in_domains(&Url::parse(raw).unwrap(), &allowed()), "{raw}");
        }
    }

    #[test]
    fn test_empty_domain_list_allows_everything() {
        assert!(url_is_in_domains(
            &Url::parse("https://example.com/").unwrap(),
            &[]
        ));
    }
}
