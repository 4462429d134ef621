use url::Url;

/// Derives the page name used as a key in a crawl's page map
///
/// The root path maps to `homepage`. Other paths lose trailing slashes and
/// keep their query string.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scrape_bench::url::page_name;
///
/// let url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(page_name(&url), "homepage");
///
/// let url = Url::parse("https://example.com/pricing/?plan=pro").unwrap();
/// assert_eq!(page_name(&url), "/pricing?plan=pro");
/// ```
pub fn page_name(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "homepage".to_string();
    }

    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path,
    }
}

/// Removes `http://` and `https://` wherever they occur
fn strip_scheme(domain: &str) -> String {
    domain.replace("https://", "").replace("http://", "")
}

/// Derives the cache directory segment for a domain
///
/// The scheme is stripped, each run of characters outside `[A-Za-z0-9._-]`
/// becomes a single `_`, and leading/trailing underscores are trimmed.
///
/// # Examples
///
/// ```
/// use scrape_bench::url::domain_key;
///
/// assert_eq!(domain_key("https://example.com/"), "example.com");
/// assert_eq!(domain_key("http://127.0.0.1:8080"), "127.0.0.1_8080");
/// ```
pub fn domain_key(domain: &str) -> String {
    let stripped = strip_scheme(domain);
    let mut key = String::with_capacity(stripped.len());
    let mut in_run = false;

    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
            key.push(c);
            in_run = false;
        } else if !in_run {
            key.push('_');
            in_run = true;
        }
    }

    key.trim_matches('_').to_string()
}

/// Derives the lookup key used to match a domain to its ground-truth record
///
/// Strips the scheme, any `www.` and trailing slashes.
pub fn lookup_key(domain: &str) -> String {
    strip_scheme(domain)
        .replace("www.", "")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_name_root() {
        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(page_name(&url), "homepage");
    }

    #[test]
    fn test_page_name_strips_trailing_slash() {
        let url = Url::parse("https://example.com/about/").unwrap();
        assert_eq!(page_name(&url), "/about");
    }

    #[test]
    fn test_page_name_nested() {
        let url = Url::parse("https://example.com/blog/post-1").unwrap();
        assert_eq!(page_name(&url), "/blog/post-1");
    }

    #[test]
    fn test_page_name_keeps_query() {
        let url = Url::parse("https://example.com/search?q=rust").unwrap();
        assert_eq!(page_name(&url), "/search?q=rust");
    }

    #[test]
    fn test_page_name_root_with_query_is_homepage() {
        let url = Url::parse("https://example.com/?ref=nav").unwrap();
        assert_eq!(page_name(&url), "homepage");
    }

    #[test]
    fn test_domain_key_plain() {
        assert_eq!(domain_key("example.com"), "example.com");
    }

    #[test]
    fn test_domain_key_strips_scheme_and_slash() {
        assert_eq!(domain_key("https://www.example.com/"), "www.example.com");
    }

    #[test]
    fn test_domain_key_collapses_runs() {
        assert_eq!(domain_key("https://example.com/a b?c"), "example.com_a_b_c");
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("https://www.example.com/"), "example.com");
        assert_eq!(lookup_key("example.com"), "example.com");
        assert_eq!(lookup_key("http://sub.example.com"), "sub.example.com");
    }
}
