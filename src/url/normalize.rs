use crate::UrlError;
use url::Url;

/// Turns a bare or scheme-qualified domain into an absolute base URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Remove trailing slashes
/// 3. Prefix `https://` unless the input already starts with `http`
///
/// # Examples
///
/// ```
/// use scrape_bench::url::normalize_base;
///
/// assert_eq!(normalize_base("example.com/"), "https://example.com");
/// assert_eq!(normalize_base("http://example.com"), "http://example.com");
/// ```
pub fn normalize_base(domain: &str) -> String {
    let base = domain.trim().trim_end_matches('/');
    if base.starts_with("http") {
        base.to_string()
    } else {
        format!("https://{}", base)
    }
}

/// Parses a base URL and checks it is navigable
///
/// # Returns
///
/// * `Ok(Url)` - An http(s) URL with a host
/// * `Err(UrlError)` - Malformed, non-http, or host-less input
pub fn parse_base(base: &str) -> Result<Url, UrlError> {
    let url = Url::parse(base).map_err(|e| UrlError::Parse(format!("{}: {}", base, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Lowercases a host and strips a leading `www.`
pub fn normalize_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Builds the dedup key for a URL: scheme, host, port and path
///
/// Query and fragment are excluded. Trailing slashes are removed from the
/// path except for the root, which stays `/`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scrape_bench::url::canonical_url;
///
/// let url = Url::parse("https://example.com/pricing/?plan=pro#top").unwrap();
/// assert_eq!(canonical_url(&url), "https://example.com/pricing");
/// ```
pub fn canonical_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let netloc = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = url.path();
    let path = if path == "/" || path.is_empty() {
        "/"
    } else {
        match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    };

    format!("{}://{}{}", url.scheme(), netloc, path)
}
