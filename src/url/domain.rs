use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_harvest::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.example.com/rowery").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs live on the same host, ignoring a `www.` prefix
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    fn bare(url: &Url) -> Option<String> {
        extract_domain(url).map(|d| d.strip_prefix("www.").map(str::to_string).unwrap_or(d))
    }

    match (bare(a), bare(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
