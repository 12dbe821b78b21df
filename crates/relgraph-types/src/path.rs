use url::Url;

/// Path component of an identity URL, for client-side routing.
///
/// Absolute URLs lose their scheme, host and port; the query string, if any,
/// is kept. Anything that does not parse as an absolute URL is returned
/// unchanged.
pub fn router_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(q) => format!("{}?{q}", parsed.path()),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}
