use url::Url;

/// Parse a website cell into an absolute URL with a host.
pub fn parse_site(site: &str) -> Result<Url, url::ParseError> {
    let url = Url::parse(site)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(url::ParseError::EmptyHost),
    }
}

/// Host name with a literal leading `www.` removed, as written to the
/// unmatched list.
pub fn normalized_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}
