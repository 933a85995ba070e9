//! URL modeling: validation of submitted source URLs and removal of
//! time-offset parameters before they are handed to the media tool.

mod normalize;

pub use normalize::normalize_url;

/// Checks that `raw` is an absolute http(s) URL with a host.
///
/// Returns the reason as a string so callers can wrap it in their own error.
pub fn validate_source_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_source_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_source_url("http://example.com/video").is_ok());
        assert!(validate_source_url("  https://youtu.be/abc  ").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(validate_source_url("ftp://example.com/file").is_err());
        assert!(validate_source_url("not a url").is_err());
        assert!(validate_source_url("").is_err());
    }
}
