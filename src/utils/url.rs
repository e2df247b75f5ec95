//! URL utilities for consistent URL handling
//!
//! Validation of user-supplied playlist URLs, suffix extraction for format
//! resolution, and credential masking for log output.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

fn http_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://.+").expect("static pattern compiles"))
}

impl UrlUtils {
    /// Whether `value` looks like an http(s) URL with something after the scheme
    ///
    /// ```rust
    /// use iptv_catalog::utils::url::UrlUtils;
    ///
    /// assert!(UrlUtils::is_http_url("https://example.com/list.m3u"));
    /// assert!(!UrlUtils::is_http_url("ftp://example.com/list.m3u"));
    /// assert!(!UrlUtils::is_http_url("https://"));
    /// ```
    pub fn is_http_url(value: &str) -> bool {
        http_url_pattern().is_match(value)
    }

    /// The part of a file name or URL used for format detection
    ///
    /// For parseable URLs this is the path component, so query strings and
    /// fragments never affect the detected format. Anything else is returned
    /// as given.
    pub fn suffix_source(name: &str) -> String {
        match Url::parse(name) {
            Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
            _ => name.to_string(),
        }
    }

    /// Mask credentials in a URL before it reaches the logs
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        let sensitive_params = ["username", "password", "user", "pass", "pwd", "passwd", "token"];

        for param in &sensitive_params {
            let pattern = format!(r"(?i)([?&]{}=)[^&]*", regex::escape(param));
            if let Ok(re) = Regex::new(&pattern) {
                obfuscated = re.replace_all(&obfuscated, "${1}****").to_string();
            }
        }

        obfuscated
    }
}
