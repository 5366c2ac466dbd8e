//! Proxy selection.
//!
//! Precedence: explicit override, then `HTTPS_PROXY`/`https_proxy`, then
//! `HTTP_PROXY`/`http_proxy`, then direct.

use url::Url;

use crate::error::{Error, Result};

const PROXY_ENV_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];

/// Resolve the proxy URL from an override and the process environment.
pub fn resolve_proxy(custom: Option<&str>) -> Result<Option<Url>> {
    resolve_proxy_with(custom, |key| std::env::var(key).ok())
}

/// Resolve the proxy URL using `lookup` for environment variables.
pub fn resolve_proxy_with<F>(custom: Option<&str>, lookup: F) -> Result<Option<Url>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(custom) = custom.map(str::trim).filter(|s| !s.is_empty()) {
        return Url::parse(custom)
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid custom proxy URL '{}': {}", custom, e)));
    }

    let from_env = PROXY_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());

    match from_env {
        Some(value) => Url::parse(&value).map(Some).map_err(|e| {
            Error::Config(format!("invalid proxy URL from environment '{}': {}", value, e))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_custom_override_wins() {
        let proxy = resolve_proxy_with(
            Some("socks5://127.0.0.1:1080"),
            env(&[("HTTPS_PROXY", "http://env:8080")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(proxy.scheme(), "socks5");
    }

    #[test]
    fn test_https_before_http() {
        let proxy = resolve_proxy_with(
            None,
            env(&[("http_proxy", "http://plain:1"), ("https_proxy", "http://secure:2")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(proxy.host_str(), Some("secure"));
    }

    #[test]
    fn test_uppercase_before_lowercase() {
        let proxy = resolve_proxy_with(
            None,
            env(&[("HTTP_PROXY", "http://upper:1"), ("http_proxy", "http://lower:2")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(proxy.host_str(), Some("upper"));
    }

    #[test]
    fn test_no_proxy() {
        assert!(resolve_proxy_with(None, env(&[])).unwrap().is_none());
        assert!(resolve_proxy_with(Some("  "), env(&[])).unwrap().is_none());
    }

    #[test]
    fn test_invalid_proxy() {
        assert!(resolve_proxy_with(Some("not a url"), env(&[])).is_err());
        assert!(resolve_proxy_with(None, env(&[("HTTPS_PROXY", "::bad")])).is_err());
    }
}
