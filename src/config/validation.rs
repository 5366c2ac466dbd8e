//! Configuration validation logic.

use regex::Regex;
use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Upper bound for concurrent workers.
pub const MAX_WORKERS: usize = 64;

const PROXY_SCHEMES: [&str; 3] = ["http", "https", "socks5"];

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workers(config.download.workers)?;
    validate_timeout(config.download.timeout_seconds)?;
    if let Some(proxy) = &config.download.proxy {
        validate_proxy(proxy)?;
    }

    Ok(())
}

pub fn validate_workers(workers: usize) -> Result<()> {
    if !(1..=MAX_WORKERS).contains(&workers) {
        return Err(Error::ConfigValidation {
            field: "workers".to_string(),
            message: format!("Must be between 1 and {} (got {})", MAX_WORKERS, workers),
        });
    }

    Ok(())
}

pub fn validate_timeout(seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(Error::ConfigValidation {
            field: "timeout_seconds".to_string(),
            message: "Must be greater than zero".to_string(),
        });
    }

    Ok(())
}

/// Validate a proxy URL. Blank values mean "no proxy" and pass.
pub fn validate_proxy(proxy: &str) -> Result<()> {
    let proxy = proxy.trim();
    if proxy.is_empty() {
        return Ok(());
    }

    let url = Url::parse(proxy).map_err(|e| Error::ConfigValidation {
        field: "proxy".to_string(),
        message: format!("'{}' is not a valid URL: {}", proxy, e),
    })?;

    if !PROXY_SCHEMES.contains(&url.scheme()) {
        return Err(Error::ConfigValidation {
            field: "proxy".to_string(),
            message: format!(
                "Unsupported scheme '{}'. Use one of: {}",
                url.scheme(),
                PROXY_SCHEMES.join(", ")
            ),
        });
    }

    Ok(())
}

/// Normalize and validate an account handle given on the command line.
///
/// A leading `@` is dropped. Handles are 1-15 characters of letters,
/// digits and underscores.
pub fn parse_handle(input: &str) -> Result<String> {
    let handle = input.trim().trim_start_matches('@');

    let pattern = Regex::new(r"^[A-Za-z0-9_]{1,15}$")
        .map_err(|e| Error::Config(format!("handle pattern: {}", e)))?;

    if !pattern.is_match(handle) {
        return Err(Error::ConfigValidation {
            field: "owner".to_string(),
            message: format!(
                "'{}' is not a valid handle. Only letters, digits and underscores (max 15).",
                input
            ),
        });
    }

    Ok(handle.to_string())
}
