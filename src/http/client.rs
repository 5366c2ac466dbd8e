//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::{Client, Proxy};
use url::Url;

use crate::error::{Error, Result};
use crate::http::proxy::resolve_proxy;

/// Per-request timeout applied to every download.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build a client routed through `proxy`, or direct when `None`.
///
/// Proxy environment variables are not consulted here; resolve them first
/// with [`resolve_proxy`].
pub fn build_client(proxy: Option<&Url>, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT).timeout(timeout);

    builder = match proxy {
        Some(url) => builder.proxy(Proxy::all(url.as_str())?),
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| Error::Download(format!("Failed to create HTTP client: {}", e)))
}

/// Client shared by all workers of one batch.
///
/// An unusable proxy setting degrades to a direct client with a warning.
pub fn shared_client(custom_proxy: Option<&str>, timeout: Duration) -> Result<Client> {
    let proxy = match resolve_proxy(custom_proxy) {
        Ok(proxy) => proxy,
        Err(e) => {
            tracing::warn!("Ignoring proxy setting: {}", e);
            None
        }
    };

    if let Some(url) = &proxy {
        tracing::debug!("Using proxy {}", url);
    }

    match build_client(proxy.as_ref(), timeout) {
        Ok(client) => Ok(client),
        Err(e) if proxy.is_some() => {
            tracing::warn!("Proxy client setup failed, connecting directly: {}", e);
            build_client(None, timeout)
        }
        Err(e) => Err(e),
    }
}
