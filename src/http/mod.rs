//! HTTP plumbing shared by the download engine.

pub mod client;
pub mod proxy;

pub use client::{build_client, shared_client, REQUEST_TIMEOUT};
pub use proxy::{resolve_proxy, resolve_proxy_with};
