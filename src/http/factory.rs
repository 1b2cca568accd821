//! Construction of the reqwest clients used as retry delegates.
//!
//! Clients are built explicitly and handed to their users; nothing here is
//! cached process-wide, so a proxy change in the environment is picked up by
//! the next client built.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Certificate, Client};
use std::time::Duration;

use super::proxy::ProxySettings;
use crate::runtime::Runtime;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Knobs that differ between the default clients.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub insecure_skip_verify: bool,
    /// Reuse pooled connections between requests.
    pub keep_alive: bool,
    pub root_certificates: Vec<Certificate>,
}

/// Builds a client from `options`, routing through the environment's proxy.
#[tracing::instrument(skip(runtime, options))]
pub fn build_client<R: Runtime + ?Sized>(runtime: &R, options: ClientOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .danger_accept_invalid_certs(options.insecure_skip_verify);

    if !options.keep_alive {
        builder = builder.pool_max_idle_per_host(0);
    }

    for certificate in options.root_certificates {
        builder = builder.add_root_certificate(certificate);
    }

    if let Some(settings) = ProxySettings::from_environment(runtime) {
        debug!("Routing connections through proxy {}", settings);
        builder = builder.proxy(settings.to_proxy()?);
    }

    builder.build().context("Failed to build HTTP client")
}

/// TLS verification on, no connection reuse.
pub fn create_default_client<R: Runtime + ?Sized>(
    runtime: &R,
    root_certificates: Vec<Certificate>,
) -> Result<Client> {
    build_client(
        runtime,
        ClientOptions {
            root_certificates,
            ..ClientOptions::default()
        },
    )
}

/// TLS verification on, pooled connections reused.
pub fn create_keep_alive_default_client<R: Runtime + ?Sized>(
    runtime: &R,
    root_certificates: Vec<Certificate>,
) -> Result<Client> {
    build_client(
        runtime,
        ClientOptions {
            keep_alive: true,
            root_certificates,
            ..ClientOptions::default()
        },
    )
}

/// TLS verification off, no connection reuse.
pub fn create_default_client_insecure_skip_verify<R: Runtime + ?Sized>(
    runtime: &R,
) -> Result<Client> {
    build_client(
        runtime,
        ClientOptions {
            insecure_skip_verify: true,
            ..ClientOptions::default()
        },
    )
}
