//! The capability every HTTP client in this crate delegates to.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use std::sync::Arc;

use super::redact::redact_url;

/// Performs one HTTP round trip. Non-2xx statuses are responses, not errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl Transport for Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        Client::execute(self, request).await.map_err(scrub_reqwest_error)
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}

/// Drops the URL reqwest embeds in its error text, which may carry
/// credentials, and puts back a redacted copy.
fn scrub_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    match error.url().map(|url| redact_url(url, true)) {
        Some(url) => anyhow!(error.without_url()).context(format!("Sending request to {}", url)),
        None => anyhow!(error),
    }
}
