//! Verb-level HTTP client that keeps credentials out of logs and errors.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Body, Method, Request, Response, Url};

use super::redact::redact_endpoint;
use super::transport::Transport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpOptions {
    /// Log query parameter values as they are instead of redacting them.
    pub no_redact_url_query: bool,
}

/// HTTP client over any [`Transport`], e.g. a [`RetryClient`](super::RetryClient).
///
/// Error statuses come back as responses; only transport failures are errors.
#[derive(Clone)]
pub struct HttpClient<T: Transport> {
    client: T,
    options: HttpOptions,
}

impl<T: Transport> HttpClient<T> {
    pub fn new(client: T) -> Self {
        Self::with_options(client, HttpOptions::default())
    }

    pub fn with_options(client: T, options: HttpOptions) -> Self {
        Self { client, options }
    }

    /// Returns a reference to the underlying transport.
    pub fn inner(&self) -> &T {
        &self.client
    }

    /// The endpoint as it appears in this client's log lines.
    pub fn loggable_endpoint(&self, endpoint: &str) -> String {
        redact_endpoint(endpoint, !self.options.no_redact_url_query)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.get_customized(endpoint, |_| {}).await
    }

    pub async fn get_customized<F>(&self, endpoint: &str, customize: F) -> Result<Response>
    where
        F: FnOnce(&mut Request),
    {
        self.perform(Method::GET, endpoint, None, customize).await
    }

    pub async fn post(&self, endpoint: &str, payload: impl Into<Body>) -> Result<Response> {
        self.post_customized(endpoint, payload, |_| {}).await
    }

    pub async fn post_customized<F>(
        &self,
        endpoint: &str,
        payload: impl Into<Body>,
        customize: F,
    ) -> Result<Response>
    where
        F: FnOnce(&mut Request),
    {
        self.perform(Method::POST, endpoint, Some(payload.into()), customize)
            .await
    }

    pub async fn put(&self, endpoint: &str, payload: impl Into<Body>) -> Result<Response> {
        self.put_customized(endpoint, payload, |_| {}).await
    }

    pub async fn put_customized<F>(
        &self,
        endpoint: &str,
        payload: impl Into<Body>,
        customize: F,
    ) -> Result<Response>
    where
        F: FnOnce(&mut Request),
    {
        self.perform(Method::PUT, endpoint, Some(payload.into()), customize)
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response> {
        self.delete_customized(endpoint, |_| {}).await
    }

    pub async fn delete_customized<F>(&self, endpoint: &str, customize: F) -> Result<Response>
    where
        F: FnOnce(&mut Request),
    {
        self.perform(Method::DELETE, endpoint, None, customize).await
    }

    #[tracing::instrument(skip(self, endpoint, body, customize))]
    async fn perform<F>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Body>,
        customize: F,
    ) -> Result<Response>
    where
        F: FnOnce(&mut Request),
    {
        debug!(
            "Performing request with endpoint {}",
            self.loggable_endpoint(endpoint)
        );

        let url = Url::parse(endpoint).with_context(|| {
            format!("Parsing endpoint '{}'", redact_endpoint(endpoint, true))
        })?;

        let mut request = Request::new(method.clone(), url);
        *request.body_mut() = body;
        customize(&mut request);

        self.client.execute(request).await.with_context(|| {
            format!(
                "Performing request {} {}",
                method,
                redact_endpoint(endpoint, !self.options.no_redact_url_query)
            )
        })
    }
}
