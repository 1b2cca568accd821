//! HTTP client that drives each request through a bounded retry loop.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Request, Response, StatusCode, Url};
use std::fmt;
use std::time::Duration;

use super::factory::create_default_client;
use super::redact::redact_endpoint;
use super::retry::{RequestRetryable, RetryPolicy};
use super::transport::Transport;
use crate::retry::{AttemptRetryStrategy, RetryConfig};
use crate::runtime::Runtime;

/// Final error of a retried request, together with the last response
/// received (if any attempt got that far).
pub struct RetryError {
    error: anyhow::Error,
    response: Option<Response>,
}

impl RetryError {
    pub fn new(error: anyhow::Error, response: Option<Response>) -> Self {
        Self { error, response }
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(Response::status)
    }

    pub fn into_response(self) -> Option<Response> {
        self.response
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl fmt::Debug for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryError")
            .field("error", &self.error)
            .field("status", &self.status())
            .finish()
    }
}

impl std::error::Error for RetryError {}

/// Drop-in HTTP client with retry semantics over any [`Transport`].
pub struct RetryClient<T: Transport> {
    delegate: T,
    max_attempts: usize,
    retry_delay: Duration,
    policy: RetryPolicy,
}

impl<T: Transport> RetryClient<T> {
    /// Retries every transport error and every status outside 2xx.
    pub fn new(delegate: T, max_attempts: usize, retry_delay: Duration) -> Self {
        Self::with_policy(delegate, max_attempts, retry_delay, RetryPolicy::AnyFailure)
    }

    /// Retries transport errors, and 503/504 for GET and HEAD only.
    pub fn network_safe(delegate: T, max_attempts: usize, retry_delay: Duration) -> Self {
        Self::with_policy(delegate, max_attempts, retry_delay, RetryPolicy::NetworkSafe)
    }

    pub fn with_policy(
        delegate: T,
        max_attempts: usize,
        retry_delay: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            delegate,
            max_attempts,
            retry_delay,
            policy,
        }
    }

    pub fn from_config(delegate: T, config: &RetryConfig, policy: RetryPolicy) -> Self {
        Self::with_policy(delegate, config.max_attempts, config.retry_delay(), policy)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn delegate(&self) -> &T {
        &self.delegate
    }

    /// Sends `request`, retrying per this client's policy. On failure the
    /// error still carries the last response received.
    #[tracing::instrument(skip(self, request), fields(method = %request.method()))]
    pub async fn execute(&self, request: Request) -> Result<Response, RetryError> {
        let mut retryable = RequestRetryable::new(request, &self.delegate, &self.policy);
        let result = AttemptRetryStrategy::new(self.max_attempts, self.retry_delay, &mut retryable)
            .run()
            .await;
        debug!("Request finished after {} attempt(s)", retryable.attempts());

        let response = retryable.take_response();
        match (result, response) {
            (Ok(()), Some(response)) => Ok(response),
            (Ok(()), None) => Err(RetryError::new(
                anyhow!("No response received after {} attempt(s)", retryable.attempts()),
                None,
            )),
            (Err(error), response) => Err(RetryError::new(error, response)),
        }
    }

    pub async fn get(&self, url: &str) -> Result<Response, RetryError> {
        self.get_with_headers(url, &[]).await
    }

    /// GET with extra headers, each added exactly once.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, RetryError> {
        let request =
            build_get_request(url, headers).map_err(|error| RetryError::new(error, None))?;
        self.execute(request).await
    }
}

impl RetryClient<reqwest::Client> {
    /// Plain retry client over [`create_default_client`].
    pub fn default_client<R: Runtime>(
        runtime: &R,
        max_attempts: usize,
        retry_delay: Duration,
    ) -> Result<Self> {
        let client = create_default_client(runtime, Vec::new())?;
        Ok(Self::new(client, max_attempts, retry_delay))
    }
}

fn build_get_request(url: &str, headers: &[(&str, &str)]) -> Result<Request> {
    let parsed = Url::parse(url)
        .with_context(|| format!("Parsing URL '{}'", redact_endpoint(url, true)))?;

    let mut request = Request::new(Method::GET, parsed);
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("Invalid header name '{}'", key))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header '{}'", key))?;
        request.headers_mut().append(name, value);
    }

    Ok(request)
}

#[async_trait]
impl<T: Transport> Transport for RetryClient<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        RetryClient::execute(self, request)
            .await
            .map_err(RetryError::into_error)
    }
}
