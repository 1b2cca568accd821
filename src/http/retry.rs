//! Retry decisions for HTTP round trips, and the request-bound retryable.

use anyhow::{Context, Error, Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Method, Request, Response, StatusCode};
use std::fmt;
use std::sync::Arc;

use super::redact::redact_url;
use super::transport::Transport;
use crate::retry::{AttemptOutcome, Retryable};

/// Decides from the request method and the attempt result whether to retry.
pub type RetryPredicate =
    dyn Fn(&Method, Result<&Response, &Error>) -> bool + Send + Sync + 'static;

/// Which attempt results a retry client treats as transient.
#[derive(Clone, Default)]
pub enum RetryPolicy {
    /// Retry transport errors and any status outside 2xx.
    #[default]
    AnyFailure,
    /// Retry transport errors, and 503/504 for GET and HEAD only.
    NetworkSafe,
    Custom(Arc<RetryPredicate>),
}

impl RetryPolicy {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Method, Result<&Response, &Error>) -> bool + Send + Sync + 'static,
    {
        RetryPolicy::Custom(Arc::new(predicate))
    }

    pub fn should_retry(&self, method: &Method, result: Result<&Response, &Error>) -> bool {
        match self {
            RetryPolicy::AnyFailure => match result {
                Err(_) => true,
                Ok(response) => is_failure_status(response.status()),
            },
            RetryPolicy::NetworkSafe => match result {
                Err(_) => true,
                Ok(response) => {
                    is_idempotent(method)
                        && matches!(
                            response.status(),
                            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
                        )
                }
            },
            RetryPolicy::Custom(predicate) => predicate(method, result),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::AnyFailure => write!(f, "AnyFailure"),
            RetryPolicy::NetworkSafe => write!(f, "NetworkSafe"),
            RetryPolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Only 2xx is a final answer. A 3xx here is a redirect reqwest did not
/// follow, and a 1xx is never a complete response.
fn is_failure_status(status: StatusCode) -> bool {
    !status.is_success()
}

fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// One HTTP request driven through a retry strategy. Keeps the most recent
/// response so the caller can pick it up once the strategy returns.
pub struct RequestRetryable<'a, T: Transport + ?Sized> {
    request: Option<Request>,
    method: Method,
    endpoint: String,
    delegate: &'a T,
    policy: &'a RetryPolicy,
    response: Option<Response>,
    attempts: usize,
}

impl<'a, T: Transport + ?Sized> RequestRetryable<'a, T> {
    pub fn new(request: Request, delegate: &'a T, policy: &'a RetryPolicy) -> Self {
        Self {
            method: request.method().clone(),
            endpoint: redact_url(request.url(), true),
            request: Some(request),
            delegate,
            policy,
            response: None,
            attempts: 0,
        }
    }

    /// The response of the most recent attempt, if it produced one.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Buffered bodies are cloned for every attempt. A streaming body can
    /// only be sent once.
    fn next_request(&mut self) -> Result<Request> {
        match self.request.as_ref().and_then(Request::try_clone) {
            Some(request) => Ok(request),
            None => self
                .request
                .take()
                .context("Request body is a stream and cannot be sent again"),
        }
    }
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Retryable for RequestRetryable<'a, T> {
    async fn attempt(&mut self) -> AttemptOutcome {
        self.attempts += 1;
        // Release the previous response's connection before the next round trip.
        self.response = None;

        let request = match self.next_request() {
            Ok(request) => request,
            Err(e) => return AttemptOutcome::fail(e),
        };

        debug!("Attempt #{}: {} {}", self.attempts, self.method, self.endpoint);

        let outcome = match self.delegate.execute(request).await {
            Ok(response) => {
                let status = response.status();
                let retry = self.policy.should_retry(&self.method, Ok(&response));
                self.response = Some(response);
                if retry {
                    AttemptOutcome::retry(Some(
                        anyhow!("Request failed, response: {}", status).context("Retry"),
                    ))
                } else {
                    AttemptOutcome::done()
                }
            }
            Err(e) => {
                if self.policy.should_retry(&self.method, Err(&e)) {
                    AttemptOutcome::retry(Some(e.context("Retry")))
                } else {
                    AttemptOutcome::fail(e)
                }
            }
        };

        // The stream went out with this attempt; its result is the final one.
        if outcome.should_retry && self.request.is_none() {
            warn!(
                "Not retrying {} {}: request body is a stream and cannot be sent again",
                self.method, self.endpoint
            );
            return AttemptOutcome {
                should_retry: false,
                error: outcome.error,
            };
        }
        outcome
    }
}
