//! HTTP clients with retry logic, credential redaction and proxy support.

mod client;
mod factory;
mod proxy;
mod redact;
mod retry;
mod retry_client;
mod transport;

pub use client::{HttpClient, HttpOptions};
pub use factory::{
    CONNECT_TIMEOUT, ClientOptions, TCP_KEEPALIVE, build_client, create_default_client,
    create_default_client_insecure_skip_verify, create_keep_alive_default_client,
};
pub use proxy::{ALL_PROXY_ENV, NO_PROXY_ENV, ProxySettings};
pub use redact::{REDACTED, redact_endpoint, redact_url};
pub use retry::{RequestRetryable, RetryPolicy, RetryPredicate};
pub use retry_client::{RetryClient, RetryError};
pub use transport::Transport;
