//! Low-level network utilities: a bounded retry strategy, retrying HTTP
//! clients built on it, and a credential-redacting HTTP client.

pub mod http;
pub mod retry;
pub mod runtime;
