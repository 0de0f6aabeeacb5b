//! HTTP client layer: `CustodyHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

pub use client::CustodyHttp;
pub use retry::{RetryConfig, RetryPolicy};
