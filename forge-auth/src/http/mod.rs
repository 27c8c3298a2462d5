//! HTTP client building for provider API calls.

mod client;

pub use client::{HttpClientBuilder, HttpClientConfig};
