//! Utility modules: shared HTTP client.

pub mod http;
