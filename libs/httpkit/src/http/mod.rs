//! HTTP utilities for outgoing requests.

pub mod client;
pub mod simple_otel;
