//! # httpkit
//!
//! Outgoing HTTP plumbing shared by the campus client modules: a `reqwest`
//! wrapper that opens a span per request and propagates a W3C trace context.

pub mod http;

pub use http::client::{ClientOptions, TracedClient};
