//! Minimal W3C trace-context propagation for outgoing requests.
//!
//! Headers are written by hand instead of through an OpenTelemetry SDK; the
//! client only needs to hand the API a correlation id it can log.

use http::{HeaderMap, HeaderName, HeaderValue};

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Read the `traceparent` header, if present and valid UTF-8.
pub fn extract_trace_parent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACEPARENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Generate a fresh sampled `traceparent` value.
pub fn new_trace_parent() -> String {
    let span_id = format!("{:016x}", rand::random::<u64>());
    let trace_id = format!("{:032x}", rand::random::<u128>());
    format!("00-{}-{}-01", trace_id, span_id)
}

/// Insert a `traceparent` header unless the caller already set one.
/// Returns the header value in effect.
pub fn inject_trace_context(headers: &mut HeaderMap) -> Option<String> {
    if let Some(existing) = extract_trace_parent(headers) {
        return Some(existing);
    }

    let traceparent = new_trace_parent();
    let value = HeaderValue::from_str(&traceparent).ok()?;
    headers.insert(HeaderName::from_static(TRACEPARENT), value);
    Some(traceparent)
}

/// Trace id part of a version-00 `traceparent` value.
pub fn parse_trace_id(traceparent: &str) -> Option<&str> {
    let mut parts = traceparent.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("00"), Some(trace_id), Some(_), Some(_)) if trace_id.len() == 32 => Some(trace_id),
        _ => None,
    }
}
