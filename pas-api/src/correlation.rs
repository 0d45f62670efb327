//! Per-request correlation tracking
//!
//! Each request gets a correlation id, reused from the `X-Correlation-ID`
//! header when the caller supplies a usable one and freshly generated
//! otherwise. The id travels explicitly: the middleware stores a
//! [`RequestContext`] in the request extensions, handlers pass it to the
//! service, and the response echoes it back in the same header.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Header carrying the correlation id in both directions
pub static CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Longest inbound id that is reused as-is
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Opaque request identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Fresh random id (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied id if it is non-empty, printable ASCII and
    /// reasonably short
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let usable = !raw.is_empty()
            && raw.len() <= MAX_CORRELATION_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_graphic());
        usable.then(|| Self(raw.to_string()))
    }

    /// Reuse the inbound header value when usable, generate one otherwise
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped values handed to every service call
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
}

impl RequestContext {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    /// Context with a freshly generated correlation id
    pub fn generate() -> Self {
        Self::new(CorrelationId::generate())
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}

/// Assign the correlation id, trace the request under it and echo it back
pub async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_header(request.headers().get(&CORRELATION_ID_HEADER));
    request
        .extensions_mut()
        .insert(RequestContext::new(correlation_id.clone()));

    let span = info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        info!("Request started");

        let mut response = next.run(request).await;

        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Request completed"
        );

        // parse() only accepts visible ASCII and UUIDs are ASCII, so this holds
        if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
            response
                .headers_mut()
                .insert(CORRELATION_ID_HEADER.clone(), value);
        }
        response
    }
    .instrument(span)
    .await
}
