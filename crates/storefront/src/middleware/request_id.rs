//! Request IDs for log and error correlation.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longer upstream ids are replaced rather than logged.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse an upstream `x-request-id` or mint a UUID v4, then record it on
/// the tracing span, the Sentry scope and the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id(request.headers());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_upstream_id_is_reused() {
        assert_eq!(request_id(&headers("fly-req-01HZX")), "fly-req-01HZX");

        let longest = "r".repeat(MAX_REQUEST_ID_LEN);
        assert_eq!(request_id(&headers(&longest)), longest);
    }

    #[test]
    fn test_oversized_or_empty_id_is_replaced() {
        let oversized = "r".repeat(MAX_REQUEST_ID_LEN + 1);
        let minted = request_id(&headers(&oversized));
        assert!(Uuid::parse_str(&minted).is_ok());

        assert!(Uuid::parse_str(&request_id(&headers(""))).is_ok());
        assert!(Uuid::parse_str(&request_id(&HeaderMap::new())).is_ok());
    }
}
