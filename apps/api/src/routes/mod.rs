pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::ingest::handlers;
use crate::state::AppState;

pub const PARSE_RESUME_PATH: &str = "/functions/v1/parse-resume";
pub const PARSE_RESUME_API_PATH: &str = "/api/v1/resumes/parse";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.pipeline.settings().max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    let parse_resume =
        post(handlers::handle_parse_resume).fallback(handlers::handle_method_not_allowed);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(PARSE_RESUME_PATH, parse_resume.clone())
        .route(PARSE_RESUME_API_PATH, parse_resume)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .with_state(state)
}

/// Answers `OPTIONS` preflight for browser clients and stamps
/// `Access-Control-Allow-Origin: *` on every response.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{AuthedUser, IdentityProvider};
    use crate::config::IngestSettings;
    use crate::errors::AppError;
    use crate::ingest::file_validator::DOCX_MIME;
    use crate::ingest::pipeline::tests::{
        ai_payload, docx_bytes, MemoryCache, StubParser, RESUME_TEXT,
    };
    use crate::ingest::pipeline::IngestPipeline;

    const TOKEN: &str = "valid-token";
    const BOUNDARY: &str = "X-RESUME-BOUNDARY";

    struct StaticIdentity;

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn verify(&self, token: &str) -> Result<AuthedUser, AppError> {
            if token == TOKEN {
                Ok(AuthedUser { id: Uuid::nil() })
            } else {
                Err(AppError::Unauthorized("invalid token".into()))
            }
        }
    }

    fn app(parser: Arc<StubParser>) -> Router {
        let pipeline = IngestPipeline::new(
            parser,
            Arc::new(MemoryCache::default()),
            IngestSettings::default(),
        );
        build_router(AppState {
            pipeline,
            identity: Arc::new(StaticIdentity),
        })
    }

    fn multipart_body(field: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(token: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(PARSE_RESUME_PATH)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_succeeds_then_hits_cache() {
        let parser = Arc::new(StubParser::new(ai_payload(0.95)));
        let app = app(parser.clone());
        let docx = docx_bytes(RESUME_TEXT);

        let first = app
            .clone()
            .oneshot(upload_request(
                Some(TOKEN),
                multipart_body("file", "resume.docx", DOCX_MIME, &docx),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let first = json_body(first).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["cached"], false);
        assert_eq!(first["ui_message"]["type"], "success");

        let second = app
            .oneshot(upload_request(
                Some(TOKEN),
                multipart_body("file", "resume.docx", DOCX_MIME, &docx),
            ))
            .await
            .unwrap();
        let second = json_body(second).await;
        assert_eq!(second["cached"], true);
        assert_eq!(first["yaml"], second["yaml"]);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let parser = Arc::new(StubParser::new(ai_payload(0.95)));
        let response = app(parser.clone())
            .oneshot(upload_request(
                None,
                multipart_body("file", "r.docx", DOCX_MIME, &docx_bytes(RESUME_TEXT)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(upload_request(
                Some("forged"),
                multipart_body("file", "r.docx", DOCX_MIME, &docx_bytes(RESUME_TEXT)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_bad_request() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(upload_request(
                Some(TOKEN),
                multipart_body("attachment", "r.docx", DOCX_MIME, b"PK"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_bad_request() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(upload_request(
                Some(TOKEN),
                multipart_body("file", "notes.txt", "text/plain", b"hello"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_low_confidence_envelope() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.3))))
            .oneshot(upload_request(
                Some(TOKEN),
                multipart_body("file", "r.docx", DOCX_MIME, &docx_bytes(RESUME_TEXT)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["confidence"], 0.3);
        assert!(body["warnings"].is_array());
    }

    fn header_tokens(response: &axum::response::Response, name: &str) -> Vec<String> {
        let mut tokens: Vec<String> = response.headers()[name]
            .to_str()
            .unwrap()
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .collect();
        tokens.sort();
        tokens
    }

    #[tokio::test]
    async fn test_preflight_headers() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(PARSE_RESUME_PATH)
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "authorization, content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            header_tokens(&response, "access-control-allow-headers"),
            vec!["apikey", "authorization", "content-type", "x-client-info"]
        );
        assert_eq!(
            header_tokens(&response, "access-control-allow-methods"),
            vec!["options", "post"]
        );
    }

    #[tokio::test]
    async fn test_error_responses_carry_cors_origin() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(upload_request(None, Vec::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
                .oneshot(
                    Request::builder()
                        .method(method.clone())
                        .uri(PARSE_RESUME_PATH)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            let body = json_body(response).await;
            assert_eq!(body["error"], "Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(StubParser::new(ai_payload(0.95))))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
