use crate::relay::{ Relay, RelayError };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::{ any, get },
    Router,
    Json,
    extract::State,
    response::{ IntoResponse, Response },
    http::{ header, HeaderValue, Method, StatusCode },
};
use serde::Serialize;
use tower_http::set_header::SetResponseHeaderLayer;
use log::{ info, debug };

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const ALLOW_METHODS: &str = "POST, OPTIONS, GET";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: Option<String>,
}

#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
}

/// Builds the relay router. Every response, errors and preflights included,
/// carries the open CORS policy.
pub fn router(relay: Arc<Relay>, relay_path: &str) -> Router {
    let app_state = AppState { relay };

    Router::new()
        .route(relay_path, any(relay_handler))
        .route("/health", get(health_handler))
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ORIGIN)
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS)
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS)
            )
        )
        .with_state(app_state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    app: Router,
    tls: Option<(String, String)>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match tls {
        Some((cert_path, key_path)) => {
            info!(
                "TLS enabled. Loading certificate from '{}' and key from '{}'",
                cert_path,
                key_path
            );
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;
            info!("Relay listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        }
        None => {
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind relay to {}: {}", addr, e))?;
            info!("Relay listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

async fn relay_handler(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    debug!("Relay received {} with {} byte body", method, body.len());

    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        Method::POST =>
            match state.relay.process(&body).await {
                Ok(resp) => Json(resp).into_response(),
                Err(e) => e.into_response(),
            }
        _ => RelayError::MethodNotAllowed.into_response(),
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        model: state.relay.model(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::relay::test_support::StubChatClient;
    use crate::relay::DEFAULT_UPSTREAM_TIMEOUT;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt; // oneshot

    const PATH: &str = "/.netlify/functions/gemini-proxy";

    fn app_with(stub: Option<Arc<StubChatClient>>, timeout: Duration) -> Router {
        let client = stub.map(|s| s as Arc<dyn crate::llm::chat::ChatClient>);
        router(Arc::new(Relay::new(client, timeout)), PATH)
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(resp: &Response) {
        let headers = resp.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOW_ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[tokio::test]
    async fn preflight_returns_no_content_with_cors() {
        let app = app_with(None, DEFAULT_UPSTREAM_TIMEOUT);
        let req = Request::builder().method("OPTIONS").uri(PATH).body(Body::empty()).unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_cors(&resp);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let app = app_with(Some(Arc::new(StubChatClient::replying("x"))), DEFAULT_UPSTREAM_TIMEOUT);
        let req = Request::builder().method("PUT").uri(PATH).body(Body::empty()).unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&resp);
        assert_eq!(json_body(resp).await["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app_with(Some(Arc::new(StubChatClient::replying("x"))), DEFAULT_UPSTREAM_TIMEOUT);

        let resp = app.oneshot(post("{oops")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_cors(&resp);
        assert_eq!(json_body(resp).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn missing_credential_is_unauthorized_regardless_of_body() {
        for body in ["{oops", r#"{"message":"hi"}"#, ""] {
            let app = app_with(None, DEFAULT_UPSTREAM_TIMEOUT);
            let resp = app.oneshot(post(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert!(json_body(resp).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn successful_exchange_returns_response_and_history() {
        let stub = Arc::new(StubChatClient::replying("**Hi** there"));
        let app = app_with(Some(stub.clone()), DEFAULT_UPSTREAM_TIMEOUT);

        let resp = app.oneshot(post(r#"{"message":"hi","chatHistory":[]}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_cors(&resp);

        let json = json_body(resp).await;
        assert_eq!(json["response"], "**Hi** there");
        assert_eq!(
            json["chatHistory"],
            serde_json::json!([
                {"sender": "user", "text": "hi"},
                {"sender": "ai", "text": "**Hi** there"}
            ])
        );
        assert_eq!(stub.calls(), vec![vec![crate::llm::Turn::user("hi")]]);
    }

    #[tokio::test]
    async fn upstream_timeout_is_gateway_timeout() {
        let stub = Arc::new(StubChatClient::slow("late", Duration::from_secs(5)));
        let app = app_with(Some(stub), Duration::from_millis(20));

        let resp = app.oneshot(post(r#"{"message":"hi"}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_cors(&resp);
    }

    #[tokio::test]
    async fn upstream_error_is_internal() {
        let stub = Arc::new(StubChatClient::failing(|| LlmError::EmptyResponse));
        let app = app_with(Some(stub), DEFAULT_UPSTREAM_TIMEOUT);

        let resp = app.oneshot(post(r#"{"message":"hi"}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "Upstream returned an empty response");
    }

    #[tokio::test]
    async fn health_reports_model() {
        let app = app_with(Some(Arc::new(StubChatClient::replying("x"))), DEFAULT_UPSTREAM_TIMEOUT);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "stub-model");
    }
}
