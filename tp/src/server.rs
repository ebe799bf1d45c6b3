//! HTTP API
//!
//! `GET /`, `GET /health` and `POST /api/analyze`, with CORS restricted to
//! the configured frontend origin.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::domain::AnalysisResult;
use crate::error::AnalyzeError;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub max_input_chars: usize,
    /// Env var named in credential error messages
    pub api_key_env: String,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>, config: &Config) -> Self {
        Self {
            analyzer,
            max_input_chars: config.analysis.max_input_chars,
            api_key_env: config.llm.api_key_env.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub tasks: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { detail: detail.into() }))
}

/// Build the application router
pub fn router(state: AppState, frontend_url: &str) -> Result<Router> {
    let origin: HeaderValue = frontend_url
        .trim_end_matches('/')
        .parse()
        .context(format!("Invalid frontend url: {}", frontend_url))?;

    // Credentialed CORS forbids wildcards, so methods and headers are mirrored.
    // A list origin is matched per request; other origins get no allow header.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .layer(cors)
        .with_state(state))
}

/// Bind and serve until Ctrl-C
pub async fn run_server(config: &Config, analyzer: Arc<Analyzer>, listen: SocketAddr) -> Result<()> {
    let state = AppState::new(analyzer, config);
    let app = router(state, &config.server.frontend_url)?;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context(format!("Failed to bind {}", listen))?;
    info!(%listen, frontend = %config.server.frontend_url, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated with error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "ToDo Prioritizer API"}))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    debug!("analyze: called");
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "analyze: rejected body");
        api_error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    })?;

    if request.tasks.trim().is_empty() {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "tasks must not be empty"));
    }
    let chars = request.tasks.chars().count();
    if chars > state.max_input_chars {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("tasks must be at most {} characters (got {})", state.max_input_chars, chars),
        ));
    }

    let result = state
        .analyzer
        .analyze(&request.tasks)
        .await
        .map_err(|e| map_analyze_error(e, &state.api_key_env))?;
    Ok(Json(result))
}

fn map_analyze_error(err: AnalyzeError, api_key_env: &str) -> ApiError {
    if err.is_user_error() {
        debug!(error = %err, "map_analyze_error: user error");
        return api_error(StatusCode::BAD_REQUEST, err.to_string());
    }
    error!(error = %err, "Analysis failed");
    if err.is_credential_error() {
        return api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "API key is not configured or was rejected. Please set the {} environment variable.",
                api_key_env
            ),
        );
    }
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to analyze tasks: {}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerConfig;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    const REPLY: &str = r#"{
        "priorities": {"must": ["Write report"], "should": ["Call client"], "optional": []},
        "breakdown": {"Write report": {"steps": [{"step": "Open document", "minutes": 2}]}},
        "next_action": {"task": "Write report", "step": "Open document", "minutes": 2}
    }"#;

    fn app_with(mock: MockLlmClient) -> Router {
        let analyzer = Arc::new(Analyzer::new(Arc::new(mock), AnalyzerConfig::default()));
        let state = AppState::new(analyzer, &Config::default());
        router(state, "http://localhost:3000").unwrap()
    }

    fn app() -> Router {
        app_with(MockLlmClient::with_text(REPLY))
    }

    fn post_json(body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (status, json) = send(app(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "ToDo Prioritizer API");

        let (status, json) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let body = serde_json::json!({"tasks": "Write report\nCall client"}).to_string();
        let (status, json) = send(app(), post_json(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["priorities"]["must"][0], "Write report");
        assert_eq!(json["priorities"]["should"][0], "Call client");
        assert_eq!(json["breakdown"]["Write report"]["steps"][0]["step"], "Open document");
        assert_eq!(json["breakdown"]["Call client"]["steps"][0]["step"], "Start working on Call client");
        assert_eq!(json["next_action"]["task"], "Write report");
        assert_eq!(json["next_action"]["minutes"], 2);
    }

    #[tokio::test]
    async fn test_missing_field_is_422() {
        let (status, json) = send(app(), post_json("{}")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_422() {
        let (status, _) = send(app(), post_json("{not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_blank_tasks_is_422() {
        let body = serde_json::json!({"tasks": "   "}).to_string();
        let (status, _) = send(app(), post_json(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_too_long_is_422() {
        let body = serde_json::json!({"tasks": "x".repeat(2001)}).to_string();
        let (status, json) = send(app(), post_json(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().unwrap().contains("2000"));
    }

    #[test]
    fn test_empty_input_maps_to_400() {
        let (status, Json(body)) = map_analyze_error(AnalyzeError::EmptyInput, "OPENAI_API_KEY");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.detail.contains("No valid tasks"));
    }

    #[test]
    fn test_missing_credential_maps_to_500() {
        let err = AnalyzeError::MissingCredential("OPENAI_API_KEY".to_string());
        let (status, Json(body)) = map_analyze_error(err, "OPENAI_API_KEY");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.detail.contains("API key is not configured"));
    }

    #[tokio::test]
    async fn test_too_many_tasks_is_400() {
        let tasks: Vec<String> = (0..51).map(|i| format!("T{}", i)).collect();
        let body = serde_json::json!({"tasks": tasks.join("\n")}).to_string();
        let (status, json) = send(app(), post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "Too many tasks (51). Maximum 50 tasks allowed.");
    }

    #[tokio::test]
    async fn test_engine_failure_is_500() {
        let mock = MockLlmClient::new(vec![MockReply::ApiError {
            status: 500,
            message: "boom".to_string(),
        }]);
        let body = serde_json::json!({"tasks": "Task 1"}).to_string();
        let (status, json) = send(app_with(mock), post_json(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Failed to analyze tasks"));
    }

    #[tokio::test]
    async fn test_rejected_key_gets_specific_message() {
        let mock = MockLlmClient::new(vec![MockReply::ApiError {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        }]);
        let body = serde_json::json!({"tasks": "Task 1"}).to_string();
        let (status, json) = send(app_with(mock), post_json(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_unparseable_engine_reply_is_500() {
        let body = serde_json::json!({"tasks": "Task 1"}).to_string();
        let (status, _) = send(app_with(MockLlmClient::with_text("not json")), post_json(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_cors_allows_frontend_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/analyze")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
    }

    #[tokio::test]
    async fn test_cors_ignores_other_origins() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight_from_other_origin_gets_no_allow_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/analyze")
            .header(header::ORIGIN, "http://evil.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_cors_trailing_slash_in_frontend_url() {
        let analyzer = Arc::new(Analyzer::new(
            Arc::new(MockLlmClient::with_text(REPLY)),
            AnalyzerConfig::default(),
        ));
        let app = router(AppState::new(analyzer, &Config::default()), "http://localhost:3000/").unwrap();
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_invalid_frontend_url_is_error() {
        let analyzer = Arc::new(Analyzer::new(
            Arc::new(MockLlmClient::with_text(REPLY)),
            AnalyzerConfig::default(),
        ));
        let state = AppState::new(analyzer, &Config::default());
        assert!(router(state, "http://bad\norigin").is_err());
    }
}
