//! HTTP API server for the course assistant.
//!
//! Provides REST endpoints for queries, course statistics and sessions.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    rag: RagSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    docs: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    let docs_dir = match docs {
        Some(dir) => Settings::expand_path(&dir),
        None => settings.docs_dir(),
    };
    if docs_dir.is_dir() {
        Output::info(&format!("Loading course documents from {}", docs_dir.display()));
        match rag.add_course_folder(&docs_dir, false).await {
            Ok((courses, chunks)) => {
                Output::success(&format!("Loaded {} courses with {} chunks", courses, chunks))
            }
            Err(e) => Output::warning(&format!("Error loading documents: {}", e)),
        }
    } else {
        Output::warning(&format!("Docs folder not found: {}", docs_dir.display()));
    }

    let app = router(Arc::new(AppState { rag }));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Coursemate API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    Output::kv("Clear session", "POST /api/session/clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/session/clear", post(clear_session))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct ClearSessionRequest {
    session_id: String,
}

#[derive(Serialize)]
struct ClearSessionResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn internal_error(detail: String) -> axum::response::Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { detail })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    match state.rag.query(&req.query, req.session_id.as_deref()).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("Query failed: {}", e);
            internal_error(e.to_string())
        }
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.rag.course_analytics().await {
        Ok(analytics) => Json(analytics).into_response(),
        Err(e) => {
            error!("Course analytics failed: {}", e);
            internal_error(e.to_string())
        }
    }
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearSessionRequest>,
) -> impl IntoResponse {
    let response = match state.rag.sessions().clear_session(&req.session_id) {
        Ok(()) => ClearSessionResponse {
            success: true,
            message: format!("Session {} cleared successfully", req.session_id),
        },
        Err(e) => ClearSessionResponse {
            success: false,
            message: format!("Failed to clear session: {}", e),
        },
    };
    Json(response)
}
