//! The HTTP surface over a [`DocumentStore`].
//!
//! Every response under `/api/dynamic-forms` uses the envelope
//! `{ "status": <code>, "message": <text>, "data": <payload or null> }`.

use crate::error::{ServerError, StoreError};
use crate::store::{DocumentStore, SqliteDocumentStore, seed_if_empty};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Where the server listens and keeps its data.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database: PathBuf,
    /// Insert the bundled workflows into an empty database on start.
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            database: PathBuf::from("data/app.db"),
            seed: true,
        }
    }
}

pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Serialize)]
struct Envelope {
    status: u16,
    message: String,
    data: Option<Value>,
}

fn respond(status: StatusCode, message: impl Into<String>, data: Option<Value>) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: message.into(),
        data,
    };
    (status, Json(body)).into_response()
}

fn store_failure(error: &StoreError) -> Response {
    let status = match error {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Schema(_) => StatusCode::BAD_REQUEST,
        StoreError::Corrupt { .. } | StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(error = %error, "store request failed");
    }
    respond(status, error.to_string(), None)
}

/// Builds the application router around a store.
pub fn router(store: Arc<dyn DocumentStore>) -> Router {
    let state = Arc::new(AppState { store });
    Router::new()
        .route("/api", get(health))
        .route("/api/dynamic-forms", get(list_workflows))
        .route(
            "/api/dynamic-forms/{workflow_id}",
            get(get_workflow).post(upsert_workflow),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// GET /api
async fn health() -> Json<Value> {
    Json(serde_json::json!({ "message": "Server is running" }))
}

// GET /api/dynamic-forms
async fn list_workflows(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list().await {
        Ok(rows) => match serde_json::to_value(rows) {
            Ok(data) => respond(StatusCode::OK, "OK", Some(data)),
            Err(e) => respond(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
        },
        Err(e) => store_failure(&e),
    }
}

// GET /api/dynamic-forms/{workflow_id}
async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Response {
    match state.store.get(&workflow_id).await {
        Ok(document) => respond(StatusCode::OK, "OK", Some(document)),
        Err(e) => store_failure(&e),
    }
}

// POST /api/dynamic-forms/{workflow_id}
async fn upsert_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
    body: Bytes,
) -> Response {
    let document: Value = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(e) => {
            return respond(
                StatusCode::BAD_REQUEST,
                format!("Request body is not valid JSON: {}", e),
                None,
            );
        }
    };
    match state.store.upsert(&workflow_id, document).await {
        Ok(()) => respond(StatusCode::OK, "Saved", None),
        Err(e) => store_failure(&e),
    }
}

/// Opens the database, seeds it if asked, and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let store = Arc::new(SqliteDocumentStore::open(&config.database)?);
    if config.seed {
        seed_if_empty(store.as_ref()).await?;
    }

    let app = router(store);
    let listener = TcpListener::bind(config.bind).await?;
    info!(bind = %config.bind, database = %config.database.display(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for shutdown signal");
            }
        })
        .await?;

    info!("server shut down");
    Ok(())
}
