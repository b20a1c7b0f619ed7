//! ==============================================================================
//! server.rs - http interface
//! ==============================================================================
//!
//! routes:
//!     GET /        latest reading (same as /data)
//!     GET /data    {temperature, humidity, timestamp, status}
//!     GET /health  {status: "running", timestamp} - liveness only
//!
//! handlers only see `ReadingQuery`; nothing here can reach the sensor.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::domain::ReadingView;
use crate::query::ReadingQuery;

pub fn router(query: ReadingQuery) -> Router {
    Router::new()
        .route("/", get(data_handler))
        .route("/data", get(data_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(query)
}

pub async fn serve(bind_addr: &str, query: ReadingQuery) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("[SERVER] DHT22 server live at http://{}", bind_addr);
    axum::serve(listener, router(query)).await?;
    Ok(())
}

async fn data_handler(State(query): State<ReadingQuery>) -> Json<ReadingView> {
    Json(query.query())
}

async fn health_handler(State(query): State<ReadingQuery>) -> Json<Value> {
    Json(json!({"status": "running", "timestamp": query.now_unix()}))
}
