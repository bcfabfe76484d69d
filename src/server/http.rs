// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! HTTP control surface: `/check_subscriber`, `/stop`, `/healthz` (spec
//! §4.4).

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::Notify};
use tracing::info;

use crate::registry::Registry;

#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    stop_requested: Arc<Notify>,
}

#[derive(Deserialize)]
struct CheckSubscriberParams {
    imsi: Option<String>,
}

async fn check_subscriber(
    State(state): State<AppState>,
    Query(params): Query<CheckSubscriberParams>,
) -> impl IntoResponse {
    let Some(imsi) = params.imsi else {
        return (StatusCode::BAD_REQUEST, "missing imsi query parameter").into_response();
    };
    let body = if state.registry.contains(&imsi) {
        "active"
    } else {
        "not active"
    };
    (StatusCode::OK, body).into_response()
}

async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.registry.begin_shutdown();
    state.stop_requested.notify_waiters();
    info!("shutdown requested via /stop");
    (StatusCode::OK, "Shutdown initiated")
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Binds the configured HTTP port on all interfaces and serves requests
/// until the registry's drain completes. Bind failure is fatal per spec
/// §7.
pub async fn run(http_port: u16, registry: Arc<Registry>) -> Result<()> {
    let stop_requested = Arc::new(Notify::new());
    let state = AppState {
        registry: registry.clone(),
        stop_requested: stop_requested.clone(),
    };
    let app = Router::new()
        .route("/check_subscriber", get(check_subscriber))
        .route("/stop", get(stop))
        .route("/healthz", get(healthz))
        .with_state(state);

    let listener = TcpListener::bind(("0.0.0.0", http_port))
        .await
        .with_context(|| format!("cannot bind HTTP listener on port {http_port}"))?;
    info!(port = http_port, "HTTP control surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            loop {
                if registry.is_shutting_down() {
                    return;
                }
                let notified = stop_requested.notified();
                if registry.is_shutting_down() {
                    return;
                }
                notified.await;
            }
        })
        .await
        .context("HTTP server failed")?;
    Ok(())
}
