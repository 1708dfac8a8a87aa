// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only by default. Thin adapters over the task
// service; every failure path funnels through `ApiError`.
//
// Endpoints:
//   GET    /tasks        list (status filter + pagination)
//   POST   /tasks        create
//   PATCH  /tasks/{id}   update status
//   DELETE /tasks/{id}   delete
//   GET    /             health

pub mod extract;
pub mod routes;

use anyhow::Result;
use axum::{
    extract::OriginalUri,
    http::{header, HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::AppContext;

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("REST API listening on http://{}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    // ctrl-c failing to register would leave no way to stop gracefully;
    // treat it the same as receiving the signal.
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.config);
    Router::new()
        // Health (root, as a liveness probe)
        .route("/", get(routes::health::health))
        // Tasks
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            patch(routes::tasks::update_task_status).delete(routes::tasks::delete_task),
        )
        .fallback(route_not_found)
        .layer(cors)
        .with_state(ctx)
}

/// Unmatched routes return the same 404 envelope as a missing task.
async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Route not found - {}", uri.path()))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let any_origin =
        config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*");

    if any_origin {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    }
}
