//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for user accounts, the product catalog and order
//! placement, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::{AppState, Backend, InMemory, Postgres};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: Backend>(state: Arc<AppState<B>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let v1 = Router::new()
        .route("/users/register", post(routes::users::register::<B>))
        .route("/users/login", post(routes::users::login::<B>))
        .route("/users/{id}", get(routes::users::get::<B>))
        .route("/users/{id}/orders", get(routes::orders::list_for_user::<B>))
        .route("/products", post(routes::products::create::<B>))
        .route("/products", get(routes::products::list::<B>))
        .route("/products/{id}", get(routes::products::get::<B>))
        .route("/products/{id}/price", put(routes::products::update_price::<B>))
        .route("/products/{id}/stock", put(routes::products::adjust_stock::<B>))
        .route("/orders", post(routes::orders::create::<B>))
        .route("/orders/{id}", get(routes::orders::get::<B>))
        .route("/orders/{id}/confirm", put(routes::orders::confirm::<B>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<B>))
        .route("/orders/{id}/complete", put(routes::orders::complete::<B>));

    Router::new()
        .route("/health", get(routes::health::check::<B>))
        .nest("/v1", v1)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
