//! HTTP API server with observability for the sales service.
//!
//! Exposes sale and sale-item endpoints under `/api/sales`, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::{EventPublisher, LoggingEventPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use sale_store::SaleRepository;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: SaleRepository + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/sales",
            post(routes::sales::create::<R>).get(routes::sales::list::<R>),
        )
        .route(
            "/api/sales/{id}",
            get(routes::sales::get::<R>)
                .put(routes::sales::update::<R>)
                .delete(routes::sales::delete::<R>),
        )
        .route("/api/sales/{id}/cancel", patch(routes::sales::cancel::<R>))
        .route("/api/sales/{id}/items", post(routes::items::add::<R>))
        .route(
            "/api/sales/{id}/items/{item_id}",
            patch(routes::items::update::<R>).delete(routes::items::remove::<R>),
        )
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

/// Creates application state that logs every published sale event.
pub fn create_default_state<R: SaleRepository>(repository: R) -> Arc<AppState<R>> {
    create_state(repository, Arc::new(LoggingEventPublisher))
}

/// Creates application state with a custom event publisher.
pub fn create_state<R: SaleRepository>(
    repository: R,
    publisher: Arc<dyn EventPublisher>,
) -> Arc<AppState<R>> {
    Arc::new(AppState::new(repository, publisher))
}
