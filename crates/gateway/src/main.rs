//! Past Papers API Gateway
//!
//! The HTTP entry point for the past papers collection.
//! Handles:
//! - Paper CRUD routes under the configured prefix
//! - Status, liveness and readiness endpoints
//! - CORS, request ids, and access logging
//! - Store connection lifecycle

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use pastpapers_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, PaperStore, Repository},
    metrics,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePath,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The routed application; trailing slashes are trimmed before routing
pub type App = NormalizePath<Router>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PaperStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.observability);

    info!(version = pastpapers_common::VERSION, "Starting Past Papers API");

    // Metrics exporter must be installed before descriptions are registered
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(address = %addr, "Metrics exporter listening");
    }
    metrics::register_metrics();

    // Open the store
    let db = DbPool::connect(&config.database).await?;
    db.ensure_schema(config.database.unique_composite_key).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(Repository::new(db.clone())),
    };

    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(
        address = %listener.local_addr()?,
        prefix = %config.server.normalized_prefix(),
        "Server is running"
    );

    axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing; RUST_LOG wins over the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> App {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Paper routes; the two-segment key route and the one-segment unit route
    // differ by segment count so neither shadows the other
    let paper_routes = Router::new()
        .route(
            "/papers",
            post(handlers::papers::create_paper).get(handlers::papers::list_papers),
        )
        .route(
            "/papers/{unit_code}/{year_taken}",
            get(handlers::papers::get_paper)
                .put(handlers::papers::update_paper)
                .delete(handlers::papers::delete_paper),
        )
        .route("/papers/{unit_code}", get(handlers::papers::list_papers_by_unit));

    let prefix = state.config.server.normalized_prefix();
    let api_routes = if prefix.is_empty() {
        paper_routes
    } else {
        Router::new().nest(&prefix, paper_routes)
    };

    // Compose the app
    let router = Router::new()
        .route("/", get(handlers::status::status))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .merge(api_routes)
        .fallback(handlers::status::not_found)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::access_log))
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state);

    // Path rewriting has to happen before the router picks a route
    NormalizePath::trim_trailing_slash(router)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{failing_app, send, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_status_points_at_papers() {
        let app = test_app("").await;
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Navigate to /papers" }));

        let app = test_app("/api/v1/").await;
        let (_, body) = send(&app, "GET", "/", None).await;
        assert_eq!(body["message"], "Navigate to /api/v1/papers");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app("").await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reflects_store() {
        let app = test_app("").await;
        let (status, body) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"]["status"], "up");

        let (status, body) = send(&failing_app(), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");
    }

    #[tokio::test]
    async fn test_cors_preflight_from_any_origin() {
        let app = test_app("").await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/papers")
                    .header("origin", "https://example.org")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_routes_like_bare_path() {
        let app = test_app("").await;
        let paper = json!({
            "unitCode": "CS101",
            "yearTaken": "2023",
            "unitTitle": "Intro",
            "fileLocation": "/f.pdf",
            "classOfStudy": "Undergraduate"
        });
        let (status, _) = send(&app, "POST", "/papers/", Some(paper)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", "/papers/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, body) = send(&app, "GET", "/papers/CS101/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["unitCode"], "CS101");

        let (status, body) = send(&app, "GET", "/papers/CS101/2023/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["yearTaken"], "2023");
    }

    #[tokio::test]
    async fn test_trailing_slash_under_prefix() {
        let app = test_app("/api/v1").await;
        let (status, body) = send(&app, "GET", "/api/v1/papers/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Papers NOT found" }));
    }

    #[tokio::test]
    async fn test_unknown_route_has_message_body() {
        let app = test_app("/api/v1").await;
        let (status, body) = send(&app, "GET", "/papers", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Cannot GET /papers" }));

        let (status, body) = send(&app, "GET", "/api/v1/papers/CS101/2023/extra", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Cannot GET /api/v1/papers/CS101/2023/extra");
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let app = test_app("").await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
