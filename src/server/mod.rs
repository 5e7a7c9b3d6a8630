use crate::config::Config;
use crate::crud::{CrudClient, MetadataResolver};
use crate::images::{ImageGateway, ImageStorage};
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Router, ServiceExt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

pub mod request_id;
pub mod routes_images;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub gateway: Arc<ImageGateway>,
}

impl AppContext {
    /// Build the context talking to the metadata service named in `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client =
            CrudClient::new(&config.crud).context("Failed to build metadata service client")?;
        let resolver: Arc<dyn MetadataResolver> = Arc::new(client);
        Ok(Self::with_resolver(config, resolver))
    }

    /// Build the context around an explicit resolver.
    pub fn with_resolver(config: Config, resolver: Arc<dyn MetadataResolver>) -> Self {
        let storage = ImageStorage::new(config.storage.resources_path.clone());
        Self {
            gateway: Arc::new(ImageGateway::new(resolver, storage)),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes.
///
/// Trailing slashes are stripped before routing, so `/cardimage/` and
/// `/cardimage` reach the same handler.
pub fn create_router(ctx: AppContext) -> NormalizePath<Router> {
    let body_limit = ctx.config.server.max_body_bytes;

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(routes_images::image_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    NormalizePathLayer::trim_trailing_slash().layer(app)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    tracing::info!(
        "Resources root: {:?}, metadata service: {}",
        config.storage.resources_path,
        config.crud.base_url()
    );

    let ctx = AppContext::new(config)?;
    let app = create_router(ctx);

    tracing::info!("Starting service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
