//! Checklist Server - local document service
//!
//! Serves the checklist document over HTTP on the loopback interface so a
//! browser-hosted editor can read and replace it.

pub mod cors;
pub mod http;
pub mod report;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use checklist_core::{ConfigError, ServerConfig, Store, StoreError};

/// Shared application state
pub struct AppState {
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Startup and runtime failures of the service
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize document: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create the API router
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/data",
            get(http::get_data)
                .head(http::not_found)
                .post(http::post_data)
                .fallback(http::not_found),
        )
        .fallback(http::not_found)
        // Middleware
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(cors::cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize the document, bind the fixed loopback port and serve until
/// Ctrl-C or SIGTERM.
pub async fn serve(config: &ServerConfig) -> Result<(), ServerError> {
    let store = Store::new(config.data_path()?);
    store.initialize()?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!("Tab checklist server running on http://{}", addr);
    tracing::info!("Document at {:?}", store.path());

    serve_with_listener(
        listener,
        Arc::new(AppState::new(store)),
        config.max_body_bytes,
        shutdown_signal(),
    )
    .await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_with_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    max_body_bytes: usize,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let app = create_router(state, max_body_bytes);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutting down...");
}
