//! HTTP adapter hosting the recache pipeline.

mod handlers;
mod middleware;
mod state;

pub use state::RecacheState;

use std::future::IntoFuture;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};

use crate::config::ServerSettings;
use crate::infra::error::InfraError;

pub fn build_router(state: RecacheState, body_limit: usize) -> Router {
    Router::new()
        .route("/recache", post(handlers::recache))
        .route("/healthz", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

/// Serve until a shutdown signal arrives, then drain in-flight requests for at most
/// the configured grace period.
pub async fn serve(settings: &ServerSettings, router: Router) -> Result<(), InfraError> {
    let listener = TcpListener::bind(settings.addr).await?;
    info!(
        target = "prerender_recache::http",
        addr = %settings.addr,
        "listening for recache requests"
    );

    let signalled = Arc::new(Notify::new());
    let notifier = signalled.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notifier.notify_one();
        })
        .into_future();

    let grace = settings.graceful_shutdown;
    let drain_deadline = async move {
        signalled.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result.map_err(|err| InfraError::server(err.to_string())),
        _ = drain_deadline => {
            warn!(
                target = "prerender_recache::http",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out with requests in flight"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "prerender_recache::http", error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "prerender_recache::http", error = %err, "SIGTERM handler failed");
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

    info!(target = "prerender_recache::http", "shutdown signal received");
}
