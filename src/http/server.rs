//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that hands every request to the handler pool
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve one bound address, plain or TLS, until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ResterConfig;
use crate::error::StartupError;
use crate::lifecycle::shutdown;
use crate::net::{BoundAddress, BoundListener};
use crate::pipeline::HandlerPool;

/// One server instance; every instance shares the same handler pool.
#[derive(Clone)]
pub struct HttpServer {
    router: Router,
    shutdown_grace: Duration,
}

impl HttpServer {
    pub fn new(pool: Arc<HandlerPool>, config: &ResterConfig) -> Self {
        Self {
            router: Self::build_router(pool, config),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Routing is done by the pool, so every method and path goes to the fallback.
    #[allow(deprecated)]
    fn build_router(pool: Arc<HandlerPool>, config: &ResterConfig) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(pool)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve `bound` until the shutdown signal fires.
    pub async fn serve(
        self,
        bound: BoundAddress,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        let local_addr = bound.local_addr;
        tracing::info!(
            address = %local_addr,
            url = %bound.address.url(),
            "HTTP server starting"
        );

        match bound.listener {
            BoundListener::Http(listener) => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown::wait(shutdown_rx))
                    .await
                    .map_err(StartupError::Serve)?;
            }
            BoundListener::Https(listener, tls) => {
                let handle = axum_server::Handle::new();
                let signal = handle.clone();
                let grace = self.shutdown_grace;
                tokio::spawn(async move {
                    shutdown::wait(shutdown_rx).await;
                    signal.graceful_shutdown(Some(grace));
                });

                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await
                    .map_err(StartupError::Serve)?;
            }
        }

        tracing::info!(address = %local_addr, "HTTP server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("shutdown_grace", &self.shutdown_grace)
            .finish()
    }
}

async fn dispatch(State(pool): State<Arc<HandlerPool>>, request: Request<Body>) -> Response {
    pool.process(request).await
}
