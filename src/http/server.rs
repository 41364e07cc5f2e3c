//! HTTP server implementation.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{Result, TollgateError};

/// HTTP server for the rate limited endpoints.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server for `router`.
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self { addr, router }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            TollgateError::Io(e)
        })?;

        Self::serve_on(listener, self.router, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// Connections carry their peer address so the rate limiting middleware
    /// can identify clients.
    pub async fn serve_on<F>(listener: TcpListener, router: Router, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "Starting HTTP server");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            TollgateError::Io(e)
        })
    }
}
