//! HTTP server lifecycle.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::controller::{AppState, create_router};

/// HTTP server for the API, chart, health and metrics routes.
pub struct HttpServer {
    port: u16,
    state: AppState,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: AppState, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Bind the configured port on all interfaces and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.port, e.to_string()))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if the HTTP server fails while running.
    pub async fn serve(self, listener: TcpListener) -> Result<(), HttpServerError> {
        let local_addr = listener.local_addr().ok();
        tracing::info!(addr = ?local_addr, "HTTP server listening");

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::application::ports::MockPriceSource;
    use crate::application::services::{PriceCacheProxy, ProxySettings};
    use crate::infrastructure::cache::InMemoryQuoteCache;

    fn state() -> AppState {
        let proxy = PriceCacheProxy::new(
            Arc::new(InMemoryQuoteCache::new()),
            Arc::new(MockPriceSource::new()),
            ProxySettings::new(vec!["bitcoin".to_string()], "usd"),
        );
        AppState::new(Arc::new(proxy), "0.0.0-test")
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let server = HttpServer::new(0, state(), cancel.clone());

        let handle = tokio::spawn(server.serve(listener));
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = HttpServer::new(port, state(), CancellationToken::new());
        let error = server.run().await.unwrap_err();

        assert!(matches!(error, HttpServerError::BindFailed(p, _) if p == port));
    }

    #[test]
    fn error_display() {
        let error = HttpServerError::BindFailed(8000, "address in use".to_string());
        assert_eq!(error.to_string(), "failed to bind to port 8000: address in use");
    }
}
