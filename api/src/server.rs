//! The HTTP server: bind, serve, shut down gracefully.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::{router, AppState};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// The API server, optionally fronting a static UI directory.
pub struct ApiServer {
    addr: String,
    state: AppState,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    pub fn new(addr: impl Into<String>, state: AppState) -> Self {
        Self {
            addr: addr.into(),
            state,
            static_dir: None,
        }
    }

    /// Serve a UI directory at the root, next to the API.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Run until the shutdown signal fires, then stop accepting and drain
    /// in-flight requests.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let mut app = router(self.state);
        if let Some(dir) = &self.static_dir {
            tracing::info!(dir = %dir.display(), "serving static files at /");
            app = app.fallback_service(ServeDir::new(dir));
        }

        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.clone(),
                source,
            })?;
        let local = listener.local_addr().map_err(ServerError::Serve)?;
        tracing::info!("API server listening on http://{local}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("API server draining");
            })
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("API server stopped");
        Ok(())
    }
}
