//! Static file server for the built site.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::port::{bind_first_free, PortRange};

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory to serve
    pub site_dir: PathBuf,

    /// Address to bind to
    pub host: IpAddr,

    /// Candidate ports
    pub ports: PortRange,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            site_dir: PathBuf::from("site"),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ports: PortRange::default(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Site directory '{0}' not found.")]
    SiteNotFound(String),

    #[error("All ports {first}-{last} are in use.")]
    AllPortsInUse { first: u16, last: u16 },

    #[error("Failed to bind to {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("Server error: {0}")]
    Io(#[from] io::Error),
}

impl ServeError {
    /// A one-line hint on how to fix the error, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SiteNotFound(_) => {
                Some("Please run 'planexe-docs build' first to build the documentation.")
            }
            Self::AllPortsInUse { .. } => {
                Some("Stop another server (e.g. another 'planexe-docs serve') or free a port.")
            }
            _ => None,
        }
    }
}

/// Preview server for a built site.
pub struct StaticServer {
    config: ServerConfig,
}

impl StaticServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Check the site directory and bind the first free port.
    pub fn bind(self) -> Result<BoundServer, ServeError> {
        if !self.config.site_dir.is_dir() {
            return Err(ServeError::SiteNotFound(
                self.config.site_dir.display().to_string(),
            ));
        }

        let (listener, port) = bind_first_free(self.config.host, self.config.ports)?;
        tracing::debug!("Bound {}:{}", self.config.host, port);

        Ok(BoundServer {
            listener,
            port,
            site_dir: self.config.site_dir,
        })
    }
}

/// A server holding its listening socket, ready to serve.
pub struct BoundServer {
    listener: TcpListener,
    port: u16,
    site_dir: PathBuf,
}

impl BoundServer {
    /// The port that was bound.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve the site until `shutdown` resolves, then release the socket.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Serving {}", self.site_dir.display());

        let app = Router::new().fallback_service(ServeDir::new(&self.site_dir));

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
