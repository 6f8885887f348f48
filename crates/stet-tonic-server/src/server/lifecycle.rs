//! Service lifecycle.
//!
//! Startup and shutdown are modelled as a chain of owned states so each step
//! can only run once and in order:
//!
//! ```text
//! Lifecycle::connect ──► Connected ──bind──► Serving ──run_until──► Stopped
//! ```
//!
//! `connect` and `bind` fail with [`StartupError`]; the caller decides whether
//! that aborts the process. Once serving, the only way out is the external
//! [`CancellationToken`]. Teardown then drains the server, closes the
//! listener and closes the store, in that order. Each teardown step is
//! best-effort: failures are logged and the remaining steps still run.

use crate::server::{config::ServerConfig, service::handler::PersonService, store::PersonStore};
use futures::{Stream, stream};
use std::{io, net::SocketAddr, sync::Arc};
use stet_tonic_core::proto::{FILE_DESCRIPTOR_SET, stet_service_server::StetServiceServer};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Failures that prevent the service from ever serving.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("cannot connect to document store: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("cannot bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("cannot build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
}

/// Entry point of the lifecycle; no resources are held yet.
pub struct Lifecycle;

impl Lifecycle {
    /// Establishes the store connection selected by `config`.
    pub async fn connect(config: ServerConfig) -> Result<Connected, StartupError> {
        tracing::info!(backend = ?config.store, "Connecting to document store");
        let store = crate::server::store::connect(&config).await?;
        Ok(Connected { config, store })
    }

    /// Starts from an already constructed store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn PersonStore>) -> Connected {
        Connected { config, store }
    }
}

/// The store is reachable; nothing is listening yet.
pub struct Connected {
    config: ServerConfig,
    store: Arc<dyn PersonStore>,
}

impl Connected {
    /// Binds the listener and starts serving on a background task.
    pub async fn bind(self) -> Result<Serving, StartupError> {
        let addr = self.config.server_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StartupError::Bind { addr, source })?;
        let listener = Arc::new(listener);

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<StetServiceServer<PersonService>>()
            .await;

        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let service = PersonService::new(Arc::clone(&self.store));
        let drain = CancellationToken::new();

        let server = Server::builder()
            .accept_http1(true)
            .http2_adaptive_window(Some(true))
            .layer(
                ServiceBuilder::new()
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(GrpcWebLayer::new()),
            )
            .add_service(health_service)
            .add_service(reflection)
            .add_service(build_person_service(service))
            .serve_with_incoming_shutdown(
                incoming(Arc::clone(&listener)),
                drain.clone().cancelled_owned(),
            );

        tracing::info!(%local_addr, "Starting server");
        let server = tokio::spawn(server);

        Ok(Serving {
            local_addr,
            listener,
            store: self.store,
            health_reporter,
            server,
            drain,
        })
    }
}

/// Accepting RPCs on a background task.
pub struct Serving {
    local_addr: SocketAddr,
    listener: Arc<TcpListener>,
    store: Arc<dyn PersonStore>,
    health_reporter: HealthReporter,
    server: JoinHandle<Result<(), tonic::transport::Error>>,
    drain: CancellationToken,
}

/// Terminal state. All resources have been released.
#[derive(Debug)]
pub struct Stopped;

impl Serving {
    /// The address actually bound, useful when configured with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `signal` is cancelled, then tears everything down.
    pub async fn run_until(self, signal: CancellationToken) -> Stopped {
        signal.cancelled().await;
        tracing::info!("Shutdown signal received, terminating gracefully...");

        self.health_reporter
            .set_not_serving::<StetServiceServer<PersonService>>()
            .await;

        tracing::info!("Stopping the server");
        self.drain.cancel();
        match self.server.await {
            Ok(Ok(())) => tracing::info!("Server drained"),
            Ok(Err(e)) => tracing::error!(error = %e, "Server exited with an error"),
            Err(e) => tracing::error!(error = %e, "Server task failed"),
        }

        tracing::info!("Closing the listener");
        match Arc::try_unwrap(self.listener) {
            Ok(listener) => drop(listener),
            Err(_) => {
                tracing::warn!("Listener still referenced; it closes when the last handle drops")
            }
        }

        tracing::info!("Closing the store connection");
        if let Err(e) = self.store.close().await {
            tracing::error!(error = %e, "Error closing the store connection");
        }

        tracing::info!("Service shut down successfully");
        Stopped
    }
}

fn build_person_service(service: PersonService) -> StetServiceServer<PersonService> {
    StetServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// Connection stream over a shared listener.
///
/// The server owns one handle; [`Serving`] keeps the other so the listener
/// is closed explicitly once the server has stopped.
fn incoming(
    listener: Arc<TcpListener>,
) -> impl Stream<Item = io::Result<TcpStream>> + Send + 'static {
    Box::pin(stream::unfold(listener, |listener| async move {
        let conn = listener.accept().await.map(|(stream, _)| stream);
        Some((conn, listener))
    }))
}
