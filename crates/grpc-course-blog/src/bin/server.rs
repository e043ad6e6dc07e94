//! Blog server binary: CRUD service over an injected document store, with
//! health, reflection and signal-driven graceful shutdown. The store handle
//! outlives the listener and is released last.

use clap::Parser;
use grpc_course_blog::config::{CliArgs, ServerConfig};
use grpc_course_blog::service::BlogService;
use grpc_course_blog::store::{DocumentStore, MemoryStore};
use grpc_course_core::proto::FILE_DESCRIPTOR_SET;
use grpc_course_core::proto::blog::blog_service_server::BlogServiceServer;
use std::sync::Arc;
use tokio::signal;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    tracing::info!("Connecting to the document store...");
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::default());

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<BlogServiceServer<BlogService>>()
        .await;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    tracing::info!("Blog service listening on {}", config.listen_addr);

    Server::builder()
        .add_service(health_service)
        .add_service(reflection)
        .add_service(BlogServiceServer::new(BlogService::new(Arc::clone(&store))))
        .serve_with_shutdown(config.listen_addr, shutdown_signal(health_reporter))
        .await?;

    tracing::info!("Listener closed");
    drop(store);
    tracing::info!("Document store released");
    Ok(())
}

async fn shutdown_signal(health_reporter: HealthReporter) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    health_reporter
        .set_not_serving::<BlogServiceServer<BlogService>>()
        .await;
}
