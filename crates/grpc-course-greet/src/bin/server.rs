//! Greet server binary: TLS-capable tonic server with health, reflection
//! and signal-driven graceful shutdown.

use clap::Parser;
use grpc_course_core::proto::FILE_DESCRIPTOR_SET;
use grpc_course_core::proto::greet::greet_service_server::GreetServiceServer;
use grpc_course_greet::config::{CliArgs, ServerConfig};
use grpc_course_greet::service::GreetService;
use tokio::signal;
use tonic::transport::{Identity, Server, ServerTlsConfig};
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

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<GreetServiceServer<GreetService>>()
        .await;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let mut builder = Server::builder();
    if let Some(tls) = &config.tls {
        let identity = Identity::from_pem(&tls.cert, &tls.key);
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        tracing::info!("TLS enabled");
    }

    tracing::info!("Greet service listening on {}", config.listen_addr);

    builder
        .add_service(health_service)
        .add_service(reflection)
        .add_service(GreetServiceServer::new(GreetService))
        .serve_with_shutdown(config.listen_addr, shutdown_signal(health_reporter))
        .await?;

    tracing::info!("Greet service shut down");
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
        .set_not_serving::<GreetServiceServer<GreetService>>()
        .await;
}
