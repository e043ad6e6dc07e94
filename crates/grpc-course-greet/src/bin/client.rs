//! Greet client binary: one subcommand per call shape.
//!
//! The bidirectional demo goes through the shared duplex driver, which runs
//! the send and receive loops concurrently and only returns once both
//! directions have finished.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use core::time::Duration;
use grpc_course_core::duplex::{ChannelSender, drain, drive, send_all};
use grpc_course_core::proto::greet::{
    GreetEveryoneRequest, GreetManyTimesRequest, GreetRequest, GreetWithDeadlineRequest, Greeting,
    LongGreetRequest, PersonDetailRequest, greet_service_client::GreetServiceClient,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Request};

#[derive(Parser, Debug)]
#[command(name = "greet-client", about = "Greet demo gRPC client")]
struct CliArgs {
    /// Server URL. Use an `https://` URL together with `--tls-ca`.
    #[arg(long, env = "GREET_SERVER_URL", default_value = "http://localhost:50051")]
    url: String,

    /// Path to the PEM-encoded CA trust certificate; enables TLS.
    #[arg(long, env = "GREET_TLS_CA")]
    tls_ca: Option<PathBuf>,

    /// Domain name to verify the server certificate against.
    #[arg(long)]
    tls_domain: Option<String>,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand, Debug)]
enum Demo {
    /// Unary Greet call.
    Unary,
    /// Unary ShowDetails call.
    Details,
    /// Server-streaming GreetManyTimes call.
    ServerStreaming,
    /// Client-streaming LongGreet call.
    ClientStreaming,
    /// Bidirectional GreetEveryone call through the duplex driver.
    Bidi,
    /// GreetWithDeadline with a caller-chosen deadline.
    Deadline {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

fn greeting(first: &str, last: &str) -> Greeting {
    Greeting {
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

fn sample_greetings() -> Vec<Greeting> {
    vec![
        greeting("Bogdan", "Copocean"),
        greeting("Roxana", "Copocean"),
        greeting("Roxana", "Mica"),
        greeting("Bogdan", "Mica"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let channel = connect(&args).await?;
    let mut client = GreetServiceClient::new(channel);

    match args.demo {
        Demo::Unary => {
            let res = client
                .greet(GreetRequest {
                    greeting: Some(greeting("Bogdan", "Copocean")),
                })
                .await?;
            println!("Response from Greet: {}", res.into_inner().result);
        }
        Demo::Details => {
            let res = client
                .show_details(PersonDetailRequest {
                    person_name: "Bogdan-Lucian Copocean".to_string(),
                })
                .await?;
            let details = res.into_inner();
            println!(
                "Response from ShowDetails: {:?}, {}, {}",
                details.hobbies, details.age, details.employed
            );
        }
        Demo::ServerStreaming => {
            let mut stream = client
                .greet_many_times(GreetManyTimesRequest {
                    greeting: Some(greeting("Bogdan", "Copocean")),
                })
                .await?
                .into_inner();

            let (count, result) = drain(&mut stream, |res| {
                println!("Response from GreetManyTimes: {}", res.result);
            })
            .await;
            result.with_context(|| format!("stream broke after {count} responses"))?;
        }
        Demo::ClientStreaming => {
            let requests: Vec<_> = sample_greetings()
                .into_iter()
                .map(|g| LongGreetRequest { greeting: Some(g) })
                .collect();

            let (tx, rx) = mpsc::channel(4);
            let sender = tokio::spawn(async move {
                let mut half = ChannelSender::new(tx);
                send_all(&mut half, requests).await
            });

            let res = client.long_greet(ReceiverStream::new(rx)).await?;
            let (sent, send_result) = sender.await?;
            send_result.with_context(|| format!("upload broke after {sent} greetings"))?;
            println!("LongGreet result: {}", res.into_inner().result);
        }
        Demo::Bidi => {
            let requests: Vec<_> = sample_greetings()
                .into_iter()
                .map(|g| GreetEveryoneRequest { greeting: Some(g) })
                .collect();

            let (tx, rx) = mpsc::channel(4);
            let inbound = client
                .greet_everyone(ReceiverStream::new(rx))
                .await?
                .into_inner();

            let outcome = drive(ChannelSender::new(tx), inbound, requests, |res| {
                println!("Received: {}", res.result);
            })
            .await;

            outcome.send_result.context("send direction failed")?;
            outcome.recv_result.context("receive direction failed")?;
            println!(
                "GreetEveryone finished: {} sent, {} received",
                outcome.sent, outcome.received
            );
        }
        Demo::Deadline { seconds } => {
            let deadline = Duration::from_secs(seconds);
            let mut request = Request::new(GreetWithDeadlineRequest {
                greeting: Some(greeting("Bogdan", "Lucian")),
            });
            // Propagate the deadline to the server as grpc-timeout metadata.
            request.set_timeout(deadline);

            // Enforce it locally as well so the demo terminates even against
            // a server that ignores the metadata.
            match tokio::time::timeout(deadline, client.greet_with_deadline(request)).await {
                Err(_elapsed) => println!("Timeout hit! Deadline has exceeded"),
                Ok(Ok(res)) => println!("Response from server: {}", res.into_inner().result),
                Ok(Err(status)) if status.code() == Code::DeadlineExceeded => {
                    println!("Timeout hit! Deadline has exceeded")
                }
                Ok(Err(status)) => bail!("unexpected error: {status}"),
            }
        }
    }

    Ok(())
}

async fn connect(args: &CliArgs) -> anyhow::Result<Channel> {
    let mut endpoint = Endpoint::from_shared(args.url.clone())
        .with_context(|| format!("invalid server URL `{}`", args.url))?;

    if let Some(ca_path) = &args.tls_ca {
        let pem = std::fs::read(ca_path)
            .with_context(|| format!("failed to read CA certificate `{}`", ca_path.display()))?;
        let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
        if let Some(domain) = &args.tls_domain {
            tls = tls.domain_name(domain.clone());
        }
        endpoint = endpoint.tls_config(tls)?;
    }

    endpoint
        .connect()
        .await
        .with_context(|| format!("could not connect to `{}`", args.url))
}
