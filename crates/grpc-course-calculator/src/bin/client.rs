//! Calculator client binary: one subcommand per call shape.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use grpc_course_core::duplex::{ChannelSender, drive};
use grpc_course_core::proto::calculator::{
    FindMaximumRequest, SquareRootRequest, SumRequest,
    calculator_service_client::CalculatorServiceClient,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Code;

#[derive(Parser, Debug)]
#[command(name = "calculator-client", about = "Calculator demo gRPC client")]
struct CliArgs {
    /// Server URL.
    #[arg(long, env = "CALCULATOR_SERVER_URL", default_value = "http://localhost:50052")]
    url: String,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand, Debug)]
enum Demo {
    /// Unary Sum call.
    Sum {
        #[arg(default_value_t = 5)]
        first: i32,
        #[arg(default_value_t = 12)]
        second: i32,
    },
    /// Unary SquareRoot call; pass a negative number to see the
    /// InvalidArgument path.
    Sqrt {
        #[arg(allow_negative_numbers = true, default_value_t = 9)]
        number: i32,
    },
    /// Bidirectional FindMaximum call through the duplex driver.
    Bidi,
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

    let mut client = CalculatorServiceClient::connect(args.url.clone())
        .await
        .with_context(|| format!("could not connect to `{}`", args.url))?;

    match args.demo {
        Demo::Sum { first, second } => {
            let res = client
                .sum(SumRequest {
                    first_number: first,
                    second_number: second,
                })
                .await?;
            println!("{first} + {second} = {}", res.into_inner().sum_result);
        }
        Demo::Sqrt { number } => match client.square_root(SquareRootRequest { number }).await {
            Ok(res) => println!("sqrt({number}) = {}", res.into_inner().number_root),
            Err(status) if status.code() == Code::InvalidArgument => {
                println!("Error message from server: {}", status.message());
                println!("We probably sent a negative number");
            }
            Err(status) => bail!("SquareRoot RPC error: {status}"),
        },
        Demo::Bidi => {
            let batches = [
                vec![1, 2, 3, 4, 5],
                vec![10, 222, 13, 4124, 35],
                vec![1110, 22, 143, 124, 325],
                vec![1033, 52, 13512, 4, 635],
            ];
            let requests: Vec<_> = batches
                .into_iter()
                .map(|numbers| FindMaximumRequest { numbers })
                .collect();

            let (tx, rx) = mpsc::channel(4);
            let inbound = client
                .find_maximum(ReceiverStream::new(rx))
                .await?
                .into_inner();

            let outcome = drive(ChannelSender::new(tx), inbound, requests, |res| {
                println!("Received maximum: {}", res.maximum);
            })
            .await;

            outcome.send_result.context("send direction failed")?;
            outcome.recv_result.context("receive direction failed")?;
            println!(
                "FindMaximum finished: {} sent, {} received",
                outcome.sent, outcome.received
            );
        }
    }

    Ok(())
}
