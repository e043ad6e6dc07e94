//! gRPC handlers for the greet service.
//!
//! One service, all four call shapes: unary ([`Greet`], [`ShowDetails`]),
//! server-streaming ([`GreetManyTimes`]), client-streaming ([`LongGreet`]),
//! bidirectional ([`GreetEveryone`]) and a deliberately slow unary
//! ([`GreetWithDeadline`]) for exercising caller deadlines.
//!
//! The streaming handlers are thin wrappers around free functions that take
//! any inbound message stream, so the loop logic is testable without a live
//! transport. A malformed or broken client stream surfaces as a `Status` on
//! the response stream; it never takes the process down.
//!
//! [`Greet`]: greet_service_server::GreetService::greet
//! [`ShowDetails`]: greet_service_server::GreetService::show_details
//! [`GreetManyTimes`]: greet_service_server::GreetService::greet_many_times
//! [`LongGreet`]: greet_service_server::GreetService::long_greet
//! [`GreetEveryone`]: greet_service_server::GreetService::greet_everyone
//! [`GreetWithDeadline`]: greet_service_server::GreetService::greet_with_deadline

use core::pin::Pin;
use core::time::Duration;
use grpc_course_core::proto::greet::{
    GreetEveryoneRequest, GreetEveryoneResponse, GreetManyTimesRequest, GreetManyTimesResponse,
    GreetRequest, GreetResponse, GreetWithDeadlineRequest, GreetWithDeadlineResponse, Greeting,
    LongGreetRequest, LongGreetResponse, PersonDetailRequest, PersonDetailResponse,
    greet_service_server,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};

/// Number of responses produced by `GreetManyTimes`.
const MANY_TIMES_COUNT: usize = 10;

/// Pause between consecutive `GreetManyTimes` responses.
const MANY_TIMES_INTERVAL: Duration = Duration::from_secs(1);

/// How long the deadline demo handler works before responding.
const DEADLINE_HANDLER_STEPS: u32 = 6;

/// Greet service handler state. The service is stateless, so a fresh value
/// per server is all that is needed.
#[derive(Clone, Default)]
pub struct GreetService;

/// "Hello {first_name}" - the unary greeting.
fn first_name_line(greeting: Option<&Greeting>) -> String {
    let first_name = greeting.map(|g| g.first_name.as_str()).unwrap_or_default();
    format!("Hello {first_name}")
}

/// "Hello {first_name} {last_name}" - the full greeting used by the
/// bidirectional and deadline endpoints.
fn full_name_line(greeting: Option<&Greeting>) -> String {
    let (first, last) = greeting
        .map(|g| (g.first_name.as_str(), g.last_name.as_str()))
        .unwrap_or_default();
    format!("Hello {first} {last}")
}

/// Accumulates the client-streamed greetings into one response line.
///
/// A mid-stream receive error aborts the accumulation and is returned to the
/// caller as the status for the whole call.
pub async fn accumulate_greetings<S>(mut inbound: S) -> Result<String, Status>
where
    S: Stream<Item = Result<LongGreetRequest, Status>> + Unpin,
{
    let mut result = String::from("Hello ");
    while let Some(next) = inbound.next().await {
        let req = next?;
        let first_name = req.greeting.map(|g| g.first_name).unwrap_or_default();
        result.push_str(&first_name);
        result.push_str("! ");
    }
    Ok(result)
}

/// Receive loop for `GreetEveryone`: answers every inbound greeting with its
/// full-name line, in arrival order.
///
/// Returns `Err` on a mid-stream receive failure so the caller can surface
/// it on the response stream. Stops quietly when the client goes away.
pub async fn relay_greetings<S>(
    mut inbound: S,
    tx: mpsc::Sender<Result<GreetEveryoneResponse, Status>>,
) -> Result<(), Status>
where
    S: Stream<Item = Result<GreetEveryoneRequest, Status>> + Unpin,
{
    while let Some(next) = inbound.next().await {
        let req = next?;
        let result = full_name_line(req.greeting.as_ref());
        if tx
            .send(Ok(GreetEveryoneResponse { result }))
            .await
            .is_err()
        {
            break;
        }
    }
    Ok(())
}

#[tonic::async_trait]
impl greet_service_server::GreetService for GreetService {
    async fn greet(&self, req: Request<GreetRequest>) -> Result<Response<GreetResponse>, Status> {
        tracing::info!("Greet invoked");
        let result = first_name_line(req.get_ref().greeting.as_ref());
        Ok(Response::new(GreetResponse { result }))
    }

    async fn show_details(
        &self,
        req: Request<PersonDetailRequest>,
    ) -> Result<Response<PersonDetailResponse>, Status> {
        tracing::info!("ShowDetails invoked for {}", req.get_ref().person_name);
        Ok(Response::new(PersonDetailResponse {
            employed: true,
            age: 25,
            hobbies: vec!["Coding".to_string(), "Working out".to_string()],
        }))
    }

    type GreetManyTimesStream =
        Pin<Box<dyn Stream<Item = Result<GreetManyTimesResponse, Status>> + Send>>;

    async fn greet_many_times(
        &self,
        req: Request<GreetManyTimesRequest>,
    ) -> Result<Response<Self::GreetManyTimesStream>, Status> {
        tracing::info!("GreetManyTimes invoked");
        let first_name = req
            .into_inner()
            .greeting
            .map(|g| g.first_name)
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel(MANY_TIMES_COUNT);
        tokio::spawn(async move {
            for i in 0..MANY_TIMES_COUNT {
                let result = format!("Hello {first_name} number {i}");
                if tx.send(Ok(GreetManyTimesResponse { result })).await.is_err() {
                    // Client went away; nothing left to stream.
                    break;
                }
                sleep(MANY_TIMES_INTERVAL).await;
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn long_greet(
        &self,
        req: Request<Streaming<LongGreetRequest>>,
    ) -> Result<Response<LongGreetResponse>, Status> {
        tracing::info!("LongGreet invoked");
        let result = accumulate_greetings(req.into_inner()).await?;
        Ok(Response::new(LongGreetResponse { result }))
    }

    type GreetEveryoneStream =
        Pin<Box<dyn Stream<Item = Result<GreetEveryoneResponse, Status>> + Send>>;

    async fn greet_everyone(
        &self,
        req: Request<Streaming<GreetEveryoneRequest>>,
    ) -> Result<Response<Self::GreetEveryoneStream>, Status> {
        tracing::info!("GreetEveryone invoked");
        let inbound = req.into_inner();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            if let Err(status) = relay_greetings(inbound, tx.clone()).await {
                tracing::warn!("GreetEveryone receive loop failed: {status}");
                let _ = tx.send(Err(status)).await;
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn greet_with_deadline(
        &self,
        req: Request<GreetWithDeadlineRequest>,
    ) -> Result<Response<GreetWithDeadlineResponse>, Status> {
        tracing::info!("GreetWithDeadline invoked");

        // Simulated slow work. If the caller's deadline expires or the caller
        // cancels, tonic drops this future mid-sleep, so no further work is
        // performed on an abandoned call.
        for _ in 0..DEADLINE_HANDLER_STEPS {
            sleep(Duration::from_secs(1)).await;
        }

        let result = full_name_line(req.get_ref().greeting.as_ref());
        Ok(Response::new(GreetWithDeadlineResponse { result }))
    }
}
