//! gRPC handlers for the calculator service.
//!
//! `Sum` is the plain unary call, `SquareRoot` demonstrates returning a
//! status error for a domain violation, and `FindMaximum` is the
//! bidirectional endpoint: every inbound batch of numbers is answered with
//! that batch's maximum, in arrival order.

use core::pin::Pin;
use grpc_course_core::Error;
use grpc_course_core::proto::calculator::{
    FindMaximumRequest, FindMaximumResponse, SquareRootRequest, SquareRootResponse, SumRequest,
    SumResponse, calculator_service_server,
};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};

/// Calculator service handler state.
#[derive(Clone, Default)]
pub struct CalculatorService;

/// Maximum of one streamed batch. An empty batch is a client error, not a
/// panic.
pub fn batch_max(numbers: &[i32]) -> Result<i32, Error> {
    numbers
        .iter()
        .copied()
        .max()
        .ok_or_else(|| Error::InvalidArgument {
            reason: "received an empty batch of numbers".to_string(),
        })
}

/// Receive loop for `FindMaximum`: answers every inbound batch with its
/// maximum.
///
/// A mid-stream receive failure or an invalid batch is returned so the
/// caller can surface it on the response stream; it aborts only this
/// stream, never the process. Stops quietly when the client goes away.
pub async fn relay_maxima<S>(
    mut inbound: S,
    tx: mpsc::Sender<Result<FindMaximumResponse, Status>>,
) -> Result<(), Status>
where
    S: Stream<Item = Result<FindMaximumRequest, Status>> + Unpin,
{
    while let Some(next) = inbound.next().await {
        let req = next?;
        let maximum = batch_max(&req.numbers).map_err(Status::from)?;
        if tx.send(Ok(FindMaximumResponse { maximum })).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[tonic::async_trait]
impl calculator_service_server::CalculatorService for CalculatorService {
    async fn sum(&self, req: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        tracing::info!("Sum invoked");
        let SumRequest {
            first_number,
            second_number,
        } = req.into_inner();
        Ok(Response::new(SumResponse {
            sum_result: first_number + second_number,
        }))
    }

    type FindMaximumStream =
        Pin<Box<dyn Stream<Item = Result<FindMaximumResponse, Status>> + Send>>;

    async fn find_maximum(
        &self,
        req: Request<Streaming<FindMaximumRequest>>,
    ) -> Result<Response<Self::FindMaximumStream>, Status> {
        tracing::info!("FindMaximum invoked");
        let inbound = req.into_inner();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            if let Err(status) = relay_maxima(inbound, tx.clone()).await {
                tracing::warn!("FindMaximum receive loop failed: {status}");
                let _ = tx.send(Err(status)).await;
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn square_root(
        &self,
        req: Request<SquareRootRequest>,
    ) -> Result<Response<SquareRootResponse>, Status> {
        tracing::info!("SquareRoot invoked");
        let number = req.get_ref().number;
        if number < 0 {
            return Err(Error::InvalidArgument {
                reason: format!("received a negative number: {number}"),
            }
            .into());
        }
        Ok(Response::new(SquareRootResponse {
            number_root: f64::from(number).sqrt(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::calculator_service_server::CalculatorService as _;
    use super::*;
    use futures::stream;
    use tonic::Code;

    #[tokio::test]
    async fn sum_adds_both_numbers() {
        let svc = CalculatorService;
        let res = svc
            .sum(Request::new(SumRequest {
                first_number: 5,
                second_number: 12,
            }))
            .await
            .unwrap();
        assert_eq!(res.get_ref().sum_result, 17);
    }

    #[tokio::test]
    async fn square_root_of_nine_is_three() {
        let svc = CalculatorService;
        let res = svc
            .square_root(Request::new(SquareRootRequest { number: 9 }))
            .await
            .unwrap();
        assert!((res.get_ref().number_root - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn square_root_rejects_negative_numbers() {
        let svc = CalculatorService;
        let status = svc
            .square_root(Request::new(SquareRootRequest { number: -4 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[test]
    fn batch_max_picks_the_largest_value() {
        assert_eq!(batch_max(&[10, 222, 13, 4124, 35]).unwrap(), 4124);
        assert_eq!(batch_max(&[-5, -2, -9]).unwrap(), -2);
    }

    #[test]
    fn batch_max_rejects_empty_batches() {
        assert!(batch_max(&[]).is_err());
    }

    #[tokio::test]
    async fn find_maximum_answers_each_batch_in_order() {
        let inbound = stream::iter([
            Ok(FindMaximumRequest {
                numbers: vec![1, 2, 3, 4, 5],
            }),
            Ok(FindMaximumRequest {
                numbers: vec![10, 222, 13, 4124, 35],
            }),
        ]);
        let (tx, mut rx) = mpsc::channel(4);

        relay_maxima(inbound, tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().unwrap().maximum, 5);
        assert_eq!(rx.recv().await.unwrap().unwrap().maximum, 4124);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn find_maximum_rejects_an_empty_batch_mid_stream() {
        let inbound = stream::iter([
            Ok(FindMaximumRequest {
                numbers: vec![1, 2, 3],
            }),
            Ok(FindMaximumRequest { numbers: vec![] }),
        ]);
        let (tx, mut rx) = mpsc::channel(4);

        let status = relay_maxima(inbound, tx).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        // The batch before the invalid one was still answered.
        assert_eq!(rx.recv().await.unwrap().unwrap().maximum, 3);
    }
}
