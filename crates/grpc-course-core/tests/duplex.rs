//! End-to-end tests for the duplex stream driver against an in-process peer.

use grpc_course_core::duplex::{
    ChannelReceiver, ChannelSender, RecvError, RecvHalf, channel_pair, drive,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Peer that answers every inbound batch with its maximum, mirroring the
/// calculator's FindMaximum endpoint.
async fn batch_max_peer(mut rx: ChannelReceiver<Vec<i32>>, mut tx: ChannelSender<i32>) {
    use grpc_course_core::duplex::SendHalf;

    while let Ok(Some(batch)) = rx.receive().await {
        let max = batch.iter().copied().max().expect("peer got empty batch");
        if tx.send(max).await.is_err() {
            break;
        }
    }
    tx.close_send();
}

#[tokio::test]
async fn maxima_arrive_in_send_order() {
    let ((tx, rx), (peer_tx, peer_rx)) = channel_pair::<Vec<i32>, i32>(4);
    tokio::spawn(batch_max_peer(peer_rx, peer_tx));

    let batches = vec![vec![1, 2, 3, 4, 5], vec![10, 222, 13, 4124, 35]];
    let mut maxima = Vec::new();

    let outcome = drive(tx, rx, batches, |max| maxima.push(max)).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.sent, 2);
    assert_eq!(outcome.received, 2);
    assert_eq!(maxima, vec![5, 4124]);
}

#[tokio::test]
async fn ordering_holds_when_the_peer_is_slow() {
    // A peer that sits on each batch for a while forces the send loop to run
    // far ahead of the receive loop; per-direction order must still hold.
    let ((tx, rx), (mut peer_tx, mut peer_rx)) = channel_pair::<Vec<i32>, i32>(8);

    tokio::spawn(async move {
        use grpc_course_core::duplex::SendHalf;

        while let Ok(Some(batch)) = peer_rx.receive().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let max = batch.iter().copied().max().unwrap();
            if peer_tx.send(max).await.is_err() {
                break;
            }
        }
        peer_tx.close_send();
    });

    let batches: Vec<Vec<i32>> = (1..=6).map(|n| vec![n, n * 10, n * 2]).collect();
    let expected: Vec<i32> = (1..=6).map(|n| n * 10).collect();
    let mut seen = Vec::new();

    let outcome = drive(tx, rx, batches, |max| seen.push(max)).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.sent, 6);
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn send_failure_does_not_halt_the_receive_loop() {
    // Outbound direction: the peer never listens, so the first send fails.
    let (out_tx, out_rx) = mpsc::channel::<i32>(1);
    drop(out_rx);

    // Inbound direction: the peer still delivers three messages.
    let (in_tx, in_rx) = mpsc::channel::<i32>(4);
    tokio::spawn(async move {
        for n in [7, 8, 9] {
            if in_tx.send(n).await.is_err() {
                return;
            }
        }
    });

    let mut seen = Vec::new();
    let outcome = drive(
        ChannelSender::new(out_tx),
        ChannelReceiver::new(in_rx),
        vec![1, 2, 3],
        |n| seen.push(n),
    )
    .await;

    // The send loop aborted on its first error, the receive loop still ran
    // to its natural end, and both results were surfaced together.
    assert!(outcome.send_result.is_err());
    assert_eq!(outcome.sent, 0);
    assert_eq!(outcome.recv_result, Ok(()));
    assert_eq!(outcome.received, 3);
    assert_eq!(seen, vec![7, 8, 9]);
}

#[tokio::test]
async fn receive_failure_does_not_halt_the_send_loop() {
    struct BrokenRecv;

    impl RecvHalf for BrokenRecv {
        type Msg = i32;

        async fn receive(&mut self) -> Result<Option<i32>, RecvError> {
            Err(RecvError::Transport {
                context: "connection reset".into(),
            })
        }
    }

    let (out_tx, mut out_rx) = mpsc::channel::<i32>(8);
    let outcome = drive(ChannelSender::new(out_tx), BrokenRecv, vec![1, 2, 3], |_| {}).await;

    assert_eq!(outcome.send_result, Ok(()));
    assert_eq!(outcome.sent, 3);
    assert!(outcome.recv_result.is_err());
    assert_eq!(outcome.received, 0);

    // Everything went out in order before close_send.
    assert_eq!(out_rx.recv().await, Some(1));
    assert_eq!(out_rx.recv().await, Some(2));
    assert_eq!(out_rx.recv().await, Some(3));
    assert_eq!(out_rx.recv().await, None);
}

#[tokio::test]
async fn drive_handles_backpressure_on_the_outbound_direction() {
    // Capacity 1 forces the send loop to suspend until the peer drains,
    // while the receive loop keeps making progress independently.
    let ((tx, rx), (peer_tx, peer_rx)) = channel_pair::<Vec<i32>, i32>(1);
    tokio::spawn(batch_max_peer(peer_rx, peer_tx));

    let batches: Vec<Vec<i32>> = (0..32).map(|n| vec![n, n + 1]).collect();
    let expected: Vec<i32> = (0..32).map(|n| n + 1).collect();
    let mut seen = Vec::new();

    let outcome = drive(tx, rx, batches, |max| seen.push(max)).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.sent, 32);
    assert_eq!(seen, expected);
}
