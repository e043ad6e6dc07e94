//! Duplex stream endpoint abstraction.
//!
//! A bidirectional gRPC stream is two unidirectional message sequences over
//! one logical connection. This module presents that as two independent
//! halves so the send side and the receive side can make progress without
//! being serialized behind one another:
//!
//! - [`SendHalf`]: `send` each outbound message, then [`SendHalf::close_send`]
//!   exactly like `CloseSend` on a gRPC client stream.
//! - [`RecvHalf`]: `receive` inbound messages until the peer closes its
//!   direction (`None`) or the transport fails.
//!
//! Each half starts `Open` and transitions to `Closed` once: the send half
//! locally via `close_send` (or a failed send), the receive half when the
//! peer signals end-of-stream. Neither half touches the other's state, so no
//! locking is needed across directions.
//!
//! Two endpoint families are provided: bounded Tokio MPSC channels (the
//! in-process endpoint, and the outbound half of a tonic client call fed
//! through a `ReceiverStream`) and [`tonic::Streaming`] for the inbound half
//! of a live RPC.

mod driver;

pub use driver::{DriveOutcome, drain, drive, send_all};

use tokio::sync::mpsc;
use tonic::Streaming;

/// Errors surfaced by the outbound direction of a duplex stream.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum SendError {
    /// The outbound direction was already closed by [`SendHalf::close_send`].
    #[error("Stream closed")]
    StreamClosed,

    /// The underlying connection failed or the peer went away.
    #[error("Transport error: {context}")]
    Transport { context: String },
}

/// Errors surfaced by the inbound direction of a duplex stream.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum RecvError {
    /// The underlying connection failed mid-stream.
    #[error("Transport error: {context}")]
    Transport { context: String },
}

/// Outbound half of a duplex stream.
pub trait SendHalf {
    type Msg;

    /// Transmits one message on the outbound direction, in order. Suspends
    /// while the transport applies backpressure.
    ///
    /// # Errors
    ///
    /// - [`SendError::StreamClosed`] if [`SendHalf::close_send`] was already
    ///   called.
    /// - [`SendError::Transport`] on any underlying connection failure.
    fn send(&mut self, msg: Self::Msg) -> impl Future<Output = Result<(), SendError>>;

    /// Marks the outbound direction complete. Idempotent: calling it more
    /// than once has no additional effect.
    fn close_send(&mut self);
}

/// Inbound half of a duplex stream.
pub trait RecvHalf {
    type Msg;

    /// Suspends until the next inbound message is available.
    ///
    /// Resolves to `Ok(None)` once the peer has closed its direction, and
    /// keeps resolving to `Ok(None)` on every later call.
    fn receive(&mut self) -> impl Future<Output = Result<Option<Self::Msg>, RecvError>>;
}

/// [`SendHalf`] backed by a bounded MPSC channel.
///
/// This is both the in-process endpoint used in tests and the outbound half
/// of a tonic bidirectional call, where the channel's receiver is wrapped in
/// a `ReceiverStream` and handed to the generated client method.
pub struct ChannelSender<T> {
    tx: Option<mpsc::Sender<T>>,
}

impl<T> ChannelSender<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx: Some(tx) }
    }
}

impl<T> SendHalf for ChannelSender<T> {
    type Msg = T;

    async fn send(&mut self, msg: T) -> Result<(), SendError> {
        match &self.tx {
            None => Err(SendError::StreamClosed),
            Some(tx) => tx.send(msg).await.map_err(|_| SendError::Transport {
                context: "peer hung up".into(),
            }),
        }
    }

    fn close_send(&mut self) {
        // Dropping the sender is the end-of-stream signal for the peer.
        self.tx = None;
    }
}

/// [`RecvHalf`] backed by a bounded MPSC channel.
pub struct ChannelReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> ChannelReceiver<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }
}

impl<T> RecvHalf for ChannelReceiver<T> {
    type Msg = T;

    async fn receive(&mut self) -> Result<Option<T>, RecvError> {
        // `recv` resolves to `None` once all senders are dropped and stays
        // `None` afterwards, which matches the end-of-stream contract.
        Ok(self.rx.recv().await)
    }
}

/// Inbound half of a live tonic RPC stream.
impl<T> RecvHalf for Streaming<T> {
    type Msg = T;

    async fn receive(&mut self) -> Result<Option<T>, RecvError> {
        self.message().await.map_err(|status| RecvError::Transport {
            context: status.to_string(),
        })
    }
}

/// Creates a connected pair of in-process duplex endpoints.
///
/// The first endpoint sends `A` and receives `B`; the second is its mirror
/// image. Each direction is a bounded channel of the given capacity, so
/// senders observe backpressure exactly like a flow-controlled transport.
pub fn channel_pair<A, B>(
    capacity: usize,
) -> (
    (ChannelSender<A>, ChannelReceiver<B>),
    (ChannelSender<B>, ChannelReceiver<A>),
) {
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);
    (
        (ChannelSender::new(a_tx), ChannelReceiver::new(b_rx)),
        (ChannelSender::new(b_tx), ChannelReceiver::new(a_rx)),
    )
}
