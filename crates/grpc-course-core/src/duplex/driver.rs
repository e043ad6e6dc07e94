//! Drives both directions of a duplex stream to completion.
//!
//! [`drive`] runs one send loop and one receive loop concurrently over a
//! single stream and resolves only after BOTH loops have finished. The two
//! loops never cancel each other: a failure in one direction lets the other
//! run to its natural end, and both results are reported together in the
//! [`DriveOutcome`].
//!
//! The degenerate call shapes fall out of the same two loops:
//! [`send_all`] alone is the client-streaming upload, [`drain`] alone is the
//! server-streaming download, and `drive` is their concurrent composition.

use super::{RecvError, RecvHalf, SendError, SendHalf};

/// Result of driving both directions of a duplex stream to completion.
///
/// `sent` and `received` count messages that were actually transmitted or
/// handed to the receive handler before each direction finished.
#[derive(Debug)]
pub struct DriveOutcome {
    pub sent: usize,
    pub received: usize,
    pub send_result: Result<(), SendError>,
    pub recv_result: Result<(), RecvError>,
}

impl DriveOutcome {
    /// True when both directions completed without error.
    pub fn is_ok(&self) -> bool {
        self.send_result.is_ok() && self.recv_result.is_ok()
    }
}

/// Sends every message in order, then closes the outbound direction.
///
/// A failed `send` aborts the loop; the direction is closed either way, so
/// the peer always observes end-of-stream. Returns the number of messages
/// transmitted and the loop's result.
pub async fn send_all<S>(
    tx: &mut S,
    outbound: impl IntoIterator<Item = S::Msg>,
) -> (usize, Result<(), SendError>)
where
    S: SendHalf,
{
    let mut sent = 0;
    for msg in outbound {
        if let Err(e) = tx.send(msg).await {
            tx.close_send();
            return (sent, Err(e));
        }
        sent += 1;
    }
    tx.close_send();
    (sent, Ok(()))
}

/// Drains the inbound direction, invoking the handler once per message in
/// arrival order, until the peer closes its direction or the transport
/// fails. Returns the number of messages handled and the loop's result.
pub async fn drain<R, F>(rx: &mut R, mut on_message: F) -> (usize, Result<(), RecvError>)
where
    R: RecvHalf,
    F: FnMut(R::Msg),
{
    let mut received = 0;
    loop {
        match rx.receive().await {
            Ok(Some(msg)) => {
                on_message(msg);
                received += 1;
            }
            Ok(None) => return (received, Ok(())),
            Err(e) => return (received, Err(e)),
        }
    }
}

/// Runs the send loop and the receive loop concurrently over one duplex
/// stream and resolves only after both have finished.
///
/// Outbound messages go out in the exact order supplied, followed by
/// `close_send`; inbound messages reach `on_message` in arrival order. No
/// temporal interleaving between the two directions is guaranteed, which is
/// exactly why they are two independent loops joined at completion rather
/// than one alternating loop.
pub async fn drive<S, R, F>(
    mut tx: S,
    mut rx: R,
    outbound: Vec<S::Msg>,
    on_message: F,
) -> DriveOutcome
where
    S: SendHalf,
    R: RecvHalf,
    F: FnMut(R::Msg),
{
    let ((sent, send_result), (received, recv_result)) =
        tokio::join!(send_all(&mut tx, outbound), drain(&mut rx, on_message));

    DriveOutcome {
        sent,
        received,
        send_result,
        recv_result,
    }
}
