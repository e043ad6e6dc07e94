//! Error types shared by the course services.
//!
//! This module defines the central `Error` enum, which captures all
//! reportable error cases across the service handlers. It implements
//! `From<Error>` for `tonic::Status` so every handler can propagate a
//! status-code-bearing error to the caller instead of swallowing it.
//!
//! ## Error Cases
//! - `ChannelError`: An internal communication failure between tasks.
//! - `InvalidArgument`: The request was malformed or out of the accepted
//!   domain (unparsable id, negative number, empty batch).
//! - `NotFound`: The requested entity does not exist in the store.
//! - `Internal`: An underlying store or transport failure.
//! - `DeadlineExceeded`: The caller's deadline expired mid-call.
//! - `Cancelled`: The peer cancelled an in-flight call.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the course service handlers.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The request was malformed or exceeded domain constraints.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The requested entity is absent from the backing store.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Underlying store or transport failure.
    #[error("Internal error: {context}")]
    Internal { context: String },

    /// The caller's deadline elapsed before the call completed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The peer aborted the call.
    #[error("Request cancelled by peer")]
    Cancelled,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::InvalidArgument { reason } => Status::invalid_argument(reason),
            Error::NotFound { what } => Status::not_found(what),
            Error::Internal { context } => Status::internal(context),
            Error::DeadlineExceeded => Status::deadline_exceeded("deadline exceeded"),
            Error::Cancelled => Status::cancelled("request was cancelled"),
        }
    }
}
