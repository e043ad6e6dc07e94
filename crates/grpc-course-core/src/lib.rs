#![doc = include_str!("../README.md")]

mod error;
pub mod duplex;

pub use error::{Error, Result};

/// Generated protobuf/gRPC bindings for the three course services.
pub mod proto {
    /// Bindings for the `greet` package.
    pub mod greet {
        tonic::include_proto!("greet");
    }

    /// Bindings for the `calculator` package.
    pub mod calculator {
        tonic::include_proto!("calculator");
    }

    /// Bindings for the `blog` package.
    pub mod blog {
        tonic::include_proto!("blog");
    }

    /// Encoded file descriptor set covering all three packages, used by the
    /// server binaries to register gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("grpc_course_descriptor");
}
