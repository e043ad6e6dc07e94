/// Builds the gRPC client and server code for the three course services
/// (`greet`, `calculator`, `blog`) using `tonic-prost-build`.
///
/// The generated modules are emitted into the crate's `OUT_DIR` and included
/// from `src/lib.rs` via `tonic::include_proto!`. A file descriptor set is
/// written alongside so every server binary can register gRPC reflection.
///
/// # Panics
///
/// This function will `panic!` if code generation fails, which surfaces the
/// protoc error during `cargo build`.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("grpc_course_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(
            config,
            &[
                "proto/greet.proto",
                "proto/calculator.proto",
                "proto/blog.proto",
            ],
            &["proto"],
        )
        .unwrap();
}
