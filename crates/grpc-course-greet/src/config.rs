//! CLI arguments and validated server configuration.

use anyhow::Context;
use clap::Parser;
use core::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments for the greet server.
#[derive(Parser, Debug, Clone)]
#[command(name = "greet-server", about = "Greet demo gRPC server")]
pub struct CliArgs {
    /// Socket address to listen on.
    #[arg(long, env = "GREET_LISTEN_ADDR", default_value = "0.0.0.0:50051")]
    pub listen_addr: String,

    /// Path to the PEM-encoded server certificate. TLS is enabled when both
    /// this and `--tls-key` are set.
    #[arg(long, env = "GREET_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// Path to the PEM-encoded private key matching `--tls-cert`.
    #[arg(long, env = "GREET_TLS_KEY")]
    pub tls_key: Option<PathBuf>,
}

/// Certificate and private key pair, loaded eagerly so a missing or
/// unreadable file is startup-fatal rather than a surprise at first accept.
#[derive(Clone)]
pub struct TlsPair {
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl fmt::Debug for TlsPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsPair")
            .field("cert_bytes", &self.cert.len())
            .field("key_bytes", &"<redacted>")
            .finish()
    }
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub tls: Option<TlsPair>,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let listen_addr = args
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address `{}`", args.listen_addr))?;

        let tls = match (args.tls_cert, args.tls_key) {
            (None, None) => None,
            (Some(cert_path), Some(key_path)) => {
                let cert = fs::read(&cert_path).with_context(|| {
                    format!("failed to read certificate `{}`", cert_path.display())
                })?;
                let key = fs::read(&key_path).with_context(|| {
                    format!("failed to read private key `{}`", key_path.display())
                })?;
                Some(TlsPair { cert, key })
            }
            _ => anyhow::bail!("--tls-cert and --tls-key must be provided together"),
        };

        Ok(Self { listen_addr, tls })
    }
}
