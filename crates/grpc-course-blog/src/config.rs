//! CLI arguments and validated server configuration.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;

/// Command-line arguments for the blog server.
#[derive(Parser, Debug, Clone)]
#[command(name = "blog-server", about = "Blog demo gRPC server")]
pub struct CliArgs {
    /// Socket address to listen on.
    #[arg(long, env = "BLOG_LISTEN_ADDR", default_value = "0.0.0.0:50053")]
    pub listen_addr: String,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let listen_addr = args
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address `{}`", args.listen_addr))?;
        Ok(Self { listen_addr })
    }
}
