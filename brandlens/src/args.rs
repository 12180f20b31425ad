use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "brandlens", about = "LLM brand representation measurement runtime", version)]
pub struct Args {
    /// Path to the brandlens TOML configuration file.
    #[arg(short, long, env = "BRANDLENS_CONFIG", default_value = "brandlens.toml")]
    pub config: PathBuf,

    /// Address to listen on; overrides the configuration file.
    #[arg(short, long, env = "BRANDLENS_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter, e.g. "info" or "server=debug,llm=debug".
    #[arg(long, env = "BRANDLENS_LOG", default_value = "info")]
    pub log: String,
}
