//! Command-line arguments
//!
//! Flags override the matching keys from the config file and environment.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "cors_relay", version, about = "Static files plus a CORS-friendly proxy endpoint for local development")]
pub struct Args {
    /// Config file path (extension optional)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Directory to serve static files from
    #[arg(short, long)]
    pub root: Option<String>,
}
