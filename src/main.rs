use clap::Parser;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::ServerError;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Ok(start(&cli::Args::parse())?)
}

fn start(args: &cli::Args) -> Result<(), ServerError> {
    let cfg = config::Config::load(args)?;
    logger::init(&cfg).map_err(ServerError::LogFile)?;

    // Multi-thread runtime; one task per connection
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|&n| n > 0) {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), ServerError> {
    let server = server::RelayServer::bind(&cfg)?;
    logger::log_server_start(&server.local_addr()?, &cfg);

    server::signal::stop_on_signal(server.handle());
    server.run().await
}
