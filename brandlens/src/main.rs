use std::net::SocketAddr;

use args::Args;
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod args;
mod logger;

const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8012";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args.log);

    let config = config::Config::load(&args.config)?;
    config.validate()?;

    // Credentials hygiene: a stale service-account path would silently
    // shadow ADC for every Vertex call. Stripped exactly once, here.
    if config.llm.vertex.prefer_adc && std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS").is_some() {
        log::info!("clearing GOOGLE_APPLICATION_CREDENTIALS: prefer_adc is set");
        // SAFETY: single-threaded at this point; no other thread reads the
        // environment concurrently.
        unsafe { std::env::remove_var("GOOGLE_APPLICATION_CREDENTIALS") };
    }

    let listen_address = args
        .listen
        .or(config.server.listen_address)
        .unwrap_or_else(|| {
            DEFAULT_LISTEN_ADDRESS
                .parse::<SocketAddr>()
                .expect("default listen address is valid")
        });

    let shutdown_signal = CancellationToken::new();

    let signal_token = shutdown_signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown requested");
            signal_token.cancel();
        }
    });

    server::serve(server::ServeConfig {
        listen_address,
        config,
        shutdown_signal,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        bound_addr_sender: None,
    })
    .await
}
