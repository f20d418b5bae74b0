//! Heist hold'em game server.
//!
//! Spawns a single session actor and serves the WebSocket transport
//! in front of it.

mod api;
mod config;
mod logging;

use std::net::SocketAddr;

use anyhow::Error;
use log::info;
use pico_args::Arguments;

use heist_holdem::{Game, SessionActor};

const HELP: &str = "\
Run a heist hold'em game server

USAGE:
  hh_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:3000)
  MIN_PLAYERS              Players required to start a hand [default: 3]
  TOMATO_TTL_MS            Tomato event lifetime in milliseconds [default: 3000]
  CHAT_LOG_CAP             Chat log capacity [default: 100]
  MAX_CHAT_LEN             Chat message length cap [default: 300]
  RUST_LOG                 Log filter (e.g., info, debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = config::ServerConfig::from_env(bind_override)?;
    config.validate()?;

    info!("starting heist hold'em server at {}", config.bind);

    // One session per process, owned by a single actor task.
    let (actor, handle) = SessionActor::new(Game::new(config.session.clone()));
    tokio::spawn(actor.run());

    let app = api::create_router(api::AppState { session: handle });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("shutting down server");

    Ok(())
}

/// Graceful shutdown signal.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
