//! WebSocket signaling relay for multi-party WebRTC calls.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server
//! cargo run --bin huddle-server -- --host 0.0.0.0 --port 3000 --log-level info
//! ```

use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use huddle_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRepository, InMemoryRoomRepository},
    },
    ui::Server,
    usecase::RelayUseCases,
};
use huddle_shared::{logger::setup_logger, time::SystemClock};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "huddle-server")]
#[command(about = "WebSocket signaling relay for multi-party WebRTC calls", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create Repositories (in-memory room store and connection registry)
    let rooms = Arc::new(InMemoryRoomRepository::new(Arc::new(Mutex::new(
        HashMap::new(),
    ))));
    let connections = Arc::new(InMemoryConnectionRepository::new(Arc::new(Mutex::new(
        HashMap::new(),
    ))));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create UseCases
    let usecases = RelayUseCases::new(
        rooms,
        connections,
        message_pusher.clone(),
        Arc::new(SystemClock),
    );

    // 4. Create and run the server
    let server = Server::new(usecases, message_pusher);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
