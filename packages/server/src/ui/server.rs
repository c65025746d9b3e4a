//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{domain::MessagePusher, usecase::RelayUseCases};

use super::{
    dispatcher::EventDispatcher,
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket signaling server
///
/// This struct encapsulates the wired use cases and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(usecases, message_pusher);
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    usecases: RelayUseCases,
    /// MessagePusher（ack の返信に使用）
    message_pusher: Arc<dyn MessagePusher>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `usecases` - All relay use cases, sharing one room store and one message pusher
    /// * `message_pusher` - The message pusher the use cases were built with
    pub fn new(usecases: RelayUseCases, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            usecases,
            message_pusher,
        }
    }

    /// Run the WebSocket signaling server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> std::io::Result<()> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let (dispatcher, dispatcher_task) =
            EventDispatcher::new(self.usecases.clone(), self.message_pusher).spawn();

        let app_state = Arc::new(AppState {
            dispatcher,
            get_rooms_usecase: self.usecases.get_rooms,
            get_room_detail_usecase: self.usecases.get_room_detail,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        tracing::info!(
            "WebSocket signaling server listening on {}",
            listener.local_addr()?
        );

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        dispatcher_task.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
