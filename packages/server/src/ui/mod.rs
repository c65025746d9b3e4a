//! WebSocket signaling server implementation.

pub mod dispatcher;
mod handler;
mod server;
mod signal;
pub mod state;

pub use dispatcher::{DispatcherHandle, EventDispatcher, RelayCommand};
pub use server::Server;
