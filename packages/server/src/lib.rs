//! Signaling and room-state relay library.
//!
//! This library provides a WebSocket relay for multi-party WebRTC video calls:
//! password-protected rooms, peer-to-peer signaling, screen sharing as a virtual
//! member, presence, chat and reactions. Media never passes through the relay.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
