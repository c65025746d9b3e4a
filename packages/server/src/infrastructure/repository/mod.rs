//! Repository 実装
//!
//! - `inmemory`: HashMap を使ったプロセス内ストア

pub mod inmemory;

pub use inmemory::{InMemoryConnectionRepository, InMemoryRoomRepository};
