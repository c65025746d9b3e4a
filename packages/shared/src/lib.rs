//! Shared utilities for the huddle workspace.

pub mod logger;
pub mod time;
