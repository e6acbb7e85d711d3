//! Configuration management for clock-dream
//!
//! This module holds the host configuration read by the binary. User
//! preferences (colour, format, style) live in [`crate::preferences`].

pub mod app;

// Re-export commonly used types
pub use app::{BurnInSettings, Config, GeneralSettings, GestureSettings};
