//! User preferences for the clock dream
//!
//! - **model**: the six persisted settings and their defaults
//! - **store**: file-backed store with change notification

pub mod model;
pub mod store;

pub use model::Preferences;
pub use store::{PreferencesStore, PreferencesStream};
