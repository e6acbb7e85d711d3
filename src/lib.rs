#![forbid(unsafe_code)]

pub mod clock;
pub mod color;
pub mod config;
pub mod constants;
pub mod event_handler;
pub mod gesture;
pub mod input;
pub mod preferences;
pub mod render;
pub mod style;

pub use clock::{ClockFrame, ClockSession, EngineSettings};
pub use gesture::{GestureIntent, GestureInterpreter, GestureSample, GestureThresholds};
pub use preferences::{Preferences, PreferencesStore};
pub use style::ClockStyle;
