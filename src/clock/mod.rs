//! Clock engine: time text, burn-in offset and style for one session

pub mod offset;
pub mod session;
pub mod task;
pub mod time;

pub use offset::{Offset, OffsetSource, RandomOffsets};
pub use session::{Appearance, ClockFrame, ClockSession, EngineSettings};
pub use time::{SystemClock, WallClock, format_time};
