//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Persisted preference keys (flat TOML file)
pub mod keys {
    pub const IS_24H: &str = "is_24h_format";
    pub const TEXT_COLOR: &str = "text_color_hex";
    pub const FONT_STYLE: &str = "font_style";
    pub const BRIGHTNESS: &str = "brightness_level";
    pub const BURN_IN: &str = "burn_in_protection";
    pub const CLOCK_STYLE: &str = "clock_style";

    /// All persisted keys, in display order
    pub const ALL: [&str; 6] = [IS_24H, TEXT_COLOR, FONT_STYLE, BRIGHTNESS, BURN_IN, CLOCK_STYLE];
}

/// Default values for every preference field
pub mod defaults {
    pub const IS_24H: bool = true;
    pub const TEXT_COLOR: &str = "#E0E0E0";
    pub const FONT_STYLE: &str = "default";
    pub const BRIGHTNESS: u8 = 70;
    pub const BURN_IN: bool = true;
    pub const CLOCK_STYLE: &str = "basic";
}

/// Brightness bounds (percent)
pub mod brightness {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;
}

/// Text colour presets offered by the settings command
pub mod palette {
    pub const PRESETS: [(&str, &str); 5] = [
        ("primary", "#E0E0E0"),
        ("red", "#B00020"),
        ("dim", "#444444"),
        ("gold", "#B08D57"),
        ("cyan", "#4DF3FF"),
    ];
}

/// Clock refresh timing
pub mod timing {
    /// Milliseconds per wall-clock minute
    pub const MINUTE_MS: i64 = 60_000;

    /// Seconds between burn-in offset changes
    pub const BURN_IN_INTERVAL_SECS: u64 = 60;

    /// Maximum burn-in shift on each axis, in pixels
    pub const BURN_IN_MAX_SHIFT: i32 = 12;
}

/// Gesture thresholds in density-independent units
pub mod gesture {
    /// Horizontal travel beyond which a gesture counts as a swipe
    pub const SWIPE_THRESHOLD_DP: f32 = 32.0;

    /// Travel on both axes below which a gesture may count as a tap
    pub const TAP_SLOP_DP: f32 = 12.0;

    /// Taps must complete within this many milliseconds
    pub const TAP_TIMEOUT_MS: u64 = 300;
}

/// Config file locations
pub mod config {
    pub const APP_DIR: &str = "clock-dream";
    pub const FILENAME: &str = "config.toml";
    pub const PREFERENCES_FILENAME: &str = "preferences.toml";
}

/// Host config validation bounds
pub mod validation {
    pub const MIN_RELOAD_INTERVAL_MS: u64 = 100;
    pub const MIN_BURN_IN_INTERVAL_SECS: u64 = 1;
    pub const MAX_SHIFT_PX: i32 = 64;
    pub const MIN_DENSITY: f32 = 0.1;
}
