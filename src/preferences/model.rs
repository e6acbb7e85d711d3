//! Preferences value object
//!
//! Every field has a total default. Values are read from the stored table
//! key by key, so one missing or malformed entry never resets the others.

use serde::Serialize;
use tracing::warn;

use crate::constants::{brightness, defaults, keys};
use crate::style::ClockStyle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    #[serde(rename = "is_24h_format")]
    pub use_24_hour_format: bool,
    pub text_color_hex: String,
    pub font_style: String,
    /// Percent, always within 0..=100
    pub brightness_level: u8,
    pub burn_in_protection: bool,
    #[serde(rename = "clock_style")]
    pub clock_style_id: String,
}

// Default value functions
fn default_is_24h() -> bool {
    defaults::IS_24H
}

fn default_text_color() -> String {
    defaults::TEXT_COLOR.to_string()
}

fn default_font_style() -> String {
    defaults::FONT_STYLE.to_string()
}

fn default_brightness() -> u8 {
    defaults::BRIGHTNESS
}

fn default_burn_in() -> bool {
    defaults::BURN_IN
}

fn default_clock_style() -> String {
    defaults::CLOCK_STYLE.to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            use_24_hour_format: default_is_24h(),
            text_color_hex: default_text_color(),
            font_style: default_font_style(),
            brightness_level: default_brightness(),
            burn_in_protection: default_burn_in(),
            clock_style_id: default_clock_style(),
        }
    }
}

/// Clamp any integer into the valid brightness range
pub fn clamp_brightness(level: i64) -> u8 {
    level.clamp(i64::from(brightness::MIN), i64::from(brightness::MAX)) as u8
}

impl Preferences {
    /// Build from a parsed TOML table, defaulting each absent or wrongly-typed key
    pub fn from_table(table: &toml::Table) -> Self {
        Self {
            use_24_hour_format: bool_field(table, keys::IS_24H, default_is_24h()),
            text_color_hex: string_field(table, keys::TEXT_COLOR, default_text_color),
            font_style: string_field(table, keys::FONT_STYLE, default_font_style),
            brightness_level: brightness_field(table),
            burn_in_protection: bool_field(table, keys::BURN_IN, default_burn_in()),
            clock_style_id: string_field(table, keys::CLOCK_STYLE, default_clock_style),
        }
    }

    pub fn clock_style(&self) -> ClockStyle {
        ClockStyle::from_id(Some(&self.clock_style_id))
    }

    /// Value of a persisted key rendered for display
    pub fn value_of(&self, key: &str) -> Option<String> {
        let value = match key {
            keys::IS_24H => self.use_24_hour_format.to_string(),
            keys::TEXT_COLOR => self.text_color_hex.clone(),
            keys::FONT_STYLE => self.font_style.clone(),
            keys::BRIGHTNESS => self.brightness_level.to_string(),
            keys::BURN_IN => self.burn_in_protection.to_string(),
            keys::CLOCK_STYLE => self.clock_style_id.clone(),
            _ => return None,
        };
        Some(value)
    }
}

fn bool_field(table: &toml::Table, key: &str, default: bool) -> bool {
    match table.get(key) {
        None => default,
        Some(toml::Value::Boolean(value)) => *value,
        Some(other) => {
            warn!(key = key, value = %other, using = default, "Preference has wrong type, using default");
            default
        }
    }
}

fn string_field(table: &toml::Table, key: &str, default: fn() -> String) -> String {
    match table.get(key) {
        None => default(),
        Some(toml::Value::String(value)) => value.clone(),
        Some(other) => {
            let fallback = default();
            warn!(key = key, value = %other, using = %fallback, "Preference has wrong type, using default");
            fallback
        }
    }
}

fn brightness_field(table: &toml::Table) -> u8 {
    match table.get(keys::BRIGHTNESS) {
        None => default_brightness(),
        Some(toml::Value::Integer(level)) => {
            let clamped = clamp_brightness(*level);
            if i64::from(clamped) != *level {
                warn!(brightness_level = *level, clamped = clamped, "Stored brightness out of range, clamping");
            }
            clamped
        }
        Some(other) => {
            warn!(key = keys::BRIGHTNESS, value = %other, using = default_brightness(), "Preference has wrong type, using default");
            default_brightness()
        }
    }
}
