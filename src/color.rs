//! Hex colour parsing for the clock text
//!
//! Accepts `#RRGGBB` and `#AARRGGBB`. 6-digit values get full opacity.

use tracing::warn;

use crate::constants::palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(u32);

/// Drawn when the stored text colour can't be parsed
pub const FALLBACK_TEXT: HexColor = HexColor::from_argb32(0xFFE0_E0E0);

impl HexColor {
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok().map(|rgb| Self(0xFF00_0000 | rgb)),
            8 => u32::from_str_radix(hex, 16).ok().map(Self),
            _ => None,
        }
    }

    pub const fn from_argb32(argb: u32) -> Self {
        Self(argb)
    }

    pub fn argb32(self) -> u32 {
        self.0
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    /// `#RRGGBB` when opaque, `#AARRGGBB` otherwise
    pub fn to_hex_string(self) -> String {
        if self.alpha() == 0xFF {
            format!("#{:06X}", self.0 & 0x00FF_FFFF)
        } else {
            format!("#{:08X}", self.0)
        }
    }

    /// Scale the colour channels by a brightness percentage (alpha untouched)
    pub fn dimmed(self, brightness_percent: u8) -> Self {
        let level = u32::from(brightness_percent.min(100));
        let (r, g, b) = self.rgb();
        let scale = |c: u8| u32::from(c) * level / 100;
        Self((u32::from(self.alpha()) << 24) | (scale(r) << 16) | (scale(g) << 8) | scale(b))
    }
}

/// Resolve a stored text colour, substituting the fixed fallback when it can't be parsed.
pub fn resolve_text_color(hex: &str) -> HexColor {
    HexColor::parse(hex).unwrap_or_else(|| {
        warn!(text_color = %hex, fallback = %FALLBACK_TEXT.to_hex_string(), "Invalid text_color hex, using default");
        FALLBACK_TEXT
    })
}

/// Look up a named preset (`gold`, `cyan`, ...) or accept a raw hex value.
/// Returns the normalized hex string.
pub fn preset_or_hex(value: &str) -> Option<String> {
    if let Some((_, hex)) = palette::PRESETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value.trim()))
    {
        return Some((*hex).to_string());
    }
    HexColor::parse(value.trim()).map(HexColor::to_hex_string)
}
