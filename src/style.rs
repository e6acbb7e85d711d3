//! Clock layout styles and circular navigation between them

use std::fmt;

/// Layout used to draw the clock face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockStyle {
    #[default]
    Basic,
    Split,
    Minimal,
}

impl ClockStyle {
    /// Declaration order; `shift` walks this list circularly
    pub const ALL: [ClockStyle; 3] = [ClockStyle::Basic, ClockStyle::Split, ClockStyle::Minimal];

    /// Stable id used in the preferences file
    pub fn id(self) -> &'static str {
        match self {
            ClockStyle::Basic => "basic",
            ClockStyle::Split => "split",
            ClockStyle::Minimal => "minimal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClockStyle::Basic => "Basic",
            ClockStyle::Split => "Split",
            ClockStyle::Minimal => "Minimal",
        }
    }

    /// Exact id lookup
    pub fn find(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.id() == id)
    }

    /// Map a persisted id back to a style. Unknown or missing ids fall back to `Basic`.
    pub fn from_id(id: Option<&str>) -> Self {
        id.and_then(Self::find).unwrap_or(ClockStyle::Basic)
    }

    fn index(self) -> i64 {
        match self {
            ClockStyle::Basic => 0,
            ClockStyle::Split => 1,
            ClockStyle::Minimal => 2,
        }
    }

    /// Style `delta` steps away in declaration order, wrapping in both directions
    pub fn shift(self, delta: i32) -> Self {
        let len = Self::ALL.len() as i64;
        let next = (self.index() + i64::from(delta)).rem_euclid(len);
        Self::ALL[next as usize]
    }
}

impl fmt::Display for ClockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
