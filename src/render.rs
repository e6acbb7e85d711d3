//! Terminal rendering of a clock frame
//!
//! Pure functions over [`ClockFrame`]; the host decides where the lines go.

use crate::clock::ClockFrame;
use crate::color::HexColor;
use crate::style::ClockStyle;

const SPLIT_GAP: &str = "   ";
const MINIMAL_HINT: &str = "Swipe left/right to change style";

/// Clock face lines for a frame, without positioning
pub fn face_lines(frame: &ClockFrame) -> Vec<String> {
    match frame.style {
        ClockStyle::Basic => vec![frame.time_text.clone()],
        ClockStyle::Split => {
            let mut parts = frame.time_text.split(':');
            let hour = parts.next().filter(|p| !p.is_empty()).unwrap_or("--");
            let minute = parts.next().filter(|p| !p.is_empty()).unwrap_or("--");
            vec![format!("{hour}{SPLIT_GAP}{minute}")]
        }
        ClockStyle::Minimal => vec![frame.time_text.clone(), MINIMAL_HINT.to_string()],
    }
}

/// Face lines shifted by the burn-in offset inside a box of `max_shift`
/// padding on every side, so the face never leaves its area.
pub fn positioned_lines(frame: &ClockFrame, max_shift: i32) -> Vec<String> {
    let max_shift = max_shift.max(0);
    let left = (max_shift + frame.offset.x.clamp(-max_shift, max_shift)) as usize;
    let top = (max_shift + frame.offset.y.clamp(-max_shift, max_shift)) as usize;

    let mut lines = vec![String::new(); top];
    lines.extend(face_lines(frame).into_iter().map(|line| format!("{}{line}", " ".repeat(left))));
    lines
}

/// Text colour after brightness, ready for a 24-bit terminal
pub fn display_color(frame: &ClockFrame) -> HexColor {
    frame
        .appearance
        .text_color()
        .dimmed(frame.appearance.brightness_level)
}

/// Wrap a line in a 24-bit ANSI foreground colour
pub fn colorize(line: &str, color: HexColor) -> String {
    let (r, g, b) = color.rgb();
    format!("\x1b[38;2;{r};{g};{b}m{line}\x1b[0m")
}
