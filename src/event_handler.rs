use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{ClockFrame, ClockSession};
use crate::gesture::{GestureIntent, GestureInterpreter, PointerTracker};
use crate::input::{InputCommand, PointerEvent};
use crate::preferences::PreferencesStore;
use crate::render;

/// Everything the host loop reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    FrameChanged(ClockFrame),
    Input(InputCommand),
    InputClosed,
    ReloadTick,
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// How frames reach the terminal
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// One summary line per frame instead of a redrawn, coloured screen
    pub plain: bool,
    pub max_shift: i32,
}

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

impl Renderer {
    /// Output for one frame of a running session
    pub fn render(&self, frame: &ClockFrame) -> String {
        if self.plain {
            return summary(frame);
        }
        format!("{CLEAR_SCREEN}{}", self.face(frame))
    }

    /// One-shot output; never clears the screen
    pub fn render_still(&self, frame: &ClockFrame) -> String {
        if self.plain { summary(frame) } else { self.face(frame) }
    }

    fn face(&self, frame: &ClockFrame) -> String {
        let color = render::display_color(frame);
        let mut out = String::new();
        for line in render::positioned_lines(frame, self.max_shift) {
            out.push_str(&render::colorize(&line, color));
            out.push('\n');
        }
        out
    }

    pub fn draw(&self, frame: &ClockFrame) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(self.render(frame).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn summary(frame: &ClockFrame) -> String {
    format!(
        "[{}] {} offset=({:+},{:+}) color={} font={} brightness={}\n",
        frame.style,
        render::face_lines(frame).join(" | "),
        frame.offset.x,
        frame.offset.y,
        frame.appearance.text_color().to_hex_string(),
        frame.appearance.font_style,
        frame.appearance.brightness_level,
    )
}

pub struct HostContext {
    pub store: Arc<PreferencesStore>,
    pub interpreter: GestureInterpreter,
    /// Streamed pointer steps, classified by the same interpreter on release
    pub tracker: PointerTracker,
    /// Ignore exit taps
    pub touch_guard: bool,
    pub renderer: Renderer,
}

impl HostContext {
    pub fn new(store: Arc<PreferencesStore>, interpreter: GestureInterpreter, touch_guard: bool, renderer: Renderer) -> Self {
        Self {
            store,
            interpreter,
            tracker: PointerTracker::new(interpreter),
            touch_guard,
            renderer,
        }
    }
}

pub async fn handle_event(ctx: &mut HostContext, session: &ClockSession, event: HostEvent) -> Result<Flow> {
    match event {
        HostEvent::FrameChanged(frame) => {
            ctx.renderer.draw(&frame)?;
        }
        HostEvent::Input(InputCommand::Gesture(sample)) => {
            return Ok(handle_intent(ctx, session, ctx.interpreter.classify(sample)).await);
        }
        HostEvent::Input(InputCommand::Pointer(step)) => {
            let intent = match step {
                PointerEvent::Down { at, time_ms } => {
                    ctx.tracker.down(at, time_ms);
                    None
                }
                PointerEvent::Move { to } => {
                    ctx.tracker.moved(to);
                    debug!(drag_x = ctx.tracker.drag_x(), "Pointer moved");
                    None
                }
                PointerEvent::Up { at, time_ms } => Some(ctx.tracker.up(at, time_ms)),
                PointerEvent::Cancel => {
                    ctx.tracker.cancel();
                    None
                }
            };
            if let Some(intent) = intent {
                return Ok(handle_intent(ctx, session, intent).await);
            }
        }
        HostEvent::Input(InputCommand::Quit) => {
            info!("Quit requested, ending session");
            return Ok(Flow::Exit);
        }
        HostEvent::InputClosed => {
            info!("Input closed, ending session");
            return Ok(Flow::Exit);
        }
        HostEvent::Interrupt => {
            info!("Interrupted, ending session");
            return Ok(Flow::Exit);
        }
        HostEvent::ReloadTick => {
            // Picks up `clock-dream set` from another terminal
            if let Err(e) = ctx.store.reload() {
                warn!(error = %e, "Failed to reload preferences");
            }
        }
    }
    Ok(Flow::Continue)
}

async fn handle_intent(ctx: &HostContext, session: &ClockSession, intent: GestureIntent) -> Flow {
    match intent {
        GestureIntent::Exit if ctx.touch_guard => {
            info!("Exit tap ignored (touch guard enabled)");
            Flow::Continue
        }
        GestureIntent::Exit => {
            info!("Exit tap, ending session");
            Flow::Exit
        }
        GestureIntent::ShiftStyle(delta) => {
            if let Err(e) = session.shift_style(delta).await {
                warn!(error = %e, "Style change shown but not saved");
            }
            Flow::Continue
        }
        GestureIntent::Ignored => {
            debug!("Gesture ignored");
            Flow::Continue
        }
    }
}
