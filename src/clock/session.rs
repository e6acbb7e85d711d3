//! One active clock session
//!
//! A session owns the frame the host renders: time text, burn-in offset,
//! active style and the appearance preferences. A supervisor task follows
//! the preferences stream and re-arms the two scheduled tasks whenever the
//! preference each one depends on changes:
//!
//! - time text, keyed by the 12/24-hour flag, refreshed on minute boundaries
//! - burn-in offset, keyed by the protection flag, re-rolled every interval
//!
//! Rendering is pull-based: hosts call [`ClockSession::frame`] or watch
//! [`ClockSession::watch_frames`] for changes.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::offset::{Offset, OffsetSource, RandomOffsets};
use super::task::KeyedTask;
use super::time::{SystemClock, WallClock, format_time, until_next_minute};
use crate::color::{self, HexColor};
use crate::constants::timing;
use crate::preferences::{Preferences, PreferencesStore};
use crate::style::ClockStyle;

/// Burn-in schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub burn_in_interval: Duration,
    pub max_shift: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            burn_in_interval: Duration::from_secs(timing::BURN_IN_INTERVAL_SECS),
            max_shift: timing::BURN_IN_MAX_SHIFT,
        }
    }
}

/// Colour and typography preferences passed through to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub text_color_hex: String,
    pub font_style: String,
    pub brightness_level: u8,
}

impl Appearance {
    /// Parsed text colour, or the fixed fallback when the stored value is invalid
    pub fn text_color(&self) -> HexColor {
        color::resolve_text_color(&self.text_color_hex)
    }
}

impl From<&Preferences> for Appearance {
    fn from(prefs: &Preferences) -> Self {
        Self {
            text_color_hex: prefs.text_color_hex.clone(),
            font_style: prefs.font_style.clone(),
            brightness_level: prefs.brightness_level,
        }
    }
}

/// Everything the presentation layer needs to draw the clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFrame {
    pub time_text: String,
    pub offset: Offset,
    pub style: ClockStyle,
    pub appearance: Appearance,
}

impl ClockFrame {
    /// Centered frame for `prefs` at `now`, with nothing scheduled
    pub fn still(prefs: &Preferences, now: &DateTime<FixedOffset>) -> Self {
        Self {
            time_text: format_time(prefs.use_24_hour_format, now),
            offset: Offset::CENTER,
            style: prefs.clock_style(),
            appearance: Appearance::from(prefs),
        }
    }
}

type SharedOffsets = Arc<Mutex<Box<dyn OffsetSource>>>;

pub struct ClockSession {
    store: Arc<PreferencesStore>,
    frames: Arc<watch::Sender<ClockFrame>>,
    /// Local style writes in flight; persisted style emissions are not adopted meanwhile
    pending_style_writes: Arc<AtomicUsize>,
    shutdown: oneshot::Sender<()>,
    supervisor: JoinHandle<()>,
}

impl ClockSession {
    /// Start a session with the system clock and random burn-in offsets.
    /// Must be called from within a tokio runtime.
    pub fn start_default(store: Arc<PreferencesStore>, settings: EngineSettings) -> Self {
        Self::start(store, settings, Arc::new(SystemClock), Box::new(RandomOffsets::new()))
    }

    pub fn start(
        store: Arc<PreferencesStore>,
        settings: EngineSettings,
        clock: Arc<dyn WallClock>,
        offsets: Box<dyn OffsetSource>,
    ) -> Self {
        let prefs = store.read();
        let initial = ClockFrame::still(&prefs, &clock.now());
        info!(
            style = %initial.style,
            time = %initial.time_text,
            burn_in = prefs.burn_in_protection,
            "Clock session started"
        );

        let frames = Arc::new(watch::channel(initial).0);
        let pending_style_writes = Arc::new(AtomicUsize::new(0));
        let (shutdown, shutdown_rx) = oneshot::channel();

        let supervisor = Supervisor {
            store: store.clone(),
            settings,
            clock,
            offsets: Arc::new(Mutex::new(offsets)),
            frames: frames.clone(),
            pending_style_writes: pending_style_writes.clone(),
            time_task: KeyedTask::new("time_text"),
            offset_task: KeyedTask::new("burn_in_offset"),
            last_style_id: None,
        };
        let supervisor = tokio::spawn(supervisor.run(shutdown_rx));

        Self {
            store,
            frames,
            pending_style_writes,
            shutdown,
            supervisor,
        }
    }

    /// Current frame
    pub fn frame(&self) -> ClockFrame {
        self.frames.borrow().clone()
    }

    /// Receiver notified on every frame change
    pub fn watch_frames(&self) -> watch::Receiver<ClockFrame> {
        self.frames.subscribe()
    }

    /// Move `delta` styles along the circular order. The frame changes
    /// immediately; the new id is then persisted. A failed write is returned
    /// but the displayed style is kept.
    pub async fn shift_style(&self, delta: i32) -> Result<ClockStyle> {
        let mut next = ClockStyle::default();
        self.frames.send_modify(|frame| {
            frame.style = frame.style.shift(delta);
            next = frame.style;
        });
        info!(style = %next, delta = delta, "Clock style shifted");
        self.persist_style(next).await?;
        Ok(next)
    }

    pub async fn set_style(&self, style: ClockStyle) -> Result<()> {
        self.frames.send_if_modified(|frame| replace(&mut frame.style, style));
        self.persist_style(style).await
    }

    async fn persist_style(&self, style: ClockStyle) -> Result<()> {
        self.pending_style_writes.fetch_add(1, Ordering::SeqCst);
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || store.set_clock_style_id(style.id()))
            .await
            .context("Style persistence task failed")
            .and_then(|written| written);
        let remaining = self.pending_style_writes.fetch_sub(1, Ordering::SeqCst) - 1;

        match &result {
            Ok(()) if remaining == 0 => {
                // Another writer may have landed after ours; the store is authoritative then
                let persisted = self.store.read().clock_style();
                if persisted != style {
                    debug!(persisted = %persisted, local = %style, "Adopting newer persisted style");
                    self.frames.send_if_modified(|frame| replace(&mut frame.style, persisted));
                }
            }
            Ok(()) => {}
            Err(e) => warn!(style = %style, error = %e, "Failed to persist clock style, keeping it on screen"),
        }
        result
    }

    /// Stop the session. Once this returns no scheduled task touches the frame again.
    pub async fn end(self) {
        let ClockSession {
            shutdown, supervisor, ..
        } = self;
        let _ = shutdown.send(());
        if let Err(e) = supervisor.await
            && !e.is_cancelled()
        {
            error!(error = %e, "Clock session supervisor panicked");
        }
        info!("Clock session ended");
    }
}

struct Supervisor {
    store: Arc<PreferencesStore>,
    settings: EngineSettings,
    clock: Arc<dyn WallClock>,
    offsets: SharedOffsets,
    frames: Arc<watch::Sender<ClockFrame>>,
    pending_style_writes: Arc<AtomicUsize>,
    time_task: KeyedTask<bool>,
    offset_task: KeyedTask<bool>,
    last_style_id: Option<String>,
}

impl Supervisor {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut prefs = self.store.subscribe();
        loop {
            tokio::select! {
                // Also fires when the session is dropped without `end`
                _ = &mut shutdown => break,
                next = prefs.next() => match next {
                    Some(snapshot) => self.apply(snapshot).await,
                    None => {
                        warn!("Preferences store closed, stopping session");
                        break;
                    }
                },
            }
        }
        self.time_task.cancel().await;
        self.offset_task.cancel().await;
    }

    async fn apply(&mut self, prefs: Preferences) {
        let appearance = Appearance::from(&prefs);
        self.frames
            .send_if_modified(|frame| replace(&mut frame.appearance, appearance));

        if self.last_style_id.as_deref() != Some(prefs.clock_style_id.as_str()) {
            if self.pending_style_writes.load(Ordering::SeqCst) == 0 {
                let style = prefs.clock_style();
                if self.frames.send_if_modified(|frame| replace(&mut frame.style, style)) {
                    info!(style = %style, "Adopted persisted clock style");
                }
                self.last_style_id = Some(prefs.clock_style_id.clone());
            } else {
                // Left unrecorded so the same id is reconsidered once the write lands
                debug!(clock_style = %prefs.clock_style_id, "Local style write pending, not adopting");
            }
        }

        let clock = self.clock.clone();
        let frames = self.frames.clone();
        self.time_task
            .rearm(prefs.use_24_hour_format, move |use_24h| {
                refresh_time_text(clock, frames, use_24h)
            })
            .await;

        let offsets = self.offsets.clone();
        let frames = self.frames.clone();
        let settings = self.settings;
        self.offset_task
            .rearm(prefs.burn_in_protection, move |enabled| {
                refresh_offset(offsets, frames, settings, enabled)
            })
            .await;
    }
}

/// Recompute now, then on every minute boundary
async fn refresh_time_text(clock: Arc<dyn WallClock>, frames: Arc<watch::Sender<ClockFrame>>, use_24h: bool) {
    loop {
        let now = clock.now();
        let text = format_time(use_24h, &now);
        if frames.send_if_modified(|frame| replace(&mut frame.time_text, text.clone())) {
            debug!(time = %text, "Time text updated");
        }
        tokio::time::sleep(until_next_minute(&now)).await;
    }
}

/// Disabled: pin to center and park. Enabled: keep the current offset for
/// one interval, then re-roll every interval.
async fn refresh_offset(
    offsets: SharedOffsets,
    frames: Arc<watch::Sender<ClockFrame>>,
    settings: EngineSettings,
    enabled: bool,
) {
    if !enabled {
        frames.send_if_modified(|frame| replace(&mut frame.offset, Offset::CENTER));
        debug!("Burn-in protection disabled, offset pinned");
        std::future::pending::<()>().await;
        return;
    }
    loop {
        tokio::time::sleep(settings.burn_in_interval).await;
        let offset = offsets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_offset(settings.max_shift);
        frames.send_if_modified(|frame| replace(&mut frame.offset, offset));
        debug!(x = offset.x, y = offset.y, "Burn-in offset shifted");
    }
}

/// Assign and report whether the value changed
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
