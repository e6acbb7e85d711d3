//! File-backed preferences store with change notification
//!
//! The store loads once, then keeps the current snapshot in a watch channel.
//! Every successful single-field write persists to disk first and only then
//! publishes the new snapshot, so a failed write is never observed. Writes
//! start from the file rather than the snapshot, so fields another process
//! changed in the meantime are kept.

use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::model::{Preferences, clamp_brightness};
use crate::color;
use crate::constants::{config, keys};
use crate::style::ClockStyle;

pub struct PreferencesStore {
    path: PathBuf,
    snapshot: watch::Sender<Preferences>,
    /// Serializes read-modify-persist-publish
    write_lock: Mutex<()>,
}

impl PreferencesStore {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::PREFERENCES_FILENAME);
        path
    }

    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Load preferences from `path`. Never fails: a missing or broken file yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match read_file(&path) {
            Ok(Some(prefs)) => {
                info!(path = %path.display(), "Loaded preferences");
                prefs
            }
            Ok(None) => {
                info!(path = %path.display(), "No preferences file found, using defaults");
                Preferences::default()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read preferences, using defaults");
                Preferences::default()
            }
        };
        let (snapshot, _) = watch::channel(initial);
        Self {
            path,
            snapshot,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot, fully defaulted
    pub fn read(&self) -> Preferences {
        self.snapshot.borrow().clone()
    }

    /// Fresh change sequence starting with the current snapshot
    pub fn subscribe(&self) -> PreferencesStream {
        PreferencesStream {
            rx: self.snapshot.subscribe(),
            primed: false,
        }
    }

    pub fn set_use_24_hour_format(&self, enabled: bool) -> Result<()> {
        self.update(keys::IS_24H, |prefs| prefs.use_24_hour_format = enabled)
    }

    pub fn set_text_color_hex(&self, hex: &str) -> Result<()> {
        self.update(keys::TEXT_COLOR, |prefs| prefs.text_color_hex = hex.to_string())
    }

    pub fn set_font_style(&self, id: &str) -> Result<()> {
        self.update(keys::FONT_STYLE, |prefs| prefs.font_style = id.to_string())
    }

    /// Out-of-range levels are clamped, never rejected
    pub fn set_brightness_level(&self, level: i64) -> Result<()> {
        let clamped = clamp_brightness(level);
        if i64::from(clamped) != level {
            debug!(requested = level, clamped = clamped, "Clamping brightness");
        }
        self.update(keys::BRIGHTNESS, |prefs| prefs.brightness_level = clamped)
    }

    pub fn set_burn_in_protection(&self, enabled: bool) -> Result<()> {
        self.update(keys::BURN_IN, |prefs| prefs.burn_in_protection = enabled)
    }

    pub fn set_clock_style_id(&self, id: &str) -> Result<()> {
        self.update(keys::CLOCK_STYLE, |prefs| prefs.clock_style_id = id.to_string())
    }

    /// Parse a textual value for a persisted key and apply it
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        match key {
            keys::IS_24H => self.set_use_24_hour_format(parse_bool(value)?),
            keys::TEXT_COLOR => {
                let hex = color::preset_or_hex(value)
                    .ok_or_else(|| anyhow!("'{value}' is not a colour preset or hex value"))?;
                self.set_text_color_hex(&hex)
            }
            keys::FONT_STYLE => self.set_font_style(value.trim()),
            keys::BRIGHTNESS => {
                let level: i64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("'{value}' is not an integer brightness"))?;
                self.set_brightness_level(level)
            }
            keys::BURN_IN => self.set_burn_in_protection(parse_bool(value)?),
            keys::CLOCK_STYLE => {
                let id = value.trim().to_lowercase();
                if ClockStyle::find(&id).is_none() {
                    warn!(clock_style = %id, "Unknown clock style, it will display as basic");
                }
                self.set_clock_style_id(&id)
            }
            other => bail!("Unknown preference key '{other}' (expected one of {:?})", keys::ALL),
        }
    }

    /// Re-read the file and publish its contents if they differ from the snapshot.
    /// Picks up edits made by another process.
    pub fn reload(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let on_disk = read_file(&self.path)?.unwrap_or_default();
        let changed = self.snapshot.send_if_modified(|current| {
            if *current == on_disk {
                false
            } else {
                *current = on_disk;
                true
            }
        });
        if changed {
            info!(path = %self.path.display(), "Preferences changed on disk, reloaded");
        }
        Ok(changed)
    }

    fn update(&self, key: &str, mutate: impl FnOnce(&mut Preferences)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = match read_file(&self.path) {
            Ok(Some(on_disk)) => on_disk,
            Ok(None) => self.read(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Preferences file unreadable, writing from the current snapshot");
                self.read()
            }
        };
        mutate(&mut next);

        write_file(&self.path, &next)
            .with_context(|| format!("Failed to persist '{key}' to {}", self.path.display()))?;

        let value = next.value_of(key).unwrap_or_default();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        info!(key = key, value = %value, "Updated preference");
        Ok(())
    }
}

/// Lazy, infinite sequence of preference snapshots
pub struct PreferencesStream {
    rx: watch::Receiver<Preferences>,
    primed: bool,
}

impl PreferencesStream {
    /// First call yields the current snapshot; later calls wait for the next write.
    /// Returns `None` only once the store has been dropped.
    pub async fn next(&mut self) -> Option<Preferences> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => bail!("'{other}' is not a boolean (use true/false)"),
    }
}

fn read_file(path: &Path) -> Result<Option<Preferences>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
    let table: toml::Table = contents
        .parse()
        .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;
    Ok(Some(Preferences::from_table(&table)))
}

/// Write to a uniquely named sibling temp file, then rename over the target
fn write_file(path: &Path, prefs: &Preferences) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create preferences directory {}", parent.display()))?;
    let contents = toml::to_string_pretty(prefs).context("Failed to serialize preferences to TOML")?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, PreferencesStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::open(dir.path().join("preferences.toml"));
        (dir, store)
    }

    /// A store whose parent "directory" is a regular file, so every write fails
    fn broken_store() -> (TempDir, PreferencesStore) {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let store = PreferencesStore::open(blocker.join("preferences.toml"));
        (dir, store)
    }

    #[test]
    fn test_read_without_writes_returns_defaults() {
        let (_dir, store) = temp_store();
        let prefs = store.read();
        assert!(prefs.use_24_hour_format);
        assert_eq!(prefs.text_color_hex, "#E0E0E0");
        assert_eq!(prefs.font_style, "default");
        assert_eq!(prefs.brightness_level, 70);
        assert!(prefs.burn_in_protection);
        assert_eq!(prefs.clock_style_id, "basic");
    }

    #[test]
    fn test_each_setter_updates_only_its_field() {
        let (_dir, store) = temp_store();
        store.set_use_24_hour_format(false).unwrap();
        store.set_text_color_hex("#B08D57").unwrap();
        store.set_font_style("serif").unwrap();
        store.set_brightness_level(30).unwrap();
        store.set_burn_in_protection(false).unwrap();
        store.set_clock_style_id("minimal").unwrap();

        let prefs = store.read();
        assert_eq!(
            prefs,
            Preferences {
                use_24_hour_format: false,
                text_color_hex: "#B08D57".to_string(),
                font_style: "serif".to_string(),
                brightness_level: 30,
                burn_in_protection: false,
                clock_style_id: "minimal".to_string(),
            }
        );
    }

    #[test]
    fn test_brightness_write_is_clamped() {
        let (_dir, store) = temp_store();
        for (input, expected) in [(-20, 0), (0, 0), (42, 42), (100, 100), (180, 100)] {
            store.set_brightness_level(input).unwrap();
            assert_eq!(store.read().brightness_level, expected, "input {input}");
        }
    }

    #[test]
    fn test_writes_survive_reopen() {
        let (dir, store) = temp_store();
        store.set_clock_style_id("split").unwrap();
        store.set_brightness_level(12).unwrap();
        drop(store);

        let reopened = PreferencesStore::open(dir.path().join("preferences.toml"));
        assert_eq!(reopened.read().clock_style_id, "split");
        assert_eq!(reopened.read().brightness_level, 12);
        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_keeps_fields_changed_by_another_store() {
        let (dir, running) = temp_store();
        let path = dir.path().join("preferences.toml");
        let other = PreferencesStore::open(&path);

        other.set_brightness_level(10).unwrap();
        running.set_clock_style_id("split").unwrap();

        let on_disk = PreferencesStore::open(&path).read();
        assert_eq!(on_disk.brightness_level, 10);
        assert_eq!(on_disk.clock_style_id, "split");
        assert_eq!(running.read().brightness_level, 10);
        assert!(!running.reload().unwrap());
    }

    #[test]
    fn test_concurrent_stores_never_leave_a_partial_file() {
        let (dir, _store) = temp_store();
        let path = dir.path().join("preferences.toml");
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = PreferencesStore::open(&path);
                    for level in 0..25 {
                        store.set_brightness_level(i * 25 + level).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let table: toml::Table = contents.parse().unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_keeps_snapshot() {
        let (_dir, store) = broken_store();
        let result = store.set_clock_style_id("split");
        assert!(result.is_err());
        assert_eq!(store.read(), Preferences::default());
    }

    #[test]
    fn test_unparseable_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let store = PreferencesStore::open(&path);
        assert_eq!(store.read(), Preferences::default());
    }

    #[test]
    fn test_set_parses_values() {
        let (_dir, store) = temp_store();
        store.set("is_24h_format", "off").unwrap();
        store.set("text_color_hex", "cyan").unwrap();
        store.set("brightness_level", "140").unwrap();
        store.set("clock_style", "Split").unwrap();

        let prefs = store.read();
        assert!(!prefs.use_24_hour_format);
        assert_eq!(prefs.text_color_hex, "#4DF3FF");
        assert_eq!(prefs.brightness_level, 100);
        assert_eq!(prefs.clock_style_id, "split");

        assert!(store.set("volume", "3").is_err());
        assert!(store.set("burn_in_protection", "maybe").is_err());
        assert!(store.set("text_color_hex", "mauve").is_err());
    }

    #[test]
    fn test_reload_picks_up_external_edit() {
        let (dir, store) = temp_store();
        let path = dir.path().join("preferences.toml");
        assert!(!store.reload().unwrap());

        let other = PreferencesStore::open(&path);
        other.set_font_style("mono").unwrap();

        assert!(store.reload().unwrap());
        assert_eq!(store.read().font_style, "mono");
        assert!(!store.reload().unwrap());
    }

    #[tokio::test]
    async fn test_subscribe_emits_current_then_each_write() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        let mut stream = store.subscribe();

        assert_eq!(stream.next().await, Some(Preferences::default()));

        store.set_burn_in_protection(false).unwrap();
        let next = stream.next().await.unwrap();
        assert!(!next.burn_in_protection);

        // Nothing new until another write lands
        let pending = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
        assert!(pending.is_err());

        // A fresh subscription restarts from the current snapshot
        let mut restarted = store.subscribe();
        assert!(!restarted.next().await.unwrap().burn_in_protection);
    }

    #[tokio::test]
    async fn test_failed_write_emits_nothing() {
        let (_dir, store) = broken_store();
        let mut stream = store.subscribe();
        stream.next().await.unwrap();

        assert!(store.set_use_24_hour_format(false).is_err());
        let pending = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
        assert!(pending.is_err());
    }
}
