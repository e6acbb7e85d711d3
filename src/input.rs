use anyhow::{Context, Result, bail};
use std::io::BufRead;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info, warn};

use crate::gesture::{GestureSample, GestureThresholds, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// A complete gesture on one line
    Gesture(GestureSample),
    /// One step of a streamed pointer sequence
    Pointer(PointerEvent),
    Quit,
}

/// Streamed pointer steps; times are milliseconds on any monotonic clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { at: Point, time_ms: u64 },
    Move { to: Point },
    Up { at: Point, time_ms: u64 },
    Cancel,
}

/// Parse one input line.
///
/// Accepts `x0 y0 x1 y1 elapsed_ms`, the streamed steps `down x y ms`,
/// `move x y`, `up x y ms` and `cancel`, or the shorthands `tap`, `left`,
/// `right` and `quit`. Shorthands are sized from `thresholds` so they
/// classify the same way on any density. Blank lines yield `None`.
pub fn parse_line(line: &str, thresholds: &GestureThresholds) -> Result<Option<InputCommand>> {
    let line = line.trim();
    let swipe = thresholds.swipe_threshold * 2.0;
    let quick = Duration::from_millis(50);

    let command = match line.to_lowercase().as_str() {
        "" => return Ok(None),
        "q" | "quit" | "exit" => InputCommand::Quit,
        "tap" => InputCommand::Gesture(GestureSample {
            start: Point::default(),
            end: Point::default(),
            elapsed: quick,
        }),
        "left" => InputCommand::Gesture(GestureSample {
            start: Point::new(swipe, 0.0),
            end: Point::default(),
            elapsed: quick,
        }),
        "right" => InputCommand::Gesture(GestureSample {
            start: Point::default(),
            end: Point::new(swipe, 0.0),
            elapsed: quick,
        }),
        "cancel" => InputCommand::Pointer(PointerEvent::Cancel),
        _ => {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let coord = |i: usize| -> Result<f32> {
                fields[i]
                    .parse::<f32>()
                    .with_context(|| format!("'{}' is not a coordinate", fields[i]))
            };
            let millis = |i: usize| -> Result<u64> {
                fields[i]
                    .parse::<u64>()
                    .with_context(|| format!("'{}' is not a time in milliseconds", fields[i]))
            };
            match (fields[0].to_lowercase().as_str(), fields.len()) {
                ("down", 4) => InputCommand::Pointer(PointerEvent::Down {
                    at: Point::new(coord(1)?, coord(2)?),
                    time_ms: millis(3)?,
                }),
                ("move", 3) => InputCommand::Pointer(PointerEvent::Move {
                    to: Point::new(coord(1)?, coord(2)?),
                }),
                ("up", 4) => InputCommand::Pointer(PointerEvent::Up {
                    at: Point::new(coord(1)?, coord(2)?),
                    time_ms: millis(3)?,
                }),
                (_, 5) => InputCommand::Gesture(GestureSample {
                    start: Point::new(coord(0)?, coord(1)?),
                    end: Point::new(coord(2)?, coord(3)?),
                    elapsed: Duration::from_millis(millis(4)?),
                }),
                _ => bail!("expected 'x0 y0 x1 y1 elapsed_ms', down/move/up/cancel, tap, left, right or quit"),
            }
        }
    };
    Ok(Some(command))
}

/// Spawn a background thread reading gestures from stdin.
/// The channel closes when stdin reaches EOF.
pub fn spawn_listener(sender: Sender<InputCommand>, thresholds: GestureThresholds) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("Gesture input listener started (stdin)");
        if let Err(e) = listen_for_gestures(&sender, &thresholds) {
            error!(error = %e, "Gesture input listener error");
        }
        debug!("Gesture input listener stopped");
    })
}

fn listen_for_gestures(sender: &Sender<InputCommand>, thresholds: &GestureThresholds) -> Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        match parse_line(&line, thresholds) {
            Ok(Some(command)) => {
                debug!(command = ?command, "Gesture input");
                if sender.blocking_send(command).is_err() {
                    // Session is gone
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => warn!(line = %line, error = %e, "Ignoring unparseable input"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{GestureIntent, GestureInterpreter};

    fn intent(line: &str) -> GestureIntent {
        let thresholds = GestureThresholds::default();
        match parse_line(line, &thresholds).unwrap() {
            Some(InputCommand::Gesture(sample)) => GestureInterpreter::new(thresholds).classify(sample),
            other => panic!("not a gesture: {other:?}"),
        }
    }

    #[test]
    fn test_parse_raw_sample() {
        let parsed = parse_line("0 0 40 2 100", &GestureThresholds::default()).unwrap();
        assert_eq!(
            parsed,
            Some(InputCommand::Gesture(GestureSample {
                start: Point::new(0.0, 0.0),
                end: Point::new(40.0, 2.0),
                elapsed: Duration::from_millis(100),
            }))
        );
    }

    #[test]
    fn test_shorthands_classify_as_named() {
        assert_eq!(intent("tap"), GestureIntent::Exit);
        assert_eq!(intent("left"), GestureIntent::ShiftStyle(1));
        assert_eq!(intent("RIGHT"), GestureIntent::ShiftStyle(-1));
    }

    #[test]
    fn test_parse_pointer_steps() {
        let thresholds = GestureThresholds::default();
        let parse = |line: &str| parse_line(line, &thresholds).unwrap();
        assert_eq!(
            parse("down 10 20 1000"),
            Some(InputCommand::Pointer(PointerEvent::Down {
                at: Point::new(10.0, 20.0),
                time_ms: 1000,
            }))
        );
        assert_eq!(
            parse("MOVE 30.5 -2"),
            Some(InputCommand::Pointer(PointerEvent::Move {
                to: Point::new(30.5, -2.0),
            }))
        );
        assert_eq!(
            parse("up 60 20 1150"),
            Some(InputCommand::Pointer(PointerEvent::Up {
                at: Point::new(60.0, 20.0),
                time_ms: 1150,
            }))
        );
        assert_eq!(parse("cancel"), Some(InputCommand::Pointer(PointerEvent::Cancel)));

        assert!(parse_line("down 10 20", &thresholds).is_err());
        assert!(parse_line("up 1 2 -3", &thresholds).is_err());
    }

    #[test]
    fn test_quit_blank_and_garbage() {
        let thresholds = GestureThresholds::default();
        assert_eq!(parse_line(" quit ", &thresholds).unwrap(), Some(InputCommand::Quit));
        assert_eq!(parse_line("   ", &thresholds).unwrap(), None);
        assert!(parse_line("1 2 3", &thresholds).is_err());
        assert!(parse_line("a b c d 10", &thresholds).is_err());
        assert!(parse_line("0 0 1 1 -5", &thresholds).is_err());
    }
}
