#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Level as TraceLevel, debug, error};
use tracing_subscriber::FmtSubscriber;

use clock_dream::clock::{ClockFrame, ClockSession, SystemClock, WallClock};
use clock_dream::config::Config;
use clock_dream::constants::keys;
use clock_dream::event_handler::{Flow, HostContext, HostEvent, Renderer, handle_event};
use clock_dream::gesture::{GestureInterpreter, GestureSample, Point};
use clock_dream::input::{self, InputCommand};
use clock_dream::preferences::PreferencesStore;
use clock_dream::style::ClockStyle;

#[derive(Debug, Parser)]
#[command(name = "clock-dream", version, about = "Full-screen digital clock screensaver")]
struct Cli {
    /// Host config file (default: <config dir>/clock-dream/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferences file (default: <config dir>/clock-dream/preferences.toml)
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the clock; read gestures from stdin (`x0 y0 x1 y1 ms`, down/move/up/cancel, tap, left, right, quit)
    Run {
        /// Print one summary line per frame instead of redrawing the screen
        #[arg(long)]
        plain: bool,
        /// Don't read gestures from stdin; stop with Ctrl-C
        #[arg(long)]
        no_input: bool,
    },
    /// Draw one frame from the current preferences and exit
    Preview {
        /// Style to draw instead of the saved one (basic, split, minimal)
        #[arg(long)]
        style: Option<String>,
        /// Print the one-line summary instead of the coloured face
        #[arg(long)]
        plain: bool,
    },
    /// Print the current preferences
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Change one preference
    Set {
        /// One of: is_24h_format, text_color_hex, font_style, brightness_level, burn_in_protection, clock_style
        key: String,
        value: String,
    },
    /// Classify a single gesture and print the resulting intent
    #[command(allow_negative_numbers = true)]
    Classify {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        elapsed_ms: u64,
    },
}

fn init_logging(config_level: Option<String>) -> Result<()> {
    // LOG_LEVEL wins over the config file
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .or(config_level)
        .unwrap_or_default()
        .to_lowercase();
    let log_level = match level.as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // Frames go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    init_logging(Config::peek_log_level(&config_path))?;

    // Only a running session writes a default config file
    let config = if matches!(cli.command, None | Some(Command::Run { .. })) {
        Config::load_from(&config_path)?
    } else {
        Config::load_or_default(&config_path)?
    };
    debug!(path = %config_path.display(), "config={:#?}", config);

    let store = Arc::new(match &cli.preferences {
        Some(path) => PreferencesStore::open(path),
        None => PreferencesStore::open_default(),
    });

    match cli.command.unwrap_or(Command::Run {
        plain: false,
        no_input: false,
    }) {
        Command::Run { plain, no_input } => run_session(&config, store, plain, no_input).await,
        Command::Preview { style, plain } => preview(&config, &store, style.as_deref(), plain),
        Command::Show { json } => show(&store, json),
        Command::Set { key, value } => {
            store.set(&key, &value)?;
            show(&store, false)
        }
        Command::Classify {
            x0,
            y0,
            x1,
            y1,
            elapsed_ms,
        } => {
            let interpreter = GestureInterpreter::new(config.gesture_thresholds());
            let intent = interpreter.classify(GestureSample {
                start: Point::new(x0, y0),
                end: Point::new(x1, y1),
                elapsed: Duration::from_millis(elapsed_ms),
            });
            println!("{intent:?}");
            Ok(())
        }
    }
}

fn preview(config: &Config, store: &PreferencesStore, style: Option<&str>, plain: bool) -> Result<()> {
    let mut frame = ClockFrame::still(&store.read(), &SystemClock.now());
    if let Some(id) = style {
        frame.style = ClockStyle::find(&id.to_lowercase())
            .with_context(|| format!("Unknown clock style '{id}' (expected basic, split or minimal)"))?;
    }
    let renderer = Renderer {
        plain,
        max_shift: config.burn_in.max_shift_px,
    };
    print!("{}", renderer.render_still(&frame));
    Ok(())
}

fn show(store: &PreferencesStore, json: bool) -> Result<()> {
    let prefs = store.read();
    if json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
        return Ok(());
    }
    println!("# {}", store.path().display());
    for key in keys::ALL {
        println!("{key} = {}", prefs.value_of(key).unwrap_or_default());
    }
    Ok(())
}

async fn next_input(rx: &mut Option<mpsc::Receiver<InputCommand>>) -> Option<InputCommand> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn run_session(config: &Config, store: Arc<PreferencesStore>, plain: bool, no_input: bool) -> Result<()> {
    let thresholds = config.gesture_thresholds();
    let renderer = Renderer {
        plain,
        max_shift: config.burn_in.max_shift_px,
    };
    let mut ctx = HostContext::new(
        store.clone(),
        GestureInterpreter::new(thresholds),
        config.gestures.touch_guard,
        renderer,
    );

    let session = ClockSession::start_default(store, config.engine_settings());
    let mut frames = session.watch_frames();

    // Stdin listener runs on its own thread, like a blocking device reader
    let mut input_rx = if no_input {
        None
    } else {
        let (tx, rx) = mpsc::channel(16);
        let _listener = input::spawn_listener(tx, thresholds);
        Some(rx)
    };

    let mut reload = tokio::time::interval(config.reload_interval());
    reload.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    ctx.renderer.draw(&session.frame())?;

    loop {
        let event = tokio::select! {
            changed = frames.changed() => match changed {
                Ok(()) => HostEvent::FrameChanged(frames.borrow_and_update().clone()),
                Err(_) => break,
            },
            command = next_input(&mut input_rx) => match command {
                Some(command) => HostEvent::Input(command),
                None => HostEvent::InputClosed,
            },
            _ = reload.tick() => HostEvent::ReloadTick,
            _ = tokio::signal::ctrl_c() => HostEvent::Interrupt,
        };

        match handle_event(&mut ctx, &session, event).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(err) => error!("encountered error in 'handle_event': err={err:#?}"),
        }
    }

    session.end().await;
    Ok(())
}
