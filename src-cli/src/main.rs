use clap::Parser;
use melodia_core::{AppCore, AppError, Command, GameConfig, GameMode};
use melodia_infra_storage_fs::FsStorage;
use melodia_ports::audio::{AudioError, AudioPlayerPort};
use melodia_ports::storage::ProfileStorePort;
use melodia_ports::types::Note;
use parking_lot::Mutex;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "melodia", about = "Ear-training and melody game, driven from the terminal")]
struct Args {
    /// Timing config JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding users.json.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep profiles in memory only.
    #[arg(long)]
    no_save: bool,

    #[arg(short, long)]
    verbose: bool,
}

/// Stands in for a sample player: notes are only logged.
struct LogAudioPlayer;

impl AudioPlayerPort for LogAudioPlayer {
    fn play_note(&self, note: Note) -> Result<(), AudioError> {
        log::info!("note {note}");
        Ok(())
    }

    fn stop_all(&self) {
        log::debug!("audio stopped");
    }
}

enum Input {
    Command(Command),
    Quit,
}

/// Accepts JSON commands as well as a few shorthands: a bare MIDI number
/// presses that key, `pause` toggles pause, `free`/`notes`/`melody` enter a
/// mode, `exit` leaves it, `quit` ends the program.
fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let input = match line {
        "quit" | "q" => Input::Quit,
        "pause" | "p" => Input::Command(Command::TogglePause),
        "free" => Input::Command(Command::EnterMode {
            mode: GameMode::FreePlay,
        }),
        "notes" => Input::Command(Command::EnterMode {
            mode: GameMode::NoteRecognition,
        }),
        "melody" => Input::Command(Command::EnterMode {
            mode: GameMode::MelodyPlay,
        }),
        "exit" => Input::Command(Command::ExitMode),
        "save" => Input::Command(Command::Save),
        _ => match line.parse::<Note>() {
            Ok(note) => Input::Command(Command::PressKey { note }),
            Err(_) => {
                let cmd: Command = serde_json::from_str(line).map_err(|e| e.to_string())?;
                Input::Command(cmd)
            }
        },
    };
    Ok(Some(input))
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &args.config {
        Some(path) => {
            let config = GameConfig::load(path)?;
            log::info!("loaded config from {}", path.display());
            config
        }
        None => GameConfig::default(),
    };

    let store: Option<Box<dyn ProfileStorePort>> = if args.no_save {
        None
    } else {
        let storage = match args.data_dir {
            Some(dir) => FsStorage::new(dir),
            None => FsStorage::default(),
        };
        log::info!("profiles in {}", storage.base_dir().display());
        Some(Box::new(storage))
    };

    let core = Arc::new(Mutex::new(AppCore::new(
        Box::new(LogAudioPlayer),
        store,
        config,
    )));
    let running = Arc::new(AtomicBool::new(true));

    let ticker = {
        let core = core.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut last = Instant::now();
            while running.load(Ordering::Relaxed) {
                let now = Instant::now();
                let events = {
                    let mut core = core.lock();
                    core.tick(now - last);
                    core.drain_events()
                };
                last = now;

                for event in events {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(err) => log::warn!("event not serializable: {err}"),
                    }
                }
                thread::sleep(Duration::from_millis(16));
            }
        })
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("stdin closed: {err}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(Input::Command(cmd))) => {
                if let Err(err) = core.lock().handle_command(cmd) {
                    log::warn!("{err}");
                }
            }
            Ok(None) => {}
            Err(err) => log::warn!("unrecognized input: {err}"),
        }
    }

    running.store(false, Ordering::Relaxed);
    if ticker.join().is_err() {
        log::error!("tick thread panicked");
    }

    let mut core = core.lock();
    core.handle_command(Command::ExitMode)?;
    core.handle_command(Command::Save)?;
    log::info!("bye");
    Ok(())
}
