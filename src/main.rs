//! termcanvas - demo scenes for the terminal canvas
//!
//! # Quick Start
//!
//! ```text
//! termcanvas                  # Move a marker with w/a/s/d
//! termcanvas -d text          # Type into a text box
//! termcanvas -d boxes         # Overlapping rectangles at different depths
//! termcanvas --listener       # Read key down/up events from a listener thread
//! ```
//!
//! Esc quits every scene.

use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::info;

use termcanvas::config::InputMode;
use termcanvas::logging;
use termcanvas::{Config, KeyCode, LogLevel, Rect, Session, Vector};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Delay between frames
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Demo scene to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    Runner,
    Text,
    Boxes,
}

/// Command line overrides on top of the config file
#[derive(Debug, Default)]
struct Args {
    scene: Option<Scene>,
    input: Option<InputMode>,
    log_level: Option<LogLevel>,
    log_file: Option<PathBuf>,
}

fn print_version() {
    eprintln!("termcanvas {}", VERSION);
}

fn print_help() {
    eprintln!("termcanvas {} - Immediate-mode character canvas demo", VERSION);
    eprintln!();
    eprintln!("Usage: termcanvas [OPTIONS]");
    eprintln!();
    eprintln!("Scene options:");
    eprintln!("  -d, --demo <NAME>     runner (default), text or boxes");
    eprintln!();
    eprintln!("Input options:");
    eprintln!("  (default)             From config.toml or scan");
    eprintln!("  --scan                Scan buffered input bytes each frame");
    eprintln!("  --listener            Key down/up events from a listener thread");
    eprintln!();
    eprintln!("Logging options:");
    eprintln!("  --log-level <LEVEL>   all, debug, info, error or none");
    eprintln!("  --log-file <PATH>     Append log lines to PATH");
    eprintln!();
    eprintln!("Other options:");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  w/a/s/d               Move (runner)");
    eprintln!("  Backspace             Delete last character (text)");
    eprintln!("  Esc                   Quit");
    eprintln!();
    eprintln!("Config file: ~/.termcanvas/config.toml");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-d" | "--demo" => {
                i += 1;
                let name = args.get(i).ok_or("Missing scene name")?;
                parsed.scene = Some(match name.as_str() {
                    "runner" => Scene::Runner,
                    "text" => Scene::Text,
                    "boxes" => Scene::Boxes,
                    other => return Err(format!("Unknown scene: {}", other)),
                });
            }
            "--scan" => {
                parsed.input = Some(InputMode::Scan);
            }
            "--listener" => {
                parsed.input = Some(InputMode::Listener);
            }
            "--log-level" => {
                i += 1;
                let level = args.get(i).ok_or("Missing log level")?;
                parsed.log_level = Some(level.parse().map_err(|e| format!("{}", e))?);
            }
            "--log-file" => {
                i += 1;
                let path = args.get(i).ok_or("Missing log file path")?;
                parsed.log_file = Some(PathBuf::from(path));
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    // Command line overrides the config file
    let mut config = Config::load();
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }

    logging::init(config.log_level, config.log_file.as_deref())?;
    info!("termcanvas {} starting", VERSION);

    let mut session = Session::prepare(&config)?;
    let result = match args.scene.unwrap_or(Scene::Runner) {
        Scene::Runner => run_runner(&mut session),
        Scene::Text => run_text_box(&mut session),
        Scene::Boxes => run_boxes(&mut session),
    };
    session.restore();
    result
}

/// Arrow glyph facing the direction of travel
fn marker_for(dir: Vector) -> Option<u32> {
    match (dir.x as i32, dir.y as i32) {
        (0, -1) => Some(0x25B3), // △
        (1, 0) => Some(0x25B7),  // ▷
        (0, 1) => Some(0x25BD),  // ▽
        (-1, 0) => Some(0x25C1), // ◁
        _ => None,
    }
}

fn run_runner(session: &mut Session) -> anyhow::Result<()> {
    let (width, height) = (session.width() as f32, session.height() as f32);
    let mut pos = Vector::xy((width / 2.0).floor(), (height / 2.0).floor());
    let mut marker = 0x25B3;
    // Cells are about twice as tall as wide
    let step = Vector::new(2.0, 1.0, 1.0);

    loop {
        session.poll_events()?;
        if session.is_key_pressed(KeyCode::ESC) {
            break;
        }

        let mut dir = Vector::xy(0.0, 0.0);
        if session.is_key_pressed(KeyCode::from_byte(b'w')) {
            dir.y -= 1.0;
        }
        if session.is_key_pressed(KeyCode::from_byte(b'a')) {
            dir.x -= 1.0;
        }
        if session.is_key_pressed(KeyCode::from_byte(b's')) {
            dir.y += 1.0;
        }
        if session.is_key_pressed(KeyCode::from_byte(b'd')) {
            dir.x += 1.0;
        }
        if let Some(m) = marker_for(dir) {
            marker = m;
        }

        let next = pos.add(dir.mul(step));
        if next.x >= 0.0 && next.x < width && next.y >= 0.0 && next.y < height {
            pos = next;
        }

        session.clear();
        session.draw_char(marker, pos);
        session.render()?;
        thread::sleep(FRAME_INTERVAL);
    }

    Ok(())
}

/// Longest text the box accepts
const TEXT_CAP: usize = 100;

fn run_text_box(session: &mut Session) -> anyhow::Result<()> {
    let mut text = String::new();
    let text_box = Rect::new(
        Vector::xy(10.0, (session.height() / 2) as f32 - 2.0),
        Vector::xy(TEXT_CAP as f32 + 2.0, 2.0),
    );

    loop {
        session.poll_events()?;
        if session.is_key_pressed(KeyCode::ESC) {
            break;
        }

        if session.is_key_pressed(KeyCode::BACKSPACE) || session.is_key_pressed(KeyCode::DELETE)
        {
            text.pop();
        }

        let typed: Vec<char> = session
            .pressed_keys()
            .filter(|k| !k.is_control())
            .filter_map(KeyCode::as_char)
            .filter(char::is_ascii)
            .collect();
        for c in typed {
            if text.len() < TEXT_CAP {
                text.push(c);
            }
        }

        session.clear();
        session.draw_rect(text_box);
        session.draw_text(&text, text_box.pos.add(Vector::xy(1.0, 1.0)));
        session.render()?;
        thread::sleep(FRAME_INTERVAL);
    }

    Ok(())
}

fn run_boxes(session: &mut Session) -> anyhow::Result<()> {
    let rect = |x: f32, y: f32, z: f32, w: f32, h: f32| {
        Rect::new(Vector::new(x, y, z), Vector::xy(w, h))
    };

    loop {
        session.poll_events()?;
        if session.is_key_pressed(KeyCode::ESC) {
            break;
        }

        session.clear();
        session.draw_rect(rect(2.0, 1.0, 2.0, 24.0, 8.0));
        session.fill_rect(rect(10.0, 4.0, 1.0, 24.0, 8.0));
        session.draw_rect(rect(18.0, 7.0, 3.0, 24.0, 8.0));
        session.draw_text("z = 2", Vector::new(4.0, 2.0, 2.0));
        session.draw_text("z = 3", Vector::new(20.0, 8.0, 3.0));
        session.draw_text("Esc to quit", Vector::new(2.0, 0.0, 0.0));
        session.render()?;
        thread::sleep(FRAME_INTERVAL);
    }

    Ok(())
}
