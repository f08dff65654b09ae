//! keytrace - keystroke recorder and replayer
//!
//! Terminal UI for writing text while every edit is recorded, and for
//! replaying a saved recording keystroke by keystroke.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use keytrace_core::format::read_log;
use keytrace_core::Config;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "keytrace")]
#[command(about = "Record how text is typed and replay it keystroke by keystroke")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the writing surface (default)
    Record {
        /// Where Ctrl+S saves the recording (defaults to a timestamped file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Continue from a previously saved recording
        #[arg(long, value_name = "FILE")]
        resume: Option<PathBuf>,
    },
    /// Replay a saved recording
    Replay {
        /// Recording to replay (JSON array of keystroke events)
        file: PathBuf,

        /// Initial playback speed
        #[arg(short, long)]
        speed: Option<f64>,

        /// Start playing immediately
        #[arg(long)]
        autoplay: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        keytrace_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("keytrace TUI starting up");

    // Build the app before touching the terminal so load errors print normally
    let mut app = match args.command.unwrap_or(Command::Record {
        output: None,
        resume: None,
    }) {
        Command::Record { output, resume } => {
            let events = match resume {
                Some(path) => Some(
                    read_log(&path)
                        .with_context(|| format!("failed to read recording {}", path.display()))?,
                ),
                None => None,
            };
            App::recorder(&config, output, events)
        }
        Command::Replay {
            file,
            speed,
            autoplay,
        } => {
            let events = read_log(&file)
                .with_context(|| format!("failed to read recording {}", file.display()))?;
            tracing::info!(path = %file.display(), events = events.len(), "Loaded recording");
            let mut app = App::player(&config, events);
            if let Some(speed) = speed {
                app.engine.set_speed(speed);
            }
            if autoplay {
                app.autoplay();
            }
            app
        }
    };

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("keytrace TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Fire any playback advance that came due while waiting
        app.tick(Instant::now());

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events, waking early for the next playback advance
        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
