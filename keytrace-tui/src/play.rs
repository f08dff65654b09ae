//! keytrace-play - headless playback of a saved recording
//!
//! Drives the async player in real time, shows progress on stderr and prints
//! the reconstructed text to stdout when playback ends or is interrupted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use keytrace_core::format::read_log;
use keytrace_core::replay::{spawn_player, PlayerCommand};
use keytrace_core::{Config, PlaybackSettings, PlaybackStatus, ReplayEngine};

#[derive(Parser)]
#[command(name = "keytrace-play")]
#[command(about = "Replay a keystroke recording in the terminal")]
#[command(version)]
struct Args {
    /// Recording to replay (JSON array of keystroke events)
    file: PathBuf,

    /// Playback speed (clamped to the configured limits)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Start from this event index instead of the beginning (at most the last event)
    #[arg(long, default_value_t = 0)]
    from: usize,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        keytrace_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let events = read_log(&args.file)
        .with_context(|| format!("failed to read recording {}", args.file.display()))?;
    tracing::info!(path = %args.file.display(), events = events.len(), "keytrace-play starting");

    let mut engine = ReplayEngine::new(events, PlaybackSettings::from(&config.playback));
    if let Some(speed) = args.speed {
        engine.set_speed(speed);
    }
    // Positioned before the task starts, so no published snapshot precedes Play
    engine.seek(start_index(args.from, engine.len()));
    let total = engine.len() as u64;

    // Set up signal handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let player = spawn_player(engine);
    let mut snapshots = player.subscribe();

    player.send(PlayerCommand::Play).await?;

    let mut interrupt_check = tokio::time::interval(Duration::from_millis(100));
    let mut interrupted = false;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                pb.set_position(snapshot.cursor_index as u64);
                pb.set_message(format!("{}x", snapshot.speed));
                if snapshot.status == PlaybackStatus::Finished {
                    break;
                }
            }
            _ = interrupt_check.tick() => {
                if !running.load(Ordering::SeqCst) {
                    interrupted = true;
                    break;
                }
            }
        }
    }

    pb.finish_and_clear();

    let engine = player.shutdown().await.context("player stopped unexpectedly")?;
    println!("{}", engine.reconstructed_text());

    if interrupted {
        eprintln!(
            "Interrupted at event {} of {}",
            engine.cursor_index(),
            engine.len()
        );
    }

    tracing::info!(
        cursor = engine.cursor_index(),
        events = engine.len(),
        interrupted,
        "keytrace-play complete"
    );

    Ok(())
}

/// Where playback starts. Play from the end would restart at 0, so the last
/// event is the furthest start.
fn start_index(from: usize, len: usize) -> usize {
    from.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_index_stays_before_end() {
        assert_eq!(start_index(0, 3), 0);
        assert_eq!(start_index(2, 3), 2);
        assert_eq!(start_index(3, 3), 2);
        assert_eq!(start_index(usize::MAX, 3), 2);
        assert_eq!(start_index(5, 0), 0);
    }
}
