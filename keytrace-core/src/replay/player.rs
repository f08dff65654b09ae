//! Async playback driver
//!
//! Runs a [`ReplayEngine`] on a tokio task. Control calls arrive as
//! [`PlayerCommand`]s over an mpsc channel; the task sleeps until the
//! engine's pending advance is due and publishes a [`PlaybackSnapshot`] on
//! a watch channel after every change.
//!
//! At most one deadline is tracked. It is re-derived from the engine's
//! pending ticket after every command, so a command that disarms the engine
//! also drops the deadline.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::types::KeystrokeEvent;

use super::{PlaybackStatus, ReplayEngine, Ticket};

/// Control calls accepted by the player task
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Play,
    Pause,
    Toggle,
    Seek(usize),
    StepForward,
    StepBack,
    Reset,
    SetSpeed(f64),
    Faster,
    Slower,
    /// Replace the log snapshot
    Load(Arc<[KeystrokeEvent]>),
    /// Stop the task and hand back the engine
    Shutdown,
}

/// Observable playback state published after every change
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub cursor_index: usize,
    pub len: usize,
    pub text: String,
    pub status: PlaybackStatus,
    pub speed: f64,
    pub progress_percent: f64,
}

impl PlaybackSnapshot {
    pub fn of(engine: &ReplayEngine) -> Self {
        Self {
            cursor_index: engine.cursor_index(),
            len: engine.len(),
            text: engine.reconstructed_text().to_string(),
            status: engine.status(),
            speed: engine.speed(),
            progress_percent: engine.progress_percent(),
        }
    }
}

/// Handle to a running player task
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    task: JoinHandle<ReplayEngine>,
}

impl PlayerHandle {
    /// Send a control call to the player
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Player("player task has stopped".to_string()))
    }

    /// A receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot
    pub fn current(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the task and return the engine in its final state
    pub async fn shutdown(self) -> Result<ReplayEngine> {
        // The task may already have exited if every sender was dropped.
        let _ = self.commands.send(PlayerCommand::Shutdown).await;
        self.task
            .await
            .map_err(|e| Error::Player(format!("player task failed: {}", e)))
    }
}

/// Spawn a player task for `engine` on the current tokio runtime.
pub fn spawn_player(engine: ReplayEngine) -> PlayerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::of(&engine));
    let task = tokio::spawn(run(engine, cmd_rx, snapshot_tx));

    PlayerHandle {
        commands: cmd_tx,
        snapshots: snapshot_rx,
        task,
    }
}

async fn run(
    mut engine: ReplayEngine,
    mut commands: mpsc::Receiver<PlayerCommand>,
    snapshots: watch::Sender<PlaybackSnapshot>,
) -> ReplayEngine {
    let mut deadline: Option<(Ticket, Instant)> = None;

    loop {
        deadline = match (engine.pending(), deadline) {
            (Some(pending), Some((ticket, at))) if pending.ticket == ticket => Some((ticket, at)),
            (Some(pending), _) => Some((pending.ticket, Instant::now() + pending.delay)),
            (None, _) => None,
        };
        let wake_at = deadline.map(|(_, at)| at).unwrap_or_else(Instant::now);

        tokio::select! {
            command = commands.recv() => match command {
                Some(PlayerCommand::Shutdown) | None => {
                    engine.pause();
                    snapshots.send_replace(PlaybackSnapshot::of(&engine));
                    tracing::debug!(cursor = engine.cursor_index(), "Player shutting down");
                    break;
                }
                Some(command) => handle_command(&mut engine, command),
            },
            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                if let Some((ticket, _)) = deadline.take() {
                    engine.fire(ticket);
                }
            }
        }

        snapshots.send_replace(PlaybackSnapshot::of(&engine));
    }

    engine
}

fn handle_command(engine: &mut ReplayEngine, command: PlayerCommand) {
    tracing::trace!(?command, "Player command");
    match command {
        PlayerCommand::Play => {
            engine.play();
        }
        PlayerCommand::Pause => engine.pause(),
        PlayerCommand::Toggle => {
            engine.toggle();
        }
        PlayerCommand::Seek(index) => engine.seek(index),
        PlayerCommand::StepForward => engine.step_forward(),
        PlayerCommand::StepBack => engine.step_back(),
        PlayerCommand::Reset => engine.reset(),
        PlayerCommand::SetSpeed(factor) => {
            engine.set_speed(factor);
        }
        PlayerCommand::Faster => {
            engine.faster();
        }
        PlayerCommand::Slower => {
            engine.slower();
        }
        PlayerCommand::Load(events) => engine.load(events),
        PlayerCommand::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::PlaybackSettings;
    use std::time::Duration;

    fn hi_engine() -> ReplayEngine {
        ReplayEngine::new(
            vec![
                KeystrokeEvent::insert(0, 0, "H"),
                KeystrokeEvent::insert(100, 1, "i"),
                KeystrokeEvent::delete(300, 0, "H"),
            ],
            PlaybackSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_plays_to_finish() {
        let handle = spawn_player(hi_engine());
        let mut snapshots = handle.subscribe();
        let start = Instant::now();

        handle.send(PlayerCommand::Play).await.unwrap();
        let finished = snapshots
            .wait_for(|s| s.status == PlaybackStatus::Finished)
            .await
            .unwrap()
            .clone();

        assert_eq!(finished.text, "i");
        assert_eq!(finished.cursor_index, 3);
        assert_eq!(finished.progress_percent, 100.0);
        assert!(start.elapsed() >= Duration::from_millis(800));

        let engine = handle.shutdown().await.unwrap();
        assert_eq!(engine.cursor_index(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_cursor() {
        let handle = spawn_player(hi_engine());
        let mut snapshots = handle.subscribe();

        handle.send(PlayerCommand::Play).await.unwrap();
        snapshots.wait_for(|s| s.cursor_index == 1).await.unwrap();
        handle.send(PlayerCommand::Pause).await.unwrap();
        snapshots
            .wait_for(|s| s.status == PlaybackStatus::Idle)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let current = handle.current();
        assert_eq!(current.cursor_index, 1);
        assert_eq!(current.text, "H");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_speed_commands() {
        let handle = spawn_player(hi_engine());
        let mut snapshots = handle.subscribe();

        handle.send(PlayerCommand::Seek(2)).await.unwrap();
        handle.send(PlayerCommand::SetSpeed(3.0)).await.unwrap();
        let snapshot = snapshots
            .wait_for(|s| s.speed == 3.0)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.text, "Hi");
        assert_eq!(snapshot.status, PlaybackStatus::Idle);

        handle.send(PlayerCommand::Reset).await.unwrap();
        let snapshot = snapshots
            .wait_for(|s| s.cursor_index == 0)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.text, "");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_replaces_log() {
        let handle = spawn_player(hi_engine());
        let mut snapshots = handle.subscribe();

        let events: Arc<[KeystrokeEvent]> = Arc::from(vec![KeystrokeEvent::insert(0, 0, "x")]);
        handle.send(PlayerCommand::Load(events)).await.unwrap();
        handle.send(PlayerCommand::Play).await.unwrap();
        let finished = snapshots
            .wait_for(|s| s.len == 1 && s.status == PlaybackStatus::Finished)
            .await
            .unwrap()
            .clone();
        assert_eq!(finished.text, "x");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_log_play_finishes() {
        let handle = spawn_player(ReplayEngine::new(Vec::<KeystrokeEvent>::new(), PlaybackSettings::default()));
        handle.send(PlayerCommand::Play).await.unwrap();
        let engine = handle.shutdown().await.unwrap();
        assert_eq!(engine.status(), PlaybackStatus::Finished);
        assert_eq!(engine.reconstructed_text(), "");
    }
}
