//! # keytrace-core
//!
//! Core library for keytrace - records how a piece of text was typed and
//! replays it.
//!
//! This library provides:
//! - Domain types for keystroke events and the append-only event log
//! - The diff encoder that turns raw text snapshots into events
//! - Pure reconstruction (fold) of text at any point in a log
//! - A timer-driven replay engine with seek, pause and speed control
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Recording and playback never share mutable state:
//! - **Recording:** a [`RecordingSession`] mirrors the live text and appends
//!   events to its [`EventLog`]
//! - **Exchange:** logs cross process boundaries as JSON arrays ([`format`])
//! - **Playback:** a [`ReplayEngine`] owns an immutable snapshot of a log
//!
//! ## Example
//!
//! ```rust
//! use keytrace_core::{fold, PlaybackSettings, RecordingSession, ReplayEngine};
//!
//! let mut session = RecordingSession::new();
//! session.start();
//! session.observe("H", 1, 0);
//! session.observe("Hi", 2, 120);
//!
//! let snapshot = session.log().snapshot();
//! assert_eq!(fold(&snapshot, snapshot.len()), "Hi");
//!
//! let mut engine = ReplayEngine::new(snapshot, PlaybackSettings::default());
//! engine.seek(1);
//! assert_eq!(engine.reconstructed_text(), "H");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use encoder::{encode, EncodeStrategy};
pub use error::{Error, Result};
pub use fold::{apply, fold, fold_all};
pub use format::{deserialize, serialize};
pub use log::{validate, EventLog, LogIssue, LogSummary};
pub use replay::{PlaybackSettings, PlaybackStatus, ReplayEngine, ScheduledAdvance, Ticket};
pub use session::{now_ms, ClipboardOp, RecordingSession};
pub use text::TextStats;
pub use types::*;

// Public modules
pub mod config;
pub mod encoder;
pub mod error;
pub mod fold;
pub mod format;
pub mod log;
pub mod logging;
pub mod replay;
pub mod session;
pub mod text;
pub mod types;
