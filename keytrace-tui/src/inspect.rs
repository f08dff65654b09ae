//! keytrace-inspect - summarize and check a saved recording
//!
//! Prints event counts, timing and any consistency problems, or the text as
//! it stood after a given number of events.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use keytrace_core::format::read_log;
use keytrace_core::{fold, fold_all, validate, Config, LogSummary};

#[derive(Parser)]
#[command(name = "keytrace-inspect")]
#[command(about = "Inspect a keystroke recording")]
#[command(version)]
struct Args {
    /// Recording to inspect (JSON array of keystroke events)
    file: PathBuf,

    /// Print the text after the first N events
    #[arg(long, value_name = "N", conflicts_with = "text")]
    at: Option<usize>,

    /// Print the final text
    #[arg(long)]
    text: bool,

    /// Exit with an error if validation finds problems
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        keytrace_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let events = read_log(&args.file)
        .with_context(|| format!("failed to read recording {}", args.file.display()))?;
    tracing::info!(path = %args.file.display(), events = events.len(), "keytrace-inspect");

    if let Some(n) = args.at {
        println!("{}", fold(&events, n));
        return Ok(());
    }
    if args.text {
        println!("{}", fold_all(&events));
        return Ok(());
    }

    let summary = LogSummary::of(&events);
    println!("Recording: {}", args.file.display());
    print_summary(&summary);

    let issues = validate(&events);
    if issues.is_empty() {
        println!("\nNo issues found");
    } else {
        println!("\nIssues ({}):", issues.len());
        for issue in &issues {
            println!("  {}", issue);
        }
    }

    if args.strict && !issues.is_empty() {
        bail!("{} issue(s) found in {}", issues.len(), args.file.display());
    }

    Ok(())
}

fn print_summary(summary: &LogSummary) {
    println!("  Events:           {}", summary.events);
    println!("  Inserts:          {}", summary.inserts);
    println!("  Deletes:          {}", summary.deletes);
    println!("  Word deletes:     {}", summary.delete_words);
    println!("  Chars inserted:   {}", summary.chars_inserted);
    println!("  Chars removed:    {}", summary.chars_removed);
    println!("  Final length:     {}", summary.final_len);
    println!("  Duration:         {}", format_duration(summary.duration_ms()));
    if let Some(started) = summary.started_at() {
        println!("  Started:          {}", format_timestamp(started));
    }
    if let Some(ended) = summary.ended_at() {
        println!("  Ended:            {}", format_timestamp(ended));
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}.{:03}s", secs, ms % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0.000s");
        assert_eq!(format_duration(5_250), "5.250s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_725_000), "1h 2m 5s");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = DateTime::<Utc>::from_timestamp_millis(1_500).unwrap();
        assert_eq!(format_timestamp(ts), "1970-01-01 00:00:01.500 UTC");
    }
}
