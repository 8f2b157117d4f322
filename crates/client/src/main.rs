//! Headless skirmish runner.
//!
//! Plays the scripted encounter to completion and prints the engine's event
//! journal to stdout as JSON lines. Logs go to stderr and a session log file.

mod scenario;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use game_content::ContentFactory;
use runtime::{Runtime, RuntimeConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env();
    setup_logging(&config.session_id)?;

    let factory = match &config.content_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::builtin(),
    };
    let game_config = factory
        .load_config()
        .with_context(|| format!("loading rules from {}", factory.data_dir().display()))?;
    let content = factory.load_content().context("loading ability catalog")?;

    let mut runtime = Runtime::builder()
        .config(config)
        .game_config(game_config)
        .content(content)
        .initial_state(scenario::skirmish())
        .build();
    let rounds = runtime.run().context("running skirmish")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for round in &rounds {
        for event in &round.events {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
    }

    let survivors: Vec<&str> = runtime
        .engine()
        .state()
        .creatures
        .values()
        .filter(|c| c.is_alive())
        .map(|c| c.name.as_str())
        .collect();
    let summary = serde_json::json!({
        "event": "skirmish_over",
        "rounds": rounds.len(),
        "unresolved": runtime.hostilities_remain(),
        "survivors": survivors,
    });
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;

    tracing::info!(rounds = rounds.len(), survivors = survivors.len(), "skirmish finished");
    Ok(())
}

/// Setup logging to both stderr and a per-session file
fn setup_logging(session_id: &Option<String>) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let session_id = session_id.clone().unwrap_or_else(|| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        format!("session_{}", timestamp)
    });

    let session_log_dir = log_directory().join(&session_id);
    std::fs::create_dir_all(&session_log_dir)
        .with_context(|| format!("creating log directory {}", session_log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "skirmish.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Leak the guard to keep the file writer alive
    std::mem::forget(guard);

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/skirmish.log", session_log_dir.display());

    Ok(())
}

/// Platform cache directory for logs, falling back to the temp dir.
fn log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "skirmish")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("skirmish").join("logs"))
}
