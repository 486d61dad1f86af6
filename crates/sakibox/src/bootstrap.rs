use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.sakibox/` and `~/.sakibox/logs/` exist and return the former.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let app_dir = sakibox_core::settings::home_dir().join(".sakibox");
    std::fs::create_dir_all(app_dir.join("logs"))?;
    Ok(app_dir)
}

/// Log file used when `--log-file` is not given.
pub fn default_log_file(app_dir: &Path) -> PathBuf {
    app_dir.join("logs").join("sakibox.log")
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "warn",
    }
}

/// Subscriber writing plain-text events at `log_level` to `writer`.
pub fn build_subscriber(
    log_level: &str,
    writer: BoxMakeWriter,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry().with(filter).with(layer)
}

/// Initialise the global `tracing` subscriber.
///
/// The live monitor owns the whole screen, so events go to `log_file` (or
/// the default file under `app_dir`). Stderr is used only when the file
/// cannot be opened.
pub fn setup_logging(
    log_level: &str,
    log_file: Option<&Path>,
    app_dir: &Path,
) -> anyhow::Result<()> {
    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_log_file(app_dir));
    let writer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging to stderr", path.display());
            BoxMakeWriter::new(std::io::stderr)
        }
    };

    tracing::subscriber::set_global_default(build_subscriber(log_level, writer))?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
