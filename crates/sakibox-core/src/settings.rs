use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ToolboxError};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Terminal toolbox for inspecting and managing OS processes and ports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sakibox",
    about = "Terminal toolbox for inspecting and managing OS processes and ports",
    version
)]
pub struct Settings {
    /// Poll window of the live process monitor in milliseconds (100-10000)
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(100..=10_000))]
    pub refresh_ms: u64,

    /// Keyboard poll granularity in milliseconds (5-1000)
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u64).range(5..=1_000))]
    pub poll_tick_ms: u64,

    /// Processes per page in the paged list
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..=500))]
    pub page_size: u64,

    /// Rows shown by the top-processes view
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=100))]
    pub top_count: u64,

    /// Start directly in the live process monitor
    #[arg(long)]
    pub live: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (defaults to ~/.sakibox/logs/sakibox.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sakibox/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_tick_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_count: Option<u64>,
}

impl LastUsedParams {
    /// Default path of the persisted file, `~/.sakibox/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".sakibox").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(params) => params,
            Err(ToolboxError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "ignoring unreadable last-used file");
                Self::default()
            }
        }
    }

    /// Read and parse the file at `path`.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse `args`, merge persisted params for values not given on the
    /// command line, and persist the result to `config_path`.
    ///
    /// Warnings about the persisted file are emitted through `tracing`, so
    /// the subscriber should already be installed.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear last-used file");
            }
            return Self::resolve_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // clap ids are field names (underscores), not flag spellings.
        if !is_arg_explicitly_set(&matches, "refresh_ms") {
            if let Some(v) = last.refresh_ms {
                settings.refresh_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "poll_tick_ms") {
            if let Some(v) = last.poll_tick_ms {
                settings.poll_tick_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "page_size") {
            if let Some(v) = last.page_size {
                settings.page_size = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top_count") {
            if let Some(v) = last.top_count {
                settings.top_count = v;
            }
        }

        settings = Self::resolve_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used params");
        }

        settings
    }

    /// Normalise interdependent values and apply the `--debug` flag.
    fn resolve_values(mut settings: Settings) -> Settings {
        // Persisted values bypass clap's range checks.
        settings.refresh_ms = settings.refresh_ms.clamp(100, 10_000);
        settings.page_size = settings.page_size.max(1);
        settings.top_count = settings.top_count.max(1);
        settings.poll_tick_ms = settings.poll_tick_ms.clamp(5, settings.refresh_ms);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Log level after `--debug` is applied. Usable straight after parsing,
    /// before any persisted state is read.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Poll window of the live monitor.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Keyboard poll granularity of the live monitor.
    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            refresh_ms: Some(s.refresh_ms),
            poll_tick_ms: Some(s.poll_tick_ms),
            page_size: Some(s.page_size),
            top_count: Some(s.top_count),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Home directory, or the working directory when it cannot be resolved.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
