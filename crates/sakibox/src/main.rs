mod bootstrap;
mod menu;

use std::ffi::OsString;
use std::io;

use anyhow::Result;
use clap::Parser;
use sakibox_core::settings::{LastUsedParams, Settings};
use sakibox_data::port::LsofPortSource;
use sakibox_data::process::PsSnapshotProvider;
use sakibox_ui::raw_mode::{CrosstermModeBackend, RawModeController};

use crate::menu::Menu;

fn main() -> Result<()> {
    let args: Vec<OsString> = std::env::args_os().collect();

    // Logging comes first so warnings about the persisted params are kept.
    let cli = Settings::parse_from(args.clone());
    let app_dir = bootstrap::ensure_directories()?;
    bootstrap::setup_logging(cli.effective_log_level(), cli.log_file.as_deref(), &app_dir)?;

    let settings = Settings::load_with_last_used_impl(args, &LastUsedParams::config_path());

    tracing::info!("sakibox v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        refresh_ms = settings.refresh_ms,
        poll_tick_ms = settings.poll_tick_ms,
        page_size = settings.page_size,
        top_count = settings.top_count,
        "settings resolved"
    );

    let snapshots = PsSnapshotProvider;
    let ports = LsofPortSource;
    let mut raw = RawModeController::new(CrosstermModeBackend);
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut menu = Menu::new(&settings, &snapshots, &ports, &mut raw, &mut reader, &mut out);
    if settings.live {
        menu.live_monitor()?;
    } else {
        menu.run()?;
    }

    tracing::info!("sakibox exiting");
    Ok(())
}
