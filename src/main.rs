//! dwm-tui: terminal console for BlackPearl web applications.

mod app;
mod config;
mod error;
mod logging;
mod model;
mod services;
mod theme;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use clap::Parser;
use config::ConsoleConfig;
use services::endpoints::Layout;
use std::path::PathBuf;

/// Browse deployed applications, inspect module signatures, invoke
/// modules and run their test sets.
#[derive(Parser, Debug)]
#[command(name = "dwm-tui")]
#[command(about = "Terminal console for BlackPearl web applications", long_about = None)]
struct Args {
    /// Server base URL, e.g. http://127.0.0.1:8080
    #[arg(long)]
    server: Option<String>,

    /// Path of the console application on the server
    #[arg(long)]
    console_path: Option<String>,

    /// Talk to servers that only expose the old /dwm/* endpoints
    #[arg(long)]
    legacy: bool,

    /// Explicit config file instead of the discovered dwm-tui.yaml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drive the console off-screen and print a JSON summary
    #[arg(long)]
    headless: bool,

    /// Ticks (200ms each) to run in headless mode
    #[arg(long, default_value_t = 10)]
    ticks: u64,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = logging::init() {
        eprintln!("file logging disabled: {e:#}");
    }

    let mut cfg = match &args.config {
        Some(path) => ConsoleConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConsoleConfig::load().context("loading dwm-tui.yaml")?,
    };
    if let Some(server) = args.server {
        cfg.server = server;
    }
    if let Some(console_path) = args.console_path {
        cfg.console_path = console_path;
    }
    if args.legacy {
        cfg.layout = Layout::Legacy;
    }

    let opts = ui::RunOptions {
        headless: args.headless || env_flag("DWM_TUI_HEADLESS"),
        ticks: args.ticks,
    };
    ui::run(cfg, opts)
}
