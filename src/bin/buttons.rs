//! Front panel self test: flashes the LEDs, then mirrors debounced button
//! presses onto them.

use anyhow::{Context, Result};
use clap::Parser;
use posefx::config::DEFAULT_DEBOUNCE_INTERVAL;
use posefx::input::{self, SysfsBoard};
use posefx::{Board, DebouncedButtons};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of polling cycles to run
    #[arg(long, default_value_t = 1000)]
    cycles: u32,

    /// Delay between polls in milliseconds
    #[arg(long, default_value_t = 10)]
    poll_ms: u64,

    /// Debounce interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_INTERVAL.as_millis() as u64)]
    debounce_ms: u64,

    /// LED flash sweeps before polling
    #[arg(long, default_value_t = 3)]
    wiggles: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut board = SysfsBoard::dev_board()
        .context("Unable to access GPIO pins. Did you run with sudo?")?;

    input::wiggle_lines(&mut board, args.wiggles, Duration::from_millis(50))?;

    let mut buttons = DebouncedButtons::new(
        board.line_count(),
        Duration::from_millis(args.debounce_ms),
        Instant::now(),
    );
    let period = Duration::from_millis(args.poll_ms);

    for _ in 0..args.cycles {
        let states = input::poll_and_mirror(&mut board, &mut buttons, Instant::now())?;
        let pressed: Vec<String> = states
            .iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(i, _)| i.to_string())
            .collect();
        if !pressed.is_empty() {
            tracing::info!("Buttons: {}", pressed.join(" "));
        }
        std::thread::sleep(period);
    }

    input::set_only_line(&mut board, None)?;
    Ok(())
}
