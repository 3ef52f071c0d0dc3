use crate::dashboard::Dashboard;
use crate::report::clock_line;
use crate::utils::format_clock;
use anyhow::Result;
use chrono::Utc;
use log::info;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);
const POLL: Duration = Duration::from_millis(200);

/// Runs the current phase to completion without the dashboard. Ctrl-C
/// pauses the clock and saves before returning.
pub fn run_headless(dashboard: &mut Dashboard) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    if !dashboard.clock().is_running() {
        dashboard.toggle_running(Utc::now())?;
    }
    println!("{}", clock_line(dashboard.clock()));

    let mut next_tick = Instant::now() + TICK;
    while dashboard.clock().is_running() {
        if interrupted.load(Ordering::SeqCst) {
            dashboard.pause(Utc::now())?;
            println!("\nPaused at {}.", format_clock(dashboard.clock().seconds_remaining()));
            info!("headless run interrupted");
            return Ok(());
        }

        let now = Instant::now();
        if now < next_tick {
            thread::sleep(POLL.min(next_tick - now));
            continue;
        }
        next_tick += TICK;

        if let Some(record) = dashboard.tick(Utc::now())? {
            println!(
                "\n{} min {:?} phase logged. Next: {}",
                record.duration_minutes,
                record.kind,
                dashboard.clock().mode().label()
            );
            return Ok(());
        }
        print!("\r{}  ", format_clock(dashboard.clock().seconds_remaining()));
        io::stdout().flush()?;
    }
    Ok(())
}
