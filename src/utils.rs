use crate::clock::MAX_MODE_MINS;
use anyhow::{bail, Result};

pub fn format_duration(seconds: i64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    if secs > 0 || (days == 0 && hours == 0 && mins == 0) {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

/// Countdown face, `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parses a mode length such as `25m`, `1h` or a bare `25` (minutes).
/// Accepts one minute up to one day.
pub fn parse_minutes(input: &str) -> Result<u32> {
    let input = input.trim();
    let mins = match input.parse::<u64>() {
        Ok(mins) => mins,
        Err(_) => {
            let duration = humantime::parse_duration(input)?;
            let secs = duration.as_secs();
            if secs % 60 != 0 || duration.subsec_nanos() != 0 {
                bail!("Duration must be a whole number of minutes, got {}", input);
            }
            secs / 60
        }
    };
    if mins == 0 {
        bail!("Duration must be at least one minute");
    }
    if mins > u64::from(MAX_MODE_MINS) {
        bail!("Duration must be at most {} minutes, got {}", MAX_MODE_MINS, input);
    }
    Ok(u32::try_from(mins)?)
}
