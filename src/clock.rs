use crate::models::{SessionKind, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Focus => "Deep Work",
            Mode::ShortBreak => "Short Rest",
            Mode::LongBreak => "Long Rest",
        }
    }

    pub fn is_focus(self) -> bool {
        self == Mode::Focus
    }

    /// Focus is always followed by a short break, any break by focus.
    pub fn next(self) -> Mode {
        match self {
            Mode::Focus => Mode::ShortBreak,
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        }
    }

    fn session_kind(self) -> SessionKind {
        match self {
            Mode::Focus => SessionKind::Focus,
            Mode::ShortBreak | Mode::LongBreak => SessionKind::ShortBreak,
        }
    }
}

/// Longest accepted mode length, one day.
pub const MAX_MODE_MINS: u32 = 24 * 60;

/// Nominal minutes per mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ModeDurations {
    pub focus_mins: u32,
    pub short_break_mins: u32,
    pub long_break_mins: u32,
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            focus_mins: 25,
            short_break_mins: 5,
            long_break_mins: 15,
        }
    }
}

impl ModeDurations {
    pub fn minutes(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.focus_mins,
            Mode::ShortBreak => self.short_break_mins,
            Mode::LongBreak => self.long_break_mins,
        }
    }

    pub fn seconds(&self, mode: Mode) -> u32 {
        self.minutes(mode).saturating_mul(60)
    }

    /// Every mode lasts between one minute and [`MAX_MODE_MINS`].
    pub fn is_valid(&self) -> bool {
        Mode::ALL
            .iter()
            .all(|m| (1..=MAX_MODE_MINS).contains(&self.minutes(*m)))
    }
}

/// Emitted once per zero-crossing. The owner of the clock applies the
/// task credit and history append in the same mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCompletion {
    pub finished: Mode,
    pub record: SessionRecord,
}

impl PhaseCompletion {
    pub fn minutes(&self) -> u32 {
        self.record.duration_minutes
    }

    pub fn is_focus(&self) -> bool {
        self.finished.is_focus()
    }

    /// The task to credit, only for a finished focus phase.
    pub fn credited_task(&self) -> Option<&str> {
        if self.is_focus() {
            self.record.task_id.as_deref()
        } else {
            None
        }
    }
}

/// Counters handed back when the day is closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayTotals {
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub sessions_completed: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionClock {
    mode: Mode,
    seconds_remaining: u32,
    is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    linked_task_id: Option<String>,
    focus_minutes_today: u32,
    rest_minutes_today: u32,
    total_sessions_completed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase_started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    durations: ModeDurations,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(ModeDurations::default())
    }
}

impl SessionClock {
    pub fn new(durations: ModeDurations) -> Self {
        Self {
            mode: Mode::Focus,
            seconds_remaining: durations.seconds(Mode::Focus),
            is_running: false,
            linked_task_id: None,
            focus_minutes_today: 0,
            rest_minutes_today: 0,
            total_sessions_completed: 0,
            phase_started_at: None,
            durations,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn linked_task_id(&self) -> Option<&str> {
        self.linked_task_id.as_deref()
    }

    pub fn focus_minutes_today(&self) -> u32 {
        self.focus_minutes_today
    }

    pub fn rest_minutes_today(&self) -> u32 {
        self.rest_minutes_today
    }

    pub fn total_sessions_completed(&self) -> u32 {
        self.total_sessions_completed
    }

    pub fn full_seconds(&self) -> u32 {
        self.durations.seconds(self.mode)
    }

    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let full = self.full_seconds();
        if full == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.seconds_remaining) / f64::from(full)
    }

    /// Re-applies the clock invariants to a loaded snapshot under the
    /// configured durations. A snapshot found at zero is stopped and reloaded
    /// without logging a session.
    pub fn restore(&mut self, durations: ModeDurations) {
        self.durations = durations;
        let full = self.full_seconds();
        if self.seconds_remaining > full {
            debug!("clamping {}s remaining to {}s", self.seconds_remaining, full);
            self.seconds_remaining = full;
        }
        if self.seconds_remaining == 0 {
            self.is_running = false;
            self.seconds_remaining = full;
            self.phase_started_at = None;
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<PhaseCompletion> {
        if !self.is_running || self.seconds_remaining == 0 {
            return None;
        }
        self.seconds_remaining -= 1;
        if self.seconds_remaining == 0 {
            Some(self.complete_phase(now))
        } else {
            None
        }
    }

    fn complete_phase(&mut self, now: DateTime<Utc>) -> PhaseCompletion {
        let finished = self.mode;
        let minutes = self.durations.minutes(finished);

        if finished.is_focus() {
            self.focus_minutes_today += minutes;
            self.total_sessions_completed += 1;
        } else {
            self.rest_minutes_today += minutes;
        }

        let started_at = self
            .phase_started_at
            .take()
            .unwrap_or_else(|| now - Duration::minutes(i64::from(minutes)));
        let record = SessionRecord {
            id: format!("s-{}", Uuid::new_v4()),
            task_id: self.linked_task_id.take(),
            started_at,
            duration_minutes: minutes,
            kind: finished.session_kind(),
        };

        let next = finished.next();
        self.mode = next;
        self.is_running = false;
        self.seconds_remaining = self.durations.seconds(next);

        info!("{} finished after {} min, next up {}", finished.label(), minutes, next.label());

        PhaseCompletion { finished, record }
    }

    /// Starts or pauses the countdown. Starting a countdown that sits at zero
    /// does nothing. Returns whether the clock is running afterwards.
    pub fn toggle_running(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running && self.seconds_remaining == 0 {
            debug!("ignoring start at zero");
            return false;
        }
        self.is_running = !self.is_running;
        if self.is_running && self.phase_started_at.is_none() {
            self.phase_started_at = Some(now);
        }
        self.is_running
    }

    pub fn reset(&mut self) {
        self.is_running = false;
        self.seconds_remaining = self.full_seconds();
        self.phase_started_at = None;
    }

    /// Abandons the current countdown; partial phases are never logged.
    pub fn change_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    pub fn select_linked_task(&mut self, task_id: Option<String>) {
        self.linked_task_id = task_id;
    }

    pub fn close_out_day(&mut self) -> DayTotals {
        let totals = DayTotals {
            focus_minutes: self.focus_minutes_today,
            rest_minutes: self.rest_minutes_today,
            sessions_completed: self.total_sessions_completed,
        };
        self.focus_minutes_today = 0;
        self.rest_minutes_today = 0;
        self.total_sessions_completed = 0;
        totals
    }
}
