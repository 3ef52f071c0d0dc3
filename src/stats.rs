use crate::models::{Database, SessionKind, SessionRecord, Task};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Timelike};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct SummaryStats {
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub focus_count: u32,
    pub rest_count: u32,
    pub linked_focus_count: u32,
}

pub struct Stats {
    pub today_summary: SummaryStats,
    pub week_summary: SummaryStats,
    pub by_hour: [u32; 24],
    pub by_category: BTreeMap<String, u32>,
    pub discipline_score: u32,
    pub planning_accuracy: u32,
    pub today: NaiveDate,
    pub week_start: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Novice,
    Operator,
    Strategist,
    Elite,
    Sovereign,
}

impl Rank {
    pub fn from_xp(xp: u64) -> Self {
        match xp {
            0..=999 => Rank::Novice,
            1000..=4999 => Rank::Operator,
            5000..=14999 => Rank::Strategist,
            15000..=39999 => Rank::Elite,
            _ => Rank::Sovereign,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::Novice => "Novice",
            Rank::Operator => "Operator",
            Rank::Strategist => "Strategist",
            Rank::Elite => "Elite",
            Rank::Sovereign => "Sovereign",
        };
        f.pad(name)
    }
}

pub fn calculate_summary<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> SummaryStats {
    let mut summary = SummaryStats::default();

    for record in records {
        match record.kind {
            SessionKind::Focus => {
                summary.focus_minutes += record.duration_minutes;
                summary.focus_count += 1;
                if record.task_id.is_some() {
                    summary.linked_focus_count += 1;
                }
            }
            SessionKind::ShortBreak => {
                summary.rest_minutes += record.duration_minutes;
                summary.rest_count += 1;
            }
        }
    }

    summary
}

/// Percentage of tasks completed; an empty list scores zero.
pub fn discipline_score(tasks: &[Task]) -> u32 {
    let completed = tasks.iter().filter(|t| t.is_completed).count();
    let total = tasks.len().max(1);
    (completed as f64 / total as f64 * 100.0).round() as u32
}

pub fn focus_rest_ratio(focus_minutes: u32, rest_minutes: u32) -> f64 {
    if focus_minutes == 0 {
        return 0.0;
    }
    f64::from(focus_minutes) / f64::from(rest_minutes.max(1))
}

/// Sessions started in each local hour of the day.
pub fn sessions_by_hour(history: &[SessionRecord]) -> [u32; 24] {
    let mut buckets = [0; 24];
    for record in history {
        let hour = record.started_at.with_timezone(&Local).hour() as usize;
        buckets[hour] += 1;
    }
    buckets
}

/// Focus minutes per task category. Unlinked or deleted tasks count as
/// "Deep Work".
pub fn focus_minutes_by_category(history: &[SessionRecord], tasks: &[Task]) -> BTreeMap<String, u32> {
    let mut distribution = BTreeMap::new();
    for record in history.iter().filter(|r| r.kind == SessionKind::Focus) {
        let category = record
            .task_id
            .as_deref()
            .and_then(|id| tasks.iter().find(|t| t.id == id))
            .map(|t| t.category.to_string())
            .unwrap_or_else(|| "Deep Work".to_string());
        *distribution.entry(category).or_insert(0) += record.duration_minutes;
    }
    distribution
}

/// Estimated over actual minutes for completed tasks, as a percentage.
pub fn planning_accuracy(tasks: &[Task]) -> u32 {
    let completed: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.is_completed && t.estimated_minutes > 0)
        .collect();
    if completed.is_empty() {
        return 0;
    }
    let estimated: u32 = completed.iter().map(|t| t.estimated_minutes).sum();
    let actual: u32 = completed.iter().map(|t| t.actual_minutes_spent).sum();
    (f64::from(estimated) / f64::from(actual.max(1)) * 100.0).round() as u32
}

pub fn calculate_stats(db: &Database, now_local: DateTime<Local>) -> Stats {
    let today = now_local.date_naive();

    // Find the start of the current week (Monday)
    let days_from_monday = now_local.weekday().num_days_from_monday();
    let week_start = today - Duration::days(days_from_monday as i64);
    let week_end = week_start + Duration::days(6);

    let local_date = |r: &SessionRecord| r.started_at.with_timezone(&Local).date_naive();
    let today_records = db.session_history.iter().filter(|r| local_date(*r) == today);
    let week_records = db.session_history.iter().filter(|r| {
        let date = local_date(*r);
        date >= week_start && date <= week_end
    });

    Stats {
        today_summary: calculate_summary(today_records),
        week_summary: calculate_summary(week_records),
        by_hour: sessions_by_hour(&db.session_history),
        by_category: focus_minutes_by_category(&db.session_history, &db.tasks),
        discipline_score: discipline_score(&db.tasks),
        planning_accuracy: planning_accuracy(&db.tasks),
        today,
        week_start,
    }
}
