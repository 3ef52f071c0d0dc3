use crate::clock::SessionClock;
use crate::models::{Database, SessionKind};
use crate::stats::{calculate_stats, focus_rest_ratio, Rank};
use crate::utils::{format_clock, format_duration};
use chrono::{Local, Timelike};

const RECENT_SESSIONS: usize = 5;

fn minutes(mins: u32) -> String {
    format_duration(i64::from(mins) * 60)
}

pub fn clock_line(clock: &SessionClock) -> String {
    let state = if clock.is_running() { "running" } else { "paused" };
    let mut line = format!(
        "{} {} ({})",
        clock.mode().label(),
        format_clock(clock.seconds_remaining()),
        state
    );
    if let Some(task_id) = clock.linked_task_id() {
        line.push_str(&format!(" on {}", task_id));
    }
    line
}

pub struct Reporter<'a> {
    db: &'a Database,
}

impl<'a> Reporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn status(&self) {
        let clock = &self.db.clock;
        println!("{}", clock_line(clock));
        println!(
            "Today: {} focus, {} rest, {} sessions",
            minutes(clock.focus_minutes_today()),
            minutes(clock.rest_minutes_today()),
            clock.total_sessions_completed()
        );
        println!(
            "Points: {} | XP: {} ({})",
            self.db.reward_points,
            self.db.total_xp,
            Rank::from_xp(self.db.total_xp)
        );
    }

    pub fn report(&self) {
        let db = self.db;
        if db.session_history.is_empty() && db.summaries.is_empty() {
            println!("No sessions recorded yet.");
            return;
        }

        let stats = calculate_stats(db, Local::now());
        let clock = &db.clock;

        println!("Focusdeck Report");
        println!("================");

        println!("\nToday ({})", stats.today);
        println!("  Deep Work:         {}", minutes(clock.focus_minutes_today()));
        println!("  Rest:              {}", minutes(clock.rest_minutes_today()));
        println!("  Sessions:          {}", clock.total_sessions_completed());
        println!(
            "  Focus/Rest Ratio:  {:.1}x",
            focus_rest_ratio(clock.focus_minutes_today(), clock.rest_minutes_today())
        );
        println!("  Discipline Score:  {}%", stats.discipline_score);

        println!("\nWeek (Starting Monday {})", stats.week_start);
        println!("-------------------------------------------");
        let week = &stats.week_summary;
        println!("  Focus Sessions:    {}", week.focus_count);
        println!("  Focus Time:        {}", minutes(week.focus_minutes));
        println!("  Rest Sessions:     {}", week.rest_count);
        println!("  Rest Time:         {}", minutes(week.rest_minutes));
        println!("  Linked to Tasks:   {}", week.linked_focus_count);

        if !stats.by_category.is_empty() {
            println!("\nFocus by Category");
            for (category, mins) in &stats.by_category {
                println!("  {:<18} {}", format!("{}:", category), minutes(*mins));
            }
        }

        if let Some((hour, count)) = stats
            .by_hour
            .iter()
            .enumerate()
            .max_by_key(|(_, count)| **count)
            .filter(|(_, count)| **count > 0)
        {
            println!("\nPeak Hour:           {:02}:00 ({} sessions)", hour, count);
        }
        if stats.planning_accuracy > 0 {
            println!("Planning Accuracy:   {}%", stats.planning_accuracy);
        }

        println!("\nRecent Sessions");
        for record in db.session_history.iter().take(RECENT_SESSIONS) {
            let kind = match record.kind {
                SessionKind::Focus => "Focus",
                SessionKind::ShortBreak => "Rest",
            };
            let started = record.started_at.with_timezone(&Local);
            println!(
                "  {} {:02}:{:02}  {:<6} {:>3} min{}",
                started.date_naive(),
                started.hour(),
                started.minute(),
                kind,
                record.duration_minutes,
                record
                    .task_id
                    .as_deref()
                    .map(|id| format!("  [{}]", id))
                    .unwrap_or_default()
            );
        }

        if let Some(last) = db.summaries.last() {
            println!("\nLast Closed Day ({})", last.date);
            println!("  Mood:              {}", last.mood);
            println!("  Focus:             {}", minutes(last.focus_minutes));
            let done = last.tasks_snapshot.iter().filter(|t| t.is_completed).count();
            println!("  Tasks Completed:   {}/{}", done, last.tasks_snapshot.len());
        }
    }

    pub fn tasks(&self) {
        if self.db.tasks.is_empty() {
            println!("No tasks.");
            return;
        }
        let linked = self.db.clock.linked_task_id();
        for task in &self.db.tasks {
            let marker = if task.is_completed {
                "x"
            } else if task.is_skipped {
                "-"
            } else {
                " "
            };
            let link = if Some(task.id.as_str()) == linked { " *" } else { "" };
            println!(
                "[{}] {:<12} {:<32} {:>3}/{:<3} min  {:<12} streak {}{}",
                marker,
                task.id,
                task.title,
                task.actual_minutes_spent,
                task.estimated_minutes,
                task.category,
                task.streak_count,
                link
            );
        }
    }

    pub fn goals(&self) {
        if self.db.goals.is_empty() {
            println!("No goals.");
            return;
        }
        for goal in &self.db.goals {
            let due = goal
                .target_date
                .map(|d| format!("  due {}", d.with_timezone(&Local).date_naive()))
                .unwrap_or_default();
            println!(
                "[{}] {:<12} {:<32} {}/{} {} ({:.0}%){}",
                if goal.is_completed { "x" } else { " " },
                goal.id,
                goal.title,
                goal.current_value,
                goal.target_value,
                goal.unit,
                goal.progress_percent(),
                due
            );
        }
    }
}
