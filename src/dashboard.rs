use crate::clock::{Mode, ModeDurations, PhaseCompletion, SessionClock};
use crate::error::DeckError;
use crate::models::{
    Category, DailySummary, Database, Frequency, Goal, Horizon, SessionRecord, Task, TaskSnapshot,
};
use crate::storage::Storage;
use crate::tasks::{self, TaskStore};
use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use log::{info, warn};
use uuid::Uuid;

pub const FOCUS_POINTS: u64 = 100;
pub const TASK_POINTS: u64 = 50;
pub const GOAL_POINTS: u64 = 1000;

pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub frequency: Frequency,
    pub estimated_minutes: u32,
}

pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub horizon: Horizon,
    pub category: Category,
    pub target_value: f64,
    pub unit: String,
    pub duration_days: i64,
}

fn short_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}

/// Owns the application state. Every mutation goes through here and is
/// persisted before returning.
pub struct Dashboard {
    pub storage: Storage,
    pub db: Database,
}

impl Dashboard {
    pub fn new(storage: Storage, durations: ModeDurations) -> Result<Self> {
        let db = storage.load(durations)?;
        Ok(Self { storage, db })
    }

    pub fn clock(&self) -> &SessionClock {
        &self.db.clock
    }

    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.db)
    }

    fn award(&mut self, points: u64) {
        self.db.reward_points += points;
        self.db.total_xp += points;
    }

    /// Advances the clock by one second. On a zero-crossing the history,
    /// task credit and reward points are updated before the single save.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<SessionRecord>> {
        if !self.db.clock.is_running() {
            return Ok(None);
        }
        let record = self
            .db
            .clock
            .tick(now)
            .map(|done| self.apply_completion(done, now));
        self.save()?;
        Ok(record)
    }

    fn apply_completion(&mut self, done: PhaseCompletion, now: DateTime<Utc>) -> SessionRecord {
        if let Some(task_id) = done.credited_task() {
            let today = now.with_timezone(&Local).date_naive();
            match self.db.tasks.credit_focus_minutes(task_id, done.minutes(), today) {
                Some(credit) => info!(
                    "task {} now at {} min (completed: {})",
                    task_id, credit.actual_minutes, credit.is_completed
                ),
                None => warn!("linked task {} no longer exists, nothing credited", task_id),
            }
        }
        if done.is_focus() {
            self.award(FOCUS_POINTS);
        }
        self.db.session_history.insert(0, done.record.clone());
        done.record
    }

    pub fn toggle_running(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let running = self.db.clock.toggle_running(now);
        self.save()?;
        Ok(running)
    }

    /// Stops a running clock and saves. A paused clock is left alone.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.db.clock.is_running() {
            self.toggle_running(now)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.db.clock.reset();
        self.save()
    }

    pub fn change_mode(&mut self, mode: Mode) -> Result<()> {
        self.db.clock.change_mode(mode);
        self.save()
    }

    /// Links the running focus phase to a task, or clears the link.
    pub fn select_task(&mut self, task_id: Option<&str>) -> Result<()> {
        if let Some(id) = task_id {
            let task = self
                .db
                .tasks
                .task(id)
                .ok_or_else(|| DeckError::UnknownTask(id.to_string()))?;
            if task.is_completed {
                return Err(DeckError::TaskCompleted(id.to_string()).into());
            }
        }
        self.db.clock.select_linked_task(task_id.map(str::to_string));
        self.save()
    }

    pub fn add_task(&mut self, new: NewTask) -> Result<String> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(DeckError::BlankTitle.into());
        }
        let id = short_id("t");
        let task = Task {
            estimated_minutes: new.estimated_minutes,
            ..Task::new(id.clone(), title, new.category, new.frequency)
        };
        self.db.tasks.insert(0, task);
        self.save()?;
        Ok(id)
    }

    /// Returns whether the task is completed afterwards.
    pub fn toggle_task(&mut self, id: &str, today: NaiveDate) -> Result<bool> {
        let completed = tasks::toggle_task(&mut self.db.tasks, id, today)
            .ok_or_else(|| DeckError::UnknownTask(id.to_string()))?;
        if completed {
            self.award(TASK_POINTS);
        }
        self.save()?;
        Ok(completed)
    }

    pub fn skip_task(&mut self, id: &str) -> Result<bool> {
        let skipped = tasks::skip_task(&mut self.db.tasks, id)
            .ok_or_else(|| DeckError::UnknownTask(id.to_string()))?;
        self.save()?;
        Ok(skipped)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let before = self.db.tasks.len();
        self.db.tasks.retain(|t| t.id != id);
        if self.db.tasks.len() == before {
            return Err(DeckError::UnknownTask(id.to_string()).into());
        }
        if self.db.clock.linked_task_id() == Some(id) {
            self.db.clock.select_linked_task(None);
        }
        self.save()
    }

    pub fn add_goal(&mut self, new: NewGoal, now: DateTime<Utc>) -> Result<String> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(DeckError::BlankTitle.into());
        }
        if new.target_value <= 0.0 {
            return Err(DeckError::InvalidTarget(new.target_value).into());
        }
        let id = short_id("g");
        self.db.goals.push(Goal {
            id: id.clone(),
            title: title.to_string(),
            description: new.description,
            horizon: new.horizon,
            category: new.category,
            target_value: new.target_value,
            current_value: 0.0,
            unit: new.unit,
            is_completed: false,
            target_date: Some(now + Duration::days(new.duration_days)),
        });
        self.save()?;
        Ok(id)
    }

    /// Sets the goal's current value. Returns true when this update finished
    /// the goal for the first time.
    pub fn update_goal_progress(&mut self, id: &str, value: f64) -> Result<bool> {
        let goal = self
            .db
            .goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| DeckError::UnknownGoal(id.to_string()))?;
        let finishing = value >= goal.target_value && !goal.is_completed;
        goal.current_value = value;
        if finishing {
            goal.is_completed = true;
            info!("goal {} reached {} {}", goal.id, value, goal.unit);
            self.award(GOAL_POINTS);
        }
        self.save()?;
        Ok(finishing)
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<()> {
        let before = self.db.goals.len();
        self.db.goals.retain(|g| g.id != id);
        if self.db.goals.len() == before {
            return Err(DeckError::UnknownGoal(id.to_string()).into());
        }
        self.save()
    }

    /// Records a summary of the day, zeroes the clock's day counters and
    /// reopens daily tasks.
    pub fn close_day(&mut self, mood: &str, reflection: &str, today: NaiveDate) -> Result<DailySummary> {
        let totals = self.db.clock.close_out_day();
        let summary = DailySummary {
            date: today,
            mood: mood.to_string(),
            reflection: reflection.to_string(),
            tasks_snapshot: self
                .db
                .tasks
                .iter()
                .map(|t| TaskSnapshot {
                    title: t.title.clone(),
                    is_completed: t.is_completed,
                    is_skipped: t.is_skipped,
                })
                .collect(),
            focus_minutes: totals.focus_minutes,
            rest_minutes: totals.rest_minutes,
            sessions_completed: totals.sessions_completed,
        };
        for task in self.db.tasks.iter_mut().filter(|t| t.frequency == Frequency::Daily) {
            task.is_completed = false;
            task.is_skipped = false;
        }
        self.db.summaries.push(summary.clone());
        self.save()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionKind;
    use chrono::TimeZone;
    use tempfile::{tempdir, TempDir};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn setup(durations: ModeDurations) -> (TempDir, Dashboard) {
        let dir = tempdir().unwrap();
        let storage = Storage::from_path(dir.path().join("db.json")).unwrap();
        let dashboard = Dashboard::new(storage, durations).unwrap();
        (dir, dashboard)
    }

    fn finish_phase(dashboard: &mut Dashboard) -> SessionRecord {
        if !dashboard.clock().is_running() {
            dashboard.toggle_running(now()).unwrap();
        }
        loop {
            if let Some(record) = dashboard.tick(now()).unwrap() {
                return record;
            }
        }
    }

    fn add_task(dashboard: &mut Dashboard, estimate: u32) -> String {
        dashboard
            .add_task(NewTask {
                title: "Ship release".into(),
                category: Category::Business,
                frequency: Frequency::Daily,
                estimated_minutes: estimate,
            })
            .unwrap()
    }

    #[test]
    fn test_focus_phase_end_to_end() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        assert!(dashboard.toggle_running(now()).unwrap());

        let mut records = Vec::new();
        for _ in 0..1500 {
            records.extend(dashboard.tick(now()).unwrap());
        }

        let clock = dashboard.clock();
        assert_eq!(records.len(), 1);
        assert!(!clock.is_running());
        assert_eq!(clock.mode(), Mode::ShortBreak);
        assert_eq!(clock.seconds_remaining(), 300);
        assert_eq!(clock.total_sessions_completed(), 1);
        assert_eq!(clock.focus_minutes_today(), 25);
        assert_eq!(dashboard.db.session_history.len(), 1);
        assert_eq!(dashboard.db.session_history[0].kind, SessionKind::Focus);
        assert_eq!(dashboard.db.session_history[0].duration_minutes, 25);
        assert_eq!(dashboard.db.reward_points, FOCUS_POINTS);
    }

    #[test]
    fn test_linked_task_credited_and_completed() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let id = add_task(&mut dashboard, 25);
        dashboard.select_task(Some(&id)).unwrap();

        finish_phase(&mut dashboard);

        let task = dashboard.db.tasks.task(&id).unwrap();
        assert_eq!(task.actual_minutes_spent, 25);
        assert!(task.is_completed);
        assert_eq!(
            task.last_completed_date,
            Some(now().with_timezone(&Local).date_naive())
        );
        assert!(dashboard.clock().linked_task_id().is_none());
    }

    #[test]
    fn test_pause_persists_stopped_clock() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        dashboard.toggle_running(now()).unwrap();
        for _ in 0..10 {
            dashboard.tick(now()).unwrap();
        }

        dashboard.pause(now()).unwrap();

        let reloaded = dashboard.storage.load(ModeDurations::default()).unwrap();
        assert!(!reloaded.clock.is_running());
        assert_eq!(reloaded.clock.seconds_remaining(), 1490);

        dashboard.pause(now()).unwrap();
        assert!(!dashboard.clock().is_running());
    }

    #[test]
    fn test_rest_phase_does_not_credit() {
        let durations = ModeDurations {
            focus_mins: 1,
            short_break_mins: 1,
            long_break_mins: 1,
        };
        let (_dir, mut dashboard) = setup(durations);
        let id = add_task(&mut dashboard, 25);
        dashboard.change_mode(Mode::ShortBreak).unwrap();
        dashboard.select_task(Some(&id)).unwrap();

        let record = finish_phase(&mut dashboard);

        assert_eq!(record.kind, SessionKind::ShortBreak);
        assert_eq!(dashboard.db.tasks.task(&id).unwrap().actual_minutes_spent, 0);
        assert_eq!(dashboard.db.reward_points, 0);
        assert_eq!(dashboard.clock().rest_minutes_today(), 1);
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let durations = ModeDurations {
            focus_mins: 1,
            short_break_mins: 1,
            long_break_mins: 1,
        };
        let (_dir, mut dashboard) = setup(durations);
        let first = finish_phase(&mut dashboard);
        let second = finish_phase(&mut dashboard);

        assert_eq!(dashboard.db.session_history.len(), 2);
        assert_eq!(dashboard.db.session_history[0].id, second.id);
        assert_eq!(dashboard.db.session_history[1].id, first.id);
    }

    #[test]
    fn test_completion_is_persisted() {
        let durations = ModeDurations {
            focus_mins: 1,
            short_break_mins: 1,
            long_break_mins: 1,
        };
        let (_dir, mut dashboard) = setup(durations);
        finish_phase(&mut dashboard);

        let reloaded = dashboard.storage.load(durations).unwrap();
        assert_eq!(reloaded.session_history.len(), 1);
        assert_eq!(reloaded.clock.mode(), Mode::ShortBreak);
        assert_eq!(reloaded.reward_points, FOCUS_POINTS);
    }

    #[test]
    fn test_reset_keeps_history() {
        let durations = ModeDurations {
            focus_mins: 1,
            short_break_mins: 1,
            long_break_mins: 1,
        };
        let (_dir, mut dashboard) = setup(durations);
        finish_phase(&mut dashboard);
        dashboard.toggle_running(now()).unwrap();
        dashboard.tick(now()).unwrap();

        dashboard.reset().unwrap();

        assert_eq!(dashboard.db.session_history.len(), 1);
        assert_eq!(dashboard.clock().focus_minutes_today(), 1);
        assert_eq!(dashboard.clock().seconds_remaining(), 60);
    }

    #[test]
    fn test_select_task_validation() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let err = dashboard.select_task(Some("missing")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DeckError>(),
            Some(&DeckError::UnknownTask("missing".into()))
        );

        let id = add_task(&mut dashboard, 25);
        dashboard.toggle_task(&id, now().date_naive()).unwrap();
        let err = dashboard.select_task(Some(&id)).unwrap_err();
        assert_eq!(err.downcast_ref::<DeckError>(), Some(&DeckError::TaskCompleted(id)));

        dashboard.select_task(None).unwrap();
        assert!(dashboard.clock().linked_task_id().is_none());
    }

    #[test]
    fn test_add_task_rejects_blank_title() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let err = dashboard
            .add_task(NewTask {
                title: "   ".into(),
                category: Category::Learning,
                frequency: Frequency::Daily,
                estimated_minutes: 25,
            })
            .unwrap_err();
        assert_eq!(err.downcast_ref::<DeckError>(), Some(&DeckError::BlankTitle));
    }

    #[test]
    fn test_toggle_task_awards_points_once() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let id = add_task(&mut dashboard, 25);
        let today = now().date_naive();

        assert!(dashboard.toggle_task(&id, today).unwrap());
        assert!(!dashboard.toggle_task(&id, today).unwrap());

        assert_eq!(dashboard.db.reward_points, TASK_POINTS);
        assert_eq!(dashboard.db.total_xp, TASK_POINTS);
    }

    #[test]
    fn test_delete_linked_task_clears_link() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let id = add_task(&mut dashboard, 25);
        dashboard.select_task(Some(&id)).unwrap();

        dashboard.delete_task(&id).unwrap();

        assert!(dashboard.clock().linked_task_id().is_none());
        assert!(dashboard.delete_task(&id).is_err());
    }

    #[test]
    fn test_goal_completion_awards_once() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let id = dashboard
            .add_goal(
                NewGoal {
                    title: "Read 12 books".into(),
                    description: String::new(),
                    horizon: Horizon::Monthly,
                    category: Category::Learning,
                    target_value: 12.0,
                    unit: "Books".into(),
                    duration_days: 30,
                },
                now(),
            )
            .unwrap();

        assert!(!dashboard.update_goal_progress(&id, 6.0).unwrap());
        assert!(dashboard.update_goal_progress(&id, 12.0).unwrap());
        assert!(!dashboard.update_goal_progress(&id, 13.0).unwrap());

        let goal = dashboard.db.goals.iter().find(|g| g.id == id).unwrap();
        assert!(goal.is_completed);
        assert_eq!(goal.target_date, Some(now() + Duration::days(30)));
        assert_eq!(dashboard.db.reward_points, GOAL_POINTS);
    }

    #[test]
    fn test_add_goal_rejects_non_positive_target() {
        let (_dir, mut dashboard) = setup(ModeDurations::default());
        let err = dashboard
            .add_goal(
                NewGoal {
                    title: "Nothing".into(),
                    description: String::new(),
                    horizon: Horizon::Weekly,
                    category: Category::Fitness,
                    target_value: 0.0,
                    unit: String::new(),
                    duration_days: 7,
                },
                now(),
            )
            .unwrap_err();
        assert_eq!(err.downcast_ref::<DeckError>(), Some(&DeckError::InvalidTarget(0.0)));
    }

    #[test]
    fn test_close_day() {
        let durations = ModeDurations {
            focus_mins: 1,
            short_break_mins: 1,
            long_break_mins: 1,
        };
        let (_dir, mut dashboard) = setup(durations);
        let id = add_task(&mut dashboard, 25);
        dashboard.toggle_task(&id, now().date_naive()).unwrap();
        finish_phase(&mut dashboard);

        let summary = dashboard
            .close_day("steady", "good focus", now().date_naive())
            .unwrap();

        assert_eq!(summary.focus_minutes, 1);
        assert_eq!(summary.sessions_completed, 1);
        assert!(summary.tasks_snapshot.iter().any(|t| t.is_completed));
        assert_eq!(dashboard.db.summaries.len(), 1);
        assert_eq!(dashboard.clock().focus_minutes_today(), 0);
        assert!(!dashboard.db.tasks.task(&id).unwrap().is_completed);
        assert_eq!(dashboard.db.session_history.len(), 1);
    }
}
