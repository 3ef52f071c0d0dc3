use crate::models::Task;
use chrono::NaiveDate;
use log::debug;

/// Result of crediting focus time to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub actual_minutes: u32,
    pub is_completed: bool,
}

pub trait TaskStore {
    fn task(&self, id: &str) -> Option<&Task>;

    /// Adds `minutes` to the task's spent time and re-evaluates completion
    /// against its estimate. A task finished by the credit is stamped with
    /// `today`. `None` when the task no longer exists.
    fn credit_focus_minutes(&mut self, id: &str, minutes: u32, today: NaiveDate) -> Option<Credit>;
}

impl TaskStore for Vec<Task> {
    fn task(&self, id: &str) -> Option<&Task> {
        self.iter().find(|t| t.id == id)
    }

    fn credit_focus_minutes(&mut self, id: &str, minutes: u32, today: NaiveDate) -> Option<Credit> {
        let task = self.iter_mut().find(|t| t.id == id)?;
        let was_completed = task.is_completed;
        task.actual_minutes_spent += minutes;
        task.is_completed = task.actual_minutes_spent >= task.estimated_minutes;
        task.streak_count += 1;
        if task.is_completed && !was_completed {
            task.last_completed_date = Some(today);
        }
        debug!(
            "credited {} min to {} ({}/{})",
            minutes, task.id, task.actual_minutes_spent, task.estimated_minutes
        );
        Some(Credit {
            actual_minutes: task.actual_minutes_spent,
            is_completed: task.is_completed,
        })
    }
}

/// Flips completion. Returns `Some(true)` when the task became completed.
pub fn toggle_task(tasks: &mut [Task], id: &str, today: NaiveDate) -> Option<bool> {
    let task = tasks.iter_mut().find(|t| t.id == id)?;
    if task.is_completed {
        task.is_completed = false;
        task.streak_count = task.streak_count.saturating_sub(1);
        Some(false)
    } else {
        task.is_completed = true;
        task.is_skipped = false;
        task.streak_count += 1;
        task.last_completed_date = Some(today);
        Some(true)
    }
}

pub fn skip_task(tasks: &mut [Task], id: &str) -> Option<bool> {
    let task = tasks.iter_mut().find(|t| t.id == id)?;
    task.is_skipped = !task.is_skipped;
    Some(task.is_skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Frequency};

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("t1", "Write", Category::Business, Frequency::Daily),
            Task {
                estimated_minutes: 50,
                ..Task::new("t2", "Study", Category::Learning, Frequency::Daily)
            },
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_credit_reaches_estimate() {
        let mut tasks = tasks();
        let credit = tasks.credit_focus_minutes("t1", 25, today()).unwrap();
        assert_eq!(
            credit,
            Credit {
                actual_minutes: 25,
                is_completed: true
            }
        );
        assert_eq!(tasks[0].streak_count, 1);
        assert_eq!(tasks[0].last_completed_date, Some(today()));
    }

    #[test]
    fn test_credit_below_estimate() {
        let mut tasks = tasks();
        let first = tasks.credit_focus_minutes("t2", 25, today()).unwrap();
        assert!(!first.is_completed);
        assert_eq!(tasks[1].last_completed_date, None);

        let tomorrow = today().succ_opt().unwrap();
        let second = tasks.credit_focus_minutes("t2", 25, tomorrow).unwrap();
        assert_eq!(second.actual_minutes, 50);
        assert!(second.is_completed);
        assert_eq!(tasks[1].last_completed_date, Some(tomorrow));
    }

    #[test]
    fn test_credit_unknown_task() {
        let mut tasks = tasks();
        assert!(tasks.credit_focus_minutes("missing", 25, today()).is_none());
        assert!(tasks.task("missing").is_none());
    }

    #[test]
    fn test_toggle_task() {
        let mut tasks = tasks();
        tasks[0].is_skipped = true;

        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(true));
        assert!(tasks[0].is_completed);
        assert!(!tasks[0].is_skipped);
        assert_eq!(tasks[0].streak_count, 1);
        assert_eq!(tasks[0].last_completed_date, Some(today()));

        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(false));
        assert_eq!(tasks[0].streak_count, 0);
        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(true));
        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(false));
        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(true));
        tasks[0].streak_count = 0;
        assert_eq!(toggle_task(&mut tasks, "t1", today()), Some(false));
        assert_eq!(tasks[0].streak_count, 0);
    }

    #[test]
    fn test_skip_task() {
        let mut tasks = tasks();
        assert_eq!(skip_task(&mut tasks, "t2"), Some(true));
        assert_eq!(skip_task(&mut tasks, "t2"), Some(false));
        assert_eq!(skip_task(&mut tasks, "nope"), None);
    }
}
