use crate::clock::SessionClock;
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Category {
    Business,
    Fitness,
    Learning,
    Spirituality,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Business => "Business",
            Category::Fitness => "Fitness",
            Category::Learning => "Learning",
            Category::Spirituality => "Spirituality",
        };
        f.pad(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Frequency {
    Daily,
    Weekly,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Horizon {
    Weekly,
    Monthly,
    SixMonth,
}

/// Kind of a logged phase. Long breaks are logged as `ShortBreak`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Focus,
    ShortBreak,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub kind: SessionKind,
}

pub const DEFAULT_ESTIMATE_MINS: u32 = 25;

fn default_estimate() -> u32 {
    DEFAULT_ESTIMATE_MINS
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub frequency: Frequency,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_skipped: bool,
    #[serde(default)]
    pub streak_count: u32,
    #[serde(default = "default_estimate")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub actual_minutes_spent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: Category, frequency: Frequency) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            frequency,
            is_completed: false,
            is_skipped: false,
            streak_count: 0,
            estimated_minutes: DEFAULT_ESTIMATE_MINS,
            actual_minutes_spent: 0,
            linked_goal_id: None,
            last_completed_date: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub horizon: Horizon,
    pub category: Category,
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn progress_percent(&self) -> f64 {
        if self.target_value <= 0.0 {
            return 0.0;
        }
        (self.current_value / self.target_value * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub title: String,
    pub is_completed: bool,
    pub is_skipped: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub tasks_snapshot: Vec<TaskSnapshot>,
    #[serde(default)]
    pub focus_minutes: u32,
    #[serde(default)]
    pub rest_minutes: u32,
    #[serde(default)]
    pub sessions_completed: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub clock: SessionClock,
    /// Most recent first.
    pub session_history: Vec<SessionRecord>,
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub summaries: Vec<DailySummary>,
    pub reward_points: u64,
    pub total_xp: u64,
}

impl Database {
    /// Fresh install: starter tasks and goals.
    pub fn seeded() -> Self {
        let tasks = vec![
            Task::new("t1", "Wake up at 5:30 AM", Category::Spirituality, Frequency::Daily),
            Task {
                linked_goal_id: Some("m3".into()),
                ..Task::new("t2", "Morning prayer", Category::Spirituality, Frequency::Daily)
            },
            Task::new("t3", "Cold shower", Category::Fitness, Frequency::Daily),
            Task {
                linked_goal_id: Some("m2".into()),
                ..Task::new("t4", "Workout", Category::Fitness, Frequency::Weekly)
            },
            Task::new("t5", "Learn sales skills", Category::Learning, Frequency::Daily),
            Task::new("t6", "Work 3 to 4 hours", Category::Business, Frequency::Daily),
        ];

        let goal = |id: &str, title: &str, horizon, category, target: f64, unit: &str| Goal {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            horizon,
            category,
            target_value: target,
            current_value: 0.0,
            unit: unit.into(),
            is_completed: false,
            target_date: None,
        };
        let goals = vec![
            goal("g1", "Earn first $1,000 online", Horizon::SixMonth, Category::Business, 1000.0, "$"),
            goal("g2", "Master sales and marketing", Horizon::SixMonth, Category::Learning, 100.0, "%"),
            goal("m2", "16 gym workouts", Horizon::Monthly, Category::Fitness, 16.0, "Workouts"),
            goal("m3", "Prayer on time streak", Horizon::Monthly, Category::Spirituality, 30.0, "Days"),
        ];

        Self {
            tasks,
            goals,
            ..Self::default()
        }
    }
}
