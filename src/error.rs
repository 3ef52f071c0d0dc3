use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeckError {
    #[error("No task with id {0}")]
    UnknownTask(String),
    #[error("Task {0} is already completed")]
    TaskCompleted(String),
    #[error("No goal with id {0}")]
    UnknownGoal(String),
    #[error("Title must not be blank")]
    BlankTitle,
    #[error("Goal target must be greater than zero, got {0}")]
    InvalidTarget(f64),
    #[error("Mode durations must be between 1 and 1440 minutes")]
    InvalidDuration,
}
