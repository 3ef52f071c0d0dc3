mod clock;
mod config;
mod dashboard;
mod error;
mod models;
mod report;
mod runner;
mod stats;
mod storage;
mod tasks;
mod tui;
mod utils;

use anyhow::Result;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use clock::Mode;
use config::Config;
use dashboard::{Dashboard, NewGoal, NewTask, GOAL_POINTS, TASK_POINTS};
use fd_lock::RwLock;
use log::LevelFilter;
use models::{Category, Frequency, Horizon, DEFAULT_ESTIMATE_MINS};
use report::Reporter;
use std::fs::OpenOptions;
use storage::Storage;
use utils::parse_minutes;

#[derive(Parser)]
#[command(name = "focusdeck")]
#[command(about = "A terminal pomodoro clock with tasks, goals and daily summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DurationArgs {
    /// Focus length (e.g. 25m, 1h)
    #[arg(long)]
    focus: Option<String>,
    /// Short break length
    #[arg(long)]
    short_break: Option<String>,
    /// Long break length
    #[arg(long)]
    long_break: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard
    Start {
        #[command(flatten)]
        durations: DurationArgs,
    },
    /// Run the current phase to completion in the terminal
    Run {
        /// Switch to this mode before starting
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,
        /// Credit the focus phase to this task
        #[arg(short, long)]
        task: Option<String>,
        #[command(flatten)]
        durations: DurationArgs,
    },
    /// Show the clock and today's totals
    Status,
    /// Print a report of sessions, tasks and streaks
    Report,
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Record today's summary and reset the day counters
    CloseDay {
        #[arg(long, default_value = "")]
        mood: String,
        #[arg(long, default_value = "")]
        reflection: String,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long, value_enum, default_value = "business")]
        category: Category,
        #[arg(short, long, value_enum, default_value = "daily")]
        frequency: Frequency,
        /// Estimated focus time (e.g. 50m)
        #[arg(short, long)]
        estimate: Option<String>,
    },
    /// List tasks
    List,
    /// Toggle a task's completion
    Done { id: String },
    /// Toggle a task's skipped flag
    Skip { id: String },
    /// Delete a task
    Rm { id: String },
    /// Link the focus clock to a task, or unlink when no id is given
    Link { id: Option<String> },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Add a goal
    Add {
        title: String,
        #[arg(short, long)]
        target: f64,
        #[arg(short, long, default_value = "")]
        unit: String,
        #[arg(long, value_enum, default_value = "monthly")]
        horizon: Horizon,
        #[arg(short, long, value_enum, default_value = "business")]
        category: Category,
        /// Days until the target date
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List goals
    List,
    /// Set a goal's current value
    Progress { id: String, value: f64 },
    /// Delete a goal
    Rm { id: String },
}

impl Commands {
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Commands::Status
                | Commands::Report
                | Commands::Task(TaskCommand::List)
                | Commands::Goal(GoalCommand::List)
        )
    }
}

fn apply_overrides(config: &mut Config, args: &DurationArgs) -> Result<()> {
    if let Some(focus) = &args.focus {
        config.durations.focus_mins = parse_minutes(focus)?;
    }
    if let Some(short) = &args.short_break {
        config.durations.short_break_mins = parse_minutes(short)?;
    }
    if let Some(long) = &args.long_break {
        config.durations.long_break_mins = parse_minutes(long)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config()?;

    let base_dir = Storage::get_base_dir()?;
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(base_dir.join("focusdeck.lock"))?;
    let mut lock = RwLock::new(lock_file);
    let _guard = if cli.command.mutates() {
        Some(lock.try_write().map_err(|_| {
            anyhow::anyhow!("Another focusdeck session is running. Close it before changing state.")
        })?)
    } else {
        None
    };

    match &cli.command {
        Commands::Start { durations } | Commands::Run { durations, .. } => {
            apply_overrides(&mut config, durations)?;
        }
        _ => {}
    }
    config.validate()?;

    let mut dashboard = Dashboard::new(Storage::new()?, config.durations)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Start { .. } => {
            tui::run_tui(&mut dashboard)?;

            // Nothing ticks the clock once the dashboard is closed
            dashboard.pause(Utc::now())?;
            dashboard.save()?;
            Reporter::new(&dashboard.db).status();
        }
        Commands::Run { mode, task, .. } => {
            if let Some(mode) = mode {
                dashboard.change_mode(mode)?;
            }
            if let Some(task) = task {
                dashboard.select_task(Some(&task))?;
            }
            runner::run_headless(&mut dashboard)?;
        }
        Commands::Status => Reporter::new(&dashboard.db).status(),
        Commands::Report => Reporter::new(&dashboard.db).report(),
        Commands::Task(cmd) => match cmd {
            TaskCommand::Add {
                title,
                category,
                frequency,
                estimate,
            } => {
                let estimated_minutes = match estimate {
                    Some(e) => parse_minutes(&e)?,
                    None => DEFAULT_ESTIMATE_MINS,
                };
                let id = dashboard.add_task(NewTask {
                    title,
                    category,
                    frequency,
                    estimated_minutes,
                })?;
                println!("Added task {}", id);
            }
            TaskCommand::List => Reporter::new(&dashboard.db).tasks(),
            TaskCommand::Done { id } => {
                if dashboard.toggle_task(&id, today)? {
                    println!("Completed {} (+{} points)", id, TASK_POINTS);
                } else {
                    println!("Reopened {}", id);
                }
            }
            TaskCommand::Skip { id } => {
                let skipped = dashboard.skip_task(&id)?;
                println!("{} {}", if skipped { "Skipped" } else { "Unskipped" }, id);
            }
            TaskCommand::Rm { id } => {
                dashboard.delete_task(&id)?;
                println!("Deleted task {}", id);
            }
            TaskCommand::Link { id } => {
                dashboard.select_task(id.as_deref())?;
                println!("{}", report::clock_line(dashboard.clock()));
            }
        },
        Commands::Goal(cmd) => match cmd {
            GoalCommand::Add {
                title,
                target,
                unit,
                horizon,
                category,
                days,
                description,
            } => {
                let id = dashboard.add_goal(
                    NewGoal {
                        title,
                        description,
                        horizon,
                        category,
                        target_value: target,
                        unit,
                        duration_days: days,
                    },
                    Utc::now(),
                )?;
                println!("Added goal {}", id);
            }
            GoalCommand::List => Reporter::new(&dashboard.db).goals(),
            GoalCommand::Progress { id, value } => {
                if dashboard.update_goal_progress(&id, value)? {
                    println!("Goal {} reached (+{} points)", id, GOAL_POINTS);
                } else {
                    println!("Updated {}", id);
                }
            }
            GoalCommand::Rm { id } => {
                dashboard.delete_goal(&id)?;
                println!("Deleted goal {}", id);
            }
        },
        Commands::CloseDay { mood, reflection } => {
            let summary = dashboard.close_day(&mood, &reflection, today)?;
            println!(
                "Closed {}: {} min focus, {} sessions",
                summary.date, summary.focus_minutes, summary.sessions_completed
            );
        }
    }

    Ok(())
}
