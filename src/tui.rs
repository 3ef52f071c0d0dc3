use crate::clock::{Mode, SessionClock};
use crate::dashboard::Dashboard;
use crate::models::{SessionKind, Task};
use crate::stats::{discipline_score, focus_rest_ratio, Rank};
use crate::utils::{format_clock, format_duration};
use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::error;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration as StdDuration, Instant};

const TICK: StdDuration = StdDuration::from_secs(1);

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Focus => Color::Cyan,
        Mode::ShortBreak => Color::Green,
        Mode::LongBreak => Color::Magenta,
    }
}

struct App<'a> {
    dashboard: &'a mut Dashboard,
    last_tick: Instant,
    message: Option<String>,
}

impl<'a> App<'a> {
    fn open_tasks(&self) -> Vec<&Task> {
        self.dashboard
            .db
            .tasks
            .iter()
            .filter(|t| !t.is_completed)
            .collect()
    }

    /// Links the next open task after the current one, wrapping to none.
    fn cycle_linked_task(&mut self) -> Result<()> {
        let next = {
            let open = self.open_tasks();
            let current = self.dashboard.clock().linked_task_id();
            let pos = current.and_then(|id| open.iter().position(|t| t.id == id));
            match pos {
                None => open.first().map(|t| t.id.clone()),
                Some(i) => open.get(i + 1).map(|t| t.id.clone()),
            }
        };
        self.dashboard.select_task(next.as_deref())
    }

    /// Returns true when the dashboard should close. Quitting pauses the
    /// clock, since nothing ticks it once the dashboard is gone.
    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        self.message = None;
        match code {
            KeyCode::Char('q') => {
                self.dashboard.pause(Utc::now())?;
                return Ok(true);
            }
            KeyCode::Char(' ') => {
                self.dashboard.toggle_running(Utc::now())?;
                self.last_tick = Instant::now();
            }
            KeyCode::Char('r') => self.dashboard.reset()?,
            KeyCode::Char('1') => self.dashboard.change_mode(Mode::Focus)?,
            KeyCode::Char('2') => self.dashboard.change_mode(Mode::ShortBreak)?,
            KeyCode::Char('3') => self.dashboard.change_mode(Mode::LongBreak)?,
            KeyCode::Char('l') => self.cycle_linked_task()?,
            KeyCode::Char('u') => self.dashboard.select_task(None)?,
            _ => {}
        }
        Ok(false)
    }

    /// The only tick source: one tick per elapsed second while running.
    fn advance(&mut self) -> Result<()> {
        if !self.dashboard.clock().is_running() {
            self.last_tick = Instant::now();
            return Ok(());
        }
        while self.last_tick.elapsed() >= TICK && self.dashboard.clock().is_running() {
            self.last_tick += TICK;
            if let Some(record) = self.dashboard.tick(Utc::now())? {
                let finished = match record.kind {
                    SessionKind::Focus => "Deep work",
                    SessionKind::ShortBreak => "Rest",
                };
                self.message = Some(format!(
                    "{} finished ({} min). Next: {}",
                    finished,
                    record.duration_minutes,
                    self.dashboard.clock().mode().label()
                ));
            }
        }
        Ok(())
    }
}

pub fn run_tui(dashboard: &mut Dashboard) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        dashboard,
        last_tick: Instant::now(),
        message: None,
    };
    let res = run_loop(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("dashboard loop failed: {:?}", err);
        println!("{:?}", err)
    }

    Ok(())
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code)? {
                    return Ok(());
                }
            }
        }

        app.advance()?;
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(9), // Clock + stats
            Constraint::Min(0),    // Tasks
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    draw_clock(frame, middle[0], app.dashboard.clock());
    draw_stats(frame, middle[1], app);

    draw_tasks(frame, chunks[2], app);
    draw_footer(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let clock = app.dashboard.clock();
    let status = if clock.is_running() {
        Span::styled(
            "RUNNING",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };

    let header = Line::from(vec![
        Span::styled(
            " Focusdeck ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status,
        Span::raw(" | "),
        Span::raw(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    ]);

    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_clock(frame: &mut Frame, area: Rect, clock: &SessionClock) {
    let color = mode_color(clock.mode());
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", clock.mode().label().to_uppercase()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Mode tabs
            Constraint::Length(1),
            Constraint::Length(1), // Countdown
            Constraint::Length(1),
            Constraint::Length(1), // Gauge
            Constraint::Min(0),
        ])
        .split(inner);

    let tabs: Vec<Span> = Mode::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, mode)| {
            let style = if *mode == clock.mode() {
                Style::default()
                    .fg(mode_color(*mode))
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            vec![
                Span::styled(format!(" {} {} ", i + 1, mode.label()), style),
                Span::raw(" "),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(tabs)).alignment(Alignment::Center),
        rows[0],
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            format_clock(clock.seconds_remaining()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        rows[2],
    );

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(clock.progress().clamp(0.0, 1.0))
        .label(format!("{:.0}%", clock.progress() * 100.0));
    frame.render_widget(gauge, rows[4]);
}

fn draw_stats(frame: &mut Frame, area: Rect, app: &App) {
    let db = &app.dashboard.db;
    let clock = &db.clock;
    let focus = clock.focus_minutes_today();
    let rest = clock.rest_minutes_today();

    let lines = vec![
        Line::from(vec![
            Span::styled("  Deep Work: ", Style::default().fg(Color::Cyan)),
            Span::raw(format_duration(i64::from(focus) * 60)),
        ]),
        Line::from(vec![
            Span::styled("  Rest:      ", Style::default().fg(Color::Green)),
            Span::raw(format_duration(i64::from(rest) * 60)),
        ]),
        Line::raw(format!("  Ratio:     {:.1}x", focus_rest_ratio(focus, rest))),
        Line::raw(format!("  Sessions:  {}", clock.total_sessions_completed())),
        Line::raw(format!("  Discipline: {}%", discipline_score(&db.tasks))),
        Line::from(vec![
            Span::raw(format!("  Points:    {} ", db.reward_points)),
            Span::styled(
                format!("({})", Rank::from_xp(db.total_xp)),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(
            " TODAY ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_tasks(frame: &mut Frame, area: Rect, app: &App) {
    let linked = app.dashboard.clock().linked_task_id();
    let items: Vec<ListItem> = app
        .dashboard
        .db
        .tasks
        .iter()
        .map(|task| {
            let marker = if task.is_completed {
                "[x]"
            } else if task.is_skipped {
                "[-]"
            } else {
                "[ ]"
            };
            let mut style = Style::default();
            if task.is_completed {
                style = style.fg(Color::DarkGray);
            }
            if Some(task.id.as_str()) == linked {
                style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} {:<32}", marker, task.title), style),
                Span::raw(format!(
                    " {:>3}/{:<3} min  {:<12} streak {}",
                    task.actual_minutes_spent, task.estimated_minutes, task.category, task.streak_count
                )),
            ]))
        })
        .collect();

    let title = match linked {
        Some(id) => format!(" TASKS (linked: {}) ", id),
        None => " TASKS ".to_string(),
    };
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(list, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let text = app.message.clone().unwrap_or_else(|| {
        "space start/pause | r reset | 1/2/3 mode | l link task | u unlink | q quit".to_string()
    });
    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}
