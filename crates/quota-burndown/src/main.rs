use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use quota_burndown::config::DEFAULT_SETTINGS_PATH;
use quota_burndown::prelude::*;
use quota_burndown::sources::{GitHubBillingSource, HolidayCnSource};
use quota_burndown::{MonthSummary, Settings};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;

mod widgets;
use widgets::*;

#[derive(Debug, Clone, PartialEq)]
pub enum PopupType {
    Models,
    History,
}

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    #[arg(short = 'v', global = true)]
    verbose: bool,

    #[arg(short = 'c', long = "config", global = true, default_value = DEFAULT_SETTINGS_PATH)]
    config: String,

    #[arg(short = 'd', long = "data-dir", global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch usage and holidays, recompute the plan and persist the month
    Update {
        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Monthly target, overriding QUOTA_TOTAL_TARGET and the settings file
        #[arg(short = 't', long)]
        target: Option<f64>,
    },
    /// Show planned versus actual usage for a month
    View {
        /// Month to show (YYYY-MM); defaults to the latest updated month
        #[arg(short = 'm', long)]
        month: Option<String>,
    },
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load_from(expand_path(&args.config))?;

    settings.data_dir = match &args.data_dir {
        Some(dir) => expand_path(dir),
        None => expand_path(&settings.data_dir.to_string_lossy()),
    };
    settings.validate()?;

    Ok(settings)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "quota_burndown=debug"
    } else {
        "quota_burndown=info"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

async fn run_update(settings: Settings, date: Option<NaiveDate>, target: Option<f64>) -> Result<()> {
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    let env_target = target.map(|t| t.to_string()).or_else(Settings::env_target);

    let calendar = HolidayCnSource::new(settings.holiday_url.clone())?;
    let usage =
        GitHubBillingSource::from_env(settings.usage_api_base.clone(), settings.github_user.clone())?;
    let monitor = UsageMonitor::new(settings).with_env_target(env_target);

    let summary = monitor.update(today, Utc::now(), &calendar, &usage).await?;

    tracing::info!(
        month = %summary.month,
        target = summary.target,
        planned_days = summary.planned_days,
        actual_merged = summary.actual_merged,
        records = summary.records,
        "Update complete"
    );

    Ok(())
}

pub struct AppState {
    pub monitor: UsageMonitor,
    pub month: MonthKey,
    pub history: HistoryRecord,
    pub summary: Option<MonthSummary>,
    pub last_update: DateTime<Utc>,
    pub is_loading: bool,
    pub spinner_state: usize,
    pub data_loaded: bool,
    pub error_message: Option<String>,
    pub active_popup: Option<PopupType>,
}

impl AppState {
    fn new(monitor: UsageMonitor, month: MonthKey) -> Self {
        Self {
            monitor,
            month,
            history: HistoryRecord::new(),
            summary: None,
            last_update: Utc::now(),
            is_loading: false,
            spinner_state: 0,
            data_loaded: false,
            error_message: None,
            active_popup: None,
        }
    }

    fn load_data(&mut self) {
        self.is_loading = true;

        self.history = self.monitor.load_month(self.month);
        self.summary = self.monitor.summarize(&self.history, self.today());
        self.data_loaded = !self.history.is_empty();
        self.error_message = if self.data_loaded {
            None
        } else {
            Some(format!(
                "No history for {} at {}",
                self.month,
                self.monitor.store().month_path(self.month).display()
            ))
        };

        self.is_loading = false;
        self.last_update = Utc::now();
    }

    fn update_spinner(&mut self) {
        self.spinner_state = (self.spinner_state + 1) % 10;
    }

    pub fn get_spinner_char(&self) -> char {
        match self.spinner_state {
            0 => '⠋',
            1 => '⠙',
            2 => '⠹',
            3 => '⠸',
            4 => '⠼',
            5 => '⠴',
            6 => '⠦',
            7 => '⠧',
            8 => '⠇',
            9 => '⠏',
            _ => '⠋',
        }
    }

    /// Today, clamped into the viewed month so past months read as complete.
    pub fn today(&self) -> NaiveDate {
        Local::now()
            .date_naive()
            .clamp(self.month.first_day(), self.month.last_day())
    }

    pub fn get_usage_percentage(&self) -> f64 {
        self.summary
            .as_ref()
            .map_or(0.0, MonthSummary::usage_percentage)
    }

    pub fn get_planned_percentage(&self) -> f64 {
        self.summary
            .as_ref()
            .map_or(0.0, MonthSummary::planned_percentage)
    }

    /// `(days left, fraction of the month elapsed)`
    pub fn get_month_progress(&self) -> (i64, f64) {
        let today = self.today();
        let total_days = self.month.last_day().day() as f64;
        let days_left = (self.month.last_day() - today).num_days();
        (days_left, today.day() as f64 / total_days)
    }
}

pub struct App {
    state: Arc<Mutex<AppState>>,
    exit: bool,
}

impl App {
    pub fn new(monitor: UsageMonitor, month: MonthKey) -> Self {
        let mut app_state = AppState::new(monitor, month);
        app_state.load_data();

        Self {
            state: Arc::new(Mutex::new(app_state)),
            exit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let state_clone = Arc::clone(&self.state);

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(5));
            loop {
                interval.tick().await;

                if let Ok(mut state) = state_clone.lock() {
                    state.load_data();
                }
            }
        });

        let mut tick_interval = interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    if let Ok(mut state) = self.state.lock() {
                        state.update_spinner();
                    }

                    terminal.draw(|frame| self.draw(frame))?;
                }

                _ = async {
                    if event::poll(Duration::from_millis(0)).unwrap_or(false) {
                        if let Ok(event) = event::read() {
                            self.handle_event(event);
                        }
                    }
                } => {}
            }

            if self.exit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Min(10),
                Constraint::Length(6),
                Constraint::Length(1),
            ])
            .split(area);

        if let Ok(state) = self.state.lock() {
            HeaderWidget::render(frame, chunks[0], &state);
            ProgressBarsWidget::render(frame, chunks[1], &state);
            StatisticsWidget::render(frame, chunks[2], &state);
            BurnChartWidget::render(frame, chunks[3], &state);
            PredictionsWidget::render(frame, chunks[4], &state);
            ShortcutsWidget::render(frame, chunks[5], &state);

            match &state.active_popup {
                Some(PopupType::Models) => {
                    PopupWidget::render(frame, area, &state);
                }
                Some(PopupType::History) => {
                    HistoryPopupWidget::render(frame, area, &state);
                }
                None => {}
            }
        }
    }

    fn toggle_popup(&mut self, popup: PopupType) {
        if let Ok(mut state) = self.state.lock() {
            state.active_popup = if state.active_popup.as_ref() == Some(&popup) {
                None
            } else {
                Some(popup)
            };
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key_event) = event {
            if key_event.kind == KeyEventKind::Press {
                match key_event.code {
                    KeyCode::Char('q') => self.exit = true,
                    KeyCode::Char('r') => {
                        if let Ok(mut state) = self.state.lock() {
                            state.load_data();
                        }
                    }
                    KeyCode::Char('m') => self.toggle_popup(PopupType::Models),
                    KeyCode::Char('h') => self.toggle_popup(PopupType::History),
                    KeyCode::Esc => {
                        if let Ok(mut state) = self.state.lock() {
                            state.active_popup = None;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn run_view(settings: Settings, month: Option<String>) -> Result<()> {
    let monitor = UsageMonitor::new(settings);
    let month = match month {
        Some(label) => MonthKey::parse(&label)?,
        None => monitor.current_month(Local::now().date_naive()),
    };

    let mut terminal = ratatui::init();
    let mut app = App::new(monitor, month);

    let result = app.run(&mut terminal).await;

    ratatui::restore();

    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;

    match args.command {
        Some(Command::Update { date, target }) => {
            init_tracing(args.verbose);
            run_update(settings, date, target).await
        }
        // No subscriber here: log lines would draw over the alternate screen.
        Some(Command::View { month }) => run_view(settings, month).await,
        None => run_view(settings, None).await,
    }
}
