//! Main application logic and TUI event loop.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};

use crate::cli::{AppConfig, WarehouseSettings};
use crate::dashboard::{Dashboard, SectionId, DASHBOARD_TITLE, EXEC_SUMMARY_TITLE};
use crate::data::{SnowflakeWarehouse, SqliteWarehouse, Warehouse};
use crate::error::{DashboardError, DashboardResult};
use crate::ui::{
    section::{page_layout, SectionView},
    section_nav::{ScrollState, SectionNav},
    widgets::{ErrorPanel, MetricCards, StatusBar},
    HelpOverlay, Theme,
};

/// Open the one connection the process uses for every render pass
pub fn open_warehouse(config: &AppConfig) -> DashboardResult<Box<dyn Warehouse>> {
    match &config.warehouse {
        WarehouseSettings::Snowflake(settings) => {
            Ok(Box::new(SnowflakeWarehouse::connect(settings)?))
        }
        WarehouseSettings::Sqlite(path) => Ok(Box::new(SqliteWarehouse::open(path)?)),
    }
}

/// Outcome of the latest render pass
pub enum Page {
    Loaded(Dashboard),
    Failed(DashboardError),
}

/// Application state
pub struct App {
    theme: Theme,
    warehouse: Box<dyn Warehouse>,
    refresh_interval: Option<Duration>,

    page: Page,
    scroll: ScrollState,
    show_help: bool,

    // Timing
    last_refresh: Instant,

    // Exit flag
    should_quit: bool,
}

impl App {
    /// Create the app and run the first render pass
    pub fn new(warehouse: Box<dyn Warehouse>, refresh_interval_secs: u64) -> Self {
        let refresh_interval =
            (refresh_interval_secs > 0).then(|| Duration::from_secs(refresh_interval_secs));
        let page = Self::render_pass(warehouse.as_ref());
        App {
            theme: Theme::default(),
            warehouse,
            refresh_interval,
            page,
            scroll: ScrollState::new(),
            show_help: false,
            last_refresh: Instant::now(),
            should_quit: false,
        }
    }

    fn render_pass(warehouse: &dyn Warehouse) -> Page {
        match Dashboard::load(warehouse) {
            Ok(dashboard) => Page::Loaded(dashboard),
            Err(e) => {
                tracing::error!(class = e.class(), error = %e, "render pass aborted");
                Page::Failed(e)
            }
        }
    }

    /// Re-run every query on the existing connection
    fn refresh(&mut self) {
        self.page = Self::render_pass(self.warehouse.as_ref());
        if let Page::Loaded(dashboard) = &self.page {
            self.scroll.clamp(dashboard.sections.len());
        }
        self.last_refresh = Instant::now();
    }

    fn section_count(&self) -> usize {
        match &self.page {
            Page::Loaded(dashboard) => dashboard.sections.len(),
            Page::Failed(_) => 0,
        }
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) {
        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            KeyCode::Char('r') => {
                self.refresh();
                return;
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return;
        }

        let sections = self.section_count();
        match key {
            KeyCode::Down | KeyCode::Char('j') => self.scroll.next(sections),
            KeyCode::Up | KeyCode::Char('k') => self.scroll.prev(),
            KeyCode::Home | KeyCode::Char('g') => self.scroll.first(),
            KeyCode::End | KeyCode::Char('G') => self.scroll.last(sections),
            KeyCode::Char(c) => {
                if let Some(n) = c.to_digit(10) {
                    if n > 0 {
                        self.scroll.jump(n as usize - 1, sections);
                    }
                }
            }
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(3),    // Page
                Constraint::Length(1), // Footer caption
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        let title = Paragraph::new(Line::from(Span::styled(
            DASHBOARD_TITLE,
            self.theme.title_style(),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(title, main_chunks[0]);

        match &self.page {
            Page::Loaded(dashboard) => self.render_dashboard(frame, main_chunks[1], dashboard),
            Page::Failed(error) => ErrorPanel::new(error, &self.theme).render(frame, main_chunks[1]),
        }

        let footer = match &self.page {
            Page::Loaded(dashboard) => dashboard.footer.clone(),
            Page::Failed(_) => format!("Source: {}", self.warehouse.source_label()),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(footer, self.theme.caption_style())),
            main_chunks[2],
        );

        let (refreshed, error) = match &self.page {
            Page::Loaded(dashboard) => (
                Some(
                    dashboard
                        .loaded_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                ),
                None,
            ),
            Page::Failed(e) => (None, Some(e.class())),
        };
        let status_bar = StatusBar::new(refreshed.as_deref(), error, &self.theme);
        status_bar.render(frame, main_chunks[3]);

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }

    fn render_dashboard(
        &self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
        dashboard: &Dashboard,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Executive summary
                Constraint::Length(1), // Section navigation
                Constraint::Min(0),    // Sections
            ])
            .split(area);

        let metrics = dashboard.summary.metrics();
        MetricCards::new(EXEC_SUMMARY_TITLE, &metrics, &self.theme).render(frame, chunks[0]);

        let titles: Vec<&str> = SectionId::ALL.iter().map(|id| id.title()).collect();
        SectionNav::new(&titles, self.scroll, &self.theme).render(frame, chunks[1]);

        for (index, section_area) in page_layout(chunks[2], dashboard.sections.len(), self.scroll.top) {
            SectionView::new(&dashboard.sections[index], index, &self.theme)
                .render(frame, section_area);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Connect before touching the terminal so failures print normally
    let warehouse = open_warehouse(&config).context("Failed to connect to the warehouse")?;
    let mut app = App::new(warehouse, config.refresh_interval_secs);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if let Some(interval) = app.refresh_interval {
            if app.last_refresh.elapsed() >= interval {
                app.refresh();
            }
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
