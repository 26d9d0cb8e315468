use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::KeyEventKind;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use quizr::app::{App, NoticeLevel};
use quizr::config::Config;
use quizr::event::{AppEvent, EventHandler};
use quizr::store::kv::{FileStore, KvStore, MemoryStore};
use quizr::ui::components::dialog::{ConfirmDialog, PromptDialog};
use quizr::ui::components::exam_panel::ExamWidget;
use quizr::ui::components::nav_bar::NavBar;
use quizr::ui::components::question_panel::QuestionPanel;
use quizr::ui::components::result_panel::ResultPanel;
use quizr::ui::layout::{AppLayout, pack_hint_lines};
use quizr::ui::theme::Theme;
use quizr::ui::view::{Body, ViewState};

#[derive(Parser)]
#[command(name = "quizr", version, about = "Write your own questions, then quiz yourself on them")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Directory holding questions, history and logs")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Directory exports are written to")]
    export_dir: Option<PathBuf>,

    #[arg(long, help = "Keep question ids from imported files")]
    preserve_ids: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let first_run = !Config::config_path().exists();
    let mut config = Config::load()?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = cli.export_dir {
        config.export_dir = dir.to_string_lossy().into_owned();
    }
    if cli.preserve_ids {
        config.preserve_import_ids = true;
    }
    config.validate(&Theme::available_themes());

    let _log_guard = init_logging(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");
    if first_run {
        if let Err(e) = config.save() {
            tracing::warn!("could not write default config: {e:#}");
        }
    }

    let kv = open_store(&config);
    let theme = Theme::load(&config.theme).unwrap_or_default();
    let mut app = App::new(config, kv, theme);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    app.attach_events(events.sender());

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("fatal: {err:#}");
        eprintln!("Error: {err:?}");
    }
    tracing::info!("exiting");

    Ok(())
}

/// Logs go to a daily file under the data directory; stdout belongs to the
/// terminal UI.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let log_dir = config.data_path().join("logs");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::daily(&log_dir, "quizr.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init();
    initialized.ok().map(|_| guard)
}

fn open_store(config: &Config) -> Rc<dyn KvStore> {
    match FileStore::with_base_dir(config.data_path()) {
        Ok(store) => {
            tracing::info!(dir = %store.base_dir().display(), "using file store");
            Rc::new(store)
        }
        Err(e) => {
            tracing::warn!("data directory unavailable, nothing will be saved: {e}");
            Rc::new(MemoryStore::new())
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize(_, _) => {}
            AppEvent::FileLoaded {
                target,
                path,
                content,
            } => app.on_file_loaded(target, &path, content),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let theme = &app.theme;
    let colors = &theme.colors;
    let view = ViewState::project(app);

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    let hint_lines = pack_hint_lines(&view.hints, area.width as usize);
    let layout = AppLayout::new(area, hint_lines.len() as u16);

    frame.render_widget(NavBar::new(&view.tabs, theme), layout.header);

    match &view.body {
        Body::Config(config) => frame.render_widget(QuestionPanel::new(config, theme), layout.main),
        Body::Exam(exam) => frame.render_widget(ExamWidget::new(exam, theme), layout.main),
        Body::Result(result) => frame.render_widget(ResultPanel::new(result, theme), layout.main),
    }

    if let Some((level, text)) = &view.notice {
        let color = match level {
            NoticeLevel::Info => colors.fg(),
            NoticeLevel::Success => colors.success(),
            NoticeLevel::Error => colors.error(),
        };
        let notice = Paragraph::new(Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(color),
        )));
        frame.render_widget(notice, layout.notice);
    }

    let footer = Paragraph::new(
        hint_lines
            .into_iter()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.muted()))))
            .collect::<Vec<_>>(),
    );
    frame.render_widget(footer, layout.footer);

    if let Some(prompt) = &view.prompt {
        frame.render_widget(PromptDialog::new(prompt, theme), area);
    }
    if let Some(message) = &view.confirm {
        frame.render_widget(ConfirmDialog::new(message, theme), area);
    }
}
