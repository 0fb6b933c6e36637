pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use typometer::{
    config::{Config, ConfigStore, FileConfigStore},
    history::{History, SortKey},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    sentences::{FixedSentence, SentencePool, SentenceSource},
    session::Session,
    store::{HistoryDb, HistoryStore, MemoryStore},
};

const TICK_RATE_MS: u64 = 100;

/// terminal typing-speed test with local result history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing-speed test: type the shown sentence character by character, get wpm and accuracy, and track your progress across runs."
)]
pub struct Cli {
    /// custom target text to type
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// trailing-window size for the recent average
    #[clap(long, value_name = "N")]
    last: Option<usize>,

    /// history sort order
    #[clap(long, value_enum)]
    sort: Option<SortKey>,

    /// write the result history as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// delete the persisted result history and exit
    #[clap(long)]
    clear_history: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

pub struct App {
    pub session: Session,
    pub history: History,
    pub state: AppState,
    pub trailing_window: usize,
    pub sort_by: SortKey,
    sentences: Box<dyn SentenceSource>,
}

impl App {
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let sentences: Box<dyn SentenceSource> = match &cli.prompt {
            Some(text) => Box::new(FixedSentence::new(text.clone())),
            None => Box::new(SentencePool::load()),
        };

        // Storage unavailability degrades to a session-only history
        let store: Box<dyn HistoryStore> = match HistoryDb::new() {
            Ok(db) => Box::new(db),
            Err(_) => Box::new(MemoryStore::default()),
        };

        Self::with_parts(sentences, store, config)
    }

    /// Assemble an app from explicit collaborators; lets tests run without
    /// a real corpus or on-disk storage.
    pub fn with_parts(
        sentences: Box<dyn SentenceSource>,
        store: Box<dyn HistoryStore>,
        config: &Config,
    ) -> Self {
        Self {
            session: Session::new(sentences.next_sentence()),
            history: History::open(store),
            state: AppState::Typing,
            trailing_window: config.trailing_window,
            sort_by: config.sort_by,
            sentences,
        }
    }

    /// Abandon the current attempt (nothing is persisted) and start over
    /// with a fresh sentence.
    pub fn restart(&mut self) {
        self.session.load_target(self.sentences.next_sentence());
        self.state = AppState::Typing;
    }

    pub fn toggle_sort(&mut self) {
        self.sort_by = match self.sort_by {
            SortKey::Recency => SortKey::Score,
            SortKey::Score => SortKey::Recency,
        };
    }

    fn typed_value(&self) -> String {
        self.session.input().iter().collect()
    }

    fn apply_value(&mut self, value: &str) {
        if let Some(result) = self.session.apply_input(value) {
            self.history.append(result);
            self.state = AppState::Results;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.export.is_some() || cli.clear_history {
        return run_maintenance(&cli);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if let Some(n) = cli.last {
        config.trailing_window = n;
    }
    if let Some(sort) = cli.sort {
        config.sort_by = sort;
    }
    let _ = config_store.save(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&cli, &config);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    res
}

/// Non-interactive paths: CSV export and history clearing.
fn run_maintenance(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut history = History::open(Box::new(HistoryDb::new()?));

    if let Some(path) = &cli.export {
        let file = std::fs::File::create(path)?;
        history.export_csv(file)?;
        println!("exported {} results to {}", history.len(), path.display());
    }

    if cli.clear_history {
        history.clear();
        println!("result history cleared");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            // Ticks only refresh the display clock; scoring never reads it
            AppEvent::Tick | AppEvent::Resize => {}
            AppEvent::Paste(text) => {
                if app.state == AppState::Typing {
                    app.session.apply_paste(&text);
                }
            }
            AppEvent::Key(key) => {
                if handle_key(app, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns true when the app should exit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.state {
        AppState::Typing => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab => app.restart(),
            KeyCode::Backspace => {
                let mut value = app.typed_value();
                value.pop();
                app.apply_value(&value);
            }
            KeyCode::Char(c) => {
                let mut value = app.typed_value();
                value.push(c);
                app.apply_value(&value);
            }
            _ => {}
        },
        AppState::Results => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('r') => app.restart(),
            KeyCode::Char('h') => app.state = AppState::History,
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('r') => app.restart(),
            KeyCode::Char('s') => app.toggle_sort(),
            KeyCode::Char('d') => app.history.clear(),
            _ => {}
        },
    }

    false
}
