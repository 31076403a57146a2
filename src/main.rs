pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use techarade::{
    classifier::DictionaryClassifier,
    config::{ConfigStore, FileConfigStore},
    game::{Game, GameState},
    review::{export_unverified, write_results_csv, Decision, Reviewer},
    runtime::{CrosstermEvents, GameEvent, Runner},
    session::{GameConfig, Participant},
    store::{ResultRecord, ResultsGateway, SqliteResults, StoreError},
    TICK_RATE_MS,
};

/// timed letter-to-term arcade with reviewer verification
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed word arcade: each round shows a letter and a 45 second countdown; type a term starting with that letter and score the seconds you had left. Saved sessions can be reviewed round by round (--review) or bulk-verified against an approved term list (--batch-file)."
)]
pub struct Cli {
    /// participant name; skips the registration screen
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// optional participant id shown alongside the name in the review table
    #[clap(long, default_value = "")]
    student_id: String,

    /// number of rounds per session
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// seconds on each round's countdown
    #[clap(short = 's', long)]
    round_secs: Option<f64>,

    /// open the reviewer dashboard instead of playing
    #[clap(long)]
    review: bool,

    /// batch-verify all saved results against the terms in FILE and exit
    #[clap(long, value_name = "FILE")]
    batch_file: Option<PathBuf>,

    /// print the unverified terms of all saved results and exit
    #[clap(long)]
    export_terms: bool,

    /// write the results table as CSV to FILE and exit
    #[clap(long, value_name = "FILE")]
    export_csv: Option<PathBuf>,

    /// results database path (defaults to the user state directory)
    #[clap(long, value_name = "FILE")]
    db: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self, base: techarade::config::Config) -> GameConfig {
        GameConfig {
            max_rounds: self.rounds.unwrap_or(base.rounds),
            round_secs: self.round_secs.unwrap_or(base.round_secs),
        }
    }

    fn headless(&self) -> bool {
        self.batch_file.is_some() || self.export_terms || self.export_csv.is_some()
    }
}

fn open_db(cli: &Cli) -> Result<SqliteResults, StoreError> {
    match &cli.db {
        Some(path) => SqliteResults::open(path),
        None => SqliteResults::open_default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Register,
    Idle,
    Playing,
    GameOver,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// No finished session yet.
    Pending,
    Saved,
    Failed,
    /// The results database could not be opened; play continues unsaved.
    Unavailable,
}

#[derive(Debug, Default)]
pub struct RegisterForm {
    pub name: String,
    pub student_id: String,
    pub on_id: bool,
    pub error: bool,
}

#[derive(Debug, Default)]
pub struct ReviewUi {
    pub selected: usize,
    /// Open record detail, by result id.
    pub detail: Option<i64>,
    pub round_sel: usize,
    pub status: Option<String>,
}

pub struct App {
    pub screen: Screen,
    pub reg: RegisterForm,
    pub game_cfg: GameConfig,
    pub game: Option<Game>,
    pub db: Option<SqliteResults>,
    pub reviewer: Option<Reviewer<SqliteResults>>,
    pub review_ui: ReviewUi,
    pub high_score: Option<f64>,
    pub save_status: SaveStatus,
}

impl App {
    fn start_session(&mut self, participant: Participant) {
        self.game = Some(Game::new(
            participant,
            self.game_cfg,
            Box::new(DictionaryClassifier::embedded()),
        ));
        self.screen = Screen::Idle;
    }

    /// Persists the finished session. The in-memory result (and high score)
    /// stays visible even when the write fails; the failure is surfaced on
    /// the game-over screen.
    fn finish_game(&mut self) {
        self.screen = Screen::GameOver;
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let record = ResultRecord::from_game(game);
        self.save_status = match self.db.as_ref().map(|db| db.create(&record)) {
            Some(Ok(id)) => {
                info!("saved result {id} for {}", record.name);
                SaveStatus::Saved
            }
            Some(Err(e)) => {
                warn!("saving result failed: {e}");
                SaveStatus::Failed
            }
            None => SaveStatus::Unavailable,
        };
        if game.auto_score > self.high_score.unwrap_or(0.0) {
            self.high_score = Some(game.auto_score);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.headless() {
        return run_headless(&cli);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &cli);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Admin commands that need no terminal: batch verification, term export
/// and the CSV dump.
fn run_headless(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let db = open_db(cli)?;

    if let Some(path) = &cli.batch_file {
        let raw = fs::read_to_string(path)?;
        let mut reviewer = Reviewer::new(db)?;
        let report = reviewer.batch_verify(&raw)?;
        println!("updated {} records", report.updated);
        for (id, err) in &report.failures {
            eprintln!("result {id}: {err}");
        }
        if !report.failures.is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let records = db.list_all()?;
    if cli.export_terms {
        for term in export_unverified(&records) {
            println!("{term}");
        }
        return Ok(());
    }
    if let Some(path) = &cli.export_csv {
        write_results_csv(&records, fs::File::create(path)?)?;
        println!("wrote {} results to {}", records.len(), path.display());
    }
    Ok(())
}

fn run_tui<B: Backend>(terminal: &mut Terminal<B>, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let game_cfg = cli.game_config(FileConfigStore::new().load());

    let mut app = if cli.review {
        let reviewer = Reviewer::new(open_db(cli)?)?;
        App {
            screen: Screen::Review,
            reg: RegisterForm::default(),
            game_cfg,
            game: None,
            db: None,
            reviewer: Some(reviewer),
            review_ui: ReviewUi::default(),
            high_score: None,
            save_status: SaveStatus::Pending,
        }
    } else {
        // play on without persistence rather than refusing to start
        let db = open_db(cli)
            .map_err(|e| warn!("results database unavailable: {e}"))
            .ok();
        let high_score = db.as_ref().and_then(|d| d.high_score().ok()).flatten();
        let mut app = App {
            screen: Screen::Register,
            reg: RegisterForm::default(),
            game_cfg,
            game: None,
            db,
            reviewer: None,
            review_ui: ReviewUi::default(),
            high_score,
            save_status: SaveStatus::Pending,
        };
        if let Some(name) = &cli.name {
            match Participant::register(name, &cli.student_id) {
                Some(p) => app.start_session(p),
                None => {
                    let mut cmd = Cli::command();
                    cmd.error(ErrorKind::InvalidValue, "--name must not be empty")
                        .exit();
                }
            }
        }
        app
    };

    let runner = Runner::new(CrosstermEvents::new(), Duration::from_millis(TICK_RATE_MS));

    loop {
        terminal.draw(|f| f.render_widget(&app, f.area()))?;

        match runner.step() {
            GameEvent::Tick => {
                if app.screen == Screen::Playing {
                    if let Some(game) = app.game.as_mut() {
                        game.on_tick();
                        if game.state == GameState::GameOver {
                            app.finish_game();
                        }
                    }
                }
            }
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if handle_key(&mut app, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns true when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.screen {
        Screen::Register => register_key(app, key),
        Screen::Idle => match key.code {
            KeyCode::Enter => {
                if let Some(game) = app.game.as_mut() {
                    game.start();
                    app.screen = Screen::Playing;
                }
                false
            }
            KeyCode::Esc => true,
            _ => false,
        },
        Screen::Playing => {
            let Some(game) = app.game.as_mut() else {
                return true;
            };
            match key.code {
                KeyCode::Char(c) => game.push_char(c),
                KeyCode::Backspace => game.backspace(),
                KeyCode::Enter => {
                    game.submit();
                    if game.state == GameState::GameOver {
                        app.finish_game();
                    }
                }
                KeyCode::Esc => return true,
                _ => {}
            }
            false
        }
        Screen::GameOver => match key.code {
            KeyCode::Enter | KeyCode::Char('r') => {
                if let Some(game) = app.game.as_mut() {
                    game.start();
                    app.save_status = SaveStatus::Pending;
                    app.screen = Screen::Playing;
                }
                false
            }
            KeyCode::Esc => true,
            _ => false,
        },
        Screen::Review => review_key(app, key),
    }
}

fn register_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab => app.reg.on_id = !app.reg.on_id,
        KeyCode::Backspace => {
            let field = if app.reg.on_id {
                &mut app.reg.student_id
            } else {
                &mut app.reg.name
            };
            field.pop();
        }
        KeyCode::Char(c) => {
            let field = if app.reg.on_id {
                &mut app.reg.student_id
            } else {
                &mut app.reg.name
            };
            field.push(c);
            app.reg.error = false;
        }
        KeyCode::Enter => match Participant::register(&app.reg.name, &app.reg.student_id) {
            Some(p) => app.start_session(p),
            None => app.reg.error = true,
        },
        KeyCode::Esc => return true,
        _ => {}
    }
    false
}

fn review_key(app: &mut App, key: KeyEvent) -> bool {
    let Some(reviewer) = app.reviewer.as_mut() else {
        return true;
    };

    if let Some(id) = app.review_ui.detail {
        let round_count = reviewer
            .results()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.rounds.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Esc => {
                app.review_ui.detail = None;
                app.review_ui.status = None;
            }
            KeyCode::Up => app.review_ui.round_sel = app.review_ui.round_sel.saturating_sub(1),
            KeyCode::Down => {
                if app.review_ui.round_sel + 1 < round_count {
                    app.review_ui.round_sel += 1;
                }
            }
            KeyCode::Char(c @ ('a' | 'x')) => {
                let decision = if c == 'a' {
                    Decision::Accepted
                } else {
                    Decision::Rejected
                };
                let round = reviewer
                    .results()
                    .iter()
                    .find(|r| r.id == id)
                    .and_then(|r| r.rounds.get(app.review_ui.round_sel))
                    .map(|r| r.round);
                if let Some(round) = round {
                    app.review_ui.status = match reviewer.set_verification(id, round, decision) {
                        Ok(()) => Some(format!("round {round} {decision:?}").to_lowercase()),
                        Err(e) => Some(e.to_string()),
                    };
                }
            }
            _ => {}
        }
        return false;
    }

    let count = reviewer.results().len();
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Up => app.review_ui.selected = app.review_ui.selected.saturating_sub(1),
        KeyCode::Down => {
            if app.review_ui.selected + 1 < count {
                app.review_ui.selected += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(record) = reviewer.results().get(app.review_ui.selected) {
                app.review_ui.detail = Some(record.id);
                app.review_ui.round_sel = 0;
            }
        }
        KeyCode::Char('f') => {
            app.review_ui.status = match reviewer.refresh() {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            };
            app.review_ui.selected = app.review_ui.selected.min(reviewer.results().len().saturating_sub(1));
        }
        _ => {}
    }
    false
}
