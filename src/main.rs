use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keyskill::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::DURATION_PRESETS,
    language::Language,
    logging, results,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    storage::{KeyValueStore, MemoryStore, SqliteStore, UnavailableStore},
    ui, TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// timed typing test with personal bests and progress history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test for the terminal. Type the passage before the clock runs out; results, personal bests and your last settings are saved between runs."
)]
pub struct Cli {
    /// language to pull passages from
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// test duration in seconds (15, 30, 60 or 120)
    #[clap(short = 'd', long, value_parser = parse_duration)]
    duration: Option<u32>,

    /// custom passage to type instead of a random one
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// path of the storage database
    #[clap(long)]
    db: Option<PathBuf>,

    /// keep results in memory only
    #[clap(long, conflicts_with = "db")]
    ephemeral: bool,

    /// write the result history as CSV to this path and exit
    #[clap(long)]
    export_csv: Option<PathBuf>,

    /// path of the log file
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn parse_duration(value: &str) -> Result<u32, String> {
    let secs: u32 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if DURATION_PRESETS.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("duration must be one of {DURATION_PRESETS:?}"))
    }
}

/// Storage selected by the CLI. Falls back to an unavailable store so a
/// broken database never keeps a test from running.
fn open_store(cli: &Cli) -> Box<dyn KeyValueStore> {
    if cli.ephemeral {
        return Box::new(MemoryStore::new());
    }

    let Some(path) = cli.db.clone().or_else(AppDirs::storage_path) else {
        tracing::warn!("no storage location available, results will not be saved");
        return Box::new(UnavailableStore);
    };

    match SqliteStore::open(&path) {
        Ok(store) => {
            tracing::info!(path = %path.display(), "opened storage");
            Box::new(store)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "storage unavailable");
            Box::new(UnavailableStore)
        }
    }
}

fn export_history(store: &dyn KeyValueStore, path: &Path) -> Result<(), Box<dyn Error>> {
    let history = results::load_history(store)?;
    results::export_csv(&history, File::create(path)?)?;
    tracing::info!(path = %path.display(), runs = history.len(), "exported history");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _log_guard = cli
        .log_file
        .clone()
        .or_else(AppDirs::log_path)
        .and_then(|path| logging::init_file_logging(&path));

    let store = open_store(&cli);

    if let Some(path) = &cli.export_csv {
        return export_history(store.as_ref(), path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(store, cli.prompt.clone());
    if let Some(language) = cli.language {
        app.select_language(language);
    }
    if let Some(duration) = cli.duration {
        app.select_duration(duration);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        let size = terminal.size()?;
        app.viewport = (size.width, size.height);
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == Control::Quit {
                    break;
                }
            }
        }
    }

    tracing::info!("quit");
    Ok(())
}
