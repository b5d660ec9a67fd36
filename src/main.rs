// main.rs

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use daily_todo::app::App;
use daily_todo::cli::{self, Cli, Commands};
use daily_todo::clock::SystemClock;
use daily_todo::config::{Config, DATA_DIR_ENV, config_path, load_config};
use daily_todo::daemon::ReminderDaemon;
use daily_todo::events::{EventSink, Fanout};
use daily_todo::notify::DesktopNotifier;
use daily_todo::storage::JsonFileStore;
use daily_todo::store::TodoStore;
use daily_todo::tui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&config_path())?;
    let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let data_dir = config.resolve_data_dir(cli.data_dir.clone(), env_dir);

    if std::env::var("DAILY_TODO_DEBUG").is_ok() {
        init_logging(&data_dir)?;
    }
    info!(data_dir = %data_dir.display(), "starting");

    let backend = JsonFileStore::new(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

    match cli.command {
        None => run_tui(backend, &config),
        Some(Commands::Daemon) => run_daemon(backend, &config),
        Some(command) => {
            let mut store = TodoStore::open(backend, SystemClock, ())?;
            cli::run(command, &mut store)
        }
    }
}

/// The TUI owns stdout, so debug logs go to a file next to the data.
fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("debug.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter("daily_todo=debug")
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run_tui(backend: JsonFileStore, config: &Config) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let store = Arc::new(Mutex::new(TodoStore::open(backend, SystemClock, tx)?));
    let mut daemon = ReminderDaemon::start(store.clone(), config.poll_interval());
    let mut app = App::new(store, rx, DesktopNotifier::new(config.notifications));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = tui::run_app(&mut terminal, &mut app);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    daemon.stop();
    res.context("Application error")
}

fn run_daemon(backend: JsonFileStore, config: &Config) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let sinks: Vec<Box<dyn EventSink>> = vec![
        Box::new(DesktopNotifier::new(config.notifications)),
        Box::new(tx),
    ];
    let store = TodoStore::open(backend, SystemClock, Fanout(sinks))?;
    let daemon = ReminderDaemon::start(Arc::new(Mutex::new(store)), config.poll_interval());
    println!(
        "Watching reminders every {}s (Ctrl+C to stop)",
        config.poll_interval().as_secs()
    );

    // Ends once the daemon thread drops the store and with it the sender.
    for event in rx {
        println!("[{}] {}", Local::now().format("%H:%M"), event.message());
    }
    daemon.wait();
    Ok(())
}
