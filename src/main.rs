mod config;
mod feed;
mod kanban_board;
mod parser;
mod sync;
mod task;
mod ui;
mod view;

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, CONFIG_FILE};
use crate::feed::Source;
use crate::kanban_board::KanbanBoard;
use crate::sync::{StatusSink, SyncClient};
use crate::task::{Priority, Record};
use crate::ui::App;
use crate::view::{Predicate, SortMode, ViewOptions};

#[derive(Debug, Parser)]
#[command(
    name = "taskboard",
    about = "Terminal task board over a published spreadsheet export",
    version
)]
struct Cli {
    /// Config file to read.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Feed URL or CSV path, overriding the config.
    #[arg(long, global = true)]
    csv_url: Option<String>,
    /// Status update endpoint, overriding the config.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Enable debug logging.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the interactive board (default).
    Board,

    /// Print the board grouped by priority.
    List(ListArgs),

    /// Set one task's status and push it to the endpoint.
    Set {
        /// Unique_ID of the task.
        id: String,
        /// New status, e.g. Complete or Pending.
        status: String,
    },

    /// Show counts per column and status.
    Stats,

    /// Write a default config file.
    Init {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Include completed tasks.
    #[arg(long)]
    show_complete: bool,
    /// Only tasks with exactly this status.
    #[arg(long)]
    status: Option<String>,
    #[arg(long, value_enum)]
    sort: Option<SortMode>,
    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    match cli.command {
        Some(Commands::Init { dir }) => {
            init_logging(verbose, None)?;
            handle_init(&dir)
        }
        Some(Commands::List(args)) => {
            init_logging(verbose, None)?;
            handle_list(&load_config(&cli.config, cli.csv_url, cli.api_url)?, args)
        }
        Some(Commands::Set { id, status }) => {
            init_logging(verbose, None)?;
            handle_set(&load_config(&cli.config, cli.csv_url, cli.api_url)?, &id, &status)
        }
        Some(Commands::Stats) => {
            init_logging(verbose, None)?;
            handle_stats(&load_config(&cli.config, cli.csv_url, cli.api_url)?)
        }
        Some(Commands::Board) | None => {
            let config = load_config(&cli.config, cli.csv_url, cli.api_url)?;
            init_logging(verbose, Some(&config.log_file))?;
            run_board(&config)
        }
    }
}

/// Reads the config file and applies command-line overrides.
fn load_config(path: &Path, csv_url: Option<String>, api_url: Option<String>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(url) = csv_url {
        config.csv_url = url;
    }
    if let Some(url) = api_url {
        config.api_url = Some(url);
    }
    Ok(config)
}

fn handle_init(dir: &Path) -> Result<()> {
    match Config::init(dir)? {
        Some(path) => println!("Wrote {}", path.display()),
        None => println!("Config already exists in {}", dir.display()),
    }
    Ok(())
}

/// Logs go to `log_file` when given (the board owns the terminal), else stderr.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default = if verbose { "taskboard=debug" } else { "taskboard=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {:?}", path))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn sync_client(config: &Config) -> SyncClient {
    match config.api_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => SyncClient::spawn(url),
        _ => {
            tracing::info!("no api_url configured, status changes stay local");
            SyncClient::disabled()
        }
    }
}

fn load_board(config: &Config) -> Result<KanbanBoard> {
    let source = Source::from_setting(&config.csv_url)?;
    let records = feed::load(&source).with_context(|| format!("loading {:?}", source))?;
    let mut board = KanbanBoard::new();
    board.replace(records);
    Ok(board)
}

fn run_board(config: &Config) -> Result<()> {
    let source = Source::from_setting(&config.csv_url)?;
    let sync = sync_client(config);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ViewOptions {
        show_complete: config.show_complete,
        sort: config.sort,
        extra: Vec::new(),
    });
    let result = ui::run_app(&mut terminal, &mut app, &source, &sync);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    sync.shutdown();
    result.context("board session failed")
}

fn handle_list(config: &Config, args: ListArgs) -> Result<()> {
    let board = load_board(config)?;
    if board.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    let opts = ViewOptions {
        show_complete: args.show_complete || args.status.is_some(),
        sort: args.sort.unwrap_or(config.sort),
        extra: args.status.into_iter().map(Predicate::StatusEquals).collect(),
    };

    if args.json {
        let shown = view::visible(board.tasks(), &opts);
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    for priority in Priority::ALL {
        let tasks = view::column(board.tasks(), &opts, priority);
        println!("{}:", priority.label());
        for task in tasks {
            println!("{}", describe(task));
        }
    }
    Ok(())
}

fn describe(task: &Record) -> String {
    let mut line = format!("- [{}] {}", task.id(), task.task());
    if !task.client().is_empty() {
        line.push_str(&format!(" ({})", task.client()));
    }
    if let Some(date) = view::display_date(task.date()) {
        line.push_str(&format!(" due {}", date));
    }
    if task.is_complete() {
        line.push_str(" ✔");
    }
    line
}

fn handle_set(config: &Config, id: &str, status: &str) -> Result<()> {
    let mut board = load_board(config)?;
    let Some(previous) = board.find(id).map(|t| t.status().to_string()) else {
        anyhow::bail!("no task with id {:?}", id);
    };
    board.set_status(id, status);
    let sync = sync_client(config);
    if !sync.is_enabled() {
        eprintln!("No api_url configured; nothing was sent.");
    }
    sync.notify(id, status);
    sync.shutdown();
    println!("{}: {:?} -> {}", id, previous, status);
    Ok(())
}

fn handle_stats(config: &Config) -> Result<()> {
    let board = load_board(config)?;
    let all = ViewOptions {
        show_complete: true,
        ..Default::default()
    };
    println!("Rows: {}", board.len());
    for priority in Priority::ALL {
        println!("{}: {}", priority.label(), view::column(board.tasks(), &all, priority).len());
    }

    let mut status_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in view::visible(board.tasks(), &all) {
        let status = if task.status().is_empty() { "(none)" } else { task.status() };
        *status_counts.entry(status).or_insert(0) += 1;
    }
    for (status, count) in status_counts {
        println!("{}: {}", status, count);
    }
    Ok(())
}
