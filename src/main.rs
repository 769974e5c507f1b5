use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf};
use taskboard::{board::Board, config::Config, logging, ui, Database};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Team task board")]
struct Cli {
    /// JSON config file (defaults to ./taskboard.json when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides config and TASKBOARD_DB).
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    logging::init(&config.log_path, &config.log_filter)?;
    info!("Starting taskboard with database {}", config.database_path.display());

    let db = Database::open(&config.database_path)?;
    if let Err(err) = db.ensure_schema() {
        error!(error = %err, "Failed to create tables");
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut board = Board::new(db);
    let result = ui::run_app(&mut terminal, &mut board);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(error = %err, "UI loop failed");
        eprintln!("{:?}", err);
    }
    info!("Shutting down");
    Ok(())
}
