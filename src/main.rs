mod api;
mod app;
mod config;
mod detail;
mod effect;
mod error;
mod list;
mod logging;
mod models;
mod optimistic;
mod request;
mod ui;

use crate::api::{TodoApi, TodoClient};
use crate::app::App;
use crate::config::Config;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    logging::init(config.log_file.as_deref());
    info!(
        service_root = %config.service_root,
        tenant = %config.tenant_id,
        "starting doit-tui"
    );

    let api: Arc<dyn TodoApi> = Arc::new(TodoClient::new(&config)?);
    let (tx, rx) = mpsc::unbounded_channel();

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let app = App::new(api, config.page_size, tx);

    let res = ui::run_app(&mut terminal, app, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
