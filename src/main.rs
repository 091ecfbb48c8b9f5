use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures_util::StreamExt;
use log::{error, info};

use distributo_console::api::{ConsoleApi, HttpApi};
use distributo_console::app::App;
use distributo_console::config::ConsoleSettings;
use distributo_console::event::Event;
use distributo_console::logging;
use distributo_console::session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionContext, SessionManager,
};
use distributo_console::tui::{self, Tui};
use distributo_console::ui::render;

#[derive(Parser)]
#[command(name = "distributo")]
#[command(version)]
#[command(about = "Terminal admin console for the Distributo task-distribution backend")]
struct Cli {
    /// Directory holding config/console.toml (defaults to the current directory)
    #[arg(short, long, env = "DISTRIBUTO_HOME")]
    workspace: Option<PathBuf>,

    /// Backend base URL, overrides the settings file
    #[arg(long)]
    api_url: Option<String>,

    /// Keep the credential in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Write the effective settings to config/console.toml and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let workspace_root = match cli.workspace {
        Some(path) => path,
        None => env::current_dir().context("failed to resolve working directory")?,
    };

    let mut settings = ConsoleSettings::load(&workspace_root)?;
    if let Some(url) = cli.api_url {
        settings.api.base_url = url;
    }
    if cli.write_config {
        settings.save_to_file(&workspace_root)?;
        println!(
            "Settings written to {}",
            workspace_root.join(distributo_console::config::SETTINGS_FILE).display()
        );
        return Ok(());
    }

    logging::init(&settings, &workspace_root)?;
    info!("Starting console against {}", settings.api.base_url);

    let store: Arc<dyn CredentialStore> = if cli.ephemeral {
        Arc::new(MemoryCredentialStore::new())
    } else {
        Arc::new(FileCredentialStore::new(settings.credential_path()))
    };
    let context = SessionContext::new(store);
    let api: Arc<dyn ConsoleApi> = Arc::new(
        HttpApi::new(&settings.api, context.clone()).context("failed to build API client")?,
    );
    let session = SessionManager::new(context, api.clone());
    session.restore().await;

    let mut app = App::new(session, api);
    let mut terminal = tui::init().context("failed to initialise terminal")?;
    let outcome = run(&mut terminal, &mut app).await;
    tui::restore().context("failed to restore terminal")?;
    if let Err(err) = &outcome {
        error!("Console exited with error: {:#}", err);
    }
    info!("Console closed");
    outcome
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(app.tick_rate());

    while !app.should_quit {
        terminal.draw(|frame| render(frame, app))?;

        // Requests run after the frame that shows their loading state.
        if let Some(action) = app.take_pending() {
            app.run_pending(action).await;
            continue;
        }

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err).context("terminal event stream failed"),
                    None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key),
            Event::Resize => {}
        }
    }
    Ok(())
}
