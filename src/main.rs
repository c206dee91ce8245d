mod app;
mod components;
mod config;
mod editor;
mod error;
mod event;
mod handler;
mod logging;
mod prefs;
mod sync;
mod theme;
mod tree;
mod tui;
mod ui;
mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, ServerConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::prefs::Prefs;
use crate::sync::{HttpTransport, SyncClient};
use crate::tui::{install_panic_hook, Tui};

/// How long to wait for outstanding writes on quit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Browse and edit the markdown notes of a remote document store.
#[derive(Parser, Debug)]
#[command(name = "nt", version, about)]
struct Cli {
    /// Note to open once the tree has loaded, relative to the store root
    file: Option<String>,

    /// Base URL of the document store (overrides config)
    #[arg(long, short)]
    server: Option<String>,

    /// Path to a config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,

    /// Where to write the log (defaults to the platform data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// The subset of config the flags override.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
            },
            server: ServerConfig {
                url: self.server.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    logging::init(&logging::resolve_log_file(cli.log_file.clone())?)?;
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    info!(server = config.server_url(), "starting");

    let transport = HttpTransport::new(config.server_url(), config.request_timeout())
        .map_err(|e| AppError::Config(format!("cannot reach {}: {}", config.server_url(), e)))?;
    let client = SyncClient::new(Arc::new(transport));
    let prefs = Prefs::load(
        Prefs::default_path(),
        config.sidebar_bounds(),
        config.sidebar_default_width(),
    );

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(&config, client, prefs, events.sender());
    app.initial_file = cli.file.clone();
    app.request_tree();

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::Sync(sync) => app.apply_sync(sync),
        }

        if app.should_quit {
            break;
        }
    }

    let writes = app.flush_writes();
    if !writes.is_empty() {
        info!(count = writes.len(), "flushing pending writes");
        let all = async {
            for write in writes {
                let _ = write.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, all).await.is_err() {
            warn!("gave up waiting for pending writes");
        }
    }

    tui.restore()?;
    info!("exiting");
    Ok(())
}
