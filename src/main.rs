mod app;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{AppConfig, FilterConfig, GeneralConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::fs::adapter::OsAdapter;
use crate::fs::filter::resolve_filter;
use crate::theme::resolve_theme;
use crate::tui::{install_panic_hook, Tui};

/// A lazy-loading filesystem tree browser TUI.
#[derive(Parser, Debug)]
#[command(name = "lazytree", version, about)]
struct Cli {
    /// Root directory to browse (defaults to the platform filesystem roots)
    path: Option<PathBuf>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show only files (directories are filtered out)
    #[arg(long, conflicts_with = "dirs_only")]
    files_only: bool,

    /// Show only directories
    #[arg(long)]
    dirs_only: bool,

    /// Regular expression entry names must fully match
    #[arg(long)]
    pattern: Option<String>,

    /// Allowed file extension (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Keep listings in adapter order instead of sorting by name
    #[arg(long)]
    no_sort: bool,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Write tracing logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Partial config derived from CLI flags; merged on top of file config.
    fn overrides(&self) -> AppConfig {
        let kind = if self.files_only {
            Some("files".to_string())
        } else if self.dirs_only {
            Some("dirs".to_string())
        } else {
            None
        };
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                log_file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string()),
            },
            filter: FilterConfig {
                kind,
                pattern: self.pattern.clone(),
                extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
            },
            tree: TreeConfig {
                sorted: self.no_sort.then_some(false),
                use_icons: None,
            },
            theme: Default::default(),
        }
    }
}

/// Route tracing output to a file; the terminal is owned by the TUI.
fn init_tracing(log_file: Option<&str>) -> error::Result<()> {
    let Some(path) = log_file else { return Ok(()) };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lazytree=debug")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides();
    let config = AppConfig::load(cli.config.as_deref(), Some(&overrides));

    init_tracing(config.log_file())?;

    // An invalid pattern is a configuration error; fail before the terminal
    // is put into raw mode.
    let filter = resolve_filter(&config.filter)?;

    let (adapter, title) = match &cli.path {
        Some(path) => {
            let path = path.canonicalize().map_err(|_| {
                error::AppError::InvalidPath(format!("{} does not exist", path.display()))
            })?;
            if !path.is_dir() {
                return Err(error::AppError::InvalidPath(format!(
                    "{} is not a directory",
                    path.display()
                )));
            }
            let title = path.display().to_string();
            (OsAdapter::rooted_at(path, config.sorted()), title)
        }
        None => (OsAdapter::system(config.sorted()), "File System".to_string()),
    };

    let theme = resolve_theme(&config.theme);

    install_panic_hook();

    let mut tui = Tui::enter(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let mut app = App::new(
        Arc::new(adapter),
        filter,
        title,
        theme,
        config.use_icons(),
        events.sender(),
    );
    app.open_roots();

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.tick(),
            Event::Resize(_, _) => {}
            Event::Fetch(outcome) => app.handle_fetch(outcome),
        }

        if app.should_quit {
            break;
        }
    }

    tui.exit()?;
    Ok(())
}
