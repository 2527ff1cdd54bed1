//! # Picker CLI Entry Point
//!
//! This is the main entry point for the Picker TUI application.
//!
//! ## Overview
//!
//! Picker shows a remote catalog in two panes: items still available on the
//! left, the user's ordered selection on the right. Both panes page in more
//! items as you scroll, filter server-side, and stay in sync with the
//! catalog service and with the selection order saved on disk.
//!
//! ## Usage
//!
//! ```bash
//! # Talk to the service from the config file (default http://localhost:3001/api)
//! picker
//!
//! # Use another service
//! picker --api-url http://catalog.local:8080/api
//!
//! # No service: an in-memory catalog with 500 items
//! picker --offline 500
//!
//! # Debug mode - mount, print the first pages and exit
//! picker --debug
//!
//! # Write the effective configuration to ~/.config/picker/config.json
//! picker --init-config
//! ```
//!
//! ## Key Bindings
//!
//! - `q` / `Q` - Quit the application
//! - `Tab` - Switch pane
//! - `j` / `Down`, `k` / `Up` - Move the cursor
//! - `g` / `G` - Jump to top / bottom
//! - `Enter` - Select (left) or deselect (right) the item under the cursor
//! - `/` - Edit the focused pane's filter
//! - `a` - Add a catalog item by id
//! - `m` - Pick up the item under the cursor (right pane); `m` / `Enter`
//!   on another row drops it there, `Esc` cancels
//! - `r` - Reload the focused pane
//!
//! ## Logging
//!
//! The terminal belongs to the UI, so logs go to `picker.log` in the data
//! directory (or `--log-file`). Set `RUST_LOG` to change the level.

use picker::api::{CatalogApi, HttpCatalogClient, InMemoryCatalog};
use picker::persist::{get_storage_dir, FileOrderStore, OrderStore};
use picker::sync::{PaneKind, PaneState, ReorderOutcome, Workspace};
use picker::ui::{self, App, Command, Config, StatusLine};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "picker.log";

/// Items in the in-memory catalog when `--offline` is given without a count
const DEFAULT_OFFLINE_ITEMS: &str = "100";

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// Picker - select and order items from a remote catalog
#[derive(Parser, Debug)]
#[command(name = "picker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Two-pane item picker for a remote catalog", long_about = None)]
struct Args {
    /// Base URL of the catalog service (overrides the config file)
    #[arg(long, value_name = "URL", conflicts_with = "offline")]
    api_url: Option<String>,

    /// Items requested per page (overrides the config file)
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Use an in-memory catalog with N items instead of the service
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = DEFAULT_OFFLINE_ITEMS
    )]
    offline: Option<u64>,

    /// File the selection order is saved to
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// File logs are written to
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    init_config: bool,

    /// Mount, print the first page of both panes and exit
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Try to restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);

        // Call the original panic hook
        original_hook(panic_info);
    }));

    // Run the application and ensure cleanup happens
    let result = run_application(args).await;

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

/// Send `tracing` output to a log file. A second call is a no-op.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Config file values with command-line overrides applied
fn effective_config(args: &Args) -> Config {
    let mut config = Config::load();
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    config
}

fn build_api(args: &Args, config: &Config) -> Arc<dyn CatalogApi> {
    match args.offline {
        Some(count) => {
            info!(count, "using in-memory catalog");
            Arc::new(InMemoryCatalog::seeded(count))
        }
        None => {
            info!(url = %config.api_url, "using catalog service");
            Arc::new(HttpCatalogClient::new(config.api_url.clone()))
        }
    }
}

fn build_store(args: &Args) -> Result<Arc<dyn OrderStore>> {
    let store = match &args.state_file {
        Some(path) => FileOrderStore::at(path.clone()),
        None => FileOrderStore::new()?,
    };
    info!(path = %store.path().display(), "selection order file");
    Ok(Arc::new(store))
}

async fn run_application(args: Args) -> Result<()> {
    let log_path = match &args.log_file {
        Some(path) => path.clone(),
        None => get_storage_dir()?.join(LOG_FILE_NAME),
    };
    init_logging(&log_path)?;

    let config = effective_config(&args);

    if args.init_config {
        let path = config.save()?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let api = build_api(&args, &config);
    let store = build_store(&args)?;
    let workspace = Arc::new(Workspace::new(api, store, config.workspace_settings()));

    let report = workspace.mount().await;
    info!(?report, "mounted");

    // Debug mode: print what was loaded and exit
    if args.debug {
        println!("=== Mount ===");
        match report.restored {
            Some(len) => println!(
                "  Saved order: {} ids (re-asserted: {})",
                len, report.reasserted
            ),
            None => println!("  Saved order: none"),
        }
        for kind in [PaneKind::Available, PaneKind::Selected] {
            let state = workspace.pane(kind).snapshot();
            let ids: Vec<String> = state.items.iter().map(|i| i.id.to_string()).collect();
            println!("\n=== {} ===", kind);
            println!("  Loaded: {} of {}", state.len(), state.total);
            println!("  Ids: {}", ids.join(", "));
        }
        println!("\n  Available load: {:?}", report.available);
        println!("  Selected load: {:?}", report.selected);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(config.sensor_threshold);

    // Run the app and ensure cleanup happens even on error
    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(&mut terminal, &mut app, &workspace, &mut event_reader).await;

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Copy a pane's published state into the app if it changed.
fn pull_pane(app: &mut App, kind: PaneKind, rx: &mut watch::Receiver<PaneState>) {
    if rx.has_changed().unwrap_or(false) {
        let state = rx.borrow_and_update().clone();
        app.update_pane(kind, state);
    }
}

/// Carry out a command. Adding an item is awaited so its outcome shows
/// before the next key is read; everything else runs in the background and
/// reports failures through `status`.
async fn dispatch(
    command: Command,
    workspace: &Arc<Workspace>,
    status: &mpsc::UnboundedSender<StatusLine>,
) {
    match command {
        Command::AddItem(input) => {
            let line = match workspace.add_item(&input).await {
                Ok(id) => StatusLine::info(format!("Added item {}", id)),
                Err(e) => StatusLine::error(e.to_string()),
            };
            let _ = status.send(line);
        }
        Command::SetFilter(kind, text) => {
            workspace.pane(kind).set_filter(&text);
        }
        Command::Select(item) => {
            let workspace = workspace.clone();
            let status = status.clone();
            tokio::spawn(async move {
                if let Err(e) = workspace.select(item).await {
                    let _ = status.send(StatusLine::error(format!(
                        "Could not select item {}: {}",
                        item.id,
                        e.user_message()
                    )));
                }
            });
        }
        Command::Deselect(item) => {
            let workspace = workspace.clone();
            let status = status.clone();
            tokio::spawn(async move {
                if let Err(e) = workspace.deselect(item).await {
                    let _ = status.send(StatusLine::error(format!(
                        "Could not deselect item {}: {}",
                        item.id,
                        e.user_message()
                    )));
                }
            });
        }
        Command::Reorder(gesture) => {
            let workspace = workspace.clone();
            tokio::spawn(async move {
                if let ReorderOutcome::Abandoned { rolled_back } =
                    workspace.reorder(gesture).await
                {
                    warn!(?gesture, rolled_back, "reorder did not apply");
                }
            });
        }
        Command::NextPage(kind) => {
            let pane = workspace.pane(kind).clone();
            tokio::spawn(async move {
                pane.request_next_page().await;
            });
        }
        Command::Refresh(kind) => {
            let pane = workspace.pane(kind).clone();
            tokio::spawn(async move {
                pane.refresh().await;
            });
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    workspace: &Arc<Workspace>,
    event_reader: &mut dyn EventReader,
) -> Result<()> {
    let mut available_rx = workspace.available().subscribe();
    let mut selected_rx = workspace.selected().subscribe();
    app.update_pane(PaneKind::Available, workspace.available().snapshot());
    app.update_pane(PaneKind::Selected, workspace.selected().snapshot());

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();

    loop {
        pull_pane(app, PaneKind::Available, &mut available_rx);
        pull_pane(app, PaneKind::Selected, &mut selected_rx);
        while let Ok(status) = status_rx.try_recv() {
            app.set_status(status);
        }

        let mut list_height = 0;
        terminal
            .draw(|f| {
                list_height = ui::render::list_height(f.area());
                ui::render(f, app);
            })
            .context("Failed to draw terminal UI")?;
        app.set_list_height(list_height);

        for command in app.poll_sensors() {
            dispatch(command, workspace, &status_tx).await;
        }

        // Short timeout so background loads show up promptly
        let event = event_reader.read_event(Duration::from_millis(50))?;

        if let Some(Event::Key(key)) = event {
            if key.kind == KeyEventKind::Press {
                if let Some(command) = app.handle_key(key) {
                    dispatch(command, workspace, &status_tx).await;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
