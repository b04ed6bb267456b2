use boots::app::{App, AppAction};
use boots::backend::{Backend, CommandBackend, DryrunBackend};
use boots::catalog::Catalog;
use boots::config::BootsConfig;
use boots::error::{BootsError, Result};
use boots::event::{Event, EventHandler};
use boots::installer::{InstallerMessage, Orchestrator, ShellIntegration, UiEvent};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "boots")]
#[command(author, version, about = "Pick apps from a catalog and install them with brew, npm and mas")]
struct Args {
    /// Path to config file (default: ~/.config/boots/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog directory, overrides paths.catalog_dir
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Simulate all operations without making real changes
    #[arg(long)]
    dryrun: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install every catalog item that is missing, without the TUI
    Install,
    /// List installed items per category
    Status,
}

type Channels = (
    mpsc::UnboundedReceiver<InstallerMessage>,
    mpsc::UnboundedReceiver<UiEvent>,
);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting boots");
        }
    }

    let mut config = match args.config {
        Some(ref path) => BootsConfig::load_from(path)?,
        None => BootsConfig::load()?,
    };

    // CLI flags override config
    if let Some(catalog) = args.catalog {
        config.paths.catalog_dir = catalog;
    }
    if args.dryrun {
        config.general.dryrun = true;
    }
    let dryrun = config.general.dryrun;

    let backend: Arc<dyn Backend> = if dryrun {
        Arc::new(DryrunBackend::default())
    } else {
        Arc::new(CommandBackend::new(&config.backend, config.paths.config_dir.clone()))
    };

    let mut catalog = Catalog::load(&config.paths.catalog_dir)?;
    tokio::task::block_in_place(|| catalog.refresh_installed(backend.as_ref()));

    if let Some(Command::Status) = args.command {
        print_status(&catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(catalog, backend, msg_tx, ui_tx);
    if !dryrun {
        orchestrator = orchestrator.with_hook(ShellIntegration::new(&config.paths, &config.backend));
    }

    if let Some(Command::Install) = args.command {
        return run_headless(orchestrator, (msg_rx, ui_rx)).await;
    }

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    // Initialize terminal
    let mut terminal = setup_terminal()?;

    let app = App::new(&config.general, orchestrator.catalog(), dryrun);
    let result = run_tui(&mut terminal, app, orchestrator, (msg_rx, ui_rx)).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(ref e) = result {
        error!("boots error: {}", e);
    }

    result.map(|()| ExitCode::SUCCESS)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| BootsError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| BootsError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).map_err(|e| BootsError::Terminal(e.to_string()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| BootsError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| BootsError::Terminal(e.to_string()))?;
    Ok(())
}

async fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: App,
    mut orchestrator: Orchestrator,
    (mut messages, mut ui_events): Channels,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);

    loop {
        while let Ok(event) = ui_events.try_recv() {
            app.apply(event);
        }

        // Draw UI
        terminal
            .draw(|frame| boots::ui::draw(frame, &app))
            .map_err(|e| BootsError::Terminal(e.to_string()))?;

        tokio::select! {
            Some(event) = events.next() => match event {
                Event::Key(key) => {
                    if let Some(action) = app.handle_key(key) {
                        dispatch(&mut orchestrator, &mut app, action);
                    }
                }
                Event::Resize => {}
                Event::Tick => app.tick(),
            },
            Some(message) = messages.recv() => orchestrator.handle_message(message),
            else => break,
        }

        if app.should_exit && !orchestrator.is_running() {
            break;
        }
    }

    info!("Exiting boots");
    Ok(())
}

fn dispatch(orchestrator: &mut Orchestrator, app: &mut App, action: AppAction) {
    let started = match &action {
        AppAction::Toggle(name) => {
            orchestrator.toggle_selection(name);
            return;
        }
        AppAction::SelectAll(category) => {
            orchestrator.select_all(category);
            return;
        }
        AppAction::Cancel => {
            orchestrator.cancel();
            return;
        }
        AppAction::Install => orchestrator.request_install(),
        AppAction::Remove => orchestrator.request_remove(),
        AppAction::Reinstall => orchestrator.request_reinstall(),
    };

    if !started {
        app.nothing_to_do(&action);
    }
}

/// Select everything missing, run one install batch and print its log
async fn run_headless(
    mut orchestrator: Orchestrator,
    (mut messages, mut ui_events): Channels,
) -> Result<ExitCode> {
    let missing: Vec<String> = orchestrator
        .catalog()
        .items()
        .filter(|i| !i.is_installed())
        .map(|i| i.name.clone())
        .collect();
    for name in &missing {
        orchestrator.toggle_selection(name);
    }

    if !orchestrator.request_install() {
        print_log_lines(&mut ui_events);
        println!("Everything is already installed");
        return Ok(ExitCode::SUCCESS);
    }

    let mut failed = 0;
    while orchestrator.is_running() {
        tokio::select! {
            Some(message) = messages.recv() => orchestrator.handle_message(message),
            _ = tokio::signal::ctrl_c() => {
                orchestrator.cancel();
            }
        }
        failed += print_log_lines(&mut ui_events);
    }

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Print pending log lines; returns the failure count of a finished batch
fn print_log_lines(ui_events: &mut mpsc::UnboundedReceiver<UiEvent>) -> usize {
    let mut failed = 0;
    while let Ok(event) = ui_events.try_recv() {
        match event {
            UiEvent::LogLine(line) => println!("{line}"),
            UiEvent::BatchFinished { failed: count, .. } => failed += count,
            _ => {}
        }
    }
    failed
}

fn print_status(catalog: &Catalog) {
    for category in catalog.categories() {
        println!(
            "{} ({}/{} installed)",
            category.display_name(),
            category.installed_count(),
            category.items.len()
        );
        for item in category.items.iter().filter(|i| i.is_installed()) {
            println!("  {} ({})", item.name, item.kind.label());
        }
    }
}
