//! pdfpress - PDF compression driven by Ghostscript with a built-in fallback
//!
//! Main entry point for both the GUI and the command line mode.
//!
//! # Overview
//!
//! This binary runs in one of two modes selected by the arguments:
//! - No `--input` flag: launch the Slint GUI
//! - `--input <file-or-folder>`: run headless and report on stdout
//!
//! The GUI initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (4 worker threads for subprocess execution)
//! - State management ([`StateManager`])
//! - Settings loading ([`ConfigManager`])
//! - GUI controller ([`GuiController`] - bridges Slint UI with business logic)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Handle async operations (Ghostscript subprocess execution, file I/O)
//! - **State listener**: Background std::thread for reactive UI updates
//!
//! # Execution Flow (GUI)
//!
//! 1. Load settings from pdfpress Data/pdfpress-settings.yaml
//! 2. Initialize logging → logs/pdfpress.<date>.log
//! 3. Create tokio runtime with 4 worker threads
//! 4. Create StateManager (Arc<RwLock<AppState>>) and seed it from settings
//! 5. Probe for a Ghostscript binary
//! 6. Create GuiController (wires Slint UI to state and runtime)
//! 7. Start a background Ghostscript install when missing and enabled
//! 8. Run Slint event loop (blocks until window closed)
//! 9. Shutdown tokio runtime with 5s timeout
//!
//! # Exit Codes (CLI mode)
//!
//! - 0: every file compressed successfully
//! - 1: no valid input (bad path, or folder without PDFs)
//! - 2: at least one file failed
//!
//! GUI mode exits 2 when startup fails (settings parse error, no display).
//!
//! # Platform
//!
//! Primary platform: Windows 10/11 (x86_64); the installer flow is
//! Windows-only. Everything else is cross-platform via Slint and tokio.

use anyhow::Result;
use clap::Parser;
use pdfpress::cli::{self, Args};
use pdfpress::ui::GuiController;
use pdfpress::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Args::parse();

    if args.input.is_some() {
        return run_cli(args);
    }

    if let Err(e) = run_gui() {
        // Logging may never have come up; make the failure visible anyway
        eprintln!("pdfpress failed to start: {e:#}");
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("pdfpress")
            .set_description(format!("Failed to start: {e:#}"))
            .show();
        std::process::exit(2);
    }

    Ok(())
}

/// Headless mode: compress the given file or folder and exit.
///
/// Console logging stays off so stdout carries only the report lines;
/// `RUST_LOG` still controls what lands in the log file.
fn run_cli(args: Args) -> Result<()> {
    // Logging is best effort; an unwritable disk must not block compression
    let guard = match pdfpress::logging::setup_logging("logs", "pdfpress", false, false) {
        Ok(g) => Some(g),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    tracing::info!("Starting {} v{} (CLI mode)", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("pdfpress-worker")
        .build()?;

    let exit_code = runtime.block_on(cli::run(args));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("CLI run finished with exit code {}", exit_code);

    // process::exit skips destructors; flush the log writer first
    drop(guard);
    std::process::exit(exit_code);
}

/// GUI mode: the full application lifecycle.
///
/// # Errors
///
/// This function can fail if:
/// - The settings file exists but is not valid YAML
/// - Tokio runtime creation fails (system resources)
/// - Slint UI initialization fails (graphics drivers, display)
/// - GUI encounters a fatal error during execution
fn run_gui() -> Result<()> {
    // Settings are read before logging is up so the debug flag can pick the
    // default log level; tracing events before this point are dropped
    let config_manager = Arc::new(ConfigManager::new("pdfpress Data")?);
    let settings = config_manager.load_settings()?;

    let _guard = match pdfpress::logging::setup_logging(
        "logs",
        "pdfpress",
        settings.settings.debug_mode,
        true,
    ) {
        Ok(g) => Some(g),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Create tokio runtime for async operations
    // This will handle subprocess execution and other I/O operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("pdfpress-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    // Create state manager for application state
    let state_manager = Arc::new(StateManager::new());
    tracing::info!("State manager initialized");

    // Seed state from the settings file
    state_manager.load_from_settings(&settings);
    tracing::info!("Settings loaded into state manager");

    // Probe for Ghostscript before the window opens so the status line is
    // accurate immediately
    let located = pdfpress::services::locate_ghostscript();
    let needs_install = located.is_none() && settings.settings.auto_install_ghostscript;
    state_manager.set_ghostscript_path(located);

    // Create GUI controller
    // This wires up the Slint UI with state management and the tokio runtime
    let gui_controller = GuiController::new(
        state_manager.clone(),
        config_manager.clone(),
        runtime.handle().clone(),
    )?;

    // Missing tool plus the auto-install setting: fetch it in the background
    // while the window opens; the status line follows the state events
    if needs_install {
        let state = state_manager.clone();
        runtime.spawn(async move {
            state.set_installing(true);
            let resolved = pdfpress::services::ensure_installed(true).await;
            if resolved.is_none() {
                tracing::warn!("Ghostscript auto-install did not produce a usable install");
            }
            state.set_ghostscript_path(resolved);
            state.set_installing(false);
        });
    }

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until window is closed)
    // The tokio runtime stays alive in the background to handle async tasks
    let result = gui_controller.run();

    // Clean up after window closes
    tracing::info!("GUI closed, shutting down");

    // A run may still be finishing its current file; the close handler
    // already sent the cancel signal
    if state_manager.read(|s| s.is_running) {
        tracing::warn!("Window closed during a run - giving the current file a moment to finish");
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    // Shutdown the tokio runtime gracefully
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
