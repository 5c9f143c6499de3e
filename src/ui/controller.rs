// GUI Controller - Bridges Slint UI with Rust State Management
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (application state)
// - CompressionService (business logic)
// - EventLoopBridge (async/GUI coordination)
//
// It handles:
// - Setting up UI callbacks → async tasks
// - Subscribing to state changes → UI updates
// - File browser dialogs
// - Compression orchestration

use crate::config::ConfigManager;
use crate::models::{
    AppState, EngineChoice, MAX_CONCURRENT_COMPRESSIONS, QualityPreset, percent_saved,
};
use crate::services::{
    CompressionService, default_output_path_for, ensure_installed, locate_ghostscript,
};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::{EventLoopBridge, EventLoopBridgeHandle};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use slint::{Model, ModelRc, SharedString, StandardListViewItem, VecModel};
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};

// Include the generated Slint code
slint::include_modules!();

/// GUI Controller that wires up the Slint UI with application state and logic
///
/// This is the main coordinator for the GUI layer. It:
/// - Creates and manages the EventLoopBridge for tokio/Slint coordination
/// - Sets up Slint callbacks to trigger async operations
/// - Subscribes to StateManager events and updates UI accordingly
/// - Handles file browser dialogs using the `rfd` crate
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let config_manager = Arc::new(ConfigManager::new("pdfpress Data")?);
/// let runtime = tokio::runtime::Runtime::new()?;
///
/// let controller = GuiController::new(
///     state_manager,
///     config_manager,
///     runtime.handle().clone()
/// )?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    _bridge: EventLoopBridge<MainWindow>,

    /// Shared state manager
    state_manager: Arc<StateManager>,

    /// Configuration manager for loading/saving the YAML settings file
    _config_manager: Arc<ConfigManager>,

    /// Cancellation sender for graceful shutdown
    /// Send `true` to stop the run after the file currently being compressed
    cancel_tx: watch::Sender<bool>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared application state manager
    /// * `config_manager` - Configuration manager for loading/saving the settings file
    /// * `tokio_handle` - Handle to the tokio runtime for spawning async tasks
    ///
    /// # Returns
    /// A new GuiController ready to run
    pub fn new(
        state_manager: Arc<StateManager>,
        config_manager: Arc<ConfigManager>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        // Create the Slint UI
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        // Create the event loop bridge
        let bridge = EventLoopBridge::new(&ui, tokio_handle);

        // Create cancellation channel; the start callback resets it per run
        let (cancel_tx, _cancel_rx) = watch::channel(false);

        // Initialize UI with current state
        Self::sync_ui_with_state(&ui, &state_manager);

        // Set up Slint callbacks
        Self::setup_callbacks(&ui, &bridge, &state_manager, &config_manager, &cancel_tx);

        // Subscribe to state changes and update UI
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            state_manager,
            _config_manager: config_manager,
            cancel_tx,
        })
    }

    /// Run the GUI (blocks until window is closed)
    ///
    /// This starts the Slint event loop and blocks until the user closes the window.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Request graceful cancellation of an ongoing run
    ///
    /// Sends the cancellation signal through the watch channel. The workflow
    /// honors it between files: the file currently being compressed always
    /// finishes, remaining files are skipped.
    pub fn request_cancel(&self) {
        tracing::info!("Cancellation requested via watch channel");
        let _ = self.cancel_tx.send(true);
        self.state_manager.update(|s| {
            s.current_operation = "Cancelling - finishing current file...".to_string();
        });
    }

    /// Synchronize UI with current state
    ///
    /// This is called once at startup to initialize the UI with the current state.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        // File list and log models
        let files: Vec<String> = state.files.iter().map(|p| p.to_string()).collect();
        ui.set_file_list(Self::file_list_model(&files));
        ui.set_log_lines(ModelRc::new(VecModel::<SharedString>::default()));

        // Run configuration
        ui.set_quality_index(Self::quality_index(state.quality));
        ui.set_engine_index(Self::engine_index(state.engine));
        ui.set_output_dir_text(Self::output_dir_text(state.output_dir.as_deref()).into());
        ui.set_show_extreme_hint(Self::extreme_hint(&state));

        // Ghostscript status
        ui.set_ghostscript_available(state.ghostscript_path.is_some());
        ui.set_ghostscript_status(
            Self::ghostscript_status_text(state.ghostscript_path.as_deref()).into(),
        );
        ui.set_is_installing(state.is_installing);

        // Run state
        ui.set_is_running(state.is_running);
        ui.set_progress_current(state.progress as i32);
        ui.set_progress_total(state.total_files as i32);
        ui.set_progress_text(format!("{} / {}", state.progress, state.total_files).into());
        ui.set_current_operation(state.current_operation.clone().into());
        ui.set_status_message(Self::get_status_message(&state).into());

        tracing::debug!("UI synchronized with initial state");
    }

    /// Set up Slint UI callbacks
    ///
    /// This connects Slint UI events (button clicks, etc.) to Rust logic.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        config_manager: &Arc<ConfigManager>,
        cancel_tx: &watch::Sender<bool>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let state_manager_clone = Arc::clone(state_manager);
        let cancel_tx_clone = cancel_tx.clone();
        let ui_weak_for_start = ui.as_weak();

        // Start compression callback
        ui.on_start_compression(move || {
            tracing::info!("Start button clicked");

            if !state_manager_clone.read(|s| s.can_start()) {
                let reason = state_manager_clone.read(|s| {
                    if s.files.is_empty() {
                        "Add at least one PDF file first."
                    } else if s.is_installing {
                        "Wait for the Ghostscript install to finish."
                    } else {
                        "A run is already in progress."
                    }
                });
                Self::show_error_dialog(&ui_weak_for_start, "Cannot Start", reason, "");
                return;
            }

            // A cancelled run leaves the flag set; clear it for this run
            let _ = cancel_tx_clone.send(false);
            let cancel_rx = cancel_tx_clone.subscribe();

            // Clone for async task
            let bridge = bridge_handle.clone();
            let bridge_clone = bridge.clone();
            let state = Arc::clone(&state_manager_clone);

            // Spawn the async compression workflow
            bridge.spawn_async(move || async move {
                if let Err(e) =
                    Self::run_compression_workflow(state, bridge_clone.clone(), cancel_rx).await
                {
                    tracing::error!("Compression workflow error: {}", e);

                    Self::report_error(
                        &bridge_clone,
                        "Compression Failed",
                        "An error occurred during the compression run.",
                        format!("{:?}", e),
                    );
                }
            });
        });

        let state = state_manager.clone();
        let cancel_tx_clone = cancel_tx.clone();

        // Cancel callback - stop after the current file
        ui.on_cancel_compression(move || {
            tracing::info!("Cancel button clicked - run stops after the current file");

            let _ = cancel_tx_clone.send(true);
            state.update(|s| {
                s.current_operation = "Cancelling - finishing current file...".to_string();
            });
        });

        let state = state_manager.clone();

        // Add files via native multi-select picker
        ui.on_add_files(move || {
            tracing::debug!("Add files clicked");

            let picked = Self::show_files_picker("Select PDF Files", vec![("PDF files", &["pdf"])]);
            if !picked.is_empty() {
                tracing::info!("Adding {} file(s) from picker", picked.len());
                state.add_files(picked);
            }
        });

        let state = state_manager.clone();

        // Add every PDF in a folder (non-recursive)
        ui.on_add_folder(move || {
            tracing::debug!("Add folder clicked");

            if let Some(folder) = Self::show_folder_picker("Select Folder") {
                let found = crate::cli::collect_pdfs(&folder);
                if found.is_empty() {
                    tracing::info!("No PDF files found in {}", folder);
                } else {
                    tracing::info!("Adding {} PDF(s) from {}", found.len(), folder);
                }
                state.add_files(found);
            }
        });

        let state = state_manager.clone();
        let ui_weak = ui.as_weak();

        // Remove the selected file
        ui.on_remove_selected(move || {
            if let Some(ui) = ui_weak.upgrade() {
                let index = ui.get_selected_file_index();
                if index >= 0 {
                    tracing::debug!("Removing file at index {}", index);
                    state.remove_files_at(&[index as usize]);
                    ui.set_selected_file_index(-1);
                }
            }
        });

        let state = state_manager.clone();

        // Clear the whole queue
        ui.on_clear_files(move || {
            tracing::debug!("Clear all clicked");
            state.update(|s| {
                s.files.clear();
            });
        });

        let state = state_manager.clone();
        let config = Arc::clone(config_manager);

        // Quality preset changed
        ui.on_quality_selected(move |index| {
            let quality = Self::quality_from_index(index);
            tracing::info!("Quality preset changed: {}", quality);
            state.update_settings(|s| {
                s.quality = quality;
            });
            Self::persist_settings(&state, &config);
        });

        let state = state_manager.clone();
        let config = Arc::clone(config_manager);

        // Engine choice changed
        ui.on_engine_selected(move |index| {
            let engine = Self::engine_from_index(index);
            tracing::info!("Engine changed: {}", engine);
            state.update_settings(|s| {
                s.engine = engine;
            });
            Self::persist_settings(&state, &config);
        });

        let state = state_manager.clone();
        let config = Arc::clone(config_manager);

        // Browse output folder
        ui.on_browse_output_dir(move || {
            tracing::debug!("Browse output folder clicked");

            if let Some(folder) = Self::show_folder_picker("Select Output Folder") {
                tracing::info!("Output folder selected: {}", folder);
                state.update_settings(|s| {
                    s.output_dir = Some(folder);
                });
                Self::persist_settings(&state, &config);
            }
        });

        let state = state_manager.clone();
        let config = Arc::clone(config_manager);

        // Back to "same folder as each source"
        ui.on_reset_output_dir(move || {
            tracing::debug!("Output folder reset");
            state.update_settings(|s| {
                s.output_dir = None;
            });
            Self::persist_settings(&state, &config);
        });

        let state = state_manager.clone();

        // Re-probe for a Ghostscript binary
        ui.on_refresh_ghostscript(move || {
            tracing::info!("Refresh Ghostscript clicked");

            let found = locate_ghostscript();
            match &found {
                Some(path) => tracing::info!("Ghostscript found at {}", path),
                None => tracing::info!("Ghostscript not found"),
            }
            state.set_ghostscript_path(found);
        });

        let bridge_handle = bridge.clone_handle();
        let state = state_manager.clone();

        // Download and run the Ghostscript installer
        ui.on_install_ghostscript(move || {
            tracing::info!("Install Ghostscript clicked");

            if state.read(|s| s.is_installing) {
                return;
            }
            state.set_installing(true);

            let bridge = bridge_handle.clone();
            let bridge_clone = bridge.clone();
            let state_clone = state.clone();

            bridge.spawn_async(move || async move {
                let installed = ensure_installed(true).await;
                state_clone.set_ghostscript_path(installed.clone());
                state_clone.set_installing(false);

                match installed {
                    Some(path) => {
                        tracing::info!("Ghostscript install finished: {}", path);
                        Self::report_message(
                            &bridge_clone,
                            "Install Complete",
                            format!("Ghostscript is ready at {}", path),
                        );
                    }
                    None => {
                        tracing::warn!("Ghostscript install did not produce a usable binary");
                        Self::report_error(
                            &bridge_clone,
                            "Install Failed",
                            "Could not download or run the Ghostscript installer.",
                            "Check the log file for details.",
                        );
                    }
                }
            });
        });

        let ui_weak = ui.as_weak();

        // Error dialog dismissed
        ui.on_error_dialog_dismissed(move || {
            tracing::debug!("Error dialog dismissed");

            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_error_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();

        // Message dialog dismissed
        ui.on_message_dialog_dismissed(move || {
            tracing::debug!("Message dialog dismissed");

            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_message_dialog(false);
            }
        });

        let state = state_manager.clone();
        let cancel_tx_clone = cancel_tx.clone();
        let ui_weak = ui.as_weak();

        // Close confirmation - user wants to quit during a run
        ui.on_close_confirmation_proceed(move || {
            tracing::info!("User confirmed exit during a run - cancelling after current file");

            let _ = cancel_tx_clone.send(true);
            state.update(|s| {
                s.current_operation = "Cancelling - finishing current file...".to_string();
            });

            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_close_confirmation(false);
                ui.window().hide().ok();
            }
        });

        let ui_weak = ui.as_weak();

        // Close confirmation - user wants to keep the run going
        ui.on_close_confirmation_cancelled(move || {
            tracing::info!("User cancelled exit - run continues");

            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_close_confirmation(false);
            }
        });

        // Window close event handler
        let state = state_manager.clone();
        let ui_weak = ui.as_weak();

        ui.window().on_close_requested(move || {
            let is_running = state.read(|s| s.is_running);

            if is_running {
                tracing::info!("Close requested during a run - showing confirmation dialog");

                if let Some(ui) = ui_weak.upgrade() {
                    ui.set_show_close_confirmation(true);
                }

                // Prevent window from closing - user must confirm
                slint::CloseRequestResponse::KeepWindowShown
            } else {
                tracing::info!("Close requested - allowing window to close");

                slint::CloseRequestResponse::HideWindow
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update UI accordingly
    ///
    /// This spawns a background thread that listens for state change events
    /// and updates the Slint UI via the EventLoopBridge.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let state_manager_clone = Arc::clone(state_manager);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);

                        match change {
                            StateChange::FileListChanged { count } => {
                                tracing::debug!("File list changed: {} file(s)", count);

                                let files: Vec<String> = state_manager_clone
                                    .read(|s| s.files.iter().map(|p| p.to_string()).collect());
                                let status = Self::get_status_message(
                                    &state_manager_clone.snapshot(),
                                );

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_file_list(Self::file_list_model(&files));
                                    ui.set_selected_file_index(-1);
                                    ui.set_status_message(status.into());
                                });
                            }

                            StateChange::GhostscriptStatusChanged { path } => {
                                tracing::debug!("Ghostscript status changed: {:?}", path);

                                let hint =
                                    Self::extreme_hint(&state_manager_clone.snapshot());

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_ghostscript_available(path.is_some());
                                    ui.set_ghostscript_status(
                                        Self::ghostscript_status_text(path.as_deref()).into(),
                                    );
                                    ui.set_show_extreme_hint(hint);
                                });
                            }

                            StateChange::RunStarted { total_files } => {
                                tracing::info!("Run started: {} file(s)", total_files);

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_running(true);
                                    ui.set_progress_current(0);
                                    ui.set_progress_total(total_files as i32);
                                    ui.set_progress_text(format!("0 / {}", total_files).into());
                                    ui.set_log_lines(ModelRc::new(
                                        VecModel::<SharedString>::default(),
                                    ));
                                    ui.set_status_message("Starting compression...".into());
                                });
                            }

                            StateChange::RunFinished { succeeded, failed } => {
                                tracing::info!(
                                    "Run finished: {} succeeded, {} failed",
                                    succeeded,
                                    failed
                                );

                                let (savings, total_files) = state_manager_clone
                                    .read(|s| (s.savings_summary(), s.total_files));

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_running(false);
                                    ui.set_current_operation("".into());

                                    let processed = succeeded + failed;
                                    let mut status = if failed > 0 {
                                        format!(
                                            "Completed with errors: {} succeeded, {} failed",
                                            succeeded, failed
                                        )
                                    } else {
                                        format!("Completed: {} file(s) compressed", succeeded)
                                    };
                                    if processed < total_files {
                                        status = format!(
                                            "{} ({} skipped after cancel)",
                                            status,
                                            total_files - processed
                                        );
                                    }
                                    if !savings.is_empty() {
                                        status = format!("{} - {}", status, savings);
                                    }

                                    ui.set_status_message(status.clone().into());
                                    ui.set_message_title("Compression Complete".into());
                                    ui.set_message_text(status.into());
                                    ui.set_show_message_dialog(true);
                                });
                            }

                            StateChange::FileProcessed { file, ok, message } => {
                                tracing::debug!(
                                    "File processed: {} ok={} ({})",
                                    file,
                                    ok,
                                    message
                                );

                                let line = if ok {
                                    format!("OK: {} - {}", file, message)
                                } else {
                                    format!("FAIL: {} - {}", file, message)
                                };

                                bridge_handle.update_ui(move |ui| {
                                    Self::append_log_line(&ui, line);
                                });
                            }

                            StateChange::ProgressUpdated {
                                current,
                                total,
                                current_file,
                            } => {
                                let state_snapshot = state_manager_clone.snapshot();

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_progress_current(current as i32);
                                    ui.set_progress_total(total as i32);
                                    ui.set_progress_text(
                                        format!("{} / {}", current, total).into(),
                                    );

                                    if current_file.is_some() {
                                        ui.set_status_message(
                                            Self::get_status_message(&state_snapshot).into(),
                                        );
                                    }
                                });
                            }

                            StateChange::OperationChanged { operation } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_current_operation(operation.into());
                                });
                            }

                            StateChange::InstallStateChanged { installing } => {
                                tracing::info!("Ghostscript install state: {}", installing);

                                let status = Self::get_status_message(
                                    &state_manager_clone.snapshot(),
                                );

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_installing(installing);
                                    ui.set_status_message(status.into());
                                });
                            }

                            StateChange::SettingsChanged => {
                                tracing::debug!("Settings changed");

                                let state_snapshot = state_manager_clone.snapshot();

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_quality_index(Self::quality_index(
                                        state_snapshot.quality,
                                    ));
                                    ui.set_engine_index(Self::engine_index(
                                        state_snapshot.engine,
                                    ));
                                    ui.set_output_dir_text(
                                        Self::output_dir_text(
                                            state_snapshot.output_dir.as_deref(),
                                        )
                                        .into(),
                                    );
                                    ui.set_show_extreme_hint(Self::extreme_hint(
                                        &state_snapshot,
                                    ));
                                });
                            }

                            StateChange::StateReset => {
                                tracing::info!("State reset");

                                bridge_handle.update_ui(|ui| {
                                    ui.set_is_running(false);
                                    ui.set_progress_current(0);
                                    ui.set_progress_total(0);
                                    ui.set_progress_text("0 / 0".into());
                                    ui.set_current_operation("".into());
                                    ui.set_log_lines(ModelRc::new(
                                        VecModel::<SharedString>::default(),
                                    ));
                                });
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!(
                            "State broadcast channel closed - shutting down subscription thread"
                        );
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "State subscription lagged - {} events were skipped. Consider increasing broadcast buffer size.",
                            skipped
                        );
                        // Continue receiving - this is a recoverable error
                    }
                }
            }

            tracing::debug!("State subscription thread terminated gracefully");
        });
    }

    // ===== Compression Orchestration =====

    /// Run the complete compression workflow
    ///
    /// This is the main orchestration method that:
    /// 1. Snapshots the queue and run configuration from state
    /// 2. Resolves Ghostscript (auto-installing it when configured to)
    /// 3. Compresses each file sequentially, resolving a collision-free output path per file
    /// 4. Records per-file results and size deltas in state
    /// 5. Honors cancellation between files - a started file always finishes
    async fn run_compression_workflow(
        state: Arc<StateManager>,
        bridge: EventLoopBridgeHandle<MainWindow>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        tracing::info!("Starting compression workflow");

        let (files, output_dir, quality, engine, timeout, auto_install) = state.read(|s| {
            (
                s.files.iter().cloned().collect::<Vec<_>>(),
                s.output_dir.clone(),
                s.quality,
                s.engine,
                s.ghostscript_timeout,
                s.auto_install_ghostscript,
            )
        });

        if files.is_empty() {
            tracing::warn!("No files to compress");
            bridge.update_ui(|ui| {
                ui.set_current_operation("No files to compress".into());
            });
            return Ok(());
        }

        // Resolve Ghostscript up front when the engine may want it. A failed
        // install is not fatal: auto falls back to the basic engine per file.
        let gs_path = if engine.may_use_ghostscript() {
            let mut resolved = locate_ghostscript();
            if resolved.is_none() && auto_install {
                tracing::info!("Ghostscript missing - attempting automatic install");
                state.set_installing(true);
                resolved = ensure_installed(true).await;
                state.set_installing(false);
            }
            state.set_ghostscript_path(resolved.clone());
            resolved
        } else {
            None
        };

        state.start_run();

        let service = CompressionService::new(timeout);

        // Semaphore with 1 permit keeps compressions serial even if the loop
        // below ever grows concurrent callers
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_COMPRESSIONS));
        let total = files.len();

        tracing::info!(
            "Compressing {} file(s) with {} quality (engine: {})",
            total,
            quality,
            engine
        );

        for (index, input) in files.iter().enumerate() {
            // Cancellation is honored between files only; a file that has
            // started always runs to completion
            if *cancel_rx.borrow() {
                tracing::warn!("Run cancelled - {} of {} file(s) processed", index, total);
                break;
            }

            let _permit = semaphore.acquire().await.unwrap();

            let file_name = input.file_name().unwrap_or(input.as_str()).to_string();

            tracing::info!("Compressing file {} of {}: {}", index + 1, total, input);
            state.update_progress(file_name.clone(), format!("Compressing {}...", file_name));

            let dest = default_output_path_for(input, output_dir.as_deref());

            let result = match engine {
                EngineChoice::Auto => {
                    service
                        .auto_with(gs_path.clone(), input, &dest, quality)
                        .await
                }
                _ => service.compress(engine, input, &dest, quality).await,
            };

            let sizes = result.size_delta();
            let message = match (result.ok, sizes) {
                (true, Some((before, after))) => format!(
                    "{} ({:.1} KB -> {:.1} KB, saved {:.1}%)",
                    result.message,
                    before as f64 / 1024.0,
                    after as f64 / 1024.0,
                    percent_saved(before, after),
                ),
                _ => result.message.clone(),
            };

            if result.ok {
                tracing::info!("{} -> {} ({})", input, dest, message);
            } else {
                tracing::error!("{} failed: {}", input, message);
            }

            state.add_file_result(file_name, result.ok, message, sizes);
        }

        let cancelled = *cancel_rx.borrow();
        state.stop_run();

        tracing::info!("Compression workflow completed (cancelled: {})", cancelled);

        bridge.update_ui(move |ui| {
            let op = if cancelled {
                "Run cancelled"
            } else {
                "Compression finished"
            };
            ui.set_current_operation(op.into());
        });

        Ok(())
    }

    // ===== UI Helpers =====

    /// Generate contextual status message based on current state
    ///
    /// Returns a user-friendly status message that reflects the current application state.
    fn get_status_message(state: &AppState) -> String {
        if state.is_installing {
            "Installing Ghostscript...".to_string()
        } else if state.is_running {
            match &state.current_file {
                Some(file) => format!(
                    "Compressing {} ({}/{})",
                    file,
                    state.progress + 1,
                    state.total_files
                ),
                None => "Starting compression...".to_string(),
            }
        } else if state.files.is_empty() {
            "Add PDF files to get started".to_string()
        } else {
            let gs_note = if state.engine.may_use_ghostscript() && state.ghostscript_path.is_none()
            {
                " - Ghostscript not found, basic engine will be used"
            } else {
                ""
            };
            format!("Ready - {} file(s) queued{}", state.files.len(), gs_note)
        }
    }

    /// Whether to surface the extreme-without-Ghostscript hint.
    fn extreme_hint(state: &AppState) -> bool {
        state.quality == QualityPreset::Extreme
            && state.engine.may_use_ghostscript()
            && state.ghostscript_path.is_none()
    }

    fn ghostscript_status_text(path: Option<&Utf8Path>) -> String {
        match path {
            Some(p) => format!("Ghostscript: {}", p),
            None => "Ghostscript: not found".to_string(),
        }
    }

    fn output_dir_text(output_dir: Option<&Utf8Path>) -> String {
        match output_dir {
            Some(dir) => dir.to_string(),
            None => "Same folder as each source".to_string(),
        }
    }

    /// ComboBox index for a preset; the .slint model lists presets in the
    /// same order as `QualityPreset::ALL`.
    fn quality_index(quality: QualityPreset) -> i32 {
        QualityPreset::ALL
            .iter()
            .position(|q| *q == quality)
            .map(|i| i as i32)
            .unwrap_or(2)
    }

    fn quality_from_index(index: i32) -> QualityPreset {
        usize::try_from(index)
            .ok()
            .and_then(|i| QualityPreset::ALL.get(i).copied())
            .unwrap_or_default()
    }

    fn engine_index(engine: EngineChoice) -> i32 {
        match engine {
            EngineChoice::Auto => 0,
            EngineChoice::Precise => 1,
            EngineChoice::Basic => 2,
        }
    }

    fn engine_from_index(index: i32) -> EngineChoice {
        match index {
            1 => EngineChoice::Precise,
            2 => EngineChoice::Basic,
            _ => EngineChoice::Auto,
        }
    }

    fn file_list_model(files: &[String]) -> ModelRc<StandardListViewItem> {
        let items: Vec<StandardListViewItem> = files
            .iter()
            .map(|f| StandardListViewItem::from(f.as_str()))
            .collect();
        ModelRc::new(VecModel::from(items))
    }

    /// Append one line to the log ListView model.
    ///
    /// The model is always a `VecModel` (installed at startup and on each run
    /// start), so the downcast only fails if that invariant is broken.
    fn append_log_line(ui: &MainWindow, line: String) {
        if let Some(log) = ui
            .get_log_lines()
            .as_any()
            .downcast_ref::<VecModel<SharedString>>()
        {
            log.push(line.into());
        } else {
            tracing::warn!("Log model is not a VecModel - dropping line: {}", line);
        }
    }

    /// Write the state's run configuration back to the settings file.
    ///
    /// Loads the file first so fields the GUI does not edit (like the debug
    /// flag) survive the round trip. Failures are logged and swallowed: a
    /// broken settings file must not break the running app.
    fn persist_settings(state: &StateManager, config: &ConfigManager) {
        let mut user_settings = match config.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Could not reload settings before save: {}", e);
                return;
            }
        };

        let snapshot = state.snapshot();
        user_settings.settings.quality = snapshot.quality;
        user_settings.settings.engine = snapshot.engine;
        user_settings.settings.output_dir = snapshot
            .output_dir
            .map(|p| p.to_string())
            .unwrap_or_default();
        user_settings.settings.auto_install_ghostscript = snapshot.auto_install_ghostscript;
        user_settings.settings.ghostscript_timeout_secs =
            snapshot.ghostscript_timeout.map(|d| d.as_secs());

        if let Err(e) = config.save_settings(&user_settings) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    // ===== Dialogs and Pickers =====

    /// Show an error dialog (from the UI thread)
    ///
    /// # Arguments
    /// * `ui_weak` - Weak reference to the UI
    /// * `title` - Error dialog title
    /// * `message` - Main error message
    /// * `details` - Optional technical details (empty string if none)
    fn show_error_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
        details: impl Into<SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            ui.set_error_title(title.into());
            ui.set_error_message(message.into());
            ui.set_error_details(details.into());
            ui.set_show_error_dialog(true);
        }
    }

    /// Show an error dialog from a background task.
    ///
    /// `Weak::upgrade` only works on the event loop thread, so async code
    /// routes through the bridge instead.
    fn report_error(
        bridge: &EventLoopBridgeHandle<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
        details: impl Into<SharedString>,
    ) {
        let title = title.into();
        let message = message.into();
        let details = details.into();
        bridge.update_ui(move |ui| {
            ui.set_error_title(title);
            ui.set_error_message(message);
            ui.set_error_details(details);
            ui.set_show_error_dialog(true);
        });
    }

    /// Show an informational message dialog from a background task.
    fn report_message(
        bridge: &EventLoopBridgeHandle<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
    ) {
        let title = title.into();
        let message = message.into();
        bridge.update_ui(move |ui| {
            ui.set_message_title(title);
            ui.set_message_text(message);
            ui.set_show_message_dialog(true);
        });
    }

    /// Show a native multi-select file picker
    ///
    /// Uses the `rfd` crate to display a native file dialog.
    ///
    /// # Arguments
    /// * `title` - Dialog title
    /// * `filters` - File type filters (name, extensions)
    ///
    /// # Returns
    /// The selected files; empty if cancelled. Non-UTF-8 paths are skipped.
    fn show_files_picker(title: &str, filters: Vec<(&str, &[&str])>) -> Vec<Utf8PathBuf> {
        use rfd::FileDialog;

        let mut dialog = FileDialog::new().set_title(title);

        for (name, extensions) in filters {
            dialog = dialog.add_filter(name, extensions);
        }

        dialog
            .pick_files()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|path| {
                Utf8PathBuf::try_from(path)
                    .map_err(|e| {
                        tracing::error!("Failed to convert path to UTF-8: {}", e);
                        e
                    })
                    .ok()
            })
            .collect()
    }

    /// Show a native folder picker
    ///
    /// # Returns
    /// The selected folder, or None if cancelled
    fn show_folder_picker(title: &str) -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        FileDialog::new()
            .set_title(title)
            .pick_folder()
            .and_then(|path| {
                Utf8PathBuf::try_from(path)
                    .map_err(|e| {
                        tracing::error!("Failed to convert path to UTF-8: {}", e);
                        e
                    })
                    .ok()
            })
    }
}
