// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::AppState;
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the GUI)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The selected file set has changed
    FileListChanged {
        count: usize,
    },

    /// Ghostscript availability has changed
    GhostscriptStatusChanged {
        path: Option<Utf8PathBuf>,
    },

    /// Progress has been updated during a run
    ProgressUpdated {
        current: usize,
        total: usize,
        current_file: Option<String>,
    },

    /// A compression run has started
    RunStarted {
        total_files: usize,
    },

    /// A compression run has finished
    RunFinished {
        succeeded: usize,
        failed: usize,
    },

    /// A file has been processed
    FileProcessed {
        file: String,
        ok: bool,
        message: String,
    },

    /// Current operation has changed
    OperationChanged {
        operation: String,
    },

    /// The Ghostscript installer has started or stopped
    InstallStateChanged {
        installing: bool,
    },

    /// Run configuration has been updated
    SettingsChanged,

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state without locking
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::config::ConfigManager`]: Loads settings into state
/// - [`crate::ui::controller::GuiController`]: Primary consumer of state events
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    /// Multiple subscribers can listen for state changes
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// This clones the entire state, so it's safe to use without holding locks.
    /// For checking individual fields, consider using `read()` with a closure.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let can_start = state_manager.read(|state| state.can_start());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Arguments
    /// * `update_fn` - A function that mutates the state
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    ///
    /// # Example
    /// ```ignore
    /// state_manager.update(|state| {
    ///     state.is_running = true;
    ///     state.progress = 0;
    /// });
    /// ```
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        // Apply the update
        update_fn(&mut state);

        // Detect changes and emit events
        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    ///
    /// This is called internally by `update()` to determine which events to emit.
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        // File selection changes
        if old.files != new.files {
            changes.push(StateChange::FileListChanged {
                count: new.files.len(),
            });
        }

        // Ghostscript availability changes
        if old.ghostscript_path != new.ghostscript_path {
            changes.push(StateChange::GhostscriptStatusChanged {
                path: new.ghostscript_path.clone(),
            });
        }

        // Run state changes
        if old.is_running != new.is_running {
            if new.is_running {
                changes.push(StateChange::RunStarted {
                    total_files: new.total_files,
                });
            } else {
                changes.push(StateChange::RunFinished {
                    succeeded: new.succeeded_files.len(),
                    failed: new.failed_files.len(),
                });
            }
        }

        // Progress changes
        if old.progress != new.progress
            || old.total_files != new.total_files
            || old.current_file != new.current_file
        {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total_files,
                current_file: new.current_file.clone(),
            });
        }

        // Operation changes
        if old.current_operation != new.current_operation {
            changes.push(StateChange::OperationChanged {
                operation: new.current_operation.clone(),
            });
        }

        // Installer activity changes
        if old.is_installing != new.is_installing {
            changes.push(StateChange::InstallStateChanged {
                installing: new.is_installing,
            });
        }

        // Settings changes (checking all run configuration fields)
        if old.quality != new.quality
            || old.engine != new.engine
            || old.ghostscript_timeout != new.ghostscript_timeout
            || old.auto_install_ghostscript != new.auto_install_ghostscript
            || old.output_dir != new.output_dir
        {
            changes.push(StateChange::SettingsChanged);
        }

        changes
    }

    // Convenience methods for common state updates

    /// Add one file to the selection (duplicates are ignored)
    pub fn add_file(&self, path: Utf8PathBuf) -> Vec<StateChange> {
        self.update(|state| {
            state.add_file(path);
        })
    }

    /// Add several files to the selection
    pub fn add_files(&self, paths: Vec<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            for path in paths {
                state.add_file(path);
            }
        })
    }

    /// Remove the files at the given selection indices
    pub fn remove_files_at(&self, indices: &[usize]) -> Vec<StateChange> {
        self.update(|state| {
            state.remove_files_at(indices);
        })
    }

    /// Set the detected Ghostscript path (display only)
    pub fn set_ghostscript_path(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.ghostscript_path = path;
        })
    }

    /// Toggle installer activity
    pub fn set_installing(&self, installing: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.is_installing = installing;
        })
    }

    /// Start a compression run over the current file selection
    pub fn start_run(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_running = true;
            state.progress = 0;
            state.total_files = state.files.len();
            state.current_file = None;
            state.current_operation = "Starting compression...".to_string();
            state.succeeded_files.clear();
            state.failed_files.clear();
            state.total_input_bytes = 0;
            state.total_output_bytes = 0;
        })
    }

    /// Stop the compression run
    pub fn stop_run(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_running = false;
            state.current_file = None;
            state.current_operation.clear();
        })
    }

    /// Update progress for the current file
    pub fn update_progress(&self, file: String, operation: String) -> Vec<StateChange> {
        self.update(|state| {
            state.current_file = Some(file);
            state.current_operation = operation;
        })
    }

    /// Record the result of processing a file
    ///
    /// # Arguments
    /// * `file` - Name of the file that was processed
    /// * `ok` - Whether the job succeeded
    /// * `message` - Human-readable message about the result
    /// * `sizes` - Input and output byte counts for successful jobs
    pub fn add_file_result(
        &self,
        file: String,
        ok: bool,
        message: String,
        sizes: Option<(u64, u64)>,
    ) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(file.clone(), ok);

            if ok {
                if let Some((input_bytes, output_bytes)) = sizes {
                    state.add_size_delta(input_bytes, output_bytes);
                }
            }
        });

        // Emit a file processed event
        let file_event = StateChange::FileProcessed { file, ok, message };

        let _ = self.state_tx.send(file_event.clone());
        changes.push(file_event);

        changes
    }

    /// Reset all run-related state
    pub fn reset_run_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_run_state();
        });

        // Emit a reset event
        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Update settings
    pub fn update_settings<F>(&self, settings_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        self.update(settings_fn)
    }

    /// Load run configuration from UserSettings
    ///
    /// This populates AppState fields from the settings file: quality, engine,
    /// output folder, and Ghostscript options.
    ///
    /// # Arguments
    /// * `user_settings` - The loaded settings file
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn load_from_settings(
        &self,
        user_settings: &crate::models::UserSettings,
    ) -> Vec<StateChange> {
        self.update(|state| {
            let settings = &user_settings.settings;

            state.quality = settings.quality;
            state.engine = settings.engine;
            state.ghostscript_timeout = settings.ghostscript_timeout();
            state.auto_install_ghostscript = settings.auto_install_ghostscript;

            if !settings.output_dir.is_empty() {
                state.output_dir = Some(Utf8PathBuf::from(&settings.output_dir));
            }

            tracing::info!(
                "Loaded settings: quality={}, engine={}, output_dir={:?}, auto_install={}",
                state.quality,
                state.engine,
                state.output_dir,
                state.auto_install_ghostscript
            );
        })
    }

    /// Get an Arc reference to the state for use in worker threads
    ///
    /// Use this when you need to share state across threads but want
    /// to minimize cloning. Remember to use read/write locks appropriately.
    pub fn state_arc(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
