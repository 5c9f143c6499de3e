use camino::Utf8PathBuf;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::time::Duration;

use super::{EngineChoice, QualityPreset};

/// Maximum number of concurrent compression subprocesses.
///
/// **IMPORTANT:** This is hardcoded to 1. A run is one sequential loop over
/// the selected files; Ghostscript is never invoked for two jobs at once.
/// Keeping the loop serial keeps disk and CPU pressure predictable on the
/// desktop machines this tool targets and keeps per-file progress reporting
/// trivially ordered.
///
/// This constraint is enforced in the compression workflow (see
/// [`crate::ui::GuiController`]) using a `tokio::sync::Semaphore` to
/// serialize execution.
pub const MAX_CONCURRENT_COMPRESSIONS: usize = 1;

/// Single source of truth for all application state.
///
/// Holds the selected file set, run configuration, progress tracking, and
/// per-run results.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by
/// [`crate::state::StateManager`] to provide thread-safe access across the
/// application. Never access `AppState` directly - always use
/// [`StateManager`](crate::state::StateManager) methods:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
#[derive(Clone, Debug)]
pub struct AppState {
    // Selected inputs (ordered, duplicate-free)
    pub files: IndexSet<Utf8PathBuf>,
    pub output_dir: Option<Utf8PathBuf>,

    // Ghostscript status (display only; the engine re-locates per run)
    pub ghostscript_path: Option<Utf8PathBuf>,

    // Run configuration
    pub quality: QualityPreset,
    pub engine: EngineChoice,
    pub ghostscript_timeout: Option<Duration>,
    pub auto_install_ghostscript: bool,

    // Runtime state
    pub is_running: bool,
    pub is_installing: bool,
    pub current_file: Option<String>,
    pub current_operation: String,

    // Progress state
    pub progress: usize,
    pub total_files: usize,

    // Results for the current/last run
    pub succeeded_files: HashSet<String>,
    pub failed_files: HashSet<String>,

    // Aggregate size accounting (successful jobs only)
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            // Selected inputs
            files: IndexSet::new(),
            output_dir: None,

            // Ghostscript status
            ghostscript_path: None,

            // Run configuration
            quality: QualityPreset::Balanced,
            engine: EngineChoice::Auto,
            ghostscript_timeout: None,
            auto_install_ghostscript: true,

            // Runtime state
            is_running: false,
            is_installing: false,
            current_file: None,
            current_operation: String::new(),

            // Progress state
            progress: 0,
            total_files: 0,

            // Results
            succeeded_files: HashSet::new(),
            failed_files: HashSet::new(),

            // Aggregate size accounting
            total_input_bytes: 0,
            total_output_bytes: 0,
        }
    }
}

impl AppState {
    /// Whether a run can start right now.
    pub fn can_start(&self) -> bool {
        !self.files.is_empty() && !self.is_running && !self.is_installing
    }

    /// Add a file to the selection. Returns false when it was already listed.
    pub fn add_file(&mut self, path: Utf8PathBuf) -> bool {
        self.files.insert(path)
    }

    /// Remove the files at the given selection indices (descending order not
    /// required; indices refer to the current ordering).
    pub fn remove_files_at(&mut self, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        for idx in sorted {
            if idx < self.files.len() {
                self.files.shift_remove_index(idx);
            }
        }
    }

    /// Get current run statistics.
    ///
    /// Returns a tuple of (succeeded, failed, total).
    pub fn run_stats(&self) -> (usize, usize, usize) {
        (
            self.succeeded_files.len(),
            self.failed_files.len(),
            self.total_files,
        )
    }

    /// Reset all run-related state to initial values. The file selection and
    /// run configuration are kept.
    pub fn reset_run_state(&mut self) {
        self.is_running = false;
        self.current_file = None;
        self.current_operation.clear();
        self.progress = 0;
        self.total_files = 0;
        self.succeeded_files.clear();
        self.failed_files.clear();
        self.total_input_bytes = 0;
        self.total_output_bytes = 0;
    }

    /// Record the outcome of one job and advance progress.
    pub fn add_result(&mut self, file: String, ok: bool) {
        if ok {
            self.succeeded_files.insert(file);
        } else {
            self.failed_files.insert(file);
        }
        self.progress += 1;
    }

    /// Account the size delta of one successful job.
    pub fn add_size_delta(&mut self, input_bytes: u64, output_bytes: u64) {
        self.total_input_bytes += input_bytes;
        self.total_output_bytes += output_bytes;
    }

    /// Net bytes saved across the run. Negative when outputs grew.
    pub fn bytes_saved(&self) -> i64 {
        self.total_input_bytes as i64 - self.total_output_bytes as i64
    }

    /// Get a formatted string summarizing the run's size savings.
    ///
    /// Returns an empty string if nothing succeeded.
    pub fn savings_summary(&self) -> String {
        if self.total_input_bytes == 0 {
            return String::new();
        }
        let saved_kb = self.bytes_saved() as f64 / 1024.0;
        let pct = (1.0 - self.total_output_bytes as f64 / self.total_input_bytes as f64) * 100.0;
        format!("Saved {:.0} KB ({:.1}%)", saved_kb, pct)
    }
}
