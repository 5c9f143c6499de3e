//! Services module - Pure business logic for PDF compression operations.
//!
//! This module contains all the core business logic for shrinking PDF files with
//! Ghostscript and the bundled lopdf fallback. The services are **framework-agnostic**
//! and have no dependencies on the UI layer, making them testable and reusable.
//!
//! # Components
//!
//! - [`CompressionService`]: The entry point for running one compression job. Handles:
//!   - Engine selection (`auto`, `precise`, `basic`)
//!   - Automatic fallback from Ghostscript to the basic engine
//!   - Folding engine outcomes into a uniform [`CompressionResult`](crate::models::CompressionResult)
//!
//! - [`GhostscriptEngine`]: The precise engine. Builds the `pdfwrite` command line for a
//!   quality preset, runs the external process with an optional timeout, and moves the
//!   scratch output into place.
//!
//! - [`BasicEngine`]: The in-process fallback. Re-reads the document with lopdf and
//!   rewrites its streams compressed; ignores quality presets.
//!
//! - [`locator`]: Finds a Ghostscript executable (bundled copy, `PATH`, well-known
//!   install directories) without caching, so a fresh install is picked up immediately.
//!
//! - [`installer`]: Best-effort download and silent install of the latest Ghostscript
//!   release; every failure degrades to "not installed".
//!
//! - [`output_paths`]: Derives `*-compressed.pdf` destinations and keeps them from
//!   colliding with existing files.
//!
//! # Design Philosophy
//!
//! The services layer is designed to be:
//! - **Pure**: No side effects beyond file I/O, subprocess execution, and the
//!   installer's network access
//! - **Async**: All operations use tokio for non-blocking I/O
//! - **Testable**: No hidden dependencies, all inputs are explicit parameters
//! - **Framework-agnostic**: No Slint, no GUI code, only business logic
//!
//! # Usage Example
//!
//! ```ignore
//! use pdfpress::models::{EngineChoice, QualityPreset};
//! use pdfpress::services::CompressionService;
//!
//! let service = CompressionService::new(None);
//!
//! let result = service
//!     .compress(
//!         EngineChoice::Auto,
//!         Utf8Path::new("report.pdf"),
//!         Utf8Path::new("report-compressed.pdf"),
//!         QualityPreset::Balanced,
//!     )
//!     .await;
//! ```
//!
//! # Ghostscript Integration
//!
//! The precise engine integrates with Ghostscript by:
//! 1. Writing to a scratch temp file, never the destination, so a failed run
//!    leaves nothing half-written
//! 2. Running `gs -sDEVICE=pdfwrite -dPDFSETTINGS=/...` plus per-preset
//!    downsampling and font flags
//! 3. Treating a non-zero exit as failure and surfacing trimmed stderr (or
//!    stdout) as the message
//! 4. Moving the scratch file into place only after a successful exit
//!
//! See the [Ghostscript documentation](https://ghostscript.readthedocs.io/) for
//! details on `pdfwrite` and `-dPDFSETTINGS`.

pub mod basic;
pub mod ghostscript;
pub mod installer;
pub mod locator;
pub mod output_paths;
pub mod selector;

pub use basic::{BasicEngine, BasicEngineError};
pub use ghostscript::{GhostscriptEngine, GhostscriptError};
pub use installer::ensure_installed;
pub use locator::{bundled_ghostscript_in, locate_ghostscript, pick_preferred};
pub use output_paths::{default_output_path_for, ensure_unique_output_path};
pub use selector::CompressionService;
