// pdfpress - PDF compression driven by Ghostscript with a built-in fallback
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the CLI and GUI entry points.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppState, CompressionJob, CompressionResult, EngineChoice, QualityPreset};
pub use services::CompressionService;
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
