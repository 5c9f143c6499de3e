//! Data models for the pdfpress application.
//!
//! This module contains all the core data structures used throughout the application:
//! - [`AppState`]: The central state container holding the file selection, run configuration, and results
//! - [`CompressionJob`] / [`CompressionResult`]: one unit of work and its outcome
//! - [`QualityPreset`] / [`EngineChoice`] / [`EngineKind`]: the enumerations every layer shares
//! - [`UserSettings`]: user preferences loaded from `pdfpress-settings.yaml`
//! - [`MAX_CONCURRENT_COMPRESSIONS`]: concurrency limit constant (always 1, one sequential worker)
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: settings structs derive `Serialize`/`Deserialize` for YAML persistence
//! - **Cloneable**: AppState is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager) for thread-safe access
//! - **Immutable**: State updates go through StateManager's `update()` method to ensure consistency

pub mod app_state;
pub mod job;
pub mod settings;

pub use app_state::{AppState, MAX_CONCURRENT_COMPRESSIONS};
pub use job::{
    CompressionJob, CompressionResult, EngineChoice, EngineKind, QualityPreset, percent_saved,
};
pub use settings::{AppSettings, UserSettings};
