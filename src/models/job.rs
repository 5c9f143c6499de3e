use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compression aggressiveness preset.
///
/// Presets map onto Ghostscript `-dPDFSETTINGS` profiles plus per-preset
/// tuning flags (see [`crate::services::ghostscript`]). The basic engine
/// accepts a preset for interface symmetry but applies a fixed strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Aggressive downsampling to 72 DPI, lossy image re-encoding.
    Extreme,
    /// Downsampling to 96 DPI, lossy image re-encoding.
    Strong,
    /// Ghostscript ebook profile defaults.
    #[default]
    Balanced,
    /// Ghostscript printer profile, best fidelity.
    High,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 4] = [
        QualityPreset::Extreme,
        QualityPreset::Strong,
        QualityPreset::Balanced,
        QualityPreset::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Extreme => "extreme",
            QualityPreset::Strong => "strong",
            QualityPreset::Balanced => "balanced",
            QualityPreset::High => "high",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend(s) a run is allowed to use.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// Try the precise engine first, fall back to basic on any failure.
    #[default]
    Auto,
    /// Ghostscript only.
    Precise,
    /// Built-in library engine only.
    Basic,
}

impl EngineChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineChoice::Auto => "auto",
            EngineChoice::Precise => "precise",
            EngineChoice::Basic => "basic",
        }
    }

    /// True when a run with this choice may end up invoking Ghostscript.
    pub fn may_use_ghostscript(&self) -> bool {
        matches!(self, EngineChoice::Auto | EngineChoice::Precise)
    }
}

impl fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend that actually produced a result.
///
/// `EngineChoice::Auto` resolves to one of these per job; results never
/// report "auto".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Precise,
    Basic,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Precise => "ghostscript",
            EngineKind::Basic => "basic",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work: a single input file with its resolved destination.
///
/// Built per file immediately before execution, never persisted.
#[derive(Clone, Debug)]
pub struct CompressionJob {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub quality: QualityPreset,
    pub engine: EngineChoice,
}

impl CompressionJob {
    pub fn new(
        input: impl Into<Utf8PathBuf>,
        output: impl Into<Utf8PathBuf>,
        quality: QualityPreset,
        engine: EngineChoice,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            quality,
            engine,
        }
    }
}

/// Outcome of one compression job.
///
/// Backends never raise across this boundary: every failure mode is folded
/// into `ok == false` plus a human-readable message. When `ok` is true the
/// output file exists and is non-empty at `output`.
#[derive(Clone, Debug)]
pub struct CompressionResult {
    pub ok: bool,
    pub engine: EngineKind,
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub message: String,
}

impl CompressionResult {
    pub fn succeeded(
        engine: EngineKind,
        input: impl Into<Utf8PathBuf>,
        output: impl Into<Utf8PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: true,
            engine,
            input: input.into(),
            output: output.into(),
            message: message.into(),
        }
    }

    pub fn failed(
        engine: EngineKind,
        input: impl Into<Utf8PathBuf>,
        output: impl Into<Utf8PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            engine,
            input: input.into(),
            output: output.into(),
            message: message.into(),
        }
    }

    /// Size delta for reporting, in bytes. `None` until both files are
    /// readable (e.g. after a failure).
    pub fn size_delta(&self) -> Option<(u64, u64)> {
        let before = std::fs::metadata(self.input.as_std_path()).ok()?.len();
        let after = std::fs::metadata(self.output.as_std_path()).ok()?.len();
        Some((before, after))
    }
}

/// Percentage saved going from `before` to `after` bytes. Negative when the
/// output grew.
pub fn percent_saved(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (1.0 - (after as f64 / before as f64)) * 100.0
}
