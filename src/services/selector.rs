use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;

use super::basic::BasicEngine;
use super::ghostscript::GhostscriptEngine;
use super::locator::locate_ghostscript;
use crate::models::{CompressionJob, CompressionResult, EngineChoice, QualityPreset};

/// Engine selection and the auto-fallback policy.
///
/// `precise` and `basic` dispatch straight to their engine. `auto` locates
/// Ghostscript per job (never cached): when present the precise engine runs
/// exactly once, and any failure is retried exactly once with the basic
/// engine, whose result is returned as-is. When absent the precise attempt
/// is skipped entirely. No engine ever runs twice for one job.
pub struct CompressionService {
    /// Wall-clock bound for Ghostscript runs; `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl CompressionService {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run one job to completion. Never errors; every outcome is a
    /// [`CompressionResult`].
    pub async fn compress_job(&self, job: &CompressionJob) -> CompressionResult {
        self.compress(job.engine, &job.input, &job.output, job.quality)
            .await
    }

    pub async fn compress(
        &self,
        engine: EngineChoice,
        input: &Utf8Path,
        output: &Utf8Path,
        quality: QualityPreset,
    ) -> CompressionResult {
        match engine {
            EngineChoice::Precise => {
                GhostscriptEngine::new(None, self.timeout)
                    .compress(input, output, quality)
                    .await
            }
            EngineChoice::Basic => BasicEngine::new().compress(input, output, quality).await,
            EngineChoice::Auto => {
                self.auto_with(locate_ghostscript(), input, output, quality)
                    .await
            }
        }
    }

    /// Auto policy with an explicit tool location. `None` skips the precise
    /// attempt. Split out so the fallback rule is testable without touching
    /// the host's PATH.
    pub async fn auto_with(
        &self,
        gs_path: Option<Utf8PathBuf>,
        input: &Utf8Path,
        output: &Utf8Path,
        quality: QualityPreset,
    ) -> CompressionResult {
        if let Some(gs) = gs_path {
            let result = GhostscriptEngine::new(Some(gs), self.timeout)
                .compress(input, output, quality)
                .await;
            if result.ok {
                return result;
            }
            tracing::warn!(
                "Ghostscript failed for {} ({}), falling back to basic engine",
                input,
                result.message
            );
        }
        BasicEngine::new().compress(input, output, quality).await
    }
}
