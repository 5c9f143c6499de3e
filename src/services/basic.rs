use camino::Utf8Path;
use thiserror::Error;

use crate::models::{CompressionResult, EngineKind, QualityPreset};

/// Errors from the built-in engine. Folded into result messages at the
/// boundary, mirroring [`super::ghostscript::GhostscriptError`].
#[derive(Error, Debug)]
pub enum BasicEngineError {
    #[error("lopdf error: {0}")]
    Library(#[from] lopdf::Error),

    #[error("Unknown error during save")]
    MissingOutput,
}

/// The basic engine: in-process stream recompression with lopdf.
///
/// Used when Ghostscript is unavailable or fails. It re-deflates every
/// stream in the document and drops unused objects, which gives a meaningful
/// size reduction with no external tools, but it never re-encodes or
/// downsamples images. The quality preset is accepted for interface symmetry
/// and deliberately ignored; the strategy is fixed.
pub struct BasicEngine;

impl BasicEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compress `input` into `output`.
    ///
    /// Same contract as the precise engine: failures become a failed
    /// [`CompressionResult`], never an error.
    pub async fn compress(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
        quality: QualityPreset,
    ) -> CompressionResult {
        tracing::debug!(
            "Basic engine: fixed strategy, quality preset {} has no effect",
            quality
        );

        let input_owned = input.to_path_buf();
        let output_owned = output.to_path_buf();

        // lopdf parsing is CPU-bound and can panic on malformed files; the
        // blocking task keeps both away from the async workers.
        let outcome =
            tokio::task::spawn_blocking(move || recompress(&input_owned, &output_owned)).await;

        match outcome {
            Ok(Ok(())) => CompressionResult::succeeded(
                EngineKind::Basic,
                input,
                output,
                "Compressed with lopdf",
            ),
            Ok(Err(e)) => {
                CompressionResult::failed(EngineKind::Basic, input, output, e.to_string())
            }
            Err(join_err) => CompressionResult::failed(
                EngineKind::Basic,
                input,
                output,
                format!("lopdf error: {join_err}"),
            ),
        }
    }
}

impl Default for BasicEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn recompress(input: &Utf8Path, output: &Utf8Path) -> Result<(), BasicEngineError> {
    let mut doc = lopdf::Document::load(input.as_std_path())?;
    doc.compress();
    doc.save(output.as_std_path()).map_err(lopdf::Error::from)?;

    if !output.exists() {
        return Err(BasicEngineError::MissingOutput);
    }
    Ok(())
}
