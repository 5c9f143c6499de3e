use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use super::locator::locate_ghostscript;
use crate::models::{CompressionResult, EngineKind, QualityPreset};

/// Errors from one Ghostscript invocation.
///
/// The `Display` text of each variant is exactly what ends up in the failed
/// [`CompressionResult`] message; nothing here escapes the engine boundary.
#[derive(Error, Debug)]
pub enum GhostscriptError {
    #[error("Ghostscript not found")]
    NotFound,

    #[error("Ghostscript timed out")]
    Timeout,

    #[error("Ghostscript error: {0}")]
    Launch(#[from] std::io::Error),

    /// Non-zero exit or missing output; carries the tool's own diagnostic
    /// text (stderr, else stdout, else a synthetic exit-code message).
    #[error("{0}")]
    Failed(String),

    #[error("Move failed: {0}")]
    MoveFailed(String),
}

/// Size savers applied for every preset.
const COMMON_TUNING: &[&str] = &[
    "-dDetectDuplicateImages=true",
    "-dSubsetFonts=true",
    "-dCompressFonts=true",
];

/// Aggressive downsampling to 72 DPI with low-quality JPEG re-encoding.
const EXTREME_TUNING: &[&str] = &[
    "-dDownsampleColorImages=true",
    "-dColorImageDownsampleType=/Average",
    "-dColorImageResolution=72",
    "-dDownsampleGrayImages=true",
    "-dGrayImageDownsampleType=/Average",
    "-dGrayImageResolution=72",
    "-dDownsampleMonoImages=true",
    "-dMonoImageDownsampleType=/Subsample",
    "-dMonoImageResolution=150",
    "-dAutoFilterColorImages=false",
    "-dColorImageFilter=/DCTEncode",
    "-dAutoFilterGrayImages=false",
    "-dGrayImageFilter=/DCTEncode",
    "-dJPEGQ=20",
    "-dDetectDuplicateImages=true",
    "-dSubsetFonts=true",
    "-dCompressFonts=true",
];

/// Same shape as extreme at 96/180 DPI and a milder JPEG quality factor.
const STRONG_TUNING: &[&str] = &[
    "-dDownsampleColorImages=true",
    "-dColorImageDownsampleType=/Average",
    "-dColorImageResolution=96",
    "-dDownsampleGrayImages=true",
    "-dGrayImageDownsampleType=/Average",
    "-dGrayImageResolution=96",
    "-dDownsampleMonoImages=true",
    "-dMonoImageDownsampleType=/Subsample",
    "-dMonoImageResolution=180",
    "-dAutoFilterColorImages=false",
    "-dColorImageFilter=/DCTEncode",
    "-dAutoFilterGrayImages=false",
    "-dGrayImageFilter=/DCTEncode",
    "-dJPEGQ=35",
    "-dDetectDuplicateImages=true",
    "-dSubsetFonts=true",
    "-dCompressFonts=true",
];

/// Maps a preset onto the coarse `-dPDFSETTINGS` profile.
///
/// `/screen` is the low-resolution profile, `/ebook` the middle ground,
/// `/printer` the high-fidelity one. Total over all four presets.
pub fn pdfsettings_profile(quality: QualityPreset) -> &'static str {
    match quality {
        QualityPreset::Extreme => "screen",
        QualityPreset::Strong => "screen",
        QualityPreset::Balanced => "ebook",
        QualityPreset::High => "printer",
    }
}

/// Per-preset tuning flags appended on top of the coarse profile.
///
/// Balanced and high rely on the profile itself and only keep the common
/// size savers.
pub fn tuning_args(quality: QualityPreset) -> &'static [&'static str] {
    match quality {
        QualityPreset::Extreme => EXTREME_TUNING,
        QualityPreset::Strong => STRONG_TUNING,
        QualityPreset::Balanced | QualityPreset::High => COMMON_TUNING,
    }
}

/// Builds the full argument vector for one run (argv0 excluded).
///
/// Tuning flags sit between `-dNOPAUSE` and the `-dQUIET -dBATCH` control
/// flags, before the output file and input path.
pub fn build_args(quality: QualityPreset, tmp_out: &Utf8Path, input: &Utf8Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-sDEVICE=pdfwrite".to_string(),
        "-dCompatibilityLevel=1.4".to_string(),
        format!("-dPDFSETTINGS=/{}", pdfsettings_profile(quality)),
        "-dNOPAUSE".to_string(),
    ];
    args.extend(tuning_args(quality).iter().map(|s| (*s).to_string()));
    args.push("-dQUIET".to_string());
    args.push("-dBATCH".to_string());
    args.push(format!("-sOutputFile={}", tmp_out));
    args.push(input.to_string());
    args
}

/// The precise engine: compression by driving the Ghostscript console
/// executable as a subprocess.
///
/// Output is written to a scoped temporary file first and only moved to the
/// destination after a clean exit, so a crashed or killed run never leaves a
/// half-written destination behind. The temporary file is removed on every
/// exit path (RAII via [`TempPath`]).
///
/// # Design Philosophy
///
/// - **Stateless**: construction just captures the tool path and timeout
/// - **Framework-agnostic**: no GUI dependencies, works with any UI or CLI
/// - **Async**: subprocess execution and the timeout bound use tokio
pub struct GhostscriptEngine {
    /// Explicit tool path. `None` re-locates on every call, since an install
    /// may have happened since construction.
    gs_path: Option<Utf8PathBuf>,

    /// Wall-clock bound for one run. `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl GhostscriptEngine {
    pub fn new(gs_path: Option<Utf8PathBuf>, timeout: Option<Duration>) -> Self {
        Self { gs_path, timeout }
    }

    /// Compress `input` into `output` with the given preset.
    ///
    /// Never returns an error: every failure mode is folded into a failed
    /// [`CompressionResult`] carrying the diagnostic text.
    pub async fn compress(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
        quality: QualityPreset,
    ) -> CompressionResult {
        match self.run(input, output, quality).await {
            Ok(()) => CompressionResult::succeeded(
                EngineKind::Precise,
                input,
                output,
                "Compressed with Ghostscript",
            ),
            Err(e) => CompressionResult::failed(EngineKind::Precise, input, output, e.to_string()),
        }
    }

    async fn run(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
        quality: QualityPreset,
    ) -> Result<(), GhostscriptError> {
        let gs = self
            .gs_path
            .clone()
            .or_else(locate_ghostscript)
            .filter(|p| p.exists())
            .ok_or(GhostscriptError::NotFound)?;

        let tmp_out = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()?
            .into_temp_path();
        let tmp_utf8 = Utf8PathBuf::from_path_buf(tmp_out.to_path_buf())
            .map_err(|p| GhostscriptError::Failed(format!("Non-UTF-8 temp path: {:?}", p)))?;

        let args = build_args(quality, &tmp_utf8, input);
        tracing::info!(
            "Executing Ghostscript: {} ({} -> {}, quality: {})",
            gs,
            input,
            output,
            quality
        );

        let start = Instant::now();

        let mut cmd = Command::new(gs.as_std_path());
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        let output_data = match self.timeout {
            Some(bound) => timeout(bound, child.wait_with_output())
                .await
                .map_err(|_| {
                    tracing::warn!("Ghostscript timed out after {:?}", bound);
                    GhostscriptError::Timeout
                })??,
            None => child.wait_with_output().await?,
        };

        let exit_code = output_data.status.code().unwrap_or(-1);
        tracing::info!(
            "Ghostscript completed in {:.2}s with exit code {}",
            start.elapsed().as_secs_f32(),
            exit_code
        );

        if exit_code != 0 || !tmp_utf8.exists() {
            let stderr = String::from_utf8_lossy(&output_data.stderr);
            let stdout = String::from_utf8_lossy(&output_data.stdout);
            let message = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                format!("Exited with code {}", exit_code)
            };
            return Err(GhostscriptError::Failed(message));
        }

        move_into_place(tmp_out, output)
    }
}

/// Moves the finished temp file to the requested destination, replacing any
/// file already there. Falls back to copy when a plain rename cannot cross
/// filesystems; the temp file is deleted either way.
fn move_into_place(tmp: TempPath, dest: &Utf8Path) -> Result<(), GhostscriptError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }

    if dest.exists() {
        fs::remove_file(dest).map_err(|e| GhostscriptError::MoveFailed(e.to_string()))?;
    }

    match tmp.persist(dest.as_std_path()) {
        Ok(()) => Ok(()),
        Err(err) => {
            let tmp_path = err.path;
            fs::copy(&tmp_path, dest.as_std_path())
                .map_err(|e| GhostscriptError::MoveFailed(e.to_string()))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_profile_mapping_covers_all_presets() {
        assert_eq!(pdfsettings_profile(QualityPreset::Extreme), "screen");
        assert_eq!(pdfsettings_profile(QualityPreset::Strong), "screen");
        assert_eq!(pdfsettings_profile(QualityPreset::Balanced), "ebook");
        assert_eq!(pdfsettings_profile(QualityPreset::High), "printer");
    }

    #[test]
    fn test_extreme_tuning_flags() {
        let flags = tuning_args(QualityPreset::Extreme);
        assert!(flags.contains(&"-dColorImageResolution=72"));
        assert!(flags.contains(&"-dMonoImageResolution=150"));
        assert!(flags.contains(&"-dJPEGQ=20"));
        assert!(flags.contains(&"-dColorImageFilter=/DCTEncode"));
        assert!(flags.contains(&"-dDetectDuplicateImages=true"));
    }

    #[test]
    fn test_strong_tuning_flags() {
        let flags = tuning_args(QualityPreset::Strong);
        assert!(flags.contains(&"-dColorImageResolution=96"));
        assert!(flags.contains(&"-dMonoImageResolution=180"));
        assert!(flags.contains(&"-dJPEGQ=35"));
    }

    #[test]
    fn test_mild_presets_only_keep_common_savers() {
        for quality in [QualityPreset::Balanced, QualityPreset::High] {
            let flags = tuning_args(quality);
            assert_eq!(flags.len(), 3);
            assert!(flags.contains(&"-dDetectDuplicateImages=true"));
            assert!(flags.contains(&"-dSubsetFonts=true"));
            assert!(flags.contains(&"-dCompressFonts=true"));
        }
    }

    #[test]
    fn test_build_args_order() {
        let args = build_args(
            QualityPreset::Balanced,
            Utf8Path::new("/tmp/out.pdf"),
            Utf8Path::new("in.pdf"),
        );

        assert_eq!(args[0], "-sDEVICE=pdfwrite");
        assert_eq!(args[1], "-dCompatibilityLevel=1.4");
        assert_eq!(args[2], "-dPDFSETTINGS=/ebook");
        assert_eq!(args[3], "-dNOPAUSE");

        // Tuning flags sit between -dNOPAUSE and -dQUIET
        let quiet_pos = args.iter().position(|a| a == "-dQUIET").unwrap();
        let batch_pos = args.iter().position(|a| a == "-dBATCH").unwrap();
        assert!(quiet_pos > 3);
        assert_eq!(batch_pos, quiet_pos + 1);

        assert_eq!(args[args.len() - 2], "-sOutputFile=/tmp/out.pdf");
        assert_eq!(args[args.len() - 1], "in.pdf");
    }

    #[tokio::test]
    async fn test_missing_tool_reports_not_found() {
        let engine = GhostscriptEngine::new(
            Some(Utf8PathBuf::from("/definitely/not/here/gswin64c.exe")),
            None,
        );
        let result = engine
            .compress(
                Utf8Path::new("in.pdf"),
                Utf8Path::new("out.pdf"),
                QualityPreset::Balanced,
            )
            .await;

        assert!(!result.ok);
        assert_eq!(result.engine, EngineKind::Precise);
        assert_eq!(result.message, "Ghostscript not found");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_reports_exit_code() {
        let dir = tempdir().unwrap();
        let out = utf8(dir.path()).join("out.pdf");

        // A real executable that exits non-zero without producing output.
        let engine = GhostscriptEngine::new(Some(Utf8PathBuf::from("/bin/false")), None);
        let result = engine
            .compress(Utf8Path::new("in.pdf"), &out, QualityPreset::Balanced)
            .await;

        assert!(!result.ok);
        assert_eq!(result.message, "Exited with code 1");
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_unlaunchable_tool_reports_launch_error() {
        let dir = tempdir().unwrap();
        let fake_gs = utf8(dir.path()).join("gs.txt");
        fs::write(&fake_gs, b"not a binary").unwrap();

        let engine = GhostscriptEngine::new(Some(fake_gs), None);
        let result = engine
            .compress(
                Utf8Path::new("in.pdf"),
                Utf8Path::new("out.pdf"),
                QualityPreset::Balanced,
            )
            .await;

        assert!(!result.ok);
        assert!(result.message.starts_with("Ghostscript error:"));
    }

    #[test]
    fn test_move_into_place_replaces_existing() {
        let dir = tempdir().unwrap();
        let dest = utf8(dir.path()).join("dest.pdf");
        fs::write(&dest, b"old").unwrap();

        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), b"new").unwrap();

        move_into_place(tmp.into_temp_path(), &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_move_into_place_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let dest = utf8(dir.path()).join("nested").join("dest.pdf");

        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), b"data").unwrap();

        move_into_place(tmp.into_temp_path(), &dest).unwrap();
        assert!(dest.exists());
    }
}
