//! Integration tests for the compression service layer
//!
//! These tests verify:
//! - Ghostscript command building across the quality presets
//! - End-to-end compression through the basic engine
//! - The auto-fallback policy with an explicit tool location
//! - Output path resolution over repeated runs
//! - Integration with StateManager

use camino::{Utf8Path, Utf8PathBuf};
use pdfpress::models::{EngineChoice, EngineKind, QualityPreset};
use pdfpress::services::CompressionService;
use pdfpress::services::ghostscript::build_args;
use tempfile::tempdir;

fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

fn write_minimal_pdf(path: &Utf8Path) {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 36.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path.as_std_path()).unwrap();
}

#[test]
fn test_build_args_basic_shape() {
    let args = build_args(
        QualityPreset::Balanced,
        Utf8Path::new("/tmp/scratch.pdf"),
        Utf8Path::new("/docs/report.pdf"),
    );

    // Fixed preamble
    assert_eq!(args[0], "-sDEVICE=pdfwrite");
    assert_eq!(args[1], "-dCompatibilityLevel=1.4");
    assert_eq!(args[2], "-dPDFSETTINGS=/ebook");
    assert_eq!(args[3], "-dNOPAUSE");

    // Control flags and files
    assert!(args.contains(&"-dQUIET".to_string()));
    assert!(args.contains(&"-dBATCH".to_string()));
    assert_eq!(args[args.len() - 2], "-sOutputFile=/tmp/scratch.pdf");
    assert_eq!(args[args.len() - 1], "/docs/report.pdf");
}

#[test]
fn test_build_args_extreme_preset() {
    let args = build_args(
        QualityPreset::Extreme,
        Utf8Path::new("/tmp/scratch.pdf"),
        Utf8Path::new("/docs/report.pdf"),
    );

    // Extreme rides the lowest profile with 72 DPI downsampling and harsh
    // JPEG re-encoding on top.
    assert!(args.contains(&"-dPDFSETTINGS=/screen".to_string()));
    assert!(args.contains(&"-dColorImageResolution=72".to_string()));
    assert!(args.contains(&"-dGrayImageResolution=72".to_string()));
    assert!(args.contains(&"-dMonoImageResolution=150".to_string()));
    assert!(args.contains(&"-dJPEGQ=20".to_string()));
}

#[test]
fn test_build_args_strong_preset() {
    let args = build_args(
        QualityPreset::Strong,
        Utf8Path::new("/tmp/scratch.pdf"),
        Utf8Path::new("/docs/report.pdf"),
    );

    // Same profile as extreme but milder tuning values.
    assert!(args.contains(&"-dPDFSETTINGS=/screen".to_string()));
    assert!(args.contains(&"-dColorImageResolution=96".to_string()));
    assert!(args.contains(&"-dMonoImageResolution=180".to_string()));
    assert!(args.contains(&"-dJPEGQ=35".to_string()));
    assert!(!args.contains(&"-dJPEGQ=20".to_string()));
}

#[test]
fn test_build_args_high_preset_keeps_common_savers() {
    let args = build_args(
        QualityPreset::High,
        Utf8Path::new("/tmp/scratch.pdf"),
        Utf8Path::new("/docs/report.pdf"),
    );

    assert!(args.contains(&"-dPDFSETTINGS=/printer".to_string()));

    // No forced downsampling at high fidelity
    assert!(!args.iter().any(|a| a.starts_with("-dColorImageResolution")));
    assert!(!args.iter().any(|a| a.starts_with("-dJPEGQ")));

    // The lossless size savers apply to every preset
    assert!(args.contains(&"-dDetectDuplicateImages=true".to_string()));
    assert!(args.contains(&"-dSubsetFonts=true".to_string()));
    assert!(args.contains(&"-dCompressFonts=true".to_string()));
}

#[test]
fn test_build_args_flag_ordering() {
    let args = build_args(
        QualityPreset::Extreme,
        Utf8Path::new("/tmp/scratch.pdf"),
        Utf8Path::new("/docs/report.pdf"),
    );

    let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();

    // Tuning flags sit between -dNOPAUSE and the control flags
    assert!(pos("-dNOPAUSE") < pos("-dJPEGQ=20"));
    assert!(pos("-dJPEGQ=20") < pos("-dQUIET"));
    assert_eq!(pos("-dBATCH"), pos("-dQUIET") + 1);

    // Output file flag immediately before the input path
    assert_eq!(pos("-dBATCH"), args.len() - 3);
}

#[test]
fn test_build_args_paths_with_spaces() {
    let args = build_args(
        QualityPreset::Balanced,
        Utf8Path::new("/tmp/My Scratch File.pdf"),
        Utf8Path::new("/docs/My Annual Report.pdf"),
    );

    // Arguments go to the subprocess exec-style, so a path with spaces must
    // stay one unquoted element.
    assert_eq!(args[args.len() - 2], "-sOutputFile=/tmp/My Scratch File.pdf");
    assert_eq!(args[args.len() - 1], "/docs/My Annual Report.pdf");
}

#[tokio::test]
async fn test_basic_engine_end_to_end() {
    let dir = tempdir().unwrap();
    let input = utf8(dir.path()).join("report.pdf");
    let output = utf8(dir.path()).join("report-compressed.pdf");
    write_minimal_pdf(&input);

    let service = CompressionService::new(None);
    let result = service
        .compress(EngineChoice::Basic, &input, &output, QualityPreset::Balanced)
        .await;

    assert!(result.ok);
    assert_eq!(result.engine, EngineKind::Basic);
    assert_eq!(result.message, "Compressed with lopdf");
    assert!(output.exists());

    // Both files are readable, so the size delta is available for reporting
    let (before, after) = result.size_delta().unwrap();
    assert!(before > 0);
    assert!(after > 0);
}

#[tokio::test]
async fn test_basic_engine_reports_unreadable_input() {
    let dir = tempdir().unwrap();
    let input = utf8(dir.path()).join("missing.pdf");
    let output = utf8(dir.path()).join("missing-compressed.pdf");

    let service = CompressionService::new(None);
    let result = service
        .compress(EngineChoice::Basic, &input, &output, QualityPreset::Balanced)
        .await;

    assert!(!result.ok);
    assert!(result.message.starts_with("lopdf error:"));
    assert!(!output.exists());
    assert!(result.size_delta().is_none());
}

#[tokio::test]
async fn test_precise_engine_reports_missing_tool() {
    use pdfpress::services::GhostscriptEngine;

    let dir = tempdir().unwrap();
    let input = utf8(dir.path()).join("report.pdf");
    let output = utf8(dir.path()).join("report-compressed.pdf");
    write_minimal_pdf(&input);

    // An explicit path that does not exist fails the existence check before
    // any subprocess is spawned, regardless of what the host has installed.
    let bogus = utf8(dir.path()).join("no-such-gs");
    let engine = GhostscriptEngine::new(Some(bogus), None);
    let result = engine.compress(&input, &output, QualityPreset::Balanced).await;

    assert!(!result.ok);
    assert_eq!(result.engine, EngineKind::Precise);
    assert_eq!(result.message, "Ghostscript not found");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_auto_falls_back_when_tool_is_missing() {
    let dir = tempdir().unwrap();
    let input = utf8(dir.path()).join("report.pdf");
    let output = utf8(dir.path()).join("report-compressed.pdf");
    write_minimal_pdf(&input);

    let bogus = utf8(dir.path()).join("no-such-gs");
    let service = CompressionService::new(None);
    let result = service
        .auto_with(Some(bogus), &input, &output, QualityPreset::Extreme)
        .await;

    // The precise failure stays internal; the caller sees the basic result
    assert!(result.ok);
    assert_eq!(result.engine, EngineKind::Basic);
    assert_eq!(result.message, "Compressed with lopdf");
    assert!(output.exists());
}

#[tokio::test]
async fn test_repeated_runs_never_overwrite_earlier_output() {
    use pdfpress::services::default_output_path_for;

    let dir = tempdir().unwrap();
    let out_dir = utf8(dir.path()).join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let input = utf8(dir.path()).join("report.pdf");
    write_minimal_pdf(&input);

    let service = CompressionService::new(None);

    let first = default_output_path_for(&input, Some(&out_dir));
    let result = service
        .compress(EngineChoice::Basic, &input, &first, QualityPreset::Balanced)
        .await;
    assert!(result.ok);
    assert_eq!(first.file_name(), Some("report-compressed.pdf"));

    // A second run over the same input resolves to a numbered destination
    let second = default_output_path_for(&input, Some(&out_dir));
    assert_eq!(second.file_name(), Some("report-compressed (1).pdf"));

    let result = service
        .compress(EngineChoice::Basic, &input, &second, QualityPreset::Balanced)
        .await;
    assert!(result.ok);
    assert!(first.exists());
    assert!(second.exists());
}

#[test]
fn test_integration_with_state_manager() {
    use pdfpress::StateManager;
    use std::sync::Arc;

    let state = Arc::new(StateManager::new());
    state.add_files(vec![
        Utf8PathBuf::from("/docs/a.pdf"),
        Utf8PathBuf::from("/docs/b.pdf"),
    ]);

    // Start the run
    state.start_run();

    let snapshot = state.snapshot();
    assert!(snapshot.is_running);
    assert_eq!(snapshot.total_files, 2);

    // Simulate updating progress
    state.update_progress("a.pdf".to_string(), "Compressing a.pdf...".to_string());

    let snapshot = state.snapshot();
    assert_eq!(snapshot.current_file, Some("a.pdf".to_string()));

    // Simulate recording a result
    state.add_file_result(
        "a.pdf".to_string(),
        true,
        "Compressed with Ghostscript".to_string(),
        Some((10_000, 4_000)),
    );

    let snapshot = state.snapshot();
    assert_eq!(snapshot.succeeded_files.len(), 1);
    assert!(snapshot.succeeded_files.contains("a.pdf"));
    assert_eq!(snapshot.total_input_bytes, 10_000);

    // Stop the run
    state.stop_run();

    let snapshot = state.snapshot();
    assert!(!snapshot.is_running);
}

#[test]
fn test_compression_workflow_state_transitions() {
    use pdfpress::StateManager;
    use std::sync::Arc;

    let state = Arc::new(StateManager::new());

    // Initial state
    assert!(!state.read(|s| s.is_running));

    state.add_files(vec![
        Utf8PathBuf::from("/docs/a.pdf"),
        Utf8PathBuf::from("/docs/b.pdf"),
        Utf8PathBuf::from("/docs/c.pdf"),
    ]);
    state.start_run();

    assert!(state.read(|s| s.is_running));
    assert_eq!(state.read(|s| s.total_files), 3);

    // Process files
    for (i, file) in ["a.pdf", "b.pdf", "c.pdf"].iter().enumerate() {
        state.update_progress(file.to_string(), format!("Compressing {}", file));
        state.add_file_result(
            file.to_string(),
            true,
            "Compressed with lopdf".to_string(),
            Some((5_000, 3_000)),
        );

        let progress = state.read(|s| s.progress);
        assert_eq!(progress, i + 1);
    }

    // Final state
    assert_eq!(state.read(|s| s.succeeded_files.len()), 3);
    assert_eq!(state.read(|s| s.total_input_bytes), 15_000);

    state.stop_run();
    assert!(!state.read(|s| s.is_running));
}

#[test]
fn test_mixed_results_workflow() {
    use pdfpress::StateManager;
    use std::sync::Arc;

    let state = Arc::new(StateManager::new());

    state.add_files(vec![
        Utf8PathBuf::from("/docs/good.pdf"),
        Utf8PathBuf::from("/docs/broken.pdf"),
    ]);
    state.start_run();

    // First file succeeds
    state.add_file_result(
        "good.pdf".to_string(),
        true,
        "Compressed with Ghostscript".to_string(),
        Some((8_000, 2_000)),
    );

    // Second file fails; its sizes never enter the aggregate
    state.add_file_result(
        "broken.pdf".to_string(),
        false,
        "Ghostscript timed out".to_string(),
        None,
    );

    let snapshot = state.snapshot();
    assert_eq!(snapshot.succeeded_files.len(), 1);
    assert_eq!(snapshot.failed_files.len(), 1);
    assert!(snapshot.succeeded_files.contains("good.pdf"));
    assert!(snapshot.failed_files.contains("broken.pdf"));
    assert_eq!(snapshot.run_stats(), (1, 1, 2));
    assert_eq!(snapshot.total_input_bytes, 8_000);
    assert_eq!(snapshot.bytes_saved(), 6_000);
}
