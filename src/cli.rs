//! Command-line front end.
//!
//! The CLI compresses a single PDF or every PDF directly inside a folder and
//! reports one line per file. It shares the service layer with the GUI; the
//! only CLI-specific logic here is argument handling, input classification,
//! and the printed report.
//!
//! Exit codes: 0 when every requested file succeeded, 1 when no valid input
//! was found, 2 when at least one file failed.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use crate::models::{EngineChoice, QualityPreset};
use crate::services::{CompressionService, default_output_path_for, ensure_installed};

#[derive(Parser, Debug)]
#[command(name = "pdfpress")]
#[command(
    author,
    version,
    about = "Compress PDF files with Ghostscript or a built-in fallback engine"
)]
pub struct Args {
    /// Input PDF file or a folder of PDFs (omit to launch the GUI)
    #[arg(short, long)]
    pub input: Option<Utf8PathBuf>,

    /// Output file (when it ends in .pdf) or output folder
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Compression engine
    #[arg(long, value_enum, default_value = "auto")]
    pub engine: EngineChoice,

    /// Quality preset
    #[arg(long, value_enum, default_value = "balanced")]
    pub quality: QualityPreset,

    /// Install Ghostscript first when the selected engine could use it
    #[arg(long)]
    pub auto_install_ghostscript: bool,
}

/// Run the CLI to completion and return the process exit code.
pub async fn run(args: Args) -> i32 {
    let Some(input) = args.input.clone() else {
        // main() launches the GUI when --input is absent; reaching this spot
        // means the caller wanted CLI mode with nothing to compress.
        println!("Input must be an existing PDF file or a folder.");
        return 1;
    };

    if args.auto_install_ghostscript && args.engine.may_use_ghostscript() {
        tracing::info!("Auto-install requested before compression run");
        if ensure_installed(true).await.is_none() {
            tracing::warn!("Ghostscript is still unavailable after auto-install");
        }
    }

    // An --output value without a .pdf extension names a folder; create it
    // so the first write does not fail
    if let Some(out) = args.output.as_deref() {
        let names_folder = !out
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if names_folder && !out.exists() {
            if let Err(e) = std::fs::create_dir_all(out) {
                tracing::warn!("Could not create output folder {}: {}", out, e);
            }
        }
    }

    let service = CompressionService::new(None);

    if input.is_dir() {
        run_folder(&service, &input, &args).await
    } else if is_pdf_file(&input) {
        run_single(&service, &input, &args).await
    } else {
        println!("Input must be an existing PDF file or a folder.");
        1
    }
}

fn is_pdf_file(path: &Utf8Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// PDF files directly inside `folder`, sorted by path. Non-recursive; the
/// extension check is case-insensitive.
pub fn collect_pdfs(folder: &Utf8Path) -> Vec<Utf8PathBuf> {
    let Ok(entries) = folder.read_dir_utf8() else {
        return Vec::new();
    };

    let mut pdfs: Vec<Utf8PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    pdfs
}

/// Destination for single-file mode. An explicit `--output` ending in `.pdf`
/// is used verbatim; anything else is treated as a destination folder.
pub fn resolve_single_output(source: &Utf8Path, output: Option<&Utf8Path>) -> Utf8PathBuf {
    match output {
        Some(path)
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) =>
        {
            path.to_path_buf()
        }
        other => default_output_path_for(source, other),
    }
}

async fn run_single(service: &CompressionService, input: &Utf8Path, args: &Args) -> i32 {
    let dest = resolve_single_output(input, args.output.as_deref());
    let result = service
        .compress(args.engine, input, &dest, args.quality)
        .await;

    let name = input.file_name().unwrap_or(input.as_str());
    if result.ok {
        println!("OK: {} -> {}", name, result.output);
        0
    } else {
        println!("FAIL: {}", result.message);
        2
    }
}

async fn run_folder(service: &CompressionService, folder: &Utf8Path, args: &Args) -> i32 {
    let files = collect_pdfs(folder);
    if files.is_empty() {
        println!("No PDF files found in folder.");
        return 1;
    }

    let total = files.len();
    let mut succeeded = 0usize;

    for (idx, file) in files.iter().enumerate() {
        let dest = default_output_path_for(file, args.output.as_deref());
        let result = service
            .compress(args.engine, file, &dest, args.quality)
            .await;

        let name = file.file_name().unwrap_or(file.as_str());
        if result.ok {
            succeeded += 1;
            println!("[{}/{}] OK: {} -> {}", idx + 1, total, name, result.output);
        } else {
            println!("[{}/{}] FAIL: {} -> {}", idx + 1, total, name, result.output);
            println!("   {}", result.message);
        }
    }

    println!("Done. {}/{} succeeded.", succeeded, total);
    if succeeded == total { 0 } else { 2 }
}
