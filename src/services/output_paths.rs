//! Output path resolution for compressed files.
//!
//! Destination paths are derived from the source file name
//! (`report.pdf` → `report-compressed.pdf`) and placed either in an explicit
//! output folder or next to the source. Existing files are never clobbered:
//! a counting suffix `" (1)"`, `" (2)"`, ... is appended until a free name is
//! found.
//!
//! The exists-then-pick check is not atomic against concurrent writers to the
//! same folder. That is acceptable for a single-user desktop tool and callers
//! must not rely on it across processes.
//!
//! # Examples
//!
//! ```ignore
//! use pdfpress::services::output_paths::default_output_path_for;
//! use camino::Utf8Path;
//!
//! let dest = default_output_path_for(Utf8Path::new("scans/report.pdf"), None);
//! assert_eq!(dest, "scans/report-compressed.pdf");
//! ```

use camino::{Utf8Path, Utf8PathBuf};

/// Suffix inserted before the extension of every default destination name.
const OUTPUT_SUFFIX: &str = "-compressed";

/// Returns `base` unchanged when free, otherwise the first
/// `"name (N).ext"` variant that does not exist yet.
pub fn ensure_unique_output_path(base: &Utf8Path) -> Utf8PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }

    let root = base.with_extension("");
    let ext = base.extension();

    let mut i: u32 = 1;
    loop {
        let candidate = match ext {
            Some(e) => Utf8PathBuf::from(format!("{root} ({i}).{e}")),
            None => Utf8PathBuf::from(format!("{root} ({i})")),
        };
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Computes the destination path for a source file.
///
/// The target directory is `output_dir` when given, else the source's own
/// directory. The base name is `<source-stem>-compressed.pdf`, made unique
/// via [`ensure_unique_output_path`].
pub fn default_output_path_for(src: &Utf8Path, output_dir: Option<&Utf8Path>) -> Utf8PathBuf {
    let stem = src.file_stem().unwrap_or("");
    let target_dir = output_dir
        .map(Utf8Path::to_path_buf)
        .or_else(|| src.parent().map(Utf8Path::to_path_buf))
        .unwrap_or_default();

    let base = target_dir.join(format!("{stem}{OUTPUT_SUFFIX}.pdf"));
    ensure_unique_output_path(&base)
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
    fn test_default_path_next_to_source() {
        let dir = tempdir().unwrap();
        let dir_path = utf8(dir.path());
        let src = dir_path.join("a.pdf");
        fs::write(&src, b"x").unwrap();

        let dest = default_output_path_for(&src, None);
        assert_eq!(dest, dir_path.join("a-compressed.pdf"));
    }

    #[test]
    fn test_default_path_in_output_dir() {
        let src_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let src = utf8(src_dir.path()).join("a.pdf");
        fs::write(&src, b"x").unwrap();

        let dest = default_output_path_for(&src, Some(&utf8(out_dir.path())));
        assert_eq!(dest, utf8(out_dir.path()).join("a-compressed.pdf"));
    }

    #[test]
    fn test_uniqueness_counts_up() {
        let dir = tempdir().unwrap();
        let dir_path = utf8(dir.path());
        let src = dir_path.join("a.pdf");
        fs::write(&src, b"x").unwrap();

        assert_eq!(
            default_output_path_for(&src, None),
            dir_path.join("a-compressed.pdf")
        );

        fs::write(dir_path.join("a-compressed.pdf"), b"x").unwrap();
        assert_eq!(
            default_output_path_for(&src, None),
            dir_path.join("a-compressed (1).pdf")
        );

        fs::write(dir_path.join("a-compressed (1).pdf"), b"x").unwrap();
        assert_eq!(
            default_output_path_for(&src, None),
            dir_path.join("a-compressed (2).pdf")
        );
    }

    #[test]
    fn test_unique_path_without_extension() {
        let dir = tempdir().unwrap();
        let dir_path = utf8(dir.path());
        let base = dir_path.join("report");
        fs::write(&base, b"x").unwrap();

        assert_eq!(ensure_unique_output_path(&base), dir_path.join("report (1)"));
    }

    #[test]
    fn test_destination_never_equals_source() {
        let dir = tempdir().unwrap();
        let dir_path = utf8(dir.path());
        let src = dir_path.join("a-compressed.pdf");
        fs::write(&src, b"x").unwrap();

        let dest = default_output_path_for(&src, None);
        assert_eq!(dest, dir_path.join("a-compressed-compressed.pdf"));
        assert_ne!(dest, src);
    }

    #[test]
    fn test_multi_dot_stem() {
        let dir = tempdir().unwrap();
        let dir_path = utf8(dir.path());
        let src = dir_path.join("scan.v2.pdf");
        fs::write(&src, b"x").unwrap();

        let dest = default_output_path_for(&src, None);
        assert_eq!(dest, dir_path.join("scan.v2-compressed.pdf"));
    }
}
