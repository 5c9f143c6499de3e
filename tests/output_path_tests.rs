//! Property tests for output path resolution
//!
//! Destination names follow `<stem>-compressed.pdf` for every source name,
//! the explicit output folder always wins over the source folder, and
//! resolution never hands back a path that already exists.

use camino::Utf8PathBuf;
use pdfpress::services::{default_output_path_for, ensure_unique_output_path};
use proptest::prelude::*;
use std::fs;
use tempfile::tempdir;

fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

proptest! {
    #[test]
    fn default_path_appends_suffix_next_to_source(stem in "[A-Za-z0-9_-]{1,24}") {
        let dir = tempdir().unwrap();
        let src = utf8(dir.path()).join(format!("{stem}.pdf"));

        let dest = default_output_path_for(&src, None);

        prop_assert_eq!(dest.parent(), src.parent());
        let expected = format!("{stem}-compressed.pdf");
        prop_assert_eq!(dest.file_name(), Some(expected.as_str()));
    }

    #[test]
    fn explicit_output_folder_wins(stem in "[A-Za-z0-9_-]{1,24}") {
        let src_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let src = utf8(src_dir.path()).join(format!("{stem}.pdf"));
        let out = utf8(out_dir.path());

        let dest = default_output_path_for(&src, Some(&out));

        prop_assert_eq!(dest.parent(), Some(out.as_path()));
        let expected = format!("{stem}-compressed.pdf");
        prop_assert_eq!(dest.file_name(), Some(expected.as_str()));
    }

    #[test]
    fn resolution_never_returns_an_existing_path(taken in 0usize..6) {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let src = root.join("doc.pdf");

        // Occupy the base name and the first counted variants
        if taken > 0 {
            fs::write(root.join("doc-compressed.pdf"), b"x").unwrap();
            for i in 1..taken {
                fs::write(root.join(format!("doc-compressed ({i}).pdf")), b"x").unwrap();
            }
        }

        let dest = default_output_path_for(&src, None);

        prop_assert!(!dest.exists());
        prop_assert_eq!(dest.parent(), Some(root.as_path()));
        let expected = if taken == 0 {
            "doc-compressed.pdf".to_string()
        } else {
            format!("doc-compressed ({taken}).pdf")
        };
        prop_assert_eq!(dest.file_name(), Some(expected.as_str()));
    }
}

#[test]
fn test_counting_continues_past_existing_variants() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());

    fs::write(root.join("a-compressed.pdf"), b"x").unwrap();
    fs::write(root.join("a-compressed (1).pdf"), b"x").unwrap();

    let dest = ensure_unique_output_path(&root.join("a-compressed.pdf"));
    assert_eq!(dest, root.join("a-compressed (2).pdf"));
}

#[test]
fn test_extension_less_paths_count_too() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());

    fs::write(root.join("README"), b"x").unwrap();

    let dest = ensure_unique_output_path(&root.join("README"));
    assert_eq!(dest, root.join("README (1)"));
}
