//! Ghostscript discovery on the host system.
//!
//! Resolution order, first hit wins:
//! 1. A portable Ghostscript bundled next to the running executable
//!    (`<app-root>/ghostscript/bin/<console-exe>`)
//! 2. The PATH, trying the console executable names in priority order
//! 3. Well-known Windows install directories, matched with glob patterns
//!    (version-suffixed folders like `C:\Program Files\gs\gs10.04.0`)
//!
//! Absence is a normal outcome, not an error: the caller falls back to the
//! basic engine or offers installation. Location is recomputed on every call
//! because an install can happen mid-process; there is deliberately no cached
//! singleton.
//!
//! # Examples
//!
//! ```ignore
//! use pdfpress::services::locator::locate_ghostscript;
//!
//! match locate_ghostscript() {
//!     Some(gs) => println!("using {}", gs),
//!     None => println!("Ghostscript not installed"),
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};

/// PATH lookup candidates, highest priority first. The bare `gs` name covers
/// non-Windows hosts and MSYS-style installs.
const PATH_CANDIDATES: &[&str] = &["gswin64c", "gswin64c.exe", "gswin32c", "gswin32c.exe", "gs"];

/// Console executable names inside a bundled `ghostscript/bin` directory.
const BUNDLED_NAMES: &[&str] = &["gswin64c.exe", "gswin32c.exe"];

/// Typical install locations, e.g. `C:\Program Files\gs\gs10.04.0\bin\gswin64c.exe`.
const INSTALL_DIR_PATTERNS: &[&str] = &[
    r"C:\Program Files\gs\gs*\bin\gswin64c.exe",
    r"C:\Program Files\gs\gs*\bin\gswin32c.exe",
    r"C:\Program Files (x86)\gs\gs*\bin\gswin64c.exe",
    r"C:\Program Files (x86)\gs\gs*\bin\gswin32c.exe",
];

/// Returns the full path to the Ghostscript console executable, if any.
pub fn locate_ghostscript() -> Option<Utf8PathBuf> {
    if let Some(path) = find_bundled() {
        tracing::debug!("Found bundled Ghostscript: {}", path);
        return Some(path);
    }

    if let Some(path) = find_on_path() {
        tracing::debug!("Found Ghostscript on PATH: {}", path);
        return Some(path);
    }

    let path = probe_install_dirs().filter(|p| p.exists());
    if let Some(ref p) = path {
        tracing::debug!("Found Ghostscript in install directory: {}", p);
    }
    path
}

/// Looks for a portable Ghostscript next to the running executable.
fn find_bundled() -> Option<Utf8PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let root = Utf8PathBuf::from_path_buf(exe.parent()?.join("ghostscript")).ok()?;
    bundled_ghostscript_in(&root)
}

/// Checks `<root>/bin/<name>` for each known console executable name,
/// 64-bit variant first.
pub fn bundled_ghostscript_in(root: &Utf8Path) -> Option<Utf8PathBuf> {
    BUNDLED_NAMES
        .iter()
        .map(|name| root.join("bin").join(name))
        .find(|p| p.exists())
}

fn find_on_path() -> Option<Utf8PathBuf> {
    PATH_CANDIDATES.iter().find_map(|name| {
        which::which(name)
            .ok()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
    })
}

fn probe_install_dirs() -> Option<Utf8PathBuf> {
    let mut candidates: Vec<Utf8PathBuf> = Vec::new();
    for pattern in INSTALL_DIR_PATTERNS {
        let Ok(paths) = glob::glob(pattern) else {
            continue;
        };
        for entry in paths.flatten() {
            if let Ok(p) = Utf8PathBuf::from_path_buf(entry) {
                candidates.push(p);
            }
        }
    }
    pick_preferred(candidates)
}

/// Orders candidate executables so 64-bit console builds come first, then
/// lexicographically, and returns the winner.
pub fn pick_preferred(mut candidates: Vec<Utf8PathBuf>) -> Option<Utf8PathBuf> {
    candidates.sort_by_key(|p| {
        let name = p.file_name().unwrap_or("").to_string();
        (!name.contains("64c"), p.to_string())
    });
    candidates.into_iter().next()
}
