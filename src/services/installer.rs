//! Best-effort Ghostscript installation.
//!
//! When Ghostscript is absent, [`ensure_installed`] can fetch the latest
//! Windows installer from the Artifex release feed, run it silently, and
//! re-run the locator. Installation is inherently optional: every network,
//! filesystem, or process failure along the way degrades to `None`, never an
//! error. Callers treat absence exactly like "not installed".
//!
//! The downloaded installer lives in a scoped temp file (`gs-setup-*.exe`)
//! that is deleted on every exit path, success or not.

use camino::Utf8PathBuf;
use futures::StreamExt;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::locator::locate_ghostscript;

const RELEASE_API: &str =
    "https://api.github.com/repos/ArtifexSoftware/ghostpdl-downloads/releases/latest";

/// Identifies this tool to the release API.
const USER_AGENT: &str = "pdf-compressor";

/// Bound for the release-metadata request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-read stall bound while streaming the installer body.
const DOWNLOAD_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound for one installer run (silent or interactive).
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Release asset tag for the host CPU word size.
pub fn arch_tag() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "w64"
    } else {
        "w32"
    }
}

/// Pattern for release asset names, e.g. `gs10040w64.exe`.
fn asset_pattern(arch: &str) -> Regex {
    Regex::new(&format!(r"(?i)gs\d{{5}}{arch}\.exe$")).expect("Invalid asset name regex")
}

/// Scans a release document for the download URL of the installer matching
/// `arch`. First match wins; the URL itself must also end in `.exe`.
pub fn pick_asset_url(release: &serde_json::Value, arch: &str) -> Option<String> {
    let pattern = asset_pattern(arch);
    let assets = release.get("assets")?.as_array()?;

    for asset in assets {
        let name = asset.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let url = asset
            .get("browser_download_url")
            .and_then(|u| u.as_str())
            .unwrap_or("");
        if pattern.is_match(name) && url.ends_with(".exe") {
            return Some(url.to_string());
        }
    }
    None
}

fn build_client() -> Option<reqwest::Client> {
    match reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(FETCH_TIMEOUT)
        .read_timeout(DOWNLOAD_READ_TIMEOUT)
        .build()
    {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("Failed to build HTTP client: {}", e);
            None
        }
    }
}

async fn fetch_latest_download_url(client: &reqwest::Client, arch: &str) -> Option<String> {
    let response = match client
        .get(RELEASE_API)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Release metadata request failed: {}", e);
            return None;
        }
    };

    let release: serde_json::Value = match response.json().await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Release metadata was not valid JSON: {}", e);
            return None;
        }
    };

    pick_asset_url(&release, arch)
}

/// Streams the installer to a scoped temp file. The returned [`TempPath`]
/// deletes the file when dropped.
async fn download_to_temp(client: &reqwest::Client, url: &str) -> Option<tempfile::TempPath> {
    tracing::info!("Downloading Ghostscript installer from {}", url);

    let response = match client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Installer download failed: {}", e);
            return None;
        }
    };

    let tmp = match tempfile::Builder::new()
        .prefix("gs-setup-")
        .suffix(".exe")
        .tempfile()
    {
        Ok(tmp) => tmp,
        Err(e) => {
            tracing::warn!("Could not create temp file for installer: {}", e);
            return None;
        }
    };
    let (file, temp_path) = tmp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut stream = response.bytes_stream();
    let mut bytes_downloaded: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("Download stream error: {}", e);
                return None;
            }
        };
        if let Err(e) = file.write_all(&chunk).await {
            tracing::warn!("Failed writing installer to disk: {}", e);
            return None;
        }
        bytes_downloaded += chunk.len() as u64;
    }
    if let Err(e) = file.flush().await {
        tracing::warn!("Failed flushing installer to disk: {}", e);
        return None;
    }

    tracing::info!("Installer downloaded: {} bytes", bytes_downloaded);
    Some(temp_path)
}

/// Runs the installer silently (`/S`); a non-zero exit gets one interactive
/// retry so the user can click through whatever the silent mode refused.
async fn run_installer(installer: &Path) -> bool {
    match run_once(installer, true).await {
        Some(0) => true,
        Some(_) => matches!(run_once(installer, false).await, Some(0)),
        None => false,
    }
}

async fn run_once(installer: &Path, silent: bool) -> Option<i32> {
    let mut cmd = Command::new(installer);
    if silent {
        cmd.arg("/S");
    }
    cmd.kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("Failed to launch installer: {}", e);
            return None;
        }
    };

    match timeout(INSTALL_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let code = output.status.code().unwrap_or(-1);
            tracing::info!(
                "Installer exited with code {} (silent: {})",
                code,
                silent
            );
            Some(code)
        }
        Ok(Err(e)) => {
            tracing::warn!("Failed waiting for installer: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("Installer timed out after {:?}", INSTALL_TIMEOUT);
            None
        }
    }
}

/// Ensures Ghostscript is installed; optionally auto-installs when missing.
///
/// Returns the tool path if available or freshly installed, else `None`.
/// Idempotent: when the locator already finds the tool, nothing else runs.
pub async fn ensure_installed(auto_install: bool) -> Option<Utf8PathBuf> {
    if let Some(gs) = locate_ghostscript() {
        return Some(gs);
    }
    if !auto_install {
        return None;
    }

    let arch = arch_tag();
    let client = build_client()?;
    let url = fetch_latest_download_url(&client, arch).await?;

    // Temp path drop deletes the downloaded installer on every exit path.
    let installer = download_to_temp(&client, &url).await?;
    let installed = run_installer(&installer).await;
    drop(installer);

    if !installed {
        return None;
    }

    locate_ghostscript()
}
