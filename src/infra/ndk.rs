//! NDK provisioning
//!
//! Downloads an NDK release zip, extracts it under the SDK root,
//! prunes the parts the native build never uses, and swaps in the
//! repository's API-16 static libraries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::DownloadError;
use crate::infra::filesystem;

/// Progress callback type for download progress reporting
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// NDK sysroot targets whose API-16 static libraries get replaced
const API16_TARGETS: &[&str] = &["arm-linux-androideabi", "i686-linux-android"];

/// OS name as it appears in NDK download URLs
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Download a file with bounded retries
///
/// A partial file is removed before the error is returned.
pub async fn download(
    url: &str,
    dest: &Path,
    progress: Option<ProgressCallback>,
) -> Result<(), DownloadError> {
    let client = reqwest::Client::new();
    let mut attempts = 0;
    let mut delay_ms = 1000u64;
    let mut last_error = None;

    while attempts < defaults::MAX_DOWNLOAD_RETRIES {
        attempts += 1;

        match download_once(&client, url, dest, progress.as_ref()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!("Download attempt {attempts} failed: {e}");
                last_error = Some(e);

                if attempts < defaults::MAX_DOWNLOAD_RETRIES {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms * 2).min(30_000);
                }
            }
        }
    }

    // Clean up partial download on failure
    let _ = tokio::fs::remove_file(dest).await;

    Err(last_error.unwrap_or(DownloadError::MaxRetriesExceeded {
        url: url.to_string(),
        retries: defaults::MAX_DOWNLOAD_RETRIES,
    }))
}

async fn download_once(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<(), DownloadError> {
    let network_err = |e: reqwest::Error| DownloadError::NetworkError {
        url: url.to_string(),
        error: e.to_string(),
    };
    let io_err = |e: std::io::Error| DownloadError::IoError {
        path: dest.to_path_buf(),
        error: e.to_string(),
    };

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(network_err)?;
    let total = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(network_err)?;
        file.write_all(&chunk).await.map_err(io_err)?;
        downloaded += chunk.len() as u64;
        if let Some(callback) = progress {
            callback(downloaded, total);
        }
    }

    file.flush().await.map_err(io_err)?;
    Ok(())
}

/// Extract a zip archive, preserving unix permission bits
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<(), DownloadError> {
    let extract_err = |error: String| DownloadError::ExtractError {
        archive: archive.to_path_buf(),
        error,
    };

    let file = std::fs::File::open(archive).map_err(|e| extract_err(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| extract_err(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let path = dest.join(relative);
        tracing::debug!("Extracting {}", entry.name());

        if entry.is_dir() {
            std::fs::create_dir_all(&path).map_err(|e| extract_err(e.to_string()))?;
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| extract_err(e.to_string()))?;
        }
        let mut out = std::fs::File::create(&path).map_err(|e| extract_err(e.to_string()))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| extract_err(e.to_string()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| extract_err(e.to_string()))?;
        }
    }

    Ok(())
}

/// Install a downloaded and extracted NDK release for the native build
///
/// Moves `android-ndk-r{version}` into place, empties the per-platform
/// directories, drops the legacy sysroot, and replaces the API-16
/// static libraries with the ones shipped under `tools/ndk-bins`.
pub fn install(project_dir: &Path, sdk_root: &Path, ndk_version: &str) -> Result<()> {
    let ndk_root = sdk_root.join("ndk");
    let ndk_path = ndk_root.join("magisk");

    let extracted = ndk_root.join(format!("android-ndk-r{ndk_version}"));
    std::fs::rename(&extracted, &ndk_path).with_context(|| {
        format!(
            "Failed to move '{}' to '{}'",
            extracted.display(),
            ndk_path.display()
        )
    })?;

    tracing::info!("Removing unnecessary files");
    prune_platforms(&ndk_path.join("platforms"))?;
    filesystem::rm_rf(&ndk_path.join("sysroot"))?;

    tracing::info!("Replacing API-16 static libs");
    for target in API16_TARGETS {
        let arch = target
            .split('-')
            .next()
            .expect("target triple has a leading arch");
        let lib_dir = api16_lib_dir(&ndk_path, target);
        let src_dir = project_dir.join("tools").join("ndk-bins").join(arch);
        // macOS leftovers must not end up in the sysroot
        filesystem::rm(&src_dir.join(".DS_Store"))?;
        for path in filesystem::copy_tree(&src_dir, &lib_dir)? {
            tracing::debug!("Replaced {}", path.display());
        }
    }

    Ok(())
}

/// Sysroot directory holding a target's API-16 static libraries
fn api16_lib_dir(ndk_path: &Path, target: &str) -> PathBuf {
    ndk_path
        .join("toolchains")
        .join("llvm")
        .join("prebuilt")
        .join(format!("{}-x86_64", os_name()))
        .join("sysroot")
        .join("usr")
        .join("lib")
        .join(target)
        .join("16")
}

/// Replace every platform directory with an empty one
fn prune_platforms(platforms: &Path) -> Result<()> {
    let entries = std::fs::read_dir(platforms)
        .with_context(|| format!("Failed to list '{}'", platforms.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list '{}'", platforms.display()))?;
        let path = entry.path();
        if path.is_dir() {
            filesystem::rm_rf(&path)?;
            filesystem::mkdir_p(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prune_platforms_empties_subdirs() {
        let dir = TempDir::new().unwrap();
        let platforms = dir.path().join("platforms");
        std::fs::create_dir_all(platforms.join("android-16/arch-arm")).unwrap();
        std::fs::write(platforms.join("android-16/arch-arm/crtbegin.o"), "x").unwrap();
        std::fs::create_dir_all(platforms.join("android-21")).unwrap();

        prune_platforms(&platforms).unwrap();

        assert!(platforms.join("android-16").exists());
        assert!(platforms.join("android-21").exists());
        assert_eq!(
            std::fs::read_dir(platforms.join("android-16")).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_extract_zip_roundtrip() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a.zip");

        let file = std::fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        writer.start_file("bin/tool", options).unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        extract_zip(&archive, &dest).unwrap();

        let extracted = dest.join("bin/tool");
        assert_eq!(std::fs::read(&extracted).unwrap(), b"#!/bin/sh\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&extracted).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
