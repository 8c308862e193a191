//! NDK provisioning command
//!
//! Downloads the configured NDK release, extracts it under the SDK
//! root, and prepares it for the native build.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::check_environment;
use crate::cli::output::{self, status};
use crate::config::{defaults, Config};
use crate::infra::{filesystem, ndk};

/// Execute the NDK provisioning path
pub async fn execute(project_dir: &Path) -> Result<()> {
    let sdk_root = check_environment()?;
    let config_path = project_dir.join(defaults::DEFAULT_CONFIG_FILE);
    let config = Config::load(project_dir, &config_path)
        .context("Failed to load build configuration")?;
    let ndk_version = config
        .ndk_version
        .context("Config error: \"ndkVersion\" is required to download the NDK")?;

    let url = defaults::ndk_download_url(&ndk_version, ndk::os_name());
    let zip_name = url.rsplit('/').next().unwrap_or("android-ndk.zip").to_string();
    let zip_path = project_dir.join(&zip_name);

    tracing::info!("Downloading {zip_name}");
    let bar = output::create_download_bar(0);
    let progress = bar.clone();
    ndk::download(
        &url,
        &zip_path,
        Some(Box::new(move |downloaded, total| {
            if total > 0 && progress.length() != Some(total) {
                progress.set_length(total);
            }
            progress.set_position(downloaded);
        })),
    )
    .await?;
    bar.finish_and_clear();

    tracing::info!("Extracting {zip_name}");
    let ndk_root = sdk_root.join("ndk");
    filesystem::rm_rf(&ndk_root.join("magisk"))?;
    ndk::extract_zip(&zip_path, &ndk_root)?;
    ndk::install(project_dir, &sdk_root, &ndk_version)?;

    println!(
        "{} NDK installed to {}",
        status::SUCCESS,
        ndk_root.join("magisk").display()
    );
    Ok(())
}
