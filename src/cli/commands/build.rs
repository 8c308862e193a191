//! Full pipeline command
//!
//! Runs the complete packaging pipeline: load configuration, build the
//! application packages and native binaries, assemble and sign both
//! flashable archives, then drop the intermediate artifacts. Any fatal
//! error aborts the remaining steps.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::check_environment;
use crate::cli::output::{self, status};
use crate::config::{defaults, Config};
use crate::core::archive::{self, ArchiveKind};
use crate::core::{apk, native, sign};

/// Execute a full packaging run in `project_dir`
pub async fn execute(project_dir: &Path) -> Result<()> {
    let sdk_root = check_environment()?;
    let config_path = project_dir.join(defaults::DEFAULT_CONFIG_FILE);
    let config = Config::load(project_dir, &config_path)
        .context("Failed to load build configuration")?;
    let out_dir = config.out_dir_in(project_dir);
    let release = true;

    let spinner = output::create_spinner("Building application packages");
    apk::build_apk(project_dir, &out_dir, "stub", release, &config_path)?;
    apk::build_apk(project_dir, &out_dir, "app", release, &config_path)?;
    spinner.finish_and_clear();

    let spinner = output::create_spinner("Building native binaries");
    native::build_binaries(project_dir, &config, &config_path, &sdk_root, &[], release)?;
    spinner.finish_and_clear();

    let installer = archive::assemble(project_dir, &config, ArchiveKind::Installer, release)?;
    let uninstaller = archive::assemble(project_dir, &config, ArchiveKind::Uninstaller, release)?;

    sign::sign_artifact(&installer, config.signing.as_ref(), &sdk_root)?;
    sign::sign_artifact(&uninstaller, config.signing.as_ref(), &sdk_root)?;

    apk::cleanup_intermediates(&out_dir)?;

    println!("{} Output: {}", status::SUCCESS, installer.display());
    println!("{} Output: {}", status::SUCCESS, uninstaller.display());
    Ok(())
}
