//! Application package builds
//!
//! Invokes the project's gradle wrapper to assemble the app and stub
//! packages, then moves the artifacts into the output directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::error::BuildError;
use crate::infra::{filesystem, process};

/// Intermediate package artifacts removed at the end of a full run
const INTERMEDIATE_APKS: &[&str] = &[
    "stub.apk",
    "app-debug.apk",
    "app-release.apk",
    "stub-debug.apk",
    "stub-release.apk",
];

/// Build one gradle module's APK and move it into the output directory
///
/// The stub module is always assembled as a release build.
pub fn build_apk(
    project_dir: &Path,
    out_dir: &Path,
    module: &str,
    release: bool,
    config_path: &Path,
) -> Result<PathBuf> {
    let build_type = if release || module == "stub" {
        "Release"
    } else {
        "Debug"
    };
    tracing::info!("Building {module} ({build_type})");

    let gradlew = project_dir.join(if cfg!(windows) { "gradlew.bat" } else { "gradlew" });
    let config_path = absolute(config_path)?;
    let status = process::run(
        &gradlew,
        &[
            format!("{module}:assemble{build_type}"),
            format!("-PconfigPath={}", config_path.display()),
        ],
        Some(project_dir),
    )
    .map_err(|e| BuildError::Spawn {
        tool: gradlew.display().to_string(),
        error: e.to_string(),
    })?;
    if !status.success() {
        bail!(BuildError::GradleFailed {
            module: module.to_string(),
        });
    }

    let build_type = build_type.to_lowercase();
    let apk = format!("{module}-{build_type}.apk");
    let source = project_dir
        .join(module)
        .join("build")
        .join("outputs")
        .join("apk")
        .join(&build_type)
        .join(&apk);
    let target = out_dir.join(&apk);
    filesystem::mv(&source, &target)?;

    tracing::info!("Output: {}", target.display());
    Ok(target)
}

/// Remove the intermediate package artifacts from the output directory
///
/// Artifacts that were never produced are skipped.
pub fn cleanup_intermediates(out_dir: &Path) -> Result<()> {
    for apk in INTERMEDIATE_APKS {
        filesystem::rm(&out_dir.join(apk))?;
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_tolerates_missing_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app-release.apk"), "x").unwrap();
        std::fs::write(dir.path().join("kept.zip"), "y").unwrap();

        cleanup_intermediates(dir.path()).unwrap();

        assert!(!dir.path().join("app-release.apk").exists());
        assert!(dir.path().join("kept.zip").exists());
    }

    #[test]
    fn test_absolute_passthrough() {
        assert_eq!(
            absolute(Path::new("/etc/config.prop")).unwrap(),
            PathBuf::from("/etc/config.prop")
        );
    }
}
