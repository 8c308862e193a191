//! Artifact signing
//!
//! Thin adapter over the SDK's apksigner. Flashable zips are signed as
//! v1-only with a fixed minimum platform version so recovery can verify
//! them; packages keep the default scheme set. A path with any other
//! extension gets the base flags only.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{defaults, SigningConfig};
use crate::error::SignError;
use crate::infra::process;

/// Sign an artifact in place
///
/// A no-op when no signing credentials are configured.
pub fn sign_artifact(
    artifact: &Path,
    signing: Option<&SigningConfig>,
    sdk_root: &Path,
) -> Result<(), SignError> {
    let Some(signing) = signing else {
        tracing::debug!("No signing credentials, leaving {} unsigned", artifact.display());
        return Ok(());
    };

    tracing::info!("Signing {}", artifact.display());
    let apksigner = find_build_tools(sdk_root)?.join("apksigner");
    let args = signer_args(signing, artifact);

    let status = process::run(&apksigner, &args, None).map_err(|e| SignError::Spawn {
        error: e.to_string(),
    })?;
    if !status.success() {
        return Err(SignError::SignerFailed {
            path: artifact.to_path_buf(),
        });
    }
    Ok(())
}

/// Build the apksigner argument list for an artifact
pub(crate) fn signer_args(signing: &SigningConfig, artifact: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "sign".into(),
        "--ks".into(),
        signing.key_store.clone().into(),
        "--ks-pass".into(),
        format!("pass:{}", signing.key_store_pass).into(),
        "--ks-key-alias".into(),
        signing.key_alias.clone().into(),
        "--key-pass".into(),
        format!("pass:{}", signing.key_pass).into(),
        "--v1-signer-name".into(),
        defaults::CERT_NAME.into(),
        "--v4-signing-enabled".into(),
        "false".into(),
    ];

    if artifact.extension().is_some_and(|ext| ext == "zip") {
        args.extend([
            "--min-sdk-version".into(),
            defaults::ZIP_MIN_SDK_VERSION.into(),
            "--v2-signing-enabled".into(),
            "false".into(),
            "--v3-signing-enabled".into(),
            "false".into(),
        ]);
    }

    args.push(artifact.as_os_str().to_owned());
    args
}

/// Locate the newest build-tools installation under the SDK root
fn find_build_tools(sdk_root: &Path) -> Result<PathBuf, SignError> {
    let root = sdk_root.join("build-tools");
    let entries = std::fs::read_dir(&root).map_err(|_| SignError::NoBuildTools {
        path: root.clone(),
    })?;

    let mut versions: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    versions.sort();

    match versions.pop() {
        Some(latest) => Ok(root.join(latest)),
        None => Err(SignError::NoBuildTools { path: root }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn signing() -> SigningConfig {
        SigningConfig {
            key_store: "release.jks".to_string(),
            key_store_pass: "storepass".to_string(),
            key_alias: "alias".to_string(),
            key_pass: "keypass".to_string(),
        }
    }

    fn args_for(path: &str) -> Vec<String> {
        signer_args(&signing(), Path::new(path))
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_zip_gets_v1_only_flags() {
        let args = args_for("out/installer.zip");
        assert!(args.contains(&"--min-sdk-version".to_string()));
        assert!(args.contains(&"--v2-signing-enabled".to_string()));
        assert!(args.contains(&"--v3-signing-enabled".to_string()));
        assert_eq!(args.last().unwrap(), "out/installer.zip");
    }

    #[test]
    fn test_apk_keeps_default_schemes() {
        let args = args_for("out/app-release.apk");
        assert!(!args.contains(&"--min-sdk-version".to_string()));
        assert!(!args.contains(&"--v2-signing-enabled".to_string()));
        assert!(args.contains(&"--v4-signing-enabled".to_string()));
    }

    #[test]
    fn test_unknown_extension_gets_base_flags_only() {
        let args = args_for("out/artifact.bin");
        assert!(!args.contains(&"--min-sdk-version".to_string()));
        assert!(!args.contains(&"--v2-signing-enabled".to_string()));
        assert!(args.contains(&"--v1-signer-name".to_string()));
    }

    #[test]
    fn test_base_flags_order() {
        let args = args_for("x.zip");
        assert_eq!(args[0], "sign");
        assert_eq!(args[1], "--ks");
        assert_eq!(args[2], "release.jks");
        assert_eq!(args[4], "pass:storepass");
    }

    #[test]
    fn test_no_credentials_is_noop() {
        let dir = TempDir::new().unwrap();
        // No SDK anywhere near this path, must still succeed
        sign_artifact(&dir.path().join("a.zip"), None, dir.path()).unwrap();
    }

    #[test]
    fn test_find_build_tools_picks_latest() {
        let dir = TempDir::new().unwrap();
        let bt = dir.path().join("build-tools");
        std::fs::create_dir_all(bt.join("29.0.3")).unwrap();
        std::fs::create_dir_all(bt.join("30.0.2")).unwrap();
        let found = find_build_tools(dir.path()).unwrap();
        assert!(found.ends_with("build-tools/30.0.2"));
    }

    #[test]
    fn test_find_build_tools_missing() {
        let dir = TempDir::new().unwrap();
        let err = find_build_tools(dir.path()).unwrap_err();
        assert!(matches!(err, SignError::NoBuildTools { .. }));
    }
}
