//! Native binary builds
//!
//! Drives ndk-build for the requested target set and collects the
//! produced binaries into `native/out`. The compiler itself is an
//! external collaborator; only its exit status matters here.

use std::ffi::OsString;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};

use crate::config::{defaults, props, Config};
use crate::core::dump;
use crate::error::BuildError;
use crate::infra::{filesystem, git, process};

/// Native build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Magisk,
    MagiskInit,
    MagiskBoot,
    MagiskPolicy,
    ResetProp,
    BusyBox,
    Test,
}

impl BuildTarget {
    /// All supported targets, in build order
    pub const SUPPORTED: &'static [BuildTarget] = &[
        Self::Magisk,
        Self::MagiskInit,
        Self::MagiskBoot,
        Self::MagiskPolicy,
        Self::ResetProp,
        Self::BusyBox,
        Self::Test,
    ];

    /// Targets built when none are requested explicitly
    pub const DEFAULT: &'static [BuildTarget] = &[
        Self::Magisk,
        Self::MagiskInit,
        Self::MagiskBoot,
        Self::BusyBox,
    ];

    /// Target name as used on disk and in requests
    pub fn name(self) -> &'static str {
        match self {
            Self::Magisk => "magisk",
            Self::MagiskInit => "magiskinit",
            Self::MagiskBoot => "magiskboot",
            Self::MagiskPolicy => "magiskpolicy",
            Self::ResetProp => "resetprop",
            Self::BusyBox => "busybox",
            Self::Test => "test",
        }
    }
}

/// Resolve a requested target list against the supported set
///
/// An empty request selects the default targets. Unknown names are
/// dropped; a non-empty request whose intersection with the supported
/// set is empty resolves to an empty list, which builds nothing.
pub fn resolve_targets(requested: &[String]) -> Vec<BuildTarget> {
    if requested.is_empty() {
        return BuildTarget::DEFAULT.to_vec();
    }
    BuildTarget::SUPPORTED
        .iter()
        .copied()
        .filter(|target| requested.iter().any(|name| name == target.name()))
        .collect()
}

/// Build the requested native targets
pub fn build_binaries(
    project_dir: &Path,
    config: &Config,
    config_path: &Path,
    sdk_root: &Path,
    requested: &[String],
    release: bool,
) -> Result<()> {
    let ndk_path = sdk_root.join("ndk").join("magisk");
    verify_ndk(&ndk_path, config)?;

    let targets = resolve_targets(requested);
    if targets.is_empty() {
        tracing::info!("No supported targets requested, nothing to build");
        return Ok(());
    }

    let names: Vec<&str> = targets.iter().map(|t| t.name()).collect();
    tracing::info!("Building binaries: {}", names.join(" "));

    refresh_flags(project_dir, config_path)?;

    let mut base_flags = vec![
        format!("MAGISK_VERSION={}", config.version),
        format!("MAGISK_VER_CODE={}", config.version_code),
    ];
    if !release {
        base_flags.push("MAGISK_DEBUG=1".to_string());
    }

    let ndk_build = ndk_path.join("ndk-build");
    let out_dir = config.out_dir_in(project_dir);

    for target in targets {
        match target {
            BuildTarget::Magisk => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_MAGISK=1", "B_64BIT=1"])?;
                clean_elf(project_dir)?;
            }
            BuildTarget::MagiskInit => {
                dump::dump_bin_headers(project_dir, &out_dir)?;
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_INIT=1"])?;
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_INIT64=1"])?;
            }
            BuildTarget::MagiskBoot => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_BOOT=1"])?;
            }
            BuildTarget::MagiskPolicy => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_POLICY=1"])?;
            }
            BuildTarget::ResetProp => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_PROP=1"])?;
            }
            BuildTarget::BusyBox => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_BB=1"])?;
            }
            BuildTarget::Test => {
                run_ndk_build(project_dir, &ndk_build, &base_flags, &["B_TEST=1", "B_64BIT=1"])?;
            }
        }
    }

    Ok(())
}

/// Verify the installed NDK revision matches the configured one
fn verify_ndk(ndk_path: &Path, config: &Config) -> Result<()> {
    let expected = config
        .full_ndk_version
        .as_deref()
        .context("Config error: \"fullNdkVersion\" is required to build native binaries")?;
    let source_props = props::parse_props(&ndk_path.join("source.properties"))
        .context("NDK not found. Install it with 'flashpack ndk'")?;
    let found = source_props
        .get("Pkg.Revision")
        .context("NDK source.properties has no Pkg.Revision")?;
    if found != expected {
        bail!(BuildError::NdkMismatch {
            found: found.clone(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Bump flags.hpp when the configuration or the last commit is newer
///
/// The header carries version macros, so a stale mtime would let
/// ndk-build skip recompiling version-stamped objects.
fn refresh_flags(project_dir: &Path, config_path: &Path) -> Result<()> {
    let flags = project_dir.join("native/jni/include/flags.hpp");
    let flags_mtime = std::fs::metadata(&flags)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat '{}'", flags.display()))?;

    let mut stale = false;
    if let Ok(meta) = std::fs::metadata(config_path) {
        if let Ok(mtime) = meta.modified() {
            stale |= mtime > flags_mtime;
        }
    }

    let last_commit = git::last_commit_timestamp(project_dir)?;
    let commit_time = SystemTime::UNIX_EPOCH + Duration::from_secs(last_commit.max(0) as u64);
    stale |= commit_time > flags_mtime;

    if stale {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&flags)
            .with_context(|| format!("Failed to open '{}'", flags.display()))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("Failed to touch '{}'", flags.display()))?;
        tracing::debug!("Touched {}", flags.display());
    }
    Ok(())
}

/// Run one ndk-build pass and collect the produced binaries
fn run_ndk_build(
    project_dir: &Path,
    ndk_build: &Path,
    base_flags: &[String],
    extra_flags: &[&str],
) -> Result<()> {
    let mut args: Vec<OsString> = base_flags.iter().map(Into::into).collect();
    args.extend(extra_flags.iter().map(Into::into));
    args.push(format!("-j{}", num_cpus::get()).into());

    let status = process::run(ndk_build, &args, Some(&project_dir.join("native"))).map_err(
        |e| BuildError::Spawn {
            tool: ndk_build.display().to_string(),
            error: e.to_string(),
        },
    )?;
    if !status.success() {
        bail!(BuildError::NdkBuildFailed {
            flags: extra_flags.join(" "),
        });
    }

    collect_binaries(project_dir)?;
    Ok(())
}

/// Move freshly built binaries from `native/libs` into `native/out`
///
/// Targets that were not part of this pass have no libs entry; those
/// are skipped. Real move failures propagate.
fn collect_binaries(project_dir: &Path) -> Result<()> {
    let libs = project_dir.join("native").join("libs");
    let out = project_dir.join("native").join("out");

    for arch in defaults::ARCHS_32.iter().chain(defaults::ARCHS_64) {
        filesystem::mkdir_p(&out.join(arch))?;
        for target in BuildTarget::SUPPORTED {
            move_if_built(&libs, &out, arch, target.name())?;
        }
        move_if_built(&libs, &out, arch, "magiskinit64")?;
    }
    Ok(())
}

fn move_if_built(libs: &Path, out: &Path, arch: &str, name: &str) -> Result<()> {
    let source = libs.join(arch).join(name);
    if source.exists() {
        filesystem::mv(&source, &out.join(arch).join(name))?;
    }
    Ok(())
}

/// Strip unsupported dynamic section entries from the magisk binaries
///
/// Builds the cleaner from the vendored termux-elf-cleaner source when
/// no prebuilt exists. A cleaner failure is cosmetic and only logged.
fn clean_elf(project_dir: &Path) -> Result<()> {
    let elf_cleaner = project_dir.join("native/out/elf-cleaner");
    if !elf_cleaner.exists() {
        let status = process::run(
            "g++",
            &[
                OsString::from("-std=c++11"),
                "tools/termux-elf-cleaner/termux-elf-cleaner.cpp".into(),
                "-o".into(),
                elf_cleaner.clone().into(),
            ],
            Some(project_dir),
        )
        .map_err(|e| BuildError::Spawn {
            tool: "g++".to_string(),
            error: e.to_string(),
        })?;
        if !status.success() {
            bail!("Failed to compile elf-cleaner");
        }
    }

    let binaries: Vec<OsString> = defaults::ARCHS_32
        .iter()
        .chain(defaults::ARCHS_64)
        .map(|arch| {
            project_dir
                .join("native/out")
                .join(arch)
                .join("magisk")
                .into()
        })
        .collect();
    let status = process::run(&elf_cleaner, &binaries, Some(project_dir)).map_err(|e| {
        BuildError::Spawn {
            tool: elf_cleaner.display().to_string(),
            error: e.to_string(),
        }
    })?;
    if !status.success() {
        tracing::warn!("elf-cleaner exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_request_selects_defaults() {
        assert_eq!(resolve_targets(&[]), BuildTarget::DEFAULT.to_vec());
    }

    #[test]
    fn test_request_intersects_supported() {
        let targets = resolve_targets(&req(&["busybox", "nonsense", "magisk"]));
        assert_eq!(targets, vec![BuildTarget::Magisk, BuildTarget::BusyBox]);
    }

    #[test]
    fn test_unsupported_only_request_is_noop() {
        assert!(resolve_targets(&req(&["nonsense", "other"])).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let targets = resolve_targets(&req(&["magiskboot", "magiskboot"]));
        assert_eq!(targets, vec![BuildTarget::MagiskBoot]);
    }
}
