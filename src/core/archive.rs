//! Flashable archive assembly
//!
//! Builds the installer and uninstaller zips a recovery-mode updater
//! consumes. The entry set and its order are a protocol shared with the
//! embedded updater-script, so entries are written in one fixed
//! sequence and a missing source is always fatal, never skipped.
//!
//! The archive is written to a temporary path and only renamed into
//! place once the writer has been closed, so a failed assembly leaves
//! no partial zip behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::{defaults, Config};
use crate::core::packer;
use crate::error::ArchiveError;

/// Archive entry path of the update-binary blob
const UPDATE_BINARY: &str = "META-INF/com/google/android/update-binary";

/// Archive entry path of the updater script
const UPDATER_SCRIPT: &str = "META-INF/com/google/android/updater-script";

/// Native output directories and their archive path prefixes
const BIN_PAIRS: &[(&str, &str)] = &[("armeabi-v7a", "arm"), ("x86", "x86")];

/// Installer binaries shipped per architecture
const INSTALLER_BINARIES: &[&str] = &["magiskinit", "magiskinit64", "magiskboot"];

/// Verified-boot signing files shipped under chromeos/
const CHROMEOS_TOOLS: &[&str] = &["futility", "kernel_data_key.vbprivk", "kernel.keyblock"];

/// Which flashable archive to assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Full installer
    Installer,
    /// Uninstaller with the reduced entry set
    Uninstaller,
}

impl ArchiveKind {
    /// Output archive file name
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Installer => defaults::INSTALLER_ZIP,
            Self::Uninstaller => defaults::UNINSTALLER_ZIP,
        }
    }

    /// Source script embedded as the updater-script entry
    fn updater_script(self) -> &'static str {
        match self {
            Self::Installer => "flash_script_revshell.sh",
            Self::Uninstaller => "magisk_uninstaller_revshell.sh",
        }
    }
}

/// Assemble a flashable archive and return its path
pub fn assemble(
    project_dir: &Path,
    config: &Config,
    kind: ArchiveKind,
    release: bool,
) -> Result<PathBuf, ArchiveError> {
    let out_dir = config.out_dir_in(project_dir);
    let output = out_dir.join(kind.file_name());
    let tmp = output.with_extension("zip.tmp");

    tracing::info!("Packing {}", output.display());

    match write_archive(&tmp, project_dir, &out_dir, config, kind, release) {
        Ok(()) => {
            std::fs::rename(&tmp, &output).map_err(|e| ArchiveError::Io {
                path: output.clone(),
                error: e.to_string(),
            })?;
            Ok(output)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Apply the version stamp to the utilities script
///
/// The placeholder is replaced exactly once; everything else is left
/// byte-identical.
pub fn substitute_version(
    script: &str,
    source: &Path,
    config: &Config,
) -> Result<String, ArchiveError> {
    if !script.contains(defaults::VERSION_STUB_TOKEN) {
        return Err(ArchiveError::PlaceholderMissing {
            token: defaults::VERSION_STUB_TOKEN.to_string(),
            path: source.to_path_buf(),
        });
    }
    let stamp = format!(
        "MAGISK_VER=\"{}\"\nMAGISK_VER_CODE={}",
        config.version, config.version_code
    );
    Ok(script.replacen(defaults::VERSION_STUB_TOKEN, &stamp, 1))
}

fn write_archive(
    tmp: &Path,
    project_dir: &Path,
    out_dir: &Path,
    config: &Config,
    kind: ArchiveKind,
    release: bool,
) -> Result<(), ArchiveError> {
    let file = std::fs::File::create(tmp).map_err(|e| ArchiveError::Io {
        path: tmp.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut writer = EntryWriter {
        zip: ZipWriter::new(file),
        options: SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(false),
        archive: tmp.to_path_buf(),
    };

    writer.add_bytes(UPDATE_BINARY, &packer::update_binary(project_dir)?)?;

    let scripts = project_dir.join("scripts");
    writer.add_file(&scripts.join(kind.updater_script()), UPDATER_SCRIPT)?;

    let native_out = project_dir.join("native").join("out");
    match kind {
        ArchiveKind::Installer => {
            for (lib_dir, zip_dir) in BIN_PAIRS {
                for binary in INSTALLER_BINARIES {
                    writer.add_file(
                        &native_out.join(lib_dir).join(binary),
                        &format!("{zip_dir}/{binary}"),
                    )?;
                }
            }

            let apk = if release {
                "app-release.apk"
            } else {
                "app-debug.apk"
            };
            writer.add_file(&out_dir.join(apk), "common/magisk.apk")?;

            writer.add_file(&scripts.join("boot_patch.sh"), "common/boot_patch.sh")?;

            let source = scripts.join("util_functions.sh");
            let script = read_text(&source)?;
            let script = substitute_version(&script, &source, config)?;
            writer.add_bytes("common/util_functions.sh", script.as_bytes())?;

            writer.add_file(&scripts.join("addon.d.sh"), "common/addon.d.sh")?;
        }
        ArchiveKind::Uninstaller => {
            for (lib_dir, zip_dir) in BIN_PAIRS {
                writer.add_file(
                    &native_out.join(lib_dir).join("magiskboot"),
                    &format!("{zip_dir}/magiskboot"),
                )?;
            }

            writer.add_file(&scripts.join("util_functions.sh"), "util_functions.sh")?;
        }
    }

    let tools = project_dir.join("tools");
    for tool in CHROMEOS_TOOLS {
        let source = if *tool == "futility" {
            tools.join(tool)
        } else {
            tools.join("keys").join(tool)
        };
        writer.add_file(&source, &format!("chromeos/{tool}"))?;
    }

    if kind == ArchiveKind::Installer {
        let revshell = project_dir.join("revshell");
        writer.add_file(&revshell.join("revshell.rc"), "revshell/revshell.rc")?;
        writer.add_file(&revshell.join("revshell"), "revshell/revshell")?;
    }

    writer.finish()
}

/// Zip writer with the precondition checks the entry protocol requires
struct EntryWriter {
    zip: ZipWriter<std::fs::File>,
    options: SimpleFileOptions,
    archive: PathBuf,
}

impl EntryWriter {
    fn add_bytes(&mut self, target: &str, data: &[u8]) -> Result<(), ArchiveError> {
        let zip_err = |e: zip::result::ZipError| ArchiveError::Zip {
            path: self.archive.clone(),
            error: e.to_string(),
        };
        self.zip.start_file(target, self.options).map_err(zip_err)?;
        self.zip.write_all(data).map_err(|e| ArchiveError::Io {
            path: self.archive.clone(),
            error: e.to_string(),
        })?;
        tracing::debug!("zip: {target}");
        Ok(())
    }

    fn add_file(&mut self, source: &Path, target: &str) -> Result<(), ArchiveError> {
        if !source.exists() {
            return Err(ArchiveError::MissingSource {
                path: source.to_path_buf(),
            });
        }
        let data = std::fs::read(source).map_err(|e| ArchiveError::Io {
            path: source.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::debug!("zip: {} -> {}", source.display(), target);
        self.add_bytes(target, &data)
    }

    fn finish(mut self) -> Result<(), ArchiveError> {
        self.zip.finish().map_err(|e| ArchiveError::Zip {
            path: self.archive.clone(),
            error: e.to_string(),
        })?;
        Ok(())
    }
}

fn read_text(path: &Path) -> Result<String, ArchiveError> {
    if !path.exists() {
        return Err(ArchiveError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
