//! Error types for flashpack
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a properties file
    #[error("Failed to read properties file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// versionCode missing or not an integer
    #[error("Config error: \"versionCode\" is required to be an integer")]
    VersionCode,

    /// keyStore is configured but a companion signing key is missing
    #[error("Config error: \"{key}\" is required when \"keyStore\" is set")]
    MissingSigningKey { key: String },

    /// Failed to create the output directory
    #[error("Failed to create output directory '{path}': {error}")]
    CreateOutDir { path: PathBuf, error: String },

    /// Failed to read git metadata for the default version string
    #[error("Failed to read git metadata: {error}")]
    GitMetadata { error: String },
}

/// Update-binary packing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackError {
    /// Block-count placeholder not found in the script template
    #[error("Placeholder '{token}' not found in the update-binary script template")]
    TokenMissing { token: String },

    /// Substituted script does not fit in the header block
    #[error("Substituted script is {len} bytes but the header block is only {block_size} bytes")]
    ScriptTooLong { len: usize, block_size: usize },

    /// An embedded executable is empty
    #[error("Embedded {slot} binary is empty, build the native binaries first")]
    EmptyBinary { slot: &'static str },

    /// Block size must be positive
    #[error("Block size must be a positive number of bytes")]
    ZeroBlockSize,
}

/// Embedded-binary header generation errors
#[derive(Error, Debug)]
pub enum DumpError {
    /// A native binary required for header generation is missing
    #[error("'{path}' does not exist, build \"{target}\" before building \"magiskinit\"")]
    MissingBinary { path: PathBuf, target: String },

    /// The stub APK required for header generation is missing
    #[error("'{path}' does not exist, build the stub APK before building \"magiskinit\"")]
    MissingStub { path: PathBuf },

    /// XZ encoder error
    #[error("XZ stream error: {0}")]
    XzStream(String),

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Flashable archive assembly errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A required source entry is missing
    #[error("'{path}' does not exist! Try build 'binary' and 'apk' before zipping!")]
    MissingSource { path: PathBuf },

    /// The version placeholder is missing from the utilities script
    #[error("Placeholder '{token}' not found in '{path}'")]
    PlaceholderMissing { token: String, path: PathBuf },

    /// Update-binary packing failed
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Zip writer error
    #[error("Zip error for '{path}': {error}")]
    Zip { path: PathBuf, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Native and APK build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Installed NDK revision does not match the configured one
    #[error("Incorrect NDK revision '{found}' (expected '{expected}'). Install it with 'flashpack ndk'")]
    NdkMismatch { found: String, expected: String },

    /// ndk-build exited with a non-zero status
    #[error("Build binary failed for flags '{flags}'")]
    NdkBuildFailed { flags: String },

    /// Gradle exited with a non-zero status
    #[error("Build {module} failed!")]
    GradleFailed { module: String },

    /// Failed to spawn an external tool
    #[error("Failed to run '{tool}': {error}")]
    Spawn { tool: String, error: String },
}

/// Artifact signing errors
#[derive(Error, Debug)]
pub enum SignError {
    /// No build-tools installation found under the SDK root
    #[error("No build-tools found under '{path}'")]
    NoBuildTools { path: PathBuf },

    /// apksigner exited with a non-zero status
    #[error("Signing '{path}' failed!")]
    SignerFailed { path: PathBuf },

    /// Failed to spawn apksigner
    #[error("Failed to run apksigner: {error}")]
    Spawn { error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{target}': {error}")]
    CopyFile {
        from: PathBuf,
        target: PathBuf,
        error: String,
    },

    /// Failed to move file
    #[error("Failed to move '{from}' to '{target}': {error}")]
    MoveFile {
        from: PathBuf,
        target: PathBuf,
        error: String,
    },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },

    /// Archive extraction failed
    #[error("Failed to extract '{archive}': {error}")]
    ExtractError { archive: PathBuf, error: String },
}
