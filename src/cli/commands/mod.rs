//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod ndk;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and provision the NDK release the native build expects
    Ndk,
}

/// Verify the build environment and return the SDK root
pub(crate) fn check_environment() -> Result<PathBuf> {
    let sdk_root = std::env::var_os("ANDROID_SDK_ROOT")
        .map(PathBuf::from)
        .context("Please add the Android SDK path to the ANDROID_SDK_ROOT environment variable")?;
    which::which("javac")
        .context("Please install a JDK and make sure 'javac' is available in PATH")?;
    Ok(sdk_root)
}
