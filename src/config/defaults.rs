//! Default configuration values and fixed build constants

/// Alignment unit for the update-binary blob
pub const BLOCK_SIZE: usize = 1024;

/// Placeholder in the update-binary script replaced with the block count
pub const BLOCK_COUNT_TOKEN: &str = "__X86_CNT__";

/// Placeholder in util_functions.sh replaced with version information
pub const VERSION_STUB_TOKEN: &str = "#MAGISK_VERSION_STUB";

/// 32-bit ABI directories produced by the native build
pub const ARCHS_32: &[&str] = &["armeabi-v7a", "x86"];

/// 64-bit ABI directories produced by the native build
pub const ARCHS_64: &[&str] = &["arm64-v8a", "x86_64"];

/// Primary properties file name
pub const DEFAULT_CONFIG_FILE: &str = "config.prop";

/// Secondary, fixed-name properties file
pub const GRADLE_PROPS_FILE: &str = "gradle.properties";

/// Namespace prefix for keys accepted from the secondary properties file
pub const PROP_PREFIX: &str = "flashpack.";

/// Default output directory
pub const DEFAULT_OUT_DIR: &str = "out";

/// Installer archive name
pub const INSTALLER_ZIP: &str = "zip_reverse_shell_install.zip";

/// Uninstaller archive name
pub const UNINSTALLER_ZIP: &str = "zip_reverse_shell_uninstall.zip";

/// v1 signer name passed to apksigner
pub const CERT_NAME: &str = "CERT";

/// Minimum platform version passed to apksigner for flashable zips
pub const ZIP_MIN_SDK_VERSION: &str = "17";

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Download URL for an NDK release zip
pub fn ndk_download_url(ndk_version: &str, os_name: &str) -> String {
    format!("https://dl.google.com/android/repository/android-ndk-r{ndk_version}-{os_name}-x86_64.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndk_download_url() {
        assert_eq!(
            ndk_download_url("21e", "linux"),
            "https://dl.google.com/android/repository/android-ndk-r21e-linux-x86_64.zip"
        );
    }
}
