//! Build configuration
//!
//! Loads the layered property files into one immutable [`Config`] value
//! that is passed by reference into every component that needs it.
//! Nothing mutates the configuration after [`Config::load`] returns.

pub mod defaults;
pub mod props;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::infra::git;

/// Signing credentials, present only when `keyStore` is configured
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Key store path
    pub key_store: String,
    /// Key store passphrase
    pub key_store_pass: String,
    /// Key alias
    pub key_alias: String,
    /// Key passphrase
    pub key_pass: String,
}

/// Immutable build configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Version string, defaults to the short git commit hash
    pub version: String,
    /// Integer version code, mandatory
    pub version_code: i64,
    /// Output directory for built artifacts
    pub out_dir: PathBuf,
    /// NDK release to download with `flashpack ndk`
    pub ndk_version: Option<String>,
    /// Full NDK revision expected by the native build
    pub full_ndk_version: Option<String>,
    /// Signing credentials, if any
    pub signing: Option<SigningConfig>,
}

impl Config {
    /// Load and merge the property files for a project
    ///
    /// Merge order: defaults, then the primary file at `config_path` (if
    /// it exists), then `gradle.properties` keys carrying the
    /// `flashpack.` prefix (stripped before merge). Creates the output
    /// directory.
    pub fn load(project_dir: &Path, config_path: &Path) -> Result<Self, ConfigError> {
        let primary = if config_path.exists() {
            props::parse_props(config_path)?
        } else {
            BTreeMap::new()
        };
        let secondary = props::parse_props(&project_dir.join(defaults::GRADLE_PROPS_FILE))?;

        let mut merged = merge_props(primary, secondary);
        if !merged.contains_key("version") {
            let hash = git::short_hash(project_dir).map_err(|e| ConfigError::GitMetadata {
                error: e.to_string(),
            })?;
            merged.insert("version".to_string(), hash);
        }

        let config = Self::from_props(&merged)?;

        let out_dir = config.out_dir_in(project_dir);
        std::fs::create_dir_all(&out_dir).map_err(|e| ConfigError::CreateOutDir {
            path: out_dir.clone(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Build a configuration from an already-merged property map
    pub fn from_props(props: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let version = props.get("version").cloned().unwrap_or_default();
        let out_dir = PathBuf::from(
            props
                .get("outdir")
                .map_or(defaults::DEFAULT_OUT_DIR, String::as_str),
        );

        let version_code = props
            .get("versionCode")
            .ok_or(ConfigError::VersionCode)?
            .parse::<i64>()
            .map_err(|_| ConfigError::VersionCode)?;

        let signing = match props.get("keyStore") {
            Some(key_store) => Some(SigningConfig {
                key_store: key_store.clone(),
                key_store_pass: require_signing_key(props, "keyStorePass")?,
                key_alias: require_signing_key(props, "keyAlias")?,
                key_pass: require_signing_key(props, "keyPass")?,
            }),
            None => None,
        };

        Ok(Self {
            version,
            version_code,
            out_dir,
            ndk_version: props.get("ndkVersion").cloned(),
            full_ndk_version: props.get("fullNdkVersion").cloned(),
            signing,
        })
    }

    /// Resolve the output directory against the project root
    pub fn out_dir_in(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.out_dir)
    }
}

/// Merge the two property sources left to right over the defaults
///
/// The secondary source only contributes keys carrying the
/// [`defaults::PROP_PREFIX`] namespace prefix, which is stripped.
pub fn merge_props(
    primary: BTreeMap<String, String>,
    secondary: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    merged.insert("outdir".to_string(), defaults::DEFAULT_OUT_DIR.to_string());
    merged.extend(primary);
    for (key, value) in secondary {
        if let Some(stripped) = key.strip_prefix(defaults::PROP_PREFIX) {
            merged.insert(stripped.to_string(), value);
        }
    }
    merged
}

fn require_signing_key(
    props: &BTreeMap<String, String>,
    key: &str,
) -> Result<String, ConfigError> {
    props
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingSigningKey {
            key: key.to_string(),
        })
}
