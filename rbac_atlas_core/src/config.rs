//! `RbacOpsConfig` — optional config-file overrides, loaded from
//! `--config`/`RBAC_OPS_CONFIG_PATH`. A plain struct of optional fields,
//! loaded once at startup via `serde_yaml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, ErrorKind, Result};

pub const CONFIG_PATH_ENV_VAR: &str = "RBAC_OPS_CONFIG_PATH";

/// Every field is optional: an absent config file, or an absent field
/// within one, simply falls through to the compiled-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacOpsConfig {
    #[serde(default)]
    pub default_concurrency: Option<usize>,
    #[serde(default)]
    pub default_output: Option<String>,
    #[serde(default)]
    pub follow_symlinks: Option<bool>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub http_max_redirects: Option<u8>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl RbacOpsConfig {
    /// Loads `path`, if given, else falls back to `RBAC_OPS_CONFIG_PATH`.
    /// No config path resolving to anything is not an error — the empty
    /// default config is used, matching every field's optional nature.
    pub fn load(explicit_path: Option<&Path>) -> Result<RbacOpsConfig> {
        let resolved = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var(CONFIG_PATH_ENV_VAR).ok().map(std::path::PathBuf::from),
        };

        match resolved {
            Some(path) => RbacOpsConfig::from_file(&path),
            None => Ok(RbacOpsConfig::default()),
        }
    }

    fn from_file(path: &Path) -> Result<RbacOpsConfig> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::from(ErrorKind::IoError(path.display().to_string(), e.to_string())))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| Error::from(ErrorKind::InvalidYaml(path.display().to_string(), e.to_string())).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_path_falls_back_to_defaults() {
        std::env::remove_var(CONFIG_PATH_ENV_VAR);
        let config = RbacOpsConfig::load(None).unwrap();
        assert!(config.default_concurrency.is_none());
    }

    #[test]
    fn loads_and_overrides_from_a_config_file() {
        let path = std::env::temp_dir().join(format!(
            "rbac-atlas-config-test-{:?}.yaml",
            std::thread::current().id()
        ));
        fs::write(&path, "defaultConcurrency: 8\nfollowSymlinks: true\n").unwrap();
        let config = RbacOpsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_concurrency, Some(8));
        assert_eq!(config.follow_symlinks, Some(true));
        fs::remove_file(&path).ok();
    }
}
