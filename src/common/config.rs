//! # Configuration
//!
//! Key-generation settings. They are read from a JSON configuration file and
//! can be overridden through environment variables.
//!
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::common::errors::{Error, Result};
use crate::keys::policy::{self, KeySize};

/// Overrides `KeyConfig::rsa_key_bits`.
pub const ENV_RSA_KEY_BITS: &str = "SEAL_RSA_KEY_BITS";
/// Overrides `KeyConfig::max_parallel_keygen`.
pub const ENV_MAX_PARALLEL: &str = "SEAL_RSA_MAX_PARALLEL";

/// RSA key settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyConfig {
    /// RSA modulus size in bits used when the caller does not pick one.
    #[serde(default = "default_rsa_key_bits")]
    pub rsa_key_bits: u32,
    /// Upper bound on worker threads for batch generation (0 = one per core).
    #[serde(default)]
    pub max_parallel_keygen: usize,
}

fn default_rsa_key_bits() -> u32 {
    policy::DEFAULT_KEY_BITS
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            rsa_key_bits: default_rsa_key_bits(),
            max_parallel_keygen: 0,
        }
    }
}

impl KeyConfig {
    /// Default settings overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides produced by `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_RSA_KEY_BITS) {
            self.rsa_key_bits = value.trim().parse().map_err(|_| {
                Error::Configuration(format!("{ENV_RSA_KEY_BITS} is not a bit count: {value:?}"))
            })?;
        }

        if let Some(value) = lookup(ENV_MAX_PARALLEL) {
            self.max_parallel_keygen = value.trim().parse().map_err(|_| {
                Error::Configuration(format!("{ENV_MAX_PARALLEL} is not a thread count: {value:?}"))
            })?;
        }

        Ok(())
    }

    /// The configured key size, checked against the supported set.
    pub fn key_size(&self) -> Result<KeySize> {
        KeySize::from_bits(self.rsa_key_bits)
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub rsa: KeyConfig,
}

impl ConfigFile {
    /// Loads a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = serde_json::from_str(&contents)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            rsa_key_bits = config.rsa.rsa_key_bits,
            "loaded configuration file"
        );
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_key_config_default() {
        let config = KeyConfig::default();
        assert_eq!(config.rsa_key_bits, 2048);
        assert_eq!(config.max_parallel_keygen, 0);
        assert_eq!(config.key_size().unwrap(), KeySize::Rsa2048);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_RSA_KEY_BITS, "4096"), (ENV_MAX_PARALLEL, " 3 ")]);
        let mut config = KeyConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.rsa_key_bits, 4096);
        assert_eq!(config.max_parallel_keygen, 3);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = KeyConfig::default();
        let result = config.apply_overrides(|name| {
            (name == ENV_RSA_KEY_BITS).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(config.rsa_key_bits, 2048);
    }

    #[test]
    fn test_unsupported_configured_size() {
        let config = KeyConfig {
            rsa_key_bits: 3000,
            ..Default::default()
        };
        assert!(matches!(config.key_size(), Err(Error::UnsupportedKeySize(3000))));
    }

    #[test]
    fn test_config_file_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seal-rsa.json");
        let config = ConfigFile {
            rsa: KeyConfig {
                rsa_key_bits: 3072,
                max_parallel_keygen: 2,
            },
        };
        config.save(&path)?;
        assert_eq!(ConfigFile::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_config_file_defaults_missing_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "rsa": { "max_parallel_keygen": 4 } }"#)?;
        let config = ConfigFile::from_file(&path)?;
        assert_eq!(config.rsa.rsa_key_bits, 2048);
        assert_eq!(config.rsa.max_parallel_keygen, 4);

        fs::write(&path, "{}")?;
        assert_eq!(ConfigFile::from_file(&path)?, ConfigFile::default());
        Ok(())
    }

    #[test]
    fn test_config_file_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ rsa: ").unwrap();
        assert!(matches!(ConfigFile::from_file(&path), Err(Error::Json(_))));
        assert!(matches!(
            ConfigFile::from_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
