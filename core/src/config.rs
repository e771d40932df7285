//! Settings for running the scenario suite against a PetFriends service.
//!
//! Values come from the process environment, after loading a `.env` file
//! when one exists. Credentials for the valid account are required; every
//! other value has a default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::transport::DEFAULT_MAX_BODY_BYTES;
use crate::types::Credentials;

pub const DEFAULT_BASE_URL: &str = "https://petfriends.skillfactory.ru";
const DEFAULT_INVALID_EMAIL: &str = "invalid@example.com";
const DEFAULT_INVALID_PASSWORD: &str = "invalid-password";
const DEFAULT_INVALID_AUTH_KEY: &str = "invalid-auth-key";
const DEFAULT_IMAGES_DIR: &str = "images";

/// Test fixtures the scenarios read.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub valid: Credentials,
    pub invalid: Credentials,
    pub invalid_auth_key: String,
    pub images_dir: PathBuf,
}

impl Fixtures {
    /// Path of a sample file inside the images directory.
    pub fn image(&self, file_name: &str) -> PathBuf {
        self.images_dir.join(file_name)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub fixtures: Fixtures,
    /// Overall per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub max_body_bytes: u64,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        optional_env_file(dotenvy::dotenv())?;
        Self::from_vars(std::env::vars().collect())
    }

    /// Like `from_env`, but with an explicit `.env` file that must exist.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());
        let or_default = |key: &'static str, default: &str| {
            get(key).map(str::to_string).unwrap_or_else(|| {
                warn!("Missing {key}, defaulting to '{default}'");
                default.to_string()
            })
        };

        let valid = Credentials::new(
            get("PETFRIENDS_VALID_EMAIL").ok_or(ConfigError::Missing("PETFRIENDS_VALID_EMAIL"))?,
            get("PETFRIENDS_VALID_PASSWORD").ok_or(ConfigError::Missing("PETFRIENDS_VALID_PASSWORD"))?,
        );
        let invalid = Credentials::new(
            or_default("PETFRIENDS_INVALID_EMAIL", DEFAULT_INVALID_EMAIL),
            or_default("PETFRIENDS_INVALID_PASSWORD", DEFAULT_INVALID_PASSWORD),
        );

        let timeout = get("PETFRIENDS_TIMEOUT_SECS")
            .map(|s| parse::<u64>("PETFRIENDS_TIMEOUT_SECS", s).map(Duration::from_secs))
            .transpose()?;
        let max_body_bytes = get("PETFRIENDS_MAX_BODY_BYTES")
            .map(|s| parse("PETFRIENDS_MAX_BODY_BYTES", s))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Ok(Self {
            base_url: get("PETFRIENDS_BASE_URL").unwrap_or(DEFAULT_BASE_URL).to_string(),
            fixtures: Fixtures {
                valid,
                invalid,
                invalid_auth_key: or_default("PETFRIENDS_INVALID_AUTH_KEY", DEFAULT_INVALID_AUTH_KEY),
                images_dir: PathBuf::from(or_default("PETFRIENDS_IMAGES_DIR", DEFAULT_IMAGES_DIR)),
            },
            timeout,
            max_body_bytes,
        })
    }
}

/// A missing `.env` is fine; one that exists but cannot be loaded is not.
fn optional_env_file(loaded: dotenvy::Result<PathBuf>) -> Result<(), ConfigError> {
    match loaded {
        Ok(path) => {
            debug!(path = %path.display(), "loaded env file");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(source) => Err(ConfigError::EnvFile {
            path: PathBuf::from(".env"),
            source,
        }),
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PETFRIENDS_VALID_EMAIL", "me@example.com"),
            ("PETFRIENDS_VALID_PASSWORD", "hunter2"),
        ]
    }

    #[test]
    fn defaults_fill_optional_values() {
        let settings = Settings::from_vars(vars(&required())).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.fixtures.valid, Credentials::new("me@example.com", "hunter2"));
        assert_eq!(settings.fixtures.invalid.email, DEFAULT_INVALID_EMAIL);
        assert_eq!(settings.fixtures.invalid_auth_key, DEFAULT_INVALID_AUTH_KEY);
        assert_eq!(settings.fixtures.image("kot.jpg"), PathBuf::from("images/kot.jpg"));
        assert!(settings.timeout.is_none());
        assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn missing_valid_email_is_an_error() {
        let err = Settings::from_vars(vars(&[("PETFRIENDS_VALID_PASSWORD", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PETFRIENDS_VALID_EMAIL")));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = Settings::from_vars(vars(&[
            ("PETFRIENDS_VALID_EMAIL", "me@example.com"),
            ("PETFRIENDS_VALID_PASSWORD", ""),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PETFRIENDS_VALID_PASSWORD")));
    }

    #[test]
    fn overrides_and_numbers_are_parsed() {
        let mut pairs = required();
        pairs.extend([
            ("PETFRIENDS_BASE_URL", "http://127.0.0.1:3000"),
            ("PETFRIENDS_TIMEOUT_SECS", "15"),
            ("PETFRIENDS_MAX_BODY_BYTES", "1024"),
            ("PETFRIENDS_IMAGES_DIR", "/srv/images"),
        ]);
        let settings = Settings::from_vars(vars(&pairs)).unwrap();
        assert_eq!(settings.base_url, "http://127.0.0.1:3000");
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.max_body_bytes, 1024);
        assert_eq!(settings.fixtures.image("file.xml"), PathBuf::from("/srv/images/file.xml"));
    }

    #[test]
    fn absent_env_file_is_tolerated() {
        let missing = dotenvy::Error::Io(std::io::ErrorKind::NotFound.into());
        assert!(optional_env_file(Err(missing)).is_ok());
        assert!(optional_env_file(Ok(PathBuf::from("/srv/.env"))).is_ok());
    }

    #[test]
    fn malformed_env_file_is_an_error() {
        let malformed = dotenvy::Error::LineParse("PETFRIENDS BASE URL".to_string(), 10);
        let err = optional_env_file(Err(malformed)).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));

        let unreadable = dotenvy::Error::Io(std::io::ErrorKind::PermissionDenied.into());
        assert!(optional_env_file(Err(unreadable)).is_err());
    }

    #[test]
    fn explicit_env_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.env");
        std::fs::write(&path, "PETFRIENDS BASE URL\n").unwrap();

        let err = Settings::from_env_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { path: p, .. } if p == path));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut pairs = required();
        pairs.push(("PETFRIENDS_TIMEOUT_SECS", "soon"));
        let err = Settings::from_vars(vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PETFRIENDS_TIMEOUT_SECS", .. }));
    }
}
