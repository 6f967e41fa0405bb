//! Environment-driven configuration.

use std::path::PathBuf;

use frontdesk_client::DEFAULT_BASE_URL;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";
pub const DEFAULT_SCOPE: &str = "api://sfam-api/.default";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got '{value}'")]
    InvalidUrl { var: &'static str, value: String },
    #[error("FRONTDESK_SCOPES must name at least one scope")]
    NoScopes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `FRONTDESK_API_URL`
    pub api_url: String,
    /// `FRONTDESK_DATA_DIR`; the platform data directory when unset.
    pub data_dir: Option<PathBuf>,
    /// `FRONTDESK_CLIENT_ID`
    pub client_id: Option<String>,
    /// `FRONTDESK_AUTHORITY`
    pub authority: String,
    /// `FRONTDESK_SCOPES`, comma separated.
    pub scopes: Vec<String>,
    /// `FRONTDESK_ACCESS_TOKEN`: a pre-issued token for headless runs.
    pub access_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
            client_id: None,
            authority: DEFAULT_AUTHORITY.to_string(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            access_token: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(ConfigError::InvalidUrl { var, value })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match non_empty(lookup("FRONTDESK_API_URL")) {
            Some(url) => check_url("FRONTDESK_API_URL", url)?,
            None => defaults.api_url,
        };
        let authority = match non_empty(lookup("FRONTDESK_AUTHORITY")) {
            Some(url) => check_url("FRONTDESK_AUTHORITY", url)?,
            None => defaults.authority,
        };
        let scopes = match lookup("FRONTDESK_SCOPES") {
            Some(raw) => {
                let scopes: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                if scopes.is_empty() {
                    return Err(ConfigError::NoScopes);
                }
                scopes
            }
            None => defaults.scopes,
        };

        Ok(Self {
            api_url,
            data_dir: non_empty(lookup("FRONTDESK_DATA_DIR")).map(PathBuf::from),
            client_id: non_empty(lookup("FRONTDESK_CLIENT_ID")),
            authority,
            scopes,
            access_token: non_empty(lookup("FRONTDESK_ACCESS_TOKEN")),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(AppConfig::from_lookup(|_| None).unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("FRONTDESK_API_URL", "http://localhost:8080/sfam/v1"),
            ("FRONTDESK_DATA_DIR", "/tmp/fd"),
            ("FRONTDESK_SCOPES", "a, b ,,c"),
            ("FRONTDESK_CLIENT_ID", "  "),
        ]))
        .unwrap();
        assert_eq!(cfg.api_url, "http://localhost:8080/sfam/v1");
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/tmp/fd")));
        assert_eq!(cfg.scopes, vec!["a", "b", "c"]);
        assert_eq!(cfg.client_id, None);
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("FRONTDESK_API_URL", "ftp://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "FRONTDESK_API_URL", .. }));
        let err = AppConfig::from_lookup(lookup(&[("FRONTDESK_SCOPES", " , ")])).unwrap_err();
        assert_eq!(err, ConfigError::NoScopes);
    }
}
