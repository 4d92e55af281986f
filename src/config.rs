//! Configuration from the `rc` file.
//!
//! The file lives at `~/.abroad/rc` and holds `key=value` lines:
//!
//! ```text
//! # ledger location (relative paths resolve against this directory)
//! data.location=./crm.db
//! session.location=./session.json
//! session.ttl_hours=12
//! ```
//!
//! Unknown keys are ignored with a warning; missing keys fall back to defaults.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
/// One year
pub const MAX_SESSION_TTL_HOURS: i64 = 8760;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub session_location: PathBuf,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Directory holding the rc file, the default ledger and the session marker
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".abroad")
    }

    /// Get the configuration file path
    pub fn rc_path() -> PathBuf {
        Self::home_dir().join("rc")
    }

    pub fn defaults(base: &Path) -> Self {
        Self {
            data_location: base.join("crm.db"),
            session_location: base.join("session.json"),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }

    /// Load the rc file if present, defaults otherwise
    pub fn load() -> Result<Self> {
        let rc_path = Self::rc_path();
        let base = Self::home_dir();
        if !rc_path.exists() {
            return Ok(Self::defaults(&base));
        }
        let content = std::fs::read_to_string(&rc_path)
            .with_context(|| format!("Failed to read config file: {}", rc_path.display()))?;
        Self::parse(&content, &base)
    }

    /// Parse rc content; relative paths resolve against `base`
    pub fn parse(content: &str, base: &Path) -> Result<Self> {
        let mut config = Self::defaults(base);
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("rc line {}: expected key=value, ignoring '{}'", lineno + 1, line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => config.data_location = resolve(base, value),
                "session.location" => config.session_location = resolve(base, value),
                "session.ttl_hours" => {
                    config.session_ttl_hours = value.parse::<i64>()
                        .ok()
                        .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
                        .with_context(|| format!(
                            "rc line {}: session.ttl_hours must be between 1 and {}",
                            lineno + 1,
                            MAX_SESSION_TTL_HOURS
                        ))?;
                }
                other => log::warn!("rc line {}: unknown key '{}'", lineno + 1, other),
            }
        }
        Ok(config)
    }
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("", Path::new("/home/x/.abroad")).unwrap();
        assert_eq!(config.data_location, PathBuf::from("/home/x/.abroad/crm.db"));
        assert_eq!(config.session_location, PathBuf::from("/home/x/.abroad/session.json"));
        assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let content = "# comment\ndata.location=./custom.db\nsession.location=/tmp/s.json\n";
        let config = Config::parse(content, Path::new("/base")).unwrap();
        assert_eq!(config.data_location, PathBuf::from("/base/./custom.db"));
        assert_eq!(config.session_location, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn test_ttl_validation() {
        let config = Config::parse("session.ttl_hours=2", Path::new("/b")).unwrap();
        assert_eq!(config.session_ttl_hours, 2);
        assert!(Config::parse("session.ttl_hours=0", Path::new("/b")).is_err());
        assert!(Config::parse("session.ttl_hours=abc", Path::new("/b")).is_err());
        assert!(Config::parse("session.ttl_hours=8760", Path::new("/b")).is_ok());
        assert!(Config::parse("session.ttl_hours=8761", Path::new("/b")).is_err());
        assert!(Config::parse("session.ttl_hours=9000000000000000", Path::new("/b")).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = Config::parse("color=always\nnot a pair", Path::new("/b")).unwrap();
        assert_eq!(config, Config::defaults(Path::new("/b")));
    }
}
