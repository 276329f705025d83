//! Config and data directory resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolves the config file path.
///
/// - If `dir` is `Some`, returns `{dir}/config.toml`.
/// - Otherwise returns `~/.config/tgsignal/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join("config.toml"));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("tgsignal")
        .join("config.toml"))
}

/// Resolves the data directory (log file while the dashboard runs).
///
/// - If `dir` is `Some`, returns `dir`.
/// - Otherwise returns `~/.local/share/tgsignal`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_data_dir(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.clone());
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("tgsignal"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_resolve_with_dir() {
        // Arrange
        let dir = PathBuf::from("/tmp/signals");

        // Act
        let config = resolve_config_path(Some(&dir)).unwrap();
        let data = resolve_data_dir(Some(&dir)).unwrap();

        // Assert
        assert_eq!(config, PathBuf::from("/tmp/signals/config.toml"));
        assert_eq!(data, dir);
    }

    #[test]
    fn test_resolve_default() {
        // Arrange & Act
        let config = resolve_config_path(None).unwrap();
        let data = resolve_data_dir(None).unwrap();

        // Assert
        assert!(config.ends_with(".config/tgsignal/config.toml"));
        assert!(data.ends_with(".local/share/tgsignal"));
    }
}
