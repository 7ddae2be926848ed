use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Direction, agent::Priorities};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Simulation parameters.
///
/// Every key is optional in the TOML form; missing keys take the defaults below.
///
/// ```toml
/// initial_direction = "SOUTH"
/// priorities = ["SOUTH", "EAST", "NORTH", "WEST"]
/// start_boosted = false
/// detect_repeated_states = false
/// max_steps = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub initial_direction: Direction,
    pub priorities: Priorities,
    pub start_boosted: bool,
    /// Also report a loop as soon as a full state repeats. Off by default, so
    /// only a failed look-around ends a run as looped.
    pub detect_repeated_states: bool,
    /// Step cap for running a simulation to completion.
    pub max_steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            initial_direction: Direction::South,
            priorities: Priorities::default(),
            start_boosted: false,
            detect_repeated_states: false,
            max_steps: 10_000,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(SimConfig::from_toml_str("").unwrap(), SimConfig::default());
    }

    #[test]
    fn partial_config_overrides_given_keys() {
        let config = SimConfig::from_toml_str(
            r#"
initial_direction = "EAST"
priorities = ["NORTH", "EAST", "SOUTH", "WEST"]
"#,
        )
        .unwrap();
        assert_eq!(config.initial_direction, Direction::East);
        assert_eq!(
            config.priorities.as_slice(),
            &[Direction::North, Direction::East, Direction::South, Direction::West]
        );
        assert!(!config.detect_repeated_states);
        assert_eq!(config.max_steps, 10_000);
    }

    #[test]
    fn rejects_invalid_priorities_and_unknown_keys() {
        assert!(SimConfig::from_toml_str(r#"priorities = ["NORTH", "NORTH", "EAST", "WEST"]"#).is_err());
        assert!(SimConfig::from_toml_str(r#"priorities = ["NORTH"]"#).is_err());
        assert!(SimConfig::from_toml_str("speed = 3").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "start_boosted = true\nmax_steps = 12").unwrap();
        let config = SimConfig::load(file.path()).unwrap();
        assert!(config.start_boosted);
        assert_eq!(config.max_steps, 12);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
