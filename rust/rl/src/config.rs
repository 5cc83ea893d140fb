use std::path::Path;

use mdp::Settings;
use tracing::warn;

use crate::envs::{car_rental::CarRentalConfig, gambler::GamblerConfig, gridworld::GridWorldConfig};
use crate::error::ConfigError;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub solver: Settings,
    pub car_rental: CarRentalConfig,
    pub gridworld: GridWorldConfig,
    pub gambler: GamblerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver
            .validate()
            .map_err(|e| ConfigError::Validation(format!("solver: {e}")))?;
        self.car_rental.validate()?;
        self.gridworld.validate()?;
        self.gambler.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp::{ActionCheck, UpdateMode};

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.solver.theta, 1e-3);
        assert_eq!(config.car_rental.max_cars, 20);
        assert_eq!(config.gridworld.size, 4);
        assert_eq!(config.gambler.goal, 100);
    }

    #[test]
    fn sections_may_be_partial() {
        let config = AppConfig::parse(
            r#"
            [solver]
            theta = 1e-6
            mode = "in-place"
            check = "clamp"

            [gambler]
            p_head = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.solver.theta, 1e-6);
        assert_eq!(config.solver.mode, UpdateMode::InPlace);
        assert_eq!(config.solver.check, ActionCheck::Clamp);
        assert_eq!(config.gambler.p_head, 0.25);
        assert_eq!(config.gambler.goal, 100);
        assert_eq!(config.car_rental, CarRentalConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::parse("[gridworld]\nsides = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let config = AppConfig::parse("[solver]\ntheta = -1.0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = AppConfig::parse("[gambler]\np_head = 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.gridworld, GridWorldConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rl.toml");
        let mut config = AppConfig::default();
        config.car_rental.max_cars = 8;
        config.solver.mode = UpdateMode::InPlace;

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        assert_eq!(loaded.car_rental.max_cars, 8);
        assert_eq!(loaded.solver.mode, UpdateMode::InPlace);
    }
}
