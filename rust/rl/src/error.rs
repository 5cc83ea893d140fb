use std::path::PathBuf;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_their_message() {
        let err = ConfigError::Validation("gambler.goal must be >= 2".into());
        assert_eq!(
            err.to_string(),
            "config validation error: gambler.goal must be >= 2"
        );
    }

    #[test]
    fn read_errors_name_the_file() {
        let err = ConfigError::FileRead {
            path: PathBuf::from("rl.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "failed to read config file rl.toml: missing");
    }
}
