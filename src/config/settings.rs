use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::data::LogLevel;
use crate::ext::BestEffortPathExt;
use crate::write_back::FlushPolicy;

pub const SETTINGS_FILE_NAME: &str = "folio.yaml";
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

const FLUSH_POLICY_KEY: &str = "flush_policy";
const COMPRESSION_LEVEL_KEY: &str = "compression_level";
const LOG_LEVEL_KEY: &str = "log_level";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub flush_policy: FlushPolicy,
    /// zstd level used when writing archives.
    pub compression_level: i32,
    pub log_level: Option<LogLevel>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flush_policy: FlushPolicy::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            log_level: None,
        }
    }
}

impl Settings {
    /// Reads `folio.yaml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub async fn read(root: &Path) -> Result<Self, SettingsError> {
        let path = root.join(SETTINGS_FILE_NAME);
        let missing = matches!(
            fs::metadata(&path).await,
            Err(error) if error.kind() == io::ErrorKind::NotFound
        );
        if missing {
            info!(
                "No settings file at {}, using defaults",
                path.best_effort_path_display()
            );
            return Ok(Self::default());
        }
        Self::from_path(path).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, SettingsError> {
        debug!("Reading settings file: {}", path.best_effort_path_display());
        let bytes = fs::read(&path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    fn apply(&mut self, key: &str, value: &Yaml) -> Result<(), SettingsError> {
        match key {
            FLUSH_POLICY_KEY => {
                self.flush_policy = value
                    .as_str()
                    .and_then(|text| text.parse().ok())
                    .context(InvalidValueSnafu {
                        key,
                        value: format!("{value:?}"),
                    })?;
            }
            COMPRESSION_LEVEL_KEY => {
                self.compression_level = match value {
                    Yaml::Value(Scalar::Integer(level)) if (1..=22).contains(level) => {
                        *level as i32
                    }
                    _ => {
                        return InvalidValueSnafu {
                            key,
                            value: format!("{value:?}"),
                        }
                        .fail();
                    }
                };
            }
            LOG_LEVEL_KEY => {
                self.log_level = Some(
                    value
                        .as_str()
                        .and_then(|text| LogLevel::from_str(text, true).ok())
                        .context(InvalidValueSnafu {
                            key,
                            value: format!("{value:?}"),
                        })?,
                );
            }
            _ => warn!("Ignoring unknown settings key '{}'", key),
        }
        Ok(())
    }

    fn from_yaml_mapping(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        for (key, value) in top_level.iter() {
            match key.as_str() {
                Some(name) => settings.apply(name, value)?,
                None => debug!("Skipping non-string settings key: {:?}", key),
            }
        }
        Ok(settings)
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents
            .first()
            .ok_or(SettingsError::MalformedConfig)?;
        let top_level = document
            .as_mapping()
            .ok_or(SettingsError::TopLevelNotMap)?;

        let settings = Self::from_yaml_mapping(top_level)?;
        debug!("Parsed settings: {:?}", settings);
        Ok(settings)
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Settings file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted settings file"))]
    MalformedConfig,
    #[snafu(display("Top level of the settings file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Invalid value for '{}': {}", key, value))]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    #[compio::test]
    async fn missing_settings_file_yields_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::read(dir.path()).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[compio::test]
    async fn settings_are_read_from_the_root() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "flush_policy: strict\ncompression_level: 9\n",
        )
        .unwrap();

        let settings = Settings::read(dir.path()).await.unwrap();

        assert_eq!(settings.flush_policy, FlushPolicy::Strict);
        assert_eq!(settings.compression_level, 9);
        assert_eq!(settings.log_level, None);
    }

    #[compio::test]
    async fn nonexistent_explicit_path_is_an_error() {
        let result = Settings::from_path(PathBuf::from("nonexistent.yaml")).await;
        assert!(matches!(result, Err(SettingsError::ReadError { .. })));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let result: Result<Settings, _> = "invalid: yaml: content: [unclosed".try_into();
        assert!(matches!(result, Err(SettingsError::ParseError { .. })));
    }

    #[test]
    fn empty_file_is_malformed() {
        let result: Result<Settings, _> = "".try_into();
        assert!(matches!(result, Err(SettingsError::MalformedConfig)));
    }

    #[rstest]
    #[case("- item1\n- item2")]
    #[case("just a string")]
    fn top_level_must_be_a_map(#[case] contents: &str) {
        let result: Result<Settings, _> = contents.try_into();
        assert!(matches!(result, Err(SettingsError::TopLevelNotMap)));
    }

    #[test]
    fn full_settings_are_parsed() {
        let contents = "flush_policy: Strict\ncompression_level: 19\nlog_level: debug\n";
        let settings: Settings = contents.try_into().unwrap();
        assert_eq!(
            settings,
            Settings {
                flush_policy: FlushPolicy::Strict,
                compression_level: 19,
                log_level: Some(LogLevel::Debug),
            }
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings: Settings = "theme: dark\n123: numeric".try_into().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[rstest]
    #[case("flush_policy: eager", "flush_policy")]
    #[case("flush_policy: 3", "flush_policy")]
    #[case("compression_level: 0", "compression_level")]
    #[case("compression_level: 23", "compression_level")]
    #[case("compression_level: fast", "compression_level")]
    #[case("log_level: loud", "log_level")]
    fn invalid_values_name_their_key(#[case] contents: &str, #[case] expected_key: &str) {
        let result: Result<Settings, _> = contents.try_into();
        match result {
            Err(SettingsError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }
}
