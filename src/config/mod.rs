mod settings;

pub use settings::{DEFAULT_COMPRESSION_LEVEL, SETTINGS_FILE_NAME, Settings, SettingsError};
