//! The optional `appsettings.json` settings file.
//!
//! Keys are matched case-insensitively; string values may be wrapped in
//! matching single or double quotes, which are stripped before use. Numeric
//! options accept either a JSON number or a quoted digit string.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;
use crate::trim_quotes;

#[derive(Debug, Default)]
pub(crate) struct FileSettings {
    entries: HashMap<String, Value>,
}

impl FileSettings {
    /// Loads the settings file when present; a missing file is an empty set.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let value: Value =
            serde_json::from_str(&contents).map_err(|e| ConfigError::FileParse(e.to_string()))?;

        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ConfigError::FileParse(format!(
                    "expected a JSON object, found {other}"
                )))
            }
        };

        let entries = object
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        Ok(Self { entries })
    }

    pub(crate) fn string(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(trim_quotes(s).to_string())),
            Some(_) => Err(ConfigError::WrongType(key)),
        }
    }

    pub(crate) fn u64(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or(ConfigError::WrongType(key)),
            Some(Value::String(s)) => trim_quotes(s)
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::WrongType(key)),
            Some(_) => Err(ConfigError::WrongType(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsettings.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = FileSettings::load(&dir.path().join("appsettings.json")).unwrap();
        assert_eq!(settings.string("interface").unwrap(), None);
    }

    #[test]
    fn keys_fold_case() {
        let (_dir, path) = write_settings(r#"{"Interface": "eth0", "SIZE": 1024}"#);
        let settings = FileSettings::load(&path).unwrap();
        assert_eq!(settings.string("interface").unwrap().as_deref(), Some("eth0"));
        assert_eq!(settings.u64("size").unwrap(), Some(1024));
    }

    #[test]
    fn string_values_are_quote_trimmed() {
        let (_dir, path) = write_settings(r#"{"database": "'mongodb://db'"}"#);
        let settings = FileSettings::load(&path).unwrap();
        assert_eq!(
            settings.string("database").unwrap().as_deref(),
            Some("mongodb://db")
        );
    }

    #[test]
    fn numbers_accept_quoted_digits() {
        let (_dir, path) = write_settings(r#"{"size": "2048"}"#);
        let settings = FileSettings::load(&path).unwrap();
        assert_eq!(settings.u64("size").unwrap(), Some(2048));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let (_dir, path) = write_settings(r#"{"interface": 5, "size": true}"#);
        let settings = FileSettings::load(&path).unwrap();
        assert!(matches!(
            settings.string("interface"),
            Err(ConfigError::WrongType("interface"))
        ));
        assert!(matches!(
            settings.u64("size"),
            Err(ConfigError::WrongType("size"))
        ));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let (_dir, path) = write_settings("{not json");
        assert!(matches!(
            FileSettings::load(&path),
            Err(ConfigError::FileParse(_))
        ));
    }

    #[test]
    fn non_object_root_is_a_parse_error() {
        let (_dir, path) = write_settings("[1, 2]");
        assert!(matches!(
            FileSettings::load(&path),
            Err(ConfigError::FileParse(_))
        ));
    }
}
