use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

pub fn get_file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|os_str| os_str.to_str())
}

/// Text formats accepted for configuration files and reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_file_name<P: AsRef<Path>>(path: P) -> FileFormatResult<Self> {
        let path = path.as_ref();
        let ext = get_file_extension(path).ok_or(FileExtensionError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileExtensionError::UnsupportedFileExtension(
                path.display().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_extensions_are_case_insensitive() {
        assert_eq!(
            FileFormat::from_file_name("config.yaml").unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_file_name("config.YML").unwrap(),
            FileFormat::Yaml
        );
    }

    #[test]
    fn json_extension() {
        assert_eq!(
            FileFormat::from_file_name("/tmp/report.json").unwrap(),
            FileFormat::Json
        );
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert!(matches!(
            FileFormat::from_file_name("config"),
            Err(FileExtensionError::MissingFileExtension)
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            FileFormat::from_file_name("config.toml"),
            Err(FileExtensionError::UnsupportedFileExtension(_))
        ));
    }
}
