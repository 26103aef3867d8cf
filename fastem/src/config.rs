//! Workflow configuration loaded from YAML or JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artefacts::ArtefactConfig;
use crate::batch::ProjectLayout;
use crate::error::{Error, Result};

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Everything a batch run over one stack needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Raw stack directory: one subdirectory per section of pyramidal tiles.
    pub source_dir: PathBuf,
    /// Root of the output project.
    pub project_dir: PathBuf,
    /// Stack name; outputs go to `<project_dir>/<stack>`.
    pub stack: String,
    #[serde(default)]
    pub artefacts: ArtefactConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Write `artefacts.yaml` into each output section directory.
    #[serde(default = "default_true")]
    pub write_reports: bool,
}

impl WorkflowConfig {
    /// Loads and validates a config file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |reason: String| Error::Config {
            path: path.to_path_buf(),
            reason,
        };

        let format =
            common::FileFormat::from_file_name(path).map_err(|e| config_error(e.to_string()))?;
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let config: Self =
            common::deserialize(&bytes, format).map_err(|e| config_error(e.to_string()))?;

        config.validate().map_err(config_error)?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.stack.trim().is_empty() {
            return Err("stack name must not be empty".to_string());
        }
        self.artefacts.validate()
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.project_dir.clone(), self.stack.clone())
    }
}
