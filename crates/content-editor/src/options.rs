use std::path::Path;

use gpui_content_core::{DEFAULT_TABLE_COLS, DEFAULT_TABLE_ROWS, EditorConfig, clamp_percent};
use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Environment variable naming a JSON options file.
pub const OPTIONS_ENV: &str = "CONTENT_EDITOR_OPTIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefaults {
    pub rows: usize,
    pub cols: usize,
    pub header: bool,
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            rows: DEFAULT_TABLE_ROWS,
            cols: DEFAULT_TABLE_COLS,
            header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub trigger_char: char,
    pub max_suggestions: usize,
    pub placeholder: String,
    pub default_table: TableDefaults,
    pub default_image_width: u32,
    pub enable_slash_commands: bool,
    pub max_undo: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            trigger_char: '/',
            max_suggestions: 10,
            placeholder: "Type / for commands".to_string(),
            default_table: TableDefaults::default(),
            default_image_width: 100,
            enable_slash_commands: true,
            max_undo: 200,
        }
    }
}

impl EditorOptions {
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.sanitized())
    }

    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let json = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reads the file named by [`OPTIONS_ENV`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, OptionsError> {
        match std::env::var_os(OPTIONS_ENV) {
            Some(path) if !path.is_empty() => {
                let options = Self::from_file(Path::new(&path))?;
                tracing::info!(path = ?path, "loaded editor options");
                Ok(options)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            max_undo: self.max_undo,
            ..EditorConfig::default()
        }
    }

    fn sanitized(mut self) -> Self {
        self.default_image_width = clamp_percent(self.default_image_width);
        if self.max_suggestions == 0 {
            self.max_suggestions = Self::default().max_suggestions;
        }
        self.default_table.rows = self.default_table.rows.max(1);
        self.default_table.cols = self.default_table.cols.max(1);
        self
    }
}
