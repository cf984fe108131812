//! Image URL, alt text and caption prompts.

use gpui_content_core::{Editor, ImageBlockAttrs, Path, selected_image};
use serde_json::json;

use crate::error::{EditorError, InputError};

/// Accepts `http(s)://`, `data:image/…`, protocol-relative and root-relative URLs.
pub fn normalize_image_url(input: &str) -> Result<String, InputError> {
    let url = input.trim();
    let lower = url.to_ascii_lowercase();
    let accepted = ["http://", "https://", "data:image/"]
        .iter()
        .any(|prefix| lower.starts_with(prefix) && lower.len() > prefix.len())
        || (url.starts_with('/') && url.len() > 1);
    if accepted && !url.chars().any(char::is_whitespace) {
        Ok(url.to_string())
    } else {
        Err(InputError::InvalidImageUrl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTextField {
    Alt,
    Caption,
}

impl ImageTextField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Alt => "alt",
            Self::Caption => "caption",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Alt => "Alt text",
            Self::Caption => "Caption",
        }
    }

    pub fn read(self, attrs: &ImageBlockAttrs) -> &str {
        match self {
            Self::Alt => &attrs.alt,
            Self::Caption => &attrs.caption,
        }
    }
}

/// An alt or caption prompt seeded from one image block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTextPrompt {
    pub path: Path,
    pub field: ImageTextField,
    pub initial: String,
}

impl ImageTextPrompt {
    pub fn for_selection(editor: &Editor, field: ImageTextField) -> Option<Self> {
        let (path, attrs) = selected_image(editor)?;
        Some(Self {
            path,
            initial: field.read(&attrs).to_string(),
            field,
        })
    }

    pub fn at(editor: &Editor, path: Path, field: ImageTextField) -> Option<Self> {
        let attrs = editor.doc().node(&path).and_then(ImageBlockAttrs::from_node)?;
        Some(Self {
            path,
            initial: field.read(&attrs).to_string(),
            field,
        })
    }

    /// `None` is a cancelled prompt and leaves the node alone. Returns whether
    /// the document changed.
    pub fn submit(&self, editor: &mut Editor, answer: Option<&str>) -> Result<bool, EditorError> {
        let Some(answer) = answer else {
            return Ok(false);
        };
        let value = answer.trim();
        let current = match editor.doc().node(&self.path) {
            Some(node) if node.is_image_block() => ImageBlockAttrs::from_node(node),
            _ => None,
        }
        .ok_or(EditorError::NoImageSelected)?;
        if self.field.read(&current) == value {
            return Ok(false);
        }

        let mut args = json!({ "path": self.path });
        args[self.field.key()] = json!(value);
        editor.run_command("image.set_attrs", Some(args))?;
        Ok(true)
    }
}
