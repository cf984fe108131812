use std::borrow::Cow;

use gpui::{AssetSource, Result, SharedString};

/// Asset source for `gpui-content-components`.
///
/// Serves the SVG icon set used by the toolbar, bubble menus and slash menu.
/// Chain it in front of another source to keep that source's assets.
pub struct ContentAssets {
    fallback: Option<Box<dyn AssetSource>>,
}

impl ContentAssets {
    pub fn new() -> Self {
        Self { fallback: None }
    }

    pub fn with_fallback(fallback: impl AssetSource) -> Self {
        Self {
            fallback: Some(Box::new(fallback)),
        }
    }
}

impl Default for ContentAssets {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! icons {
    ($($name:literal),* $(,)?) => {
        &[$((
            concat!("icons/", $name, ".svg"),
            include_bytes!(concat!("../assets/icons/", $name, ".svg")),
        )),*]
    };
}

const ASSETS: &[(&str, &[u8])] = icons![
    "align-center",
    "align-justify",
    "align-left",
    "align-right",
    "baseline",
    "bold",
    "chevron-down",
    "code",
    "code-xml",
    "file-up",
    "heading-1",
    "heading-2",
    "heading-3",
    "highlighter",
    "image",
    "indent-decrease",
    "indent-increase",
    "italic",
    "link",
    "link-2",
    "list",
    "list-ordered",
    "list-todo",
    "message-square-text",
    "minus",
    "pilcrow",
    "plus",
    "quote",
    "redo-2",
    "separator-horizontal",
    "strikethrough",
    "table",
    "trash",
    "type",
    "underline",
    "undo-2",
    "unlink",
];

impl AssetSource for ContentAssets {
    fn load(&self, path: &str) -> Result<Option<Cow<'static, [u8]>>> {
        if let Some((_, bytes)) = ASSETS.iter().find(|(asset_path, _)| *asset_path == path) {
            return Ok(Some(Cow::Borrowed(*bytes)));
        }
        match &self.fallback {
            Some(fallback) => fallback.load(path),
            None => Ok(None),
        }
    }

    fn list(&self, path: &str) -> Result<Vec<SharedString>> {
        let path = path.trim_matches('/');
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut children: Vec<SharedString> = Vec::new();
        for (asset_path, _) in ASSETS {
            let Some(rest) = asset_path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let first = rest.split_once('/').map_or(rest, |(first, _)| first);
            if !children.iter().any(|item| item.as_ref() == first) {
                children.push(first.into());
            }
        }

        if let Some(fallback) = &self.fallback {
            for child in fallback.list(path)? {
                if !children.contains(&child) {
                    children.push(child);
                }
            }
        }
        Ok(children)
    }
}
