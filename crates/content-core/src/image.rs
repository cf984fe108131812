//! The image block node: attributes and the shared width clamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Attrs, Node, VoidNode};

pub const IMAGE_BLOCK_KIND: &str = "image_block";

pub const MIN_WIDTH_PERCENT: u32 = 10;
pub const MAX_WIDTH_PERCENT: u32 = 100;
pub const DEFAULT_WIDTH_PERCENT: u32 = 100;

/// Anything a width can arrive as: slider values, markup attributes, stored JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentInput<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl From<f64> for PercentInput<'_> {
    fn from(value: f64) -> Self {
        PercentInput::Number(value)
    }
}

impl From<f32> for PercentInput<'_> {
    fn from(value: f32) -> Self {
        PercentInput::Number(f64::from(value))
    }
}

impl From<u32> for PercentInput<'_> {
    fn from(value: u32) -> Self {
        PercentInput::Number(f64::from(value))
    }
}

impl From<i32> for PercentInput<'_> {
    fn from(value: i32) -> Self {
        PercentInput::Number(f64::from(value))
    }
}

impl From<i64> for PercentInput<'_> {
    fn from(value: i64) -> Self {
        PercentInput::Number(value as f64)
    }
}

impl<'a> From<&'a str> for PercentInput<'a> {
    fn from(value: &'a str) -> Self {
        PercentInput::Text(value)
    }
}

impl<'a> From<&'a String> for PercentInput<'a> {
    fn from(value: &'a String) -> Self {
        PercentInput::Text(value)
    }
}

impl<'a> From<&'a Value> for PercentInput<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(PercentInput::Missing, PercentInput::Number),
            Value::String(s) => PercentInput::Text(s),
            _ => PercentInput::Missing,
        }
    }
}

impl<'a, T> From<Option<T>> for PercentInput<'a>
where
    T: Into<PercentInput<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(PercentInput::Missing, Into::into)
    }
}

/// Normalizes any width input to an integer percentage in `[10, 100]`.
///
/// Strings contribute their leading number (`" 42.6% "` is 43); anything that
/// yields no finite number falls back to 100. Parsing, rendering and slider
/// edits all go through here.
pub fn clamp_percent<'a>(input: impl Into<PercentInput<'a>>) -> u32 {
    let value = match input.into() {
        PercentInput::Number(n) => Some(n),
        PercentInput::Text(s) => leading_number(s),
        PercentInput::Missing => None,
    };

    match value {
        Some(v) if v.is_finite() => {
            let clamped = v
                .round()
                .clamp(f64::from(MIN_WIDTH_PERCENT), f64::from(MAX_WIDTH_PERCENT));
            clamped as u32
        }
        _ => DEFAULT_WIDTH_PERCENT,
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }
    s[..end].parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlockAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH_PERCENT
}

impl Default for ImageBlockAttrs {
    fn default() -> Self {
        Self {
            src: None,
            alt: String::new(),
            title: None,
            caption: String::new(),
            width: DEFAULT_WIDTH_PERCENT,
        }
    }
}

impl ImageBlockAttrs {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn width<'a>(mut self, width: impl Into<PercentInput<'a>>) -> Self {
        self.width = clamp_percent(width);
        self
    }

    /// Reads attributes off a node, normalizing whatever is stored there.
    pub fn from_attrs(attrs: &Attrs) -> Self {
        let text = |key: &str| attrs.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            src: text("src").filter(|s| !s.is_empty()),
            alt: text("alt").unwrap_or_default(),
            title: text("title").filter(|s| !s.is_empty()),
            caption: text("caption").unwrap_or_default(),
            width: clamp_percent(attrs.get("width")),
        }
    }

    pub fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Void(v) if v.kind == IMAGE_BLOCK_KIND => Some(Self::from_attrs(&v.attrs)),
            _ => None,
        }
    }

    pub fn to_attrs(&self) -> Attrs {
        let mut attrs = Attrs::default();
        if let Some(src) = &self.src {
            attrs.insert("src".to_string(), Value::String(src.clone()));
        }
        attrs.insert("alt".to_string(), Value::String(self.alt.clone()));
        if let Some(title) = &self.title {
            attrs.insert("title".to_string(), Value::String(title.clone()));
        }
        attrs.insert("caption".to_string(), Value::String(self.caption.clone()));
        attrs.insert(
            "width".to_string(),
            Value::from(clamp_percent(self.width)),
        );
        attrs
    }
}

impl Node {
    pub fn image_block(attrs: &ImageBlockAttrs) -> Self {
        Node::Void(VoidNode {
            kind: IMAGE_BLOCK_KIND.to_string(),
            attrs: attrs.to_attrs(),
        })
    }

    pub fn is_image_block(&self) -> bool {
        matches!(self, Node::Void(v) if v.kind == IMAGE_BLOCK_KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_ignores_suffixes() {
        assert_eq!(leading_number("42%"), Some(42.0));
        assert_eq!(leading_number(" 7.5px "), Some(7.5));
        assert_eq!(leading_number("-3"), Some(-3.0));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("%50"), None);
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn untyped_integer_widths_are_accepted() {
        assert_eq!(clamp_percent(55), 55);
        assert_eq!(clamp_percent(-4), MIN_WIDTH_PERCENT);
        assert_eq!(ImageBlockAttrs::new("a.png").width(250).width, MAX_WIDTH_PERCENT);
    }
}
