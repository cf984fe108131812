//! HTML codec for documents.
//!
//! `to_html` is the storage format handed to callers; `from_html` accepts that output
//! plus the common legacy shapes (bare `<img>`, plain `<figure>`, `<b>`/`<i>`).

mod parse;
mod write;

pub use parse::from_html;
pub use write::to_html;

/// Value of a single declaration inside an inline `style` attribute.
pub(crate) fn style_property<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim())
            .filter(|v| !v.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::style_property;

    #[test]
    fn style_property_matches_whole_names() {
        let style = "background-color: #fef08a; color: red ;width:40%";
        assert_eq!(style_property(style, "color"), Some("red"));
        assert_eq!(style_property(style, "background-color"), Some("#fef08a"));
        assert_eq!(style_property(style, "WIDTH"), Some("40%"));
        assert_eq!(style_property(style, "height"), None);
    }
}
