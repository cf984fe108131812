use gpui_content_editor::{
    CommandIcon, DEFAULT_SUGGESTION_LIMIT, HIGHLIGHT_COLORS, TEXT_COLORS, create_items,
    filter_items, find_swatch,
};
use pretty_assertions::assert_eq;

#[test]
fn catalogue_is_ordered() {
    let items = create_items();
    let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Paragraph",
            "Heading 1",
            "Heading 2",
            "Heading 3",
            "Bullet List",
            "Numbered List",
            "Task List",
            "Table",
            "Align Left",
            "Align Center",
            "Align Right",
            "Justify",
            "Quote",
            "Divider",
            "Image",
            "Code Block",
            "Bold",
            "Italic",
            "Underline",
            "Strikethrough",
            "Inline Code",
            "Link",
        ]
    );
    assert_eq!(items[7].icon, CommandIcon::Table);
}

#[test]
fn filter_is_case_insensitive_and_capped() {
    let items = create_items();
    assert_eq!(filter_items(&items, "", DEFAULT_SUGGESTION_LIMIT).len(), 10);
    assert_eq!(filter_items(&items, "  LIST ", 10), vec![4, 5, 6]);
    assert_eq!(filter_items(&items, "list", 2), vec![4, 5]);
    assert_eq!(filter_items(&items, "align", 10), vec![8, 9, 10]);
    assert!(filter_items(&items, "xyz", 10).is_empty());
}

#[test]
fn swatches_are_found_by_value() {
    assert_eq!(TEXT_COLORS.len(), 22);
    assert_eq!(find_swatch(&TEXT_COLORS, "#DC2626").map(|s| s.name), Some("Red"));
    assert_eq!(
        find_swatch(&HIGHLIGHT_COLORS, "#fef08a").map(|s| s.name),
        Some("Yellow")
    );
    assert!(find_swatch(&HIGHLIGHT_COLORS, "#000000").is_none());
}
