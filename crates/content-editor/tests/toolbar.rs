use gpui_content_core::{BlockAlign, ListType, Point, Selection};
use gpui_content_editor::{
    BlockStyle, BubbleMenu, ContentEditor, EditorError, EditorOptions, EditorRequest,
    InstanceId, SelectionKind, TextToolbarState, ToolbarAction, apply_action,
};
use pretty_assertions::assert_eq;

fn editor_with(html: &str, selection: Selection) -> ContentEditor {
    let mut editor = ContentEditor::new(InstanceId::next(), EditorOptions::default()).unwrap();
    editor.set_content(html);
    editor.set_selection(selection);
    editor
}

fn range(path: &[usize], start: usize, end: usize) -> Selection {
    Selection {
        anchor: Point::new(path.to_vec(), start),
        focus: Point::new(path.to_vec(), end),
    }
}

#[test]
fn bubble_menu_follows_the_selection() {
    let mut editor = editor_with(
        r#"<p>hello</p><img src="a.png">"#,
        Selection::collapsed(Point::new(vec![0, 0], 2)),
    );
    assert_eq!(SelectionKind::of(editor.editor()), SelectionKind::Caret);
    assert_eq!(editor.bubble_menu(), &BubbleMenu::Hidden);

    editor.set_selection(range(&[0, 0], 0, 5));
    let BubbleMenu::Text(state) = editor.bubble_menu() else {
        panic!("expected the text menu");
    };
    assert_eq!(state.block, BlockStyle::Paragraph);

    editor.set_selection(Selection::node(vec![1]));
    let BubbleMenu::Image(image) = editor.bubble_menu() else {
        panic!("expected the image menu");
    };
    assert_eq!(image.path, vec![1]);
    assert!(!image.has_alt());
    assert!(!image.has_caption());
}

#[test]
fn divider_selection_shows_no_menu() {
    let editor = editor_with("<p>a</p><hr><p>b</p>", Selection::node(vec![1]));
    assert_eq!(SelectionKind::of(editor.editor()), SelectionKind::OtherNode);
    assert!(!editor.bubble_menu().is_visible());
}

#[test]
fn mark_buttons_toggle_and_show_state() {
    let mut editor = editor_with("<p>hello world</p>", range(&[0, 0], 0, 5));

    apply_action(&mut editor, &ToolbarAction::Bold).unwrap();
    assert_eq!(editor.html(), "<p><strong>hello</strong> world</p>");

    let state = TextToolbarState::read(editor.editor());
    assert!(ToolbarAction::Bold.is_active(&state));
    assert!(!ToolbarAction::Italic.is_active(&state));
}

#[test]
fn block_buttons_reflect_heading_and_alignment() {
    let mut editor = editor_with("<p>title</p>", range(&[0, 0], 0, 5));
    apply_action(&mut editor, &ToolbarAction::Heading(2)).unwrap();
    apply_action(&mut editor, &ToolbarAction::Align(BlockAlign::Center)).unwrap();

    assert_eq!(editor.html(), r#"<h2 style="text-align: center;">title</h2>"#);
    let state = TextToolbarState::read(editor.editor());
    assert_eq!(state.block, BlockStyle::Heading(2));
    assert!(ToolbarAction::Heading(2).is_active(&state));
    assert!(!ToolbarAction::Paragraph.is_active(&state));
    assert!(ToolbarAction::Align(BlockAlign::Center).is_active(&state));
}

#[test]
fn indent_sinks_list_items_and_indents_paragraphs() {
    let mut editor = editor_with(
        "<ul><li><p>a</p></li><li><p>b</p></li></ul>",
        range(&[1, 0], 0, 1),
    );
    let state = TextToolbarState::read(editor.editor());
    assert_eq!(state.list_type, Some(ListType::Bulleted));
    assert!(ToolbarAction::Indent.is_enabled(&state));
    assert!(!ToolbarAction::Outdent.is_enabled(&state));
    assert!(ToolbarAction::ClearList.is_enabled(&state));

    apply_action(&mut editor, &ToolbarAction::Indent).unwrap();
    assert_eq!(
        editor.html(),
        "<ul><li><p>a</p><ul><li><p>b</p></li></ul></li></ul>"
    );

    let mut editor = editor_with("<p>x</p>", range(&[0, 0], 0, 1));
    apply_action(&mut editor, &ToolbarAction::Indent).unwrap();
    assert_eq!(editor.html(), r#"<p data-indent="1">x</p>"#);
}

#[test]
fn outdent_is_disabled_for_an_unindented_paragraph() {
    let mut editor = editor_with("<p>plain</p>", range(&[0, 0], 0, 5));
    let state = TextToolbarState::read(editor.editor());
    assert_eq!(state.list_type, None);
    assert_eq!(state.indent, 0);
    assert!(ToolbarAction::Indent.is_enabled(&state));
    assert!(!ToolbarAction::Outdent.is_enabled(&state));

    apply_action(&mut editor, &ToolbarAction::Indent).unwrap();
    let state = TextToolbarState::read(editor.editor());
    assert_eq!(state.indent, 1);
    assert!(ToolbarAction::Outdent.is_enabled(&state));

    let nested = editor_with(
        "<ul><li><p>a</p></li></ul>",
        range(&[0, 0], 0, 1),
    );
    let state = TextToolbarState::read(nested.editor());
    assert!(!ToolbarAction::Indent.is_enabled(&state));
    assert!(!ToolbarAction::Outdent.is_enabled(&state));
}

#[test]
fn table_buttons_follow_capabilities() {
    let mut editor = editor_with("<p>x</p>", range(&[0, 0], 0, 1));
    let outside = TextToolbarState::read(editor.editor());
    assert!(ToolbarAction::InsertTable.is_enabled(&outside));
    assert!(!ToolbarAction::TableRowBelow.is_enabled(&outside));
    assert!(!ToolbarAction::TableDelete.is_enabled(&outside));

    apply_action(&mut editor, &ToolbarAction::InsertTable).unwrap();
    let inside = TextToolbarState::read(editor.editor());
    assert!(inside.table.in_table);
    assert!(inside.table.has_header_row);
    assert!(!ToolbarAction::InsertTable.is_enabled(&inside));
    assert!(ToolbarAction::TableRowBelow.is_enabled(&inside));
    assert!(ToolbarAction::TableToggleHeader.is_active(&inside));

    apply_action(&mut editor, &ToolbarAction::TableDelete).unwrap();
    assert!(!TextToolbarState::read(editor.editor()).table.in_table);
}

#[test]
fn color_buttons_set_and_reset() {
    let mut editor = editor_with("<p>paint</p>", range(&[0, 0], 0, 5));
    apply_action(&mut editor, &ToolbarAction::TextColor("#dc2626".to_string())).unwrap();
    apply_action(&mut editor, &ToolbarAction::Highlight("#fef08a".to_string())).unwrap();

    let state = TextToolbarState::read(editor.editor());
    assert_eq!(state.text_color.as_deref(), Some("#dc2626"));
    assert!(ToolbarAction::Highlight("#fef08a".to_string()).is_active(&state));

    apply_action(&mut editor, &ToolbarAction::ResetTextColor).unwrap();
    apply_action(&mut editor, &ToolbarAction::ResetHighlight).unwrap();
    assert_eq!(editor.html(), "<p>paint</p>");
}

#[test]
fn prompt_buttons_raise_requests() {
    let mut editor = editor_with(
        r#"<p>ab</p><img src="a.png" alt="cat">"#,
        range(&[0, 0], 0, 2),
    );

    apply_action(&mut editor, &ToolbarAction::Link).unwrap();
    apply_action(&mut editor, &ToolbarAction::ImageFromUrl).unwrap();
    editor.set_selection(Selection::node(vec![1]));
    apply_action(&mut editor, &ToolbarAction::EditAlt).unwrap();

    assert_eq!(
        editor.take_requests(),
        vec![
            EditorRequest::PromptLink { current: None },
            EditorRequest::PromptImageUrl {
                position: Some(Point::new(vec![0, 0], 2))
            },
            EditorRequest::PromptImageAlt {
                path: vec![1],
                current: "cat".to_string()
            },
        ]
    );
}

#[test]
fn image_text_buttons_need_an_image() {
    let mut editor = editor_with("<p>ab</p>", range(&[0, 0], 0, 2));
    let err = apply_action(&mut editor, &ToolbarAction::EditCaption).unwrap_err();
    assert!(matches!(err, EditorError::NoImageSelected));
    assert!(editor.take_requests().is_empty());
}
