use gpui_content_core::{
    Document, Editor, Marks, Node, PluginRegistry, Point, Selection, active_marks, to_html,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_with_text(text: &str, selection: Selection) -> Editor {
    Editor::new(
        Document::new(vec![Node::paragraph(text)]),
        selection,
        PluginRegistry::content().unwrap(),
    )
}

fn range(start: usize, end: usize) -> Selection {
    Selection {
        anchor: Point::new(vec![0, 0], start),
        focus: Point::new(vec![0, 0], end),
    }
}

#[test]
fn toggle_bold_over_range_adds_then_removes() {
    let mut editor = editor_with_text("hello world", range(0, 5));

    editor.run_command("marks.toggle_bold", None).unwrap();
    assert_eq!(to_html(editor.doc()), "<p><strong>hello</strong> world</p>");

    editor.run_command("marks.toggle_bold", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("hello world")]);
}

#[test]
fn active_marks_over_a_range_are_the_shared_marks() {
    let mut editor = editor_with_text("hello world", range(0, 5));
    editor.run_command("marks.toggle_bold", None).unwrap();
    editor
        .run_command("marks.set_link", Some(json!({ "url": "https://x.dev" })))
        .unwrap();

    editor.set_selection(Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 1], 0),
    });
    let marks = active_marks(&editor);
    assert!(marks.bold);
    assert_eq!(marks.link.as_deref(), Some("https://x.dev"));

    editor.set_selection(Selection {
        anchor: Point::new(vec![0, 1], 6),
        focus: Point::new(vec![0, 0], 2),
    });
    assert_eq!(active_marks(&editor), Marks::default());
}

#[test]
fn toggle_at_caret_marks_the_next_typed_text() {
    let mut editor = editor_with_text(
        "ab",
        Selection::collapsed(Point::new(vec![0, 0], 2)),
    );
    editor.run_command("marks.toggle_italic", None).unwrap();
    assert!(active_marks(&editor).italic);

    editor
        .run_command("core.insert_text", Some(json!({ "text": "c" })))
        .unwrap();
    assert_eq!(to_html(editor.doc()), "<p>ab<em>c</em></p>");
}

#[test]
fn subscript_and_superscript_are_exclusive() {
    let mut editor = editor_with_text("x2", range(0, 2));

    editor.run_command("marks.toggle_subscript", None).unwrap();
    editor.run_command("marks.toggle_superscript", None).unwrap();

    let Node::Element(p) = &editor.doc().children[0] else {
        panic!("expected paragraph");
    };
    let Node::Text(leaf) = &p.children[0] else {
        panic!("expected text");
    };
    assert!(leaf.marks.superscript);
    assert!(!leaf.marks.subscript);
}

#[test]
fn colors_and_links_apply_to_the_selection() {
    let mut editor = editor_with_text("paint me", range(0, 5));

    editor
        .run_command("marks.set_text_color", Some(json!({ "color": "#dc2626" })))
        .unwrap();
    editor
        .run_command(
            "marks.set_highlight_color",
            Some(json!({ "color": "#fef08a" })),
        )
        .unwrap();
    editor
        .run_command("marks.set_link", Some(json!({ "url": "https://x.dev" })))
        .unwrap();

    assert_eq!(
        to_html(editor.doc()),
        concat!(
            r##"<p><a href="https://x.dev"><mark data-color="#fef08a" style="background-color: #fef08a;">"##,
            r#"<span style="color: #dc2626;">paint</span></mark></a> me</p>"#
        )
    );

    editor.run_command("marks.unset_text_color", None).unwrap();
    editor.run_command("marks.unset_highlight_color", None).unwrap();
    editor.run_command("marks.unset_link", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("paint me")]);
}

#[test]
fn insert_link_places_linked_text_at_caret() {
    let mut editor = editor_with_text(
        "ab",
        Selection::collapsed(Point::new(vec![0, 0], 1)),
    );
    editor
        .run_command(
            "marks.insert_link",
            Some(json!({ "url": "https://x.dev", "text": "X" })),
        )
        .unwrap();

    assert_eq!(
        to_html(editor.doc()),
        r#"<p>a<a href="https://x.dev">X</a>b</p>"#
    );
    assert_eq!(editor.selection().focus, Point::new(vec![0, 1], 1));
    assert_eq!(
        editor
            .run_query::<bool>("marks.has_link_active", None)
            .unwrap(),
        true
    );
}

#[test]
fn insert_link_without_text_uses_the_url() {
    let mut editor = editor_with_text("", Selection::collapsed(Point::new(vec![0, 0], 0)));
    editor
        .run_command("marks.insert_link", Some(json!({ "url": "https://x.dev" })))
        .unwrap();
    assert_eq!(
        to_html(editor.doc()),
        r#"<p><a href="https://x.dev">https://x.dev</a></p>"#
    );
}

#[test]
fn get_active_reports_focus_marks() {
    let mut editor = editor_with_text("bold", range(0, 4));
    editor.run_command("marks.toggle_bold", None).unwrap();

    let marks: Marks = editor.run_query("marks.get_active", None).unwrap();
    assert_eq!(
        marks,
        Marks {
            bold: true,
            ..Marks::default()
        }
    );
}
