use gpui_content_core::{
    BlockAlign, Document, Editor, Node, PluginRegistry, Point, Selection, active_heading_level,
    from_html, to_html,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_with(children: Vec<Node>, selection: Selection) -> Editor {
    Editor::new(
        Document::new(children),
        selection,
        PluginRegistry::content().unwrap(),
    )
}

fn caret(path: &[usize], offset: usize) -> Selection {
    Selection::collapsed(Point::new(path.to_vec(), offset))
}

fn across(start: &[usize], end: &[usize]) -> Selection {
    Selection {
        anchor: Point::new(start.to_vec(), 0),
        focus: Point::new(end.to_vec(), 1),
    }
}

#[test]
fn set_heading_and_back_to_paragraph() {
    let mut editor = editor_with(vec![Node::paragraph("Title")], caret(&[0, 0], 2));

    editor
        .run_command("block.set_heading", Some(json!({ "level": 2 })))
        .unwrap();
    assert_eq!(editor.doc().children, vec![Node::heading(2, "Title")]);
    assert_eq!(active_heading_level(&editor), Some(2));
    assert_eq!(
        editor.run_query_json("block.kind", None).unwrap(),
        json!("heading")
    );

    editor.run_command("block.set_paragraph", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("Title")]);
    assert_eq!(
        editor.run_query_json("block.heading_level", None).unwrap(),
        serde_json::Value::Null
    );
}

#[test]
fn heading_levels_are_clamped() {
    let mut editor = editor_with(vec![Node::paragraph("x")], caret(&[0, 0], 0));
    editor
        .run_command("block.set_heading", Some(json!({ "level": 9 })))
        .unwrap();
    assert_eq!(editor.doc().children, vec![Node::heading(6, "x")]);

    let doc = from_html("<h3>a</h3>");
    let editor = Editor::new(doc, caret(&[0, 0], 0), PluginRegistry::content().unwrap());
    assert_eq!(active_heading_level(&editor), Some(3));
}

#[test]
fn set_heading_applies_to_every_selected_block() {
    let mut editor = editor_with(
        vec![Node::paragraph("a"), Node::paragraph("b")],
        across(&[0, 0], &[1, 0]),
    );
    editor
        .run_command("block.set_heading", Some(json!({ "level": 1 })))
        .unwrap();
    assert_eq!(to_html(editor.doc()), "<h1>a</h1><h1>b</h1>");
}

#[test]
fn alignment_is_set_queried_and_cleared() {
    let mut editor = editor_with(vec![Node::paragraph("mid")], caret(&[0, 0], 0));
    assert_eq!(
        editor.run_query_json("block.align", None).unwrap(),
        json!("left")
    );

    editor
        .run_command("block.set_align", Some(json!({ "align": "center" })))
        .unwrap();
    assert_eq!(
        editor.run_query_json("block.align", None).unwrap(),
        json!("center")
    );
    assert_eq!(
        to_html(editor.doc()),
        r#"<p style="text-align: center;">mid</p>"#
    );

    editor
        .run_command("block.set_align", Some(json!({ "align": "left" })))
        .unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("mid")]);
}

#[test]
fn alignment_rejects_bad_values() {
    let mut editor = editor_with(vec![Node::paragraph("x")], caret(&[0, 0], 0));
    let err = editor
        .run_command("block.set_align", Some(json!({ "align": "middle" })))
        .unwrap_err();
    assert_eq!(err.message(), "Invalid align value: middle");

    let err = editor.run_command("block.set_align", None).unwrap_err();
    assert_eq!(err.message(), "Missing args.align");
    assert_eq!(BlockAlign::parse("justify"), Some(BlockAlign::Justify));
}

#[test]
fn stored_left_alignment_is_normalized_away() {
    let doc = from_html(r#"<p style="text-align: left;">x</p>"#);
    let editor = Editor::new(doc, caret(&[0, 0], 0), PluginRegistry::content().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("x")]);
}

#[test]
fn indent_increases_and_decreases_within_bounds() {
    let mut editor = editor_with(vec![Node::paragraph("x")], caret(&[0, 0], 0));

    editor.run_command("block.indent_increase", None).unwrap();
    editor.run_command("block.indent_increase", None).unwrap();
    assert_eq!(
        editor.run_query::<u64>("block.indent_level", None).unwrap(),
        2
    );
    assert_eq!(to_html(editor.doc()), r#"<p data-indent="2">x</p>"#);

    for _ in 0..3 {
        editor.run_command("block.indent_decrease", None).unwrap();
    }
    assert_eq!(editor.doc().children, vec![Node::paragraph("x")]);

    for _ in 0..12 {
        editor.run_command("block.indent_increase", None).unwrap();
    }
    assert_eq!(
        editor.run_query::<u64>("block.indent_level", None).unwrap(),
        8
    );
}

#[test]
fn indent_on_list_item_moves_list_level() {
    let doc = from_html("<ul><li><p>a</p></li></ul>");
    let mut editor = Editor::new(doc, caret(&[0, 0], 0), PluginRegistry::content().unwrap());
    editor.run_command("block.indent_increase", None).unwrap();

    let Node::Element(item) = &editor.doc().children[0] else {
        panic!("expected list item");
    };
    assert_eq!(item.attrs.get("list_level"), Some(&json!(1)));
    assert_eq!(item.attrs.get("indent"), None);
}

#[test]
fn code_block_toggles_on_and_off() {
    let mut editor = editor_with(vec![Node::paragraph("let x;")], caret(&[0, 0], 0));

    editor.run_command("code_block.toggle", None).unwrap();
    assert!(editor.run_query::<bool>("code_block.is_active", None).unwrap());
    assert_eq!(to_html(editor.doc()), "<pre><code>let x;</code></pre>");

    editor.run_command("code_block.toggle", None).unwrap();
    assert!(!editor.run_query::<bool>("code_block.is_active", None).unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("let x;")]);
}

#[test]
fn blockquote_wraps_and_unwraps_selected_blocks() {
    let mut editor = editor_with(
        vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
            Node::paragraph("c"),
        ],
        across(&[0, 0], &[1, 0]),
    );

    editor.run_command("blockquote.toggle", None).unwrap();
    assert_eq!(
        to_html(editor.doc()),
        "<blockquote><p>a</p><p>b</p></blockquote><p>c</p>"
    );
    assert_eq!(editor.selection().focus, Point::new(vec![0, 1, 0], 1));
    assert!(editor.run_query::<bool>("blockquote.is_active", None).unwrap());

    editor.run_command("blockquote.toggle", None).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
            Node::paragraph("c"),
        ]
    );
    assert_eq!(editor.selection().focus, Point::new(vec![1, 0], 1));
    assert!(!editor.run_query::<bool>("blockquote.is_active", None).unwrap());
}

#[test]
fn block_kind_reports_node_selected_voids() {
    let mut editor = editor_with(
        vec![Node::paragraph("a"), Node::divider()],
        caret(&[0, 0], 0),
    );
    assert_eq!(
        editor.run_query_json("block.kind", None).unwrap(),
        json!("paragraph")
    );

    editor.set_selection(Selection::node(vec![1]));
    assert_eq!(
        editor.run_query_json("block.kind", None).unwrap(),
        json!("divider")
    );
}
