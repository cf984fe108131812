use gpui_content_core::{
    ContentValue, Document, Editor, EditorConfig, ListType, Node, Op, PluginRegistry, Point,
    Selection, Transaction, from_html, to_html,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_with(children: Vec<Node>, focus: Point) -> Editor {
    Editor::new(
        Document::new(children),
        Selection::collapsed(focus),
        PluginRegistry::content().unwrap(),
    )
}

fn caret(path: &[usize], offset: usize) -> Point {
    Point::new(path.to_vec(), offset)
}

#[test]
fn split_block_splits_text_at_caret() {
    let mut editor = editor_with(vec![Node::paragraph("hello world")], caret(&[0, 0], 5));
    editor.run_command("core.split_block", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("hello"), Node::paragraph(" world")]
    );
    assert_eq!(editor.selection().focus, caret(&[1, 0], 0));
}

#[test]
fn split_at_end_of_heading_continues_as_paragraph() {
    let mut editor = editor_with(vec![Node::heading(2, "Title")], caret(&[0, 0], 5));
    editor.run_command("core.split_block", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::heading(2, "Title"), Node::paragraph("")]
    );
}

#[test]
fn split_in_code_block_inserts_newline() {
    let doc = from_html("<pre><code>ab</code></pre>");
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(caret(&[0, 0], 1)),
        PluginRegistry::content().unwrap(),
    );
    editor.run_command("core.split_block", None).unwrap();

    assert_eq!(editor.doc().children.len(), 1);
    assert_eq!(editor.doc().children[0].text_content(), "a\nb");
    assert_eq!(editor.selection().focus, caret(&[0, 0], 2));
}

#[test]
fn split_task_item_continues_unchecked_and_empty_item_exits_list() {
    let doc = from_html(
        r#"<ul data-type="taskList"><li data-type="taskItem" data-checked="true"><p>milk</p></li></ul>"#,
    );
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(caret(&[0, 0], 4)),
        PluginRegistry::content().unwrap(),
    );

    editor.run_command("core.split_block", None).unwrap();
    let Node::Element(next) = &editor.doc().children[1] else {
        panic!("expected list item");
    };
    assert_eq!(ListType::of(next), Some(ListType::Task));
    assert_eq!(next.attrs.get("checked"), Some(&json!(false)));
    assert_eq!(editor.selection().focus, caret(&[1, 0], 0));

    editor.run_command("core.split_block", None).unwrap();
    assert_eq!(editor.doc().children[1], Node::paragraph(""));
    assert_eq!(
        to_html(editor.doc()),
        r#"<ul data-type="taskList"><li data-type="taskItem" data-checked="true"><p>milk</p></li></ul><p></p>"#
    );
}

#[test]
fn backspace_at_block_start_merges_into_previous_block() {
    let mut editor = editor_with(
        vec![Node::paragraph("ab"), Node::paragraph("cd")],
        caret(&[1, 0], 0),
    );
    editor.run_command("core.delete_backward", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("abcd")]);

    assert!(editor.undo());
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("ab"), Node::paragraph("cd")]
    );
}

#[test]
fn backspace_deletes_previous_character() {
    let mut editor = editor_with(vec![Node::paragraph("héllo")], caret(&[0, 0], 3));
    editor.run_command("core.delete_backward", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("hllo")]);
    assert_eq!(editor.selection().focus, caret(&[0, 0], 1));
}

#[test]
fn delete_forward_at_block_end_selects_following_divider() {
    let mut editor = editor_with(
        vec![Node::paragraph("ab"), Node::divider(), Node::paragraph("cd")],
        caret(&[0, 0], 2),
    );
    editor.run_command("core.delete_forward", None).unwrap();
    assert_eq!(editor.selection(), &Selection::node(vec![1]));

    editor.run_command("core.delete_forward", None).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("ab"), Node::paragraph("cd")]
    );
    assert_eq!(editor.selection().focus, caret(&[0, 0], 2));
}

#[test]
fn select_node_only_accepts_void_blocks() {
    let mut editor = editor_with(
        vec![Node::paragraph("ab"), Node::divider()],
        caret(&[0, 0], 0),
    );
    let err = editor
        .run_command("core.select_node", Some(json!({ "path": [0] })))
        .unwrap_err();
    assert_eq!(err.message(), "Only void nodes can be selected as a node");

    editor
        .run_command("core.select_node", Some(json!({ "path": [1] })))
        .unwrap();
    assert_eq!(editor.selection(), &Selection::node(vec![1]));
}

#[test]
fn delete_range_removes_text_between_offsets() {
    let mut editor = editor_with(vec![Node::paragraph("/headingX")], caret(&[0, 0], 8));
    editor
        .run_command(
            "core.delete_range",
            Some(json!({ "path": [0], "start": 0, "end": 8 })),
        )
        .unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("X")]);
    assert_eq!(editor.selection().focus, caret(&[0, 0], 0));
}

#[test]
fn insert_text_replaces_the_selection() {
    let mut editor = editor_with(vec![Node::paragraph("hello world")], caret(&[0, 0], 0));
    editor.set_selection(Selection {
        anchor: caret(&[0, 0], 6),
        focus: caret(&[0, 0], 11),
    });
    editor
        .run_command("core.insert_text", Some(json!({ "text": "there" })))
        .unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("hello there")]);
    assert_eq!(editor.selection().focus, caret(&[0, 0], 11));
}

#[test]
fn multi_block_selection_delete_joins_edges() {
    let mut editor = editor_with(
        vec![
            Node::paragraph("one"),
            Node::paragraph("two"),
            Node::paragraph("three"),
        ],
        caret(&[0, 0], 0),
    );
    editor.set_selection(Selection {
        anchor: caret(&[0, 0], 2),
        focus: caret(&[2, 0], 3),
    });
    editor.run_command("core.delete_backward", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("onee")]);
}

#[test]
fn insert_divider_adds_trailing_paragraph() {
    let mut editor = editor_with(vec![Node::paragraph("a")], caret(&[0, 0], 1));
    editor.run_command("core.insert_divider", None).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("a"), Node::divider(), Node::paragraph("")]
    );
    assert_eq!(editor.selection().focus, caret(&[2, 0], 0));
}

#[test]
fn undo_history_is_bounded() {
    let mut editor = Editor::with_config(
        Document::new(vec![Node::paragraph("")]),
        Selection::collapsed(caret(&[0, 0], 0)),
        PluginRegistry::content().unwrap(),
        EditorConfig {
            max_undo: 2,
            ..EditorConfig::default()
        },
    );
    for ch in ["a", "b", "c"] {
        editor
            .run_command("core.insert_text", Some(json!({ "text": ch })))
            .unwrap();
    }
    assert_eq!(editor.doc().children, vec![Node::paragraph("abc")]);

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("a")]);

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
}

#[test]
fn version_only_moves_on_content_changes() {
    let mut editor = editor_with(vec![Node::paragraph("ab")], caret(&[0, 0], 0));
    let start = editor.version();

    let tx = Transaction::new(Vec::new())
        .selection_after(Selection::collapsed(caret(&[0, 0], 2)))
        .source("test:select");
    editor.apply(tx).unwrap();
    assert_eq!(editor.version(), start);

    let tx = Transaction::new(vec![Op::InsertText {
        path: vec![0, 0],
        offset: 2,
        text: "c".to_string(),
    }]);
    editor.apply(tx).unwrap();
    assert_eq!(editor.version(), start + 1);
}

#[test]
fn replace_document_resets_history() {
    let mut editor = editor_with(vec![Node::paragraph("")], caret(&[0, 0], 0));
    editor
        .run_command("core.insert_text", Some(json!({ "text": "x" })))
        .unwrap();
    assert!(editor.can_undo());

    editor.replace_document(Document::new(vec![Node::paragraph("fresh")]));
    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
    assert_eq!(editor.selection().focus, caret(&[0, 0], 0));
}

#[test]
fn normalization_restores_an_empty_document() {
    let editor = Editor::new(
        Document::default(),
        Selection::collapsed(caret(&[0, 0], 0)),
        PluginRegistry::content().unwrap(),
    );
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
}

#[test]
fn content_value_wraps_documents_in_a_versioned_envelope() {
    let doc = from_html("<h1>Hi</h1><p>there</p>");
    let value = ContentValue::from_document(doc.clone());
    let json = value.to_json_pretty().unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["schema"], json!("gpui-content"));
    assert_eq!(parsed["version"], json!(1));
    assert_eq!(parsed["document"]["children"][0]["node"], json!("element"));

    let back = ContentValue::from_json_str(&json).unwrap();
    assert_eq!(back.into_document(), doc);

    let minimal = ContentValue::from_json_str(r#"{ "document": { "children": [] } }"#).unwrap();
    assert_eq!(minimal.schema, "gpui-content");
    assert_eq!(minimal.version, 1);
}

#[test]
fn unknown_commands_and_queries_fail() {
    let mut editor = Editor::with_content_plugins().unwrap();
    let err = editor.run_command("nope.command", None).unwrap_err();
    assert_eq!(err.message(), "Unknown command: nope.command");
    let err = editor.run_query_json("nope.query", None).unwrap_err();
    assert_eq!(err.message(), "Unknown query: nope.query");
}
