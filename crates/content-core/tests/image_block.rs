use gpui_content_core::{
    Attrs, Document, Editor, ImageBlockAttrs, Node, PluginRegistry, Point, Selection, VoidNode,
    clamp_percent, selected_image,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn clamp_percent_clamps_and_rounds_numbers() {
    assert_eq!(clamp_percent(5.0_f64), 10);
    assert_eq!(clamp_percent(150.0_f64), 100);
    assert_eq!(clamp_percent(-20.0_f64), 10);
    assert_eq!(clamp_percent(42.5_f64), 43);
    assert_eq!(clamp_percent(42.4_f64), 42);
    assert_eq!(clamp_percent(64_u32), 64);
    assert_eq!(clamp_percent(f64::NAN), 100);
    assert_eq!(clamp_percent(f64::INFINITY), 100);
}

#[test]
fn clamp_percent_reads_leading_number_of_strings() {
    assert_eq!(clamp_percent(" 55% "), 55);
    assert_eq!(clamp_percent("12.4px"), 12);
    assert_eq!(clamp_percent("+70"), 70);
    assert_eq!(clamp_percent("abc"), 100);
    assert_eq!(clamp_percent(""), 100);
    assert_eq!(clamp_percent("%40"), 100);
    assert_eq!(clamp_percent(None::<&str>), 100);
}

#[test]
fn clamp_percent_accepts_json_values() {
    assert_eq!(clamp_percent(&json!(70)), 70);
    assert_eq!(clamp_percent(&json!("33")), 33);
    assert_eq!(clamp_percent(&json!(null)), 100);
    assert_eq!(clamp_percent(&json!(true)), 100);
}

#[test]
fn stored_widths_are_normalized() {
    let mut attrs = Attrs::default();
    attrs.insert("src".to_string(), json!("a.png"));
    attrs.insert("width".to_string(), json!("250"));
    let doc = Document::new(vec![Node::Void(VoidNode {
        kind: "image_block".to_string(),
        attrs,
    })]);
    let editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0], 0)),
        PluginRegistry::content().unwrap(),
    );

    let Node::Void(image) = &editor.doc().children[0] else {
        panic!("expected image block");
    };
    assert_eq!(image.attrs.get("width"), Some(&json!(100)));
    assert_eq!(image.attrs.get("alt"), Some(&json!("")));
    assert_eq!(image.attrs.get("caption"), Some(&json!("")));
}

#[test]
fn insert_replaces_empty_paragraph_and_moves_caret_after() {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command(
            "image.insert",
            Some(json!({ "src": "a.png", "alt": "A", "width": 60 })),
        )
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::image_block(&ImageBlockAttrs::new("a.png").alt("A").width(60)),
            Node::paragraph(""),
        ]
    );
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![1, 0], 0))
    );
}

#[test]
fn insert_goes_after_a_non_empty_block() {
    let doc = Document::new(vec![Node::paragraph("intro"), Node::paragraph("outro")]);
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0, 0], 2)),
        PluginRegistry::content().unwrap(),
    );
    editor
        .run_command("image.insert", Some(json!({ "src": "b.png" })))
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("intro"),
            Node::image_block(&ImageBlockAttrs::new("b.png")),
            Node::paragraph("outro"),
        ]
    );
    assert_eq!(editor.selection().focus, Point::new(vec![2, 0], 0));
}

#[test]
fn insert_requires_a_source() {
    let mut editor = Editor::with_content_plugins().unwrap();
    let err = editor
        .run_command("image.insert", Some(json!({ "src": "  " })))
        .unwrap_err();
    assert_eq!(err.message(), "Missing args.src");
}

#[test]
fn set_attrs_targets_the_selected_image() {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command("image.insert", Some(json!({ "src": "a.png" })))
        .unwrap();
    assert_eq!(
        editor.run_query_json("image.selected", None).unwrap(),
        serde_json::Value::Null
    );

    editor
        .run_command("core.select_node", Some(json!({ "path": [0] })))
        .unwrap();
    let (path, attrs) = selected_image(&editor).unwrap();
    assert_eq!(path, vec![0]);
    assert_eq!(attrs.width, 100);

    editor
        .run_command(
            "image.set_attrs",
            Some(json!({ "width": "35%", "caption": "Cap", "alt": "Alt" })),
        )
        .unwrap();
    let (_, attrs) = selected_image(&editor).unwrap();
    assert_eq!(
        attrs,
        ImageBlockAttrs::new("a.png").alt("Alt").caption("Cap").width(35)
    );

    editor
        .run_command("image.set_attrs", Some(json!({ "width": 500 })))
        .unwrap();
    assert_eq!(selected_image(&editor).unwrap().1.width, 100);

    let selected = editor.run_query_json("image.selected", None).unwrap();
    assert_eq!(selected["path"], json!([0]));
    assert_eq!(selected["attrs"]["caption"], json!("Cap"));
}

#[test]
fn set_attrs_rejects_non_image_targets() {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command("image.insert", Some(json!({ "src": "a.png" })))
        .unwrap();

    let err = editor
        .run_command("image.set_attrs", Some(json!({ "path": [1], "width": 50 })))
        .unwrap_err();
    assert_eq!(err.message(), "Path is not an image block");

    let version = editor.version();
    let err = editor
        .run_command("image.set_attrs", Some(json!({ "path": [7], "width": 50 })))
        .unwrap_err();
    assert_eq!(err.message(), "Path is not an image block");
    assert_eq!(editor.version(), version);
}

#[test]
fn backspace_after_image_selects_it_then_removes_it() {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command("image.insert", Some(json!({ "src": "a.png" })))
        .unwrap();

    editor.run_command("core.delete_backward", None).unwrap();
    assert_eq!(editor.selection(), &Selection::node(vec![0]));
    assert!(selected_image(&editor).is_some());

    editor.run_command("core.delete_backward", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert!(selected_image(&editor).is_none());
}
