use gpui_content_core::{
    Document, Editor, ImageBlockAttrs, Node, PluginRegistry, Selection, selected_image,
};
use gpui_content_editor::{FlushOutcome, ImageSnapshot, WidthSync};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_with_selected_image() -> Editor {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command(
            "image.insert",
            Some(json!({ "src": "a.png", "alt": "A", "caption": "C" })),
        )
        .unwrap();
    editor.set_selection(Selection::node(vec![0]));
    editor
}

#[test]
fn observe_tracks_the_selected_image() {
    let mut editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);

    assert_eq!(sync.target(), Some(&vec![0]));
    assert_eq!(
        sync.snapshot(),
        Some(&ImageSnapshot {
            src: "a.png".to_string(),
            width: 100,
            alt: "A".to_string(),
            caption: "C".to_string(),
        })
    );

    editor.set_selection(Selection::collapsed(gpui_content_core::Point::new(
        vec![1, 0],
        0,
    )));
    sync.observe(&editor);
    assert_eq!(sync.target(), None);
    assert_eq!(sync.visible_width(), None);
}

#[test]
fn rapid_slider_moves_land_as_one_transaction() {
    let mut editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);
    let version = editor.version();

    assert!(sync.request_width(40_u32));
    assert!(!sync.request_width(55_u32));
    assert!(!sync.request_width(70_u32));
    assert!(!sync.request_width(88_u32));
    assert!(sync.is_scheduled());
    assert_eq!(sync.visible_width(), Some(88));
    assert_eq!(selected_image(&editor).unwrap().1.width, 100);

    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Applied(88));
    assert_eq!(editor.version(), version + 1);
    assert_eq!(selected_image(&editor).unwrap().1.width, 88);
    assert!(!sync.is_scheduled());

    assert!(editor.undo());
    assert_eq!(selected_image(&editor).unwrap().1.width, 100);
}

#[test]
fn requested_widths_are_clamped() {
    let mut editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);

    sync.request_width(3_u32);
    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Applied(10));

    sync.request_width("250%");
    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Applied(100));
}

#[test]
fn observe_keeps_pending_width_visible() {
    let editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);
    sync.request_width(60_u32);

    sync.observe(&editor);
    assert_eq!(sync.visible_width(), Some(60));
}

#[test]
fn flush_without_changes_is_idle() {
    let mut editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);

    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Idle);

    let version = editor.version();
    sync.request_width(100_u32);
    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Idle);
    assert_eq!(editor.version(), version);
}

#[test]
fn stale_target_drops_the_edit() {
    let mut editor = editor_with_selected_image();
    let mut sync = WidthSync::new();
    sync.observe(&editor);
    sync.request_width(50_u32);

    editor.replace_document(gpui_content_core::Document::new(vec![Node::paragraph("gone")]));
    let version = editor.version();

    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Stale);
    assert_eq!(editor.version(), version);
    assert_eq!(sync.target(), None);
    assert!(ImageBlockAttrs::from_node(&editor.doc().children[0]).is_none());
}

#[test]
fn width_edit_is_dropped_when_another_image_takes_the_path() {
    let mut editor = Editor::new(
        Document::new(vec![
            Node::image_block(&ImageBlockAttrs::new("a.png")),
            Node::image_block(&ImageBlockAttrs::new("b.png").width(45_u32)),
            Node::paragraph(""),
        ]),
        Selection::node(vec![0]),
        PluginRegistry::content().unwrap(),
    );
    let mut sync = WidthSync::new();
    sync.observe(&editor);
    assert!(sync.request_width(70_u32));

    editor.run_command("core.delete_backward", None).unwrap();
    let shifted = ImageBlockAttrs::from_node(&editor.doc().children[0]).unwrap();
    assert_eq!(shifted.src, "b.png");

    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Stale);
    let shifted = ImageBlockAttrs::from_node(&editor.doc().children[0]).unwrap();
    assert_eq!(shifted.width, 45);
}

#[test]
fn observing_a_replaced_image_discards_the_pending_width() {
    let mut editor = Editor::new(
        Document::new(vec![
            Node::image_block(&ImageBlockAttrs::new("a.png")),
            Node::image_block(&ImageBlockAttrs::new("b.png").width(45_u32)),
            Node::paragraph(""),
        ]),
        Selection::node(vec![0]),
        PluginRegistry::content().unwrap(),
    );
    let mut sync = WidthSync::new();
    sync.observe(&editor);
    sync.request_width(70_u32);

    editor.run_command("core.delete_backward", None).unwrap();
    editor.set_selection(Selection::node(vec![0]));
    sync.observe(&editor);

    assert_eq!(sync.visible_width(), Some(45));
    assert_eq!(sync.flush(&mut editor).unwrap(), FlushOutcome::Idle);
    assert_eq!(
        ImageBlockAttrs::from_node(&editor.doc().children[0]).unwrap().width,
        45
    );
}
