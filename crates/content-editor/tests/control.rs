use std::cell::RefCell;
use std::rc::Rc;

use gpui_content_core::{Point, Selection, selected_image};
use gpui_content_editor::{
    ContentEditor, EditorError, EditorEventBus, EditorOptions, EditorRequest, FlushOutcome,
    ImageTextField, ImageTextPrompt, InputError, InstanceId, KeyDisposition, LinkOutcome,
    SlashKey,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn content_editor() -> ContentEditor {
    ContentEditor::new(InstanceId::next(), EditorOptions::default()).unwrap()
}

fn record_changes(editor: &mut ContentEditor) -> Rc<RefCell<Vec<String>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    editor.on_change(move |html| sink.borrow_mut().push(html.to_string()));
    changes
}

#[test]
fn starts_as_an_empty_paragraph() {
    let editor = content_editor();
    assert_eq!(editor.html(), "<p></p>");
    assert!(!editor.slash().is_open());
    assert!(!editor.bubble_menu().is_visible());
}

#[test]
fn set_content_loads_html_once() {
    let mut editor = content_editor();
    let changes = record_changes(&mut editor);

    assert!(editor.set_content("<h1>Hi</h1><p>there</p>"));
    assert_eq!(editor.html(), "<h1>Hi</h1><p>there</p>");
    assert!(!editor.set_content("<h1>Hi</h1><p>there</p>"));
    assert!(!editor.editor().can_undo());
    assert!(changes.borrow().is_empty());
}

#[test]
fn resetting_to_the_loaded_html_discards_edits() {
    let mut editor = content_editor();
    let changes = record_changes(&mut editor);
    assert!(editor.set_content("<p>record A</p>"));

    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 8)));
    editor
        .run_command("core.insert_text", Some(json!({ "text": " edited" })))
        .unwrap();
    assert_eq!(editor.html(), "<p>record A edited</p>");

    assert!(editor.set_content("<p>record A</p>"));
    assert_eq!(editor.html(), "<p>record A</p>");
    assert!(!editor.editor().can_undo());
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn bare_images_load_as_figures() {
    let mut editor = content_editor();
    editor.set_content(r#"<img src="a.png" style="width: 40%">"#);
    assert!(editor.html().starts_with(
        r#"<figure data-type="image-block" data-width="40"><img src="a.png""#
    ));

    let raw = r#"<img src="a.png" style="width: 40%">"#;
    assert!(!editor.set_content(raw));
}

#[test]
fn content_changes_report_html() {
    let mut editor = content_editor();
    let changes = record_changes(&mut editor);

    editor
        .run_command("core.insert_text", Some(json!({ "text": "hi" })))
        .unwrap();
    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 0)));

    assert_eq!(*changes.borrow(), vec!["<p>hi</p>".to_string()]);
    assert_eq!(editor.html(), "<p>hi</p>");

    assert!(editor.undo());
    assert_eq!(changes.borrow().last().map(String::as_str), Some("<p></p>"));
    assert!(editor.redo());
    assert_eq!(editor.html(), "<p>hi</p>");
    assert_eq!(changes.borrow().len(), 3);
}

#[test]
fn failed_commands_do_not_report_changes() {
    let mut editor = content_editor();
    let changes = record_changes(&mut editor);

    let err = editor.run_command("block.set_align", None).unwrap_err();
    assert_eq!(err.to_string(), "Missing args.align");
    assert!(changes.borrow().is_empty());
}

#[test]
fn slash_keys_run_through_the_controller() {
    let mut editor = content_editor();
    let changes = record_changes(&mut editor);
    editor
        .run_command("core.insert_text", Some(json!({ "text": "/head" })))
        .unwrap();
    assert!(editor.slash().is_open());

    let (disposition, outcome) = editor.handle_slash_key(SlashKey::Down).unwrap();
    assert_eq!(disposition, KeyDisposition::Handled);
    assert!(outcome.is_none());

    let (_, outcome) = editor.handle_slash_key(SlashKey::Enter).unwrap();
    assert_eq!(outcome.unwrap().title, "Heading 2");
    assert_eq!(editor.html(), "<h2></h2>");
    assert!(!editor.slash().is_open());
    assert_eq!(changes.borrow().last().map(String::as_str), Some("<h2></h2>"));

    let (disposition, _) = editor.handle_slash_key(SlashKey::Enter).unwrap();
    assert_eq!(disposition, KeyDisposition::Ignored);
}

#[test]
fn slash_requests_reach_only_their_editor() {
    let bus = EditorEventBus::new();
    let mut first = content_editor().with_bus(bus.clone());
    let second = content_editor().with_bus(bus.clone());

    first
        .run_command("core.insert_text", Some(json!({ "text": "/image" })))
        .unwrap();
    first.confirm_slash().unwrap();

    assert!(second.take_requests().is_empty());
    assert_eq!(bus.len(), 1);
    assert_eq!(
        first.take_requests(),
        vec![EditorRequest::OpenFilePicker {
            position: Some(Point::new(vec![0, 0], 0))
        }]
    );
    assert!(bus.is_empty());
}

#[test]
fn width_edits_flush_once_per_frame() {
    let mut editor = content_editor();
    editor.set_content(r#"<img src="a.png"><p>after</p>"#);
    editor.set_selection(Selection::node(vec![0]));
    let changes = record_changes(&mut editor);

    assert!(editor.request_width(40_u32));
    for width in [55_u32, 70, 88] {
        assert!(!editor.request_width(width));
    }
    assert_eq!(editor.width_sync().visible_width(), Some(88));

    assert_eq!(editor.flush_width().unwrap(), FlushOutcome::Applied(88));
    assert_eq!(changes.borrow().len(), 1);
    assert_eq!(selected_image(editor.editor()).unwrap().1.width, 88);

    assert!(editor.undo());
    assert_eq!(selected_image(editor.editor()).unwrap().1.width, 100);
}

#[test]
fn image_urls_are_validated_before_insert() {
    let mut editor = content_editor();
    let err = editor.insert_image_from_url("not a url", None).unwrap_err();
    assert!(matches!(err, EditorError::Input(InputError::InvalidImageUrl)));
    assert_eq!(editor.html(), "<p></p>");

    editor
        .insert_image_from_url(" https://x.dev/a.png ", Some(Point::new(vec![0, 0], 0)))
        .unwrap();
    assert!(editor.html().contains(r#"src="https://x.dev/a.png""#));
    assert_eq!(editor.editor().selection().focus, Point::new(vec![1, 0], 0));
}

#[test]
fn link_and_image_prompts_go_through_the_editor() {
    let mut editor = content_editor();
    editor.set_content("<p>ab</p>");
    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 1)));
    let changes = record_changes(&mut editor);

    let edit = editor.begin_link_edit();
    assert!(edit.needs_text);
    let outcome = editor.commit_link(&edit, "x.dev", Some("X")).unwrap();
    assert!(matches!(outcome, LinkOutcome::Inserted { .. }));
    assert_eq!(editor.html(), r#"<p>a<a href="https://x.dev">X</a>b</p>"#);
    assert_eq!(changes.borrow().len(), 1);

    editor.set_content(r#"<img src="a.png" alt="old">"#);
    editor.set_selection(Selection::node(vec![0]));
    let prompt = ImageTextPrompt::for_selection(editor.editor(), ImageTextField::Alt).unwrap();
    assert!(editor.submit_image_text(&prompt, Some("new")).unwrap());
    assert_eq!(selected_image(editor.editor()).unwrap().1.alt, "new");
}
