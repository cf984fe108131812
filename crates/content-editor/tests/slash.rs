use gpui_content_core::{
    Document, Editor, Node, PluginRegistry, Point, Selection, from_html, to_html,
};
use gpui_content_editor::{
    AnchorBounds, EditorError, EditorOptions, EditorRequest, KeyDisposition, SlashController,
    SlashKey, SlashState, TriggerRange,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn typed(text: &str) -> Editor {
    Editor::new(
        Document::new(vec![Node::paragraph(text)]),
        Selection::collapsed(Point::new(vec![0, 0], text.len())),
        PluginRegistry::content().unwrap(),
    )
}

fn open(editor: &Editor) -> SlashController {
    let mut slash = SlashController::new(&EditorOptions::default());
    slash.update(editor);
    slash
}

fn titles(slash: &SlashController) -> Vec<&str> {
    let session = slash.session().unwrap();
    session
        .items
        .iter()
        .map(|&ix| slash.items()[ix].title.as_str())
        .collect()
}

#[test]
fn typing_slash_opens_the_menu_with_the_first_ten_items() {
    let editor = typed("/");
    let slash = open(&editor);

    let session = slash.session().unwrap();
    assert_eq!(session.query, "");
    assert_eq!(
        session.range,
        TriggerRange {
            block: vec![0],
            start: 0,
            end: 1
        }
    );
    assert_eq!(session.items.len(), 10);
    assert_eq!(titles(&slash)[0], "Paragraph");
    assert_eq!(session.selected_index, 0);
}

#[test]
fn query_filters_by_title_and_description() {
    let slash = open(&typed("/head"));
    assert_eq!(titles(&slash), vec!["Heading 1", "Heading 2", "Heading 3"]);

    let slash = open(&typed("/CHECKBOX"));
    assert_eq!(titles(&slash), vec!["Task List"]);
}

#[test]
fn trigger_must_start_a_word() {
    let slash = open(&typed("a/b"));
    assert!(!slash.is_open());

    let slash = open(&typed("a /b"));
    assert_eq!(slash.session().unwrap().query, "b");

    let slash = open(&typed("/two words"));
    assert!(!slash.is_open());
}

#[test]
fn code_blocks_and_ranges_never_open_the_menu() {
    let mut editor = Editor::new(
        from_html("<pre><code>/x</code></pre>"),
        Selection::collapsed(Point::new(vec![0, 0], 2)),
        PluginRegistry::content().unwrap(),
    );
    assert!(!open(&editor).is_open());

    editor.replace_document(Document::new(vec![Node::paragraph("/x")]));
    editor.set_selection(Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 0], 2),
    });
    assert!(!open(&editor).is_open());
}

#[test]
fn disabled_controller_stays_idle() {
    let options = EditorOptions {
        enable_slash_commands: false,
        ..EditorOptions::default()
    };
    let mut slash = SlashController::new(&options);
    slash.update(&typed("/"));
    assert_eq!(slash.state(), &SlashState::Idle);
}

#[test]
fn navigation_wraps_around() {
    let mut slash = open(&typed("/head"));

    assert_eq!(slash.handle_key(SlashKey::Up), KeyDisposition::Handled);
    assert_eq!(slash.session().unwrap().selected_index, 2);
    slash.handle_key(SlashKey::Down);
    assert_eq!(slash.session().unwrap().selected_index, 0);
    slash.handle_key(SlashKey::Tab);
    slash.handle_key(SlashKey::Tab);
    slash.handle_key(SlashKey::ShiftTab);
    assert_eq!(slash.session().unwrap().selected_index, 1);

    slash.select(7);
    assert_eq!(slash.session().unwrap().selected_index, 1);
}

#[test]
fn selection_survives_updates_with_the_same_query() {
    let editor = typed("/head");
    let mut slash = open(&editor);
    slash.move_next();
    slash.update(&editor);
    assert_eq!(slash.session().unwrap().selected_index, 1);

    slash.update(&typed("/headi"));
    assert_eq!(slash.session().unwrap().selected_index, 0);
}

#[test]
fn confirm_replaces_trigger_with_heading() {
    let mut editor = typed("/head");
    let mut slash = open(&editor);
    slash.move_next();

    assert_eq!(slash.handle_key(SlashKey::Enter), KeyDisposition::Confirm);
    let outcome = slash.confirm(&mut editor).unwrap();

    assert_eq!(outcome.title, "Heading 2");
    assert!(outcome.requests.is_empty());
    assert_eq!(editor.doc().children, vec![Node::heading(2, "")]);
    assert!(!slash.is_open());

    slash.update(&editor);
    assert!(!slash.is_open());
}

#[test]
fn confirm_keeps_text_before_the_trigger() {
    let mut editor = typed("Intro /quote");
    let mut slash = open(&editor);
    slash.confirm(&mut editor).unwrap();

    assert_eq!(to_html(editor.doc()), "<blockquote><p>Intro </p></blockquote>");
}

#[test]
fn table_item_uses_configured_defaults() {
    let options = EditorOptions::from_json_str(
        r#"{ "default_table": { "rows": 2, "cols": 2, "header": false } }"#,
    )
    .unwrap();
    let mut editor = typed("/table");
    let mut slash = SlashController::new(&options);
    slash.update(&editor);
    slash.confirm(&mut editor).unwrap();

    let caps = editor
        .run_query_json("table.capabilities", None)
        .unwrap();
    assert_eq!(caps["in_table"], json!(true));
    assert_eq!(caps["has_header_row"], json!(false));
    assert_eq!(
        to_html(editor.doc()),
        concat!(
            "<p></p><table><tbody>",
            "<tr><td><p></p></td><td><p></p></td></tr>",
            "<tr><td><p></p></td><td><p></p></td></tr>",
            "</tbody></table><p></p>"
        )
    );
}

#[test]
fn image_item_requests_a_file_picker_at_the_caret() {
    let mut editor = typed("ab /image");
    let mut slash = open(&editor);
    let outcome = slash.confirm(&mut editor).unwrap();

    assert_eq!(
        outcome.requests,
        vec![EditorRequest::OpenFilePicker {
            position: Some(Point::new(vec![0, 0], 3))
        }]
    );
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab ")]);
}

#[test]
fn escape_dismisses_until_the_trigger_is_retyped() {
    let editor = typed("/he");
    let mut slash = open(&editor);

    assert_eq!(slash.handle_key(SlashKey::Escape), KeyDisposition::Handled);
    assert!(!slash.is_open());
    assert_eq!(slash.handle_key(SlashKey::Down), KeyDisposition::Ignored);

    slash.update(&typed("/hea"));
    assert!(!slash.is_open());

    slash.update(&typed(""));
    slash.update(&typed("/hea"));
    assert!(slash.is_open());
}

#[test]
fn no_matches_keeps_the_menu_open_but_enter_does_nothing() {
    let mut editor = typed("/zzz");
    let mut slash = open(&editor);

    assert!(!slash.session().unwrap().has_results());
    assert_eq!(slash.handle_key(SlashKey::Enter), KeyDisposition::Handled);
    slash.move_next();
    assert!(matches!(
        slash.confirm(&mut editor),
        Err(EditorError::NothingSelected)
    ));
}

#[test]
fn popup_needs_an_anchor() {
    let mut slash = open(&typed("/"));
    assert!(!slash.popup_visible());

    slash.set_anchor(Some(AnchorBounds {
        x: 10.0,
        y: 20.0,
        width: 1.0,
        height: 18.0,
    }));
    assert!(slash.popup_visible());

    slash.set_anchor(None);
    assert!(slash.is_open());
    assert!(!slash.popup_visible());
}
