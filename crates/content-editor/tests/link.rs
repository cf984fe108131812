use gpui_content_core::{Document, Editor, Node, PluginRegistry, Point, Selection, to_html};
use gpui_content_editor::{
    EditorError, InputError, LinkEdit, LinkOutcome, LinkTarget, link_range_at_caret,
    normalize_link,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn url(s: &str) -> Result<LinkTarget, InputError> {
    Ok(LinkTarget::Url(s.to_string()))
}

#[test]
fn normalize_link_adds_https_to_bare_hosts() {
    assert_eq!(normalize_link("example.com"), url("https://example.com"));
    assert_eq!(normalize_link("  www.example.com/a?b=1 "), url("https://www.example.com/a?b=1"));
    assert_eq!(normalize_link("localhost:3000"), url("https://localhost:3000"));
    assert_eq!(normalize_link("//cdn.x.dev/lib.js"), url("https://cdn.x.dev/lib.js"));
}

#[test]
fn normalize_link_keeps_safe_schemes_and_relative_links() {
    assert_eq!(normalize_link("HTTPS://x.dev"), url("HTTPS://x.dev"));
    assert_eq!(normalize_link("mailto:me@x.dev"), url("mailto:me@x.dev"));
    assert_eq!(normalize_link("tel:+123"), url("tel:+123"));
    assert_eq!(normalize_link("#section"), url("#section"));
    assert_eq!(normalize_link("/docs/intro"), url("/docs/intro"));
}

#[test]
fn normalize_link_rejects_unsafe_or_unrecognized_input() {
    for input in [
        "javascript:alert(1)",
        "JavaScript:void(0)",
        "data:text/html,hi",
        "vbscript:x",
        "ftp://x.dev",
        "hello",
        "two words.com",
        "//",
    ] {
        assert_eq!(normalize_link(input), Err(InputError::InvalidLinkUrl), "{input}");
    }
    assert_eq!(normalize_link("   "), Ok(LinkTarget::Unset));
}

#[test]
fn link_errors_are_user_facing() {
    assert_eq!(InputError::InvalidLinkUrl.to_string(), "URL tautan tidak valid.");
    assert_eq!(InputError::EmptyLinkText.to_string(), "Teks tautan tidak boleh kosong.");
}

fn editor(text: &str, selection: Selection) -> Editor {
    Editor::new(
        Document::new(vec![Node::paragraph(text)]),
        selection,
        PluginRegistry::content().unwrap(),
    )
}

#[test]
fn caret_without_link_asks_for_text() {
    let mut editor = editor("ab", Selection::collapsed(Point::new(vec![0, 0], 1)));
    let edit = LinkEdit::begin(&editor);
    assert_eq!(
        edit,
        LinkEdit {
            current: None,
            needs_text: true
        }
    );

    let err = edit.commit(&mut editor, "x.dev", Some("  ")).unwrap_err();
    assert!(matches!(err, EditorError::Input(InputError::EmptyLinkText)));
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);

    let outcome = edit.commit(&mut editor, "x.dev", Some(" X ")).unwrap();
    assert_eq!(
        outcome,
        LinkOutcome::Inserted {
            url: "https://x.dev".to_string(),
            text: "X".to_string()
        }
    );
    assert_eq!(to_html(editor.doc()), r#"<p>a<a href="https://x.dev">X</a>b</p>"#);
}

#[test]
fn range_selection_gets_the_link_applied() {
    let mut editor = editor(
        "paint me",
        Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 5),
        },
    );
    let edit = LinkEdit::begin(&editor);
    assert!(!edit.needs_text);

    let outcome = edit.commit(&mut editor, "https://x.dev", None).unwrap();
    assert_eq!(outcome, LinkOutcome::Applied("https://x.dev".to_string()));
    assert_eq!(to_html(editor.doc()), r#"<p><a href="https://x.dev">paint</a> me</p>"#);
}

#[test]
fn caret_inside_link_edits_the_whole_link() {
    let mut editor = editor("ab", Selection::collapsed(Point::new(vec![0, 0], 1)));
    editor
        .run_command(
            "marks.insert_link",
            Some(json!({ "url": "https://old.dev", "text": "link" })),
        )
        .unwrap();
    editor.set_selection(Selection::collapsed(Point::new(vec![0, 1], 2)));

    assert_eq!(
        link_range_at_caret(&editor),
        Some(Selection {
            anchor: Point::new(vec![0, 1], 0),
            focus: Point::new(vec![0, 1], 4),
        })
    );

    let edit = LinkEdit::begin(&editor);
    assert_eq!(edit.current.as_deref(), Some("https://old.dev"));
    assert!(!edit.needs_text);

    edit.commit(&mut editor, "new.dev", None).unwrap();
    assert_eq!(to_html(editor.doc()), r#"<p>a<a href="https://new.dev">link</a>b</p>"#);

    let edit = LinkEdit::begin(&editor);
    assert_eq!(edit.commit(&mut editor, "", None).unwrap(), LinkOutcome::Unset);
    assert_eq!(editor.doc().children, vec![Node::paragraph("alinkb")]);
}

#[test]
fn invalid_url_leaves_document_untouched() {
    let mut editor = editor(
        "abc",
        Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 3),
        },
    );
    let version = editor.version();
    let err = LinkEdit::begin(&editor)
        .commit(&mut editor, "javascript:alert(1)", None)
        .unwrap_err();
    assert!(matches!(err, EditorError::Input(InputError::InvalidLinkUrl)));
    assert_eq!(editor.version(), version);
}
