use gpui_content_core::{Editor, Selection, selected_image};
use gpui_content_editor::{
    EditorError, ImageTextField, ImageTextPrompt, InputError, normalize_image_url,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn image_urls_must_be_web_data_or_root_relative() {
    assert_eq!(
        normalize_image_url("  https://x.dev/a.png "),
        Ok("https://x.dev/a.png".to_string())
    );
    assert_eq!(
        normalize_image_url("data:image/png;base64,AAAA"),
        Ok("data:image/png;base64,AAAA".to_string())
    );
    assert_eq!(normalize_image_url("/static/a.png"), Ok("/static/a.png".to_string()));

    for input in ["", "https://", "/", "x.dev/a.png", "data:text/plain,hi", "https://x.dev/a b.png"] {
        assert_eq!(normalize_image_url(input), Err(InputError::InvalidImageUrl), "{input}");
    }
    assert_eq!(InputError::InvalidImageUrl.to_string(), "URL gambar tidak valid.");
}

fn editor_with_image() -> Editor {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command("image.insert", Some(json!({ "src": "a.png", "caption": "Old" })))
        .unwrap();
    editor.set_selection(Selection::node(vec![0]));
    editor
}

#[test]
fn alt_prompt_updates_the_image() {
    let mut editor = editor_with_image();
    let prompt = ImageTextPrompt::for_selection(&editor, ImageTextField::Alt).unwrap();
    assert_eq!(prompt.initial, "");
    assert_eq!(prompt.field.label(), "Alt text");

    assert!(prompt.submit(&mut editor, Some("  A cat ")).unwrap());
    assert_eq!(selected_image(&editor).unwrap().1.alt, "A cat");
}

#[test]
fn unchanged_or_cancelled_prompts_do_nothing() {
    let mut editor = editor_with_image();
    let prompt = ImageTextPrompt::at(&editor, vec![0], ImageTextField::Caption).unwrap();
    assert_eq!(prompt.initial, "Old");
    let version = editor.version();

    assert!(!prompt.submit(&mut editor, None).unwrap());
    assert!(!prompt.submit(&mut editor, Some(" Old ")).unwrap());
    assert_eq!(editor.version(), version);

    assert!(prompt.submit(&mut editor, Some("")).unwrap());
    assert_eq!(selected_image(&editor).unwrap().1.caption, "");
}

#[test]
fn prompts_need_an_image_block() {
    let mut editor = editor_with_image();
    assert!(ImageTextPrompt::at(&editor, vec![1], ImageTextField::Alt).is_none());

    let prompt = ImageTextPrompt::for_selection(&editor, ImageTextField::Alt).unwrap();
    editor.run_command("core.delete_backward", None).unwrap();
    assert!(matches!(
        prompt.submit(&mut editor, Some("x")),
        Err(EditorError::NoImageSelected)
    ));
}
