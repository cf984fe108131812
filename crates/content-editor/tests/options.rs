use gpui_content_editor::{EditorOptions, OptionsError, TableDefaults};
use pretty_assertions::assert_eq;

#[test]
fn defaults() {
    let options = EditorOptions::default();
    assert_eq!(options.trigger_char, '/');
    assert_eq!(options.max_suggestions, 10);
    assert_eq!(
        options.default_table,
        TableDefaults {
            rows: 3,
            cols: 4,
            header: true
        }
    );
    assert_eq!(options.default_image_width, 100);
    assert_eq!(options.editor_config().max_undo, 200);
}

#[test]
fn partial_json_fills_in_defaults_and_sanitizes() {
    let options = EditorOptions::from_json_str(
        r#"{
            "trigger_char": ">",
            "max_suggestions": 0,
            "default_image_width": 4,
            "default_table": { "rows": 0 }
        }"#,
    )
    .unwrap();

    assert_eq!(options.trigger_char, '>');
    assert_eq!(options.max_suggestions, 10);
    assert_eq!(options.default_image_width, 10);
    assert_eq!(
        options.default_table,
        TableDefaults {
            rows: 1,
            cols: 4,
            header: true
        }
    );
    assert!(options.enable_slash_commands);
}

#[test]
fn bad_json_and_missing_files_are_errors() {
    let err = EditorOptions::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, OptionsError::Json(_)));

    let path = std::env::temp_dir().join("content-editor-options-missing.json");
    let err = EditorOptions::from_file(&path).unwrap_err();
    assert!(matches!(err, OptionsError::Read { .. }));
}

#[test]
fn options_file_is_read() {
    let path = std::env::temp_dir().join(format!(
        "content-editor-options-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{ "placeholder": "Write here", "max_undo": 5 }"#).unwrap();

    let options = EditorOptions::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(options.placeholder, "Write here");
    assert_eq!(options.editor_config().max_undo, 5);
}
