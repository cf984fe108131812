use gpui_content_core::{
    Editor, Node, Point, Selection, TableCapabilities, table_capabilities, table_node, to_html,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn table_editor(rows: usize, cols: usize) -> Editor {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor
        .run_command(
            "table.insert",
            Some(json!({ "rows": rows, "cols": cols, "header": false })),
        )
        .unwrap();
    editor
}

fn cell_caret(row: usize, col: usize) -> Selection {
    Selection::collapsed(Point::new(vec![1, row, col, 0, 0], 0))
}

fn table_shape(editor: &Editor) -> (usize, Vec<usize>) {
    let Node::Element(table) = &editor.doc().children[1] else {
        panic!("expected table");
    };
    let widths = table
        .children
        .iter()
        .map(|row| match row {
            Node::Element(row) => row.children.len(),
            _ => 0,
        })
        .collect();
    (table.children.len(), widths)
}

#[test]
fn insert_uses_defaults_and_places_caret_in_first_cell() {
    let mut editor = Editor::with_content_plugins().unwrap();
    editor.run_command("table.insert", None).unwrap();

    assert_eq!(editor.doc().children.len(), 3);
    assert_eq!(editor.doc().children[1], table_node(3, 4, true));
    assert_eq!(editor.doc().children[2], Node::paragraph(""));
    assert_eq!(editor.selection(), &cell_caret(0, 0));

    assert!(editor.run_query::<bool>("table.is_active", None).unwrap());
    assert_eq!(
        table_capabilities(&editor),
        TableCapabilities {
            in_table: true,
            can_add_row: true,
            can_delete_row: true,
            can_add_col: true,
            can_delete_col: true,
            has_header_row: true,
        }
    );
}

#[test]
fn capabilities_are_empty_outside_a_table() {
    let editor = Editor::with_content_plugins().unwrap();
    assert_eq!(table_capabilities(&editor), TableCapabilities::default());
    let value = editor.run_query_json("table.capabilities", None).unwrap();
    assert_eq!(value["in_table"], json!(false));
}

#[test]
fn rows_and_columns_are_inserted_around_the_caret() {
    let mut editor = table_editor(2, 2);
    editor.set_selection(cell_caret(1, 1));

    editor.run_command("table.insert_row_above", None).unwrap();
    assert_eq!(table_shape(&editor), (3, vec![2, 2, 2]));
    assert_eq!(editor.selection(), &cell_caret(1, 1));

    editor.run_command("table.insert_row_below", None).unwrap();
    assert_eq!(table_shape(&editor), (4, vec![2, 2, 2, 2]));
    assert_eq!(editor.selection(), &cell_caret(2, 1));

    editor.run_command("table.insert_col_left", None).unwrap();
    assert_eq!(table_shape(&editor), (4, vec![3, 3, 3, 3]));
    assert_eq!(editor.selection(), &cell_caret(2, 1));

    editor.run_command("table.insert_col_right", None).unwrap();
    assert_eq!(table_shape(&editor), (4, vec![4, 4, 4, 4]));
    assert_eq!(editor.selection(), &cell_caret(2, 2));
}

#[test]
fn deleting_rows_and_columns_shrinks_the_table() {
    let mut editor = table_editor(2, 3);
    editor.set_selection(cell_caret(1, 2));

    editor.run_command("table.delete_col", None).unwrap();
    assert_eq!(table_shape(&editor), (2, vec![2, 2]));
    assert_eq!(editor.selection(), &cell_caret(1, 1));

    editor.run_command("table.delete_row", None).unwrap();
    assert_eq!(table_shape(&editor), (1, vec![2]));
    assert_eq!(editor.selection(), &cell_caret(0, 1));
}

#[test]
fn deleting_the_last_row_replaces_the_table() {
    let mut editor = table_editor(1, 2);
    editor.set_selection(cell_caret(0, 0));
    editor.run_command("table.delete_row", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph(""), Node::paragraph(""), Node::paragraph("")]
    );
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![1, 0], 0))
    );
}

#[test]
fn deleting_the_last_column_replaces_the_table() {
    let mut editor = table_editor(3, 1);
    editor.set_selection(cell_caret(2, 0));
    editor.run_command("table.delete_col", None).unwrap();
    assert_eq!(editor.doc().children[1], Node::paragraph(""));
    assert!(!editor.run_query::<bool>("table.is_active", None).unwrap());
}

#[test]
fn header_row_toggles_th_rendering() {
    let mut editor = table_editor(2, 1);
    editor.run_command("table.toggle_header_row", None).unwrap();
    assert!(table_capabilities(&editor).has_header_row);
    assert_eq!(
        to_html(editor.doc()),
        "<p></p><table><tbody><tr><th><p></p></th></tr><tr><td><p></p></td></tr></tbody></table><p></p>"
    );

    editor.run_command("table.toggle_header_row", None).unwrap();
    assert!(!table_capabilities(&editor).has_header_row);
}

#[test]
fn delete_table_leaves_an_empty_paragraph() {
    let mut editor = table_editor(2, 2);
    editor.run_command("table.delete_table", None).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph(""), Node::paragraph(""), Node::paragraph("")]
    );
}

#[test]
fn table_commands_fail_outside_a_table() {
    let mut editor = Editor::with_content_plugins().unwrap();
    let err = editor.run_command("table.insert_row_below", None).unwrap_err();
    assert_eq!(err.message(), "Not in a table");
}

#[test]
fn dimensions_are_clamped() {
    let editor = table_editor(0, 99);
    assert_eq!(table_shape(&editor), (1, vec![32]));
}
