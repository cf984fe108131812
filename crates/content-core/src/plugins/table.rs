use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Document, Editor, ElementNode, Node, Point, Selection};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    CommandSpec, ContentPlugin, NodeSpec, NormalizePass, PluginRegistry, QueryError, QuerySpec,
    commit,
};
use crate::tree::{ancestor_element_path, insertion_point_after_focus, visit_nodes};

pub const DEFAULT_TABLE_ROWS: usize = 3;
pub const DEFAULT_TABLE_COLS: usize = 4;
const MAX_TABLE_DIMENSION: u64 = 32;

/// What the table toolbar may offer for the current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapabilities {
    pub in_table: bool,
    pub can_add_row: bool,
    pub can_delete_row: bool,
    pub can_add_col: bool,
    pub can_delete_col: bool,
    pub has_header_row: bool,
}

pub(crate) struct TablePlugin;

impl ContentPlugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container("table"),
            NodeSpec::container("table_row"),
            NodeSpec::container("table_cell"),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeTableStructure)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("table.insert", "Insert table", |editor, args| {
                let dimension = |key: &str, default: usize| {
                    args.as_ref()
                        .and_then(|v| v.get(key))
                        .and_then(Value::as_u64)
                        .map_or(default, |n| n.clamp(1, MAX_TABLE_DIMENSION) as usize)
                };
                let rows = dimension("rows", DEFAULT_TABLE_ROWS);
                let cols = dimension("cols", DEFAULT_TABLE_COLS);
                let header = args
                    .as_ref()
                    .and_then(|v| v.get("header"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let result = insert_table(editor, rows, cols, header);
                commit(editor, result, "insert table")
            })
            .description("Insert a table after the current block.")
            .keywords(["table", "grid"])
            .args_example(serde_json::json!({ "rows": 3, "cols": 4, "header": true })),
            CommandSpec::new("table.insert_row_above", "Insert row above", |editor, _args| {
                let result = insert_row(editor, 0);
                commit(editor, result, "insert row above")
            })
            .description("Insert a row above the current row.")
            .keywords(["table", "row", "insert"]),
            CommandSpec::new("table.insert_row_below", "Insert row below", |editor, _args| {
                let result = insert_row(editor, 1);
                commit(editor, result, "insert row below")
            })
            .description("Insert a row below the current row.")
            .keywords(["table", "row", "insert"]),
            CommandSpec::new("table.insert_col_left", "Insert column left", |editor, _args| {
                let result = insert_col(editor, 0);
                commit(editor, result, "insert column left")
            })
            .description("Insert a column left of the current column.")
            .keywords(["table", "column", "insert"]),
            CommandSpec::new("table.insert_col_right", "Insert column right", |editor, _args| {
                let result = insert_col(editor, 1);
                commit(editor, result, "insert column right")
            })
            .description("Insert a column right of the current column.")
            .keywords(["table", "column", "insert"]),
            CommandSpec::new("table.delete_row", "Delete row", |editor, _args| {
                let result = delete_row(editor);
                commit(editor, result, "delete row")
            })
            .description("Delete the current row. Deleting the last row removes the table.")
            .keywords(["table", "row", "delete", "remove"]),
            CommandSpec::new("table.delete_col", "Delete column", |editor, _args| {
                let result = delete_col(editor);
                commit(editor, result, "delete column")
            })
            .description("Delete the current column. Deleting the last column removes the table.")
            .keywords(["table", "column", "delete", "remove"]),
            CommandSpec::new("table.delete_table", "Delete table", |editor, _args| {
                let result = TableCursor::locate(editor)
                    .map(|cursor| replace_table_with_paragraph(&cursor.table_path, "delete_table"));
                commit(editor, result, "delete table")
            })
            .description("Replace the current table with an empty paragraph.")
            .keywords(["table", "delete", "remove"]),
            CommandSpec::new("table.toggle_header_row", "Toggle header row", |editor, _args| {
                let result = TableCursor::locate(editor).map(|cursor| {
                    Transaction::new(vec![Op::SetNodeAttrs {
                        path: cursor.table_path.clone(),
                        patch: AttrPatch::set("header_row", !cursor.has_header_row()),
                    }])
                    .selection_after(editor.selection().clone())
                    .source("command:table.toggle_header_row")
                });
                commit(editor, result, "toggle header row")
            })
            .description("Render the first row as a header row, or stop doing so.")
            .keywords(["table", "header", "th"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("table.is_active", |editor, _args| {
                Ok(Value::Bool(TableCursor::locate(editor).is_ok()))
            }),
            QuerySpec::new("table.capabilities", |editor, _args| {
                serde_json::to_value(table_capabilities(editor)).map_err(|err| {
                    QueryError::new(format!("Failed to encode table capabilities: {err}"))
                })
            }),
        ]
    }
}

pub fn table_capabilities(editor: &Editor) -> TableCapabilities {
    let Ok(cursor) = TableCursor::locate(editor) else {
        return TableCapabilities::default();
    };
    TableCapabilities {
        in_table: true,
        can_add_row: cursor.row_count() < MAX_TABLE_DIMENSION as usize,
        can_delete_row: true,
        can_add_col: cursor.col_count() < MAX_TABLE_DIMENSION as usize,
        can_delete_col: true,
        has_header_row: cursor.has_header_row(),
    }
}

/// The table, row and cell holding the selection focus.
struct TableCursor<'a> {
    table: &'a ElementNode,
    table_path: Path,
    row_ix: usize,
    cell_ix: usize,
}

impl<'a> TableCursor<'a> {
    fn locate(editor: &'a Editor) -> Result<Self, String> {
        let doc = editor.doc();
        let focus_path = &editor.selection().focus.path;
        let cell_path = ancestor_element_path(doc, focus_path, "table_cell").ok_or("Not in a table")?;
        let (&cell_ix, row_path) = cell_path
            .split_last()
            .ok_or_else(|| "Invalid table cell path".to_string())?;
        let (&row_ix, table_path) = row_path
            .split_last()
            .ok_or_else(|| "Invalid table row path".to_string())?;
        match doc.node(table_path) {
            Some(Node::Element(table)) if table.kind == "table" => Ok(Self {
                table,
                table_path: table_path.to_vec(),
                row_ix,
                cell_ix,
            }),
            _ => Err("Invalid table".into()),
        }
    }

    fn rows(&self) -> impl Iterator<Item = (usize, &'a ElementNode)> {
        self.table.children.iter().enumerate().filter_map(|(ix, node)| match node {
            Node::Element(row) if row.kind == "table_row" => Some((ix, row)),
            _ => None,
        })
    }

    fn row_count(&self) -> usize {
        self.rows().count()
    }

    fn col_count(&self) -> usize {
        self.rows().map(|(_, row)| row.children.len()).max().unwrap_or(1).max(1)
    }

    fn has_header_row(&self) -> bool {
        self.table
            .attrs
            .get("header_row")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn caret(&self, row_ix: usize, cell_ix: usize) -> Selection {
        let mut path = self.table_path.clone();
        path.extend([row_ix, cell_ix, 0, 0]);
        Selection::collapsed(Point::new(path, 0))
    }
}

fn table_cell_node() -> Node {
    Node::element("table_cell", Attrs::default(), vec![Node::paragraph("")])
}

fn table_row_node(cols: usize) -> Node {
    Node::element(
        "table_row",
        Attrs::default(),
        (0..cols.max(1)).map(|_| table_cell_node()).collect(),
    )
}

pub fn table_node(rows: usize, cols: usize, header_row: bool) -> Node {
    let mut attrs = Attrs::default();
    attrs.insert("header_row".to_string(), Value::Bool(header_row));
    Node::element(
        "table",
        attrs,
        (0..rows.max(1)).map(|_| table_row_node(cols)).collect(),
    )
}

fn insert_table(editor: &Editor, rows: usize, cols: usize, header: bool) -> Result<Transaction, String> {
    let (parent_path, insert_at) = insertion_point_after_focus(editor);

    let mut table_path = parent_path.clone();
    table_path.push(insert_at);
    let mut paragraph_path = parent_path;
    paragraph_path.push(insert_at + 1);

    let mut caret_path = table_path.clone();
    caret_path.extend([0, 0, 0, 0]);

    Ok(Transaction::new(vec![
        Op::InsertNode {
            path: table_path,
            node: table_node(rows, cols, header),
        },
        Op::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(caret_path, 0)))
    .source("command:table.insert"))
}

/// `offset` 0 inserts before the current row, 1 after it.
fn insert_row(editor: &Editor, offset: usize) -> Result<Transaction, String> {
    let cursor = TableCursor::locate(editor)?;
    let cols = cursor.col_count();
    let row_ix = cursor.row_ix + offset;

    let mut path = cursor.table_path.clone();
    path.push(row_ix);

    Ok(Transaction::new(vec![Op::InsertNode {
        path,
        node: table_row_node(cols),
    }])
    .selection_after(cursor.caret(row_ix, cursor.cell_ix.min(cols - 1)))
    .source("command:table.insert_row"))
}

/// `offset` 0 inserts left of the current column, 1 right of it.
fn insert_col(editor: &Editor, offset: usize) -> Result<Transaction, String> {
    let cursor = TableCursor::locate(editor)?;
    let col_ix = cursor.cell_ix + offset;

    let ops = cursor
        .rows()
        .map(|(row_ix, row)| {
            let mut path = cursor.table_path.clone();
            path.extend([row_ix, col_ix.min(row.children.len())]);
            Op::InsertNode {
                path,
                node: table_cell_node(),
            }
        })
        .collect();

    Ok(Transaction::new(ops)
        .selection_after(cursor.caret(cursor.row_ix, col_ix))
        .source("command:table.insert_col"))
}

fn replace_table_with_paragraph(table_path: &[usize], action: &str) -> Transaction {
    let mut caret_path = table_path.to_vec();
    caret_path.push(0);
    Transaction::new(vec![
        Op::RemoveNode {
            path: table_path.to_vec(),
        },
        Op::InsertNode {
            path: table_path.to_vec(),
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(caret_path, 0)))
    .source(format!("command:table.{action}"))
}

fn delete_row(editor: &Editor) -> Result<Transaction, String> {
    let cursor = TableCursor::locate(editor)?;
    let rows = cursor.row_count();
    if rows <= 1 {
        return Ok(replace_table_with_paragraph(&cursor.table_path, "delete_row"));
    }

    let mut path = cursor.table_path.clone();
    path.push(cursor.row_ix);
    let target_row = cursor.row_ix.min(rows - 2);

    Ok(Transaction::new(vec![Op::RemoveNode { path }])
        .selection_after(cursor.caret(target_row, cursor.cell_ix.min(cursor.col_count() - 1)))
        .source("command:table.delete_row"))
}

fn delete_col(editor: &Editor) -> Result<Transaction, String> {
    let cursor = TableCursor::locate(editor)?;
    let cols = cursor.col_count();
    if cols <= 1 {
        return Ok(replace_table_with_paragraph(&cursor.table_path, "delete_col"));
    }

    let ops = cursor
        .rows()
        .filter(|(_, row)| cursor.cell_ix < row.children.len())
        .map(|(row_ix, _)| {
            let mut path = cursor.table_path.clone();
            path.extend([row_ix, cursor.cell_ix]);
            Op::RemoveNode { path }
        })
        .collect();

    Ok(Transaction::new(ops)
        .selection_after(cursor.caret(cursor.row_ix, cursor.cell_ix.min(cols - 2)))
        .source("command:table.delete_col"))
}

/// Keeps tables rectangular, with at least one row and a paragraph in every cell.
struct NormalizeTableStructure;

impl NormalizePass for NormalizeTableStructure {
    fn id(&self) -> &'static str {
        "table.normalize_structure"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        fn normalize_table(table: &ElementNode, path: &[usize], ops: &mut Vec<Op>) {
            let child_path = |tail: &[usize]| {
                let mut p = path.to_vec();
                p.extend_from_slice(tail);
                p
            };

            if table.children.is_empty() {
                ops.push(Op::InsertNode {
                    path: child_path(&[0]),
                    node: table_row_node(1),
                });
                return;
            }

            let rows = table.children.iter().enumerate().filter_map(|(ix, n)| match n {
                Node::Element(row) if row.kind == "table_row" => Some((ix, row)),
                _ => None,
            });
            let max_cols = rows
                .clone()
                .map(|(_, row)| row.children.len())
                .max()
                .unwrap_or(1)
                .max(1);

            for (row_ix, row) in rows {
                for col_ix in row.children.len()..max_cols {
                    ops.push(Op::InsertNode {
                        path: child_path(&[row_ix, col_ix]),
                        node: table_cell_node(),
                    });
                }
                for (cell_ix, cell) in row.children.iter().enumerate() {
                    if let Node::Element(cell) = cell {
                        if cell.kind == "table_cell" && cell.children.is_empty() {
                            ops.push(Op::InsertNode {
                                path: child_path(&[row_ix, cell_ix, 0]),
                                node: Node::paragraph(""),
                            });
                        }
                    }
                }
            }

            if !table.attrs.get("header_row").is_some_and(Value::is_boolean) {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::set("header_row", false),
                });
            }
        }

        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            if let Node::Element(el) = node {
                if el.kind == "table" {
                    normalize_table(el, path, &mut ops);
                }
            }
        });
        ops
    }
}
