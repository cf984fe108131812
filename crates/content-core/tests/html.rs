use gpui_content_core::{
    Attrs, Document, ImageBlockAttrs, Marks, Node, from_html, to_html,
};
use pretty_assertions::assert_eq;

fn image(src: &str, width: u32) -> Node {
    Node::image_block(&ImageBlockAttrs::new(src).width(width))
}

#[test]
fn empty_document_serializes_to_empty_paragraph() {
    assert_eq!(to_html(&Document::default()), "<p></p>");
    assert_eq!(from_html("").children, vec![Node::paragraph("")]);
    assert_eq!(from_html("   \n  ").children, vec![Node::paragraph("")]);
}

#[test]
fn image_block_serializes_with_figure_wrapper() {
    let attrs = ImageBlockAttrs::new("https://example.com/a.png")
        .alt("A cat")
        .width(55);
    let doc = Document::new(vec![Node::image_block(&attrs)]);
    assert_eq!(
        to_html(&doc),
        concat!(
            r#"<figure data-type="image-block" data-width="55">"#,
            r#"<img src="https://example.com/a.png" alt="A cat" style="width: 55%;" data-width="55">"#,
            "</figure>"
        )
    );

    let doc = Document::new(vec![Node::image_block(
        &attrs.clone().caption("Sleepy & warm").title("cat"),
    )]);
    assert_eq!(
        to_html(&doc),
        concat!(
            r#"<figure data-type="image-block" data-width="55">"#,
            r#"<img src="https://example.com/a.png" alt="A cat" title="cat" style="width: 55%;" data-width="55">"#,
            "<figcaption>Sleepy &amp; warm</figcaption>",
            "</figure>"
        )
    );
}

#[test]
fn figure_width_precedence() {
    let doc = from_html(
        r#"<figure data-type="image-block" data-width="30"><img src="x.png" data-width="60" style="width: 80%"></figure>"#,
    );
    assert_eq!(doc.children, vec![image("x.png", 30)]);

    let doc = from_html(
        r#"<figure data-type="image-block"><img src="x.png" data-width="60" style="width: 80%"></figure>"#,
    );
    assert_eq!(doc.children, vec![image("x.png", 60)]);

    let doc = from_html(r#"<figure><img src="x.png" style="width: 42.6%;"></figure>"#);
    assert_eq!(doc.children, vec![image("x.png", 43)]);

    let doc = from_html(r#"<figure><img src="x.png" style="width: wide"></figure>"#);
    assert_eq!(doc.children, vec![image("x.png", 100)]);
}

#[test]
fn figure_caption_is_read_back() {
    let doc = from_html(
        r#"<figure data-type="image-block" data-width="5"><img src="x.png" alt="x"><figcaption> A  caption </figcaption></figure>"#,
    );
    let expected = ImageBlockAttrs::new("x.png")
        .alt("x")
        .caption("A  caption")
        .width(10);
    assert_eq!(doc.children, vec![Node::image_block(&expected)]);
}

#[test]
fn bare_images_become_image_blocks() {
    let doc = from_html(r#"<img src="a.png" style="width: 40%">"#);
    assert_eq!(doc.children, vec![image("a.png", 40)]);

    let doc = from_html(r#"<p>before<img src="b.png" alt="b">after</p>"#);
    assert_eq!(
        doc.children,
        vec![
            Node::paragraph("before"),
            Node::image_block(&ImageBlockAttrs::new("b.png").alt("b")),
            Node::paragraph("after"),
        ]
    );

    let doc = from_html(r#"<p><img src="c.png"></p>"#);
    assert_eq!(doc.children, vec![image("c.png", 100)]);
}

#[test]
fn block_markup_round_trips() {
    let html = concat!(
        r#"<h2 style="text-align: center;">Title</h2>"#,
        r#"<p data-indent="2">Indented</p>"#,
        "<blockquote><p>Quoted</p></blockquote>",
        "<hr>",
        r#"<pre><code class="language-rust">fn main() {"#,
        "\n",
        "}</code></pre>",
        "<ul><li><p>a</p><ul><li><p>b</p></li></ul></li><li><p>c</p></li></ul>",
        "<ol><li><p>d</p></li></ol>",
        r#"<ul data-type="taskList"><li data-type="taskItem" data-checked="true"><p>done</p></li>"#,
        r#"<li data-type="taskItem" data-checked="false"><p>todo</p></li></ul>"#,
        "<table><tbody><tr><th><p>H</p></th><th><p>I</p></th></tr>",
        "<tr><td><p>a</p></td><td><p></p></td></tr></tbody></table>",
    );
    assert_eq!(to_html(&from_html(html)), html);
}

#[test]
fn lists_map_nesting_to_list_level() {
    let doc = from_html("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
    let levels: Vec<(String, u64)> = doc
        .children
        .iter()
        .map(|node| {
            let Node::Element(el) = node else {
                panic!("expected list item");
            };
            assert_eq!(el.kind, "list_item");
            (
                node.text_content(),
                el.attrs.get("list_level").and_then(|v| v.as_u64()).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        levels,
        vec![
            ("a".to_string(), 0),
            ("b".to_string(), 1),
            ("c".to_string(), 0)
        ]
    );
}

#[test]
fn table_header_row_comes_from_th_cells() {
    let doc = from_html("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>");
    let Node::Element(table) = &doc.children[0] else {
        panic!("expected table");
    };
    assert_eq!(table.kind, "table");
    assert_eq!(table.attrs.get("header_row"), Some(&serde_json::json!(false)));
    let Node::Element(second_row) = &table.children[1] else {
        panic!("expected row");
    };
    assert_eq!(second_row.children.len(), 2, "short rows are padded");
}

#[test]
fn inline_marks_round_trip() {
    let html = concat!(
        r#"<p><a href="https://x.dev"><strong>bold</strong></a> and "#,
        r##"<mark data-color="#fef08a" style="background-color: #fef08a;">hi</mark> "##,
        r##"<span style="color: #dc2626;"><em>red</em></span>"##,
        " H<sub>2</sub>O x<sup>2</sup> <u>u</u><s>s</s><code>c</code></p>",
    );
    let doc = from_html(html);
    assert_eq!(to_html(&doc), html);

    let Node::Element(p) = &doc.children[0] else {
        panic!("expected paragraph");
    };
    let Node::Text(first) = &p.children[0] else {
        panic!("expected text");
    };
    assert_eq!(
        first.marks,
        Marks {
            bold: true,
            link: Some("https://x.dev".to_string()),
            ..Marks::default()
        }
    );
}

#[test]
fn legacy_inline_tags_are_accepted() {
    let doc = from_html("<p><b>b</b><i>i</i><strike>s</strike><del>d</del></p>");
    assert_eq!(
        to_html(&doc),
        "<p><strong>b</strong><em>i</em><s>sd</s></p>"
    );
}

#[test]
fn text_is_escaped_and_unknown_tags_keep_text() {
    let doc = Document::new(vec![Node::paragraph(r#"a < b & "c""#)]);
    let html = to_html(&doc);
    assert_eq!(html, r#"<p>a &lt; b &amp; "c"</p>"#);
    assert_eq!(from_html(&html), doc);

    let doc = from_html("<p>hello <custom-tag>world</custom-tag></p><script>alert(1)</script>");
    assert_eq!(doc.children, vec![Node::paragraph("hello world")]);
}

#[test]
fn line_breaks_map_to_newlines() {
    let doc = from_html("<pre>a<br>b</pre><p>one<br>two</p>");
    let Node::Element(code) = &doc.children[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.kind, "code_block");
    assert_eq!(doc.children[0].text_content(), "a\nb");
    assert_eq!(doc.children[1], Node::paragraph("one\ntwo"));
    assert_eq!(to_html(&doc), "<pre><code>a\nb</code></pre><p>one<br>two</p>");
}

#[test]
fn formatting_whitespace_is_collapsed() {
    let doc = from_html("<div>\n  <p>\n    Hello\n    world\n  </p>\n</div>");
    assert_eq!(doc.children, vec![Node::paragraph("Hello world")]);
}

#[test]
fn implied_paragraph_ends_are_handled() {
    let doc = from_html("<p>one<p>two<h1>three");
    let mut attrs = Attrs::default();
    attrs.insert("level".to_string(), serde_json::json!(1));
    assert_eq!(
        doc.children,
        vec![
            Node::paragraph("one"),
            Node::paragraph("two"),
            Node::element("heading", attrs, vec![Node::text("three")]),
        ]
    );
}
