use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use gpui_content_core::{ImageBlockAttrs, Node, Point};
use gpui_content_editor::{
    ContentEditor, EditorError, EditorOptions, FilePickerGuard, ImageSink, ImageSource,
    IngestReport, InstanceId, MemoryImage, PathImage, alt_from_name, data_url,
    insert_images_from_files,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingSink {
    focused: Vec<Point>,
    inserted: Vec<ImageBlockAttrs>,
}

impl ImageSink for RecordingSink {
    fn focus(&mut self, point: Point) {
        self.focused.push(point);
    }

    fn insert_image(&mut self, attrs: ImageBlockAttrs) -> Result<(), EditorError> {
        self.inserted.push(attrs);
        Ok(())
    }
}

fn failing(path: &str) -> PathImage {
    PathImage::with_reader(
        path,
        Rc::new(|_: PathBuf| -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
            Box::pin(future::ready(Err(io::Error::new(
                io::ErrorKind::NotFound,
                "gone",
            ))))
        }),
    )
}

#[test]
fn data_urls_and_alt_text() {
    assert_eq!(data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    assert_eq!(alt_from_name("holiday.photo.jpg"), "holiday.photo");
    assert_eq!(alt_from_name("noext"), "noext");
}

#[test]
fn mime_comes_from_override_or_extension() {
    assert!(MemoryImage::new("a.PNG", Vec::new()).is_image());
    assert!(!MemoryImage::new("notes.txt", Vec::new()).is_image());
    assert!(MemoryImage::new("clip", Vec::new()).with_mime("image/gif").is_image());
    assert_eq!(
        PathImage::new("/tmp/x.webp").mime().as_deref(),
        Some("image/webp")
    );
}

#[test]
fn failed_read_does_not_stop_the_batch() {
    let files: Vec<Box<dyn ImageSource>> = vec![
        Box::new(MemoryImage::new("one.png", b"1".to_vec())),
        Box::new(failing("/missing/two.png")),
        Box::new(MemoryImage::new("three.jpg", b"3".to_vec())),
    ];
    let mut sink = RecordingSink::default();
    let at = Point::new(vec![2, 0], 1);

    let report = pollster::block_on(insert_images_from_files(&mut sink, &files, Some(at.clone())));

    assert_eq!(
        report,
        IngestReport {
            inserted: 2,
            skipped: 0,
            failed: 1
        }
    );
    assert_eq!(sink.focused, vec![at]);
    assert_eq!(
        sink.inserted,
        vec![
            ImageBlockAttrs::new("data:image/png;base64,MQ==").alt("one"),
            ImageBlockAttrs::new("data:image/jpeg;base64,Mw==").alt("three"),
        ]
    );
}

#[test]
fn non_images_are_skipped_without_focusing() {
    let files: Vec<Box<dyn ImageSource>> = vec![
        Box::new(MemoryImage::new("notes.txt", b"hi".to_vec())),
        Box::new(MemoryImage::new("data.bin", Vec::new()).with_mime("application/octet-stream")),
    ];
    let mut sink = RecordingSink::default();

    let report = pollster::block_on(insert_images_from_files(
        &mut sink,
        &files,
        Some(Point::new(vec![0, 0], 0)),
    ));

    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 0);
    assert!(sink.focused.is_empty());
}

#[test]
fn images_land_in_the_editor_in_order() {
    let options = EditorOptions {
        default_image_width: 60,
        ..EditorOptions::default()
    };
    let mut editor = ContentEditor::new(InstanceId::next(), options).unwrap();
    let files: Vec<Box<dyn ImageSource>> = vec![
        Box::new(MemoryImage::new("a.png", b"a".to_vec())),
        Box::new(failing("b.png")),
        Box::new(MemoryImage::new("c.png", b"c".to_vec())),
    ];

    let report = pollster::block_on(insert_images_from_files(&mut editor, &files, None));
    assert_eq!(report.inserted, 2);

    let children = &editor.editor().doc().children;
    assert_eq!(children.len(), 3);
    let first = ImageBlockAttrs::from_node(&children[0]).unwrap();
    let second = ImageBlockAttrs::from_node(&children[1]).unwrap();
    assert_eq!(first.alt, "a");
    assert_eq!(first.width, 60);
    assert_eq!(second.alt, "c");
    assert_eq!(children[2], Node::paragraph(""));
}

#[test]
fn sink_keeps_an_explicit_width() {
    let options = EditorOptions {
        default_image_width: 60,
        ..EditorOptions::default()
    };
    let mut editor = ContentEditor::new(InstanceId::next(), options).unwrap();

    editor
        .insert_image(ImageBlockAttrs::new("https://x.dev/a.png").width(35_u32))
        .unwrap();
    editor.insert_image_from_url("https://x.dev/b.png", None).unwrap();

    let children = &editor.editor().doc().children;
    let widths: Vec<u32> = children
        .iter()
        .filter_map(ImageBlockAttrs::from_node)
        .map(|attrs| attrs.width)
        .collect();
    assert_eq!(widths, vec![35, 60]);
}

#[test]
fn file_picker_opens_once_at_a_time() {
    let guard = FilePickerGuard::new();
    let ticket = guard.try_open().unwrap();
    assert!(guard.is_open());
    assert!(guard.clone().try_open().is_none());

    drop(ticket);
    assert!(!guard.is_open());
    assert!(guard.try_open().is_some());
}
