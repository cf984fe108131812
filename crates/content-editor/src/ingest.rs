//! Turning pasted, dropped or picked files into image blocks.

use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::{self, LocalBoxFuture};
use gpui_content_core::{DEFAULT_WIDTH_PERCENT, ImageBlockAttrs, Point};

use crate::error::{EditorError, IngestError};

pub trait ImageSource {
    fn name(&self) -> &str;

    fn mime(&self) -> Option<String>;

    fn read(&self) -> LocalBoxFuture<'_, io::Result<Vec<u8>>>;

    fn is_image(&self) -> bool {
        self.mime().is_some_and(|mime| mime.starts_with("image/"))
    }
}

fn guess_mime(name: &str) -> Option<String> {
    mime_guess::from_path(name).first_raw().map(str::to_string)
}

/// Bytes already in memory, e.g. from the clipboard.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    name: String,
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl ImageSource for MemoryImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime(&self) -> Option<String> {
        self.mime.clone().or_else(|| guess_mime(&self.name))
    }

    fn read(&self) -> LocalBoxFuture<'_, io::Result<Vec<u8>>> {
        Box::pin(future::ready(Ok(self.bytes.clone())))
    }
}

pub type FileReader = Rc<dyn Fn(PathBuf) -> LocalBoxFuture<'static, io::Result<Vec<u8>>>>;

/// A file on disk. The reader is pluggable so views can read off the UI thread.
#[derive(Clone)]
pub struct PathImage {
    path: PathBuf,
    name: String,
    mime: Option<String>,
    reader: FileReader,
}

impl PathImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_reader(
            path,
            Rc::new(|path: PathBuf| -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
                Box::pin(future::ready(std::fs::read(path)))
            }),
        )
    }

    pub fn with_reader(path: impl Into<PathBuf>, reader: FileReader) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            mime: None,
            reader,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PathImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathImage")
            .field("path", &self.path)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

impl ImageSource for PathImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime(&self) -> Option<String> {
        self.mime.clone().or_else(|| guess_mime(&self.name))
    }

    fn read(&self) -> LocalBoxFuture<'_, io::Result<Vec<u8>>> {
        (self.reader)(self.path.clone())
    }
}

/// Where ingested images go: the editor itself, or a view wrapping it.
pub trait ImageSink {
    fn focus(&mut self, point: Point);

    /// Inserts the block with `attrs` as given.
    fn insert_image(&mut self, attrs: ImageBlockAttrs) -> Result<(), EditorError>;

    /// Width given to images that arrive without one.
    fn default_image_width(&mut self) -> u32 {
        DEFAULT_WIDTH_PERCENT
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// The file name without its extension.
pub fn alt_from_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Inserts each image file in order, one read at a time. Non-images are
/// skipped and failed reads are logged; neither stops the batch.
pub async fn insert_images_from_files<S>(
    sink: &mut S,
    files: &[Box<dyn ImageSource>],
    position: Option<Point>,
) -> IngestReport
where
    S: ImageSink + ?Sized,
{
    let mut report = IngestReport::default();
    let images: Vec<(&dyn ImageSource, String)> = files
        .iter()
        .filter_map(|file| {
            let mime = file.mime().filter(|mime| mime.starts_with("image/"));
            if mime.is_none() {
                tracing::debug!(name = file.name(), "skipping non-image file");
                report.skipped += 1;
            }
            mime.map(|mime| (file.as_ref(), mime))
        })
        .collect();
    if images.is_empty() {
        return report;
    }

    if let Some(point) = position {
        sink.focus(point);
    }

    for (file, mime) in images {
        let bytes = match file.read().await {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = IngestError {
                    name: file.name().to_string(),
                    source,
                };
                tracing::warn!(%err, "skipping unreadable image");
                report.failed += 1;
                continue;
            }
        };

        let attrs = ImageBlockAttrs::new(data_url(&mime, &bytes))
            .alt(alt_from_name(file.name()))
            .width(sink.default_image_width());
        match sink.insert_image(attrs) {
            Ok(()) => report.inserted += 1,
            Err(err) => {
                tracing::warn!(name = file.name(), %err, "failed to insert image");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "image ingestion finished"
    );
    report
}

/// Keeps a second file picker from opening while one is showing.
#[derive(Debug, Clone, Default)]
pub struct FilePickerGuard {
    open: Rc<Cell<bool>>,
}

impl FilePickerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// `None` while another picker is open. The picker counts as open until
    /// the returned ticket is dropped.
    pub fn try_open(&self) -> Option<FilePickerTicket> {
        if self.open.replace(true) {
            tracing::debug!("file picker already open");
            return None;
        }
        Some(FilePickerTicket {
            open: self.open.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FilePickerTicket {
    open: Rc<Cell<bool>>,
}

impl Drop for FilePickerTicket {
    fn drop(&mut self) {
        self.open.set(false);
    }
}
