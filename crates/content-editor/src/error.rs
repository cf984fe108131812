use std::io;
use std::path::PathBuf;

use gpui_content_core::{ApplyError, CommandError, QueryError, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no slash command is selected")]
    NothingSelected,
    #[error("no image block is selected")]
    NoImageSelected,
    /// The view hosting the editor went away while work for it was in flight.
    #[error("the editor view was closed")]
    Closed,
}

/// Input a prompt rejected. The display text is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Teks tautan tidak boleh kosong.")]
    EmptyLinkText,
    #[error("URL tautan tidak valid.")]
    InvalidLinkUrl,
    #[error("URL gambar tidak valid.")]
    InvalidImageUrl,
}

#[derive(Debug, Error)]
#[error("failed to read image {name}: {source}")]
pub struct IngestError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid editor options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read editor options from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
