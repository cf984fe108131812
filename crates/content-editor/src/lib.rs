//! Editor-facing behavior on top of `gpui-content-core`: the slash menu,
//! bubble menus, prompts, image ingestion and width syncing.

mod commands;
mod control;
mod error;
mod events;
mod ingest;
mod link;
mod options;
mod palette;
mod prompts;
mod slash;
mod toolbar;
mod width_sync;

pub use crate::commands::*;
pub use crate::control::*;
pub use crate::error::*;
pub use crate::events::*;
pub use crate::ingest::*;
pub use crate::link::*;
pub use crate::options::*;
pub use crate::palette::*;
pub use crate::prompts::*;
pub use crate::slash::*;
pub use crate::toolbar::*;
pub use crate::width_sync::*;
