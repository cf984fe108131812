mod core;
pub mod html;
mod image;
mod ops;
mod plugin;
mod plugins;
mod tree;
mod value;

pub use crate::core::*;
pub use crate::html::{from_html, to_html};
pub use crate::image::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::plugins::*;
pub use crate::tree::*;
pub use crate::value::*;
