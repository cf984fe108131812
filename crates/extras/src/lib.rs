//! GPUI widgets shared by content editor views: toolbar controls, the slash
//! menu list and the bundled icon assets.

pub mod assets;
pub mod slash_menu;
pub mod toolbar;
