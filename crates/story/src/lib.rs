pub mod app_menus;
mod dialogs;
pub mod editor_view;
mod line_element;
mod overlays;
pub mod story;
pub mod themes;

use gpui::App;

pub fn init(cx: &mut App) {
    themes::init(cx);
    editor_view::init(cx);
}
