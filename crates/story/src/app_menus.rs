use gpui::{Action, App, Entity, KeyBinding, Menu, MenuItem, SharedString, Window};
use gpui_component::{ActiveTheme as _, ThemeMode, ThemeRegistry, menu::AppMenuBar};

use crate::editor_view::{
    Copy, Cut, InsertImage, InsertImageFromUrl, Paste, Redo, SelectAll, SetLink, Undo,
};
use crate::themes::{SwitchTheme, SwitchThemeMode};

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct About;

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct Open;

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct Save;

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct SaveAs;

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct LoadSample;

#[derive(Action, Clone, PartialEq, Eq)]
#[action(namespace = content_story, no_json)]
pub struct Quit;

pub fn init(
    title: impl Into<SharedString>,
    window: &mut Window,
    cx: &mut App,
) -> Entity<AppMenuBar> {
    cx.on_action(|_: &Quit, cx: &mut App| {
        cx.quit();
    });

    cx.bind_keys([
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-o", Open, None),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-o", Open, None),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-s", Save, None),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-s", Save, None),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-shift-s", SaveAs, None),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-shift-s", SaveAs, None),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-q", Quit, None),
    ]);

    let title: SharedString = title.into();
    update_app_menu(title, cx);
    AppMenuBar::new(window, cx)
}

fn update_app_menu(title: SharedString, cx: &mut App) {
    let dark = cx.theme().mode.is_dark();
    let check = |on: bool, label: &str| -> SharedString {
        if on {
            format!("✓ {label}").into()
        } else {
            SharedString::from(label.to_string())
        }
    };

    cx.set_menus(vec![
        Menu {
            name: title,
            items: vec![
                MenuItem::action("About", About),
                MenuItem::Separator,
                MenuItem::action("Open HTML...", Open),
                MenuItem::action("Save", Save),
                MenuItem::action("Save As...", SaveAs),
                MenuItem::action("Load Sample Content", LoadSample),
                MenuItem::Separator,
                theme_menu(cx),
                MenuItem::Submenu(Menu {
                    name: "Appearance".into(),
                    items: vec![
                        MenuItem::action(check(!dark, "Light"), SwitchThemeMode(ThemeMode::Light)),
                        MenuItem::action(check(dark, "Dark"), SwitchThemeMode(ThemeMode::Dark)),
                    ],
                }),
                MenuItem::Separator,
                MenuItem::action("Quit", Quit),
            ],
        },
        Menu {
            name: "Edit".into(),
            items: vec![
                MenuItem::action("Undo", Undo),
                MenuItem::action("Redo", Redo),
                MenuItem::separator(),
                MenuItem::action("Cut", Cut),
                MenuItem::action("Copy", Copy),
                MenuItem::action("Paste", Paste),
                MenuItem::separator(),
                MenuItem::action("Select All", SelectAll),
            ],
        },
        Menu {
            name: "Insert".into(),
            items: vec![
                MenuItem::action("Image...", InsertImage),
                MenuItem::action("Image from URL...", InsertImageFromUrl),
                MenuItem::action("Link...", SetLink),
            ],
        },
    ]);
}

fn theme_menu(cx: &App) -> MenuItem {
    let current = cx.theme().theme_name();
    MenuItem::Submenu(Menu {
        name: "Theme".into(),
        items: ThemeRegistry::global(cx)
            .sorted_themes()
            .iter()
            .map(|theme| {
                let label: SharedString = if current == &theme.name {
                    format!("✓ {}", theme.name).into()
                } else {
                    theme.name.clone()
                };
                MenuItem::action(label, SwitchTheme(theme.name.clone()))
            })
            .collect(),
    })
}
