use std::path::{Path, PathBuf};

use gpui::{Action, App, SharedString};
use gpui_component::{Theme, ThemeMode, ThemeRegistry};

#[derive(Action, Clone, PartialEq)]
#[action(namespace = content_themes, no_json)]
pub struct SwitchTheme(pub SharedString);

#[derive(Action, Clone, PartialEq)]
#[action(namespace = content_themes, no_json)]
pub struct SwitchThemeMode(pub ThemeMode);

fn has_json_files(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries.flatten().any(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
    })
}

/// First of `./themes` and `../themes` holding theme files.
fn theme_dir() -> Option<PathBuf> {
    ["./themes", "../themes"]
        .into_iter()
        .map(PathBuf::from)
        .find(|dir| has_json_files(dir))
}

pub fn init(cx: &mut App) {
    match theme_dir() {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "watching theme directory");
            if let Err(err) = ThemeRegistry::watch_dir(dir, cx, |_| {}) {
                tracing::warn!(%err, "failed to watch theme directory");
            }
        }
        None => tracing::debug!("no theme directory found; using built-in themes"),
    }

    cx.on_action(|switch: &SwitchTheme, cx| {
        let config = ThemeRegistry::global(cx).themes().get(&switch.0).cloned();
        match config {
            Some(config) => Theme::global_mut(cx).apply_config(&config),
            None => tracing::warn!(theme = %switch.0, "unknown theme"),
        }
        cx.refresh_windows();
    });

    cx.on_action(|switch: &SwitchThemeMode, cx| {
        Theme::change(switch.0, None, cx);
        cx.refresh_windows();
    });
}
