#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub name: &'static str,
    pub value: &'static str,
}

const fn swatch(name: &'static str, value: &'static str) -> Swatch {
    Swatch { name, value }
}

pub const TEXT_COLORS: [Swatch; 22] = [
    swatch("Slate", "#475569"),
    swatch("Gray", "#4b5563"),
    swatch("Zinc", "#52525b"),
    swatch("Neutral", "#525252"),
    swatch("Stone", "#57534e"),
    swatch("Red", "#dc2626"),
    swatch("Orange", "#ea580c"),
    swatch("Amber", "#d97706"),
    swatch("Yellow", "#ca8a04"),
    swatch("Lime", "#65a30d"),
    swatch("Green", "#16a34a"),
    swatch("Emerald", "#059669"),
    swatch("Teal", "#0d9488"),
    swatch("Cyan", "#0891b2"),
    swatch("Sky", "#0284c7"),
    swatch("Blue", "#2563eb"),
    swatch("Indigo", "#4f46e5"),
    swatch("Violet", "#7c3aed"),
    swatch("Purple", "#9333ea"),
    swatch("Fuchsia", "#c026d3"),
    swatch("Pink", "#db2777"),
    swatch("Rose", "#e11d48"),
];

pub const HIGHLIGHT_COLORS: [Swatch; 8] = [
    swatch("Yellow", "#fef08a"),
    swatch("Green", "#bbf7d0"),
    swatch("Blue", "#bfdbfe"),
    swatch("Purple", "#e9d5ff"),
    swatch("Pink", "#fbcfe8"),
    swatch("Red", "#fecaca"),
    swatch("Orange", "#fed7aa"),
    swatch("Gray", "#e5e7eb"),
];

/// The swatch whose value matches `color`, ignoring case.
pub fn find_swatch<'a>(palette: &'a [Swatch], color: &str) -> Option<&'a Swatch> {
    palette
        .iter()
        .find(|swatch| swatch.value.eq_ignore_ascii_case(color.trim()))
}
