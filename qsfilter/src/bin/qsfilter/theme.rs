use colored::Color;
use once_cell::sync::Lazy;

/// Colors used for status lines, headings and key/value output.
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
    pub primary: Color,
    pub key: Color,
    pub value: Color,
}

pub static THEME: Lazy<ColorTheme> = Lazy::new(|| ColorTheme {
    success: Color::Green,
    error: Color::Red,
    warning: Color::Yellow,
    info: Color::Blue,
    highlight: Color::Cyan,
    muted: Color::BrightBlack,
    primary: Color::BrightBlue,
    key: Color::BrightCyan,
    value: Color::White,
});

/// Message prefixes.
pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub loading: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    loading: "⟳",
};
