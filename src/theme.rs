//! Color palettes for the tree, editor and chrome.
//!
//! Two built-in schemes (dark and light). A `custom` scheme starts from
//! dark and takes hex overrides from the `[theme.custom]` config table.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// All runtime colors used in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColors {
    // Tree pane
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_dir_fg: Color,
    pub tree_focused_fg: Color,
    pub tree_placeholder_fg: Color,

    // Editor pane
    pub editor_fg: Color,
    pub editor_line_nr: Color,
    pub editor_line_nr_current: Color,
    pub editor_cursor_fg: Color,
    pub editor_cursor_bg: Color,

    // Chrome
    pub status_bg: Color,
    pub status_fg: Color,
    pub border_fg: Color,
    pub border_focused_fg: Color,
    pub menu_bg: Color,
    pub menu_selected_bg: Color,

    // Semantic
    pub error_fg: Color,
    pub success_fg: Color,
    pub dim_fg: Color,
}

/// Catppuccin Mocha.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // text
        tree_selected_bg: Color::Rgb(69, 71, 90),    // surface1
        tree_dir_fg: Color::Rgb(137, 180, 250),      // blue
        tree_focused_fg: Color::Rgb(249, 226, 175),  // yellow
        tree_placeholder_fg: Color::Rgb(108, 112, 134), // overlay0

        editor_fg: Color::Rgb(205, 214, 244),
        editor_line_nr: Color::Rgb(108, 112, 134),
        editor_line_nr_current: Color::Rgb(249, 226, 175),
        editor_cursor_fg: Color::Rgb(30, 30, 46),
        editor_cursor_bg: Color::Rgb(205, 214, 244),

        status_bg: Color::Rgb(30, 30, 46),           // base
        status_fg: Color::Rgb(205, 214, 244),
        border_fg: Color::Rgb(88, 91, 112),          // surface2
        border_focused_fg: Color::Rgb(137, 180, 250),
        menu_bg: Color::Rgb(49, 50, 68),             // surface0
        menu_selected_bg: Color::Rgb(69, 71, 90),

        error_fg: Color::Rgb(243, 139, 168),         // red
        success_fg: Color::Rgb(166, 227, 161),       // green
        dim_fg: Color::Rgb(108, 112, 134),
    }
}

/// Catppuccin Latte.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),
        tree_selected_bg: Color::Rgb(204, 208, 218),
        tree_dir_fg: Color::Rgb(30, 102, 245),
        tree_focused_fg: Color::Rgb(223, 142, 29),
        tree_placeholder_fg: Color::Rgb(156, 160, 176),

        editor_fg: Color::Rgb(76, 79, 105),
        editor_line_nr: Color::Rgb(156, 160, 176),
        editor_line_nr_current: Color::Rgb(223, 142, 29),
        editor_cursor_fg: Color::Rgb(239, 241, 245),
        editor_cursor_bg: Color::Rgb(76, 79, 105),

        status_bg: Color::Rgb(239, 241, 245),
        status_fg: Color::Rgb(76, 79, 105),
        border_fg: Color::Rgb(172, 176, 190),
        border_focused_fg: Color::Rgb(30, 102, 245),
        menu_bg: Color::Rgb(230, 233, 239),
        menu_selected_bg: Color::Rgb(204, 208, 218),

        error_fg: Color::Rgb(210, 15, 57),
        success_fg: Color::Rgb(64, 160, 43),
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// Parse `"#aabbcc"` (the `#` is optional). `None` for anything else.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Pick the palette named by `config.scheme`; unknown names fall back to dark.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let overrides = [
        (&custom.tree_fg, &mut theme.tree_fg),
        (&custom.tree_selected_bg, &mut theme.tree_selected_bg),
        (&custom.tree_dir_fg, &mut theme.tree_dir_fg),
        (&custom.tree_focused_fg, &mut theme.tree_focused_fg),
        (&custom.editor_fg, &mut theme.editor_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
    ];
    for (hex, slot) in overrides {
        if let Some(color) = hex.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("1a1b26"), Some(Color::Rgb(26, 27, 38)));
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn test_resolve_named_schemes() {
        let light = ThemeConfig {
            scheme: Some("light".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&light), light_theme());
        assert_eq!(resolve_theme(&ThemeConfig::default()), dark_theme());

        let unknown = ThemeConfig {
            scheme: Some("neon".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&unknown), dark_theme());
    }

    #[test]
    fn test_custom_overrides_on_dark() {
        let config = ThemeConfig {
            scheme: Some("custom".into()),
            custom: Some(ThemeColorsConfig {
                tree_dir_fg: Some("#102030".into()),
                border_fg: Some("nonsense".into()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.tree_dir_fg, Color::Rgb(16, 32, 48));
        assert_eq!(theme.border_fg, dark_theme().border_fg);
        assert_eq!(theme.tree_fg, dark_theme().tree_fg);
    }
}
