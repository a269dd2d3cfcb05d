//! Color themes for the tree panel and status bar.
//!
//! Ships a dark and a light palette; `scheme = "custom"` starts from the
//! dark palette and patches individual slots with `#rrggbb` values from the
//! config file.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// Colors consumed by the widgets.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_file_fg: Color,

    pub status_bg: Color,
    pub status_fg: Color,

    pub border_fg: Color,

    // Semantic colors, fixed per palette and not configurable.
    pub error_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

/// Catppuccin Mocha.
mod mocha {
    use ratatui::style::Color;

    pub const TEXT: Color = Color::Rgb(205, 214, 244);
    pub const BASE: Color = Color::Rgb(30, 30, 46);
    pub const SURFACE1: Color = Color::Rgb(69, 71, 90);
    pub const SURFACE2: Color = Color::Rgb(88, 91, 112);
    pub const OVERLAY0: Color = Color::Rgb(108, 112, 134);
    pub const BLUE: Color = Color::Rgb(137, 180, 250);
    pub const RED: Color = Color::Rgb(243, 139, 168);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
}

/// Catppuccin Latte.
mod latte {
    use ratatui::style::Color;

    pub const TEXT: Color = Color::Rgb(76, 79, 105);
    pub const MANTLE: Color = Color::Rgb(230, 233, 239);
    pub const SURFACE1: Color = Color::Rgb(204, 208, 218);
    pub const SURFACE2: Color = Color::Rgb(172, 176, 190);
    pub const OVERLAY0: Color = Color::Rgb(140, 143, 161);
    pub const BLUE: Color = Color::Rgb(30, 102, 245);
    pub const RED: Color = Color::Rgb(210, 15, 57);
    pub const GREEN: Color = Color::Rgb(64, 160, 43);
}

pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: mocha::TEXT,
        tree_selected_bg: mocha::SURFACE1,
        tree_selected_fg: mocha::TEXT,
        tree_dir_fg: mocha::BLUE,
        tree_file_fg: mocha::TEXT,
        status_bg: mocha::BASE,
        status_fg: mocha::TEXT,
        border_fg: mocha::SURFACE2,
        error_fg: mocha::RED,
        success_fg: mocha::GREEN,
        info_fg: mocha::BLUE,
        dim_fg: mocha::OVERLAY0,
    }
}

pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: latte::TEXT,
        tree_selected_bg: latte::SURFACE1,
        tree_selected_fg: latte::TEXT,
        tree_dir_fg: latte::BLUE,
        tree_file_fg: latte::TEXT,
        status_bg: latte::MANTLE,
        status_fg: latte::TEXT,
        border_fg: latte::SURFACE2,
        error_fg: latte::RED,
        success_fg: latte::GREEN,
        info_fg: latte::BLUE,
        dim_fg: latte::OVERLAY0,
    }
}

/// Parse `"#rrggbb"` (hash optional). `None` for anything malformed.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Pick the runtime palette for the configured scheme.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref() {
        Some("light") => light_theme(),
        Some("custom") => {
            let mut theme = dark_theme();
            if let Some(overrides) = &config.custom {
                patch_theme(&mut theme, overrides);
            }
            theme
        }
        // "dark", absent, or unrecognized.
        _ => dark_theme(),
    }
}

/// Overlay the custom hex values that parse; the rest keep their defaults.
fn patch_theme(theme: &mut ThemeColors, overrides: &ThemeColorsConfig) {
    let mut patch = |slot: &mut Color, hex: &Option<String>| {
        if let Some(color) = hex.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    };
    patch(&mut theme.tree_bg, &overrides.tree_bg);
    patch(&mut theme.tree_fg, &overrides.tree_fg);
    patch(&mut theme.tree_selected_bg, &overrides.tree_selected_bg);
    patch(&mut theme.tree_selected_fg, &overrides.tree_selected_fg);
    patch(&mut theme.tree_dir_fg, &overrides.tree_dir_fg);
    patch(&mut theme.tree_file_fg, &overrides.tree_file_fg);
    patch(&mut theme.status_bg, &overrides.status_bg);
    patch(&mut theme.status_fg, &overrides.status_fg);
    patch(&mut theme.border_fg, &overrides.border_fg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing_round_trips_channels() {
        assert_eq!(parse_hex_color("#102030"), Some(Color::Rgb(16, 32, 48)));
        assert_eq!(parse_hex_color("c0ffee"), Some(Color::Rgb(192, 255, 238)));
    }

    #[test]
    fn hex_parsing_rejects_malformed_input() {
        for bad in ["", "#", "#12345", "#1234567", "#gghhii", "#12 456"] {
            assert_eq!(parse_hex_color(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn default_scheme_is_dark() {
        let theme = resolve_theme(&ThemeConfig::default());
        assert_eq!(theme.tree_dir_fg, mocha::BLUE);
    }

    #[test]
    fn light_scheme_selects_latte() {
        let config = ThemeConfig {
            scheme: Some("light".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&config).tree_dir_fg, latte::BLUE);
    }

    #[test]
    fn unknown_scheme_falls_back_to_dark() {
        let config = ThemeConfig {
            scheme: Some("solarized".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&config).tree_dir_fg, mocha::BLUE);
    }

    #[test]
    fn custom_scheme_patches_only_given_slots() {
        let config = ThemeConfig {
            scheme: Some("custom".into()),
            custom: Some(ThemeColorsConfig {
                tree_fg: Some("#c0caf5".into()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.tree_fg, Color::Rgb(192, 202, 245));
        assert_eq!(theme.tree_dir_fg, mocha::BLUE);
    }

    #[test]
    fn custom_scheme_ignores_unparsable_values() {
        let config = ThemeConfig {
            scheme: Some("custom".into()),
            custom: Some(ThemeColorsConfig {
                tree_bg: Some("#not-hex".into()),
                ..Default::default()
            }),
        };
        assert_eq!(resolve_theme(&config).tree_bg, Color::Reset);
    }

    #[test]
    fn palettes_are_distinct() {
        let dark = dark_theme();
        let light = light_theme();
        assert_ne!(dark.tree_fg, light.tree_fg);
        assert_ne!(dark.status_bg, light.status_bg);
        assert_ne!(dark.error_fg, light.error_fg);
    }
}
