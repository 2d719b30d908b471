//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::block::PillColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const RED: Color = Color::Rgb(0xFF, 0x44, 0x44);
const YELLOW: Color = Color::Rgb(0xFF, 0xCC, 0x44);
const BLUE: Color = Color::Rgb(0x44, 0x44, 0xFF);

/// Pill colours and UI colours, optionally loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Indexed by `PillColor::index`: red, yellow, blue.
    pub pill: [Color; 3],
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Score, level and virus text.
    pub main_fg: Color,
    pub title: Color,
    /// Hints in overlays.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            pill: [RED, YELLOW, BLUE],
            bg: Color::Rgb(0x1E, 0x21, 0x28),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }
}

impl Theme {
    /// Load a btop-style file (`theme[key]="value"`). A missing path gives
    /// the built-in colours. `palette` then overrides the pill colours.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            None => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.pill = [
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                ];
            }
            // Orange / yellow / blue stay apart for red-green deficiency.
            Palette::Colorblind => {
                self.pill = [
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                    Color::Rgb(0x00, 0x77, 0xBB),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let fallback = Self::default();
        Self {
            pill: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(RED),
                get("cpu_mid").or_else(|| get("title")).unwrap_or(YELLOW),
                get("cpu_box").unwrap_or(BLUE),
            ],
            bg: get("meter_bg").unwrap_or(fallback.bg),
            div_line: get("div_line").unwrap_or(fallback.div_line),
            main_fg: get("main_fg").unwrap_or(fallback.main_fg),
            title: get("title").unwrap_or(fallback.title),
            inactive_fg: get("inactive_fg").unwrap_or(fallback.inactive_fg),
        }
    }

    #[inline]
    pub fn pill_color(&self, color: PillColor) -> Color {
        self.pill[color.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
        assert!(parse_hex("#é0000").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_pill_colours() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_end]='#AA0000'\ntheme[cpu_box]=\"#0000AA\"\ntheme[bogus]=\"\"\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.pill_color(PillColor::Red), Color::Rgb(0xAA, 0, 0));
        assert_eq!(theme.pill_color(PillColor::Yellow), YELLOW);
        assert_eq!(theme.pill_color(PillColor::Blue), Color::Rgb(0, 0, 0xAA));
        assert!(!map.contains_key("bogus"));
    }

    #[test]
    fn test_palettes_keep_three_distinct_colours() {
        for palette in [Palette::Normal, Palette::HighContrast, Palette::Colorblind] {
            let mut theme = Theme::default();
            theme.apply_palette(palette);
            let [a, b, c] = theme.pill;
            assert!(a != b && b != c && a != c);
        }
    }
}
