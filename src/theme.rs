//! Theme loading: btop-style `theme[key]="value"` and hex → [`Rgba`].

use crate::color::Rgba;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// UI colours plus the seed colours for the initial rows.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Seed row colours, top to bottom.
    pub rows: [Rgba; 6],
    /// List background; faded rows are mixed toward it.
    pub bg: Rgba,
    /// Borders.
    pub div_line: Rgba,
    /// Row and status text.
    pub main_fg: Rgba,
    /// Titles and the cursor outline.
    pub title: Rgba,
    /// Help text.
    pub inactive_fg: Rgba,
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
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark UI with the classic red → purple row seeds.
    pub fn onedark_default() -> Self {
        Self {
            rows: [
                Rgba::RED,
                Rgba::ORANGE,
                Rgba::YELLOW,
                Rgba::GREEN,
                Rgba::BLUE,
                Rgba::PURPLE,
            ],
            bg: Rgba::from_rgb8(0x31, 0x35, 0x3F),
            div_line: Rgba::from_rgb8(0x3F, 0x44, 0x4F),
            main_fg: Rgba::from_rgb8(0xAB, 0xB2, 0xBF),
            title: Rgba::from_rgb8(0xE5, 0xC0, 0x7B),
            inactive_fg: Rgba::from_rgb8(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Swap the row seeds for high-contrast or colorblind-friendly variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        let hex = |s: &str| parse_hex(s).unwrap_or(Rgba::WHITE);
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.rows = [
                    hex("#FF0000"),
                    hex("#FF8800"),
                    hex("#FFFF00"),
                    hex("#00FF00"),
                    hex("#0088FF"),
                    hex("#FF00FF"),
                ];
            }
            crate::Palette::Colorblind => {
                self.rows = [
                    hex("#CC3311"),
                    hex("#EE7733"),
                    hex("#BBBB00"),
                    hex("#009988"),
                    hex("#0077BB"),
                    hex("#EE3377"),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let base = Self::onedark_default();
        let [red, orange, yellow, green, blue, purple] = base.rows;
        Self {
            rows: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(red),
                get("cpu_mid").unwrap_or(orange),
                get("title").unwrap_or(yellow),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(green),
                get("cpu_box").unwrap_or(blue),
                get("net_box").unwrap_or(purple),
            ],
            bg: get("meter_bg").or_else(|| get("main_bg")).unwrap_or(base.bg),
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" (opaque).
pub fn parse_hex(s: &str) -> Result<Rgba, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let digit = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|d| u8::from_str_radix(d, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (digit(0..2)?, digit(2..4)?, digit(4..6)?),
        3 => (digit(0..1)? * 17, digit(1..2)? * 17, digit(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Rgba::from_rgb8(r, g, b))
}
