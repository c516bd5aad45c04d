use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

/// Palette offered by the color field, in cycling order.
pub const PRESETS: [(&str, Rgb); 9] = [
    ("white", WHITE),
    ("red", Rgb::new(0xFF, 0x00, 0x00)),
    ("orange", Rgb::new(0xFF, 0xA5, 0x00)),
    ("yellow", Rgb::new(0xFF, 0xFF, 0x00)),
    ("green", Rgb::new(0x00, 0xFF, 0x00)),
    ("cyan", Rgb::new(0x00, 0xFF, 0xFF)),
    ("blue", Rgb::new(0x00, 0x00, 0xFF)),
    ("magenta", Rgb::new(0xFF, 0x00, 0xFF)),
    ("black", Rgb::new(0x00, 0x00, 0x00)),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("expected #RRGGBB, #RGB or a color name, got {0:?}")]
    Format(String),
    #[error("invalid hex digit in {0:?}")]
    Hex(String),
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Preset name if this color is one of [`PRESETS`].
    pub fn name(&self) -> Option<&'static str> {
        PRESETS.iter().find(|(_, c)| c == self).map(|(n, _)| *n)
    }

    pub fn next_preset(&self) -> Rgb {
        let idx = self.preset_index();
        PRESETS[(idx + 1) % PRESETS.len()].1
    }

    pub fn prev_preset(&self) -> Rgb {
        let idx = self.preset_index();
        PRESETS[(idx + PRESETS.len() - 1) % PRESETS.len()].1
    }

    // Custom colors cycle from whichever preset is closest.
    fn preset_index(&self) -> usize {
        PRESETS
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, c))| self.distance(c))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn distance(&self, other: &Rgb) -> u32 {
        let d = |a: u8, b: u8| (a as i32 - b as i32).unsigned_abs();
        let (dr, dg, db) = (d(self.r, other.r), d(self.g, other.g), d(self.b, other.b));
        dr * dr + dg * dg + db * db
    }
}

impl Default for Rgb {
    fn default() -> Self {
        WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((_, c)) = PRESETS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*c);
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.is_ascii() {
            return Err(ColorParseError::Format(s.to_string()));
        }
        let channel = |digits: &str| {
            u8::from_str_radix(digits, 16).map_err(|_| ColorParseError::Hex(s.to_string()))
        };
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc is shorthand for #aabbcc
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 0x11);
                Ok(Rgb::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(ColorParseError::Format(s.to_string())),
        }
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}
