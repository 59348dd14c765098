use std::fmt;
use std::str::FromStr;

use image::Rgba;
use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("expected 3 or 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_pixel(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 0xff])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(value.to_string()));
        }
        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16).map_err(|_| ColorParseError::BadDigit(value.to_string()))
        };
        match digits.len() {
            6 => Ok(Color::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let r = channel(&digits[0..1])?;
                let g = channel(&digits[1..2])?;
                let b = channel(&digits[2..3])?;
                Ok(Color::rgb(r * 17, g * 17, b * 17))
            }
            _ => Err(ColorParseError::BadLength(value.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub struct NamedColor {
    pub hex: &'static str,
    pub name: &'static str,
}

pub const PALETTE: [NamedColor; 12] = [
    NamedColor { hex: "#FF6B6B", name: "Strawberry Red" },
    NamedColor { hex: "#F8C8DC", name: "Unicorn Pink" },
    NamedColor { hex: "#FDFD96", name: "Lemon Yellow" },
    NamedColor { hex: "#C1E1C1", name: "Dragon Green" },
    NamedColor { hex: "#A7C7E7", name: "Sky Blue" },
    NamedColor { hex: "#C3B1E1", name: "Magic Purple" },
    NamedColor { hex: "#FA8072", name: "Coral Orange" },
    NamedColor { hex: "#77DD77", name: "Frog Green" },
    NamedColor { hex: "#FFB347", name: "Tiger Orange" },
    NamedColor { hex: "#B39EB5", name: "Fairy Lavender" },
    NamedColor { hex: "#836953", name: "Bear Brown" },
    NamedColor { hex: "#000000", name: "Night Black" },
];

pub const DEFAULT_COLOR: Color = Color::rgb(0xff, 0x6b, 0x6b);

/// Parses a user-supplied color, falling back to the default brush color.
pub fn sanitize_color(value: &str) -> Color {
    match value.parse() {
        Ok(color) => color,
        Err(error) => {
            log::warn!("ignoring brush color: {error}");
            DEFAULT_COLOR
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter)]
pub enum BrushWidth {
    Fine,
    #[default]
    Medium,
    Thick,
    Chunky,
}

impl BrushWidth {
    pub fn px(self) -> u32 {
        match self {
            BrushWidth::Fine => 8,
            BrushWidth::Medium => 12,
            BrushWidth::Thick => 20,
            BrushWidth::Chunky => 30,
        }
    }

    pub fn from_px(px: u32) -> Option<Self> {
        BrushWidth::iter().find(|width| width.px() == px)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushConfig {
    pub color: Color,
    pub width: BrushWidth,
    pub particle_mode: bool,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR,
            width: BrushWidth::default(),
            particle_mode: false,
        }
    }
}
