//! Colored event and address markers

use crate::constants::DEFAULT_ANNOTATION_COLOR;
use tracing::warn;

/// A packed `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const DEFAULT: Rgb = Rgb(DEFAULT_ANNOTATION_COLOR);

    /// Parse `#RRGGBB`.
    pub fn parse(text: &str) -> Option<Rgb> {
        let digits = text.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Rgb)
    }

    /// Parse `#RRGGBB`, falling back to the default gray.
    pub fn parse_or_default(text: &str) -> Rgb {
        Rgb::parse(text).unwrap_or_else(|| {
            warn!("invalid color {:?}, using default", text);
            Rgb::DEFAULT
        })
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Channels scaled to `[0, 1]`.
    pub fn to_floats(self) -> [f32; 3] {
        [
            self.red() as f32 / 255.0,
            self.green() as f32 / 255.0,
            self.blue() as f32 / 255.0,
        ]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::DEFAULT
    }
}

/// A labelled marker attached to a tick or an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub color: Rgb,
    pub label: String,
}
