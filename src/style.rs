// Visual style: colours, type sizes and page geometry.
//
// A `ReportStyle` is built once (from a preset or a config file) and handed to the
// assembler by reference. Nothing here is mutable after construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

// ============================================================================
// Colour
// ============================================================================

/// An sRGB colour, written as `"#rrggbb"` in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to `0.0..=1.0` for PDF colour operators.
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl FromStr for Rgb {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ReportError::ConfigError(format!("invalid colour '{}'", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ReportError::ConfigError(format!("invalid colour '{}'", s)))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const fn hex(rgb: u32) -> Rgb {
    Rgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

// ============================================================================
// Palette
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
    pub label: Rgb,
    pub muted: Rgb,
    pub border: Rgb,
    pub light_border: Rgb,
    pub card_background: Rgb,
    pub note_background: Rgb,
    /// Full-bleed page tint drawn before any content. `None` leaves the page white.
    pub page_background: Option<Rgb>,
    pub success: Rgb,
    pub warning: Rgb,
    pub danger: Rgb,
    pub info: Rgb,
    pub star: Rgb,
    pub star_outline: Rgb,
    pub star_empty: Rgb,
    pub star_empty_outline: Rgb,
}

impl Palette {
    /// Navy on white with square outlined boxes.
    pub fn classic() -> Self {
        Self {
            primary: hex(0x1e3a8a),
            accent: hex(0x1e3a8a),
            text: hex(0x000000),
            label: hex(0x4b5563),
            muted: hex(0x6b7280),
            border: hex(0x9ca3af),
            light_border: hex(0xe5e7eb),
            card_background: hex(0xffffff),
            note_background: hex(0xf5f5f5),
            page_background: None,
            success: hex(0x00c853),
            warning: hex(0xff6f00),
            danger: hex(0xd32f2f),
            info: hex(0x00a8e8),
            star: hex(0xf59e0b),
            star_outline: hex(0xd97706),
            star_empty: hex(0xf3f4f6),
            star_empty_outline: hex(0xd1d5db),
        }
    }

    /// White cards on a light blue page with a bright accent bar.
    pub fn vibrant() -> Self {
        Self {
            primary: hex(0x004a99),
            accent: hex(0x3b82f6),
            text: hex(0x263238),
            label: hex(0x4a4a4a),
            muted: hex(0x666666),
            border: hex(0xe0e0e0),
            light_border: hex(0xe0e0e0),
            card_background: hex(0xffffff),
            note_background: hex(0xf7f9fc),
            page_background: Some(hex(0xe8f4f8)),
            success: hex(0x22c55e),
            warning: hex(0xff6f00),
            danger: hex(0xef4444),
            info: hex(0x00a8e8),
            star: hex(0xfbbf24),
            star_outline: hex(0xf59e0b),
            star_empty: hex(0xf3f4f6),
            star_empty_outline: hex(0xd1d5db),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::classic()
    }
}

// ============================================================================
// Type scale
// ============================================================================

/// Font sizes in points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeScale {
    pub brand: f32,
    pub title: f32,
    pub section: f32,
    pub value: f32,
    pub body: f32,
    pub label: f32,
    pub small: f32,
    pub tiny: f32,
    /// Line height as a multiple of the font size.
    pub leading: f32,
}

impl Default for TypeScale {
    fn default() -> Self {
        Self {
            brand: 18.0,
            title: 15.0,
            section: 12.0,
            value: 10.0,
            body: 9.0,
            label: 9.0,
            small: 8.0,
            tiny: 7.0,
            leading: 1.35,
        }
    }
}

impl TypeScale {
    pub fn line_height(&self, size: f32) -> f32 {
        size * self.leading
    }
}

// ============================================================================
// Page geometry
// ============================================================================

/// Page size and bands in points, measured from the top-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Height of the rich header band on page one.
    pub first_header_height: f32,
    /// Height of the compact header band on every later page.
    pub header_height: f32,
    /// Space between a header band and the first line of content.
    pub header_gap: f32,
    /// Height of the footer band at the bottom of every page.
    pub footer_height: f32,
    /// Space kept clear between the last content line and the footer band.
    pub footer_gap: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4
        Self {
            width: 595.28,
            height: 841.89,
            margin_left: 50.0,
            margin_right: 50.0,
            first_header_height: 85.0,
            header_height: 60.0,
            header_gap: 25.0,
            footer_height: 72.0,
            footer_gap: 12.0,
        }
    }
}

impl PageGeometry {
    pub fn content_left(&self) -> f32 {
        self.margin_left
    }

    pub fn content_right(&self) -> f32 {
        self.width - self.margin_right
    }

    pub fn content_width(&self) -> f32 {
        self.content_right() - self.content_left()
    }

    /// First y available for content below the header band.
    pub fn content_top(&self, first_page: bool) -> f32 {
        let band = if first_page {
            self.first_header_height
        } else {
            self.header_height
        };
        band + self.header_gap
    }

    pub fn footer_top(&self) -> f32 {
        self.height - self.footer_height
    }

    /// Lowest y any content block may reach.
    pub fn content_bottom(&self) -> f32 {
        self.footer_top() - self.footer_gap
    }

    /// Height available to a block that starts at the top of a continuation page.
    pub fn usable_height(&self) -> f32 {
        self.content_bottom() - self.content_top(false)
    }

    pub(crate) fn validate(&self) -> Result<(), ReportError> {
        if self.content_width() <= 0.0 {
            return Err(ReportError::ConfigError(
                "page margins leave no content width".to_string(),
            ));
        }
        if self.usable_height() <= 0.0 || self.content_bottom() <= self.content_top(true) {
            return Err(ReportError::ConfigError(
                "header and footer bands leave no content height".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Style
// ============================================================================

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    pub palette: Palette,
    pub type_scale: TypeScale,
    pub geometry: PageGeometry,
}

impl ReportStyle {
    /// Look up a named preset (`classic` or `vibrant`).
    pub fn preset(name: &str) -> Result<Self, ReportError> {
        let palette = match name.to_ascii_lowercase().as_str() {
            "classic" => Palette::classic(),
            "vibrant" => Palette::vibrant(),
            other => {
                return Err(ReportError::ConfigError(format!(
                    "unknown style preset '{}'",
                    other
                )))
            }
        };
        Ok(Self {
            palette,
            ..Self::default()
        })
    }
}
