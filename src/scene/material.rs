//! Materials and colors
//!
//! A material advertises what it can do through optional channels:
//! a base color and an emissive color. Code that recolors materials
//! checks the channel instead of the material's origin.

use serde::{Deserialize, Serialize};

/// RGB color with linear 0..1 components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a packed 0xRRGGBB value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Pack to 0xRRGGBB, rounding each channel
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional)
    pub fn parse_css_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            3 => {
                let v = u32::from_str_radix(digits, 16).ok()?;
                let (r, g, b) = ((v >> 8) & 0xf, (v >> 4) & 0xf, v & 0xf);
                Some(Self::from_hex((r * 0x11) << 16 | (g * 0x11) << 8 | b * 0x11))
            }
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_hex),
            _ => None,
        }
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }

    pub fn modulate(self, other: Color) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    pub fn add(self, other: Color) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

/// Surface description for one drawable
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Base color channel; None means the material cannot be tinted
    pub base_color: Option<Color>,
    /// Self-illumination channel
    pub emissive: Option<Color>,
    pub opacity: f32,
    pub double_sided: bool,
}

impl Material {
    /// Lit material with both color and emissive channels
    pub fn standard(base_color: Color) -> Self {
        Self {
            name: None,
            base_color: Some(base_color),
            emissive: Some(Color::BLACK),
            opacity: 1.0,
            double_sided: false,
        }
    }

    /// Unlit material: color only
    pub fn basic(base_color: Color) -> Self {
        Self {
            emissive: None,
            ..Self::standard(base_color)
        }
    }

    /// Material with no color model (e.g. depth or normal visualisation)
    pub fn colorless() -> Self {
        Self {
            base_color: None,
            emissive: None,
            ..Self::standard(Color::WHITE)
        }
    }

    pub fn has_base_color(&self) -> bool {
        self.base_color.is_some()
    }

    pub fn has_emissive(&self) -> bool {
        self.emissive.is_some()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard(Color::WHITE)
    }
}

/// A drawable carries either one material or one per geometry group
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSlot {
    Single(Material),
    Multi(Vec<Material>),
}

impl MaterialSlot {
    /// Material used when only one can be shown
    pub fn primary(&self) -> Option<&Material> {
        match self {
            MaterialSlot::Single(m) => Some(m),
            MaterialSlot::Multi(list) => list.first(),
        }
    }

    /// Whether picking should accept hits on back faces
    pub fn double_sided(&self) -> bool {
        match self {
            MaterialSlot::Single(m) => m.double_sided,
            MaterialSlot::Multi(list) => list.iter().any(|m| m.double_sided),
        }
    }

    /// Apply `f` to every material, producing a new slot of the same shape
    pub fn map(&self, f: impl Fn(&Material) -> Material) -> MaterialSlot {
        match self {
            MaterialSlot::Single(m) => MaterialSlot::Single(f(m)),
            MaterialSlot::Multi(list) => MaterialSlot::Multi(list.iter().map(f).collect()),
        }
    }
}

impl From<Material> for MaterialSlot {
    fn from(m: Material) -> Self {
        MaterialSlot::Single(m)
    }
}
