use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGB triple with 8-bit channels.
///
/// Serialises as a bare `[r, g, b]` array so that callback output reads the
/// same as the triples handed around by browser colour utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Rec. 601 luma in the 0-255 range.
    pub fn luminosity(self) -> f32 {
        let weighted = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        weighted as f32 / 1000.0
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(value: Color) -> Self {
        value.to_array()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// One quantised colour with the metadata used for sorting and display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub color: Color,
    pub luminosity: f32,
    pub is_dominant: bool,
}

impl PaletteEntry {
    pub fn new(color: Color, is_dominant: bool) -> Self {
        Self {
            color,
            luminosity: color.luminosity(),
            is_dominant,
        }
    }
}

/// Palette entries ordered brightest first. Index 0 is always the entry with
/// the highest luminosity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Builds a palette from unordered entries, sorting them brightest first.
    /// Ties keep their original relative order.
    pub fn from_entries(mut entries: Vec<PaletteEntry>) -> Self {
        entries.sort_by(|a, b| b.luminosity.total_cmp(&a.luminosity));
        Self { entries }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn brightest(&self) -> Option<&PaletteEntry> {
        self.entries.first()
    }

    /// Colours only, dropping luminosity and dominance metadata.
    pub fn colors(&self) -> Vec<Color> {
        self.entries.iter().map(|entry| entry.color).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaletteEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a PaletteEntry;
    type IntoIter = std::slice::Iter<'a, PaletteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Value delivered to the sampler callback. Single-colour algorithms produce
/// [`SampleOutput::Color`]; the complete palette produces
/// [`SampleOutput::Palette`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleOutput {
    Color(Color),
    Palette(Vec<Color>),
}

impl SampleOutput {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            SampleOutput::Color(color) => Some(*color),
            SampleOutput::Palette(_) => None,
        }
    }

    pub fn as_palette(&self) -> Option<&[Color]> {
        match self {
            SampleOutput::Color(_) => None,
            SampleOutput::Palette(colors) => Some(colors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminosity_orders_primaries() {
        let white = Color::new(255, 255, 255);
        let green = Color::new(0, 255, 0);
        let blue = Color::new(0, 0, 255);

        assert!((white.luminosity() - 255.0).abs() < 0.01);
        assert!(green.luminosity() > blue.luminosity());
    }

    #[test]
    fn palette_sorts_brightest_first() {
        let palette = Palette::from_entries(vec![
            PaletteEntry::new(Color::new(10, 10, 10), true),
            PaletteEntry::new(Color::new(250, 250, 250), false),
            PaletteEntry::new(Color::new(120, 120, 120), false),
        ]);

        assert_eq!(palette.brightest().unwrap().color, Color::new(250, 250, 250));
        assert_eq!(
            palette.colors(),
            vec![
                Color::new(250, 250, 250),
                Color::new(120, 120, 120),
                Color::new(10, 10, 10),
            ]
        );
        assert!(palette.entries()[2].is_dominant);
    }

    #[test]
    fn sample_output_serialises_as_plain_triples() {
        let single = SampleOutput::Color(Color::new(1, 2, 3));
        assert_eq!(serde_json::to_string(&single).unwrap(), "[1,2,3]");

        let many = SampleOutput::Palette(vec![Color::new(1, 2, 3), Color::new(4, 5, 6)]);
        assert_eq!(serde_json::to_string(&many).unwrap(), "[[1,2,3],[4,5,6]]");
    }
}
