use std::fmt::Write as _;

use crate::color::{Color, Palette, PaletteEntry};

/// One coloured block of the debug bar.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySegment {
    /// Share of the bar's width, fixed when the segment is first created.
    pub width_percent: f32,
    pub background: Color,
    pub labels: Vec<String>,
}

impl OverlaySegment {
    fn new(width_percent: f32) -> Self {
        Self {
            width_percent,
            background: Color::default(),
            labels: Vec::new(),
        }
    }

    fn paint(&mut self, entry: &PaletteEntry) {
        self.background = entry.color;
        self.labels.clear();
        self.labels.push(format!("Luma:{}", entry.luminosity.floor() as i32));
        self.labels.push(format!("RGB:{}", entry.color));
        if entry.is_dominant {
            self.labels.push("dominant".to_string());
        }
    }
}

/// Full-width palette bar drawn while debug mode is on.
///
/// Segments are matched to palette entries by index and repainted in place.
/// When a later palette is shorter, the extra segments are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugOverlay {
    segments: Vec<OverlaySegment>,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[OverlaySegment] {
        &self.segments
    }

    pub fn draw(&mut self, palette: &Palette) {
        let width = 100.0 / palette.len() as f32;
        for (index, entry) in palette.iter().enumerate() {
            if index >= self.segments.len() {
                self.segments.push(OverlaySegment::new(width));
            }
            self.segments[index].paint(entry);
        }
    }

    /// Renders the bar as ANSI true-colour text, `columns` characters wide.
    /// Each segment shows its first label, clipped to its width.
    pub fn render_ansi(&self, columns: usize) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let cells = ((segment.width_percent / 100.0) * columns as f32).round() as usize;
            let cells = cells.max(1);
            let text_color = if segment.background.luminosity() > 128.0 {
                Color::new(0x33, 0x33, 0x33)
            } else {
                Color::new(0xee, 0xee, 0xee)
            };
            let label = segment.labels.first().map(String::as_str).unwrap_or("");
            let label: String = label.chars().take(cells).collect();

            let _ = write!(
                out,
                "\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{label:<cells$}",
                segment.background.r,
                segment.background.g,
                segment.background.b,
                text_color.r,
                text_color.g,
                text_color.b,
            );
        }
        if !self.segments.is_empty() {
            out.push_str("\x1b[0m");
        }
        out
    }
}
