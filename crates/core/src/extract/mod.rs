use color_thief::ColorFormat;

use crate::{
    color::{Color, Palette, PaletteEntry},
    frame::VideoFrame,
    HueError, Result,
};

/// Palette size requested for the sorted palette.
pub const PALETTE_SIZE: u8 = 10;

const DOMINANT_PALETTE_SIZE: u8 = 5;
const MIN_ALPHA: u8 = 125;
const MAX_QUALITY: u8 = 10;

/// Colour quantisation backend consulted on every sample.
///
/// `quality` is a pixel stride: 1 inspects every pixel, larger values skip
/// pixels for speed. Every method clamps it to `1..=10`, so 0 behaves as 1 and
/// anything above 10 behaves as 10.
pub trait PaletteExtractor {
    fn dominant_color(&mut self, frame: &VideoFrame, quality: u8) -> Result<Color>;

    fn average_color(&mut self, frame: &VideoFrame, quality: u8) -> Result<Color>;

    /// Up to `max_colors` entries ordered brightest first, with the
    /// quantiser's most significant colour flagged as dominant.
    fn sorted_palette(&mut self, frame: &VideoFrame, max_colors: u8, quality: u8)
        -> Result<Palette>;

    /// Releases any resources. Later calls fail with
    /// [`HueError::ExtractorReleased`].
    fn destroy(&mut self);
}

/// Builds a fresh extractor each time a sampler is initialised.
pub type ExtractorFactory = Box<dyn Fn() -> Box<dyn PaletteExtractor>>;

/// [`PaletteExtractor`] backed by the `color_thief` median-cut quantiser.
#[derive(Debug, Default)]
pub struct ColorThiefExtractor {
    released: bool,
}

impl ColorThiefExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            Err(HueError::ExtractorReleased)
        } else {
            Ok(())
        }
    }

    fn stride(quality: u8) -> u8 {
        quality.clamp(1, MAX_QUALITY)
    }

    fn quantize(frame: &VideoFrame, max_colors: u8, quality: u8) -> Result<Vec<Color>> {
        if frame.pixel_count() == 0 {
            return Err(HueError::InvalidFrame("frame has no pixels".to_string()));
        }

        let quality = Self::stride(quality);
        let max_colors = max_colors.max(2);
        let colors = color_thief::get_palette(&frame.data, ColorFormat::Rgba, quality, max_colors)
            .map_err(|err| HueError::Extraction(format!("{err:?}")))?;

        Ok(colors
            .into_iter()
            .map(|rgb| Color::new(rgb.r, rgb.g, rgb.b))
            .collect())
    }
}

impl PaletteExtractor for ColorThiefExtractor {
    fn dominant_color(&mut self, frame: &VideoFrame, quality: u8) -> Result<Color> {
        self.ensure_live()?;
        Self::quantize(frame, DOMINANT_PALETTE_SIZE, quality)?
            .first()
            .copied()
            .ok_or(HueError::EmptyPalette)
    }

    fn average_color(&mut self, frame: &VideoFrame, quality: u8) -> Result<Color> {
        self.ensure_live()?;

        let mut sums = [0u64; 3];
        let mut count = 0u64;
        for px in frame.pixels(Self::stride(quality) as usize) {
            if px[3] < MIN_ALPHA {
                continue;
            }
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
            count += 1;
        }

        if count == 0 {
            return Err(HueError::Extraction(
                "frame has no opaque pixels to average".to_string(),
            ));
        }

        let channel = |sum: u64| (sum as f64 / count as f64).round() as u8;
        Ok(Color::new(channel(sums[0]), channel(sums[1]), channel(sums[2])))
    }

    fn sorted_palette(
        &mut self,
        frame: &VideoFrame,
        max_colors: u8,
        quality: u8,
    ) -> Result<Palette> {
        self.ensure_live()?;
        let colors = Self::quantize(frame, max_colors, quality)?;

        let entries = colors
            .into_iter()
            .enumerate()
            .map(|(index, color)| PaletteEntry::new(color, index == 0))
            .collect();
        Ok(Palette::from_entries(entries))
    }

    fn destroy(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn quadrant_frame() -> VideoFrame {
        let (width, height) = (32u32, 32u32);
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let rgb = match (x < width / 2, y < height / 2) {
                    (true, true) => [230, 40, 40],
                    (false, true) => [40, 200, 60],
                    (true, false) => [30, 50, 210],
                    (false, false) => [240, 230, 90],
                };
                data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
        VideoFrame::new(width, height, data, Duration::ZERO, 0).unwrap()
    }

    #[test]
    fn averages_opaque_pixels() {
        let mut extractor = ColorThiefExtractor::new();
        let mut frame = VideoFrame::solid(2, 1, [100, 100, 100]);
        frame.data[4..8].copy_from_slice(&[200, 50, 0, 255]);

        let average = extractor.average_color(&frame, 1).unwrap();
        assert_eq!(average, Color::new(150, 75, 50));
    }

    #[test]
    fn average_skips_transparent_pixels() {
        let mut extractor = ColorThiefExtractor::new();
        let mut frame = VideoFrame::solid(2, 1, [10, 20, 30]);
        frame.data[4..8].copy_from_slice(&[255, 255, 255, 0]);

        assert_eq!(
            extractor.average_color(&frame, 1).unwrap(),
            Color::new(10, 20, 30)
        );
    }

    #[test]
    fn average_stride_is_capped_like_the_quantiser() {
        let mut extractor = ColorThiefExtractor::new();
        // Pixel 10 is the only bright one: stride 10 lands on it, stride 20 would not.
        let mut frame = VideoFrame::solid(30, 1, [0, 0, 0]);
        frame.data[40..44].copy_from_slice(&[250, 250, 250, 255]);

        let capped = extractor.average_color(&frame, MAX_QUALITY).unwrap();
        assert_eq!(capped, Color::new(83, 83, 83));
        assert_eq!(extractor.average_color(&frame, 20).unwrap(), capped);
        assert_eq!(
            extractor.average_color(&frame, 0).unwrap(),
            extractor.average_color(&frame, 1).unwrap()
        );
    }

    #[test]
    fn sorted_palette_is_brightest_first_with_one_dominant() {
        let mut extractor = ColorThiefExtractor::new();
        let palette = extractor
            .sorted_palette(&quadrant_frame(), PALETTE_SIZE, 1)
            .unwrap();

        assert!(!palette.is_empty());
        assert!(palette.len() <= PALETTE_SIZE as usize);
        for pair in palette.entries().windows(2) {
            assert!(pair[0].luminosity >= pair[1].luminosity);
        }
        assert_eq!(palette.iter().filter(|entry| entry.is_dominant).count(), 1);
    }

    #[test]
    fn released_extractor_refuses_work() {
        let mut extractor = ColorThiefExtractor::new();
        extractor.destroy();

        let frame = quadrant_frame();
        assert!(matches!(
            extractor.dominant_color(&frame, 10),
            Err(HueError::ExtractorReleased)
        ));
        assert!(matches!(
            extractor.average_color(&frame, 10),
            Err(HueError::ExtractorReleased)
        ));
    }
}
