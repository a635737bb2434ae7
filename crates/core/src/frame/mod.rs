use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use image::DynamicImage;

use crate::{HueError, Result};

/// A decoded video frame in RGBA layout.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl VideoFrame {
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp: Duration,
        frame_number: u64,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(HueError::InvalidFrame(format!(
                "expected {expected} RGBA bytes for {width}x{height}, got {}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
            timestamp,
            frame_number,
        })
    }

    /// Frame filled with a single opaque colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixel = [rgb[0], rgb[1], rgb[2], 255];
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();

        Self {
            width,
            height,
            data,
            timestamp: Duration::ZERO,
            frame_number: 0,
        }
    }

    pub fn from_image(image: &DynamicImage, timestamp: Duration, frame_number: u64) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
            timestamp,
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Iterates over every `step`-th pixel as `[r, g, b, a]`.
    pub fn pixels(&self, step: usize) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(4).step_by(step.max(1))
    }
}

/// The host video surface the sampler reads frames from.
pub trait FrameSource {
    /// Returns the frame currently on screen.
    fn current_frame(&self) -> Result<VideoFrame>;
}

/// Thread-safe slot a host publishes decoded frames into while the sampler
/// keeps a reading handle.
#[derive(Clone, Default)]
pub struct SharedFrame {
    slot: Arc<Mutex<Option<VideoFrame>>>,
}

impl SharedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: VideoFrame) -> Result<()> {
        let mut slot = self.lock()?;
        *slot = Some(frame);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut slot = self.lock()?;
        *slot = None;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<VideoFrame>>> {
        self.slot
            .lock()
            .map_err(|_| HueError::FrameUnavailable("frame slot has been poisoned"))
    }
}

impl FrameSource for SharedFrame {
    fn current_frame(&self) -> Result<VideoFrame> {
        let slot = self.lock()?;
        slot.as_ref()
            .cloned()
            .ok_or(HueError::FrameUnavailable("no frame has been published"))
    }
}

impl std::fmt::Debug for SharedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFrame").finish()
    }
}
