//! Core library for the Hue Sampler.
//!
//! A [`Sampler`] listens to progress events from a video player, throttles
//! them to a configurable interval and, for every accepted event, extracts a
//! colour or palette from the frame on screen. Each module owns one concern:
//! frames and the host video surface, clock and throttle, the subscription
//! and its disposal channel, palette extraction, the debug overlay, and the
//! sampler that ties them together.

pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod frame;
pub mod overlay;
pub mod sampler;
pub mod subscription;
pub mod timeline;

pub use color::{Color, Palette, PaletteEntry, SampleOutput};
pub use config::{Algorithm, Callback, SamplerConfig, SamplerOptions};
pub use error::{HueError, Result};
pub use extract::{ColorThiefExtractor, PaletteExtractor, PALETTE_SIZE};
pub use frame::{FrameSource, SharedFrame, VideoFrame};
pub use overlay::{DebugOverlay, OverlaySegment};
pub use sampler::{Sampler, SamplerState};
pub use subscription::{DisposalChannel, DisposalToken, ProgressEvent, Subscription};
pub use timeline::{Clock, ManualClock, SystemClock, Throttle};
