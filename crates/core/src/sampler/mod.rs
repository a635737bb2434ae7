use std::{fmt, time::Duration};

use crate::{
    color::SampleOutput,
    config::{Algorithm, Callback, SamplerConfig, SamplerOptions, DEFAULT_SAMPLE_INTERVAL_MS},
    extract::{ColorThiefExtractor, ExtractorFactory, PaletteExtractor, PALETTE_SIZE},
    frame::FrameSource,
    overlay::DebugOverlay,
    subscription::{Admission, DisposalChannel, ProgressEvent, Subscription},
    timeline::{Clock, SystemClock},
    HueError, Result,
};

/// Lifecycle position of a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Uninitialized,
    Active,
    Paused,
}

/// Samples the host video's current frame on throttled progress events and
/// hands the extracted colour to a callback.
///
/// Lifecycle: [`initialize`](Self::initialize) once, then
/// [`pause`](Self::pause) and [`resume`](Self::resume) as needed, and
/// [`destroy`](Self::destroy) to tear everything down. Misuse, such as
/// pausing before initialising, is a silent no-op.
///
/// The host forwards player events through [`dispatch`](Self::dispatch).
/// At most one subscription is live; every resubscription signals the
/// disposal channel before registering the new listener.
pub struct Sampler {
    video: Box<dyn FrameSource>,
    clock: Box<dyn Clock>,
    extractor_factory: ExtractorFactory,
    disposal: DisposalChannel,
    initialized: bool,
    active: bool,
    config: SamplerConfig,
    callback: Option<Callback>,
    extractor: Option<Box<dyn PaletteExtractor>>,
    overlay: Option<DebugOverlay>,
    subscription: Option<Subscription>,
}

impl Sampler {
    /// Creates an uninitialised sampler reading frames from `video`, using
    /// the system clock and the `color_thief` extractor.
    pub fn new(video: impl FrameSource + 'static) -> Self {
        Self {
            video: Box::new(video),
            clock: Box::new(SystemClock::start()),
            extractor_factory: Box::new(|| Box::new(ColorThiefExtractor::new())),
            disposal: DisposalChannel::new(),
            initialized: false,
            active: false,
            config: SamplerConfig::default(),
            callback: None,
            extractor: None,
            overlay: None,
            subscription: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_extractor_factory(
        mut self,
        factory: impl Fn() -> Box<dyn PaletteExtractor> + 'static,
    ) -> Self {
        self.extractor_factory = Box::new(factory);
        self
    }

    /// Applies `options`, allocates the extractor and starts listening.
    /// Calling this again while initialised is a no-op and keeps the
    /// configuration from the first call.
    pub fn initialize(&mut self, options: SamplerOptions) {
        if self.initialized {
            tracing::debug!("sampler already initialised, ignoring options");
            return;
        }
        self.initialized = true;
        self.active = true;

        self.config = options.config.normalized();
        self.callback = options.callback;
        self.extractor = Some((self.extractor_factory)());

        tracing::debug!(
            algorithm = %self.config.algorithm,
            interval_ms = self.config.sample_interval_ms,
            quality = self.config.quality,
            player = %self.config.player,
            event = %self.config.event,
            "sampler initialised"
        );
        self.subscribe();
    }

    /// Cancels the subscription and releases the extractor and overlay. The
    /// sampler returns to its uninitialised state and may be initialised
    /// again. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.disposal.signal();
        self.subscription = None;

        if let Some(mut extractor) = self.extractor.take() {
            extractor.destroy();
        }
        self.overlay = None;

        if self.initialized {
            tracing::debug!("sampler destroyed");
        }
        self.initialized = false;
        self.active = false;
        self.config = SamplerConfig::default();
        self.callback = None;
    }

    pub fn pause(&mut self) {
        if !self.initialized {
            return;
        }
        self.active = false;
        self.disposal.signal();
        tracing::debug!("sampling paused");
    }

    pub fn resume(&mut self) {
        if !self.initialized {
            return;
        }
        self.active = true;
        self.subscribe();
    }

    /// Enables or disables the palette overlay. Restarts the subscription.
    pub fn set_debug(&mut self, debug: bool) {
        if !self.initialized {
            return;
        }
        self.config.debug = debug;
        self.subscribe();
    }

    /// Changes the throttle interval. Restarts the subscription, so the next
    /// sample is at least one full interval away.
    ///
    /// The interval is rounded up to whole milliseconds. A zero interval falls
    /// back to the default, as it does in [`initialize`](Self::initialize).
    pub fn set_sample_interval(&mut self, interval: Duration) {
        if !self.initialized {
            return;
        }
        self.config.sample_interval_ms = match ceil_millis(interval) {
            0 => DEFAULT_SAMPLE_INTERVAL_MS,
            millis => millis,
        };
        self.subscribe();
    }

    /// Changes the algorithm. Unknown names select the complete palette.
    /// Restarts the subscription.
    pub fn set_algorithm(&mut self, algorithm: impl Into<Algorithm>) {
        if !self.initialized {
            return;
        }
        self.config.algorithm = algorithm.into();
        self.subscribe();
    }

    /// Replaces the result callback; `None` installs a no-op. Restarts the
    /// subscription.
    pub fn set_callback(&mut self, callback: Option<Callback>) {
        if !self.initialized {
            return;
        }
        self.callback = callback;
        self.subscribe();
    }

    pub fn state(&self) -> SamplerState {
        match (self.initialized, self.active) {
            (false, _) => SamplerState::Uninitialized,
            (true, true) => SamplerState::Active,
            (true, false) => SamplerState::Paused,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn sample_interval(&self) -> Duration {
        self.config.sample_interval()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Whether a listener is registered and not yet cancelled or failed.
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|sub| !self.disposal.is_disposed(sub.token()))
    }

    pub fn overlay(&self) -> Option<&DebugOverlay> {
        self.overlay.as_ref()
    }

    /// Feeds one player event through the live subscription. Returns `true`
    /// when the event was accepted and a sample was delivered.
    ///
    /// A failing sample is logged and ends the subscription; call
    /// [`resume`](Self::resume) or any setter to listen again.
    pub fn dispatch(&mut self, event: &ProgressEvent) -> bool {
        let now = self.clock.now();
        let Some(subscription) = self.subscription.as_mut() else {
            tracing::trace!(event = %event.name, "no subscription, event dropped");
            return false;
        };

        match subscription.admit(&self.disposal, event, now) {
            Admission::Accept => {}
            Admission::Disposed => {
                self.subscription = None;
                return false;
            }
            Admission::Ignore => return false,
            Admission::Throttled => {
                tracing::trace!(?now, "event throttled");
                return false;
            }
        }

        match self.sample() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "sampling failed, subscription ended");
                self.subscription = None;
                false
            }
        }
    }

    fn subscribe(&mut self) {
        if !self.active {
            return;
        }

        self.disposal.signal();
        let now = self.clock.now();
        self.subscription = Some(Subscription::new(
            self.disposal.token(),
            self.config.player.clone(),
            self.config.event.clone(),
            self.config.sample_interval(),
            now,
        ));
        tracing::debug!(
            player = %self.config.player,
            event = %self.config.event,
            interval_ms = self.config.sample_interval_ms,
            "subscribed to progress events"
        );
    }

    fn sample(&mut self) -> Result<()> {
        let extractor = self
            .extractor
            .as_mut()
            .ok_or(HueError::ExtractorReleased)?;
        let quality = self.config.quality;

        if self.config.debug {
            let frame = self.video.current_frame()?;
            let palette = extractor.sorted_palette(&frame, PALETTE_SIZE, quality)?;
            self.overlay
                .get_or_insert_with(DebugOverlay::new)
                .draw(&palette);
        }

        let frame = self.video.current_frame()?;
        let output = match self.config.algorithm {
            Algorithm::Brightest => {
                let palette = extractor.sorted_palette(&frame, PALETTE_SIZE, quality)?;
                let brightest = palette.brightest().ok_or(HueError::EmptyPalette)?;
                SampleOutput::Color(brightest.color)
            }
            Algorithm::Average => SampleOutput::Color(extractor.average_color(&frame, quality)?),
            Algorithm::Dominant => SampleOutput::Color(extractor.dominant_color(&frame, quality)?),
            Algorithm::CompletePalette => {
                let palette = extractor.sorted_palette(&frame, PALETTE_SIZE, quality)?;
                SampleOutput::Palette(palette.colors())
            }
        };

        if let Some(callback) = self.callback.as_mut() {
            callback(&output);
        }
        Ok(())
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("callback", &self.callback.is_some())
            .field("subscribed", &self.is_subscribed())
            .field("overlay_segments", &self.overlay.as_ref().map(|o| o.segments().len()))
            .finish()
    }
}

fn ceil_millis(duration: Duration) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if duration.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis.saturating_add(1)
    }
}
