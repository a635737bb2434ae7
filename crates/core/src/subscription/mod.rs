//! Event subscription plumbing: the disposal channel that cancels stale
//! subscriptions and the throttled listener that decides which progress
//! events reach the sampling step.

use std::time::Duration;

use crate::timeline::Throttle;

/// Progress notification emitted by a player during playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub target: String,
    pub name: String,
}

impl ProgressEvent {
    pub fn new(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
        }
    }

    /// A `timeupdate` event from the given target.
    pub fn time_update(target: impl Into<String>) -> Self {
        Self::new(target, crate::config::DEFAULT_EVENT)
    }
}

/// Generation stamp handed to a subscription when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposalToken(u64);

/// Broadcast cancellation. Each signal invalidates every token issued before
/// it, including tokens held by subscriptions that have not seen an event yet.
#[derive(Debug, Default)]
pub struct DisposalChannel {
    generation: u64,
}

impl DisposalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn token(&self) -> DisposalToken {
        DisposalToken(self.generation)
    }

    pub fn is_disposed(&self, token: DisposalToken) -> bool {
        token.0 != self.generation
    }
}

/// What a subscription decided about one incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The event passed every filter; run the sampling step.
    Accept,
    /// Wrong target or event name.
    Ignore,
    /// Arrived inside the current throttle window.
    Throttled,
    /// The subscription was cancelled and must be dropped.
    Disposed,
}

/// Listener for one `(target, event)` pair, throttled to one acceptance per
/// interval and bound to the disposal generation it was created in.
#[derive(Debug, Clone)]
pub struct Subscription {
    token: DisposalToken,
    target: String,
    event: String,
    throttle: Throttle,
}

impl Subscription {
    pub fn new(
        token: DisposalToken,
        target: impl Into<String>,
        event: impl Into<String>,
        interval: Duration,
        now: Duration,
    ) -> Self {
        Self {
            token,
            target: target.into(),
            event: event.into(),
            throttle: Throttle::new(interval, now),
        }
    }

    pub fn token(&self) -> DisposalToken {
        self.token
    }

    pub fn interval(&self) -> Duration {
        self.throttle.interval()
    }

    pub fn admit(
        &mut self,
        channel: &DisposalChannel,
        event: &ProgressEvent,
        now: Duration,
    ) -> Admission {
        if channel.is_disposed(self.token) {
            return Admission::Disposed;
        }
        if event.target != self.target || event.name != self.event {
            return Admission::Ignore;
        }
        if self.throttle.try_accept(now) {
            Admission::Accept
        } else {
            Admission::Throttled
        }
    }
}
