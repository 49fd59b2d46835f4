//! Bidding deadline timer for Gavel rooms.
//!
//! A room has at most one live deadline: the instant bidding on the current
//! player closes. [`DeadlineTimer`] holds that instant plus a tag naming
//! what it was armed for, and [`DeadlineTimer::expired`] resolves once the
//! instant passes.
//!
//! # Disarmed timers
//!
//! While nothing is armed, `expired()` pends forever. That makes it safe to
//! leave in a room actor's `tokio::select!` for the actor's whole life:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle intent, then re-arm */ }
//!         expiry = timer.expired() => { /* settle expiry.tag */ }
//!     }
//! }
//! ```
//!
//! `expired()` is cancel-safe: it only mutates the timer after the sleep
//! completes, so losing a `select!` race leaves the timer armed.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// A warning is logged when an expiry is observed later than this past
    /// its deadline (a sign the owning task is starved).
    pub late_warn_threshold: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            late_warn_threshold: Duration::from_millis(250),
        }
    }
}

/// Returned by [`DeadlineTimer::expired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry<T> {
    /// The tag the timer was armed with.
    pub tag: T,
    /// The instant the timer was armed for.
    pub deadline: Instant,
    /// How long after `deadline` the expiry was observed.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A single re-armable deadline carrying a tag of type `T`.
#[derive(Debug)]
pub struct DeadlineTimer<T> {
    config: TimerConfig,
    armed: Option<(Instant, T)>,
    fired: u64,
}

impl<T> Default for DeadlineTimer<T> {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl<T> DeadlineTimer<T> {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            armed: None,
            fired: 0,
        }
    }

    /// Arms the timer to fire `after` from now, replacing any previous
    /// deadline and tag.
    pub fn arm(&mut self, after: Duration, tag: T) {
        self.arm_at(Instant::now() + after, tag);
    }

    /// Arms the timer for an absolute instant. An instant in the past fires
    /// on the next poll of [`expired`](Self::expired).
    pub fn arm_at(&mut self, deadline: Instant, tag: T) {
        let in_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64;
        trace!(in_ms, "deadline armed");
        self.armed = Some((deadline, tag));
    }

    /// Clears the deadline and returns the tag it carried.
    pub fn disarm(&mut self) -> Option<T> {
        let tag = self.armed.take().map(|(_, tag)| tag);
        if tag.is_some() {
            debug!("deadline disarmed");
        }
        tag
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed_tag(&self) -> Option<&T> {
        self.armed.as_ref().map(|(_, tag)| tag)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(at, _)| *at)
    }

    /// How many times [`expired`](Self::expired) has resolved.
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    /// Waits for the armed deadline, then disarms and returns the expiry.
    ///
    /// Pends forever while disarmed.
    pub async fn expired(&mut self) -> Expiry<T> {
        let Some(deadline) = self.deadline() else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        let Some((deadline, tag)) = self.armed.take() else {
            return std::future::pending().await;
        };
        let late_by = Instant::now().saturating_duration_since(deadline);
        self.fired += 1;

        if late_by > self.config.late_warn_threshold {
            warn!(
                late_ms = late_by.as_millis() as u64,
                threshold_ms = self.config.late_warn_threshold.as_millis() as u64,
                "deadline observed late"
            );
        } else {
            trace!(late_ms = late_by.as_millis() as u64, "deadline fired");
        }

        Expiry {
            tag,
            deadline,
            late_by,
        }
    }
}
