use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::playback::BoundaryEvent;

/// Unified event type delivered by the speech capabilities to the host loop
#[derive(Clone, Debug, PartialEq)]
pub enum ReaderEvent {
    /// Interim or final recognition result.
    Transcript(String),
    /// Synthesis progress.
    Boundary(BoundaryEvent),
    /// Synthesis reached the end of the utterance.
    SpeechEnded,
    Tick,
}

/// Source of reader events (recognition results, synthesis progress)
pub trait ReaderEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError>;
}

/// Channel-backed event source; speech callbacks push through the paired sender.
pub struct ChannelEventSource {
    rx: Receiver<ReaderEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<ReaderEvent>) -> Self {
        Self { rx }
    }

    /// Create a source together with the sender handed to speech callbacks.
    pub fn channel() -> (Sender<ReaderEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl ReaderEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the host loop one event/tick at a time
pub struct Runner<E: ReaderEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ReaderEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> ReaderEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ReaderEvent::Tick
            }
        }
    }
}
