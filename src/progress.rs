//! Progress reporting.
//!
//! `ProgressMonitor` is the sink long operations report to. `InfiniteProgress`
//! wraps a monitor for work whose size is unknown up front: it announces a
//! fixed number of ticks and spends them at a geometrically slowing rate, so
//! the bar keeps moving yet never reaches the end.

use std::sync::Mutex;

use crate::cancel::CancelToken;

/// Ticks announced by `InfiniteProgress::begin_task`.
pub const TOTAL_TICKS: u64 = 1000;
/// Factor the call threshold grows by after every emitted tick.
pub const THRESHOLD_GROWTH: f64 = 1.1;
/// Calls after which no further ticks are emitted.
pub const SATURATION_CALLS: u64 = 1_000_000_000;

pub trait ProgressMonitor: Send + Sync {
    fn begin_task(&self, _name: &str, _total_work: u64) {}
    fn sub_task(&self, _name: &str) {}
    fn worked(&self, _work: u64) {}
    fn is_canceled(&self) -> bool {
        false
    }
    fn done(&self) {}
}

/// Monitor that reports nothing; optionally observes a cancel token.
#[derive(Debug, Clone, Default)]
pub struct NullProgress {
    cancel: Option<CancelToken>,
}

impl NullProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel: Some(cancel) }
    }
}

impl ProgressMonitor for NullProgress {
    fn is_canceled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_canceled)
    }
}

#[derive(Debug)]
struct TickState {
    calls: u64,
    threshold: f64,
    emitted: u64,
}

impl TickState {
    fn new() -> Self {
        Self { calls: 0, threshold: 1.0, emitted: 0 }
    }

    /// Register one call; true when it earns a tick.
    fn record(&mut self) -> bool {
        self.calls = self.calls.saturating_add(1);
        if self.calls >= SATURATION_CALLS
            || self.emitted + 1 >= TOTAL_TICKS
            || (self.calls as f64) < self.threshold
        {
            return false;
        }
        self.emitted += 1;
        self.threshold = (self.threshold * THRESHOLD_GROWTH + 1.0).min(SATURATION_CALLS as f64);
        true
    }
}

/// Simulated progress for operations of unknown size.
pub struct InfiniteProgress<'a> {
    inner: &'a dyn ProgressMonitor,
    state: Mutex<TickState>,
}

impl<'a> InfiniteProgress<'a> {
    pub fn new(inner: &'a dyn ProgressMonitor) -> Self {
        Self { inner, state: Mutex::new(TickState::new()) }
    }

    /// Ticks forwarded to the wrapped monitor so far.
    pub fn emitted(&self) -> u64 {
        self.state.lock().map(|s| s.emitted).unwrap_or(0)
    }
}

impl ProgressMonitor for InfiniteProgress<'_> {
    fn begin_task(&self, name: &str, _total_work: u64) {
        self.inner.begin_task(name, TOTAL_TICKS);
    }

    fn sub_task(&self, name: &str) {
        self.inner.sub_task(name);
    }

    /// Every call counts as one unit regardless of `work`.
    fn worked(&self, _work: u64) {
        let tick = match self.state.lock() {
            Ok(mut s) => s.record(),
            Err(_) => false,
        };
        if tick {
            self.inner.worked(1);
        }
    }

    fn is_canceled(&self) -> bool {
        self.inner.is_canceled()
    }

    fn done(&self) {
        self.inner.done();
    }
}
