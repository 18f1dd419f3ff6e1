//! Cooperative pause, cancellation and progress reporting.
//!
//! Every long-running operation takes a [`ControlToken`]. The caller keeps a
//! clone and flips it from another thread; workers poll it at chunk
//! boundaries via [`ControlToken::checkpoint`]. Tokens are created per call,
//! so concurrent operations never share control state unless the caller
//! passes the same token to both.

use crate::error::{Error, Result};
use crossbeam_channel::Receiver;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

struct ControlState {
    paused: AtomicBool,
    cancelled: AtomicBool,
    gate: Mutex<()>,
    unpaused: Condvar,
    observers: Mutex<Vec<ProgressFn>>,
}

/// Shared handle for pausing, cancelling and observing one operation.
///
/// Clones share state. Progress reported through a token is a 0-100
/// percentage; [`ControlToken::slice`] derives handles whose reports are
/// mapped into a sub-range, which is how multi-file operations produce a
/// single overall percentage.
#[derive(Clone)]
pub struct ControlToken {
    state: Arc<ControlState>,
    base: u8,
    span: u8,
}

impl ControlToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ControlState {
                paused: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                gate: Mutex::new(()),
                unpaused: Condvar::new(),
                observers: Mutex::new(Vec::new()),
            }),
            base: 0,
            span: 100,
        }
    }

    fn lock_gate(&self) -> MutexGuard<'_, ()> {
        self.state.gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Asks workers to hold at their next checkpoint.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::Release);
        log::debug!("operation paused");
    }

    /// Releases paused workers.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::Release);
        let _guard = self.lock_gate();
        self.state.unpaused.notify_all();
        log::debug!("operation resumed");
    }

    /// Requests termination. The flag is sticky; paused workers are woken
    /// so they can observe it.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        let _guard = self.lock_gate();
        self.state.unpaused.notify_all();
        log::debug!("operation cancelled");
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Blocks while the token is paused. Returns immediately once cancelled
    /// so a paused operation can still terminate.
    pub fn wait_if_paused(&self) {
        if !self.state.paused.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.lock_gate();
        while self.state.paused.load(Ordering::Acquire)
            && !self.state.cancelled.load(Ordering::Acquire)
        {
            guard = self
                .state
                .unpaused
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Chunk-boundary poll: honors a pause, then surfaces cancellation.
    pub fn checkpoint(&self) -> Result<()> {
        self.wait_if_paused();
        self.check_cancelled()
    }

    /// Registers a progress observer. Observers receive overall percentages
    /// and outlive the operations reported through this token.
    pub fn on_progress<F>(&self, callback: F)
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let mut observers = self
            .state
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        observers.push(Box::new(callback));
    }

    /// Channel-flavored observer registration. Send failures are ignored:
    /// a dropped receiver just means nobody is listening any more.
    pub fn progress_channel(&self) -> Receiver<u8> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.on_progress(move |percent| {
            let _ = sender.send(percent);
        });
        receiver
    }

    /// Reports progress of the work this handle covers, as 0-100. The value
    /// is mapped into this handle's band before observers see it.
    pub fn report_progress(&self, percent: u8) {
        let clamped = percent.min(100) as u32;
        let overall = self.base as u32 + clamped * self.span as u32 / 100;
        let observers = self
            .state
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for callback in observers.iter() {
            callback(overall as u8);
        }
    }

    /// Derives a token for item `index` of `count`: same pause/cancel state,
    /// progress mapped into the matching sub-band so per-item 0-100 reports
    /// compose into one overall percentage.
    pub fn slice(&self, index: usize, count: usize) -> ControlToken {
        if count == 0 {
            return self.clone();
        }
        let span = self.span as usize;
        let start = index.min(count) * span / count;
        let end = (index + 1).min(count) * span / count;
        ControlToken {
            state: Arc::clone(&self.state),
            base: self.base + start as u8,
            span: (end - start) as u8,
        }
    }
}

impl Default for ControlToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlToken")
            .field("paused", &self.is_paused())
            .field("cancelled", &self.is_cancelled())
            .field("base", &self.base)
            .field("span", &self.span)
            .finish()
    }
}

/// Emits a progress report only when the integer percentage changes.
pub(crate) struct ProgressTicker {
    total: u64,
    last: Option<u8>,
}

impl ProgressTicker {
    pub(crate) fn new(total: u64) -> Self {
        Self { total, last: None }
    }

    pub(crate) fn tick(&mut self, done: u64, ctrl: &ControlToken) {
        if self.total == 0 {
            return;
        }
        let percent = (done.min(self.total) * 100 / self.total) as u8;
        if self.last != Some(percent) {
            self.last = Some(percent);
            ctrl.report_progress(percent);
        }
    }
}
