//! One-shot completion latch for asynchronous receives.
//!
//! The engine hands an `Arc<Completion>` back exactly one outcome, either a
//! populated message handle or a raw failure status. Completion and
//! cancellation both funnel through [`Completion::complete`], so a late
//! second dispatch is a no-op.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::engine::MsgHandle;
use crate::error::ErrorCode;

/// Outcome of an asynchronous engine operation: a populated message handle,
/// or the raw status the operation failed with.
pub type RawOutcome = std::result::Result<MsgHandle, i32>;

type Callback = Box<dyn FnOnce(RawOutcome) + Send>;

/// A notification object dispatched at most once.
pub struct Completion {
    slot: Mutex<Option<Callback>>,
}

impl Completion {
    /// Wrap a callback into a shareable completion.
    pub fn new(callback: impl FnOnce(RawOutcome) + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Some(Box::new(callback))),
        })
    }

    /// Fire the completion with `outcome`.
    ///
    /// Returns `true` if this call dispatched the callback. Returns `false`
    /// if the completion had already fired; in that case the caller keeps
    /// ownership of any message handle inside `outcome` and must free it.
    pub fn complete(&self, outcome: RawOutcome) -> bool {
        let callback = self.slot.lock().take();
        match callback {
            Some(callback) => {
                callback(outcome);
                true
            }
            None => false,
        }
    }

    /// Fire the completion with the canceled status.
    ///
    /// Returns `false` when a real outcome already won the race.
    pub fn cancel(&self) -> bool {
        self.complete(Err(ErrorCode::Canceled.raw()))
    }

    /// Whether the callback has already been dispatched.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fires_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let completion = Completion::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!completion.is_finished());
        assert!(completion.complete(Ok(MsgHandle(7))));
        assert!(!completion.complete(Ok(MsgHandle(8))));
        assert!(completion.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_after_completion_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let completion = Completion::new(move |outcome| {
            assert!(outcome.is_ok());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(completion.complete(Ok(MsgHandle(1))));
        assert!(!completion.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_carries_the_canceled_status() {
        let completion = Completion::new(|outcome| {
            assert_eq!(outcome, Err(ErrorCode::Canceled.raw()));
        });
        assert!(completion.cancel());
    }
}
