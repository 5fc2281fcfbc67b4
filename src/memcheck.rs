//! Debug-only leak accounting (cargo feature `memcheck`).
//!
//! Every completion box increments a process-wide counter at construction
//! and decrements it at destruction; the core calls the hooks symmetrically
//! and never depends on them for correctness. Hold a [`LeakCheck`] for the
//! lifetime of a program (or test) to get a report of promises still alive
//! when it drops, typically detached promises that were never settled.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::error;

static LIVE: AtomicUsize = AtomicUsize::new(0);

/// Number of completion boxes currently alive.
pub fn live_promises() -> usize {
    LIVE.load(Ordering::Relaxed)
}

pub(crate) fn created() {
    LIVE.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn destroyed() {
    LIVE.fetch_sub(1, Ordering::Relaxed);
}

/// Guard that reports leaked promises when dropped.
#[derive(Default)]
pub struct LeakCheck {
    _priv: (),
}

impl LeakCheck {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drop for LeakCheck {
    fn drop(&mut self) {
        let live = live_promises();
        if live != 0 {
            error!("leak check: {live} promises still alive");
            debug_assert_eq!(live, 0, "leak check: {live} promises still alive");
        }
    }
}
