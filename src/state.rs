//! The completion box: one per promise.
//!
//! [`Shared`] holds the settled outcome, the waiter list and the ownership
//! slot behind a single `RwLock`. Readers (readiness checks, value and
//! rejection accessors) take the shared side; the one state transition and
//! waiter registration take the exclusive side. The waiter list is swapped
//! out and the lock released *before* any waker runs, so resumed code never
//! re-enters while the box is locked.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    task::{Context, Poll, Waker},
};

use log::warn;
use slab::Slab;

use crate::rejection::{Outcome, Rejection};

/// The promise life-cycle. Advances `Pending` to one of the settled states
/// exactly once and never reverses.
enum Lifecycle<T> {
    Pending,
    Resolved(T),
    Rejected(Rejection),
}

impl<T> Lifecycle<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Lifecycle::Pending)
    }
}

/// Who keeps the completion box alive.
///
/// `External` is the freshly created state: some handle out there owns the
/// box. `Held` is self-ownership after a detach: the box carries a strong
/// reference to itself until it settles. `Settled` is the terminal state; the
/// box lives exactly as long as the remaining external references.
enum Owner<T> {
    External,
    Held(Arc<Shared<T>>),
    Settled,
}

struct Inner<T> {
    state: Lifecycle<T>,
    // Keys are handed out in ascending order and only ever removed by the
    // wholesale drain at settle time, so iteration order is registration
    // order.
    waiters: Slab<Waker>,
    owner: Owner<T>,
}

pub(crate) struct Shared<T> {
    inner: RwLock<Inner<T>>,
    // Set once any consumer has seen the rejection; drives the
    // unobserved-rejection diagnostic in Drop.
    observed: AtomicBool,
}

impl<T: Send + Sync + 'static> Shared<T> {
    pub(crate) fn new() -> Arc<Self> {
        #[cfg(feature = "memcheck")]
        crate::memcheck::created();

        Arc::new(Self {
            inner: RwLock::new(Inner {
                state: Lifecycle::Pending,
                waiters: Slab::new(),
                owner: Owner::External,
            }),
            observed: AtomicBool::new(false),
        })
    }

    /// A box that is born settled: no body, no waiters ever.
    pub(crate) fn settled(outcome: Outcome<T>) -> Arc<Self> {
        #[cfg(feature = "memcheck")]
        crate::memcheck::created();

        let state = match outcome {
            Ok(value) => Lifecycle::Resolved(value),
            Err(cause) => Lifecycle::Rejected(cause),
        };

        Arc::new(Self {
            inner: RwLock::new(Inner {
                state,
                waiters: Slab::new(),
                owner: Owner::Settled,
            }),
            observed: AtomicBool::new(false),
        })
    }

    /// Perform the one state transition and resume every waiter.
    ///
    /// The caller (a settle capability) has already won the exchange-once
    /// guard, so the box is still pending here. Wakers run after the lock is
    /// dropped; self-ownership is released in the same step.
    pub(crate) fn settle(&self, outcome: Outcome<T>) {
        let (waiters, ownership) = {
            let mut inner = self.inner.write().unwrap();
            debug_assert!(inner.state.is_pending());

            inner.state = match outcome {
                Ok(value) => Lifecycle::Resolved(value),
                Err(cause) => Lifecycle::Rejected(cause),
            };

            let waiters = std::mem::replace(&mut inner.waiters, Slab::new());
            let ownership = std::mem::replace(&mut inner.owner, Owner::Settled);
            (waiters, ownership)
        };

        for (_, waiter) in waiters {
            waiter.wake();
        }

        drop(ownership);
    }

    /// The suspend protocol: `Ready` once settled, otherwise park the waker.
    ///
    /// The settled check is done twice: once on the shared lock (the fast
    /// path, which never touches the waiter list) and again under the
    /// exclusive lock so a settle that slipped in between cannot strand the
    /// waker. `slot` is the caller's registration key; re-polls update the
    /// existing entry in place.
    pub(crate) fn poll_settled(&self, slot: &mut Option<usize>, cx: &mut Context<'_>) -> Poll<()> {
        {
            let inner = self.inner.read().unwrap();
            if !inner.state.is_pending() {
                return Poll::Ready(());
            }
        }

        let mut inner = self.inner.write().unwrap();
        if !inner.state.is_pending() {
            return Poll::Ready(());
        }

        match slot {
            Some(key) => inner.waiters[*key] = cx.waker().clone(),
            None => *slot = Some(inner.waiters.insert(cx.waker().clone())),
        }

        Poll::Pending
    }

    pub(crate) fn is_ready(&self) -> bool {
        !self.inner.read().unwrap().state.is_pending()
    }

    pub(crate) fn is_resolved(&self) -> bool {
        matches!(self.inner.read().unwrap().state, Lifecycle::Resolved(_))
    }

    pub(crate) fn is_rejected(&self) -> bool {
        matches!(self.inner.read().unwrap().state, Lifecycle::Rejected(_))
    }

    pub(crate) fn rejection(&self) -> Option<Rejection> {
        let inner = self.inner.read().unwrap();
        match &inner.state {
            Lifecycle::Rejected(cause) => {
                self.observed.store(true, Ordering::Relaxed);
                Some(cause.clone())
            }
            _ => None,
        }
    }

    /// Copy the outcome out, leaving the stored one in place for other
    /// consumers. `None` while pending.
    pub(crate) fn outcome(&self) -> Option<Outcome<T>>
    where
        T: Clone,
    {
        let inner = self.inner.read().unwrap();
        match &inner.state {
            Lifecycle::Pending => None,
            Lifecycle::Resolved(value) => Some(Ok(value.clone())),
            Lifecycle::Rejected(cause) => {
                self.observed.store(true, Ordering::Relaxed);
                Some(Err(cause.clone()))
            }
        }
    }

    pub(crate) fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        let inner = self.inner.read().unwrap();
        match &inner.state {
            Lifecycle::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The outcome with the value discarded; for type-erased consumers.
    ///
    /// Only valid once settled.
    pub(crate) fn outcome_discarded(&self) -> Outcome<()> {
        let inner = self.inner.read().unwrap();
        match &inner.state {
            Lifecycle::Pending => unreachable!("outcome read before settle"),
            Lifecycle::Resolved(_) => Ok(()),
            Lifecycle::Rejected(cause) => {
                self.observed.store(true, Ordering::Relaxed);
                Err(cause.clone())
            }
        }
    }

    /// Transfer ownership into the box itself.
    ///
    /// A no-op once settled (nothing needs keeping alive any more).
    ///
    /// # Panics
    ///
    /// If the box already owns itself; detaching twice is a construction
    /// protocol violation.
    pub(crate) fn detach(self: &Arc<Self>) {
        let mut inner = self.inner.write().unwrap();
        match inner.owner {
            Owner::External if inner.state.is_pending() => {
                inner.owner = Owner::Held(Arc::clone(self));
            }
            Owner::External | Owner::Settled => {
                inner.owner = Owner::Settled;
            }
            Owner::Held(_) => panic!("promise detached twice"),
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        #[cfg(feature = "memcheck")]
        crate::memcheck::destroyed();

        if let Ok(inner) = self.inner.get_mut() {
            if let Lifecycle::Rejected(cause) = &inner.state {
                if !self.observed.load(Ordering::Relaxed) {
                    warn!("promise dropped with unobserved rejection: {cause}");
                }
            }
        }
    }
}
