//! Settle capabilities: [`Resolver`] and [`Rejector`].
//!
//! A promise hands these out as its only way of being completed from the
//! outside. Both handles of a pair share one exchange-once guard, so across
//! any number of clones and threads exactly one `resolve`/`reject` call wins;
//! every later call is a no-op that reports `false`. The handles hold a
//! strong reference to the completion box and may be stored and invoked long
//! after the frame that created the promise has returned.
//!
//! ```
//! use std::thread;
//! use pledge::Promise;
//!
//! let (p, resolve, _reject) = Promise::pure();
//! thread::spawn(move || {
//!     assert!(resolve.resolve(42));
//! });
//! assert_eq!(p.wait().unwrap(), 42);
//! ```

use std::{
    any::Any,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    rejection::{PromiseError, Rejection},
    state::Shared,
};

/// Targets a [`Rejector`] can settle. Rejection does not involve the value
/// type, so the rejector is not generic over it.
pub(crate) trait RejectTarget: Send + Sync {
    fn settle_rejected(&self, cause: Rejection);
}

impl<T: Send + Sync + 'static> RejectTarget for Shared<T> {
    fn settle_rejected(&self, cause: Rejection) {
        self.settle(Err(cause));
    }
}

/// Build the capability pair for a completion box.
pub(crate) fn pair<T: Send + Sync + 'static>(shared: &Arc<Shared<T>>) -> (Resolver<T>, Rejector) {
    let guard = Arc::new(AtomicBool::new(false));

    (
        Resolver {
            shared: Arc::clone(shared),
            guard: Arc::clone(&guard),
        },
        Rejector {
            target: Arc::clone(shared) as Arc<dyn RejectTarget>,
            guard,
        },
    )
}

/// Single-use permission to resolve one promise with a value.
pub struct Resolver<T> {
    shared: Arc<Shared<T>>,
    guard: Arc<AtomicBool>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<T: Send + Sync + 'static> Resolver<T> {
    /// Resolve the promise. Returns `true` if this call performed the
    /// transition, `false` if the promise was already settled (by anyone,
    /// including the paired rejector); in that case `value` is dropped.
    pub fn resolve(&self, value: T) -> bool {
        if self.guard.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.shared.settle(Ok(value));
        true
    }

    /// The strict form: a lost race is an error instead of a quiet `false`.
    pub fn try_resolve(&self, value: T) -> Result<(), PromiseError> {
        if self.resolve(value) {
            Ok(())
        } else {
            Err(PromiseError::AlreadySettled)
        }
    }

    /// Whether the settle permission has been used up.
    pub fn is_spent(&self) -> bool {
        self.guard.load(Ordering::Acquire)
    }
}

/// Single-use permission to reject one promise with a cause.
///
/// Not generic over the promise's value type, so rejectors for heterogeneous
/// promises can share plumbing.
#[derive(Clone)]
pub struct Rejector {
    target: Arc<dyn RejectTarget>,
    guard: Arc<AtomicBool>,
}

impl Rejector {
    /// Reject the promise. Returns `true` if this call performed the
    /// transition, `false` if the promise was already settled.
    pub fn reject(&self, cause: Rejection) -> bool {
        if self.guard.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.target.settle_rejected(cause);
        true
    }

    /// Reject with a payload, wrapping it as the cause.
    pub fn reject_with<E>(&self, payload: E) -> bool
    where
        E: Any + Send + Sync,
    {
        self.reject(Rejection::new(payload))
    }

    /// The strict form: a lost race is an error instead of a quiet `false`.
    pub fn try_reject(&self, cause: Rejection) -> Result<(), PromiseError> {
        if self.reject(cause) {
            Ok(())
        } else {
            Err(PromiseError::AlreadySettled)
        }
    }

    /// Whether the settle permission has been used up.
    pub fn is_spent(&self) -> bool {
        self.guard.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
    };

    use super::pair;
    use crate::{
        rejection::{PromiseError, Rejection},
        state::Shared,
    };

    #[test]
    fn first_resolve_wins() {
        let shared = Shared::<u32>::new();
        let (resolve, _reject) = pair(&shared);

        assert!(!resolve.is_spent());
        assert!(resolve.resolve(1));
        assert!(resolve.is_spent());
        assert!(!resolve.resolve(2));

        assert_eq!(shared.value(), Some(1));
    }

    #[test]
    fn reject_and_resolve_share_the_guard() {
        let shared = Shared::<u32>::new();
        let (resolve, reject) = pair(&shared);

        assert!(reject.reject(Rejection::msg("first")));
        assert!(!resolve.resolve(9));
        assert!(resolve.is_spent());

        assert!(shared.is_rejected());
        assert_eq!(shared.value(), None);
    }

    #[test]
    fn strict_forms_report_the_loss() {
        let shared = Shared::<u32>::new();
        let (resolve, reject) = pair(&shared);

        assert_eq!(resolve.try_resolve(5), Ok(()));
        assert_eq!(resolve.try_resolve(6), Err(PromiseError::AlreadySettled));
        assert_eq!(
            reject.try_reject(Rejection::msg("late")),
            Err(PromiseError::AlreadySettled)
        );
    }

    #[test]
    fn reject_with_wraps_the_payload() {
        let shared = Shared::<u32>::new();
        let (_resolve, reject) = pair(&shared);

        #[derive(Debug)]
        struct Refused;

        assert!(reject.reject_with(Refused));
        assert!(shared.rejection().is_some_and(|c| c.is::<Refused>()));
    }

    #[test]
    fn concurrent_resolvers_race_exactly_one_winner() {
        let shared = Shared::<usize>::new();
        let (resolve, _reject) = pair(&shared);

        let barrier = Arc::new(Barrier::new(2));
        let wins = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..2)
            .map(|id| {
                let resolve = resolve.clone();
                let barrier = Arc::clone(&barrier);
                let wins = Arc::clone(&wins);
                thread::spawn(move || {
                    barrier.wait();
                    if resolve.resolve(id) {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(shared.is_resolved());
        assert!(shared.value().is_some_and(|v| v < 2));
    }
}
