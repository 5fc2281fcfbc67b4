//! Chaining combinators: `then`, `catch` and `finally`.
//!
//! Each combinator consumes the source handle and returns a new promise, so
//! a chain built off a temporary keeps the whole pipeline alive without the
//! caller holding anything (the implicit detach). When the source has
//! already settled at call time the callback runs synchronously and the
//! derived promise is born settled, skipping the body and suspension
//! machinery entirely.
//!
//! ```
//! use pledge::{make_promise, Outcome};
//!
//! let p = make_promise(async { Outcome::Ok(5) })
//!     .then(|v| Ok(v + 1))
//!     .finally(|| Ok(()));
//! assert_eq!(p.wait().unwrap(), 6);
//! ```
//!
//! Rejections are filtered by payload type:
//!
//! ```
//! use pledge::{make_promise, Promise, Rejection};
//!
//! struct Timeout;
//!
//! let p = Promise::<u32>::rejected(Rejection::new(Timeout))
//!     .catch(|_t: &Timeout| Ok(7));
//! assert_eq!(p.wait().unwrap(), 7);
//! ```

use std::any::Any;

use crate::{
    promise::make_promise,
    rejection::{Outcome, Rejection},
    Promise,
};

/// Run the typed filter over a settled outcome: recover when the cause is an
/// `E`, re-propagate the cause unchanged otherwise.
fn recover<T, E, F>(outcome: Outcome<T>, func: F) -> Outcome<T>
where
    E: Any,
    F: FnOnce(&E) -> Outcome<T>,
{
    match outcome {
        Ok(value) => Ok(value),
        Err(cause) => {
            let recovered = cause.downcast_ref::<E>().map(func);
            match recovered {
                Some(outcome) => outcome,
                None => Err(cause),
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Promise<T> {
    /// Derive a promise that applies `func` to this promise's value.
    ///
    /// `func` runs once the source resolves; its return value is the derived
    /// promise's outcome, so it can reject by returning `Err`. If the source
    /// rejects, the rejection propagates untouched and `func` never runs.
    pub fn then<U, F>(self, func: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Outcome<U> + Send + 'static,
    {
        if let Some(outcome) = self.try_outcome() {
            return match outcome {
                Ok(value) => Promise::settled(func(value)),
                Err(cause) => Promise::rejected(cause),
            };
        }

        make_promise(async move { func(self.await?) })
    }

    /// Like [`then`](Promise::then), for callbacks that start a promise of
    /// their own; the derived promise settles with that inner promise's
    /// outcome (flattened).
    pub fn then_promise<U, F>(self, func: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        if let Some(outcome) = self.try_outcome() {
            return match outcome {
                Ok(value) => func(value),
                Err(cause) => Promise::rejected(cause),
            };
        }

        make_promise(async move { func(self.await?).await })
    }

    /// Derive a promise that recovers from rejections whose payload is an
    /// `E`. Any other rejection re-propagates past this link unchanged, and
    /// a resolved source passes its value through with `func` never running.
    pub fn catch<E, F>(self, func: F) -> Promise<T>
    where
        E: Any,
        F: FnOnce(&E) -> Outcome<T> + Send + 'static,
    {
        if let Some(outcome) = self.try_outcome() {
            return Promise::settled(recover(outcome, func));
        }

        make_promise(async move { recover(self.await, func) })
    }

    /// Derive a promise that recovers from every rejection, receiving the
    /// opaque cause.
    pub fn catch_all<F>(self, func: F) -> Promise<T>
    where
        F: FnOnce(Rejection) -> Outcome<T> + Send + 'static,
    {
        if let Some(outcome) = self.try_outcome() {
            return Promise::settled(outcome.or_else(func));
        }

        make_promise(async move { self.await.or_else(func) })
    }

    /// Run `func` exactly once after the source settles, whatever the
    /// outcome, strictly before the derived promise settles. The source
    /// outcome is forwarded unchanged unless `func` itself fails, in which
    /// case `func`'s rejection wins.
    pub fn finally<F>(self, func: F) -> Promise<T>
    where
        F: FnOnce() -> Outcome<()> + Send + 'static,
    {
        if let Some(outcome) = self.try_outcome() {
            return Promise::settled(match func() {
                Ok(()) => outcome,
                Err(cause) => Err(cause),
            });
        }

        make_promise(async move {
            let outcome = self.await;
            match func() {
                Ok(()) => outcome,
                Err(cause) => Err(cause),
            }
        })
    }
}
