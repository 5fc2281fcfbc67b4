//! Rejection values and library errors.
//!
//! A [`Rejection`] is the failure half of a settled promise. It is an opaque,
//! cheaply clonable handle around an arbitrary payload; the payload's concrete
//! type can be recovered with [`Rejection::downcast_ref`], which is what the
//! typed [`catch`](crate::Promise::catch) filter is built on.
//!
//! [`Outcome`] is the result of awaiting a promise. Inside a promise body the
//! `?` operator forwards a rejection from an awaited promise straight into the
//! body's own outcome, so rejections travel up a chain without any explicit
//! plumbing:
//!
//! ```
//! use pledge::{make_promise, Rejection};
//!
//! let p = make_promise(async { Err::<i32, _>(Rejection::msg("boom")) });
//! let q = make_promise(async move {
//!     let v = p.await?; // rejection short-circuits here
//!     Ok(v + 1)
//! });
//! assert!(q.wait().is_err());
//! ```

use std::{any::Any, fmt, sync::Arc};

use thiserror::Error;

/// The settled result of a promise: a value, or the rejection cause.
pub type Outcome<T> = Result<T, Rejection>;

/// Errors reported by the library itself, as opposed to rejections travelling
/// through promises.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromiseError {
    /// A settle was attempted on a promise that already has an outcome. Only
    /// surfaced by the strict [`try_resolve`](crate::Resolver::try_resolve) /
    /// [`try_reject`](crate::Rejector::try_reject) forms; the plain forms
    /// report the same condition as a `false` return.
    #[error("promise already settled")]
    AlreadySettled,
}

/// An opaque failure cause.
///
/// Rejections are single values shared by every consumer of the promise they
/// settled, so the payload is reference counted and handed out by reference.
/// The payload type's name is captured at construction for diagnostics.
#[derive(Clone)]
pub struct Rejection {
    payload: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Rejection {
    /// Wrap an arbitrary payload as a rejection cause.
    pub fn new<E>(payload: E) -> Self
    where
        E: Any + Send + Sync,
    {
        Self {
            payload: Arc::new(payload),
            type_name: std::any::type_name::<E>(),
        }
    }

    /// Shorthand for a plain text cause.
    pub fn msg(text: impl Into<String>) -> Self {
        Self {
            payload: Arc::new(text.into()),
            type_name: std::any::type_name::<String>(),
        }
    }

    /// Check whether the payload is of type `E`.
    pub fn is<E: Any>(&self) -> bool {
        self.payload.is::<E>()
    }

    /// Borrow the payload as type `E`, if that is what it is.
    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// The type name of the payload, as captured at construction.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Rejection");
        dbg.field("type", &self.type_name);
        if let Some(text) = self.downcast_ref::<String>() {
            dbg.field("msg", text);
        }
        dbg.finish()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.downcast_ref::<String>() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "rejected with {}", self.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rejection;

    #[derive(Debug, PartialEq)]
    struct Timeout(u32);

    #[test]
    fn downcast_matches_payload_type() {
        let cause = Rejection::new(Timeout(250));

        assert!(cause.is::<Timeout>());
        assert!(!cause.is::<String>());
        assert_eq!(cause.downcast_ref::<Timeout>(), Some(&Timeout(250)));
        assert_eq!(cause.downcast_ref::<u32>(), None);
    }

    #[test]
    fn clones_share_the_payload() {
        let cause = Rejection::msg("disk full");
        let other = cause.clone();

        assert_eq!(other.downcast_ref::<String>().map(String::as_str), Some("disk full"));
        assert_eq!(format!("{other}"), "disk full");
    }

    #[test]
    fn display_falls_back_to_type_name() {
        let cause = Rejection::new(Timeout(1));
        assert!(format!("{cause}").contains("Timeout"));
    }
}
