//! # `pledge`: thread-safe promises without an executor
//!
//! This crate implements a promise runtime: a value container that starts
//! empty, is settled exactly once (with a value or a rejection) by
//! producer code, and is awaited by consumer code that may run before or
//! after the settle. It provides no I/O, no thread pool and no scheduler of
//! its own; it is pure synchronization, state-machine and combinator logic
//! on top of `std::future` and wakers.
//!
//! Promises start *eagerly*: the body begins running when the promise is
//! created, not when it is first awaited. When a suspended body's dependency
//! settles, the body continues synchronously on whichever thread performed
//! the settle; callers that need resumption on a particular thread must
//! arrange that themselves.
//!
//! For creating and awaiting promises, see the [promise] module. Chaining is
//! covered in [combinator], external completion in [resolver], and awaiting
//! promises of mixed types in [erased].
//!
//! ## Example
//!
//! A value produced on one thread, transformed and observed on another:
//!
//! ```
//! use std::thread;
//! use pledge::{all, make_resolver_promise, Promise};
//!
//! let answer = make_resolver_promise(|resolve, _reject| async move {
//!     thread::spawn(move || {
//!         resolve.resolve(40);
//!     });
//!     Ok(())
//! })
//! .then(|v| Ok(v + 2));
//!
//! let greeting = Promise::resolved("hello");
//!
//! let both = all!(answer, greeting);
//! assert_eq!(both.wait().unwrap(), (42, "hello"));
//! ```

pub mod combinator;
mod driver;
pub mod erased;
mod join;
#[cfg(feature = "memcheck")]
pub mod memcheck;
pub mod promise;
pub mod rejection;
pub mod resolver;
mod state;

pub use erased::PromiseHandle;
pub use promise::{make_promise, make_resolver_promise, Promise};
pub use rejection::{Outcome, PromiseError, Rejection};
pub use resolver::{Rejector, Resolver};
