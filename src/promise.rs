//! The [`Promise`] handle and its constructors.
//!
//! A promise is created around a *body* and starts eagerly: the body runs on
//! the constructing thread up to its first suspension point before the
//! constructor returns. A *direct* promise ([`make_promise`]) settles with
//! whatever its body returns; a *resolver-style* promise
//! ([`make_resolver_promise`]) settles only through the [`Resolver`] /
//! [`Rejector`] capabilities its body receives, which may be stored and
//! invoked from any thread, long after the body itself has finished.
//!
//! Awaiting a promise yields an [`Outcome<T>`]: the resolved value, or the
//! rejection re-raised as the consumer's own failure. An already-settled
//! promise is awaited without ever suspending the caller.
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use pledge::{make_resolver_promise, Promise};
//!
//! let p = make_resolver_promise(|resolve, _reject| async move {
//!     thread::spawn(move || {
//!         assert!(resolve.resolve("ready"));
//!     });
//!     Ok(())
//! });
//!
//! assert_eq!(p.wait().unwrap(), "ready");
//! ```
//!
//! # Ownership
//!
//! Each promise has exactly one handle. Dropping the handle does not stop
//! the body (whatever the body is suspended on keeps it alive), but a
//! promise that must outlive its handle without being chained anywhere can
//! be [`detach`](Promise::detach)ed explicitly, transferring ownership into
//! the promise itself until it settles. The combinators take the handle by
//! value, so chaining a temporary detaches it implicitly.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll, Wake, Waker},
    thread::{self, Thread},
};

use crate::{
    driver::Driver,
    erased::PromiseHandle,
    rejection::{Outcome, Rejection},
    resolver::{self, Rejector, Resolver},
    state::Shared,
};

/// A single-assignment, thread-safe result container.
///
/// Implements [`Future`] (and is `Unpin`), so it can be awaited directly, or
/// through `&mut` to keep the handle. See the [module docs](self).
pub struct Promise<T> {
    pub(crate) shared: Arc<Shared<T>>,
    // Waiter-list key from a previous registration, updated in place on
    // re-polls.
    pub(crate) slot: Option<usize>,
}

/// Create a direct promise: `body` starts immediately and its return value
/// is the outcome. Returning `Err` rejects the promise.
///
/// ```
/// use pledge::{make_promise, Outcome};
///
/// let p = make_promise(async { Outcome::Ok(2 + 3) });
/// assert_eq!(p.wait().unwrap(), 5);
/// ```
pub fn make_promise<T, F>(body: F) -> Promise<T>
where
    T: Send + Sync + 'static,
    F: Future<Output = Outcome<T>> + Send + 'static,
{
    let shared = Shared::new();
    let (resolve, reject) = resolver::pair(&shared);

    Driver::start(async move {
        match body.await {
            Ok(value) => {
                resolve.resolve(value);
            }
            Err(cause) => {
                reject.reject(cause);
            }
        }
    });

    Promise { shared, slot: None }
}

/// Create a resolver-style promise: `f` receives the settle capabilities and
/// returns the body. The promise settles only through the capabilities; a
/// body that returns `Err` rejects it as a fallback (unless something
/// settled it first).
pub fn make_resolver_promise<T, F, Fut>(f: F) -> Promise<T>
where
    T: Send + Sync + 'static,
    F: FnOnce(Resolver<T>, Rejector) -> Fut,
    Fut: Future<Output = Outcome<()>> + Send + 'static,
{
    let shared = Shared::new();
    let (resolve, reject) = resolver::pair(&shared);
    let body = f(resolve, reject.clone());

    Driver::start(async move {
        if let Err(cause) = body.await {
            reject.reject(cause);
        }
    });

    Promise { shared, slot: None }
}

impl<T: Send + Sync + 'static> Promise<T> {
    /// A bodyless promise plus its settle capabilities: nothing runs, the
    /// promise stays pending until a capability is invoked.
    pub fn pure() -> (Promise<T>, Resolver<T>, Rejector) {
        let shared = Shared::new();
        let (resolve, reject) = resolver::pair(&shared);

        (Promise { shared, slot: None }, resolve, reject)
    }

    /// An already-resolved promise; no body, no suspension machinery.
    pub fn resolved(value: T) -> Promise<T> {
        Self::settled(Ok(value))
    }

    /// An already-rejected promise; no body, no suspension machinery.
    pub fn rejected(cause: Rejection) -> Promise<T> {
        Self::settled(Err(cause))
    }

    pub(crate) fn settled(outcome: Outcome<T>) -> Promise<T> {
        Promise {
            shared: Shared::settled(outcome),
            slot: None,
        }
    }

    /// Whether the promise has settled, with either outcome.
    pub fn is_ready(&self) -> bool {
        self.shared.is_ready()
    }

    /// Whether the promise has settled with a value.
    pub fn is_resolved(&self) -> bool {
        self.shared.is_resolved()
    }

    /// Whether the promise has settled with a rejection.
    pub fn is_rejected(&self) -> bool {
        self.shared.is_rejected()
    }

    /// The resolved value, if resolved.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.shared.value()
    }

    /// The rejection cause, if rejected.
    pub fn rejection(&self) -> Option<Rejection> {
        self.shared.rejection()
    }

    /// The settled outcome, or `None` while pending. This is the combinators'
    /// fast-path probe.
    pub(crate) fn try_outcome(&self) -> Option<Outcome<T>>
    where
        T: Clone,
    {
        self.shared.outcome()
    }

    /// Give the promise ownership of itself so it survives this handle.
    ///
    /// A no-op if already settled. Useful for fire-and-forget promises that
    /// are not chained anywhere.
    ///
    /// # Panics
    ///
    /// If the promise already owns itself.
    pub fn detach(self) {
        self.shared.detach();
    }

    /// Erase the value type, transferring ownership into the wrapper.
    pub fn to_handle(self) -> PromiseHandle {
        PromiseHandle::new(self)
    }

    /// Block the current thread until the promise settles and take the
    /// outcome. For synchronous consumers; asynchronous code should `.await`
    /// the promise instead.
    pub fn wait(self) -> Outcome<T>
    where
        T: Clone,
    {
        block_on(self)
    }
}

impl<T: Clone + Send + Sync + 'static> Future for Promise<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        ready!(this.shared.poll_settled(&mut this.slot, cx));

        match this.shared.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => unreachable!("settled promise lost its outcome"),
        }
    }
}

struct Unparker(Thread);

impl Wake for Unparker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Park-based single-future wait, shared by [`Promise::wait`] and
/// [`PromiseHandle::wait`].
pub(crate) fn block_on<F>(mut fut: F) -> F::Output
where
    F: Future + Unpin,
{
    let waker = Waker::from(Arc::new(Unparker(thread::current())));
    let mut cx = Context::from_waker(&waker);

    loop {
        match Pin::new(&mut fut).poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    use super::{make_promise, make_resolver_promise, Promise};
    use crate::rejection::Rejection;

    #[test]
    fn body_starts_before_constructor_returns() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);

        let p = make_promise(async move {
            flag.store(true, Ordering::SeqCst);
            Ok(1)
        });

        assert!(started.load(Ordering::SeqCst));
        assert!(p.is_ready());
        assert_eq!(p.value(), Some(1));
    }

    #[test]
    fn wait_blocks_until_cross_thread_resolve() {
        let (p, resolve, _reject) = Promise::pure();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            assert!(resolve.resolve("zomg"));
        });

        assert_eq!(p.wait().unwrap(), "zomg");
    }

    #[test]
    fn awaiting_a_settled_promise_does_not_suspend() {
        let p = Promise::resolved(9u32);
        let outcome = make_promise(async move { Ok(p.await? + 1) });

        // The chain settled synchronously; no waiter was ever parked.
        assert_eq!(outcome.value(), Some(10));
    }

    #[test]
    fn rejected_constructor_reraises_on_await() {
        let p = Promise::<u32>::rejected(Rejection::msg("nope"));
        let err = p.wait().unwrap_err();
        assert_eq!(format!("{err}"), "nope");
    }

    #[test]
    fn resolver_promise_settles_only_through_capability() {
        let p = make_resolver_promise::<u32, _, _>(|resolve, _reject| async move {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                resolve.resolve(123);
            });
            Ok(())
        });

        // The body has already run to completion, yet the promise waits for
        // its capability.
        assert!(!p.is_ready());
        assert_eq!(p.wait().unwrap(), 123);
    }

    #[test]
    fn resolver_body_failure_rejects_as_fallback() {
        let p = make_resolver_promise::<u32, _, _>(|_resolve, _reject| async move {
            Err(Rejection::msg("body blew up"))
        });

        assert!(p.is_rejected());
        assert!(p.rejection().is_some());
    }

    #[test]
    fn chained_bodies_resume_on_the_resolving_thread() {
        let (p, resolve, _reject) = Promise::<u32>::pure();
        let resumed_on = Arc::new(std::sync::Mutex::new(None));
        let out = Arc::clone(&resumed_on);

        let q = make_promise(async move {
            let v = p.await?;
            *out.lock().unwrap() = Some(thread::current().id());
            Ok(v * 2)
        });

        let producer = thread::spawn(move || {
            let id = thread::current().id();
            resolve.resolve(21);
            id
        });
        let producer_id = producer.join().unwrap();

        assert_eq!(q.wait().unwrap(), 42);
        assert_eq!(*resumed_on.lock().unwrap(), Some(producer_id));
    }

    #[test]
    fn keeping_the_handle_with_mut_await() {
        let mut p = Promise::resolved(5u32);
        let q = make_promise(async move {
            let first = (&mut p).await?;
            let second = (&mut p).await?;
            Ok(first + second)
        });

        assert_eq!(q.wait().unwrap(), 10);
    }

    #[test]
    fn pure_promise_value_visible_through_accessors() {
        let (p, resolve, reject) = Promise::<u32>::pure();
        assert!(!p.is_ready());

        assert!(resolve.resolve(7));
        assert!(!reject.reject(Rejection::msg("late")));

        assert!(p.is_resolved());
        assert!(!p.is_rejected());
        assert_eq!(p.value(), Some(7));
        assert!(p.rejection().is_none());
    }
}
