//! Type-erased promise handles.
//!
//! A [`PromiseHandle`] hides a promise's value type behind a uniform
//! await/inspect/detach surface, so promises of heterogeneous types can live
//! in one collection or cross an API boundary together. Awaiting a handle
//! reports only how the promise settled; the value itself is discarded,
//! rejections are preserved.
//!
//! ```
//! use pledge::{Promise, PromiseHandle};
//!
//! let handles: Vec<PromiseHandle> = vec![
//!     Promise::resolved(1u32).to_handle(),
//!     Promise::resolved("mixed types").to_handle(),
//! ];
//!
//! for handle in handles {
//!     assert!(handle.wait().is_ok());
//! }
//! ```

use std::{future::Future, pin::Pin, task::{ready, Context, Poll}};

use crate::{promise::block_on, rejection::Outcome, Promise};

/// The object-safe slice of a promise.
trait ErasedPromise: Send {
    fn is_ready(&self) -> bool;
    fn poll_done(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<()>>;
    fn detach(self: Box<Self>);
}

impl<T: Send + Sync + 'static> ErasedPromise for Promise<T> {
    fn is_ready(&self) -> bool {
        Promise::is_ready(self)
    }

    fn poll_done(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<()>> {
        ready!(self.shared.poll_settled(&mut self.slot, cx));
        Poll::Ready(self.shared.outcome_discarded())
    }

    fn detach(self: Box<Self>) {
        Promise::detach(*self);
    }
}

/// An owning, type-erased promise handle.
///
/// Built with [`Promise::to_handle`], which transfers ownership of the
/// promise into the wrapper. Implements [`Future`] with the value discarded.
pub struct PromiseHandle {
    inner: Box<dyn ErasedPromise>,
}

impl PromiseHandle {
    pub(crate) fn new<T: Send + Sync + 'static>(promise: Promise<T>) -> Self {
        Self {
            inner: Box::new(promise),
        }
    }

    /// Whether the underlying promise has settled, with either outcome.
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// Detach the underlying promise; see [`Promise::detach`].
    pub fn detach(self) {
        self.inner.detach();
    }

    /// Block until the underlying promise settles; the erased counterpart of
    /// [`Promise::wait`].
    pub fn wait(self) -> Outcome<()> {
        block_on(self)
    }
}

impl Future for PromiseHandle {
    type Output = Outcome<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_done(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::PromiseHandle;
    use crate::{make_promise, Promise, Rejection};

    #[test]
    fn heterogeneous_handles_await_uniformly() {
        let (pending, resolve, _reject) = Promise::<String>::pure();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            resolve.resolve("late".into());
        });

        let handles: Vec<PromiseHandle> = vec![
            Promise::resolved(1u32).to_handle(),
            Promise::resolved("str").to_handle(),
            pending.to_handle(),
        ];

        for handle in handles {
            assert!(handle.wait().is_ok());
        }
    }

    #[test]
    fn rejection_survives_erasure() {
        #[derive(Debug)]
        struct Timeout;

        let handle = Promise::<u32>::rejected(Rejection::new(Timeout)).to_handle();
        assert!(handle.is_ready());
        assert!(handle.wait().unwrap_err().is::<Timeout>());
    }

    #[test]
    fn erased_handles_can_be_awaited_from_a_body() {
        let first = Promise::resolved(1u32).to_handle();
        let second = Promise::resolved("two").to_handle();

        let joined = make_promise(async move {
            first.await?;
            second.await?;
            Ok(())
        });

        assert!(joined.wait().is_ok());
    }

    #[test]
    fn detach_through_the_erased_surface() {
        let (pending, resolve, _reject) = Promise::<u32>::pure();
        pending.to_handle().detach();

        // The promise owns itself now; settling releases it.
        assert!(resolve.resolve(5));
    }
}
