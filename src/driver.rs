//! Inline execution of promise bodies.
//!
//! There is no executor in this crate. A promise body starts running on the
//! thread that creates it and, whenever a dependency settles, continues on
//! whichever thread performed that settle: the body's waker re-polls it
//! synchronously. The Idle/Running/Notified phase machine below makes that
//! safe against concurrent wakes and against the body settling a promise it
//! is itself awaited through (a re-entrant wake collapses into a notify).

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll, Wake, Waker},
};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const NOTIFIED: u8 = 2;
const DONE: u8 = 3;

pub(crate) struct Driver {
    phase: AtomicU8,
    body: Mutex<Option<Pin<Box<dyn Future<Output = ()> + Send>>>>,
}

impl Driver {
    /// Box the body and poll it to its first suspension point (or to
    /// completion) before returning. The driver keeps itself alive through
    /// the wakers the body registers while suspended.
    pub(crate) fn start(body: impl Future<Output = ()> + Send + 'static) {
        let driver = Arc::new(Driver {
            phase: AtomicU8::new(IDLE),
            body: Mutex::new(Some(Box::pin(body))),
        });

        driver.poll_body();
    }

    fn poll_body(self: &Arc<Self>) {
        // Acquire the poll, or hand this wake to whoever already holds it.
        // The notify attempt can race the poller's Running -> Idle release;
        // observing Idle there means the poller has left, so go round and
        // take the poll over rather than dropping the wake.
        loop {
            match self
                .phase
                .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(RUNNING) => {
                    match self.phase.compare_exchange(
                        RUNNING,
                        NOTIFIED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    ) {
                        // The running poller re-checks after every Pending.
                        Ok(_) => return,
                        Err(IDLE) => continue,
                        // Already notified, or the body finished.
                        Err(_) => return,
                    }
                }
                // Notified: a re-poll is already owed. Done: nothing left.
                Err(_) => return,
            }
        }

        let waker = Waker::from(Arc::clone(self));
        let mut cx = Context::from_waker(&waker);
        let mut slot = self.body.lock().unwrap();

        while let Some(body) = slot.as_mut() {
            match body.as_mut().poll(&mut cx) {
                Poll::Ready(()) => {
                    *slot = None;
                    self.phase.store(DONE, Ordering::Release);
                    return;
                }
                Poll::Pending => {
                    match self
                        .phase
                        .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    {
                        Ok(_) => return,
                        // A wake arrived while we were polling; its settle
                        // may have happened before our waker registration,
                        // so poll again.
                        Err(_) => self.phase.store(RUNNING, Ordering::Release),
                    }
                }
            }
        }
    }
}

impl Wake for Driver {
    fn wake(self: Arc<Self>) {
        self.poll_body();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.poll_body();
    }
}
