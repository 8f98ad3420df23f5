//! Single-resolution promise shared between a caller and a background worker.
//!
//! # Design
//! [`Promise::pending`] returns the observing half and the settling half
//! together. The caller holds the [`Promise`] and may attach handlers, block,
//! or `.await` it; the worker owns the only [`Resolver`]. An atomic flag
//! decides the single winning settlement; every later attempt is a no-op.
//! The settled outcome is stored, so handlers attached after settlement
//! still run exactly once.
//!
//! A `Resolver` dropped without settling rejects the promise, so a worker
//! that unwinds never leaves the caller waiting.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::{Condvar, Mutex};
use serde_json::Value;

use crate::error::ErrorOutcome;

const DROPPED_MESSAGE: &str = "Request ended without a response";

/// Terminal state of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Resolved(Value),
    Rejected(ErrorOutcome),
}

impl Settlement {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Settlement::Resolved(_))
    }

    /// The payload as a value: the resolved value, or `{"error": ...}`.
    pub fn to_value(&self) -> Value {
        match self {
            Settlement::Resolved(v) => v.clone(),
            Settlement::Rejected(e) => e.to_value(),
        }
    }

    pub fn into_result(self) -> Result<Value, ErrorOutcome> {
        match self {
            Settlement::Resolved(v) => Ok(v),
            Settlement::Rejected(e) => Err(e),
        }
    }
}

type Handler = Box<dyn FnOnce(&Settlement) + Send>;

enum State {
    Pending {
        handlers: Vec<Handler>,
        waker: Option<Waker>,
    },
    Settled(Settlement),
}

struct Shared {
    settled: AtomicBool,
    state: Mutex<State>,
    ready: Condvar,
}

/// Observing half of a single-resolution result.
pub struct Promise {
    shared: Arc<Shared>,
}

/// Settling half; exactly one exists per promise.
pub struct Resolver {
    shared: Arc<Shared>,
}

impl Promise {
    /// Create an unsettled promise and its resolver.
    pub fn pending() -> (Promise, Resolver) {
        let shared = Arc::new(Shared {
            settled: AtomicBool::new(false),
            state: Mutex::new(State::Pending {
                handlers: Vec::new(),
                waker: None,
            }),
            ready: Condvar::new(),
        });
        (
            Promise {
                shared: Arc::clone(&shared),
            },
            Resolver { shared },
        )
    }

    /// An already-rejected promise.
    pub fn rejected(outcome: ErrorOutcome) -> Promise {
        let (promise, resolver) = Promise::pending();
        resolver.reject(outcome);
        promise
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Settled(_))
    }

    /// The outcome, if already settled.
    pub fn try_settlement(&self) -> Option<Settlement> {
        match &*self.shared.state.lock() {
            State::Settled(s) => Some(s.clone()),
            State::Pending { .. } => None,
        }
    }

    /// Run `handler` once with the outcome.
    ///
    /// Runs on the settling thread, or immediately on the current thread if
    /// the promise is already settled.
    pub fn then<F>(&self, handler: F)
    where
        F: FnOnce(&Settlement) + Send + 'static,
    {
        let settlement = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Pending { handlers, .. } => {
                    handlers.push(Box::new(handler));
                    return;
                }
                State::Settled(settlement) => settlement.clone(),
            }
        };
        handler(&settlement);
    }

    /// Block the current thread until the promise settles.
    pub fn wait(self) -> Settlement {
        let mut state = self.shared.state.lock();
        loop {
            if let State::Settled(settlement) = &*state {
                return settlement.clone();
            }
            self.shared.ready.wait(&mut state);
        }
    }
}

impl Future for Promise {
    type Output = Settlement;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Settlement> {
        let mut state = self.shared.state.lock();
        match &mut *state {
            State::Settled(settlement) => Poll::Ready(settlement.clone()),
            State::Pending { waker, .. } => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Resolver {
    pub fn resolve(self, value: Value) {
        self.settle(Settlement::Resolved(value));
    }

    pub fn reject(self, outcome: ErrorOutcome) {
        self.settle(Settlement::Rejected(outcome));
    }

    /// Store `settlement` unless the promise already settled.
    ///
    /// Returns whether this call was the one that settled it.
    pub(crate) fn settle(&self, settlement: Settlement) -> bool {
        if self.shared.settled.swap(true, Ordering::AcqRel) {
            return false;
        }

        let mut state = self.shared.state.lock();
        let previous = std::mem::replace(&mut *state, State::Settled(settlement.clone()));
        drop(state);
        self.shared.ready.notify_all();

        if let State::Pending { handlers, waker } = previous {
            for handler in handlers {
                handler(&settlement);
            }
            if let Some(waker) = waker {
                waker.wake();
            }
        }
        true
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        if !self.shared.settled.load(Ordering::Acquire) {
            tracing::warn!("resolver dropped before settlement");
            self.settle(Settlement::Rejected(ErrorOutcome::new(DROPPED_MESSAGE)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    #[test]
    fn second_settlement_is_ignored() {
        let (promise, resolver) = Promise::pending();
        assert!(resolver.settle(Settlement::Resolved(json!(1))));
        assert!(!resolver.settle(Settlement::Rejected(ErrorOutcome::new("late"))));
        drop(resolver);
        assert_eq!(promise.wait(), Settlement::Resolved(json!(1)));
    }

    #[test]
    fn handlers_run_once_whether_attached_before_or_after() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (promise, resolver) = Promise::pending();

        let before = Arc::clone(&calls);
        promise.then(move |s| {
            assert!(s.is_resolved());
            before.fetch_add(1, Ordering::SeqCst);
        });
        resolver.resolve(json!("done"));

        let after = Arc::clone(&calls);
        promise.then(move |s| {
            assert_eq!(s.to_value(), json!("done"));
            after.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_resolver_rejects() {
        let (promise, resolver) = Promise::pending();
        drop(resolver);
        let settlement = promise.wait();
        assert_eq!(
            settlement,
            Settlement::Rejected(ErrorOutcome::new("Request ended without a response"))
        );
    }

    #[traced_test]
    #[test]
    fn dropped_resolver_is_logged() {
        let (promise, resolver) = Promise::pending();
        drop(resolver);
        assert!(!promise.wait().is_resolved());
        assert!(logs_contain("resolver dropped before settlement"));
    }

    #[test]
    fn panicking_worker_still_settles() {
        let (promise, resolver) = Promise::pending();
        let worker = std::thread::spawn(move || {
            let _resolver = resolver;
            panic!("worker failed");
        });
        assert!(worker.join().is_err());
        assert!(!promise.wait().is_resolved());
    }

    #[test]
    fn wait_blocks_until_another_thread_settles() {
        let (promise, resolver) = Promise::pending();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            resolver.reject(ErrorOutcome::new("boom"));
        });
        assert_eq!(promise.wait().to_value(), json!({ "error": "boom" }));
        worker.join().unwrap();
    }

    #[test]
    fn try_settlement_reflects_state() {
        let (promise, resolver) = Promise::pending();
        assert!(promise.try_settlement().is_none());
        assert!(!promise.is_settled());
        resolver.resolve(Value::Null);
        assert!(promise.is_settled());
        assert_eq!(promise.try_settlement(), Some(Settlement::Resolved(Value::Null)));
    }

    #[tokio::test]
    async fn promise_can_be_awaited() {
        let (promise, resolver) = Promise::pending();
        tokio::spawn(async move {
            resolver.resolve(json!({ "status": 200 }));
        });
        let value = promise.await.into_result().unwrap();
        assert_eq!(value["status"], 200);
    }

    #[test]
    fn rejected_constructor_is_settled() {
        let promise = Promise::rejected(ErrorOutcome::new("URL not set"));
        assert_eq!(
            promise.try_settlement(),
            Some(Settlement::Rejected(ErrorOutcome::new("URL not set")))
        );
    }
}
