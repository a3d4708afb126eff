//! A lightweight, typed publish/subscribe channel.
//!
//! Each [`Notifier`] carries one category of state-change event for a data
//! source (sort changed, pagination changed, data requested, and so on).
//! Emission is synchronous: `emit` invokes every registered handler before
//! returning. A handler that panics is caught and logged without stopping
//! the remaining handlers.
//!
//! Notifiers are single-threaded by design. The handle is cheap to clone and
//! all clones share the same subscriber list; it is `!Send`, matching the
//! exclusive-owner threading model of the data source.
//!
//! # Basic Usage
//!
//! ```rust
//! use list_datasource::event::Notifier;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let notifier = Notifier::<String>::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let seen_in_handler = seen.clone();
//! let sub = notifier.subscribe(move |_reason| {
//!     seen_in_handler.set(seen_in_handler.get() + 1);
//! });
//!
//! notifier.emit(&"reload".to_string());
//! assert_eq!(seen.get(), 1);
//!
//! sub.unsubscribe();
//! notifier.emit(&"reload".to_string());
//! assert_eq!(seen.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use thiserror::Error;

/// Errors produced by the notifier's future adapter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifierError {
    /// The notifier was already completed when the future was created.
    #[error("notifier is already completed")]
    Completed,
}

/// Tuning options for a [`Notifier`].
#[derive(Debug, Clone, Default)]
pub struct NotifierOptions {
    /// Log subscribe/unsubscribe/emit lifecycle events at debug level.
    pub debug: bool,
    /// Subscriber count above which a leak warning is logged. The
    /// subscriber is still registered.
    pub max_subscribers: Option<usize>,
}

type Handler<T> = Rc<dyn Fn(&T)>;

struct Entry<T> {
    id: u64,
    handler: Handler<T>,
}

struct Inner<T> {
    subscribers: Vec<Entry<T>>,
    completed: bool,
    emission_count: u64,
    next_id: u64,
    options: NotifierOptions,
}

impl<T> Inner<T> {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|entry| entry.id != id);
        self.subscribers.len() != before
    }
}

/// A typed publish/subscribe channel with isolated handler failures.
///
/// See the [module documentation](self) for an overview. One notifier
/// instance exists per kind of state change on a
/// [`DataSource`](crate::datasource::DataSource).
pub struct Notifier<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Notifier<T> {
    /// Creates a notifier with default options.
    pub fn new() -> Self {
        Self::with_options(NotifierOptions::default())
    }

    /// Creates a notifier with the given options.
    ///
    /// ```rust
    /// use list_datasource::event::{Notifier, NotifierOptions};
    ///
    /// let notifier = Notifier::<i32>::with_options(NotifierOptions {
    ///     debug: true,
    ///     max_subscribers: Some(16),
    /// });
    /// assert_eq!(notifier.subscriber_count(), 0);
    /// ```
    pub fn with_options(options: NotifierOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                subscribers: Vec::new(),
                completed: false,
                emission_count: 0,
                next_id: 0,
                options,
            })),
        }
    }

    /// Registers a handler for every future emission.
    ///
    /// Returns a [`Subscription`] that can be used to unsubscribe. Dropping
    /// the subscription does *not* unsubscribe; the handler stays registered
    /// until [`Subscription::unsubscribe`] or [`Notifier::complete`].
    ///
    /// Subscribing to a completed notifier is a no-op and returns an inert
    /// subscription.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        if inner.completed {
            if inner.options.debug {
                tracing::warn!("subscribe on completed notifier ignored");
            }
            return Subscription {
                inner: Weak::new(),
                id: 0,
            };
        }
        if let Some(max) = inner.options.max_subscribers {
            if inner.subscribers.len() >= max {
                tracing::error!(
                    max,
                    current = inner.subscribers.len(),
                    "notifier subscriber limit reached, possible leak"
                );
            }
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push(Entry {
            id,
            handler: Rc::new(handler),
        });
        if inner.options.debug {
            tracing::debug!(total = inner.subscribers.len(), "notifier subscriber added");
        }
        Subscription {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Registers a handler that fires at most once, then unsubscribes
    /// itself.
    ///
    /// The self-removal is atomic with respect to the emission that
    /// triggered it: even if the handler re-emits on the same notifier, it
    /// will not run a second time.
    pub fn subscribe_once(&self, handler: impl Fn(&T) + 'static) -> Subscription<T>
    where
        T: 'static,
    {
        let fired = Rc::new(Cell::new(false));
        let own_id = Rc::new(Cell::new(0u64));
        let weak = Rc::downgrade(&self.inner);

        let subscription = self.subscribe({
            let own_id = Rc::clone(&own_id);
            move |value: &T| {
                if fired.replace(true) {
                    return;
                }
                handler(value);
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().remove(own_id.get());
                }
            }
        });
        own_id.set(subscription.id);
        subscription
    }

    /// Registers a handler that only runs when `predicate()` is true at
    /// emission time. The predicate is re-evaluated on every emission.
    ///
    /// ```rust
    /// use list_datasource::event::Notifier;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let notifier = Notifier::<i32>::new();
    /// let active = Rc::new(Cell::new(false));
    /// let hits = Rc::new(Cell::new(0));
    ///
    /// let (active_p, hits_h) = (active.clone(), hits.clone());
    /// notifier.subscribe_if(move || active_p.get(), move |_| hits_h.set(hits_h.get() + 1));
    ///
    /// notifier.emit(&1);
    /// active.set(true);
    /// notifier.emit(&2);
    /// assert_eq!(hits.get(), 1);
    /// ```
    pub fn subscribe_if(
        &self,
        predicate: impl Fn() -> bool + 'static,
        handler: impl Fn(&T) + 'static,
    ) -> Subscription<T> {
        self.subscribe(move |value| {
            if predicate() {
                handler(value);
            }
        })
    }

    /// Emits a value to every currently-registered handler.
    ///
    /// Handlers removed mid-emission (by an earlier handler, or by a `once`
    /// subscription) are skipped. A panicking handler is caught and logged;
    /// the remaining handlers still run and the panic never reaches the
    /// caller. Emitting on a completed notifier is a no-op.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Handler<T>)> = {
            let mut inner = self.inner.borrow_mut();
            if inner.completed {
                if inner.options.debug {
                    tracing::warn!("emit on completed notifier ignored");
                }
                return;
            }
            inner.emission_count += 1;
            if inner.options.debug {
                tracing::debug!(
                    emission = inner.emission_count,
                    subscribers = inner.subscribers.len(),
                    "notifier emit"
                );
            }
            inner
                .subscribers
                .iter()
                .map(|entry| (entry.id, Rc::clone(&entry.handler)))
                .collect()
        };

        for (id, handler) in snapshot {
            let still_registered = self
                .inner
                .borrow()
                .subscribers
                .iter()
                .any(|entry| entry.id == id);
            if !still_registered {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| handler(value))).is_err() {
                tracing::error!("notifier handler panicked during emission");
            }
        }
    }

    /// Completes the notifier, permanently releasing all subscribers.
    ///
    /// Idempotent. After completion, `subscribe` and `emit` are no-ops.
    pub fn complete(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.completed {
            return;
        }
        if inner.options.debug {
            tracing::debug!(
                emissions = inner.emission_count,
                released = inner.subscribers.len(),
                "notifier completed"
            );
        }
        inner.subscribers.clear();
        inner.completed = true;
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Whether any subscriber is registered.
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Whether the notifier has been completed.
    pub fn is_completed(&self) -> bool {
        self.inner.borrow().completed
    }

    /// Total number of emissions so far.
    pub fn emission_count(&self) -> u64 {
        self.inner.borrow().emission_count
    }

    /// Returns a non-owning handle for emitting without keeping the
    /// notifier (or its owner) alive.
    pub fn downgrade(&self) -> WeakNotifier<T> {
        WeakNotifier {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T: Clone> Notifier<T> {
    /// Returns a future that resolves with the next emitted value.
    ///
    /// If the notifier is already completed the future resolves immediately
    /// with [`NotifierError::Completed`].
    ///
    /// ```rust
    /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
    /// use list_datasource::event::Notifier;
    ///
    /// let notifier = Notifier::<i32>::new();
    /// let next = notifier.to_future();
    /// notifier.emit(&42);
    /// assert_eq!(next.await.unwrap(), 42);
    /// # });
    /// ```
    pub fn to_future(&self) -> NextEmission<T>
    where
        T: 'static,
    {
        let shared = Rc::new(RefCell::new(FutureState {
            value: None,
            waker: None,
        }));
        if self.is_completed() {
            shared.borrow_mut().value = Some(Err(NotifierError::Completed));
        } else {
            let state = Rc::clone(&shared);
            self.subscribe_once(move |value: &T| {
                let mut state = state.borrow_mut();
                state.value = Some(Ok(value.clone()));
                if let Some(waker) = state.waker.take() {
                    waker.wake();
                }
            });
        }
        NextEmission { shared }
    }
}

/// Handle returned by the `subscribe` family of methods.
///
/// Holds only a weak reference to the notifier, so keeping a subscription
/// around does not keep its notifier (or the owning data source) alive.
pub struct Subscription<T> {
    inner: Weak<RefCell<Inner<T>>>,
    id: u64,
}

impl<T> Subscription<T> {
    /// Removes the handler from the notifier.
    ///
    /// Safe to call after the notifier was completed or dropped; it simply
    /// does nothing then.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.borrow_mut();
            if inner.remove(self.id) && inner.options.debug {
                tracing::debug!(
                    total = inner.subscribers.len(),
                    "notifier subscriber removed"
                );
            }
        }
    }

    /// Whether the handler is still registered.
    pub fn is_active(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| {
                inner
                    .borrow()
                    .subscribers
                    .iter()
                    .any(|entry| entry.id == self.id)
            })
            .unwrap_or(false)
    }
}

/// Non-owning emission handle produced by [`Notifier::downgrade`].
///
/// Used for back-references (a field descriptor emitting into its owning
/// data source) without creating an ownership cycle. Emitting through a
/// handle whose notifier is gone is a no-op.
pub struct WeakNotifier<T> {
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Clone for WeakNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakNotifier<T> {
    /// Creates a handle that is never attached to a notifier.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// Upgrades back to a full notifier handle, if it is still alive.
    pub fn upgrade(&self) -> Option<Notifier<T>> {
        self.inner.upgrade().map(|inner| Notifier { inner })
    }

    /// Emits through the underlying notifier if it is still alive.
    pub fn emit(&self, value: &T) {
        if let Some(notifier) = self.upgrade() {
            notifier.emit(value);
        }
    }
}

struct FutureState<T> {
    value: Option<Result<T, NotifierError>>,
    waker: Option<Waker>,
}

/// Future returned by [`Notifier::to_future`].
pub struct NextEmission<T> {
    shared: Rc<RefCell<FutureState<T>>>,
}

impl<T> Future for NextEmission<T> {
    type Output = Result<T, NotifierError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.borrow_mut();
        match state.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn emit_reaches_all_subscribers() {
        let notifier = Notifier::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        notifier.subscribe(move |v| log_a.borrow_mut().push(("a", *v)));
        let log_b = Rc::clone(&log);
        notifier.subscribe(move |v| log_b.borrow_mut().push(("b", *v)));

        notifier.emit(&1);
        notifier.emit(&2);

        assert_eq!(
            *log.borrow(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
        assert_eq!(notifier.emission_count(), 2);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));

        let hits_h = Rc::clone(&hits);
        let sub = notifier.subscribe(move |_| hits_h.set(hits_h.get() + 1));
        assert!(sub.is_active());
        assert_eq!(notifier.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.emit(&1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn panicking_handler_does_not_stop_emission() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));

        notifier.subscribe(|_| panic!("boom"));
        let hits_h = Rc::clone(&hits);
        notifier.subscribe(move |_| hits_h.set(hits_h.get() + 1));

        // Quiet the default hook while the expected panic is caught.
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        notifier.emit(&1);
        std::panic::set_hook(hook);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscribe_once_fires_exactly_once() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));

        let hits_h = Rc::clone(&hits);
        notifier.subscribe_once(move |_| hits_h.set(hits_h.get() + 1));

        notifier.emit(&1);
        notifier.emit(&2);
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn subscribe_once_is_atomic_under_reentrant_emit() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));

        let hits_h = Rc::clone(&hits);
        let reentrant = notifier.clone();
        notifier.subscribe_once(move |v| {
            hits_h.set(hits_h.get() + 1);
            if *v == 1 {
                reentrant.emit(&2);
            }
        });

        notifier.emit(&1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn mid_emission_unsubscribe_skips_later_handler() {
        let notifier = Notifier::<i32>::new();
        let victim_hits = Rc::new(Cell::new(0));
        let victim_slot: Rc<RefCell<Option<Subscription<i32>>>> = Rc::new(RefCell::new(None));

        // The first handler removes the second before it gets its turn.
        let slot = Rc::clone(&victim_slot);
        notifier.subscribe(move |_| {
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let victim_hits_h = Rc::clone(&victim_hits);
        *victim_slot.borrow_mut() =
            Some(notifier.subscribe(move |_| victim_hits_h.set(victim_hits_h.get() + 1)));

        notifier.emit(&1);
        assert_eq!(victim_hits.get(), 0);
    }

    #[test]
    fn complete_is_terminal_and_idempotent() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));

        let hits_h = Rc::clone(&hits);
        notifier.subscribe(move |_| hits_h.set(hits_h.get() + 1));

        notifier.complete();
        notifier.complete();
        assert!(notifier.is_completed());
        assert_eq!(notifier.subscriber_count(), 0);

        notifier.emit(&1);
        assert_eq!(hits.get(), 0);

        let inert = notifier.subscribe(|_| {});
        assert!(!inert.is_active());
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn max_subscribers_warns_but_still_registers() {
        let notifier = Notifier::<i32>::with_options(NotifierOptions {
            debug: false,
            max_subscribers: Some(1),
        });
        notifier.subscribe(|_| {});
        notifier.subscribe(|_| {});
        assert_eq!(notifier.subscriber_count(), 2);
    }

    #[test]
    fn weak_notifier_emits_only_while_alive() {
        let notifier = Notifier::<i32>::new();
        let hits = Rc::new(Cell::new(0));
        let hits_h = Rc::clone(&hits);
        notifier.subscribe(move |_| hits_h.set(hits_h.get() + 1));

        let weak = notifier.downgrade();
        weak.emit(&1);
        assert_eq!(hits.get(), 1);

        drop(notifier);
        weak.emit(&2);
        assert_eq!(hits.get(), 1);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn to_future_resolves_with_next_value() {
        let notifier = Notifier::<String>::new();
        let next = notifier.to_future();
        notifier.emit(&"first".to_string());
        notifier.emit(&"second".to_string());
        assert_eq!(next.await.unwrap(), "first");
    }

    #[tokio::test]
    async fn to_future_rejects_when_completed() {
        let notifier = Notifier::<i32>::new();
        notifier.complete();
        assert_eq!(
            notifier.to_future().await.unwrap_err(),
            NotifierError::Completed
        );
    }
}
