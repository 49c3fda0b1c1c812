//! Minimal single-threaded observer list.
//!
//! Backs every callback surface of the animation engine: per-animatable end
//! and loop notifications, per-target and group-level completion. Observers
//! run synchronously on the frame-stepped update thread.

use smallvec::SmallVec;

/// Token returned by [`Observable::add`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// An ordered list of observers notified with a shared payload.
pub struct Observable<T> {
    observers: SmallVec<[(u64, Callback<T>); 2]>,
    next_token: u64,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: SmallVec::new(),
            next_token: 0,
        }
    }

    /// Registers an observer; notification order is registration order.
    pub fn add(&mut self, callback: impl FnMut(&T) + 'static) -> ObserverToken {
        let token = self.next_token;
        self.next_token += 1;
        self.observers.push((token, Box::new(callback)));
        ObserverToken(token)
    }

    /// Removes a previously registered observer.
    pub fn remove(&mut self, token: ObserverToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != token.0);
        self.observers.len() != before
    }

    /// Invokes every observer with `data`.
    pub fn notify(&mut self, data: &T) {
        for (_, callback) in &mut self.observers {
            callback(data);
        }
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    #[must_use]
    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observers.len())
            .finish()
    }
}
