//! Scoped event-listener registrations.
//!
//! A renderer attaches real handlers for whatever this registry reports as
//! active. Registrations are `Subscription` guards: dropping one, on any
//! exit path, deregisters it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    Scroll,
    Resize,
    Keyboard,
    Touch,
    /// Background scrolling is suppressed while held.
    ScrollLock,
}

#[derive(Debug, Clone, Default)]
pub struct Listeners {
    counts: Arc<Mutex<BTreeMap<ListenerKind, usize>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> MutexGuard<'_, BTreeMap<ListenerKind, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, kind: ListenerKind) -> Subscription {
        *self.counts().entry(kind).or_default() += 1;
        trace!(?kind, "listener attached");
        Subscription {
            kind,
            registry: self.clone(),
        }
    }

    pub fn count(&self, kind: ListenerKind) -> usize {
        self.counts().get(&kind).copied().unwrap_or(0)
    }

    pub fn is_active(&self, kind: ListenerKind) -> bool {
        self.count(kind) > 0
    }

    /// Kinds with at least one live registration, in a stable order.
    pub fn active(&self) -> Vec<ListenerKind> {
        self.counts()
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(kind, _)| *kind)
            .collect()
    }

    fn release(&self, kind: ListenerKind) {
        let mut counts = self.counts();
        if let Some(n) = counts.get_mut(&kind) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                counts.remove(&kind);
            }
        }
    }
}

#[must_use = "dropping a Subscription deregisters it immediately"]
#[derive(Debug)]
pub struct Subscription {
    kind: ListenerKind,
    registry: Listeners,
}

impl Subscription {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(self.kind);
        trace!(kind = ?self.kind, "listener detached");
    }
}

/// Everything attached for the lifetime of an open lightbox.
#[derive(Debug)]
pub struct LightboxSubscriptions {
    _keyboard: Subscription,
    _touch: Subscription,
    _scroll_lock: Subscription,
}

impl LightboxSubscriptions {
    pub fn acquire(listeners: &Listeners) -> Self {
        Self {
            _keyboard: listeners.subscribe(ListenerKind::Keyboard),
            _touch: listeners.subscribe(ListenerKind::Touch),
            _scroll_lock: listeners.subscribe(ListenerKind::ScrollLock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_drop_deregisters() {
        let listeners = Listeners::new();
        let scroll = listeners.subscribe(ListenerKind::Scroll);
        assert!(listeners.is_active(ListenerKind::Scroll));
        drop(scroll);
        assert!(!listeners.is_active(ListenerKind::Scroll));
        assert!(listeners.active().is_empty());
    }

    #[test]
    fn counts_nested_registrations() {
        let listeners = Listeners::new();
        let a = listeners.subscribe(ListenerKind::Resize);
        let b = listeners.subscribe(ListenerKind::Resize);
        assert_eq!(listeners.count(ListenerKind::Resize), 2);
        drop(a);
        assert!(listeners.is_active(ListenerKind::Resize));
        drop(b);
        assert_eq!(listeners.count(ListenerKind::Resize), 0);
    }

    #[test]
    fn lightbox_bundle_is_released_together() {
        let listeners = Listeners::new();
        let _scroll = listeners.subscribe(ListenerKind::Scroll);
        let bundle = LightboxSubscriptions::acquire(&listeners);
        assert_eq!(
            listeners.active(),
            vec![
                ListenerKind::Scroll,
                ListenerKind::Keyboard,
                ListenerKind::Touch,
                ListenerKind::ScrollLock
            ]
        );
        drop(bundle);
        assert_eq!(listeners.active(), vec![ListenerKind::Scroll]);
    }

    #[test]
    fn released_on_early_return() {
        fn attach_then_bail(listeners: &Listeners) -> Result<(), ()> {
            let _guard = listeners.subscribe(ListenerKind::Touch);
            Err(())
        }
        let listeners = Listeners::new();
        assert!(attach_then_bail(&listeners).is_err());
        assert!(!listeners.is_active(ListenerKind::Touch));
    }
}
