//! Change notifications.
//!
//! A [`Signal`] is a list of callbacks that an owner calls when something
//! about it changes. Group trees use one signal per kind of change and fire
//! it once before and once after every edit.
//!
//! Callbacks run synchronously, in the order they were connected, on the
//! thread that calls [`Signal::emit`]. The callback list is copied before the
//! first one runs, so a callback may connect or disconnect others on the same
//! signal; the change is seen by the next emission.
//!
//! ```
//! use zkanji_core::Signal;
//!
//! let renamed = Signal::<String>::new();
//! let id = renamed.connect(|name| println!("group renamed to {name}"));
//!
//! renamed.emit("Verbs".to_string());
//! assert!(renamed.disconnect(id));
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::SignalError;

new_key_type! {
    /// Handle of one connected callback, returned by [`Signal::connect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type Connections<Args> = Mutex<SlotMap<ConnectionId, Slot<Args>>>;

/// Callbacks taking `&Args`.
///
/// Events with several values use a tuple, for example
/// `Signal<(CategoryId, usize)>`; events with none use `Signal<()>`.
pub struct Signal<Args> {
    // Guards keep a weak handle to this table.
    connections: Arc<Connections<Args>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            blocked: AtomicBool::new(false),
        }
    }

    /// Adds `slot` to the end of the callback list.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Like [`connect`](Self::connect), but the callback is removed again
    /// when the returned guard goes away.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use zkanji_core::Signal;
    ///
    /// let added = Signal::<usize>::new();
    /// let total = Arc::new(AtomicUsize::new(0));
    ///
    /// let sum = total.clone();
    /// let guard = added.connect_scoped(move |&n| {
    ///     sum.fetch_add(n, Ordering::SeqCst);
    /// });
    /// added.emit(3);
    /// drop(guard);
    /// added.emit(5);
    ///
    /// assert_eq!(total.load(Ordering::SeqCst), 3);
    /// ```
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        let weak: Weak<Connections<Args>> = Arc::downgrade(&self.connections);
        ConnectionGuard {
            target: Some(Box::new(weak)),
            id,
        }
    }

    /// Removes one callback. `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// While blocked, [`emit`](Self::emit) drops its argument without
    /// calling anything.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Calls every connected callback with `&args`.
    #[tracing::instrument(skip_all, target = "zkanji_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "zkanji_core::signal", "blocked");
            return;
        }

        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: "zkanji_core::signal", slots = slots.len(), "emit");

        for slot in slots {
            slot(&args);
        }
    }
}

/// The callback table of some `Signal<Args>`, with `Args` erased.
trait ConnectionTarget: Send + Sync {
    fn remove(&self, id: ConnectionId) -> Result<(), SignalError>;
    fn as_any(&self) -> &dyn Any;
}

impl<Args: 'static> ConnectionTarget for Weak<Connections<Args>> {
    fn remove(&self, id: ConnectionId) -> Result<(), SignalError> {
        let connections = self.upgrade().ok_or(SignalError::SignalDropped)?;
        let removed = connections.lock().remove(id);
        removed.map(|_| ()).ok_or(SignalError::InvalidConnection)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Disconnects its callback when dropped.
///
/// Returned by [`Signal::connect_scoped`]. The signal may be dropped before
/// the guard.
pub struct ConnectionGuard {
    target: Option<Box<dyn ConnectionTarget>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the guarded callback is connected to `signal`.
    pub fn belongs_to<Args: 'static>(&self, signal: &Signal<Args>) -> bool {
        self.target
            .as_ref()
            .and_then(|t| t.as_any().downcast_ref::<Weak<Connections<Args>>>())
            .is_some_and(|weak| weak.as_ptr() == Arc::as_ptr(&signal.connections))
    }

    /// Disconnects immediately.
    ///
    /// [`SignalError::SignalDropped`] if the signal is gone,
    /// [`SignalError::InvalidConnection`] if the callback was already removed.
    pub fn disconnect(mut self) -> Result<(), SignalError> {
        match self.target.take() {
            Some(target) => target.remove(self.id),
            None => Err(SignalError::InvalidConnection),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            let _ = target.remove(self.id);
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("active", &self.target.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        signal.connect(move |value: &T| sink.lock().push(value.clone()));
        seen
    }

    #[test]
    fn test_every_emission_reaches_callback() {
        let added = Signal::<usize>::new();
        let seen = recorder(&added);

        added.emit(0);
        added.emit(7);

        assert_eq!(*seen.lock(), vec![0, 7]);
    }

    #[test]
    fn test_disconnected_callback_is_silent() {
        let removed = Signal::<usize>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = removed.connect(move |&pos| sink.lock().push(pos));

        removed.emit(4);
        assert!(removed.disconnect(id));
        assert!(!removed.disconnect(id));
        removed.emit(5);

        assert_eq!(*seen.lock(), vec![4]);
    }

    #[test]
    fn test_blocked_emissions_are_dropped() {
        let renamed = Signal::<String>::new();
        let seen = recorder(&renamed);

        renamed.emit("Nouns".into());
        renamed.set_blocked(true);
        assert!(renamed.is_blocked());
        renamed.emit("Hidden".into());
        renamed.set_blocked(false);
        renamed.emit("Verbs".into());

        assert_eq!(*seen.lock(), vec!["Nouns".to_string(), "Verbs".to_string()]);
    }

    #[test]
    fn test_callbacks_run_in_connection_order() {
        let reset = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..4 {
            let order = order.clone();
            reset.connect(move |_| order.lock().push(n));
        }

        reset.emit(());
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_disconnect_all_empties_list() {
        let reset = Signal::<()>::new();
        reset.connect(|_| {});
        reset.connect(|_| {});
        assert_eq!(reset.connection_count(), 2);

        reset.disconnect_all();
        assert_eq!(reset.connection_count(), 0);
    }

    #[test]
    fn test_guard_disconnects_on_drop() {
        let moved = Signal::<(usize, usize)>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let guard = moved.connect_scoped(move |&(from, to)| sink.lock().push((from, to)));
        assert!(guard.belongs_to(&moved));
        assert!(!guard.belongs_to(&Signal::<(usize, usize)>::new()));
        moved.emit((2, 0));
        drop(guard);
        moved.emit((0, 2));

        assert_eq!(*seen.lock(), vec![(2, 0)]);
        assert_eq!(moved.connection_count(), 0);
    }

    #[test]
    fn test_guard_outlives_signal() {
        let guard = {
            let signal = Signal::<usize>::new();
            signal.connect_scoped(|_| {})
        };
        assert_eq!(guard.disconnect(), Err(SignalError::SignalDropped));
    }

    #[test]
    fn test_guard_after_manual_disconnect() {
        let signal = Signal::<usize>::new();
        let guard = signal.connect_scoped(|_| {});
        assert!(signal.disconnect(guard.id()));
        assert_eq!(guard.disconnect(), Err(SignalError::InvalidConnection));
    }

    #[test]
    fn test_callback_may_disconnect_itself() {
        let signal = Arc::new(Signal::<usize>::new());
        let own_id = Arc::new(Mutex::new(None));
        let hits = Arc::new(Mutex::new(0));

        let weak = Arc::downgrade(&signal);
        let id_cell = own_id.clone();
        let counter = hits.clone();
        let id = signal.connect(move |_| {
            *counter.lock() += 1;
            if let (Some(signal), Some(id)) = (weak.upgrade(), *id_cell.lock()) {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(1);
        signal.emit(2);
        assert_eq!(*hits.lock(), 1);
    }
}
