use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type SharedCallback<F> = Rc<RefCell<Box<F>>>;

struct Slots<F: ?Sized> {
    next_id: u64,
    entries: HashMap<u64, SharedCallback<F>>,
}

/// Unordered set of callbacks with O(1) add and remove.
///
/// Dispatch walks a snapshot, so callbacks may subscribe or dispose (including
/// themselves) while it runs. A callback disposed mid-dispatch is not called
/// again within that dispatch.
pub struct Registry<F: ?Sized> {
    slots: Rc<RefCell<Slots<F>>>,
}

impl<F: ?Sized + 'static> Registry<F> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: HashMap::new(),
            })),
        }
    }

    pub fn subscribe(&self, callback: Box<F>) -> Subscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.insert(id, Rc::new(RefCell::new(callback)));
            id
        };

        let weak = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                // Take the entry out first so the callback drops after the borrow ends.
                let removed = slots.borrow_mut().entries.remove(&id);
                drop(removed);
            }
        })
    }

    pub fn dispatch(&self, mut invoke: impl FnMut(&mut F)) {
        let snapshot: Vec<(u64, SharedCallback<F>)> = self
            .slots
            .borrow()
            .entries
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect();

        for (id, callback) in snapshot {
            if !self.slots.borrow().entries.contains_key(&id) {
                continue;
            }
            // A callback that re-enters its own registry is skipped on the inner pass.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                invoke(&mut **callback);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let removed: Vec<_> = self.slots.borrow_mut().entries.drain().collect();
        drop(removed);
    }
}

impl<F: ?Sized + 'static> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.slots.borrow().entries.len())
            .finish()
    }
}

/// Disposer handed out at subscribe time. Dropping it also disposes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Callback = dyn FnMut(&mut Vec<&'static str>);

    #[test]
    fn test_subscribe_and_dispose() {
        let registry: Registry<Callback> = Registry::new();
        let a = registry.subscribe(Box::new(|log| log.push("a")));
        let _b = registry.subscribe(Box::new(|log| log.push("b")));
        assert_eq!(registry.len(), 2);

        let mut log = Vec::new();
        registry.dispatch(|callback| callback(&mut log));
        log.sort();
        assert_eq!(log, vec!["a", "b"]);

        a.dispose();
        let mut log = Vec::new();
        registry.dispatch(|callback| callback(&mut log));
        assert_eq!(log, vec!["b"]);
    }

    #[test]
    fn test_drop_disposes() {
        let registry: Registry<Callback> = Registry::new();
        {
            let _subscription = registry.subscribe(Box::new(|_| {}));
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_self_dispose_during_dispatch() {
        let registry: Registry<dyn FnMut()> = Registry::new();
        let calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let subscription = registry.subscribe(Box::new({
            let calls = Rc::clone(&calls);
            let slot = Rc::clone(&slot);
            move || {
                calls.set(calls.get() + 1);
                if let Some(subscription) = slot.borrow_mut().take() {
                    subscription.dispose();
                }
            }
        }));
        *slot.borrow_mut() = Some(subscription);

        let other_calls = Rc::new(Cell::new(0));
        let _other = registry.subscribe(Box::new({
            let other_calls = Rc::clone(&other_calls);
            move || other_calls.set(other_calls.get() + 1)
        }));

        registry.dispatch(|callback| callback());
        registry.dispatch(|callback| callback());

        assert_eq!(calls.get(), 1);
        assert_eq!(other_calls.get(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_removed_peer_not_called_in_same_dispatch() {
        let registry: Registry<dyn FnMut()> = Registry::new();
        let victim_calls = Rc::new(Cell::new(0));
        let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        // Whichever runs first, the victim must not run after being disposed.
        let killer = registry.subscribe(Box::new({
            let victim_slot = Rc::clone(&victim_slot);
            move || {
                victim_slot.borrow_mut().take();
            }
        }));
        let victim = registry.subscribe(Box::new({
            let victim_calls = Rc::clone(&victim_calls);
            let victim_slot = Rc::clone(&victim_slot);
            move || {
                // Only counts while still subscribed.
                if victim_slot.borrow().is_some() {
                    victim_calls.set(victim_calls.get() + 1);
                }
            }
        }));
        *victim_slot.borrow_mut() = Some(victim);

        registry.dispatch(|callback| callback());
        registry.dispatch(|callback| callback());

        assert!(victim_calls.get() <= 1);
        assert_eq!(registry.len(), 1);
        drop(killer);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dispose_after_registry_dropped() {
        let registry: Registry<dyn FnMut()> = Registry::new();
        let subscription = registry.subscribe(Box::new(|| {}));
        drop(registry);
        subscription.dispose();
    }

    #[test]
    fn test_clear() {
        let registry: Registry<dyn FnMut()> = Registry::new();
        let subscription = registry.subscribe(Box::new(|| {}));
        registry.clear();
        assert!(registry.is_empty());
        subscription.dispose();
    }
}
