//! Per-tick event queues.
//!
//! Systems hand data to each other through typed [`Events`] queues rather than
//! through short-lived entities. A queue is double-buffered: events sent
//! during tick *N* sit in the current buffer, the end-of-tick cleanup moves
//! them to the previous buffer, and the following cleanup drops whatever is
//! still unread. An event is therefore visible to its consumer from the moment
//! it is sent until the end of the next tick, and never longer.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Double-buffered queue for one event type.
#[derive(Debug)]
pub struct Events<T> {
    previous: Vec<T>,
    current: Vec<T>,
}

impl<T> Events<T> {
    pub fn new() -> Self {
        Self {
            previous: Vec::new(),
            current: Vec::new(),
        }
    }

    pub fn send(&mut self, event: T) {
        self.current.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = std::mem::take(&mut self.previous);
        out.append(&mut self.current);
        out
    }

    /// Look at pending events without consuming them, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.previous.iter().chain(self.current.iter())
    }

    pub fn len(&self) -> usize {
        self.previous.len() + self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty() && self.current.is_empty()
    }

    /// Retire one tick: unread events from the previous tick are dropped and
    /// this tick's events become the previous buffer. Returns how many were
    /// dropped.
    pub fn update(&mut self) -> usize {
        let dropped = self.previous.len();
        self.previous = std::mem::take(&mut self.current);
        dropped
    }
}

impl<T> Default for Events<T> {
    fn default() -> Self {
        Self::new()
    }
}

trait ErasedEvents: Any {
    fn update(&mut self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedEvents for Events<T> {
    fn update(&mut self) -> usize {
        Events::update(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All event queues of a world, keyed by event type.
#[derive(Default)]
pub(crate) struct EventRegistry {
    queues: HashMap<TypeId, Box<dyn ErasedEvents>>,
}

impl EventRegistry {
    pub(crate) fn get<T: 'static>(&self) -> Option<&Events<T>> {
        self.queues
            .get(&TypeId::of::<T>())
            .and_then(|q| q.as_any().downcast_ref::<Events<T>>())
    }

    pub(crate) fn get_or_create<T: 'static>(&mut self) -> &mut Events<T> {
        self.queues
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Events::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Events<T>>()
            .expect("event queue stored under the TypeId of its own type")
    }

    /// Retire one tick on every queue. Returns the number of dropped events.
    pub(crate) fn update_all(&mut self) -> usize {
        self.queues.values_mut().map(|q| q.update()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_survive_one_update() {
        let mut q = Events::new();
        q.send(1);
        assert_eq!(q.update(), 0);
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![1]);
        q.send(2);
        assert_eq!(q.drain(), vec![1, 2]);
        assert!(q.is_empty());
    }

    #[test]
    fn unread_events_dropped_after_second_update() {
        let mut q = Events::new();
        q.send("late");
        q.update();
        assert_eq!(q.update(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn registry_updates_every_queue() {
        let mut reg = EventRegistry::default();
        reg.get_or_create::<u8>().send(1);
        reg.get_or_create::<u16>().send(2);
        assert_eq!(reg.update_all(), 0);
        assert_eq!(reg.update_all(), 2);
        assert!(reg.get::<u8>().is_some_and(Events::is_empty));
        assert!(reg.get::<u32>().is_none());
    }
}
