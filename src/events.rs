use std::sync::mpsc::{self, Receiver, Sender};

/// A minimal observer registry: every subscriber gets its own channel.
///
/// The rendering layer subscribes once per state category and drains its receiver on the UI
/// thread. Subscribers that dropped their receiver are pruned on the next emit.
#[derive(Debug)]
pub struct EventBus<E> {
    subscribers: Vec<Sender<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Send `event` to every live subscriber.
    pub fn emit(&mut self, event: E) {
        self.emit_with(|| event);
    }

    /// Like [`Self::emit`], but only builds the event if someone is listening.
    pub fn emit_with(&mut self, make: impl FnOnce() -> E) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = make();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events() {
        let mut bus = EventBus::<u32>::default();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.emit(7);
        assert_eq!(a.try_recv().ok(), Some(7));
        assert_eq!(b.try_recv().ok(), Some(7));
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut bus = EventBus::<u32>::default();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);
        bus.emit(1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.try_recv().ok(), Some(1));
    }

    #[test]
    fn emit_with_skips_construction_without_subscribers() {
        let mut bus = EventBus::<String>::default();
        let mut built = false;
        bus.emit_with(|| {
            built = true;
            "x".to_owned()
        });
        assert!(!built);
    }
}
