//! Named-event dispatch.
//!
//! Components publish events by name and interested parties subscribe
//! handlers for the names they care about. Dispatch is synchronous and
//! runs handlers in subscription order.

/// An event that can be routed by name.
pub trait NamedEvent {
    /// Stable event name, e.g. `"theme-changed"`.
    fn name(&self) -> &'static str;
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Routes events to handlers subscribed under the event's name.
pub struct EventBus<E> {
    handlers: Vec<(SubscriptionId, &'static str, Handler<E>)>,
    next_id: u64,
}

impl<E: NamedEvent> EventBus<E> {
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register `handler` for events named `name`.
    pub fn subscribe(
        &mut self,
        name: &'static str,
        handler: impl FnMut(&E) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, name, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _, _)| *sub != id);
        self.handlers.len() != before
    }

    /// Deliver `event` to every handler subscribed to its name.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&mut self, event: &E) -> usize {
        let name = event.name();
        let mut delivered = 0;
        for (_, subscribed, handler) in &mut self.handlers {
            if *subscribed == name {
                handler(event);
                delivered += 1;
            }
        }
        tracing::trace!(event = name, delivered, "event emitted");
        delivered
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.handlers.iter().filter(|(_, n, _)| *n == name).count()
    }
}

impl<E: NamedEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    enum Ping {
        A(u32),
        B,
    }

    impl NamedEvent for Ping {
        fn name(&self) -> &'static str {
            match self {
                Self::A(_) => "a",
                Self::B => "b",
            }
        }
    }

    #[test]
    fn test_emit_reaches_only_matching_name() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe("a", move |ev: &Ping| {
            if let Ping::A(n) = ev {
                sink.borrow_mut().push(*n);
            }
        });

        assert_eq!(bus.emit(&Ping::A(7)), 1);
        assert_eq!(bus.emit(&Ping::B), 0);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&count);
        let id = bus.subscribe("b", move |_: &Ping| *sink.borrow_mut() += 1);

        bus.emit(&Ping::B);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&Ping::B);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count("b"), 0);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let order = Rc::new(RefCell::new(String::new()));
        let mut bus = EventBus::new();
        for tag in ['x', 'y', 'z'] {
            let sink = Rc::clone(&order);
            bus.subscribe("a", move |_: &Ping| sink.borrow_mut().push(tag));
        }
        bus.emit(&Ping::A(0));
        assert_eq!(order.borrow().as_str(), "xyz");
    }
}
