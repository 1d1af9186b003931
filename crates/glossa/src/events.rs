//! Error/event channel.
//!
//! Content-related failures are reported here instead of being thrown across
//! the batch-resolve boundary. Listeners are registered with an optional
//! kind filter (`None` receives everything) and removed by handle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glossa_locale::Language;
use glossa_tree::{Error, EventKind};

/// One reported failure.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    /// The language being fetched, parsed or resolved, when known.
    pub lang: Option<Language>,
    pub error: Error,
}

/// Removal token returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

struct ListenerSlot {
    id: u64,
    filter: Option<EventKind>,
    callback: Rc<dyn Fn(&Event)>,
}

#[derive(Default)]
pub(crate) struct Listeners {
    slots: RefCell<Vec<ListenerSlot>>,
    next: Cell<u64>,
}

impl Listeners {
    pub(crate) fn add(
        &self,
        filter: Option<EventKind>,
        callback: Rc<dyn Fn(&Event)>,
    ) -> ListenerHandle {
        let id = self.next.get();
        self.next.set(id + 1);
        self.slots.borrow_mut().push(ListenerSlot {
            id,
            filter,
            callback,
        });
        ListenerHandle(id)
    }

    pub(crate) fn remove(&self, handle: ListenerHandle) {
        self.slots.borrow_mut().retain(|slot| slot.id != handle.0);
    }

    pub(crate) fn emit(&self, event: &Event) {
        // Snapshot the matching callbacks so a listener can add or remove
        // listeners while being notified.
        let matching: Vec<Rc<dyn Fn(&Event)>> = self
            .slots
            .borrow()
            .iter()
            .filter(|slot| slot.filter.map_or(true, |kind| kind == event.kind))
            .map(|slot| Rc::clone(&slot.callback))
            .collect();

        for callback in matching {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn event(kind: EventKind) -> Event {
        Event {
            kind,
            lang: None,
            error: Error::Unresolved,
        }
    }

    #[test]
    fn filtered_and_wildcard_listeners() {
        let listeners = Listeners::default();
        let seen: Rc<RefCell<Vec<(&'static str, EventKind)>>> = Rc::default();

        let seen_parse = Rc::clone(&seen);
        listeners.add(
            Some(EventKind::ParserError),
            Rc::new(move |e| seen_parse.borrow_mut().push(("parse", e.kind))),
        );
        let seen_all = Rc::clone(&seen);
        listeners.add(
            None,
            Rc::new(move |e| seen_all.borrow_mut().push(("all", e.kind))),
        );

        listeners.emit(&event(EventKind::ParserError));
        listeners.emit(&event(EventKind::FetchError));

        assert_eq!(
            *seen.borrow(),
            vec![
                ("parse", EventKind::ParserError),
                ("all", EventKind::ParserError),
                ("all", EventKind::FetchError),
            ]
        );
    }

    #[test]
    fn removal_by_handle() {
        let listeners = Listeners::default();
        let seen: Rc<RefCell<u32>> = Rc::default();

        let seen2 = Rc::clone(&seen);
        let handle = listeners.add(None, Rc::new(move |_| *seen2.borrow_mut() += 1));

        listeners.emit(&event(EventKind::ResolveError));
        listeners.remove(handle);
        listeners.emit(&event(EventKind::ResolveError));

        assert_eq!(*seen.borrow(), 1);
    }
}
