#![forbid(unsafe_code)]

//! Named-property change notification for service objects.
//!
//! System services (battery, network, audio, ...) expose plain getters and
//! announce changes by property name through a [`Notifier`]. A [`Property`]
//! pairs such a name with the getter that reads it, so a
//! [`Binding`](super::Binding) can re-read exactly one property whenever it is
//! announced.
//!
//! # Invariants
//!
//! 1. Handlers only see notifications for the property they connected to.
//! 2. Handlers run in connection order, outside any notifier borrow, inside a
//!    batch scope.
//! 3. Dropping the returned [`Subscription`] disconnects the handler.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::batch::BatchScope;
use super::signal::Subscription;

type Handler = dyn Fn();

/// Per-object registry of property change handlers.
#[derive(Default)]
pub struct Notifier {
    handlers: RefCell<Vec<(&'static str, Weak<Handler>)>>,
}

impl Notifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` whenever `property` is announced.
    pub fn connect(&self, property: &'static str, handler: impl Fn() + 'static) -> Subscription {
        let strong: Rc<Handler> = Rc::new(handler);
        self.handlers
            .borrow_mut()
            .push((property, Rc::downgrade(&strong)));
        Subscription::new(strong)
    }

    /// Announce that `property` changed.
    pub fn notify(&self, property: &str) {
        let handlers: Vec<Rc<Handler>> = {
            let mut all = self.handlers.borrow_mut();
            all.retain(|(_, w)| w.strong_count() > 0);
            all.iter()
                .filter(|(name, _)| *name == property)
                .filter_map(|(_, w)| w.upgrade())
                .collect()
        };
        trace!(property, handlers = handlers.len(), "property changed");
        if handlers.is_empty() {
            return;
        }
        let _scope = BatchScope::new();
        for handler in handlers {
            handler();
        }
    }

    /// Number of live handlers for `property`.
    #[must_use]
    pub fn handler_count(&self, property: &str) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|(name, w)| *name == property && w.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, w)| w.strong_count() > 0)
            .count();
        f.debug_struct("Notifier").field("handlers", &live).finish()
    }
}

/// An object that announces property changes.
pub trait Observed {
    /// The object's change notifier.
    fn notifier(&self) -> &Notifier;
}

/// A named, readable property of an observed object.
///
/// Properties are plain data and are usually declared as associated consts
/// next to the service trait they read:
///
/// ```
/// use ricebar_runtime::reactive::{Notifier, Observed, Property};
///
/// struct Speaker {
///     notifier: Notifier,
///     volume: f64,
/// }
///
/// impl Observed for Speaker {
///     fn notifier(&self) -> &Notifier {
///         &self.notifier
///     }
/// }
///
/// const VOLUME: Property<Speaker, f64> = Property::new("volume", |s| s.volume);
///
/// let speaker = Speaker { notifier: Notifier::new(), volume: 0.4 };
/// assert_eq!(VOLUME.name(), "volume");
/// assert_eq!(VOLUME.read(&speaker), 0.4);
/// ```
pub struct Property<S: ?Sized, T> {
    name: &'static str,
    read: fn(&S) -> T,
}

impl<S: ?Sized, T> Property<S, T> {
    /// Declare a property.
    #[must_use]
    pub const fn new(name: &'static str, read: fn(&S) -> T) -> Self {
        Self { name, read }
    }

    /// Name announced through the object's notifier.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Read the current value from `object`.
    pub fn read(&self, object: &S) -> T {
        (self.read)(object)
    }
}

impl<S: ?Sized, T> Clone for Property<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized, T> Copy for Property<S, T> {}

impl<S: ?Sized, T> std::fmt::Debug for Property<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Property").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn notify_targets_named_property_only() {
        let notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = notifier.connect("percentage", move || h.set(h.get() + 1));

        notifier.notify("charging");
        assert_eq!(hits.get(), 0);
        notifier.notify("percentage");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropped_handler_is_disconnected() {
        let notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = notifier.connect("volume", move || h.set(h.get() + 1));
        assert_eq!(notifier.handler_count("volume"), 1);
        drop(sub);
        notifier.notify("volume");
        assert_eq!(hits.get(), 0);
        assert_eq!(notifier.handler_count("volume"), 0);
    }

    #[test]
    fn handler_may_connect_during_notify() {
        let notifier = Rc::new(Notifier::new());
        let late: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let n = Rc::clone(&notifier);
        let l = Rc::clone(&late);
        let _sub = notifier.connect("x", move || {
            *l.borrow_mut() = Some(n.connect("x", || {}));
        });
        notifier.notify("x");
        assert_eq!(notifier.handler_count("x"), 2);
    }
}
