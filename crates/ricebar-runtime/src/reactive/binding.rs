#![forbid(unsafe_code)]

//! Property bindings and scoped teardown.
//!
//! A [`Binding<T>`] follows one [`Property`] of an [`Observed`] object. It
//! re-reads the property each time the object announces it and re-emits the
//! (optionally transformed) value, even when the value did not change: the
//! service decided something happened, and presentation may depend on it.
//!
//! A binding holds its object weakly. Once the object is gone the binding
//! keeps its last value and goes quiet.
//!
//! [`BindingScope`] collects subscriptions and owned reactive nodes for one
//! widget and releases them together.
//!
//! # Failure Modes
//!
//! - **Transform fails** ([`Binding::try_map`]): the error is logged at warn
//!   level and the binding keeps its previous value. No notification is sent.
//! - **Object dropped**: later announcements cannot reach the binding; its
//!   value is frozen.

use std::fmt::Display;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::notifier::{Observed, Property};
use super::signal::{Signal, Subscription};
use super::source::Source;

/// Something a [`BindingScope`] can release.
pub trait Teardown {
    /// Release every resource and subscription held.
    fn teardown(&self);
}

impl<N: Teardown + ?Sized> Teardown for Box<N> {
    fn teardown(&self) {
        (**self).teardown();
    }
}

struct BindingInner<T> {
    property: &'static str,
    value: Signal<Option<T>>,
    subscription: std::cell::RefCell<Subscription>,
}

/// A live view of one property of an observed object.
///
/// Cloning a `Binding` yields another handle to the same binding.
pub struct Binding<T> {
    inner: Rc<BindingInner<T>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("property", &self.inner.property)
            .field("value", &self.inner.value)
            .finish()
    }
}

impl<T: Clone + 'static> Binding<T> {
    /// Follow `property` of `object` as-is.
    pub fn new<S>(object: &Rc<S>, property: Property<S, T>) -> Self
    where
        S: Observed + ?Sized + 'static,
    {
        Self::build(object, property.name(), move |obj: &S| {
            Ok::<T, std::convert::Infallible>(property.read(obj))
        })
    }

    /// Follow `property` of `object` through `transform`.
    pub fn map<S, R>(
        object: &Rc<S>,
        property: Property<S, R>,
        transform: impl Fn(R) -> T + 'static,
    ) -> Self
    where
        S: Observed + ?Sized + 'static,
        R: 'static,
    {
        Self::build(object, property.name(), move |obj: &S| {
            Ok::<T, std::convert::Infallible>(transform(property.read(obj)))
        })
    }

    /// Follow `property` of `object` through a fallible `transform`.
    ///
    /// A failing transform leaves the previous value in place.
    pub fn try_map<S, R, E>(
        object: &Rc<S>,
        property: Property<S, R>,
        transform: impl Fn(R) -> Result<T, E> + 'static,
    ) -> Self
    where
        S: Observed + ?Sized + 'static,
        R: 'static,
        E: Display,
    {
        Self::build(object, property.name(), move |obj: &S| {
            transform(property.read(obj))
        })
    }

    fn build<S, E>(
        object: &Rc<S>,
        property: &'static str,
        read: impl Fn(&S) -> Result<T, E> + 'static,
    ) -> Self
    where
        S: Observed + ?Sized + 'static,
        E: Display,
    {
        let initial = match read(object.as_ref()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(property, error = %err, "binding transform failed on first read");
                None
            }
        };
        let value = Signal::new(initial);
        let weak: Weak<S> = Rc::downgrade(object);
        let target = value.clone();
        let subscription = object.notifier().connect(property, move || {
            let Some(object) = weak.upgrade() else {
                debug!(property, "bound object dropped; ignoring change");
                return;
            };
            match read(object.as_ref()) {
                Ok(next) => target.force_set(Some(next)),
                Err(err) => {
                    warn!(property, error = %err, "binding transform failed; keeping previous value");
                }
            }
        });
        Self {
            inner: Rc::new(BindingInner {
                property,
                value,
                subscription: std::cell::RefCell::new(subscription),
            }),
        }
    }

    /// The latest value, or `None` if the first read failed and no
    /// successful read has happened since.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner.value.get()
    }

    /// The latest value, or `fallback`.
    #[must_use]
    pub fn get_or(&self, fallback: T) -> T {
        self.get().unwrap_or(fallback)
    }

    /// Name of the followed property.
    #[must_use]
    pub fn property(&self) -> &'static str {
        self.inner.property
    }

    /// Run `callback` after every re-emission.
    pub fn subscribe(&self, callback: impl Fn(Option<&T>) + 'static) -> Subscription {
        self.inner.value.subscribe(move |v| callback(v.as_ref()))
    }

    /// Number of emissions so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.value.version()
    }

    /// Disconnect from the object and drop all subscribers.
    pub fn dispose(&self) {
        self.inner.subscription.borrow_mut().unsubscribe();
        self.inner.value.dispose();
    }
}

impl<T: Clone + 'static> Source for Binding<T> {
    type Value = T;

    fn latest(&self) -> Option<T> {
        self.get()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.inner.value.subscribe(move |_| on_change())
    }
}

impl<T: Clone + 'static> Teardown for Binding<T> {
    fn teardown(&self) {
        self.dispose();
    }
}

/// Collects a widget's subscriptions and reactive nodes for joint release.
///
/// Release happens in reverse order of registration, on [`clear`] or drop.
///
/// [`clear`]: BindingScope::clear
#[derive(Default)]
pub struct BindingScope {
    entries: Vec<ScopeEntry>,
}

enum ScopeEntry {
    Subscription(Subscription),
    Node(Box<dyn Teardown>),
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `subscription` alive until the scope is released.
    pub fn hold(&mut self, subscription: Subscription) {
        self.entries.push(ScopeEntry::Subscription(subscription));
    }

    /// Tear `node` down when the scope is released.
    pub fn own(&mut self, node: impl Teardown + 'static) {
        self.entries.push(ScopeEntry::Node(Box::new(node)));
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release everything, newest first.
    pub fn clear(&mut self) {
        while let Some(entry) = self.entries.pop() {
            match entry {
                ScopeEntry::Subscription(sub) => drop(sub),
                ScopeEntry::Node(node) => node.teardown(),
            }
        }
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::notifier::Notifier;
    use std::cell::{Cell, RefCell};

    struct Device {
        notifier: Notifier,
        level: Cell<i64>,
    }

    impl Observed for Device {
        fn notifier(&self) -> &Notifier {
            &self.notifier
        }
    }

    impl Device {
        fn new(level: i64) -> Rc<Self> {
            Rc::new(Self {
                notifier: Notifier::new(),
                level: Cell::new(level),
            })
        }

        fn set_level(&self, level: i64) {
            self.level.set(level);
            self.notifier.notify("level");
        }
    }

    const LEVEL: Property<Device, i64> = Property::new("level", |d| d.level.get());

    #[test]
    fn binding_reads_initial_value() {
        let device = Device::new(3);
        let binding = Binding::new(&device, LEVEL);
        assert_eq!(binding.get(), Some(3));
        assert_eq!(binding.property(), "level");
    }

    #[test]
    fn binding_follows_announcements() {
        let device = Device::new(3);
        let binding = Binding::map(&device, LEVEL, |l| l * 10);
        device.set_level(4);
        assert_eq!(binding.get(), Some(40));
    }

    #[test]
    fn binding_re_emits_unchanged_values() {
        let device = Device::new(3);
        let binding = Binding::new(&device, LEVEL);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = binding.subscribe(move |_| h.set(h.get() + 1));
        device.set_level(3);
        device.set_level(3);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn failing_transform_keeps_previous_value() {
        let device = Device::new(2);
        let binding = Binding::try_map(&device, LEVEL, |l| {
            if l < 0 { Err("negative level") } else { Ok(l as u32) }
        });
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = binding.subscribe(move |_| h.set(h.get() + 1));

        device.set_level(-1);
        assert_eq!(binding.get(), Some(2));
        assert_eq!(hits.get(), 0);

        device.set_level(7);
        assert_eq!(binding.get(), Some(7));
    }

    #[test]
    fn failing_first_read_yields_none() {
        let device = Device::new(-5);
        let binding: Binding<u32> =
            Binding::try_map(&device, LEVEL, |l| u32::try_from(l).map_err(|e| e.to_string()));
        assert_eq!(binding.get(), None);
        assert_eq!(binding.get_or(0), 0);
    }

    #[test]
    fn binding_outlives_object_quietly() {
        let device = Device::new(1);
        let binding = Binding::new(&device, LEVEL);
        drop(device);
        assert_eq!(binding.get(), Some(1));
    }

    #[test]
    fn dispose_disconnects_from_object() {
        let device = Device::new(1);
        let binding = Binding::new(&device, LEVEL);
        binding.dispose();
        assert_eq!(device.notifier.handler_count("level"), 0);
        device.set_level(9);
        assert_eq!(binding.get(), Some(1));
    }

    #[test]
    fn scope_releases_in_reverse_order() {
        struct Named(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl Teardown for Named {
            fn teardown(&self) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scope = BindingScope::new();
        scope.own(Named("first", Rc::clone(&order)));
        scope.own(Named("second", Rc::clone(&order)));
        assert_eq!(scope.len(), 2);
        drop(scope);
        assert_eq!(*order.borrow(), vec!["second", "first"]);
    }

    #[test]
    fn scope_drops_held_subscriptions() {
        let device = Device::new(1);
        let binding = Binding::new(&device, LEVEL);
        let mut scope = BindingScope::new();
        scope.hold(binding.subscribe(|_| {}));
        scope.own(binding.clone());
        scope.clear();
        assert!(scope.is_empty());
        assert_eq!(device.notifier.handler_count("level"), 0);
    }
}
