//! The face every widget shows the renderer.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_runtime::{BindingScope, Signal, Source, Subscription, Teardown};

/// A widget view-model as seen by a renderer.
///
/// `snapshot` is a one-line textual rendering of everything the widget
/// shows; `watch` reports when that rendering may have changed.
pub trait Widget: Teardown {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Everything the widget currently shows, on one line.
    fn snapshot(&self) -> String;

    /// Call `on_change` whenever [`snapshot`](Self::snapshot) may differ.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription>;
}

/// Change counter for widgets that rebuild their child nodes at run time.
///
/// Children are tracked through a [`BindingScope`] that is cleared on every
/// rebuild, so bindings of a vanished tray item or player stop listening.
#[derive(Clone, Default)]
pub(crate) struct Revision {
    counter: Signal<u64>,
    children: Rc<RefCell<BindingScope>>,
}

impl Revision {
    pub(crate) fn bump(&self) {
        self.counter.update(|n| *n += 1);
    }

    /// Drop the previous children and follow `sources` instead.
    pub(crate) fn track(&self, owned: Vec<Box<dyn Teardown>>, sources: &[&dyn WatchSource]) {
        let mut children = self.children.borrow_mut();
        children.clear();
        let counter = self.counter.clone();
        let on_change: Rc<dyn Fn()> = Rc::new(move || counter.update(|n| *n += 1));
        for source in sources {
            children.hold(source.watch_dyn(Rc::clone(&on_change)));
        }
        for node in owned {
            children.own(node);
        }
        drop(children);
        self.bump();
    }

    pub(crate) fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.counter.watch(on_change)
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> u64 {
        self.counter.get()
    }

    pub(crate) fn clear(&self) {
        self.children.borrow_mut().clear();
        self.counter.dispose();
    }
}

/// Object-safe slice of [`Source`] used to watch heterogeneous children.
pub(crate) trait WatchSource {
    fn watch_dyn(&self, on_change: Rc<dyn Fn()>) -> Subscription;
}

impl<S: Source> WatchSource for S {
    fn watch_dyn(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.watch(on_change)
    }
}

/// Watch every source in `sources` with the same callback.
pub(crate) fn watch_all(sources: &[&dyn WatchSource], on_change: &Rc<dyn Fn()>) -> Vec<Subscription> {
    sources
        .iter()
        .map(|source| source.watch_dyn(Rc::clone(on_change)))
        .collect()
}
