//! Status notifier tray.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_runtime::{Binding, Signal, Subscription, Teardown};
use ricebar_services::tray::{self, TrayItem, TrayService};
use tracing::debug;

use crate::widget::{Revision, Widget, WatchSource};

/// One tray icon.
#[derive(Clone)]
pub struct TrayEntry {
    item: Rc<dyn TrayItem>,
    id: String,
    icon: Binding<String>,
    tooltip: Binding<String>,
}

impl TrayEntry {
    fn new(item: Rc<dyn TrayItem>) -> Self {
        Self {
            id: item.id(),
            icon: Binding::new(&item, tray::ICON_NAME),
            tooltip: Binding::new(&item, tray::TOOLTIP),
            item,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn icon(&self) -> String {
        self.icon.get().unwrap_or_default()
    }

    #[must_use]
    pub fn tooltip(&self) -> String {
        self.tooltip.get().unwrap_or_default()
    }

    pub fn activate(&self) {
        self.item.activate();
    }
}

impl Teardown for TrayEntry {
    fn teardown(&self) {
        self.icon.dispose();
        self.tooltip.dispose();
    }
}

struct TrayInner {
    items: Binding<Vec<Rc<dyn TrayItem>>>,
    entries: Signal<Vec<TrayEntry>>,
    revision: Revision,
    rebuild: RefCell<Subscription>,
}

/// Every tray item, in the order the service lists them.
#[derive(Clone)]
pub struct Tray {
    inner: Rc<TrayInner>,
}

impl Tray {
    #[must_use]
    pub fn new(service: &Rc<dyn TrayService>) -> Self {
        let items = Binding::new(service, tray::ITEMS);
        let entries = Signal::new(Vec::new());
        let revision = Revision::default();
        let rebuild = {
            let entries = entries.clone();
            let revision = revision.clone();
            items.subscribe(move |items| {
                install(&entries, &revision, items.cloned().unwrap_or_default());
            })
        };
        install(&entries, &revision, items.get().unwrap_or_default());
        Self {
            inner: Rc::new(TrayInner {
                items,
                entries,
                revision,
                rebuild: RefCell::new(rebuild),
            }),
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<TrayEntry> {
        self.inner.entries.get()
    }

    /// Activate the item with `id`. Returns whether it exists.
    pub fn activate(&self, id: &str) -> bool {
        let entry = self.inner.entries.with(|e| e.iter().find(|e| e.id == id).cloned());
        match entry {
            Some(entry) => {
                entry.activate();
                true
            }
            None => {
                debug!(id, "activation of unknown tray item ignored");
                false
            }
        }
    }
}

fn install(entries: &Signal<Vec<TrayEntry>>, revision: &Revision, items: Vec<Rc<dyn TrayItem>>) {
    let next: Vec<TrayEntry> = items.into_iter().map(TrayEntry::new).collect();
    entries.force_set(next.clone());
    let mut sources: Vec<&dyn WatchSource> = Vec::with_capacity(next.len() * 2);
    for entry in &next {
        sources.push(&entry.icon);
        sources.push(&entry.tooltip);
    }
    let owned = next
        .iter()
        .map(|entry| Box::new(entry.clone()) as Box<dyn Teardown>)
        .collect();
    revision.track(owned, &sources);
}

impl Teardown for Tray {
    fn teardown(&self) {
        self.inner.rebuild.borrow_mut().unsubscribe();
        self.inner.items.dispose();
        self.inner.revision.clear();
        self.inner.entries.force_set(Vec::new());
        self.inner.entries.dispose();
    }
}

impl Widget for Tray {
    fn name(&self) -> &'static str {
        "tray"
    }

    fn snapshot(&self) -> String {
        self.entries()
            .iter()
            .map(|e| format!("{}({})", e.icon(), e.tooltip()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        vec![self.inner.revision.watch(on_change)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricebar_services::testing::{FakeTray, FakeTrayItem};

    fn widget() -> (Rc<FakeTray>, Tray) {
        let fake = FakeTray::new();
        let service: Rc<dyn TrayService> = fake.clone();
        (fake, Tray::new(&service))
    }

    #[test]
    fn lists_items_with_their_icons() {
        let (fake, widget) = widget();
        assert_eq!(widget.snapshot(), "");
        fake.add(FakeTrayItem::new("nm", "nm-signal-75", "Wi-Fi"));
        fake.add(FakeTrayItem::new("steam", "steam", "Steam"));
        assert_eq!(widget.snapshot(), "nm-signal-75(Wi-Fi) steam(Steam)");
    }

    #[test]
    fn item_changes_reach_the_widget() {
        let (fake, widget) = widget();
        let item = FakeTrayItem::new("nm", "nm-signal-75", "Wi-Fi");
        fake.add(Rc::clone(&item));
        let hits = Rc::new(std::cell::Cell::new(0));
        let h = Rc::clone(&hits);
        let _subs = widget.watch(Rc::new(move || h.set(h.get() + 1)));
        item.set_icon_name("nm-offline");
        assert_eq!(hits.get(), 1);
        assert_eq!(widget.entries()[0].icon(), "nm-offline");
    }

    #[test]
    fn removed_items_stop_reporting() {
        let (fake, widget) = widget();
        let item = FakeTrayItem::new("nm", "nm-signal-75", "Wi-Fi");
        fake.add(Rc::clone(&item));
        fake.remove("nm");
        let hits = Rc::new(std::cell::Cell::new(0));
        let h = Rc::clone(&hits);
        let _subs = widget.watch(Rc::new(move || h.set(h.get() + 1)));
        item.set_tooltip("gone");
        assert_eq!(hits.get(), 0);
        assert!(widget.entries().is_empty());
    }

    #[test]
    fn activation_reaches_the_item() {
        let (fake, widget) = widget();
        let item = FakeTrayItem::new("nm", "nm-signal-75", "Wi-Fi");
        fake.add(Rc::clone(&item));
        assert!(widget.activate("nm"));
        assert!(!widget.activate("missing"));
        assert_eq!(item.activations(), 1);
    }
}
