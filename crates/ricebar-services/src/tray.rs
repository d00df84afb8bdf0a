//! Status notifier tray.

use std::rc::Rc;

use ricebar_runtime::{Observed, Property};

/// The tray host.
pub trait TrayService: Observed {
    fn items(&self) -> Vec<Rc<dyn TrayItem>>;
}

/// One application's tray entry.
pub trait TrayItem: Observed {
    fn id(&self) -> String;
    fn icon_name(&self) -> String;
    fn tooltip(&self) -> String;
    /// Primary activation, as on a left click.
    fn activate(&self);
}

pub const ITEMS: Property<dyn TrayService, Vec<Rc<dyn TrayItem>>> =
    Property::new("items", |t| t.items());

pub const ICON_NAME: Property<dyn TrayItem, String> =
    Property::new("icon-name", |i| i.icon_name());
pub const TOOLTIP: Property<dyn TrayItem, String> = Property::new("tooltip", |i| i.tooltip());
