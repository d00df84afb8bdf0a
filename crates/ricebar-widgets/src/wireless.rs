//! Wireless network extractor.
//!
//! The radar spins while the device looks for a connection and stops when
//! wifi is switched off. The popover lists visible networks strongest
//! first; choosing one runs the configured connect command.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{Binding, Computed, Signal, Subscription, Teardown};
use ricebar_services::command::{CommandRunner, argv_with};
use ricebar_services::network::{self, AccessPoint, Internet, NetworkService, WifiDevice};
use tracing::{debug, info, warn};

use crate::error::{Result, WidgetError};
use crate::widget::{Revision, Widget};

pub const TOOLTIP: &str = "Wireless Network";

/// `nmcli d wifi connect <bssid>`.
#[must_use]
pub fn default_connect_command() -> Vec<String> {
    ["nmcli", "d", "wifi", "connect"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// CSS class of the radar overlay.
#[must_use]
pub fn radar_class(enabled: Option<bool>, internet: Option<Internet>) -> &'static str {
    if enabled == Some(false) {
        return "blockDisabled";
    }
    if internet == Some(Internet::Disconnected) {
        return "spin";
    }
    ""
}

/// Named networks, strongest first.
#[must_use]
pub fn sorted_access_points(mut access_points: Vec<AccessPoint>) -> Vec<AccessPoint> {
    access_points.retain(|ap| ap.ssid.as_deref().is_some_and(|s| !s.is_empty()));
    access_points.sort_by(|a, b| b.strength.cmp(&a.strength));
    access_points
}

/// Reactive state of one wifi device.
#[derive(Clone)]
pub struct WifiView {
    enabled: Binding<bool>,
    internet: Binding<Internet>,
    radar: Computed<&'static str>,
    listed: Binding<Vec<AccessPoint>>,
    access_points: Computed<Vec<AccessPoint>>,
    active: Binding<Option<AccessPoint>>,
}

impl WifiView {
    fn new(device: &Rc<dyn WifiDevice>) -> Self {
        let enabled = Binding::new(device, network::ENABLED);
        let internet = Binding::new(device, network::INTERNET);
        let radar = Computed::from2(&enabled, &internet, radar_class);
        let listed = Binding::new(device, network::ACCESS_POINTS);
        let access_points = Computed::from1(&listed, |aps| {
            sorted_access_points(aps.unwrap_or_default())
        });
        Self {
            enabled,
            internet,
            radar,
            listed,
            access_points,
            active: Binding::new(device, network::ACTIVE_ACCESS_POINT),
        }
    }

    #[must_use]
    pub fn radar_class(&self) -> &'static str {
        self.radar.get()
    }

    #[must_use]
    pub fn access_points(&self) -> Vec<AccessPoint> {
        self.access_points.get()
    }

    /// Whether `ap` is the network in use.
    #[must_use]
    pub fn is_active(&self, ap: &AccessPoint) -> bool {
        self.active
            .get()
            .flatten()
            .is_some_and(|active| active.bssid == ap.bssid)
    }

    fn dispose(&self) {
        self.radar.dispose();
        self.access_points.dispose();
        self.listed.dispose();
        self.enabled.dispose();
        self.internet.dispose();
        self.active.dispose();
    }
}

impl Teardown for WifiView {
    fn teardown(&self) {
        self.dispose();
    }
}

struct WirelessInner {
    device: Binding<Option<Rc<dyn WifiDevice>>>,
    view: Signal<Option<WifiView>>,
    revision: Revision,
    rebuild: RefCell<Subscription>,
    runner: Rc<dyn CommandRunner>,
    connect_command: Vec<String>,
    ev: EventLoop,
}

/// The wireless widget. Hidden while there is no wifi device.
#[derive(Clone)]
pub struct Wireless {
    inner: Rc<WirelessInner>,
}

impl Wireless {
    pub fn new(
        ev: &EventLoop,
        service: &Rc<dyn NetworkService>,
        runner: Rc<dyn CommandRunner>,
        connect_command: Vec<String>,
    ) -> Result<Self> {
        if connect_command.is_empty() {
            return Err(WidgetError::EmptyCommand);
        }
        let device = Binding::new(service, network::WIFI);
        let revision = Revision::default();
        let view = Signal::new(None);
        let rebuild = {
            let view = view.clone();
            let revision = revision.clone();
            device.subscribe(move |device| {
                let device = device.cloned().flatten();
                debug!(present = device.is_some(), "wifi device changed");
                install(&view, &revision, device.as_ref());
            })
        };
        install(&view, &revision, device.get().flatten().as_ref());
        Ok(Self {
            inner: Rc::new(WirelessInner {
                device,
                view,
                revision,
                rebuild: RefCell::new(rebuild),
                runner,
                connect_command,
                ev: ev.clone(),
            }),
        })
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.inner.view.with(Option::is_some)
    }

    /// The current device's view, if there is a device.
    #[must_use]
    pub fn view(&self) -> Option<WifiView> {
        self.inner.view.get()
    }

    /// Join `ap` with the connect command. Failures are logged.
    pub fn connect(&self, ap: &AccessPoint) {
        let argv = argv_with(&self.inner.connect_command, &[&ap.bssid]);
        let pending = self.inner.runner.run(&argv);
        let bssid = ap.bssid.clone();
        let ssid = ap.ssid.clone().unwrap_or_default();
        self.inner.ev.spawn_local(async move {
            match pending.await {
                Ok(_) => info!(%ssid, %bssid, "joined wireless network"),
                Err(err) => warn!(%ssid, %bssid, error = %err, "failed to join wireless network"),
            }
        });
    }
}

fn install(view: &Signal<Option<WifiView>>, revision: &Revision, device: Option<&Rc<dyn WifiDevice>>) {
    let next = device.map(WifiView::new);
    view.force_set(next.clone());
    match &next {
        Some(v) => {
            let owned: Box<dyn Teardown> = Box::new(v.clone());
            revision.track(vec![owned], &[&v.radar, &v.access_points, &v.active]);
        }
        None => revision.track(Vec::new(), &[]),
    }
}

impl Teardown for Wireless {
    fn teardown(&self) {
        self.inner.rebuild.borrow_mut().unsubscribe();
        self.inner.device.dispose();
        self.inner.revision.clear();
        self.inner.view.force_set(None);
        self.inner.view.dispose();
    }
}

impl Widget for Wireless {
    fn name(&self) -> &'static str {
        "wireless"
    }

    fn snapshot(&self) -> String {
        let Some(view) = self.view() else {
            return "hidden".to_string();
        };
        let networks: Vec<String> = view
            .access_points()
            .iter()
            .map(|ap| {
                let ssid = ap.ssid.as_deref().unwrap_or_default();
                if view.is_active(ap) {
                    format!("{ssid}*")
                } else {
                    ssid.to_string()
                }
            })
            .collect();
        format!("radar={:?} networks=[{}]", view.radar_class(), networks.join(","))
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        vec![self.inner.revision.watch(on_change)]
    }
}
