//! In-memory fakes of every service.
//!
//! Each fake keeps its state in cells and announces changes through its
//! [`Notifier`] exactly as a real service would, so widgets can be driven
//! from tests and from the headless binary. Setters notify even when the
//! value is unchanged; call [`Notifier::notify`] directly through
//! `announce` to simulate a spurious notification.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use ricebar_runtime::{Notifier, Observed, RuntimeError};

use crate::audio::{AudioService, Speaker};
use crate::battery::{BatteryService, BatteryState};
use crate::command::{CommandError, CommandRunner};
use crate::inhibit::{InhibitKind, InhibitManager};
use crate::media::{MediaService, PlaybackStatus, Player};
use crate::network::{AccessPoint, Internet, NetworkService, WifiDevice};
use crate::power::{self, PowerProfileService};
use crate::tray::{TrayItem, TrayService};
use crate::workspaces::{Client, Workspace, WorkspaceService};

macro_rules! observed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Observed for $ty {
                fn notifier(&self) -> &Notifier {
                    &self.notifier
                }
            }

            impl $ty {
                /// Announce `property` without changing anything.
                pub fn announce(&self, property: &str) {
                    self.notifier.notify(property);
                }
            }
        )*
    };
}

observed!(
    FakeBattery,
    FakePowerProfiles,
    FakeNetwork,
    FakeWifi,
    FakeAudio,
    FakeSpeaker,
    FakeWorkspaces,
    FakeTray,
    FakeTrayItem,
    FakeMedia,
    FakePlayer,
);

// ── Battery ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeBattery {
    notifier: Notifier,
    present: Cell<bool>,
    percentage: Cell<f64>,
    state: Cell<BatteryState>,
}

impl FakeBattery {
    pub fn new(percentage: f64, state: BatteryState) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            present: Cell::new(true),
            percentage: Cell::new(percentage),
            state: Cell::new(state),
        })
    }

    pub fn set_percentage(&self, percentage: f64) {
        self.percentage.set(percentage);
        self.notifier.notify("percentage");
    }

    pub fn set_state(&self, state: BatteryState) {
        self.state.set(state);
        self.notifier.notify("state");
    }

    pub fn set_present(&self, present: bool) {
        self.present.set(present);
        self.notifier.notify("is-present");
    }
}

impl BatteryService for FakeBattery {
    fn is_present(&self) -> bool {
        self.present.get()
    }

    fn percentage(&self) -> f64 {
        self.percentage.get()
    }

    fn state(&self) -> BatteryState {
        self.state.get()
    }
}

// ── Power profiles ───────────────────────────────────────────────────

/// Applies a requested profile when the request future is polled, unless
/// told to reject it.
#[derive(Debug)]
pub struct FakePowerProfiles {
    notifier: Notifier,
    me: Weak<FakePowerProfiles>,
    profiles: RefCell<Vec<String>>,
    active: RefCell<String>,
    reject: Cell<bool>,
    requests: RefCell<Vec<String>>,
}

impl FakePowerProfiles {
    /// The usual three profiles, starting on `balanced`.
    pub fn new() -> Rc<Self> {
        Self::with_profiles(
            &[power::POWER_SAVER, power::BALANCED, power::PERFORMANCE],
            power::BALANCED,
        )
    }

    pub fn with_profiles(profiles: &[&str], active: &str) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            notifier: Notifier::new(),
            me: me.clone(),
            profiles: RefCell::new(profiles.iter().map(|p| (*p).to_string()).collect()),
            active: RefCell::new(active.to_string()),
            reject: Cell::new(false),
            requests: RefCell::new(Vec::new()),
        })
    }

    /// Make every later request fail.
    pub fn reject_requests(&self, reject: bool) {
        self.reject.set(reject);
    }

    /// Change the active profile from the daemon's side.
    pub fn apply(&self, profile: &str) {
        *self.active.borrow_mut() = profile.to_string();
        self.notifier.notify("active-profile");
    }

    /// Every profile requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl PowerProfileService for FakePowerProfiles {
    fn profiles(&self) -> Vec<String> {
        self.profiles.borrow().clone()
    }

    fn active_profile(&self) -> String {
        self.active.borrow().clone()
    }

    fn set_active_profile(&self, profile: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
        self.requests.borrow_mut().push(profile.to_string());
        let profile = profile.to_string();
        if self.reject.get() {
            return future::ready(Err(RuntimeError::ModeRejected {
                mode: profile,
                reason: "rejected by fake daemon".to_string(),
            }))
            .boxed_local();
        }
        let me = self.me.clone();
        async move {
            if let Some(me) = me.upgrade() {
                me.apply(&profile);
            }
            Ok(())
        }
        .boxed_local()
    }
}

// ── Network ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeNetwork {
    notifier: Notifier,
    wifi: RefCell<Option<Rc<FakeWifi>>>,
}

impl FakeNetwork {
    pub fn new(wifi: Option<Rc<FakeWifi>>) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            wifi: RefCell::new(wifi),
        })
    }

    pub fn set_wifi(&self, wifi: Option<Rc<FakeWifi>>) {
        *self.wifi.borrow_mut() = wifi;
        self.notifier.notify("wifi");
    }
}

impl NetworkService for FakeNetwork {
    fn wifi(&self) -> Option<Rc<dyn WifiDevice>> {
        self.wifi
            .borrow()
            .clone()
            .map(|wifi| wifi as Rc<dyn WifiDevice>)
    }
}

#[derive(Debug)]
pub struct FakeWifi {
    notifier: Notifier,
    enabled: Cell<bool>,
    internet: Cell<Internet>,
    access_points: RefCell<Vec<AccessPoint>>,
    active: RefCell<Option<AccessPoint>>,
}

impl FakeWifi {
    pub fn new(enabled: bool, internet: Internet) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            enabled: Cell::new(enabled),
            internet: Cell::new(internet),
            access_points: RefCell::new(Vec::new()),
            active: RefCell::new(None),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        self.notifier.notify("enabled");
    }

    pub fn set_internet(&self, internet: Internet) {
        self.internet.set(internet);
        self.notifier.notify("internet");
    }

    pub fn set_access_points(&self, access_points: Vec<AccessPoint>) {
        *self.access_points.borrow_mut() = access_points;
        self.notifier.notify("access-points");
    }

    pub fn set_active_access_point(&self, active: Option<AccessPoint>) {
        *self.active.borrow_mut() = active;
        self.notifier.notify("active-access-point");
    }
}

impl WifiDevice for FakeWifi {
    fn enabled(&self) -> bool {
        self.enabled.get()
    }

    fn internet(&self) -> Internet {
        self.internet.get()
    }

    fn access_points(&self) -> Vec<AccessPoint> {
        self.access_points.borrow().clone()
    }

    fn active_access_point(&self) -> Option<AccessPoint> {
        self.active.borrow().clone()
    }
}

/// An access point with an icon derived from its strength.
pub fn access_point(ssid: Option<&str>, bssid: &str, strength: u8) -> AccessPoint {
    let level = match strength {
        0..=19 => "none",
        20..=39 => "weak",
        40..=59 => "ok",
        60..=79 => "good",
        _ => "excellent",
    };
    AccessPoint {
        ssid: ssid.map(str::to_string),
        bssid: bssid.to_string(),
        strength,
        icon_name: format!("network-wireless-signal-{level}-symbolic"),
    }
}

// ── Audio ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeAudio {
    notifier: Notifier,
    speaker: Rc<FakeSpeaker>,
}

impl FakeAudio {
    pub fn new(volume: f64) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            speaker: FakeSpeaker::new(volume),
        })
    }

    pub fn speaker(&self) -> Rc<FakeSpeaker> {
        Rc::clone(&self.speaker)
    }
}

impl AudioService for FakeAudio {
    fn default_speaker(&self) -> Rc<dyn Speaker> {
        self.speaker.clone()
    }
}

#[derive(Debug)]
pub struct FakeSpeaker {
    notifier: Notifier,
    volume: Cell<f64>,
}

impl FakeSpeaker {
    pub fn new(volume: f64) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            volume: Cell::new(volume.clamp(0.0, 1.0)),
        })
    }
}

impl Speaker for FakeSpeaker {
    fn volume(&self) -> f64 {
        self.volume.get()
    }

    fn volume_icon(&self) -> String {
        let level = match self.volume.get() {
            v if v <= 0.0 => "muted",
            v if v < 0.34 => "low",
            v if v < 0.67 => "medium",
            _ => "high",
        };
        format!("audio-volume-{level}-symbolic")
    }

    fn set_volume(&self, volume: f64) {
        self.volume.set(volume.clamp(0.0, 1.0));
        self.notifier.notify("volume");
        self.notifier.notify("volume-icon");
    }
}

// ── Workspaces ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeWorkspaces {
    notifier: Notifier,
    workspaces: RefCell<Vec<Workspace>>,
    focused_workspace: Cell<Option<i32>>,
    clients: RefCell<Vec<Client>>,
    focused_client: RefCell<Option<String>>,
}

impl FakeWorkspaces {
    /// Workspaces with the given ids, in that order, focusing the first.
    pub fn new(ids: &[i32]) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            workspaces: RefCell::new(ids.iter().map(|id| workspace(*id)).collect()),
            focused_workspace: Cell::new(ids.first().copied()),
            clients: RefCell::new(Vec::new()),
            focused_client: RefCell::new(None),
        })
    }

    pub fn add_workspace(&self, id: i32) {
        self.workspaces.borrow_mut().push(workspace(id));
        self.notifier.notify("workspaces");
    }

    pub fn focus_workspace(&self, id: i32) {
        self.focused_workspace.set(Some(id));
        self.notifier.notify("focused-workspace");
    }

    pub fn set_clients(&self, clients: Vec<Client>) {
        *self.clients.borrow_mut() = clients;
        self.notifier.notify("clients");
    }

    /// Focus the client with `address`, or nothing.
    pub fn focus_client(&self, address: Option<&str>) {
        *self.focused_client.borrow_mut() = address.map(str::to_string);
        self.notifier.notify("focused-client");
    }

    /// Rename a client in place, as a window title change would.
    pub fn retitle(&self, address: &str, title: &str) {
        for client in self.clients.borrow_mut().iter_mut() {
            if client.address == address {
                client.title = title.to_string();
            }
        }
        self.notifier.notify("clients");
    }
}

fn workspace(id: i32) -> Workspace {
    Workspace {
        id,
        name: id.to_string(),
    }
}

impl WorkspaceService for FakeWorkspaces {
    fn workspaces(&self) -> Vec<Workspace> {
        self.workspaces.borrow().clone()
    }

    fn focused_workspace(&self) -> Option<Workspace> {
        let id = self.focused_workspace.get()?;
        self.workspaces.borrow().iter().find(|w| w.id == id).cloned()
    }

    fn clients(&self) -> Vec<Client> {
        self.clients.borrow().clone()
    }

    fn focused_client(&self) -> Option<Client> {
        let address = self.focused_client.borrow().clone()?;
        self.clients
            .borrow()
            .iter()
            .find(|c| c.address == address)
            .cloned()
    }
}

// ── Tray ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeTray {
    notifier: Notifier,
    items: RefCell<Vec<Rc<FakeTrayItem>>>,
}

impl FakeTray {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            items: RefCell::new(Vec::new()),
        })
    }

    pub fn add(&self, item: Rc<FakeTrayItem>) {
        self.items.borrow_mut().push(item);
        self.notifier.notify("items");
    }

    pub fn remove(&self, id: &str) {
        self.items.borrow_mut().retain(|item| item.id != id);
        self.notifier.notify("items");
    }
}

impl TrayService for FakeTray {
    fn items(&self) -> Vec<Rc<dyn TrayItem>> {
        self.items
            .borrow()
            .iter()
            .map(|item| Rc::clone(item) as Rc<dyn TrayItem>)
            .collect()
    }
}

#[derive(Debug)]
pub struct FakeTrayItem {
    notifier: Notifier,
    id: String,
    icon_name: RefCell<String>,
    tooltip: RefCell<String>,
    activations: Cell<u32>,
}

impl FakeTrayItem {
    pub fn new(id: &str, icon_name: &str, tooltip: &str) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            id: id.to_string(),
            icon_name: RefCell::new(icon_name.to_string()),
            tooltip: RefCell::new(tooltip.to_string()),
            activations: Cell::new(0),
        })
    }

    pub fn set_icon_name(&self, icon_name: &str) {
        *self.icon_name.borrow_mut() = icon_name.to_string();
        self.notifier.notify("icon-name");
    }

    pub fn set_tooltip(&self, tooltip: &str) {
        *self.tooltip.borrow_mut() = tooltip.to_string();
        self.notifier.notify("tooltip");
    }

    pub fn activations(&self) -> u32 {
        self.activations.get()
    }
}

impl TrayItem for FakeTrayItem {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn icon_name(&self) -> String {
        self.icon_name.borrow().clone()
    }

    fn tooltip(&self) -> String {
        self.tooltip.borrow().clone()
    }

    fn activate(&self) {
        self.activations.set(self.activations.get() + 1);
    }
}

// ── Media ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeMedia {
    notifier: Notifier,
    players: RefCell<Vec<Rc<FakePlayer>>>,
}

impl FakeMedia {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            players: RefCell::new(Vec::new()),
        })
    }

    pub fn add(&self, player: Rc<FakePlayer>) {
        self.players.borrow_mut().push(player);
        self.notifier.notify("players");
    }

    pub fn remove(&self, entry: &str) {
        self.players.borrow_mut().retain(|p| p.entry != entry);
        self.notifier.notify("players");
    }
}

impl MediaService for FakeMedia {
    fn players(&self) -> Vec<Rc<dyn Player>> {
        self.players
            .borrow()
            .iter()
            .map(|p| Rc::clone(p) as Rc<dyn Player>)
            .collect()
    }
}

/// A player that counts skips and toggles between playing and paused.
#[derive(Debug)]
pub struct FakePlayer {
    notifier: Notifier,
    entry: String,
    icon_name: Option<String>,
    title: RefCell<String>,
    artist: RefCell<String>,
    cover_art: RefCell<Option<String>>,
    status: Cell<PlaybackStatus>,
    controllable: Cell<bool>,
    skips: Cell<i32>,
}

impl FakePlayer {
    pub fn new(entry: &str, icon_name: Option<&str>, title: &str, artist: &str) -> Rc<Self> {
        Rc::new(Self {
            notifier: Notifier::new(),
            entry: entry.to_string(),
            icon_name: icon_name.map(str::to_string),
            title: RefCell::new(title.to_string()),
            artist: RefCell::new(artist.to_string()),
            cover_art: RefCell::new(None),
            status: Cell::new(PlaybackStatus::Paused),
            controllable: Cell::new(true),
            skips: Cell::new(0),
        })
    }

    pub fn set_track(&self, title: &str, artist: &str) {
        *self.title.borrow_mut() = title.to_string();
        *self.artist.borrow_mut() = artist.to_string();
        self.notifier.notify("title");
        self.notifier.notify("artist");
    }

    pub fn set_cover_art(&self, path: Option<&str>) {
        *self.cover_art.borrow_mut() = path.map(str::to_string);
        self.notifier.notify("cover-art");
    }

    pub fn set_controllable(&self, controllable: bool) {
        self.controllable.set(controllable);
        self.notifier.notify("can-control");
        self.notifier.notify("can-go-previous");
        self.notifier.notify("can-go-next");
    }

    /// Net number of tracks skipped forward.
    pub fn skips(&self) -> i32 {
        self.skips.get()
    }
}

impl Player for FakePlayer {
    fn entry(&self) -> String {
        self.entry.clone()
    }

    fn icon_name(&self) -> Option<String> {
        self.icon_name.clone()
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn artist(&self) -> String {
        self.artist.borrow().clone()
    }

    fn cover_art(&self) -> Option<String> {
        self.cover_art.borrow().clone()
    }

    fn playback_status(&self) -> PlaybackStatus {
        self.status.get()
    }

    fn can_go_previous(&self) -> bool {
        self.controllable.get()
    }

    fn can_go_next(&self) -> bool {
        self.controllable.get()
    }

    fn can_control(&self) -> bool {
        self.controllable.get()
    }

    fn previous(&self) {
        self.skips.set(self.skips.get() - 1);
    }

    fn play_pause(&self) {
        let next = match self.status.get() {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            PlaybackStatus::Paused | PlaybackStatus::Stopped => PlaybackStatus::Playing,
        };
        self.status.set(next);
        self.notifier.notify("playback-status");
    }

    fn next(&self) {
        self.skips.set(self.skips.get() + 1);
    }
}

// ── Inhibition ───────────────────────────────────────────────────────

/// Hands out increasing cookies, or `0` while refusing.
#[derive(Debug, Default)]
pub struct FakeInhibitManager {
    next_cookie: Cell<u32>,
    refuse: Cell<bool>,
    live: RefCell<Vec<u32>>,
    released: RefCell<Vec<u32>>,
    reasons: RefCell<Vec<String>>,
}

impl FakeInhibitManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.set(refuse);
    }

    /// Cookies currently inhibiting.
    pub fn live(&self) -> Vec<u32> {
        self.live.borrow().clone()
    }

    /// Every cookie released, in order.
    pub fn released(&self) -> Vec<u32> {
        self.released.borrow().clone()
    }

    /// Every reason given, in order.
    pub fn reasons(&self) -> Vec<String> {
        self.reasons.borrow().clone()
    }
}

impl InhibitManager for FakeInhibitManager {
    fn inhibit(&self, _kind: InhibitKind, reason: &str) -> u32 {
        self.reasons.borrow_mut().push(reason.to_string());
        if self.refuse.get() {
            return 0;
        }
        let cookie = self.next_cookie.get() + 1;
        self.next_cookie.set(cookie);
        self.live.borrow_mut().push(cookie);
        cookie
    }

    fn uninhibit(&self, cookie: u32) {
        self.live.borrow_mut().retain(|c| *c != cookie);
        self.released.borrow_mut().push(cookie);
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// Answers commands from canned output keyed by program name.
#[derive(Debug, Default)]
pub struct FakeRunner {
    outputs: RefCell<HashMap<String, Result<String, String>>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make `program` succeed with `stdout`.
    pub fn respond(&self, program: &str, stdout: &str) {
        self.outputs
            .borrow_mut()
            .insert(program.to_string(), Ok(stdout.to_string()));
    }

    /// Make `program` exit non-zero with `stderr`.
    pub fn fail(&self, program: &str, stderr: &str) {
        self.outputs
            .borrow_mut()
            .insert(program.to_string(), Err(stderr.to_string()));
    }

    /// Every argv run so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, argv: &[String]) -> LocalBoxFuture<'static, Result<String, CommandError>> {
        self.calls.borrow_mut().push(argv.to_vec());
        let result = match argv.first() {
            None => Err(CommandError::Empty),
            Some(program) => match self.outputs.borrow().get(program) {
                Some(Ok(stdout)) => Ok(stdout.clone()),
                Some(Err(stderr)) => Err(CommandError::Failed {
                    program: program.clone(),
                    code: Some(1),
                    stderr: stderr.clone(),
                }),
                None => Err(CommandError::Spawn {
                    program: program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no canned output"),
                }),
            },
        };
        future::ready(result).boxed_local()
    }
}

// ── Bundle ───────────────────────────────────────────────────────────

/// One fake of each service, in a plausible laptop state.
#[derive(Debug, Clone)]
pub struct FakeServices {
    pub battery: Rc<FakeBattery>,
    pub power: Rc<FakePowerProfiles>,
    pub network: Rc<FakeNetwork>,
    pub wifi: Rc<FakeWifi>,
    pub audio: Rc<FakeAudio>,
    pub workspaces: Rc<FakeWorkspaces>,
    pub tray: Rc<FakeTray>,
    pub media: Rc<FakeMedia>,
    pub inhibit: Rc<FakeInhibitManager>,
    pub runner: Rc<FakeRunner>,
}

impl FakeServices {
    pub fn new() -> Self {
        let wifi = FakeWifi::new(true, Internet::Connected);
        wifi.set_access_points(vec![
            access_point(Some("home"), "aa:aa:aa:aa:aa:01", 82),
            access_point(None, "aa:aa:aa:aa:aa:02", 90),
            access_point(Some("cafe"), "aa:aa:aa:aa:aa:03", 41),
        ]);
        wifi.set_active_access_point(Some(access_point(Some("home"), "aa:aa:aa:aa:aa:01", 82)));
        let workspaces = FakeWorkspaces::new(&[1, 2, 3]);
        workspaces.set_clients(vec![Client {
            address: "0x1".to_string(),
            title: "terminal".to_string(),
            workspace: 1,
        }]);
        workspaces.focus_client(Some("0x1"));
        Self {
            battery: FakeBattery::new(0.8, BatteryState::Discharging),
            power: FakePowerProfiles::new(),
            network: FakeNetwork::new(Some(Rc::clone(&wifi))),
            wifi,
            audio: FakeAudio::new(0.5),
            workspaces,
            tray: FakeTray::new(),
            media: FakeMedia::new(),
            inhibit: FakeInhibitManager::new(),
            runner: FakeRunner::new(),
        }
    }
}

impl Default for FakeServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_executor::block_on;

    #[test]
    fn fake_profiles_apply_on_poll() {
        let profiles = FakePowerProfiles::new();
        let pending = profiles.set_active_profile("performance");
        assert_eq!(profiles.active_profile(), "balanced");
        block_on(pending).unwrap();
        assert_eq!(profiles.active_profile(), "performance");
        assert_eq!(profiles.requests(), vec!["performance"]);
    }

    #[test]
    fn fake_profiles_can_reject() {
        let profiles = FakePowerProfiles::new();
        profiles.reject_requests(true);
        let result = block_on(profiles.set_active_profile("performance"));
        assert!(matches!(result, Err(RuntimeError::ModeRejected { .. })));
        assert_eq!(profiles.active_profile(), "balanced");
    }

    #[test]
    fn fake_inhibit_manager_tracks_cookies() {
        let manager = FakeInhibitManager::new();
        let a = manager.inhibit(InhibitKind::Idle, "a");
        let b = manager.inhibit(InhibitKind::Idle, "b");
        assert_eq!((a, b), (1, 2));
        manager.uninhibit(a);
        assert_eq!(manager.live(), vec![2]);
        manager.refuse(true);
        assert_eq!(manager.inhibit(InhibitKind::Idle, "c"), 0);
        assert_eq!(manager.reasons(), vec!["a", "b", "c"]);
    }

    #[test]
    fn fake_runner_answers_from_canned_output() {
        let runner = FakeRunner::new();
        runner.respond("free", "x\ny\n");
        runner.fail("nmcli", "no secrets");
        let argv = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(block_on(runner.run(&argv(&["free"]))).unwrap(), "x\ny\n");
        assert!(matches!(
            block_on(runner.run(&argv(&["nmcli", "d"]))),
            Err(CommandError::Failed { .. })
        ));
        assert!(matches!(
            block_on(runner.run(&argv(&["ls"]))),
            Err(CommandError::Spawn { .. })
        ));
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn fake_speaker_icon_follows_volume() {
        let speaker = FakeSpeaker::new(0.5);
        assert_eq!(speaker.volume_icon(), "audio-volume-medium-symbolic");
        speaker.set_volume(0.0);
        assert_eq!(speaker.volume_icon(), "audio-volume-muted-symbolic");
        speaker.set_volume(2.0);
        assert_eq!(speaker.volume(), 1.0);
    }
}
