//! Media players.

use std::rc::Rc;

use ricebar_runtime::{Observed, Property};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Every player on the session bus.
pub trait MediaService: Observed {
    fn players(&self) -> Vec<Rc<dyn Player>>;
}

/// One media player.
pub trait Player: Observed {
    /// Desktop entry of the owning application.
    fn entry(&self) -> String;
    /// Icon of the owning application, if it has one.
    fn icon_name(&self) -> Option<String>;
    fn title(&self) -> String;
    fn artist(&self) -> String;
    /// Path to the cover art, if any.
    fn cover_art(&self) -> Option<String>;
    fn playback_status(&self) -> PlaybackStatus;
    fn can_go_previous(&self) -> bool;
    fn can_go_next(&self) -> bool;
    fn can_control(&self) -> bool;
    fn previous(&self);
    fn play_pause(&self);
    fn next(&self);
}

pub const PLAYERS: Property<dyn MediaService, Vec<Rc<dyn Player>>> =
    Property::new("players", |m| m.players());

pub const TITLE: Property<dyn Player, String> = Property::new("title", |p| p.title());
pub const ARTIST: Property<dyn Player, String> = Property::new("artist", |p| p.artist());
pub const COVER_ART: Property<dyn Player, Option<String>> =
    Property::new("cover-art", |p| p.cover_art());
pub const PLAYBACK_STATUS: Property<dyn Player, PlaybackStatus> =
    Property::new("playback-status", |p| p.playback_status());
pub const CAN_GO_PREVIOUS: Property<dyn Player, bool> =
    Property::new("can-go-previous", |p| p.can_go_previous());
pub const CAN_GO_NEXT: Property<dyn Player, bool> =
    Property::new("can-go-next", |p| p.can_go_next());
pub const CAN_CONTROL: Property<dyn Player, bool> =
    Property::new("can-control", |p| p.can_control());
