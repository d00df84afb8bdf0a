//! Media player controls.
//!
//! The bar shows one icon per player; the popover shows cover art, title,
//! artist, and previous / play-pause / next buttons for each.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_runtime::{Binding, Signal, Subscription, Teardown};
use ricebar_services::media::{self, MediaService, PlaybackStatus, Player};
use tracing::debug;

use crate::widget::{Revision, WatchSource, Widget};

pub const PLAY_ICON: &str = "media-playback-start-symbolic";
pub const PAUSE_ICON: &str = "media-playback-pause-symbolic";
pub const PREVIOUS_ICON: &str = "media-seek-backward-symbolic";
pub const NEXT_ICON: &str = "media-seek-forward-symbolic";

/// One player's row in the popover.
#[derive(Clone)]
pub struct PlayerView {
    player: Rc<dyn Player>,
    entry: String,
    icon: Option<String>,
    title: Binding<String>,
    artist: Binding<String>,
    cover_art: Binding<Option<String>>,
    status: Binding<PlaybackStatus>,
    can_previous: Binding<bool>,
    can_next: Binding<bool>,
    can_control: Binding<bool>,
}

impl PlayerView {
    fn new(player: Rc<dyn Player>) -> Self {
        Self {
            entry: player.entry(),
            icon: player.icon_name(),
            title: Binding::new(&player, media::TITLE),
            artist: Binding::new(&player, media::ARTIST),
            cover_art: Binding::new(&player, media::COVER_ART),
            status: Binding::new(&player, media::PLAYBACK_STATUS),
            can_previous: Binding::new(&player, media::CAN_GO_PREVIOUS),
            can_next: Binding::new(&player, media::CAN_GO_NEXT),
            can_control: Binding::new(&player, media::CAN_CONTROL),
            player,
        }
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Application icon, hidden when the player has none.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.title.get().unwrap_or_default()
    }

    #[must_use]
    pub fn artist(&self) -> String {
        self.artist.get().unwrap_or_default()
    }

    #[must_use]
    pub fn cover_art(&self) -> Option<String> {
        self.cover_art.get().flatten()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status.get() == Some(PlaybackStatus::Playing)
    }

    /// Icon on the play-pause button.
    #[must_use]
    pub fn play_pause_icon(&self) -> &'static str {
        if self.is_playing() { PLAY_ICON } else { PAUSE_ICON }
    }

    #[must_use]
    pub fn can_go_previous(&self) -> bool {
        self.can_previous.get_or(false)
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.can_next.get_or(false)
    }

    #[must_use]
    pub fn can_control(&self) -> bool {
        self.can_control.get_or(false)
    }

    /// Skip back. Ignored while the button is hidden.
    pub fn previous(&self) {
        if self.can_go_previous() {
            self.player.previous();
        } else {
            debug!(entry = %self.entry, "previous ignored; not allowed");
        }
    }

    pub fn play_pause(&self) {
        if self.can_control() {
            self.player.play_pause();
        } else {
            debug!(entry = %self.entry, "play-pause ignored; not allowed");
        }
    }

    pub fn next(&self) {
        if self.can_go_next() {
            self.player.next();
        } else {
            debug!(entry = %self.entry, "next ignored; not allowed");
        }
    }

    fn sources(&self) -> [&dyn WatchSource; 7] {
        [
            &self.title,
            &self.artist,
            &self.cover_art,
            &self.status,
            &self.can_previous,
            &self.can_next,
            &self.can_control,
        ]
    }
}

impl Teardown for PlayerView {
    fn teardown(&self) {
        self.title.dispose();
        self.artist.dispose();
        self.cover_art.dispose();
        self.status.dispose();
        self.can_previous.dispose();
        self.can_next.dispose();
        self.can_control.dispose();
    }
}

struct MediaInner {
    players: Binding<Vec<Rc<dyn Player>>>,
    views: Signal<Vec<PlayerView>>,
    revision: Revision,
    rebuild: RefCell<Subscription>,
}

#[derive(Clone)]
pub struct Media {
    inner: Rc<MediaInner>,
}

impl Media {
    #[must_use]
    pub fn new(service: &Rc<dyn MediaService>) -> Self {
        let players = Binding::new(service, media::PLAYERS);
        let views = Signal::new(Vec::new());
        let revision = Revision::default();
        let rebuild = {
            let views = views.clone();
            let revision = revision.clone();
            players.subscribe(move |players| {
                install(&views, &revision, players.cloned().unwrap_or_default());
            })
        };
        install(&views, &revision, players.get().unwrap_or_default());
        Self {
            inner: Rc::new(MediaInner {
                players,
                views,
                revision,
                rebuild: RefCell::new(rebuild),
            }),
        }
    }

    #[must_use]
    pub fn players(&self) -> Vec<PlayerView> {
        self.inner.views.get()
    }

    /// The view of the player with desktop entry `entry`.
    #[must_use]
    pub fn player(&self, entry: &str) -> Option<PlayerView> {
        self.inner
            .views
            .with(|views| views.iter().find(|v| v.entry == entry).cloned())
    }
}

fn install(views: &Signal<Vec<PlayerView>>, revision: &Revision, players: Vec<Rc<dyn Player>>) {
    let next: Vec<PlayerView> = players.into_iter().map(PlayerView::new).collect();
    views.force_set(next.clone());
    let sources: Vec<&dyn WatchSource> = next.iter().flat_map(PlayerView::sources).collect();
    let owned = next
        .iter()
        .map(|view| Box::new(view.clone()) as Box<dyn Teardown>)
        .collect();
    revision.track(owned, &sources);
}

impl Teardown for Media {
    fn teardown(&self) {
        self.inner.rebuild.borrow_mut().unsubscribe();
        self.inner.players.dispose();
        self.inner.revision.clear();
        self.inner.views.force_set(Vec::new());
        self.inner.views.dispose();
    }
}

impl Widget for Media {
    fn name(&self) -> &'static str {
        "media"
    }

    fn snapshot(&self) -> String {
        self.players()
            .iter()
            .map(|p| {
                format!(
                    "{}: {} - {} [{}]",
                    p.entry(),
                    p.title(),
                    p.artist(),
                    if p.is_playing() { "playing" } else { "paused" }
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        vec![self.inner.revision.watch(on_change)]
    }
}
