#![forbid(unsafe_code)]

//! View-models for every ricebar widget.
//!
//! A widget turns service properties and polls into plain values a renderer
//! can draw, and turns clicks back into service requests. Nothing here
//! draws; [`Widget::snapshot`] is the whole contract with a renderer.
//!
//! [`Panel`] builds the full bar from a [`Services`] bundle and tears it
//! down again.

pub mod audio;
pub mod battery;
pub mod clock;
pub mod error;
pub mod inhibitor;
pub mod media;
pub mod memory;
pub mod panel;
pub mod power_profile;
pub mod tray;
pub mod widget;
pub mod wireless;
pub mod workspaces;

pub use audio::Audio;
pub use battery::Battery;
pub use clock::Clock;
pub use error::{Result, WidgetError};
pub use inhibitor::{IdleInhibitor, InhibitorView};
pub use media::{Media, PlayerView};
pub use memory::{Memory, MemoryView};
pub use panel::{Panel, PanelSettings, Services};
pub use power_profile::{PowerProfile, ProfileView};
pub use tray::{Tray, TrayEntry};
pub use widget::Widget;
pub use wireless::{WifiView, Wireless};
pub use workspaces::{Focus, WorkspaceButton, Workspaces};
