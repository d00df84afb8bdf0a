#![forbid(unsafe_code)]

//! Typed capability interfaces for the system services ricebar observes.
//!
//! Each service is a trait whose implementors announce property changes
//! through a [`ricebar_runtime::Notifier`]. Module-level [`Property`]
//! constants pair an announcement name with a typed read, so widgets bind
//! with `Binding::new(&service, battery::PERCENTAGE)` instead of strings.
//!
//! Process spawning and `free` parsing live here too, behind
//! [`CommandRunner`] so tests can answer with canned output.
//!
//! [`Property`]: ricebar_runtime::Property

pub mod audio;
pub mod battery;
pub mod command;
pub mod inhibit;
pub mod media;
pub mod network;
pub mod power;
pub mod tray;
pub mod usage;
pub mod workspaces;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use audio::{AudioService, Speaker};
pub use battery::{BatteryService, BatteryState};
pub use command::{CommandError, CommandRunner, SystemRunner, argv_with};
pub use inhibit::{InhibitKind, InhibitManager, InhibitToken, Inhibitor};
pub use media::{MediaService, PlaybackStatus, Player};
pub use network::{AccessPoint, Internet, NetworkService, WifiDevice};
pub use power::{PowerProfileService, ProfileSwitch};
pub use tray::{TrayItem, TrayService};
pub use usage::{MemoryReading, parse_free};
pub use workspaces::{Client, Workspace, WorkspaceService};
