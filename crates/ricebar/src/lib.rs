#![forbid(unsafe_code)]

//! ricebar: a reactive status bar core with a headless renderer.
//!
//! The crates underneath do the work:
//!
//! - [`ricebar_core`]: time sources and the event loop
//! - [`ricebar_runtime`]: reactive values and state machines
//! - [`ricebar_services`]: typed service interfaces and fakes
//! - [`ricebar_widgets`]: widget view-models and the panel
//!
//! This crate adds the binary: configuration, logging, a renderer that
//! logs instead of drawing, and a simulation of live services.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod renderer;
pub mod simulation;

pub use app::{App, run_panel};
pub use cli::{Cli, run, run_from_env};
pub use config::PanelConfig;
pub use error::{AppError, Result};
pub use renderer::{Frame, HeadlessRenderer};
pub use simulation::Simulation;

pub use ricebar_core as core;
pub use ricebar_runtime as runtime;
pub use ricebar_services as services;
pub use ricebar_widgets as widgets;
