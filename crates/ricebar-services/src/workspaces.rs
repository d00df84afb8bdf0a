//! Compositor workspaces and clients.

use ricebar_runtime::{Observed, Property};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Workspace {
    pub id: i32,
    pub name: String,
}

/// A toplevel window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Client {
    pub address: String,
    pub title: String,
    pub workspace: i32,
}

/// The compositor's workspace model.
pub trait WorkspaceService: Observed {
    /// Workspaces in the compositor's order, which need not be sorted.
    fn workspaces(&self) -> Vec<Workspace>;
    fn focused_workspace(&self) -> Option<Workspace>;
    fn clients(&self) -> Vec<Client>;
    fn focused_client(&self) -> Option<Client>;
}

pub const WORKSPACES: Property<dyn WorkspaceService, Vec<Workspace>> =
    Property::new("workspaces", |w| w.workspaces());
pub const FOCUSED_WORKSPACE: Property<dyn WorkspaceService, Option<Workspace>> =
    Property::new("focused-workspace", |w| w.focused_workspace());
pub const CLIENTS: Property<dyn WorkspaceService, Vec<Client>> =
    Property::new("clients", |w| w.clients());
pub const FOCUSED_CLIENT: Property<dyn WorkspaceService, Option<Client>> =
    Property::new("focused-client", |w| w.focused_client());
