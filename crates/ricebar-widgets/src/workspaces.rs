//! Workspace buttons and the focused window title.

use std::rc::Rc;

use ricebar_runtime::{Binding, Computed, Subscription, Teardown};
use ricebar_services::workspaces::{self, Client, Workspace, WorkspaceService};

use crate::widget::{Widget, watch_all};

/// One workspace button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceButton {
    pub id: i32,
    pub label: String,
    pub focused: bool,
}

impl WorkspaceButton {
    /// CSS class of the button.
    #[must_use]
    pub fn class(&self) -> &'static str {
        if self.focused { "focused" } else { "" }
    }
}

/// Buttons for `workspaces` in id order.
#[must_use]
pub fn buttons(mut workspaces: Vec<Workspace>, focused: Option<i32>) -> Vec<WorkspaceButton> {
    workspaces.sort_by_key(|w| w.id);
    workspaces
        .into_iter()
        .map(|w| WorkspaceButton {
            id: w.id,
            label: w.id.to_string(),
            focused: Some(w.id) == focused,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Workspaces {
    list: Binding<Vec<Workspace>>,
    focused: Binding<Option<i32>>,
    buttons: Computed<Vec<WorkspaceButton>>,
}

impl Workspaces {
    #[must_use]
    pub fn new(service: &Rc<dyn WorkspaceService>) -> Self {
        let list = Binding::new(service, workspaces::WORKSPACES);
        let focused = Binding::map(service, workspaces::FOCUSED_WORKSPACE, |w| w.map(|w| w.id));
        let buttons = Computed::from2(&list, &focused, |list, focused| {
            buttons(list.unwrap_or_default(), focused.flatten())
        });
        Self {
            list,
            focused,
            buttons,
        }
    }

    #[must_use]
    pub fn buttons(&self) -> Vec<WorkspaceButton> {
        self.buttons.get()
    }
}

impl Teardown for Workspaces {
    fn teardown(&self) {
        self.buttons.dispose();
        self.list.dispose();
        self.focused.dispose();
    }
}

impl Widget for Workspaces {
    fn name(&self) -> &'static str {
        "workspaces"
    }

    fn snapshot(&self) -> String {
        self.buttons()
            .iter()
            .map(|b| {
                if b.focused {
                    format!("[{}]", b.label)
                } else {
                    b.label.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.buttons], &on_change)
    }
}

/// Title of the focused client, or empty.
///
/// The title is looked up in the client list so a retitled window shows
/// its new title even when focus did not move.
#[must_use]
pub fn focused_title(clients: Option<Vec<Client>>, focused: Option<Option<Client>>) -> String {
    let Some(focused) = focused.flatten() else {
        return String::new();
    };
    clients
        .unwrap_or_default()
        .into_iter()
        .find(|c| c.address == focused.address)
        .map_or(focused.title, |c| c.title)
}

/// Focused window title.
#[derive(Debug, Clone)]
pub struct Focus {
    clients: Binding<Vec<Client>>,
    focused: Binding<Option<Client>>,
    title: Computed<String>,
}

impl Focus {
    #[must_use]
    pub fn new(service: &Rc<dyn WorkspaceService>) -> Self {
        let clients = Binding::new(service, workspaces::CLIENTS);
        let focused = Binding::new(service, workspaces::FOCUSED_CLIENT);
        let title = Computed::from2(&clients, &focused, focused_title);
        Self {
            clients,
            focused,
            title,
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.title.get()
    }
}

impl Teardown for Focus {
    fn teardown(&self) {
        self.title.dispose();
        self.clients.dispose();
        self.focused.dispose();
    }
}

impl Widget for Focus {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn snapshot(&self) -> String {
        self.title()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.title], &on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricebar_services::testing::FakeWorkspaces;

    fn client(address: &str, title: &str) -> Client {
        Client {
            address: address.to_string(),
            title: title.to_string(),
            workspace: 1,
        }
    }

    fn service(ids: &[i32]) -> (Rc<FakeWorkspaces>, Rc<dyn WorkspaceService>) {
        let fake = FakeWorkspaces::new(ids);
        let service: Rc<dyn WorkspaceService> = fake.clone();
        (fake, service)
    }

    #[test]
    fn buttons_are_sorted_by_id() {
        let (fake, service) = service(&[3, 1, 2]);
        let widget = Workspaces::new(&service);
        assert_eq!(widget.snapshot(), "1 2 [3]");
        fake.focus_workspace(1);
        assert_eq!(widget.snapshot(), "[1] 2 3");
        assert_eq!(widget.buttons()[0].class(), "focused");
        assert_eq!(widget.buttons()[1].class(), "");
    }

    #[test]
    fn new_workspace_appears_in_order() {
        let (fake, service) = service(&[1, 5]);
        let widget = Workspaces::new(&service);
        fake.add_workspace(3);
        let ids: Vec<i32> = widget.buttons().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn focus_shows_title_or_nothing() {
        let (fake, service) = service(&[1]);
        let widget = Focus::new(&service);
        assert_eq!(widget.title(), "");
        fake.set_clients(vec![client("0x1", "terminal"), client("0x2", "browser")]);
        fake.focus_client(Some("0x2"));
        assert_eq!(widget.title(), "browser");
        fake.focus_client(None);
        assert_eq!(widget.title(), "");
    }

    #[test]
    fn retitled_window_updates_without_focus_change() {
        let (fake, service) = service(&[1]);
        let widget = Focus::new(&service);
        fake.set_clients(vec![client("0x1", "vim")]);
        fake.focus_client(Some("0x1"));
        fake.retitle("0x1", "vim: notes.md");
        assert_eq!(widget.title(), "vim: notes.md");
    }

    #[test]
    fn focused_title_prefers_the_client_list() {
        let stale = client("0x1", "old");
        let fresh = client("0x1", "new");
        assert_eq!(focused_title(Some(vec![fresh]), Some(Some(stale.clone()))), "new");
        assert_eq!(focused_title(None, Some(Some(stale))), "old");
        assert_eq!(focused_title(None, None), "");
    }
}
