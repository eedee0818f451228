//! Observable store state.

use entities::User;

use crate::UserStoreError;

/// Snapshot of everything a presentation layer observes on the user store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStoreState {
    /// Loaded users, in source order.
    pub users: Vec<User>,
    /// The user currently focused, if any.
    pub selected_user: Option<User>,
    /// True while a request is in flight.
    pub is_loading: bool,
    /// Failure of the most recent request.
    pub error: Option<UserStoreError>,
}

impl UserStoreState {
    /// Human-readable error, for surfacing to the user.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Finds a loaded user by ID.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Returns true if `id` is the selected user.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_user.as_ref().is_some_and(|u| u.id == id)
    }
}
