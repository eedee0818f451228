//! Transport trait definitions.

use async_trait::async_trait;
use entities::{CreateUserRequest, UpdateUserRequest, User};

use crate::UserStoreResult;

/// Access to wherever user records actually live.
///
/// The store only talks to this trait, so the in-memory mock can be swapped
/// for a networked implementation without touching the store.
#[async_trait]
pub trait UserTransport: Send + Sync {
    /// Lists all users in source order.
    async fn list_users(&self) -> UserStoreResult<Vec<User>>;

    /// Gets a user by ID.
    async fn get_user(&self, id: &str) -> UserStoreResult<Option<User>>;

    /// Creates a new user with a fresh ID.
    async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User>;

    /// Updates a user, failing with `NotFound` if it does not exist.
    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> UserStoreResult<User>;

    /// Deletes a user, failing with `NotFound` if it does not exist.
    async fn delete_user(&self, id: &str) -> UserStoreResult<()>;
}

#[async_trait]
impl<T: UserTransport + ?Sized> UserTransport for std::sync::Arc<T> {
    async fn list_users(&self) -> UserStoreResult<Vec<User>> {
        (**self).list_users().await
    }

    async fn get_user(&self, id: &str) -> UserStoreResult<Option<User>> {
        (**self).get_user(id).await
    }

    async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User> {
        (**self).create_user(request).await
    }

    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> UserStoreResult<User> {
        (**self).update_user(id, changes).await
    }

    async fn delete_user(&self, id: &str) -> UserStoreResult<()> {
        (**self).delete_user(id).await
    }
}
