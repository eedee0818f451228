//! User store: CRUD orchestration with loading/error bookkeeping.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use entities::{CreateUserRequest, UpdateUserRequest, User};
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::{UserStoreError, UserStoreState, UserTransport};

/// Capacity for the state change channel.
const CHANNEL_CAPACITY: usize = 64;

/// Store operations, for logging and fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            Self::List => "Failed to fetch users",
            Self::Get => "Failed to fetch user",
            Self::Create => "Failed to create user",
            Self::Update => "Failed to update user",
            Self::Delete => "Failed to delete user",
        }
    }
}

/// State container for user records on top of a [`UserTransport`].
///
/// Every operation marks the store as loading and clears the previous error
/// before calling the transport, then either applies the result or records
/// the failure. Failures never escape an operation; they land in
/// [`UserStoreState::error`]. Observers get a full snapshot after every
/// transition through [`UserStore::subscribe`].
///
/// Updates and deletes on the same ID are serialized; everything else may
/// overlap, and the last response to resolve wins. An operation whose
/// future is dropped before it resolves no longer counts as loading.
pub struct UserStore<T> {
    transport: T,
    state: RwLock<UserStoreState>,
    in_flight: AtomicUsize,
    id_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: broadcast::Sender<UserStoreState>,
}

impl<T: UserTransport> UserStore<T> {
    /// Creates an empty store backed by `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: RwLock::new(UserStoreState::default()),
            in_flight: AtomicUsize::new(0),
            id_locks: Mutex::new(HashMap::new()),
            events: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribes to state snapshots published after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<UserStoreState> {
        self.events.subscribe()
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> UserStoreState {
        let mut state = self.state.read().await.clone();
        state.is_loading = self.is_loading();
        state
    }

    /// Returns the current error message, if any.
    pub async fn error_message(&self) -> Option<String> {
        self.state.read().await.error_message()
    }

    /// Fetches all users, replacing the loaded list.
    pub async fn list(&self) {
        let request = self.begin(Operation::List).await;
        match self.transport.list_users().await {
            Ok(users) => self.succeed(request, |state| state.users = users).await,
            Err(e) => self.fail(request, Operation::List, e).await,
        }
    }

    /// Fetches all users again.
    pub async fn refetch(&self) {
        self.list().await
    }

    /// Fetches one user into the selection. A missing user clears the
    /// selection and is not an error.
    pub async fn get_by_id(&self, id: &str) {
        let request = self.begin(Operation::Get).await;
        match self.transport.get_user(id).await {
            Ok(user) => {
                if user.is_none() {
                    tracing::debug!(user_id = %id, "User not found, clearing selection");
                }
                self.succeed(request, |state| state.selected_user = user).await
            }
            Err(e) => self.fail(request, Operation::Get, e).await,
        }
    }

    /// Creates a user and appends it to the loaded list.
    pub async fn create(&self, request: CreateUserRequest) {
        let in_flight = self.begin(Operation::Create).await;
        match self.transport.create_user(request).await {
            Ok(user) => self.succeed(in_flight, |state| state.users.push(user)).await,
            Err(e) => self.fail(in_flight, Operation::Create, e).await,
        }
    }

    /// Updates a user, replacing it in the list and in the selection.
    pub async fn update(&self, id: &str, changes: UpdateUserRequest) {
        self.with_id_lock(id, async {
            let request = self.begin(Operation::Update).await;
            match self.transport.update_user(id, changes).await {
                Ok(user) => self.succeed(request, |state| replace_user(state, user)).await,
                Err(e) => self.fail(request, Operation::Update, e).await,
            }
        })
        .await
    }

    /// Deletes a user, dropping it from the list and from the selection.
    pub async fn delete(&self, id: &str) {
        self.with_id_lock(id, async {
            let request = self.begin(Operation::Delete).await;
            match self.transport.delete_user(id).await {
                Ok(()) => self.succeed(request, |state| remove_user(state, id)).await,
                Err(e) => self.fail(request, Operation::Delete, e).await,
            }
        })
        .await
    }

    /// Sets the selection directly, without a request.
    pub async fn select_user(&self, user: Option<User>) {
        let mut state = self.state.write().await;
        state.selected_user = user;
        self.publish(&mut state);
    }

    /// Clears the error slot.
    pub async fn clear_error(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        self.publish(&mut state);
    }

    async fn begin(&self, op: Operation) -> InFlight<'_, T> {
        let mut state = self.state.write().await;
        // No await between the increment and the guard.
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let request = InFlight {
            store: self,
            settled: false,
        };
        state.error = None;
        tracing::debug!(op = op.as_str(), in_flight, "User store request started");
        self.publish(&mut state);
        request
    }

    async fn succeed(&self, request: InFlight<'_, T>, apply: impl FnOnce(&mut UserStoreState)) {
        let mut state = self.state.write().await;
        request.settle();
        apply(&mut state);
        self.publish(&mut state);
    }

    async fn fail(&self, request: InFlight<'_, T>, op: Operation, error: UserStoreError) {
        let error = error.or_fallback(op.fallback_message());
        tracing::warn!(op = op.as_str(), error = %error, "User store request failed");

        let mut state = self.state.write().await;
        request.settle();
        state.error = Some(error);
        self.publish(&mut state);
    }

    /// Runs `work` while holding the lock for `id`.
    async fn with_id_lock<R>(&self, id: &str, work: impl Future<Output = R>) -> R {
        let lock = {
            let mut locks = self.id_locks.lock().await;
            locks.entry(id.to_string()).or_default().clone()
        };

        let result = {
            let _guard = lock.lock().await;
            work.await
        };
        drop(lock);

        let mut locks = self.id_locks.lock().await;
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
        result
    }
}

impl<T> UserStore<T> {
    fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn publish(&self, state: &mut UserStoreState) {
        state.is_loading = self.is_loading();
        // Ignore send errors (no subscribers)
        let _ = self.events.send(state.clone());
    }
}

/// One outstanding transport request.
///
/// Settled by `succeed`/`fail`. Dropped unsettled when the operation's future
/// is cancelled, in which case it releases the request itself.
struct InFlight<'a, T> {
    store: &'a UserStore<T>,
    settled: bool,
}

impl<T> InFlight<'_, T> {
    fn settle(mut self) {
        self.settled = true;
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let remaining = self.store.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(in_flight = remaining, "User store request cancelled");

        // If the lock is taken, its holder publishes the refreshed flag.
        if let Ok(mut state) = self.store.state.try_write() {
            self.store.publish(&mut state);
        }
    }
}

fn replace_user(state: &mut UserStoreState, user: User) {
    if state.is_selected(&user.id) {
        state.selected_user = Some(user.clone());
    }
    if let Some(slot) = state.users.iter_mut().find(|u| u.id == user.id) {
        *slot = user;
    }
}

fn remove_user(state: &mut UserStoreState, id: &str) {
    if let Some(index) = state.users.iter().position(|u| u.id == id) {
        state.users.remove(index);
    }
    if state.is_selected(id) {
        state.selected_user = None;
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::AtomicBool, time::Duration};

    use async_trait::async_trait;
    use entities::UserStatus;
    use tokio::sync::Semaphore;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::{MemoryUserTransport, TransportLatency, UserStoreResult};

    /// Fails every call while `failing` is set.
    struct FlakyTransport {
        inner: MemoryUserTransport,
        failing: AtomicBool,
        message: String,
    }

    impl FlakyTransport {
        fn seeded(message: &str) -> Self {
            Self {
                inner: MemoryUserTransport::with_mock_users(),
                failing: AtomicBool::new(false),
                message: message.to_string(),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> UserStoreResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(UserStoreError::transport(self.message.clone()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserTransport for FlakyTransport {
        async fn list_users(&self) -> UserStoreResult<Vec<User>> {
            self.check()?;
            self.inner.list_users().await
        }

        async fn get_user(&self, id: &str) -> UserStoreResult<Option<User>> {
            self.check()?;
            self.inner.get_user(id).await
        }

        async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User> {
            self.check()?;
            self.inner.create_user(request).await
        }

        async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> UserStoreResult<User> {
            self.check()?;
            self.inner.update_user(id, changes).await
        }

        async fn delete_user(&self, id: &str) -> UserStoreResult<()> {
            self.check()?;
            self.inner.delete_user(id).await
        }
    }

    /// Holds `list_users` and `update_user` until a permit is released.
    struct GatedTransport {
        inner: MemoryUserTransport,
        gate: Semaphore,
        entered: AtomicUsize,
    }

    impl GatedTransport {
        fn seeded() -> Self {
            Self {
                inner: MemoryUserTransport::with_mock_users(),
                gate: Semaphore::new(0),
                entered: AtomicUsize::new(0),
            }
        }

        async fn pass(&self) -> UserStoreResult<()> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            self.gate
                .acquire()
                .await
                .map_err(|e| UserStoreError::transport(e.to_string()))?
                .forget();
            Ok(())
        }

        fn entered(&self) -> usize {
            self.entered.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserTransport for GatedTransport {
        async fn list_users(&self) -> UserStoreResult<Vec<User>> {
            self.pass().await?;
            self.inner.list_users().await
        }

        async fn get_user(&self, id: &str) -> UserStoreResult<Option<User>> {
            self.inner.get_user(id).await
        }

        async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User> {
            self.inner.create_user(request).await
        }

        async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> UserStoreResult<User> {
            self.pass().await?;
            self.inner.update_user(id, changes).await
        }

        async fn delete_user(&self, id: &str) -> UserStoreResult<()> {
            self.inner.delete_user(id).await
        }
    }

    fn seeded_store() -> UserStore<MemoryUserTransport> {
        UserStore::new(MemoryUserTransport::with_mock_users())
    }

    #[tokio::test]
    async fn test_create_on_empty_store() {
        let store = UserStore::new(MemoryUserTransport::new());

        store.create(CreateUserRequest::new("A", "a@x.com")).await;
        let state = store.snapshot().await;
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].status, UserStatus::Active);
        assert!(!state.is_loading);
        assert!(state.error.is_none());

        store.create(CreateUserRequest::new("B", "b@x.com")).await;
        let state = store.snapshot().await;
        assert_eq!(state.users.len(), 2);
        assert_ne!(state.users[0].id, state.users[1].id);
    }

    #[tokio::test]
    async fn test_list_replaces_users_in_source_order() {
        let store = seeded_store();
        store.create(CreateUserRequest::new("Local", "local@x.com")).await;

        store.list().await;
        let state = store.snapshot().await;
        let ids: Vec<_> = state.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert!(!state.is_loading);

        store.refetch().await;
        assert_eq!(store.snapshot().await.users.len(), 4);
    }

    #[tokio::test]
    async fn test_get_by_id_sets_or_clears_selection() {
        let store = seeded_store();

        store.get_by_id("2").await;
        let state = store.snapshot().await;
        assert_eq!(state.selected_user.map(|u| u.name), Some("Jane Smith".to_string()));

        store.get_by_id("missing").await;
        let state = store.snapshot().await;
        assert!(state.selected_user.is_none());
        assert!(state.error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_update_missing_user_fails_with_not_found() {
        let store = seeded_store();
        store.list().await;
        let before = store.snapshot().await.users;

        store
            .update("missing", UpdateUserRequest::default().name("B"))
            .await;

        let state = store.snapshot().await;
        assert_eq!(state.error, Some(UserStoreError::not_found("User", "missing")));
        assert_eq!(state.error_message().as_deref(), Some("User not found: missing"));
        assert_eq!(state.users, before);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_update_replaces_list_entry_and_selection() {
        let store = seeded_store();
        store.list().await;
        store.get_by_id("1").await;
        let before = store.snapshot().await.user("1").cloned().unwrap();

        store
            .update("1", UpdateUserRequest::default().name("B").status(UserStatus::Inactive))
            .await;

        let state = store.snapshot().await;
        let updated = state.user("1").unwrap();
        assert_eq!(updated.name, "B");
        assert_eq!(updated.status, UserStatus::Inactive);
        assert_eq!(updated.id, before.id);
        assert_eq!(updated.email, before.email);
        assert!(updated.updated_at >= before.updated_at);
        assert_eq!(state.selected_user.as_ref(), Some(updated));
        assert_eq!(state.users.len(), 3);
    }

    #[tokio::test]
    async fn test_update_leaves_other_selection_alone() {
        let store = seeded_store();
        store.list().await;
        store.get_by_id("2").await;

        store.update("1", UpdateUserRequest::default().name("B")).await;

        let state = store.snapshot().await;
        assert_eq!(state.selected_user.unwrap().id, "2");
    }

    #[tokio::test]
    async fn test_delete_removes_one_and_clears_selection() {
        let store = seeded_store();
        store.list().await;
        store.get_by_id("2").await;

        store.delete("2").await;

        let state = store.snapshot().await;
        assert_eq!(state.users.len(), 2);
        assert!(state.user("2").is_none());
        assert!(state.selected_user.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_delete_keeps_unrelated_selection() {
        let store = seeded_store();
        store.list().await;
        store.get_by_id("1").await;

        store.delete("3").await;

        let state = store.snapshot().await;
        assert_eq!(state.users.len(), 2);
        assert_eq!(state.selected_user.unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_delete_missing_user_fails_with_not_found() {
        let store = seeded_store();
        store.list().await;

        store.delete("missing").await;

        let state = store.snapshot().await;
        assert!(state.error.as_ref().is_some_and(UserStoreError::is_not_found));
        assert_eq!(state.users.len(), 3);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_failure_keeps_data_and_next_success_clears_error() {
        let store = UserStore::new(FlakyTransport::seeded("connection reset"));
        store.list().await;

        store.transport().set_failing(true);
        store.list().await;
        let state = store.snapshot().await;
        assert!(!state.is_loading);
        assert_eq!(state.error_message().as_deref(), Some("connection reset"));
        assert_eq!(state.users.len(), 3);

        store.create(CreateUserRequest::new("A", "a@x.com")).await;
        assert!(store.snapshot().await.error.is_some());
        assert_eq!(store.snapshot().await.users.len(), 3);

        store.transport().set_failing(false);
        store.get_by_id("1").await;
        let state = store.snapshot().await;
        assert!(state.error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_empty_transport_message_uses_operation_fallback() {
        let store = UserStore::new(FlakyTransport::seeded(""));
        store.transport().set_failing(true);

        store.list().await;
        assert_eq!(store.error_message().await.as_deref(), Some("Failed to fetch users"));

        store.delete("1").await;
        assert_eq!(store.error_message().await.as_deref(), Some("Failed to delete user"));
    }

    #[tokio::test]
    async fn test_select_user_and_clear_error() {
        let store = UserStore::new(FlakyTransport::seeded("down"));
        store.transport().set_failing(true);
        store.list().await;
        assert!(store.snapshot().await.error.is_some());

        store.clear_error().await;
        assert!(store.snapshot().await.error.is_none());

        let user = User::new("9", "Nine", "nine@x.com");
        store.select_user(Some(user.clone())).await;
        assert_eq!(store.snapshot().await.selected_user, Some(user));

        store.select_user(None).await;
        assert!(store.snapshot().await.selected_user.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_lifecycle() {
        let store = UserStore::new(MemoryUserTransport::new());
        let mut rx = store.subscribe();

        store.create(CreateUserRequest::new("A", "a@x.com")).await;

        let started = rx.try_recv().unwrap();
        assert!(started.is_loading);
        assert!(started.users.is_empty());

        let finished = rx.try_recv().unwrap();
        assert!(!finished.is_loading);
        assert_eq!(finished.users.len(), 1);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_loading_while_request_is_pending() {
        let store = UserStore::new(GatedTransport::seeded());

        let mut list = task::spawn(store.list());
        assert_pending!(list.poll());
        assert!(store.snapshot().await.is_loading);

        store.transport().gate.add_permits(1);
        assert_ready!(list.poll());

        let state = store.snapshot().await;
        assert!(!state.is_loading);
        assert_eq!(state.users.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_request_stops_loading() {
        let transport =
            MemoryUserTransport::with_mock_users().with_latency(TransportLatency::default());
        let store = UserStore::new(transport);

        let result = tokio::time::timeout(Duration::from_millis(100), store.list()).await;
        assert!(result.is_err());
        assert!(!store.snapshot().await.is_loading);

        store.list().await;
        let state = store.snapshot().await;
        assert!(!state.is_loading);
        assert_eq!(state.users.len(), 3);
    }

    #[tokio::test]
    async fn test_dropped_request_publishes_idle_state() {
        let store = UserStore::new(GatedTransport::seeded());
        let mut rx = store.subscribe();

        let mut first = task::spawn(store.list());
        let mut second = task::spawn(store.list());
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert!(rx.try_recv().unwrap().is_loading);
        assert!(rx.try_recv().unwrap().is_loading);

        drop(first);
        assert!(rx.try_recv().unwrap().is_loading);
        assert!(store.snapshot().await.is_loading);

        drop(second);
        assert!(!rx.try_recv().unwrap().is_loading);
        assert!(!store.snapshot().await.is_loading);
    }

    #[tokio::test]
    async fn test_overlapping_requests_keep_loading_until_last_resolves() {
        let store = UserStore::new(GatedTransport::seeded());

        let mut first = task::spawn(store.list());
        let mut second = task::spawn(store.list());
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        store.transport().gate.add_permits(1);
        assert_ready!(first.poll());
        assert!(store.snapshot().await.is_loading);

        store.transport().gate.add_permits(1);
        assert_ready!(second.poll());
        assert!(!store.snapshot().await.is_loading);
    }

    #[tokio::test]
    async fn test_updates_to_same_id_are_serialized() {
        let transport = Arc::new(GatedTransport::seeded());
        let store = UserStore::new(Arc::clone(&transport));

        let mut first = task::spawn(store.update("1", UpdateUserRequest::default().name("B")));
        let mut second = task::spawn(store.update("1", UpdateUserRequest::default().name("C")));
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert_eq!(transport.entered(), 1);

        transport.gate.add_permits(1);
        assert_ready!(first.poll());
        assert_pending!(second.poll());
        assert_eq!(transport.entered(), 2);

        transport.gate.add_permits(1);
        assert_ready!(second.poll());

        let user = transport.inner.get_user("1").await.unwrap().unwrap();
        assert_eq!(user.name, "C");
        assert!(store.id_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_updates_to_different_ids_overlap() {
        let transport = Arc::new(GatedTransport::seeded());
        let store = UserStore::new(Arc::clone(&transport));

        let mut first = task::spawn(store.update("1", UpdateUserRequest::default().name("B")));
        let mut second = task::spawn(store.update("2", UpdateUserRequest::default().name("C")));
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert_eq!(transport.entered(), 2);

        transport.gate.add_permits(2);
        assert_ready!(first.poll());
        assert_ready!(second.poll());
        assert!(!store.snapshot().await.is_loading);
    }
}
