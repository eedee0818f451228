//! In-memory user transport with simulated latency.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use entities::{CreateUserRequest, UpdateUserRequest, User, UserStatus};
use tokio::sync::RwLock;

use crate::{UserStoreError, UserStoreResult, UserTransport};

/// Artificial delay applied before each transport call completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportLatency {
    pub list: Duration,
    pub get: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for TransportLatency {
    fn default() -> Self {
        Self {
            list: Duration::from_millis(500),
            get: Duration::from_millis(300),
            create: Duration::from_millis(800),
            update: Duration::from_millis(600),
            delete: Duration::from_millis(400),
        }
    }
}

impl TransportLatency {
    /// No delay at all.
    pub fn none() -> Self {
        Self {
            list: Duration::ZERO,
            get: Duration::ZERO,
            create: Duration::ZERO,
            update: Duration::ZERO,
            delete: Duration::ZERO,
        }
    }

    /// Multiplies every delay by `factor`. Negative or non-finite factors
    /// disable latency; results too large for a `Duration` saturate.
    pub fn scaled(self, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return Self::none();
        }
        Self {
            list: scale(self.list, factor),
            get: scale(self.get, factor),
            create: scale(self.create, factor),
            update: scale(self.update, factor),
            delete: scale(self.delete, factor),
        }
    }
}

fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// In-memory user transport standing in for a backend.
///
/// Records are kept in insertion order. IDs come from a counter that only
/// moves forward, so an ID is never handed out twice, even after a delete.
#[derive(Debug)]
pub struct MemoryUserTransport {
    users: RwLock<Vec<User>>,
    next_id: AtomicU64,
    latency: TransportLatency,
}

impl Default for MemoryUserTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserTransport {
    /// Creates an empty transport without latency.
    pub fn new() -> Self {
        Self::with_users(Vec::new())
    }

    /// Creates a transport holding `users`, without latency.
    pub fn with_users(users: Vec<User>) -> Self {
        let highest = users
            .iter()
            .filter_map(|u| u.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            users: RwLock::new(users),
            next_id: AtomicU64::new(highest + 1),
            latency: TransportLatency::none(),
        }
    }

    /// Creates a transport seeded with the demo users.
    pub fn with_mock_users() -> Self {
        Self::with_users(mock_users())
    }

    /// Sets the simulated latency.
    pub fn with_latency(mut self, latency: TransportLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the simulated latency.
    pub fn latency(&self) -> TransportLatency {
        self.latency
    }

    /// Returns the number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns true if no users are stored.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn generate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl UserTransport for MemoryUserTransport {
    async fn list_users(&self) -> UserStoreResult<Vec<User>> {
        self.delay(self.latency.list).await;
        let users = self.users.read().await;
        tracing::debug!(count = users.len(), "Listed users");
        Ok(users.clone())
    }

    async fn get_user(&self, id: &str) -> UserStoreResult<Option<User>> {
        self.delay(self.latency.get).await;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User> {
        self.delay(self.latency.create).await;
        let user = User::from_request(self.generate_id(), request, Utc::now());
        let mut users = self.users.write().await;
        users.push(user.clone());
        tracing::debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> UserStoreResult<User> {
        self.delay(self.latency.update).await;
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| UserStoreError::not_found("User", id))?;
        user.apply(changes, Utc::now());
        tracing::debug!(user_id = %id, "Updated user");
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> UserStoreResult<()> {
        self.delay(self.latency.delete).await;
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| UserStoreError::not_found("User", id))?;
        users.remove(index);
        tracing::debug!(user_id = %id, "Deleted user");
        Ok(())
    }
}

/// The demo users the scaffold ships with.
pub fn mock_users() -> Vec<User> {
    vec![
        User::new_at("1", "John Doe", "john.doe@example.com", seeded_at(2024, 1, 15, 10, 0))
            .with_avatar(
                "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=32&h=32&fit=crop&crop=face",
            ),
        User::new_at("2", "Jane Smith", "jane.smith@example.com", seeded_at(2024, 1, 16, 14, 30))
            .with_avatar(
                "https://images.unsplash.com/photo-1494790108755-2616b612b786?w=32&h=32&fit=crop&crop=face",
            ),
        User::new_at("3", "Bob Johnson", "bob.johnson@example.com", seeded_at(2024, 1, 17, 9, 15))
            .with_status(UserStatus::Inactive),
    ]
}

fn seeded_at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}
