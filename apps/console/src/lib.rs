//! Scaffold console
//!
//! Wires the user store and the date picker together behind environment
//! configuration and structured logging, standing in for the presentation
//! layer.

pub mod config;
pub mod demo;

use std::sync::Arc;

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use user_store::{UserStore, UserTransport};

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Logs every state change the store publishes until the store goes away.
pub fn spawn_state_logger<T: UserTransport>(store: &Arc<UserStore<T>>) -> JoinHandle<()> {
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(state) => {
                    let error = state.error_message().unwrap_or_default();
                    tracing::debug!(
                        is_loading = state.is_loading,
                        users = state.users.len(),
                        error = %error,
                        "User store state changed"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "State logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
