//! User storage and CRUD state orchestration.
//!
//! This crate provides a transport abstraction for user records, an
//! in-memory transport that emulates network latency, and the store that
//! tracks loading/error state on top of it for a presentation layer.

mod error;
mod memory;
mod state;
mod store;
mod transport;

pub use error::*;
pub use memory::*;
pub use state::*;
pub use store::*;
pub use transport::*;
