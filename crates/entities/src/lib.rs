//! Core entity definitions for the scaffold.
//!
//! This crate defines the data types shared between the user store and the
//! presentation layer that observes it.

mod user;

pub use user::*;
