//! Core types shared by the Roleypoly API crates.
//!
//! This crate provides the `Result` alias used across the workspace and the
//! ULID-backed identifiers handed out by the API.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, StateId};
