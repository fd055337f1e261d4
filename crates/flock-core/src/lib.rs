//! Core types and trait definitions for the Flock membership store.
//!
//! No HTTP or database code lives here: only the permission catalog, the
//! policy evaluator and the storage abstraction the other crates build on.

pub mod error;
pub mod permission;
pub mod person;
pub mod policy;
pub mod provision;
pub mod store;
pub mod user;

pub use error::{Error, Result};
