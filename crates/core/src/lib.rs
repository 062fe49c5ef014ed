//! Domain core for the Sonaa CRM project workflow engine.
//!
//! Zero internal dependencies so the db and api crates (and any future
//! tooling) can share the same rules.

pub mod access;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod stage;
pub mod types;
