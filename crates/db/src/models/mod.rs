//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the database row and,
//! where inserts happen outside the domain core, a `Deserialize` create DTO.

pub mod project;
pub mod role;
pub mod user;
