//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the user id from a JWT Bearer token.
//! - [`auth::CurrentActor`] -- that user resolved with its role capabilities.
//! - [`rbac::RequireProjectCreator`] -- requires `can_add_project`.
//! - [`rbac::RequireStageReviewer`] -- requires `can_approve_stages`.

pub mod auth;
pub mod rbac;
