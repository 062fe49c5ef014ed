//! First-run admin account creation.
//!
//! When `ADMIN_EMAIL` and `ADMIN_PASSWORD` are both set, [`ensure_admin`]
//! creates that user with the seeded `Admin` role unless the email is
//! already registered. Runs once at startup, after migrations.

use sonaa_db::models::user::CreateUser;
use sonaa_db::repositories::{RoleRepo, UserRepo};
use sonaa_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Name of the role created by the initial migration.
pub const ADMIN_ROLE: &str = "Admin";

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminSeed {
    /// Read `ADMIN_EMAIL`, `ADMIN_PASSWORD` and `ADMIN_NAME` (default `Admin`).
    /// Returns `None` unless both email and password are set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty())?;
        let password = std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty())?;
        let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".into());
        Some(Self {
            name,
            email,
            password,
        })
    }
}

/// Create the admin account if it does not exist. Returns `true` if created.
pub async fn ensure_admin(pool: &DbPool, seed: &AdminSeed) -> AppResult<bool> {
    if UserRepo::find_by_email(pool, &seed.email).await?.is_some() {
        return Ok(false);
    }

    validate_password_strength(&seed.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;

    let role = RoleRepo::find_by_name(pool, ADMIN_ROLE)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{ADMIN_ROLE}' is missing")))?;

    let password_hash = hash_password(&seed.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: seed.name.clone(),
            email: seed.email.clone(),
            password_hash,
            role_id: Some(role.id),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Admin account created");
    Ok(true)
}
