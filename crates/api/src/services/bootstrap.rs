//! Admin bootstrap for initial setup.
//!
//! Creates the first admin account on startup when configured. Idempotent:
//! once an admin exists, it does nothing.

use domain::models::Role;
use persistence::repositories::UserRepository;
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AuthConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Creates the configured admin account if no admin exists yet.
///
/// Called after migrations on startup.
pub async fn bootstrap_admin(pool: &PgPool, config: &AuthConfig) -> Result<(), BootstrapError> {
    if config.admin_email.is_empty() {
        return Ok(());
    }

    if config.admin_password.is_empty() {
        warn!("FB__AUTH__ADMIN_EMAIL is set but FB__AUTH__ADMIN_PASSWORD is empty, skipping bootstrap");
        return Ok(());
    }

    let repo = UserRepository::new(pool.clone());
    if repo.count_admins().await? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&config.admin_password)?;
    let user = repo
        .create(&config.admin_email, &password_hash, Role::Admin)
        .await?;

    info!(email = %user.email, "Created initial admin account");
    Ok(())
}
