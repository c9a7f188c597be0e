use thiserror::Error;
use tracing::info;

use super::models::{NewUser, UserRole};
use super::repository::UserRepository;
use crate::auth;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to hash seed password: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Account attempted once at startup.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub password: &'static str,
    pub role: UserRole,
}

/// The two fixed accounts of this application.
pub fn default_seed() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "irfan",
            email: "irfan@fasisi.com",
            phone: "+6281234567890",
            password: "irfan123",
            role: UserRole::SuperAdmin,
        },
        SeedUser {
            username: "sisti",
            email: "sisti@fasisi.com",
            phone: "+6289876543210",
            password: "sisti123",
            role: UserRole::User,
        },
    ]
}

/// Idempotent startup seed. A uniqueness violation on any account means it
/// is already present and is not an error; any other failure propagates.
pub async fn seed_users(
    repo: &dyn UserRepository,
    seeds: &[SeedUser],
) -> Result<(), SeedError> {
    for seed in seeds {
        let password_hash = auth::hash_password(seed.password)?;
        let result = repo
            .create(NewUser {
                username: seed.username.to_string(),
                email: seed.email.to_string(),
                phone: Some(seed.phone.to_string()),
                password_hash,
                role: seed.role,
            })
            .await;

        match result {
            Ok(user) => info!("Seeded user {} ({})", user.username, user.role),
            Err(err) if is_unique_violation(&err) => {
                info!("User {} already seeded", seed.username);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    // SQLSTATE 23505: unique_violation
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
