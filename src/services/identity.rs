use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db::DbPool,
    error::ApiError,
    models::{
        session::Session,
        user::{PublicUser, UserRecord},
    },
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct IdentityService {
    db: DbPool,
    session_ttl: Duration,
}

impl IdentityService {
    pub fn new(db: DbPool, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let email = normalize_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::weak_password());
        }

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ApiError::email_taken());
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| ApiError::Other(anyhow::anyhow!("password hashing failed: {err}")))?
            .to_string();

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.db)
        .await;
        match inserted {
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(ApiError::email_taken())
            }
            other => {
                other?;
            }
        }

        self.open_session(&user).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let email = normalize_email(email)?;
        let Some(user) = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.db)
            .await?
        else {
            return Err(ApiError::invalid_credentials());
        };

        let parsed = PasswordHash::new(&user.password_hash).map_err(|err| {
            ApiError::Other(anyhow::anyhow!("stored password hash is corrupt: {err}"))
        })?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(ApiError::invalid_credentials());
        }

        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&user.id)
            .execute(&self.db)
            .await?;

        self.open_session(&user).await
    }

    pub async fn get_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(token_fingerprint(token))
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(ApiError::invalid_token)?;

        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(&session.user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(ApiError::invalid_token)?;

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
        })
    }

    // Signing out an unknown token is not an error.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_fingerprint(token))
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn open_session(&self, user: &UserRecord) -> Result<AuthTokens, ApiError> {
        let token = generate_token();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.id)
        .bind(token_fingerprint(&token))
        .bind(now)
        .bind(now + self.session_ttl)
        .execute(&self.db)
        .await?;

        Ok(AuthTokens {
            access_token: token,
            user: PublicUser::from(user),
        })
    }
}

fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::invalid_email()),
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// Only the fingerprint of a token is ever stored.
fn token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
