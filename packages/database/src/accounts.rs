//! Dashboard users and login sessions.
//!
//! Passwords are stored as an iterated, salted SHA-256 digest with a random
//! per-user salt and checked in constant time. Session tokens are random
//! UUIDs with an expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crime_dashboard_crime_models::UserRole;
use moosicbox_json_utils::database::ToValue as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

/// A dashboard account to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub password: String,
}

/// A stored account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub email: String,
}

/// An issued login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Storage for accounts and sessions.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, DbError>;

    /// Lists every account ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn list_users(&self) -> Result<Vec<UserRecord>, DbError>;

    /// Returns the account if `password` matches.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, DbError>;

    /// Issues a session for `user_id` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    async fn create_session(&self, user_id: i64, ttl: Duration) -> Result<Session, DbError>;

    /// Resolves an unexpired session token to its account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn user_for_token(&self, token: &str) -> Result<Option<UserRecord>, DbError>;

    /// Deletes a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    async fn revoke_session(&self, token: &str) -> Result<(), DbError>;
}

/// Emails are compared case-insensitively.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Generates a fresh random salt.
#[must_use]
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// SHA-256 rounds applied to every password hash.
pub const HASH_ROUNDS: u32 = 10_000;

/// Hex digest of `salt || password`, re-hashed [`HASH_ROUNDS`] times.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(salt.as_bytes())
            .chain_update(digest)
            .finalize();
    }
    hex::encode(digest)
}

/// Whether `password` hashes to `stored` under `salt`, compared in constant
/// time.
#[must_use]
pub fn verify_password(salt: &str, password: &str, stored: &str) -> bool {
    hash_password(salt, password)
        .as_bytes()
        .ct_eq(stored.as_bytes())
        .into()
}

/// Generates a session token.
#[must_use]
pub fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// [`AccountRepository`] backed by a `switchy_database` connection.
pub struct SqliteAccountRepository {
    db: Arc<dyn Database>,
}

impl SqliteAccountRepository {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn user_from_row(row: &Row) -> Result<UserRecord, DbError> {
    let id: i64 = row
        .to_value("id")
        .map_err(|e| DbError::conversion(format!("Failed to parse user id: {e}")))?;
    let name: String = row
        .to_value("name")
        .map_err(|e| DbError::conversion(format!("Failed to parse user name: {e}")))?;
    let email: String = row
        .to_value("email")
        .map_err(|e| DbError::conversion(format!("Failed to parse user email: {e}")))?;
    let role: String = row
        .to_value("role")
        .map_err(|e| DbError::conversion(format!("Failed to parse user role: {e}")))?;

    Ok(UserRecord {
        id,
        name,
        role: role
            .parse()
            .map_err(|_| DbError::conversion(format!("Unexpected role value: {role}")))?,
        email,
    })
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, DbError> {
        let email = normalize_email(&user.email);

        let existing = self
            .db
            .query_raw_params(
                "SELECT id FROM users WHERE email = $1",
                &[DatabaseValue::String(email.clone())],
            )
            .await?;
        if !existing.is_empty() {
            return Err(DbError::Conflict(format!("user {email}")));
        }

        let salt = new_salt();
        let rows = self
            .db
            .query_raw_params(
                "INSERT INTO users (name, role, email, password_hash, password_salt, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id, name, role, email",
                &[
                    DatabaseValue::String(user.name),
                    DatabaseValue::String(user.role.to_string()),
                    DatabaseValue::String(email),
                    DatabaseValue::String(hash_password(&salt, &user.password)),
                    DatabaseValue::String(salt),
                    DatabaseValue::String(Utc::now().to_rfc3339()),
                ],
            )
            .await?;

        let record = user_from_row(
            rows.first()
                .ok_or_else(|| DbError::conversion("INSERT INTO users returned no row"))?,
        )?;
        log::info!("Created {} account {}", record.role, record.email);
        Ok(record)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, DbError> {
        self.db
            .query_raw_params("SELECT id, name, role, email FROM users ORDER BY id", &[])
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id, name, role, email, password_hash, password_salt
                 FROM users WHERE email = $1",
                &[DatabaseValue::String(normalize_email(email))],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let stored: String = row
            .to_value("password_hash")
            .map_err(|e| DbError::conversion(format!("Failed to parse password hash: {e}")))?;
        let salt: String = row
            .to_value("password_salt")
            .map_err(|e| DbError::conversion(format!("Failed to parse password salt: {e}")))?;

        if verify_password(&salt, password, &stored) {
            user_from_row(row).map(Some)
        } else {
            Ok(None)
        }
    }

    async fn create_session(&self, user_id: i64, ttl: Duration) -> Result<Session, DbError> {
        let now = Utc::now();
        let session = Session {
            token: new_token(),
            expires_at: now + ttl,
        };

        self.db
            .exec_raw_params(
                "INSERT INTO sessions (token, user_id, created_at, expires_at)
                 VALUES ($1, $2, $3, $4)",
                &[
                    DatabaseValue::String(session.token.clone()),
                    DatabaseValue::Int64(user_id),
                    DatabaseValue::String(now.to_rfc3339()),
                    DatabaseValue::String(session.expires_at.to_rfc3339()),
                ],
            )
            .await?;

        // Opportunistic sweep of stale sessions
        self.db
            .exec_raw_params(
                "DELETE FROM sessions WHERE expires_at <= $1",
                &[DatabaseValue::String(now.to_rfc3339())],
            )
            .await?;

        Ok(session)
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<UserRecord>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT u.id, u.name, u.role, u.email, s.expires_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = $1",
                &[DatabaseValue::String(token.to_string())],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let expires_at: String = row
            .to_value("expires_at")
            .map_err(|e| DbError::conversion(format!("Failed to parse expiry: {e}")))?;
        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|e| DbError::conversion(format!("Bad expires_at {expires_at}: {e}")))?;

        if expires_at <= Utc::now() {
            return Ok(None);
        }

        user_from_row(row).map(Some)
    }

    async fn revoke_session(&self, token: &str) -> Result<(), DbError> {
        self.db
            .exec_raw_params(
                "DELETE FROM sessions WHERE token = $1",
                &[DatabaseValue::String(token.to_string())],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cleanup, temp_db};

    fn investigator() -> NewUser {
        NewUser {
            name: "Inspector Meena".to_string(),
            email: "Meena@Example.org".to_string(),
            role: UserRole::Investigator,
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn hashing_is_salted() {
        assert_eq!(hash_password("a", "pw"), hash_password("a", "pw"));
        assert_ne!(hash_password("a", "pw"), hash_password("b", "pw"));
        assert_eq!(hash_password("a", "pw").len(), 64);
    }

    #[test]
    fn verification_matches_only_the_stored_hash() {
        let stored = hash_password("salt", "open sesame");
        assert!(verify_password("salt", "open sesame", &stored));
        assert!(!verify_password("salt", "open sesame!", &stored));
        assert!(!verify_password("pepper", "open sesame", &stored));
        assert!(!verify_password("salt", "open sesame", &stored[..32]));
    }

    #[tokio::test]
    async fn create_and_verify_user() {
        let (db, path) = temp_db("accounts_verify").await;
        let repo = SqliteAccountRepository::new(Arc::from(db));

        let created = repo.create_user(investigator()).await.unwrap();
        assert_eq!(created.email, "meena@example.org");
        assert_eq!(created.role, UserRole::Investigator);

        let ok = repo
            .verify_credentials("MEENA@example.org", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(ok, Some(created));
        assert!(
            repo.verify_credentials("meena@example.org", "wrong")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.verify_credentials("nobody@example.org", "s3cret-pass")
                .await
                .unwrap()
                .is_none()
        );

        cleanup(&path);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (db, path) = temp_db("accounts_dup").await;
        let repo = SqliteAccountRepository::new(Arc::from(db));

        repo.create_user(investigator()).await.unwrap();
        let err = repo.create_user(investigator()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert_eq!(repo.list_users().await.unwrap().len(), 1);

        cleanup(&path);
    }

    #[tokio::test]
    async fn sessions_resolve_until_revoked_or_expired() {
        let (db, path) = temp_db("accounts_session").await;
        let repo = SqliteAccountRepository::new(Arc::from(db));
        let user = repo.create_user(investigator()).await.unwrap();

        let session = repo.create_session(user.id, Duration::hours(1)).await.unwrap();
        assert_eq!(
            repo.user_for_token(&session.token).await.unwrap(),
            Some(user.clone())
        );

        repo.revoke_session(&session.token).await.unwrap();
        assert!(repo.user_for_token(&session.token).await.unwrap().is_none());

        let expired = repo
            .create_session(user.id, Duration::seconds(-1))
            .await
            .unwrap();
        assert!(repo.user_for_token(&expired.token).await.unwrap().is_none());

        cleanup(&path);
    }
}
