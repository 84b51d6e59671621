//! In-process repositories with the same semantics as the `SQLite` ones.
//!
//! Nothing here survives a restart; the server tests run against these.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use crime_dashboard_crime_models::FirStatus;
use crime_dashboard_fir_models::stats::FirStats;
use crime_dashboard_fir_models::{AttachmentRecord, FirRecord, NewAttachment, NewFir};

use crate::DbError;
use crate::accounts::{
    AccountRepository, NewUser, Session, UserRecord, hash_password, new_salt, new_token,
    normalize_email, verify_password,
};
use crate::firs::FirRepository;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct FirState {
    next_fir_id: i64,
    next_attachment_id: i64,
    firs: Vec<FirRecord>,
}

/// [`FirRepository`] held in memory.
#[derive(Default)]
pub struct MemoryFirRepository {
    state: Mutex<FirState>,
}

impl MemoryFirRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FirRepository for MemoryFirRepository {
    async fn create(
        &self,
        fir: &NewFir,
        attachments: &[NewAttachment],
    ) -> Result<FirRecord, DbError> {
        let mut state = lock(&self.state);

        state.next_fir_id += 1;
        let fir_id = state.next_fir_id;

        let mut stored = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            state.next_attachment_id += 1;
            stored.push(AttachmentRecord {
                id: state.next_attachment_id,
                fir_id,
                file_path: attachment.file_path.clone(),
                file_type: attachment.file_type,
                original_name: attachment.original_name.clone(),
                size_bytes: attachment.size_bytes,
            });
        }

        let record = FirRecord::from_new(fir_id, fir.clone(), Utc::now(), stored);
        state.firs.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<FirRecord>, DbError> {
        let state = lock(&self.state);
        Ok(state.firs.iter().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<FirRecord>, DbError> {
        let state = lock(&self.state);
        Ok(state.firs.iter().find(|f| f.id == id).cloned())
    }

    async fn set_status(&self, id: i64, from: FirStatus, to: FirStatus) -> Result<bool, DbError> {
        let mut state = lock(&self.state);
        match state.firs.iter_mut().find(|f| f.id == id) {
            Some(fir) if fir.status == from => {
                fir.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stats(&self) -> Result<FirStats, DbError> {
        let state = lock(&self.state);
        Ok(FirStats::from_records(&state.firs))
    }
}

struct StoredUser {
    record: UserRecord,
    salt: String,
    hash: String,
}

struct StoredSession {
    user_id: i64,
    session: Session,
}

#[derive(Default)]
struct AccountState {
    users: Vec<StoredUser>,
    sessions: Vec<StoredSession>,
}

/// [`AccountRepository`] held in memory.
#[derive(Default)]
pub struct MemoryAccountRepository {
    state: Mutex<AccountState>,
}

impl MemoryAccountRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, DbError> {
        let email = normalize_email(&user.email);
        let mut state = lock(&self.state);

        if state.users.iter().any(|u| u.record.email == email) {
            return Err(DbError::Conflict(format!("user {email}")));
        }

        let id = i64::try_from(state.users.len()).unwrap_or(i64::MAX - 1) + 1;
        let salt = new_salt();
        let record = UserRecord {
            id,
            name: user.name,
            role: user.role,
            email,
        };
        state.users.push(StoredUser {
            record: record.clone(),
            hash: hash_password(&salt, &user.password),
            salt,
        });
        Ok(record)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, DbError> {
        let state = lock(&self.state);
        Ok(state.users.iter().map(|u| u.record.clone()).collect())
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, DbError> {
        let email = normalize_email(email);
        let state = lock(&self.state);
        Ok(state
            .users
            .iter()
            .find(|u| u.record.email == email && verify_password(&u.salt, password, &u.hash))
            .map(|u| u.record.clone()))
    }

    async fn create_session(&self, user_id: i64, ttl: Duration) -> Result<Session, DbError> {
        let session = Session {
            token: new_token(),
            expires_at: Utc::now() + ttl,
        };
        lock(&self.state).sessions.push(StoredSession {
            user_id,
            session: session.clone(),
        });
        Ok(session)
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<UserRecord>, DbError> {
        let state = lock(&self.state);
        let now = Utc::now();
        let Some(stored) = state
            .sessions
            .iter()
            .find(|s| s.session.token == token && s.session.expires_at > now)
        else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|u| u.record.id == stored.user_id)
            .map(|u| u.record.clone()))
    }

    async fn revoke_session(&self, token: &str) -> Result<(), DbError> {
        lock(&self.state).sessions.retain(|s| s.session.token != token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crime_dashboard_crime_models::UserRole;
    use crime_dashboard_fir_models::FirDraft;

    use super::*;

    fn new_fir(kind: &str) -> NewFir {
        FirDraft {
            complainant_name: Some("Kannan".to_string()),
            complainant_address: Some("12 Beach Road".to_string()),
            incident_date: Some("2024-06-11".to_string()),
            incident_time: Some("21:15".to_string()),
            location: Some("Fishing Harbour".to_string()),
            incident_type: Some(kind.to_string()),
            description: Some("Boat engine stolen".to_string()),
            ..FirDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn memory_firs_behave_like_the_sql_store() {
        let repo = MemoryFirRepository::new();
        let a = repo.create(&new_fir("Theft"), &[]).await.unwrap();
        let b = repo.create(&new_fir("Fraud"), &[]).await.unwrap();
        assert!(b.id > a.id);

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        assert!(
            repo.set_status(a.id, FirStatus::Pending, FirStatus::UnderInvestigation)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .set_status(a.id, FirStatus::Pending, FirStatus::UnderInvestigation)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .set_status(404, FirStatus::Pending, FirStatus::UnderInvestigation)
                .await
                .unwrap()
        );
        assert_eq!(repo.stats().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn memory_accounts_round_trip_sessions() {
        let repo = MemoryAccountRepository::new();
        let user = repo
            .create_user(NewUser {
                name: "Admin".to_string(),
                email: "admin@example.org".to_string(),
                role: UserRole::Admin,
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert!(repo.verify_credentials("admin@example.org", "nope").await.unwrap().is_none());
        let session = repo.create_session(user.id, Duration::hours(1)).await.unwrap();
        assert_eq!(repo.user_for_token(&session.token).await.unwrap(), Some(user));
        repo.revoke_session(&session.token).await.unwrap();
        assert!(repo.user_for_token(&session.token).await.unwrap().is_none());
    }
}
