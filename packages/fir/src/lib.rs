#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! FIR filing and case lifecycle.
//!
//! [`FirService`] ties validation, evidence storage, and the FIR repository
//! together so that a submission either produces a complete record (the FIR
//! plus every attachment) or fails without leaving anything behind.

use std::sync::Arc;

use crime_dashboard_crime_models::{FirStatus, InvalidTransitionError};
use crime_dashboard_database::DbError;
use crime_dashboard_database::firs::FirRepository;
use crime_dashboard_fir_models::search::{self, FIRS_PER_PAGE, Page};
use crime_dashboard_fir_models::stats::FirStats;
use crime_dashboard_fir_models::{FirDraft, FirRecord, NewAttachment, ValidationError};
use crime_dashboard_storage::{AttachmentStore, StorageError};
use thiserror::Error;

/// An uploaded evidence file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Errors from FIR operations.
#[derive(Debug, Error)]
pub enum FirError {
    /// The submission failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No FIR has this id.
    #[error("FIR {id} not found")]
    NotFound {
        /// Requested id.
        id: i64,
    },

    /// An evidence file could not be written.
    #[error("Failed to store evidence: {0}")]
    Storage(#[from] StorageError),

    /// The requested status change is not allowed.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// The repository failed.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// FIR operations over a repository and an attachment store.
#[derive(Clone)]
pub struct FirService {
    repo: Arc<dyn FirRepository>,
    store: Arc<dyn AttachmentStore>,
}

impl FirService {
    #[must_use]
    pub fn new(repo: Arc<dyn FirRepository>, store: Arc<dyn AttachmentStore>) -> Self {
        Self { repo, store }
    }

    /// Files a new FIR with its evidence.
    ///
    /// The draft is validated before anything is written. Files are stored
    /// next; if one fails, the ones already written are removed. The FIR
    /// and its attachment rows are then inserted together, and if that
    /// fails the stored files are removed as well.
    ///
    /// # Errors
    ///
    /// * [`FirError::Validation`] if the draft is invalid
    /// * [`FirError::Storage`] if a file cannot be written
    /// * [`FirError::Database`] if the insert fails
    pub async fn create(
        &self,
        draft: FirDraft,
        files: Vec<UploadedFile>,
    ) -> Result<FirRecord, FirError> {
        let fir = draft.validate()?;

        let mut stored: Vec<NewAttachment> = Vec::with_capacity(files.len());
        for file in &files {
            match self.store.store(&file.original_name, &file.bytes).await {
                Ok(attachment) => stored.push(attachment),
                Err(e) => {
                    log::error!("Failed to store evidence {:?}: {e}", file.original_name);
                    self.discard(&stored).await;
                    return Err(e.into());
                }
            }
        }

        match self.repo.create(&fir, &stored).await {
            Ok(record) => Ok(record),
            Err(e) => {
                log::error!("Failed to persist FIR: {e}");
                self.discard(&stored).await;
                Err(e.into())
            }
        }
    }

    async fn discard(&self, attachments: &[NewAttachment]) {
        for attachment in attachments {
            if let Err(e) = self.store.remove(&attachment.file_path).await {
                log::warn!("Failed to remove orphaned file {}: {e}", attachment.file_path);
            }
        }
    }

    /// All FIRs matching `term` (or all of them), newest first.
    ///
    /// # Errors
    ///
    /// Returns [`FirError::Database`] if the repository fails.
    pub async fn list(&self, term: Option<&str>) -> Result<Vec<FirRecord>, FirError> {
        let firs = self.repo.list().await?;
        Ok(match term {
            Some(term) => search::filter(firs, term),
            None => firs,
        })
    }

    /// One page of the FIRs matching `term`.
    ///
    /// # Errors
    ///
    /// Returns [`FirError::Database`] if the repository fails.
    pub async fn page(&self, term: Option<&str>, page: usize) -> Result<Page<FirRecord>, FirError> {
        let firs = self.list(term).await?;
        Ok(search::paginate(firs, page, FIRS_PER_PAGE))
    }

    /// # Errors
    ///
    /// * [`FirError::NotFound`] if there is no such FIR
    /// * [`FirError::Database`] if the repository fails
    pub async fn get(&self, id: i64) -> Result<FirRecord, FirError> {
        self.repo.get(id).await?.ok_or(FirError::NotFound { id })
    }

    /// Moves a FIR to `target`, which must be the next status in its
    /// lifecycle.
    ///
    /// # Errors
    ///
    /// * [`FirError::NotFound`] if there is no such FIR
    /// * [`FirError::InvalidTransition`] if `target` is not the next status,
    ///   including when a concurrent update got there first
    /// * [`FirError::Database`] if the repository fails
    pub async fn transition(&self, id: i64, target: FirStatus) -> Result<FirRecord, FirError> {
        let current = self.get(id).await?;
        current.status.transition_to(target)?;

        if !self.repo.set_status(id, current.status, target).await? {
            // Someone else moved it between our read and write
            let now = self.get(id).await?;
            return Err(InvalidTransitionError {
                from: now.status,
                to: target,
            }
            .into());
        }

        log::info!("FIR {id} moved from {} to {target}", current.status);

        Ok(FirRecord {
            status: target,
            ..current
        })
    }

    /// # Errors
    ///
    /// Returns [`FirError::Database`] if the repository fails.
    pub async fn stats(&self) -> Result<FirStats, FirError> {
        Ok(self.repo.stats().await?)
    }
}
