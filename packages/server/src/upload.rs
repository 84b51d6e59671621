//! Decoding of multipart FIR submissions.
//!
//! Parts with a filename are evidence files; every other part is a text
//! field of the draft. Browsers submit an empty-named file part when no file
//! was picked, which is skipped.

use actix_multipart::Multipart;
use crime_dashboard_fir::UploadedFile;
use crime_dashboard_fir_models::{FirDraft, ValidationError};
use futures::StreamExt as _;

use crate::error::ApiError;

/// Largest accepted text field.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Most evidence files accepted in one submission.
pub const MAX_FILES: usize = 20;

/// A decoded submission.
#[derive(Debug, Default)]
pub struct Submission {
    pub draft: FirDraft,
    pub files: Vec<UploadedFile>,
}

/// Reads every part of `payload`.
///
/// # Errors
///
/// * [`ApiError::InvalidBody`] if the multipart stream is malformed or a
///   text field is not UTF-8
/// * [`ApiError::Validation`] if a file exceeds `max_file_bytes`, a text
///   field exceeds [`MAX_TEXT_FIELD_BYTES`], or more than [`MAX_FILES`]
///   files are attached
pub async fn read_submission(
    mut payload: Multipart,
    max_file_bytes: usize,
) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::InvalidBody(e.to_string()))?;

        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if filename.as_deref().is_some_and(|f| !f.is_empty())
            && submission.files.len() >= MAX_FILES
        {
            return Err(ValidationError::single(
                &name,
                format!("at most {MAX_FILES} files may be attached"),
            )
            .into());
        }

        let limit = if filename.is_some() {
            max_file_bytes
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::InvalidBody(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                let message = filename.as_deref().map_or_else(
                    || format!("exceeds the {limit} byte limit"),
                    |f| format!("file {f:?} exceeds the {limit} byte limit"),
                );
                return Err(ValidationError::single(&name, message).into());
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            Some(original_name) if original_name.is_empty() => {}
            Some(original_name) => submission.files.push(UploadedFile {
                original_name,
                bytes,
            }),
            None => {
                let value = String::from_utf8(bytes).map_err(|_| {
                    ApiError::InvalidBody(format!("field {name:?} is not valid UTF-8"))
                })?;
                if !submission.draft.set_field(&name, value) {
                    log::debug!("Ignoring unknown form field {name:?}");
                }
            }
        }
    }

    Ok(submission)
}
