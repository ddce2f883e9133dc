//! `POST /webhook`: entry change notifications from the content backend.
//!
//! Responses are plain text. The body is parsed as JSON whatever its declared
//! content type, since the backend sends its own vendor media type.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use release::{Eligibility, EntryId, EntryNotification, ReleaseError, ValidationError};
use tracing::{error, info, warn};

use crate::AppState;

/// Body returned when the entry is not ready for release.
pub const NO_ACTION: &str = "No action taken.";

/// Failures of the webhook route, each mapped to a status and a text body.
#[derive(Debug)]
pub enum WebhookError {
    /// The body is not a JSON notification.
    Malformed(serde_json::Error),
    /// The notification lacks required fields or carries an invalid date.
    Invalid(ValidationError),
    /// Scheduling failed after the notification was accepted.
    Processing {
        /// The entry being scheduled.
        entry_id: EntryId,
        /// What went wrong.
        source: ReleaseError,
    },
}

impl From<ValidationError> for WebhookError {
    fn from(err: ValidationError) -> Self {
        WebhookError::Invalid(err)
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::Malformed(_) => {
                (StatusCode::BAD_REQUEST, "Malformed webhook payload.").into_response()
            }
            WebhookError::Invalid(ValidationError::InvalidReleaseDate { .. }) => {
                (StatusCode::BAD_REQUEST, "Invalid release date.").into_response()
            }
            WebhookError::Invalid(_) => {
                (StatusCode::BAD_REQUEST, "Entry is missing required fields.").into_response()
            }
            WebhookError::Processing { entry_id, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process entry {entry_id}"),
            )
                .into_response(),
        }
    }
}

/// Schedules the changed entry if its work item is ready for release.
pub async fn receive_entry_change(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<String, WebhookError> {
    let notification: EntryNotification = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "Malformed webhook payload");
        WebhookError::Malformed(err)
    })?;

    let candidate = match state.scheduler.assess(&notification) {
        Ok(Eligibility::Eligible(candidate)) => candidate,
        Ok(Eligibility::Ineligible(reason)) => {
            info!(entry_id = ?notification.entry_id(), %reason, "Entry is not ready for release. No action taken.");
            return Ok(NO_ACTION.to_string());
        }
        Err(err) => {
            warn!(error = %err, "Rejected webhook payload");
            return Err(err.into());
        }
    };

    let scheduled = state
        .scheduler
        .schedule(&candidate)
        .await
        .map_err(|source| {
            error!(entry_id = %candidate.entry_id, error = %source, "Failed to process entry");
            WebhookError::Processing {
                entry_id: candidate.entry_id.clone(),
                source,
            }
        })?;

    Ok(format!(
        "Entry {} and its references added to release {}",
        scheduled.entry_id, scheduled.release_id
    ))
}
