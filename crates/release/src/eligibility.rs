//! Eligibility gate for entry change notifications.
//!
//! Decides, without any I/O, whether a notification should schedule its entry
//! for release. Malformed notifications are [`ValidationError`]s; well-formed
//! notifications for entries that are not ready produce
//! [`Eligibility::Ineligible`], which callers report as "no action taken".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EntryId, Locale, ReleaseDate, ValidationError, WorkItemRef};

/// Workflow state a work item must be in for its content to be scheduled.
pub const READY_FOR_RELEASE: &str = "4.1 - Ready for Release";

/// Entry field holding the linked work-item references.
pub const WORK_ITEM_FIELD: &str = "workItemId";

/// Body of an entry change notification sent by the content backend.
///
/// Only the parts the gate reads are modelled; every other key is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryNotification {
    /// System metadata of the changed entry.
    #[serde(default)]
    pub sys: Option<NotificationSys>,

    /// Field name → locale → value, as in the stored entry.
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
}

/// System metadata carried by an [`EntryNotification`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSys {
    /// Id of the changed entry.
    #[serde(default)]
    pub id: Option<String>,
}

impl EntryNotification {
    /// Returns the entry id, if the notification carries a non-empty one.
    pub fn entry_id(&self) -> Option<EntryId> {
        self.sys.as_ref()?.id.clone().and_then(EntryId::new)
    }

    fn work_items(&self, locale: &Locale) -> Option<&Vec<Value>> {
        self.fields
            .as_ref()?
            .get(WORK_ITEM_FIELD)?
            .get(locale.as_str())?
            .as_array()
            .filter(|items| !items.is_empty())
    }
}

/// An entry that passed the gate, with the day it is released on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCandidate {
    /// The entry to schedule.
    pub entry_id: EntryId,
    /// Calendar day of the release.
    pub release_date: ReleaseDate,
}

/// Why a well-formed notification does not schedule anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IneligibleReason {
    /// The work item is in some other workflow state.
    NotReady {
        /// The state found, if any.
        state: Option<String>,
    },
    /// The work item has no release date yet.
    MissingReleaseDate,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibleReason::NotReady { state: Some(state) } => {
                write!(f, "work item is in state '{state}'")
            }
            IneligibleReason::NotReady { state: None } => f.write_str("work item has no state"),
            IneligibleReason::MissingReleaseDate => f.write_str("work item has no release date"),
        }
    }
}

/// Outcome of the eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Schedule the entry.
    Eligible(ReleaseCandidate),
    /// Take no action.
    Ineligible(IneligibleReason),
}

/// Runs the eligibility gate on `notification`, reading the work-item field
/// under `locale`.
///
/// Only the first work-item reference is considered.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the entry id or the work-item reference
/// is missing, or when a ready work item carries a release date that is
/// present but unparseable. A reference of any other shape is simply not
/// ready.
pub fn evaluate(
    notification: &EntryNotification,
    locale: &Locale,
) -> Result<Eligibility, ValidationError> {
    let entry_id = notification
        .entry_id()
        .ok_or(ValidationError::MissingEntryId)?;
    let first = notification
        .work_items(locale)
        .and_then(|items| items.first())
        .ok_or(ValidationError::MissingWorkItem)?;
    let work_item = WorkItemRef::from_value(first);

    if work_item.state.as_deref() != Some(READY_FOR_RELEASE) {
        return Ok(Eligibility::Ineligible(IneligibleReason::NotReady {
            state: work_item.state,
        }));
    }

    match release_date(work_item.release_date.as_ref())? {
        Some(release_date) => Ok(Eligibility::Eligible(ReleaseCandidate {
            entry_id,
            release_date,
        })),
        None => Ok(Eligibility::Ineligible(IneligibleReason::MissingReleaseDate)),
    }
}

/// Strings are parsed as dates or timestamps and numbers as epoch
/// milliseconds. Absent and blank values mean no date.
fn release_date(value: Option<&Value>) -> Result<Option<ReleaseDate>, ValidationError> {
    let invalid = |raw: String| ValidationError::InvalidReleaseDate { raw };
    match value {
        None => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => ReleaseDate::parse(raw)
            .map(Some)
            .ok_or_else(|| invalid(raw.clone())),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .or_else(|| millis.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(ReleaseDate::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| invalid(millis.to_string())),
        Some(other) => Err(invalid(other.to_string())),
    }
}
