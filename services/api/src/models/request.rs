//! Pending publication requests and the submission form

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use media::MediaBundle;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::event::{Category, EventDetails, GeoPoint};

/// A submitted event awaiting moderation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: EventDetails,
    pub created_at: DateTime<Utc>,
}

/// A pending request with its owner's display name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(flatten)]
    pub request: EventRequest,
    pub username: String,
}

/// Raw text fields of a submission, as they arrive in the multipart body
///
/// Both the singular names and the plural names used by the web client
/// are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SubmissionForm {
    /// Record a text field; returns false for names this form does not know
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" | "titles" => &mut self.title,
            "description" | "descriptions" => &mut self.description,
            "location" | "locations" => &mut self.location,
            "category" => &mut self.category,
            "startDate" | "startDates" => &mut self.start_date,
            "endDate" | "endDates" => &mut self.end_date,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Decode every field into its typed form
    pub fn validate(self) -> Result<Submission, ApiError> {
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;

        let raw_location = required(self.location, "location")?;
        let location: GeoPoint = serde_json::from_str(&raw_location).map_err(|e| {
            ApiError::Validation(format!(
                "location must be a JSON object with numeric lat and long: {}",
                e
            ))
        })?;
        location.check()?;

        let category = required(self.category, "category")?.parse::<Category>()?;

        let start_date = parse_event_date("startDate", &required(self.start_date, "startDate")?)?;
        let end_date = parse_event_date("endDate", &required(self.end_date, "endDate")?)?;
        if end_date < start_date {
            return Err(ApiError::Validation(
                "endDate must not be before startDate".to_string(),
            ));
        }

        Ok(Submission {
            title,
            description,
            location,
            category,
            start_date,
            end_date,
        })
    }
}

/// A validated submission, before its media has been hosted
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    pub category: Category,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Submission {
    pub fn into_details(self, owner_id: Uuid, medias: MediaBundle) -> EventDetails {
        EventDetails {
            owner_id,
            title: self.title,
            description: self.description,
            location: self.location,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
            medias,
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

/// Accepts RFC 3339, a `datetime-local` value or a bare date; the latter two are UTC
fn parse_event_date(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::Validation(format!("{} is not a valid date: {}", field, value)))
}
