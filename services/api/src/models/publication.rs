//! Approved, publicly listed events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::event::{Category, EventDetails};
use crate::models::request::EventRequest;

/// Publication model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: EventDetails,
    /// When the originating request was submitted
    pub submitted_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    /// Number of users who liked this publication
    pub likes: i64,
}

impl Publication {
    /// Structural copy of a request under a new identity
    pub fn from_request(request: EventRequest, id: Uuid, published_at: DateTime<Utc>) -> Self {
        Self {
            id,
            details: request.details,
            submitted_at: request.created_at,
            published_at,
            likes: 0,
        }
    }
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationSort {
    /// Newest publications first
    #[default]
    Recent,
    /// Most liked first
    Popular,
    /// Soonest to end first
    Ending,
}

/// Query parameters for publication listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicationQuery {
    /// Category name, or "all"
    pub category: Option<String>,
    pub sort: Option<PublicationSort>,
    /// Keep only events that have not ended yet
    pub upcoming: Option<bool>,
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

/// Validated listing filter handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationFilter {
    pub category: Option<Category>,
    pub sort: PublicationSort,
    /// Only events ending at or after this instant
    pub ending_after: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl PublicationFilter {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl PublicationQuery {
    pub fn into_filter(self, now: DateTime<Utc>) -> Result<PublicationFilter, ApiError> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) if name.eq_ignore_ascii_case("all") => None,
            Some(name) => Some(name.parse::<Category>()?),
        };

        Ok(PublicationFilter {
            category,
            sort: self.sort.unwrap_or_default(),
            ending_after: self.upcoming.unwrap_or(false).then_some(now),
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(20).clamp(1, 100),
        })
    }
}

/// Response for publication listing with pagination
#[derive(Debug, Clone, Serialize)]
pub struct PublicationListResponse {
    pub items: Vec<Publication>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}
