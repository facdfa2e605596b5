//! API models for events, requests and publications

pub mod event;
pub mod publication;
pub mod request;

pub use event::{Category, EventDetails, GeoPoint};
pub use publication::{
    Publication, PublicationFilter, PublicationListResponse, PublicationQuery, PublicationSort,
};
pub use request::{EventRequest, PendingRequest, Submission, SubmissionForm};
