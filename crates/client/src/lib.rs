//! `frontdesk-client`: HTTP client for the facility management REST API.
//!
//! Every request carries the bearer token supplied by a [`TokenSource`]. A
//! 401 response triggers [`TokenSource::on_unauthorized`] and surfaces as
//! [`ApiError::Unauthorized`].

pub mod client;
pub mod dto;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL, TokenSource};
pub use dto::{
    CheckInData, CheckInMethod, CheckOutData, EmployeeData, QueryParams, RemoteVisitor, TenantData, TimeRange,
    VisitorData,
};
pub use error::ApiError;
