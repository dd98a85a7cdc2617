//! Data access for the hosted analytics query service.
//!
//! A thin forwarding layer: filters go out as query parameters, the JSON
//! envelope comes back untouched.

pub mod client;
pub mod filters;

pub use client::{describe_failure, AnalyticsClient, AnalyticsError};
pub use filters::{Pipe, PipeFilters};
