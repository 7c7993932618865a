//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ProviderIdentity`] — a requested model and its provider family
//! - [`query::Query`] — a validated query to fan out
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod model;
pub mod payload;
pub mod query;
pub mod string;
