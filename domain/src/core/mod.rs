//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`validation::ConfigIssue`]: structured configuration issues
//! - [`clock::current_timestamp`]: millisecond wall clock

pub mod clock;
pub mod error;
pub mod validation;
