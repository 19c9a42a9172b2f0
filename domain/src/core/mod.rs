//! Core domain concepts shared across all subdomains.
//!
//! - [`participant::Participant`]: the fixed set of agent CLIs
//! - [`question::Question`]: a validated question to pose to the roundtable
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod participant;
pub mod question;
