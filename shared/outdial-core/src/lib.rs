//! Outdial Core - Shared domain types for the outbound dialing platform
//!
//! This crate provides:
//! - The contact/campaign state enumerations and outcome mapping
//! - E.164 phone number normalization
//! - Error handling utilities shared across services

pub mod domain;
pub mod error;
pub mod phone;

pub use domain::{CallOutcome, CampaignStatus, ContactStatus};
pub use error::{OutdialError, Result};
pub use phone::format_phone;
