//! Shared types, errors, and configuration for Leavedesk.
//!
//! This crate provides common types used across all other crates:
//! - `Days` quantities with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - The error classification used by domain errors
//! - Configuration management
//! - Verification of identity-provider bearer tokens

pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use config::AppConfig;
pub use error::ErrorKind;
