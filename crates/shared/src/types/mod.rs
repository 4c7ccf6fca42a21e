//! Common types used across the application.

pub mod days;
pub mod id;
pub mod pagination;

pub use days::Days;
pub use id::*;
pub use pagination::{PageRequest, PageResponse};
