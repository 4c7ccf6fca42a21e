//! Core business logic for Leavedesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The repositories in `leavedesk-db` execute the decisions made here.
//!
//! # Modules
//!
//! - `access` - Roles, capabilities and the acting user
//! - `balance` - Casual/medical balance ledger arithmetic
//! - `compoff` - Comp-off grants and FIFO consumption
//! - `identity` - Identity and profile load state, profile cache
//! - `leave` - Leave request validation and state machine
//! - `routing` - Approval queue filtering
//! - `settlement` - Year-end archive and rollover computations

pub mod access;
pub mod balance;
pub mod compoff;
pub mod identity;
pub mod leave;
pub mod routing;
pub mod settlement;
