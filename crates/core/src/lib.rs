//! `posgate-core`: foundation primitives shared by the access-control crates.
//!
//! This crate contains **pure** building blocks (no IO, no async).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{BranchId, BusinessId, UserId};
