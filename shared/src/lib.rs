//! Shared types and domain logic for the Taller Window & Door Management Platform
//!
//! This crate contains the models and the pure stock-ledger rules shared
//! between the backend services and their test suites.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
