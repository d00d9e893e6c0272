//! Middleware for the Taller Window & Door Management Platform

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
