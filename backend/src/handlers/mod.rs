//! HTTP handlers for the Taller Window & Door Management Platform

pub mod audit;
pub mod auth;
pub mod health;
pub mod obra;
pub mod pedido;
pub mod stock;

pub use audit::*;
pub use auth::*;
pub use health::*;
pub use obra::*;
pub use pedido::*;
pub use stock::*;
