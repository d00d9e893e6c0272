//! Domain models for the Taller Window & Door Management Platform

pub mod audit;
pub mod obra;
pub mod pedido;
pub mod stock;
pub mod user;

pub use audit::*;
pub use obra::*;
pub use pedido::*;
pub use stock::*;
pub use user::*;
