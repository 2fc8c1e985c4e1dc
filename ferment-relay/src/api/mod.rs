//! HTTP API handlers for ferment-relay

pub mod health;
pub mod parse;

pub use health::health_routes;
pub use parse::parse_routes;
