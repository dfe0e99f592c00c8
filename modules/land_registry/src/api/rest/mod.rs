//! REST API layer

pub mod actor;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod mapper;
pub mod routes;

pub use routes::register_routes;
