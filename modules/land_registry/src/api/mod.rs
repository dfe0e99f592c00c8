//! API layer: REST routes and the in-process native client

pub mod native;
pub mod rest;
