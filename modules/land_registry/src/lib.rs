//! Land Registry Module
//!
//! Cadastral parcels, farmer and mayor accounts, and per-village parcel
//! ownership and cultivation assignments. Parcels are ingested from projected
//! survey CSVs and rendered for the map with zoom-dependent detail.

// Public exports
pub mod contract;
pub use contract::{
    client::LandRegistryApi, error::RegistryError, Actor, AssignmentOutcome, AssignmentRequest,
    BatchResult, Farmer, Mayor, Parcel,
};

pub mod module;
pub use module::LandRegistryModule;

pub mod config;
pub use config::Config;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
