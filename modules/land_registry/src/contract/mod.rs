//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::LandRegistryApi;
pub use error::RegistryError;
pub use model::{
    Actor, AssignmentConflict, AssignmentOutcome, AssignmentRequest, AssignmentRole,
    AssignmentSummary, BatchResult, Bounds, ColorMode, ConflictDecision, ConflictResolution,
    EdgeDimension, Farmer, FarmerAreaStats, FarmerPatch, LogEntry, LogType, LonLat, Mayor,
    MayorPatch, NewFarmer, NewMayor, Parcel, ParcelGeometry, ParcelId, ParcelStyle, RawParcelRow,
    RenderRequest, RenderedMap, RenderedParcel, RowError, SiteSettings, SizeBucket,
    SubscriptionStatus, VillageStats,
};
