//! Domain layer - business logic and services

pub mod assignment;
pub mod audit;
pub mod credentials;
pub mod geometry;
pub mod ingestion;
pub mod projection;
pub mod repository;
pub mod service;
pub mod stats;
pub mod validation;

pub use assignment::ParcelUpdate;
pub use audit::AuditTrail;
pub use credentials::PasswordHasher;
pub use geometry::{LodConfig, StylePolicy};
pub use projection::{Reprojector, Wgs84Passthrough};
pub use repository::{
    ApplyOutcome, AuditLogRepository, FarmerRepository, MaintenanceRepository, MayorRepository,
    ParcelRepository, Repositories, SiteSettingsRepository,
};
pub use service::{Service, ServiceOptions};
