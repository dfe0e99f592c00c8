//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{
    Farmer, LogEntry, LogType, Mayor, Parcel, ParcelGeometry, ParcelId, SiteSettings,
};
use crate::domain::assignment::ParcelUpdate;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for farmer accounts
#[async_trait]
pub trait FarmerRepository: Send + Sync {
    /// Insert a new farmer
    async fn create(&self, farmer: &Farmer) -> Result<Farmer>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Farmer>>;

    async fn find_by_company_code(&self, company_code: &str) -> Result<Option<Farmer>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Farmer>>;

    /// Farmers ordered by name, optionally restricted to one village
    async fn list(&self, village: Option<&str>) -> Result<Vec<Farmer>>;

    /// Total number of farmers across all villages
    async fn count(&self) -> Result<u64>;

    /// Overwrite all mutable fields of an existing farmer
    async fn update(&self, farmer: &Farmer) -> Result<Farmer>;

    /// Delete a farmer, nulling `owner_id`/`cultivator_id` on its parcels
    /// in the same transaction
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for mayor accounts
#[async_trait]
pub trait MayorRepository: Send + Sync {
    async fn create(&self, mayor: &Mayor) -> Result<Mayor>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Mayor>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Mayor>>;

    async fn find_by_village(&self, village: &str) -> Result<Option<Mayor>>;

    /// Mayors ordered by village, then name
    async fn list(&self) -> Result<Vec<Mayor>>;

    async fn update(&self, mayor: &Mayor) -> Result<Mayor>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Outcome of applying an assignment plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every guarded update matched; number of updates written
    Applied(usize),
    /// At least one guard did not match; nothing was written
    Stale(Vec<ParcelId>),
}

/// Repository for parcels
#[async_trait]
pub trait ParcelRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Parcel>>;

    /// Parcels of `village` whose id is in `ids`
    async fn find_in_village(&self, village: &str, ids: &[ParcelId]) -> Result<Vec<Parcel>>;

    /// Parcels of `village` owned or cultivated by `farmer_id`
    async fn find_held_by(&self, village: &str, farmer_id: Uuid) -> Result<Vec<Parcel>>;

    /// Parcels ordered by id, optionally restricted to one village
    async fn list(&self, village: Option<&str>) -> Result<Vec<Parcel>>;

    async fn list_by_owner(&self, farmer_id: Uuid) -> Result<Vec<Parcel>>;

    async fn list_by_cultivator(&self, farmer_id: Uuid) -> Result<Vec<Parcel>>;

    /// Create the parcel, or update village/area/coordinates of an existing one.
    /// Never touches owner or cultivator.
    async fn upsert_geometry(&self, geometry: &ParcelGeometry) -> Result<Parcel>;

    /// Apply all updates in one transaction. Each update only matches when the
    /// column still holds `expected`; any miss rolls the whole plan back.
    async fn apply_assignment(&self, updates: &[ParcelUpdate]) -> Result<ApplyOutcome>;
}

/// Append-only audit log
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &LogEntry) -> Result<()>;

    /// Newest first
    async fn list(&self, log_type: Option<LogType>, limit: u64) -> Result<Vec<LogEntry>>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> Result<u64>;
}

/// Single-row site settings
#[async_trait]
pub trait SiteSettingsRepository: Send + Sync {
    async fn get(&self) -> Result<Option<SiteSettings>>;

    async fn put(&self, settings: &SiteSettings) -> Result<SiteSettings>;
}

/// Administrative bulk operations spanning several tables
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Delete all parcels, farmers and mayors in one transaction. Logs are kept.
    async fn clear_application_data(&self) -> Result<()>;
}

/// Bundle of repositories handed to the service
#[derive(Clone)]
pub struct Repositories {
    pub farmers: Arc<dyn FarmerRepository>,
    pub mayors: Arc<dyn MayorRepository>,
    pub parcels: Arc<dyn ParcelRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub site_settings: Arc<dyn SiteSettingsRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
}
