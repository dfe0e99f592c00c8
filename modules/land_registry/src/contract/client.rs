//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to interact with the land registry.
//! NO HTTP - direct function calls for performance.

use super::{
    error::RegistryError,
    model::{
        Actor, AssignmentConflict, AssignmentOutcome, AssignmentRequest, BatchResult, Farmer,
        Mayor, Parcel, RawParcelRow, RenderRequest, RenderedMap, VillageStats,
    },
};
use async_trait::async_trait;
use uuid::Uuid;

/// Land registry API for inter-module communication
#[async_trait]
pub trait LandRegistryApi: Send + Sync {
    // ===== Assignment =====

    /// Compute conflicts for a desired final state without writing anything
    async fn detect_conflicts(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<Vec<AssignmentConflict>, RegistryError>;

    /// Commit an already-resolved request, overwriting any remaining claims
    async fn commit_resolved(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome, RegistryError>;

    /// Detect and commit in one call. Without `force`, conflicts are returned
    /// instead of written.
    async fn assign_parcels(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        force: bool,
    ) -> Result<AssignmentOutcome, RegistryError>;

    // ===== Ingestion =====

    /// Validate, reproject and upsert a batch of uploaded rows
    async fn ingest_parcel_batch(
        &self,
        actor: &Actor,
        rows: Vec<RawParcelRow>,
    ) -> Result<BatchResult, RegistryError>;

    // ===== Map =====

    /// Parcels of one village prepared for the given viewport and zoom,
    /// with the village extent for fitting the initial view
    async fn render_map(
        &self,
        actor: &Actor,
        request: &RenderRequest,
    ) -> Result<RenderedMap, RegistryError>;

    // ===== Reads =====

    async fn get_farmer(&self, actor: &Actor, id: Uuid) -> Result<Farmer, RegistryError>;

    async fn list_farmers(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Farmer>, RegistryError>;

    async fn list_mayors(&self, actor: &Actor) -> Result<Vec<Mayor>, RegistryError>;

    async fn get_parcel(&self, actor: &Actor, id: &str) -> Result<Parcel, RegistryError>;

    async fn list_parcels(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Parcel>, RegistryError>;

    async fn village_stats(&self, actor: &Actor) -> Result<Vec<VillageStats>, RegistryError>;
}
