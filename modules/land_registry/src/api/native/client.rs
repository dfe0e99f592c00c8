//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    Actor, AssignmentConflict, AssignmentOutcome, AssignmentRequest, BatchResult, Farmer,
    LandRegistryApi, Mayor, Parcel, RawParcelRow, RegistryError, RenderRequest, RenderedMap,
    VillageStats,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LandRegistryApi for NativeClient {
    async fn detect_conflicts(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<Vec<AssignmentConflict>, RegistryError> {
        self.service.detect_conflicts(actor, request).await
    }

    async fn commit_resolved(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome, RegistryError> {
        self.service.commit_resolved(actor, request).await
    }

    async fn assign_parcels(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        force: bool,
    ) -> Result<AssignmentOutcome, RegistryError> {
        self.service.assign_parcels(actor, request, force).await
    }

    async fn ingest_parcel_batch(
        &self,
        actor: &Actor,
        rows: Vec<RawParcelRow>,
    ) -> Result<BatchResult, RegistryError> {
        self.service.ingest_parcel_batch(actor, rows).await
    }

    async fn render_map(
        &self,
        actor: &Actor,
        request: &RenderRequest,
    ) -> Result<RenderedMap, RegistryError> {
        self.service.render_map(actor, request).await
    }

    async fn get_farmer(&self, actor: &Actor, id: Uuid) -> Result<Farmer, RegistryError> {
        self.service.get_farmer(actor, id).await
    }

    async fn list_farmers(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Farmer>, RegistryError> {
        self.service.list_farmers(actor, village).await
    }

    async fn list_mayors(&self, actor: &Actor) -> Result<Vec<Mayor>, RegistryError> {
        self.service.list_mayors(actor).await
    }

    async fn get_parcel(&self, actor: &Actor, id: &str) -> Result<Parcel, RegistryError> {
        self.service.get_parcel(actor, id).await
    }

    async fn list_parcels(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Parcel>, RegistryError> {
        self.service.list_parcels(actor, village).await
    }

    async fn village_stats(&self, actor: &Actor) -> Result<Vec<VillageStats>, RegistryError> {
        self.service.village_stats(actor).await
    }
}
