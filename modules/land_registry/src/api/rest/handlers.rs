//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{map_domain_error, Problem},
};
use crate::contract::{Actor, AssignmentOutcome, AssignmentRequest, LogType, RenderRequest};
use crate::domain::geometry::edge_dimensions;
use crate::domain::Service;
use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for village-scoped listings
#[derive(Debug, Deserialize)]
pub struct VillageQuery {
    /// Restrict to one village; mayors and farmers are always scoped to their own
    pub village: Option<String>,
}

// ===== Farmer Handlers =====

pub async fn list_farmers(
    service: Arc<Service>,
    actor: Actor,
    Query(query): Query<VillageQuery>,
) -> Result<Json<FarmersListResponse>, Problem> {
    let farmers = service
        .list_farmers(&actor, query.village.as_deref())
        .await
        .map_err(map_domain_error)?;

    let items: Vec<FarmerDto> = farmers.into_iter().map(|f| f.into()).collect();
    let total = items.len();

    Ok(Json(FarmersListResponse { items, total }))
}

pub async fn get_farmer(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<FarmerDto>, Problem> {
    let farmer = service.get_farmer(&actor, id).await.map_err(map_domain_error)?;
    Ok(Json(farmer.into()))
}

pub async fn create_farmer(
    service: Arc<Service>,
    actor: Actor,
    Json(req): Json<CreateFarmerRequest>,
) -> Result<(StatusCode, Json<FarmerDto>), Problem> {
    let farmer = service
        .add_farmer(&actor, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(farmer.into())))
}

pub async fn update_farmer(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFarmerRequest>,
) -> Result<Json<FarmerDto>, Problem> {
    let farmer = service
        .update_farmer(&actor, id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(farmer.into()))
}

pub async fn delete_farmer(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Problem> {
    service
        .delete_farmer(&actor, id)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn owned_parcels(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    let parcels = service
        .parcels_by_owner(&actor, id)
        .await
        .map_err(map_domain_error)?;

    let items: Vec<ParcelDto> = parcels.into_iter().map(|p| p.into()).collect();
    let total = items.len();

    Ok(Json(ParcelsListResponse { items, total }))
}

pub async fn cultivated_parcels(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    let parcels = service
        .parcels_by_cultivator(&actor, id)
        .await
        .map_err(map_domain_error)?;

    let items: Vec<ParcelDto> = parcels.into_iter().map(|p| p.into()).collect();
    let total = items.len();

    Ok(Json(ParcelsListResponse { items, total }))
}

// ===== Assignment Handlers =====

/// Conflicts the desired holdings would cause; writes nothing
pub async fn detect_conflicts(
    service: Arc<Service>,
    actor: Actor,
    Path(farmer_id): Path<Uuid>,
    Json(req): Json<DetectConflictsRequest>,
) -> Result<Json<ConflictsResponse>, Problem> {
    let request = AssignmentRequest::new(farmer_id, req.owned, req.cultivated);
    let conflicts = service
        .detect_conflicts(&actor, &request)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(ConflictsResponse {
        conflicts: conflicts.into_iter().map(|c| c.into()).collect(),
    }))
}

/// Reconcile a farmer's holdings. 200 when committed, 409 with the conflicts
/// when nothing was written.
pub async fn assign_parcels(
    service: Arc<Service>,
    actor: Actor,
    Path(farmer_id): Path<Uuid>,
    Json(req): Json<AssignParcelsRequest>,
) -> Result<Response, Problem> {
    let mut request = AssignmentRequest::new(farmer_id, req.owned, req.cultivated);

    let outcome = match req.resolutions {
        Some(decisions) => {
            request.resolve(decisions.into_iter().map(Into::into));
            service.commit_resolved(&actor, &request).await
        }
        None => service.assign_parcels(&actor, &request, req.force).await,
    }
    .map_err(map_domain_error)?;

    let response = match outcome {
        AssignmentOutcome::NoChange => Json(AssignmentResultDto::no_change(farmer_id)).into_response(),
        AssignmentOutcome::Committed(summary) => {
            Json(AssignmentResultDto::from(summary)).into_response()
        }
        AssignmentOutcome::Conflicts(conflicts) => (
            StatusCode::CONFLICT,
            Json(ConflictsResponse {
                conflicts: conflicts.into_iter().map(|c| c.into()).collect(),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

// ===== Mayor Handlers =====

pub async fn list_mayors(
    service: Arc<Service>,
    actor: Actor,
) -> Result<Json<MayorsListResponse>, Problem> {
    let mayors = service.list_mayors(&actor).await.map_err(map_domain_error)?;

    let items: Vec<MayorDto> = mayors.into_iter().map(|m| m.into()).collect();
    let total = items.len();

    Ok(Json(MayorsListResponse { items, total }))
}

pub async fn get_mayor(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<MayorDto>, Problem> {
    let mayor = service.get_mayor(&actor, id).await.map_err(map_domain_error)?;
    Ok(Json(mayor.into()))
}

pub async fn create_mayor(
    service: Arc<Service>,
    actor: Actor,
    Json(req): Json<CreateMayorRequest>,
) -> Result<(StatusCode, Json<MayorDto>), Problem> {
    let mayor = service
        .add_mayor(&actor, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(mayor.into())))
}

pub async fn update_mayor(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMayorRequest>,
) -> Result<Json<MayorDto>, Problem> {
    let mayor = service
        .update_mayor_details(&actor, id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(mayor.into()))
}

pub async fn update_mayor_status(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMayorStatusRequest>,
) -> Result<Json<MayorDto>, Problem> {
    let mayor = service
        .update_mayor_status(&actor, id, req.status.into(), req.end_date)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(mayor.into()))
}

pub async fn delete_mayor(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Problem> {
    service
        .delete_mayor(&actor, id)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ===== Parcel Handlers =====

pub async fn list_parcels(
    service: Arc<Service>,
    actor: Actor,
    Query(query): Query<VillageQuery>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    let parcels = service
        .list_parcels(&actor, query.village.as_deref())
        .await
        .map_err(map_domain_error)?;

    let items: Vec<ParcelDto> = parcels.into_iter().map(|p| p.into()).collect();
    let total = items.len();

    Ok(Json(ParcelsListResponse { items, total }))
}

pub async fn get_parcel(
    service: Arc<Service>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ParcelDto>, Problem> {
    let parcel = service.get_parcel(&actor, &id).await.map_err(map_domain_error)?;
    Ok(Json(parcel.into()))
}

/// Ingest a CSV upload (`parcel_id`, `area_hectares`, `projected_polygon`, `village`)
pub async fn upload_parcels(
    service: Arc<Service>,
    actor: Actor,
    body: Bytes,
) -> Result<Json<BatchResultDto>, Problem> {
    let result = service
        .ingest_parcel_csv(&actor, &body)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(result.into()))
}

// ===== Map Handlers =====

pub async fn render_map(
    service: Arc<Service>,
    actor: Actor,
    Json(req): Json<RenderMapRequest>,
) -> Result<Json<RenderMapResponse>, Problem> {
    let request: RenderRequest = req.into();
    let rendered = service
        .render_map(&actor, &request)
        .await
        .map_err(map_domain_error)?;

    let selected_dimensions: Vec<EdgeDimensionDto> = request
        .selected_parcel_id
        .as_ref()
        .and_then(|selected| rendered.parcels.iter().find(|p| &p.parcel_id == selected))
        .map(|p| edge_dimensions(&p.ring).into_iter().map(|e| e.into()).collect())
        .unwrap_or_default();

    Ok(Json(RenderMapResponse {
        parcels: rendered.parcels.into_iter().map(|p| p.into()).collect(),
        selected_dimensions,
        bounds: rendered.bounds.map(BoundsDto::from),
    }))
}

// ===== Statistics Handlers =====

pub async fn village_stats(
    service: Arc<Service>,
    actor: Actor,
) -> Result<Json<Vec<VillageStatsDto>>, Problem> {
    let stats = service.village_stats(&actor).await.map_err(map_domain_error)?;
    Ok(Json(stats.into_iter().map(|s| s.into()).collect()))
}

pub async fn farmer_area_stats(
    service: Arc<Service>,
    actor: Actor,
    Path(village): Path<String>,
) -> Result<Json<Vec<FarmerAreaStatsDto>>, Problem> {
    let stats = service
        .farmer_area_stats(&actor, &village)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(stats.into_iter().map(|s| s.into()).collect()))
}

pub async fn parcel_size_distribution(
    service: Arc<Service>,
    actor: Actor,
    Path(village): Path<String>,
) -> Result<Json<Vec<SizeBucketDto>>, Problem> {
    let buckets = service
        .parcel_size_distribution(&actor, &village)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(buckets.into_iter().map(|b| b.into()).collect()))
}

// ===== Administration Handlers =====

const DEFAULT_LOG_LIMIT: u64 = 100;
const MAX_LOG_LIMIT: u64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    /// SYSTEM, USER_ACTION, ASSIGNMENT or PARCEL_UPLOAD
    pub log_type: Option<String>,
    pub limit: Option<u64>,
}

pub async fn list_logs(
    service: Arc<Service>,
    actor: Actor,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<LogsListResponse>, Problem> {
    let log_type = match query.log_type.as_deref() {
        Some(raw) => Some(LogType::parse(raw).ok_or_else(|| {
            Problem::new(StatusCode::BAD_REQUEST, "Validation Error")
                .with_detail(format!("unknown log type '{}'", raw))
        })?),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);

    let entries = service
        .list_logs(&actor, log_type, limit)
        .await
        .map_err(map_domain_error)?;

    let items: Vec<LogEntryDto> = entries.into_iter().map(|e| e.into()).collect();
    let total = items.len();

    Ok(Json(LogsListResponse { items, total }))
}

/// Site settings are public so the login screen can show the name
pub async fn get_site_settings(service: Arc<Service>) -> Result<Json<SiteSettingsDto>, Problem> {
    let settings = service.site_settings().await.map_err(map_domain_error)?;
    Ok(Json(settings.into()))
}

pub async fn update_site_settings(
    service: Arc<Service>,
    actor: Actor,
    Json(req): Json<UpdateSiteSettingsRequest>,
) -> Result<Json<SiteSettingsDto>, Problem> {
    let settings = service
        .update_site_name(&actor, &req.site_name)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(settings.into()))
}

pub async fn clear_logs(
    service: Arc<Service>,
    actor: Actor,
) -> Result<Json<ClearLogsResponse>, Problem> {
    let removed = service.clear_logs(&actor).await.map_err(map_domain_error)?;
    Ok(Json(ClearLogsResponse { removed }))
}

pub async fn clear_application_data(
    service: Arc<Service>,
    actor: Actor,
) -> Result<StatusCode, Problem> {
    service
        .clear_application_data(&actor)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}
