//! Route registration and OpenAPI document

use super::{actor::CallerActor, dto::*, error::Problem, handlers};
use crate::domain::Service;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Schemas exposed at `/openapi.json`
#[derive(OpenApi)]
#[openapi(
    info(title = "Land Registry API"),
    components(schemas(
        FarmerDto,
        CreateFarmerRequest,
        UpdateFarmerRequest,
        FarmersListResponse,
        MayorDto,
        SubscriptionStatusDto,
        CreateMayorRequest,
        UpdateMayorRequest,
        UpdateMayorStatusRequest,
        MayorsListResponse,
        ParcelDto,
        ParcelsListResponse,
        BatchResultDto,
        RowErrorDto,
        AssignParcelsRequest,
        DetectConflictsRequest,
        ConflictDecisionDto,
        AssignmentRoleDto,
        ConflictResolutionDto,
        ConflictDto,
        ConflictsResponse,
        AssignmentStatusDto,
        AssignmentResultDto,
        BoundsDto,
        ColorModeDto,
        RenderMapRequest,
        RenderMapResponse,
        RenderedParcelDto,
        ParcelStyleDto,
        EdgeDimensionDto,
        VillageStatsDto,
        FarmerAreaStatsDto,
        SizeBucketDto,
        LogEntryDto,
        LogsListResponse,
        SiteSettingsDto,
        UpdateSiteSettingsRequest,
        ClearLogsResponse,
    ))
)]
pub struct ApiDoc;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let upload_limit = service.options().max_upload_bytes;

    router
        // Farmer endpoints
        .route("/farmers", get(list_farmers_handler).post(create_farmer_handler))
        .route(
            "/farmers/{id}",
            get(get_farmer_handler)
                .put(update_farmer_handler)
                .delete(delete_farmer_handler),
        )
        .route("/farmers/{id}/parcels/owned", get(owned_parcels_handler))
        .route("/farmers/{id}/parcels/cultivated", get(cultivated_parcels_handler))
        .route("/farmers/{id}/assignments", post(assign_parcels_handler))
        .route("/farmers/{id}/assignments/conflicts", post(detect_conflicts_handler))
        // Mayor endpoints
        .route("/mayors", get(list_mayors_handler).post(create_mayor_handler))
        .route(
            "/mayors/{id}",
            get(get_mayor_handler)
                .put(update_mayor_handler)
                .delete(delete_mayor_handler),
        )
        .route("/mayors/{id}/status", put(update_mayor_status_handler))
        // Parcel endpoints
        .route("/parcels", get(list_parcels_handler))
        .route(
            "/parcels/upload",
            post(upload_parcels_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/parcels/{id}", get(get_parcel_handler))
        // Map
        .route("/map/render", post(render_map_handler))
        // Statistics
        .route("/stats/villages", get(village_stats_handler))
        .route("/stats/villages/{village}/farmers", get(farmer_area_stats_handler))
        .route("/stats/villages/{village}/sizes", get(size_distribution_handler))
        // Administration
        .route("/logs", get(list_logs_handler))
        .route(
            "/admin/settings",
            get(get_site_settings_handler).put(update_site_settings_handler),
        )
        .route("/admin/clear-logs", post(clear_logs_handler))
        .route("/admin/clear-data", post(clear_data_handler))
        .route("/openapi.json", get(openapi_handler))
        // Add service as extension for handlers
        .layer(Extension(service))
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ===== Handler wrappers that extract service and actor =====

async fn list_farmers_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    query: Query<handlers::VillageQuery>,
) -> Result<Json<FarmersListResponse>, Problem> {
    handlers::list_farmers(service, actor, query).await
}

async fn create_farmer_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    json: Json<CreateFarmerRequest>,
) -> Result<(StatusCode, Json<FarmerDto>), Problem> {
    handlers::create_farmer(service, actor, json).await
}

async fn get_farmer_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<Json<FarmerDto>, Problem> {
    handlers::get_farmer(service, actor, path).await
}

async fn update_farmer_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
    json: Json<UpdateFarmerRequest>,
) -> Result<Json<FarmerDto>, Problem> {
    handlers::update_farmer(service, actor, path, json).await
}

async fn delete_farmer_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<StatusCode, Problem> {
    handlers::delete_farmer(service, actor, path).await
}

async fn owned_parcels_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    handlers::owned_parcels(service, actor, path).await
}

async fn cultivated_parcels_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    handlers::cultivated_parcels(service, actor, path).await
}

async fn assign_parcels_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
    json: Json<AssignParcelsRequest>,
) -> Result<Response, Problem> {
    handlers::assign_parcels(service, actor, path, json).await
}

async fn detect_conflicts_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
    json: Json<DetectConflictsRequest>,
) -> Result<Json<ConflictsResponse>, Problem> {
    handlers::detect_conflicts(service, actor, path, json).await
}

async fn list_mayors_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
) -> Result<Json<MayorsListResponse>, Problem> {
    handlers::list_mayors(service, actor).await
}

async fn create_mayor_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    json: Json<CreateMayorRequest>,
) -> Result<(StatusCode, Json<MayorDto>), Problem> {
    handlers::create_mayor(service, actor, json).await
}

async fn get_mayor_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<Json<MayorDto>, Problem> {
    handlers::get_mayor(service, actor, path).await
}

async fn update_mayor_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
    json: Json<UpdateMayorRequest>,
) -> Result<Json<MayorDto>, Problem> {
    handlers::update_mayor(service, actor, path, json).await
}

async fn update_mayor_status_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
    json: Json<UpdateMayorStatusRequest>,
) -> Result<Json<MayorDto>, Problem> {
    handlers::update_mayor_status(service, actor, path, json).await
}

async fn delete_mayor_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<Uuid>,
) -> Result<StatusCode, Problem> {
    handlers::delete_mayor(service, actor, path).await
}

async fn list_parcels_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    query: Query<handlers::VillageQuery>,
) -> Result<Json<ParcelsListResponse>, Problem> {
    handlers::list_parcels(service, actor, query).await
}

async fn get_parcel_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<String>,
) -> Result<Json<ParcelDto>, Problem> {
    handlers::get_parcel(service, actor, path).await
}

async fn upload_parcels_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    body: Bytes,
) -> Result<Json<BatchResultDto>, Problem> {
    handlers::upload_parcels(service, actor, body).await
}

async fn render_map_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    json: Json<RenderMapRequest>,
) -> Result<Json<RenderMapResponse>, Problem> {
    handlers::render_map(service, actor, json).await
}

async fn village_stats_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
) -> Result<Json<Vec<VillageStatsDto>>, Problem> {
    handlers::village_stats(service, actor).await
}

async fn farmer_area_stats_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<String>,
) -> Result<Json<Vec<FarmerAreaStatsDto>>, Problem> {
    handlers::farmer_area_stats(service, actor, path).await
}

async fn size_distribution_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    path: Path<String>,
) -> Result<Json<Vec<SizeBucketDto>>, Problem> {
    handlers::parcel_size_distribution(service, actor, path).await
}

async fn list_logs_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    query: Query<handlers::ListLogsQuery>,
) -> Result<Json<LogsListResponse>, Problem> {
    handlers::list_logs(service, actor, query).await
}

async fn get_site_settings_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<SiteSettingsDto>, Problem> {
    handlers::get_site_settings(service).await
}

async fn update_site_settings_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
    json: Json<UpdateSiteSettingsRequest>,
) -> Result<Json<SiteSettingsDto>, Problem> {
    handlers::update_site_settings(service, actor, json).await
}

async fn clear_logs_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
) -> Result<Json<ClearLogsResponse>, Problem> {
    handlers::clear_logs(service, actor).await
}

async fn clear_data_handler(
    Extension(service): Extension<Arc<Service>>,
    CallerActor(actor): CallerActor,
) -> Result<StatusCode, Problem> {
    handlers::clear_application_data(service, actor).await
}
