//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Farmer DTOs =====

/// Farmer response DTO. The password hash is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmerDto {
    pub id: Uuid,

    #[schema(example = "Ion Popescu")]
    pub name: String,

    /// Company registration code
    #[schema(example = "RO12345678")]
    pub company_code: String,

    #[schema(example = "Valea Mare")]
    pub village: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Map display color
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "hsl(217, 91%, 60%)")]
    pub color: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Farmer creation request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFarmerRequest {
    pub name: String,
    pub company_code: String,
    pub village: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Plain text, hashed before storage
    pub password: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial farmer update. An empty string clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateFarmerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_code: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmersListResponse {
    pub items: Vec<FarmerDto>,
    pub total: usize,
}

// ===== Mayor DTOs =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatusDto {
    Pending,
    Active,
    Inactive,
}

/// Mayor response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MayorDto {
    pub id: Uuid,
    pub name: String,
    pub village: String,
    pub email: String,
    pub subscription_status: SubscriptionStatusDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateMayorRequest {
    pub name: String,
    pub village: String,
    pub email: String,
    pub password: String,
}

/// Name and email only; village and status have their own operations
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateMayorRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Subscription change. Omit `end_date` to keep the stored one, send `null` to clear it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateMayorStatusRequest {
    pub status: SubscriptionStatusDto,

    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MayorsListResponse {
    pub items: Vec<MayorDto>,
    pub total: usize,
}

// ===== Parcel DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParcelDto {
    /// Cadastral code
    #[schema(example = "50123")]
    pub id: String,

    pub village: String,

    /// Hectares
    pub area: f64,

    /// Closed ring of `[lon, lat]` pairs
    #[schema(value_type = Vec<Vec<f64>>)]
    pub coordinates: Vec<[f64; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultivator_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParcelsListResponse {
    pub items: Vec<ParcelDto>,
    pub total: usize,
}

/// Per-row ingestion failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowErrorDto {
    /// Parcel id when it could be read from the row
    pub id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchResultDto {
    pub processed_count: usize,
    pub errors: Vec<RowErrorDto>,
}

// ===== Assignment DTOs =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentRoleDto {
    Owner,
    Cultivator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolutionDto {
    /// Overwrite the other farmer's claim
    Force,
    /// Keep the other farmer's claim
    Keep,
}

/// Caller's decision for one reported conflict
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictDecisionDto {
    pub parcel_id: String,
    pub role: AssignmentRoleDto,
    pub resolution: ConflictResolutionDto,
}

/// Complete desired holdings of one farmer
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignParcelsRequest {
    #[serde(default)]
    pub owned: Vec<String>,

    #[serde(default)]
    pub cultivated: Vec<String>,

    /// Overwrite every conflicting claim
    #[serde(default)]
    pub force: bool,

    /// When present, the request is resolved with these decisions and committed
    #[serde(default)]
    pub resolutions: Option<Vec<ConflictDecisionDto>>,
}

/// Desired holdings to check for conflicts
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DetectConflictsRequest {
    #[serde(default)]
    pub owned: Vec<String>,

    #[serde(default)]
    pub cultivated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictDto {
    pub parcel_id: String,
    pub role: AssignmentRoleDto,
    pub current_holder_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_holder_name: Option<String>,
    pub target_farmer_id: Uuid,
    pub target_farmer_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictsResponse {
    pub conflicts: Vec<ConflictDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatusDto {
    Committed,
    NoChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResultDto {
    pub status: AssignmentStatusDto,
    pub farmer_id: Uuid,
    pub owned: Vec<String>,
    pub cultivated: Vec<String>,
    pub forced: bool,
    /// Number of parcel fields written
    pub changes: usize,
}

// ===== Map DTOs =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct BoundsDto {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Fill policy
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorModeDto {
    #[default]
    Default,
    ShowAllFarmers,
    Highlight { farmer_id: Uuid },
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenderMapRequest {
    pub village: String,
    pub viewport: BoundsDto,
    #[schema(example = 14.0)]
    pub zoom: f64,
    #[serde(default)]
    pub color_mode: ColorModeDto,
    #[serde(default)]
    pub selected_parcel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParcelStyleDto {
    pub fill_color: String,
    pub outline_color: String,
    pub weight: u8,
    pub fill_opacity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedParcelDto {
    pub parcel_id: String,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub ring: Vec<[f64; 2]>,
    pub simplified: bool,
    pub style: ParcelStyleDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EdgeDimensionDto {
    pub segment_index: usize,
    #[schema(value_type = Vec<f64>)]
    pub midpoint: [f64; 2],
    pub length_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderMapResponse {
    pub parcels: Vec<RenderedParcelDto>,
    /// Edge labels of the selected parcel, empty when none is selected or visible
    pub selected_dimensions: Vec<EdgeDimensionDto>,
    /// Village extent for the initial map fit
    pub bounds: Option<BoundsDto>,
}

// ===== Statistics DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VillageStatsDto {
    pub village: String,
    pub parcel_count: usize,
    pub total_area: f64,
    pub farmer_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmerAreaStatsDto {
    pub farmer_id: Uuid,
    pub farmer_name: String,
    pub owned_area: f64,
    pub cultivated_area: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SizeBucketDto {
    #[schema(example = "1-5 ha")]
    pub range: String,
    pub count: usize,
}

// ===== Administration DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogEntryDto {
    pub id: Uuid,
    #[schema(example = "ASSIGNMENT")]
    pub log_type: String,
    pub actor: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogsListResponse {
    pub items: Vec<LogEntryDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SiteSettingsDto {
    pub site_name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSiteSettingsRequest {
    #[schema(example = "AgriCad Platform")]
    pub site_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearLogsResponse {
    pub removed: u64,
}
