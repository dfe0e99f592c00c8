//! Contract models for the land registry
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Cadastral code supplied by the land survey, used as the parcel primary key
pub type ParcelId = String;

/// `[longitude, latitude]` pair in WGS84 degrees
pub type LonLat = [f64; 2];

/// Farmer account
#[derive(Debug, Clone, PartialEq)]
pub struct Farmer {
    pub id: Uuid,
    pub name: String,
    /// Company registration code (unique)
    pub company_code: String,
    pub village: String,
    /// Optional contact email (unique when present)
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    /// Display color used on the map (e.g. `hsl(217, 91%, 60%)`)
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a farmer. The password is plain text and hashed by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFarmer {
    pub name: String,
    pub company_code: String,
    pub village: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub color: Option<String>,
}

/// Partial farmer update. `Some("")` clears optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmerPatch {
    pub name: Option<String>,
    pub company_code: Option<String>,
    pub village: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub color: Option<String>,
}

/// Mayor subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Mayor account, one per village
#[derive(Debug, Clone, PartialEq)]
pub struct Mayor {
    pub id: Uuid,
    pub name: String,
    pub village: String,
    pub email: String,
    pub password_hash: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a mayor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMayor {
    pub name: String,
    pub village: String,
    pub email: String,
    pub password: String,
}

/// Partial mayor update (name and email only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MayorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Cadastral parcel
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub id: ParcelId,
    pub village: String,
    /// Area in hectares
    pub area: f64,
    /// Closed polygon ring of `[lon, lat]` pairs
    pub coordinates: Vec<LonLat>,
    pub owner_id: Option<Uuid>,
    pub cultivator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Geometry-only parcel data written by the ingestion pipeline.
/// Carries no ownership fields on purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelGeometry {
    pub id: ParcelId,
    pub village: String,
    pub area: f64,
    pub coordinates: Vec<LonLat>,
}

/// Audit log category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    System,
    UserAction,
    Assignment,
    ParcelUpload,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::UserAction => "USER_ACTION",
            Self::Assignment => "ASSIGNMENT",
            Self::ParcelUpload => "PARCEL_UPLOAD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SYSTEM" => Some(Self::System),
            "USER_ACTION" => Some(Self::UserAction),
            "ASSIGNMENT" => Some(Self::Assignment),
            "PARCEL_UPLOAD" => Some(Self::ParcelUpload),
            _ => None,
        }
    }
}

/// Append-only audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: Uuid,
    pub log_type: LogType,
    pub actor: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted site-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub site_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated caller, supplied by the session provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin { id: String },
    Mayor { id: Uuid, village: String },
    Farmer { id: Uuid },
}

impl Actor {
    /// Identifier written to the audit log
    pub fn audit_id(&self) -> String {
        match self {
            Self::Admin { id } => format!("admin:{}", id),
            Self::Mayor { id, .. } => format!("mayor:{}", id),
            Self::Farmer { id } => format!("farmer:{}", id),
        }
    }

    /// Village the caller is restricted to, if any
    pub fn village_scope(&self) -> Option<&str> {
        match self {
            Self::Mayor { village, .. } => Some(village.as_str()),
            Self::Admin { .. } | Self::Farmer { .. } => None,
        }
    }
}

/// Per-village totals for the admin dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct VillageStats {
    pub village: String,
    pub parcel_count: usize,
    pub total_area: f64,
    pub farmer_count: usize,
}

/// Owned and cultivated area of one farmer
#[derive(Debug, Clone, PartialEq)]
pub struct FarmerAreaStats {
    pub farmer_id: Uuid,
    pub farmer_name: String,
    pub owned_area: f64,
    pub cultivated_area: f64,
}

/// Parcel count in one area range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    pub range: String,
    pub count: usize,
}

// ===== Assignment =====

/// Complete final state wanted for one farmer (not a delta)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub farmer_id: Uuid,
    pub desired_owned: BTreeSet<ParcelId>,
    pub desired_cultivated: BTreeSet<ParcelId>,
}

impl AssignmentRequest {
    pub fn new<O, C>(farmer_id: Uuid, owned: O, cultivated: C) -> Self
    where
        O: IntoIterator,
        O::Item: Into<ParcelId>,
        C: IntoIterator,
        C::Item: Into<ParcelId>,
    {
        Self {
            farmer_id,
            desired_owned: owned.into_iter().map(Into::into).collect(),
            desired_cultivated: cultivated.into_iter().map(Into::into).collect(),
        }
    }

    /// Apply per-conflict decisions: `Keep` drops the parcel from the matching
    /// desired set, `Force` leaves it in place so the commit overwrites.
    pub fn resolve<I>(&mut self, decisions: I)
    where
        I: IntoIterator<Item = ConflictDecision>,
    {
        for decision in decisions {
            if decision.resolution == ConflictResolution::Keep {
                match decision.role {
                    AssignmentRole::Owner => self.desired_owned.remove(&decision.parcel_id),
                    AssignmentRole::Cultivator => {
                        self.desired_cultivated.remove(&decision.parcel_id)
                    }
                };
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.desired_owned.is_empty() && self.desired_cultivated.is_empty()
    }

    /// Union of both desired sets
    pub fn all_desired(&self) -> BTreeSet<ParcelId> {
        self.desired_owned
            .union(&self.desired_cultivated)
            .cloned()
            .collect()
    }
}

/// Which claim on a parcel is being assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssignmentRole {
    Owner,
    Cultivator,
}

impl AssignmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Cultivator => "cultivator",
        }
    }
}

/// A desired assignment that would overwrite another farmer's claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentConflict {
    pub parcel_id: ParcelId,
    pub role: AssignmentRole,
    pub current_holder_id: Uuid,
    pub current_holder_name: Option<String>,
    pub target_farmer_id: Uuid,
    pub target_farmer_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Overwrite the other farmer's claim
    Force,
    /// Leave the other farmer's claim and drop the parcel from the request
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDecision {
    pub parcel_id: ParcelId,
    pub role: AssignmentRole,
    pub resolution: ConflictResolution,
}

impl ConflictDecision {
    pub fn for_conflict(conflict: &AssignmentConflict, resolution: ConflictResolution) -> Self {
        Self {
            parcel_id: conflict.parcel_id.clone(),
            role: conflict.role,
            resolution,
        }
    }
}

/// Result of a committed assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub farmer_id: Uuid,
    pub owned: Vec<ParcelId>,
    pub cultivated: Vec<ParcelId>,
    pub forced: bool,
    /// Number of parcel field updates applied
    pub changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// Nothing desired and nothing held
    NoChange,
    /// Plan applied atomically
    Committed(AssignmentSummary),
    /// Nothing was written; resolve and commit again
    Conflicts(Vec<AssignmentConflict>),
}

// ===== Ingestion =====

/// One uploaded parcel row, geometry still in the local projection
#[derive(Debug, Clone, PartialEq)]
pub struct RawParcelRow {
    pub id: String,
    pub village: String,
    pub area: f64,
    /// Ring of projected `(X, Y)` pairs
    pub ring: Vec<[f64; 2]>,
}

/// Failure of a single row, identified by its parcel id when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub processed_count: usize,
    pub errors: Vec<RowError>,
}

impl BatchResult {
    pub fn attempted(&self) -> usize {
        self.processed_count + self.errors.len()
    }
}

// ===== Map rendering =====

/// Axis-aligned lon/lat bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Edges touching count as intersecting
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    pub fn extend(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// Fill policy for the map
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Default,
    ShowAllFarmers,
    Highlight(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParcelStyle {
    pub fill_color: String,
    pub outline_color: String,
    pub weight: u8,
    pub fill_opacity: f64,
}

/// Parcel prepared for display at the current zoom
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedParcel {
    pub parcel_id: ParcelId,
    pub ring: Vec<LonLat>,
    pub simplified: bool,
    pub style: ParcelStyle,
}

/// Render result for one village
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedMap {
    pub parcels: Vec<RenderedParcel>,
    /// Extent of every drawable parcel in the village, regardless of zoom
    /// or viewport. `None` when the village has no geometry.
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub village: String,
    pub viewport: Bounds,
    pub zoom: f64,
    pub color_mode: ColorMode,
    pub selected_parcel_id: Option<ParcelId>,
}

/// Length label for one polygon edge
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDimension {
    /// 1-based edge index
    pub segment_index: usize,
    pub midpoint: LonLat,
    /// Haversine length in whole metres
    pub length_m: f64,
}
