//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;
use uuid::Uuid;

// ===== Farmer conversions =====

impl From<contract::Farmer> for FarmerDto {
    fn from(farmer: contract::Farmer) -> Self {
        Self {
            id: farmer.id,
            name: farmer.name,
            company_code: farmer.company_code,
            village: farmer.village,
            email: farmer.email,
            phone: farmer.phone,
            color: farmer.color,
            created_at: farmer.created_at,
            updated_at: farmer.updated_at,
        }
    }
}

impl From<CreateFarmerRequest> for contract::NewFarmer {
    fn from(req: CreateFarmerRequest) -> Self {
        Self {
            name: req.name,
            company_code: req.company_code,
            village: req.village,
            email: req.email,
            phone: req.phone,
            password: req.password,
            color: req.color,
        }
    }
}

impl From<UpdateFarmerRequest> for contract::FarmerPatch {
    fn from(req: UpdateFarmerRequest) -> Self {
        Self {
            name: req.name,
            company_code: req.company_code,
            village: req.village,
            email: req.email,
            phone: req.phone,
            color: req.color,
        }
    }
}

// ===== Mayor conversions =====

impl From<contract::SubscriptionStatus> for SubscriptionStatusDto {
    fn from(status: contract::SubscriptionStatus) -> Self {
        match status {
            contract::SubscriptionStatus::Pending => Self::Pending,
            contract::SubscriptionStatus::Active => Self::Active,
            contract::SubscriptionStatus::Inactive => Self::Inactive,
        }
    }
}

impl From<SubscriptionStatusDto> for contract::SubscriptionStatus {
    fn from(status: SubscriptionStatusDto) -> Self {
        match status {
            SubscriptionStatusDto::Pending => Self::Pending,
            SubscriptionStatusDto::Active => Self::Active,
            SubscriptionStatusDto::Inactive => Self::Inactive,
        }
    }
}

impl From<contract::Mayor> for MayorDto {
    fn from(mayor: contract::Mayor) -> Self {
        Self {
            id: mayor.id,
            name: mayor.name,
            village: mayor.village,
            email: mayor.email,
            subscription_status: mayor.subscription_status.into(),
            subscription_end_date: mayor.subscription_end_date,
            created_at: mayor.created_at,
            updated_at: mayor.updated_at,
        }
    }
}

impl From<CreateMayorRequest> for contract::NewMayor {
    fn from(req: CreateMayorRequest) -> Self {
        Self {
            name: req.name,
            village: req.village,
            email: req.email,
            password: req.password,
        }
    }
}

impl From<UpdateMayorRequest> for contract::MayorPatch {
    fn from(req: UpdateMayorRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
        }
    }
}

// ===== Parcel conversions =====

impl From<contract::Parcel> for ParcelDto {
    fn from(parcel: contract::Parcel) -> Self {
        Self {
            id: parcel.id,
            village: parcel.village,
            area: parcel.area,
            coordinates: parcel.coordinates,
            owner_id: parcel.owner_id,
            cultivator_id: parcel.cultivator_id,
            created_at: parcel.created_at,
            updated_at: parcel.updated_at,
        }
    }
}

impl From<contract::BatchResult> for BatchResultDto {
    fn from(result: contract::BatchResult) -> Self {
        Self {
            processed_count: result.processed_count,
            errors: result
                .errors
                .into_iter()
                .map(|e| RowErrorDto {
                    id: e.id,
                    error: e.error,
                })
                .collect(),
        }
    }
}

// ===== Assignment conversions =====

impl From<contract::AssignmentRole> for AssignmentRoleDto {
    fn from(role: contract::AssignmentRole) -> Self {
        match role {
            contract::AssignmentRole::Owner => Self::Owner,
            contract::AssignmentRole::Cultivator => Self::Cultivator,
        }
    }
}

impl From<AssignmentRoleDto> for contract::AssignmentRole {
    fn from(role: AssignmentRoleDto) -> Self {
        match role {
            AssignmentRoleDto::Owner => Self::Owner,
            AssignmentRoleDto::Cultivator => Self::Cultivator,
        }
    }
}

impl From<ConflictDecisionDto> for contract::ConflictDecision {
    fn from(dto: ConflictDecisionDto) -> Self {
        Self {
            parcel_id: dto.parcel_id,
            role: dto.role.into(),
            resolution: match dto.resolution {
                ConflictResolutionDto::Force => contract::ConflictResolution::Force,
                ConflictResolutionDto::Keep => contract::ConflictResolution::Keep,
            },
        }
    }
}

impl From<contract::AssignmentConflict> for ConflictDto {
    fn from(conflict: contract::AssignmentConflict) -> Self {
        Self {
            parcel_id: conflict.parcel_id,
            role: conflict.role.into(),
            current_holder_id: conflict.current_holder_id,
            current_holder_name: conflict.current_holder_name,
            target_farmer_id: conflict.target_farmer_id,
            target_farmer_name: conflict.target_farmer_name,
        }
    }
}

impl From<contract::AssignmentSummary> for AssignmentResultDto {
    fn from(summary: contract::AssignmentSummary) -> Self {
        Self {
            status: AssignmentStatusDto::Committed,
            farmer_id: summary.farmer_id,
            owned: summary.owned,
            cultivated: summary.cultivated,
            forced: summary.forced,
            changes: summary.changes,
        }
    }
}

impl AssignmentResultDto {
    pub fn no_change(farmer_id: Uuid) -> Self {
        Self {
            status: AssignmentStatusDto::NoChange,
            farmer_id,
            owned: Vec::new(),
            cultivated: Vec::new(),
            forced: false,
            changes: 0,
        }
    }
}

// ===== Map conversions =====

impl From<BoundsDto> for contract::Bounds {
    fn from(dto: BoundsDto) -> Self {
        contract::Bounds::new(dto.min_lon, dto.min_lat, dto.max_lon, dto.max_lat)
    }
}

impl From<contract::Bounds> for BoundsDto {
    fn from(bounds: contract::Bounds) -> Self {
        Self {
            min_lon: bounds.min_lon,
            min_lat: bounds.min_lat,
            max_lon: bounds.max_lon,
            max_lat: bounds.max_lat,
        }
    }
}

impl From<ColorModeDto> for contract::ColorMode {
    fn from(dto: ColorModeDto) -> Self {
        match dto {
            ColorModeDto::Default => Self::Default,
            ColorModeDto::ShowAllFarmers => Self::ShowAllFarmers,
            ColorModeDto::Highlight { farmer_id } => Self::Highlight(farmer_id),
        }
    }
}

impl From<RenderMapRequest> for contract::RenderRequest {
    fn from(req: RenderMapRequest) -> Self {
        Self {
            village: req.village,
            viewport: req.viewport.into(),
            zoom: req.zoom,
            color_mode: req.color_mode.into(),
            selected_parcel_id: req.selected_parcel_id,
        }
    }
}

impl From<contract::RenderedParcel> for RenderedParcelDto {
    fn from(parcel: contract::RenderedParcel) -> Self {
        Self {
            parcel_id: parcel.parcel_id,
            ring: parcel.ring,
            simplified: parcel.simplified,
            style: ParcelStyleDto {
                fill_color: parcel.style.fill_color,
                outline_color: parcel.style.outline_color,
                weight: parcel.style.weight,
                fill_opacity: parcel.style.fill_opacity,
            },
        }
    }
}

impl From<contract::EdgeDimension> for EdgeDimensionDto {
    fn from(edge: contract::EdgeDimension) -> Self {
        Self {
            segment_index: edge.segment_index,
            midpoint: edge.midpoint,
            length_m: edge.length_m,
        }
    }
}

// ===== Statistics conversions =====

impl From<contract::VillageStats> for VillageStatsDto {
    fn from(stats: contract::VillageStats) -> Self {
        Self {
            village: stats.village,
            parcel_count: stats.parcel_count,
            total_area: stats.total_area,
            farmer_count: stats.farmer_count,
        }
    }
}

impl From<contract::FarmerAreaStats> for FarmerAreaStatsDto {
    fn from(stats: contract::FarmerAreaStats) -> Self {
        Self {
            farmer_id: stats.farmer_id,
            farmer_name: stats.farmer_name,
            owned_area: stats.owned_area,
            cultivated_area: stats.cultivated_area,
        }
    }
}

impl From<contract::SizeBucket> for SizeBucketDto {
    fn from(bucket: contract::SizeBucket) -> Self {
        Self {
            range: bucket.range,
            count: bucket.count,
        }
    }
}

// ===== Administration conversions =====

impl From<contract::LogEntry> for LogEntryDto {
    fn from(entry: contract::LogEntry) -> Self {
        Self {
            id: entry.id,
            log_type: entry.log_type.as_str().to_string(),
            actor: entry.actor,
            action: entry.action,
            details: entry.details,
            timestamp: entry.timestamp,
        }
    }
}

impl From<contract::SiteSettings> for SiteSettingsDto {
    fn from(settings: contract::SiteSettings) -> Self {
        Self {
            site_name: settings.site_name,
            updated_at: settings.updated_at,
        }
    }
}
