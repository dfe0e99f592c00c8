//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity;
use crate::contract::{
    Farmer, LogEntry, LogType, LonLat, Mayor, Parcel, ParcelGeometry, SiteSettings,
    SubscriptionStatus,
};
use anyhow::anyhow;
use sea_orm::prelude::Json;

// ===== Farmer Conversions =====

impl From<entity::farmer::Model> for Farmer {
    fn from(entity: entity::farmer::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            company_code: entity.company_code,
            village: entity.village,
            email: entity.email,
            phone: entity.phone,
            password_hash: entity.password_hash,
            color: entity.color,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&Farmer> for entity::farmer::ActiveModel {
    fn from(model: &Farmer) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            company_code: Set(model.company_code.clone()),
            village: Set(model.village.clone()),
            email: Set(model.email.clone()),
            phone: Set(model.phone.clone()),
            password_hash: Set(model.password_hash.clone()),
            color: Set(model.color.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== Mayor Conversions =====

impl TryFrom<entity::mayor::Model> for Mayor {
    type Error = anyhow::Error;

    fn try_from(entity: entity::mayor::Model) -> Result<Self, Self::Error> {
        let subscription_status = SubscriptionStatus::parse(&entity.subscription_status)
            .ok_or_else(|| {
                anyhow!(
                    "mayor {} has unknown subscription status '{}'",
                    entity.id,
                    entity.subscription_status
                )
            })?;

        Ok(Self {
            id: entity.id,
            name: entity.name,
            village: entity.village,
            email: entity.email,
            password_hash: entity.password_hash,
            subscription_status,
            subscription_end_date: entity.subscription_end_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<&Mayor> for entity::mayor::ActiveModel {
    fn from(model: &Mayor) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            village: Set(model.village.clone()),
            email: Set(model.email.clone()),
            password_hash: Set(model.password_hash.clone()),
            subscription_status: Set(model.subscription_status.as_str().to_string()),
            subscription_end_date: Set(model.subscription_end_date),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== Parcel Conversions =====

impl From<entity::parcel::Model> for Parcel {
    fn from(entity: entity::parcel::Model) -> Self {
        let coordinates = ring_from_json(&entity.id, entity.coordinates);

        Self {
            id: entity.id,
            village: entity.village,
            area: entity.area,
            coordinates,
            owner_id: entity.owner_id,
            cultivator_id: entity.cultivator_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Active model for a new parcel with no owner or cultivator
pub fn new_parcel_active_model(
    geometry: &ParcelGeometry,
    now: chrono::DateTime<chrono::Utc>,
) -> entity::parcel::ActiveModel {
    use sea_orm::ActiveValue::*;

    entity::parcel::ActiveModel {
        id: Set(geometry.id.clone()),
        village: Set(geometry.village.clone()),
        area: Set(geometry.area),
        coordinates: Set(ring_to_json(&geometry.coordinates)),
        owner_id: Set(None),
        cultivator_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ===== Audit Log Conversions =====

impl TryFrom<entity::audit_log::Model> for LogEntry {
    type Error = anyhow::Error;

    fn try_from(entity: entity::audit_log::Model) -> Result<Self, Self::Error> {
        let log_type = LogType::parse(&entity.log_type)
            .ok_or_else(|| anyhow!("audit entry {} has unknown type '{}'", entity.id, entity.log_type))?;

        Ok(Self {
            id: entity.id,
            log_type,
            actor: entity.actor,
            action: entity.action,
            details: entity.details,
            timestamp: entity.timestamp,
        })
    }
}

impl From<&LogEntry> for entity::audit_log::ActiveModel {
    fn from(model: &LogEntry) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            log_type: Set(model.log_type.as_str().to_string()),
            actor: Set(model.actor.clone()),
            action: Set(model.action.clone()),
            details: Set(model.details.clone()),
            timestamp: Set(model.timestamp),
        }
    }
}

// ===== Site Settings Conversions =====

impl From<entity::site_settings::Model> for SiteSettings {
    fn from(entity: entity::site_settings::Model) -> Self {
        Self {
            site_name: entity.site_name,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&SiteSettings> for entity::site_settings::ActiveModel {
    fn from(model: &SiteSettings) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(entity::site_settings::SINGLETON_ID),
            site_name: Set(model.site_name.clone()),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== JSON Serialization Helpers =====

/// Encode a ring as `[[lon, lat], ...]`
pub fn ring_to_json(ring: &[LonLat]) -> Json {
    Json::Array(
        ring.iter()
            .map(|[lon, lat]| Json::Array(vec![Json::from(*lon), Json::from(*lat)]))
            .collect(),
    )
}

/// Decode a stored ring. A malformed value yields an empty ring so the parcel
/// stays listable; it is skipped by the map renderer.
fn ring_from_json(parcel_id: &str, value: Json) -> Vec<LonLat> {
    match serde_json::from_value::<Vec<LonLat>>(value) {
        Ok(ring) => ring,
        Err(err) => {
            tracing::warn!(parcel_id, error = %err, "Stored parcel coordinates are malformed");
            Vec::new()
        }
    }
}
