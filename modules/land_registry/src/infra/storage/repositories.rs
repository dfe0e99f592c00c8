//! SeaORM repository implementations

use crate::contract::{
    AssignmentRole, Farmer, LogEntry, LogType, Mayor, Parcel, ParcelGeometry, ParcelId,
    SiteSettings,
};
use crate::domain::assignment::ParcelUpdate;
use crate::domain::repository::{
    ApplyOutcome, AuditLogRepository, FarmerRepository, MaintenanceRepository, MayorRepository,
    ParcelRepository, Repositories, SiteSettingsRepository,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    prelude::Expr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::entity;
use super::mapper::new_parcel_active_model;

/// All SeaORM repositories over one connection
pub fn repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        farmers: Arc::new(SeaOrmFarmerRepository::new(db.clone())),
        mayors: Arc::new(SeaOrmMayorRepository::new(db.clone())),
        parcels: Arc::new(SeaOrmParcelRepository::new(db.clone())),
        audit_log: Arc::new(SeaOrmAuditLogRepository::new(db.clone())),
        site_settings: Arc::new(SeaOrmSiteSettingsRepository::new(db.clone())),
        maintenance: Arc::new(SeaOrmMaintenanceRepository::new(db)),
    }
}

// ===== Farmer Repository =====

pub struct SeaOrmFarmerRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmFarmerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FarmerRepository for SeaOrmFarmerRepository {
    async fn create(&self, farmer: &Farmer) -> Result<Farmer> {
        let active: entity::farmer::ActiveModel = farmer.into();
        let result = entity::farmer::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;

        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Farmer>> {
        let result = entity::farmer::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(|e| e.into()))
    }

    async fn find_by_company_code(&self, company_code: &str) -> Result<Option<Farmer>> {
        let result = entity::farmer::Entity::find()
            .filter(entity::farmer::Column::CompanyCode.eq(company_code))
            .one(&*self.db)
            .await?;

        Ok(result.map(|e| e.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Farmer>> {
        let result = entity::farmer::Entity::find()
            .filter(entity::farmer::Column::Email.eq(email))
            .one(&*self.db)
            .await?;

        Ok(result.map(|e| e.into()))
    }

    async fn list(&self, village: Option<&str>) -> Result<Vec<Farmer>> {
        let mut query = entity::farmer::Entity::find();

        if let Some(village) = village {
            query = query.filter(entity::farmer::Column::Village.eq(village));
        }

        let results = query
            .order_by_asc(entity::farmer::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(entity::farmer::Entity::find().count(&*self.db).await?)
    }

    async fn update(&self, farmer: &Farmer) -> Result<Farmer> {
        let active: entity::farmer::ActiveModel = farmer.into();
        let result = entity::farmer::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        entity::parcel::Entity::update_many()
            .col_expr(entity::parcel::Column::OwnerId, Expr::value(Option::<Uuid>::None))
            .filter(entity::parcel::Column::OwnerId.eq(id))
            .exec(&txn)
            .await?;

        entity::parcel::Entity::update_many()
            .col_expr(
                entity::parcel::Column::CultivatorId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(entity::parcel::Column::CultivatorId.eq(id))
            .exec(&txn)
            .await?;

        entity::farmer::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}

// ===== Mayor Repository =====

pub struct SeaOrmMayorRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmMayorRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MayorRepository for SeaOrmMayorRepository {
    async fn create(&self, mayor: &Mayor) -> Result<Mayor> {
        let active: entity::mayor::ActiveModel = mayor.into();
        let result = entity::mayor::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;

        result.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Mayor>> {
        let result = entity::mayor::Entity::find_by_id(id).one(&*self.db).await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Mayor>> {
        let result = entity::mayor::Entity::find()
            .filter(entity::mayor::Column::Email.eq(email))
            .one(&*self.db)
            .await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn find_by_village(&self, village: &str) -> Result<Option<Mayor>> {
        let result = entity::mayor::Entity::find()
            .filter(entity::mayor::Column::Village.eq(village))
            .one(&*self.db)
            .await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Mayor>> {
        let results = entity::mayor::Entity::find()
            .order_by_asc(entity::mayor::Column::Village)
            .order_by_asc(entity::mayor::Column::Name)
            .all(&*self.db)
            .await?;

        results.into_iter().map(Mayor::try_from).collect()
    }

    async fn update(&self, mayor: &Mayor) -> Result<Mayor> {
        let active: entity::mayor::ActiveModel = mayor.into();
        let result = entity::mayor::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        entity::mayor::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }
}

// ===== Parcel Repository =====

pub struct SeaOrmParcelRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmParcelRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn role_column(role: AssignmentRole) -> entity::parcel::Column {
    match role {
        AssignmentRole::Owner => entity::parcel::Column::OwnerId,
        AssignmentRole::Cultivator => entity::parcel::Column::CultivatorId,
    }
}

#[async_trait]
impl ParcelRepository for SeaOrmParcelRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Parcel>> {
        let result = entity::parcel::Entity::find_by_id(id.to_string())
            .one(&*self.db)
            .await?;

        Ok(result.map(|e| e.into()))
    }

    async fn find_in_village(&self, village: &str, ids: &[ParcelId]) -> Result<Vec<Parcel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = entity::parcel::Entity::find()
            .filter(entity::parcel::Column::Village.eq(village))
            .filter(entity::parcel::Column::Id.is_in(ids.iter().map(String::as_str)))
            .order_by_asc(entity::parcel::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn find_held_by(&self, village: &str, farmer_id: Uuid) -> Result<Vec<Parcel>> {
        let results = entity::parcel::Entity::find()
            .filter(entity::parcel::Column::Village.eq(village))
            .filter(
                Condition::any()
                    .add(entity::parcel::Column::OwnerId.eq(farmer_id))
                    .add(entity::parcel::Column::CultivatorId.eq(farmer_id)),
            )
            .order_by_asc(entity::parcel::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn list(&self, village: Option<&str>) -> Result<Vec<Parcel>> {
        let mut query = entity::parcel::Entity::find();

        if let Some(village) = village {
            query = query.filter(entity::parcel::Column::Village.eq(village));
        }

        let results = query
            .order_by_asc(entity::parcel::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn list_by_owner(&self, farmer_id: Uuid) -> Result<Vec<Parcel>> {
        let results = entity::parcel::Entity::find()
            .filter(entity::parcel::Column::OwnerId.eq(farmer_id))
            .order_by_asc(entity::parcel::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn list_by_cultivator(&self, farmer_id: Uuid) -> Result<Vec<Parcel>> {
        let results = entity::parcel::Entity::find()
            .filter(entity::parcel::Column::CultivatorId.eq(farmer_id))
            .order_by_asc(entity::parcel::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(|e| e.into()).collect())
    }

    async fn upsert_geometry(&self, geometry: &ParcelGeometry) -> Result<Parcel> {
        let active = new_parcel_active_model(geometry, chrono::Utc::now());

        // Ownership columns are left out of the conflict update
        entity::parcel::Entity::insert(active)
            .on_conflict(
                OnConflict::column(entity::parcel::Column::Id)
                    .update_columns([
                        entity::parcel::Column::Village,
                        entity::parcel::Column::Area,
                        entity::parcel::Column::Coordinates,
                        entity::parcel::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        let stored = entity::parcel::Entity::find_by_id(geometry.id.clone())
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("parcel {} missing after upsert", geometry.id))?;

        Ok(stored.into())
    }

    async fn apply_assignment(&self, updates: &[ParcelUpdate]) -> Result<ApplyOutcome> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();
        let mut stale: Vec<ParcelId> = Vec::new();

        for update in updates {
            let column = role_column(update.role);
            let guard = match update.expected {
                Some(holder) => column.eq(holder),
                None => column.is_null(),
            };

            let result = entity::parcel::Entity::update_many()
                .col_expr(column, Expr::value(update.value))
                .col_expr(entity::parcel::Column::UpdatedAt, Expr::value(now))
                .filter(entity::parcel::Column::Id.eq(update.parcel_id.as_str()))
                .filter(guard)
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 && !stale.contains(&update.parcel_id) {
                stale.push(update.parcel_id.clone());
            }
        }

        if !stale.is_empty() {
            txn.rollback().await?;
            tracing::warn!(
                stale = stale.len(),
                "Assignment guard mismatch, transaction rolled back"
            );
            return Ok(ApplyOutcome::Stale(stale));
        }

        txn.commit().await?;
        Ok(ApplyOutcome::Applied(updates.len()))
    }
}

// ===== Audit Log Repository =====

pub struct SeaOrmAuditLogRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmAuditLogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLogRepository for SeaOrmAuditLogRepository {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        let active: entity::audit_log::ActiveModel = entry.into();
        entity::audit_log::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;

        Ok(())
    }

    async fn list(&self, log_type: Option<LogType>, limit: u64) -> Result<Vec<LogEntry>> {
        let mut query = entity::audit_log::Entity::find();

        if let Some(log_type) = log_type {
            query = query.filter(entity::audit_log::Column::LogType.eq(log_type.as_str()));
        }

        let results = query
            .order_by_desc(entity::audit_log::Column::Timestamp)
            .limit(limit)
            .all(&*self.db)
            .await?;

        results.into_iter().map(LogEntry::try_from).collect()
    }

    async fn clear(&self) -> Result<u64> {
        let result = entity::audit_log::Entity::delete_many()
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

// ===== Site Settings Repository =====

pub struct SeaOrmSiteSettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSiteSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SiteSettingsRepository for SeaOrmSiteSettingsRepository {
    async fn get(&self) -> Result<Option<SiteSettings>> {
        let result = entity::site_settings::Entity::find_by_id(entity::site_settings::SINGLETON_ID)
            .one(&*self.db)
            .await?;

        Ok(result.map(|e| e.into()))
    }

    async fn put(&self, settings: &SiteSettings) -> Result<SiteSettings> {
        let active: entity::site_settings::ActiveModel = settings.into();

        entity::site_settings::Entity::insert(active)
            .on_conflict(
                OnConflict::column(entity::site_settings::Column::Id)
                    .update_columns([
                        entity::site_settings::Column::SiteName,
                        entity::site_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        Ok(settings.clone())
    }
}

// ===== Maintenance Repository =====

pub struct SeaOrmMaintenanceRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmMaintenanceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MaintenanceRepository for SeaOrmMaintenanceRepository {
    async fn clear_application_data(&self) -> Result<()> {
        let txn = self.db.begin().await?;

        // Parcels first, they reference farmers
        let parcels = entity::parcel::Entity::delete_many().exec(&txn).await?;
        let farmers = entity::farmer::Entity::delete_many().exec(&txn).await?;
        let mayors = entity::mayor::Entity::delete_many().exec(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            parcels = parcels.rows_affected,
            farmers = farmers.rows_affected,
            mayors = mayors.rows_affected,
            "Application data cleared"
        );
        Ok(())
    }
}
