//! Domain service - business logic orchestration
//!
//! Assignment, ingestion and statistics operations live next to their pure
//! logic in `assignment.rs`, `ingestion.rs` and `stats.rs`.

use super::audit::AuditTrail;
use super::credentials::PasswordHasher;
use super::geometry::{bounds_of, default_farmer_color, render_parcels, LodConfig, StylePolicy};
use super::projection::Reprojector;
use super::repository::{
    AuditLogRepository, FarmerRepository, MaintenanceRepository, MayorRepository,
    ParcelRepository, Repositories, SiteSettingsRepository,
};
use super::validation::{
    normalize_optional, validate_email, validate_password, validate_required, validate_site_name,
};
use crate::contract::{
    Actor, Farmer, FarmerPatch, LogEntry, LogType, Mayor, MayorPatch, NewFarmer, NewMayor, Parcel,
    RegistryError, RenderRequest, RenderedMap, SiteSettings, SubscriptionStatus,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default display name until an administrator sets one
pub const DEFAULT_SITE_NAME: &str = "AgriCad Platform";

/// Tunables handed to the service at construction
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub min_password_length: usize,
    pub default_site_name: String,
    pub max_upload_bytes: usize,
    pub lod: LodConfig,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            default_site_name: DEFAULT_SITE_NAME.to_string(),
            max_upload_bytes: 5 * 1024 * 1024, // 5MB
            lod: LodConfig::default(),
        }
    }
}

/// Map a repository failure to `RegistryError::Store`, logging the cause
pub(crate) fn store_error(context: &'static str) -> impl Fn(anyhow::Error) -> RegistryError {
    move |err| {
        tracing::error!(context, "Store operation failed: {:#}", err);
        RegistryError::Store
    }
}

/// Domain service for the land registry
pub struct Service {
    pub(crate) farmers: Arc<dyn FarmerRepository>,
    pub(crate) mayors: Arc<dyn MayorRepository>,
    pub(crate) parcels: Arc<dyn ParcelRepository>,
    pub(crate) audit_log: Arc<dyn AuditLogRepository>,
    pub(crate) site_settings: Arc<dyn SiteSettingsRepository>,
    pub(crate) maintenance: Arc<dyn MaintenanceRepository>,
    pub(crate) audit: AuditTrail,
    pub(crate) hasher: Arc<dyn PasswordHasher>,
    pub(crate) reprojector: Arc<dyn Reprojector>,
    pub(crate) options: ServiceOptions,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        reprojector: Arc<dyn Reprojector>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            farmers: repos.farmers,
            mayors: repos.mayors,
            parcels: repos.parcels,
            audit: AuditTrail::new(repos.audit_log.clone()),
            audit_log: repos.audit_log,
            site_settings: repos.site_settings,
            maintenance: repos.maintenance,
            hasher,
            reprojector,
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    // ===== Access Control =====

    /// Village the actor is confined to; `None` for administrators
    async fn actor_village(&self, actor: &Actor) -> Result<Option<String>, RegistryError> {
        match actor {
            Actor::Admin { .. } => Ok(None),
            Actor::Mayor { village, .. } => Ok(Some(village.clone())),
            Actor::Farmer { id } => {
                let farmer = self
                    .farmers
                    .find_by_id(*id)
                    .await
                    .map_err(store_error("load acting farmer"))?
                    .ok_or_else(|| RegistryError::forbidden("unknown farmer account"))?;
                Ok(Some(farmer.village))
            }
        }
    }

    pub(crate) async fn ensure_village_access(
        &self,
        actor: &Actor,
        village: &str,
    ) -> Result<(), RegistryError> {
        match self.actor_village(actor).await? {
            Some(scope) if scope != village => Err(RegistryError::forbidden(format!(
                "access limited to village '{}'",
                scope
            ))),
            _ => Ok(()),
        }
    }

    /// Apply the actor's village scope to an optional village filter
    async fn scoped_village(
        &self,
        actor: &Actor,
        requested: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        match self.actor_village(actor).await? {
            None => Ok(requested.map(str::to_string)),
            Some(scope) => match requested {
                Some(village) if village != scope => Err(RegistryError::forbidden(format!(
                    "access limited to village '{}'",
                    scope
                ))),
                _ => Ok(Some(scope)),
            },
        }
    }

    fn ensure_admin(actor: &Actor) -> Result<(), RegistryError> {
        match actor {
            Actor::Admin { .. } => Ok(()),
            _ => Err(RegistryError::forbidden("administrator role required")),
        }
    }

    /// Administrators, and mayors of the farmer's village
    fn ensure_can_manage_farmer(actor: &Actor, village: &str) -> Result<(), RegistryError> {
        match actor {
            Actor::Admin { .. } => Ok(()),
            Actor::Mayor { village: scope, .. } if scope == village => Ok(()),
            Actor::Mayor { village: scope, .. } => Err(RegistryError::forbidden(format!(
                "access limited to village '{}'",
                scope
            ))),
            Actor::Farmer { .. } => Err(RegistryError::forbidden(
                "farmers cannot manage other accounts",
            )),
        }
    }

    /// Managers of the farmer, and the farmer themself
    fn ensure_can_view_farmer(actor: &Actor, farmer: &Farmer) -> Result<(), RegistryError> {
        match actor {
            Actor::Farmer { id } if *id == farmer.id => Ok(()),
            _ => Self::ensure_can_manage_farmer(actor, &farmer.village),
        }
    }

    async fn audit_failure(&self, actor: &Actor, log_type: LogType, action: &str, err: &RegistryError) {
        self.audit
            .record(log_type, &actor.audit_id(), action, format!("Error: {}", err))
            .await;
    }

    // ===== Farmer Operations =====

    /// Farmers ordered by name. Mayors and farmers only see their own village.
    pub async fn list_farmers(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Farmer>, RegistryError> {
        let village = self.scoped_village(actor, village).await?;
        self.farmers
            .list(village.as_deref())
            .await
            .map_err(store_error("list farmers"))
    }

    pub async fn get_farmer(&self, actor: &Actor, id: Uuid) -> Result<Farmer, RegistryError> {
        let farmer = self.load_farmer(id).await?;
        Self::ensure_can_view_farmer(actor, &farmer)?;
        Ok(farmer)
    }

    async fn load_farmer(&self, id: Uuid) -> Result<Farmer, RegistryError> {
        self.farmers
            .find_by_id(id)
            .await
            .map_err(store_error("load farmer"))?
            .ok_or_else(|| RegistryError::not_found("farmer", id))
    }

    /// Create a farmer. A missing color is taken from the default palette.
    pub async fn add_farmer(&self, actor: &Actor, new: NewFarmer) -> Result<Farmer, RegistryError> {
        let result = self.add_farmer_inner(actor, new).await;
        match &result {
            Ok(farmer) => {
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Added Farmer",
                        format!(
                            "ID: {}, Name: {}, Village: {}, Color: {}",
                            farmer.id,
                            farmer.name,
                            farmer.village,
                            farmer.color.as_deref().unwrap_or("None")
                        ),
                    )
                    .await;
                tracing::info!(farmer_id = %farmer.id, village = %farmer.village, "Farmer created");
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Add Farmer", err)
                    .await
            }
        }
        result
    }

    async fn add_farmer_inner(&self, actor: &Actor, new: NewFarmer) -> Result<Farmer, RegistryError> {
        validate_required(&[
            ("name", new.name.as_str()),
            ("company_code", new.company_code.as_str()),
            ("village", new.village.as_str()),
            ("password", new.password.as_str()),
        ])?;
        validate_password(&new.password, self.options.min_password_length)?;

        let village = new.village.trim().to_string();
        Self::ensure_can_manage_farmer(actor, &village)?;

        let company_code = new.company_code.trim().to_string();
        let email = normalize_optional(new.email.as_deref());
        if let Some(email) = &email {
            validate_email(email)?;
        }

        self.ensure_company_code_free(&company_code, None).await?;
        if let Some(email) = &email {
            self.ensure_farmer_email_free(email, None).await?;
        }

        let color = match normalize_optional(new.color.as_deref()) {
            Some(color) => color,
            None => {
                let count = self
                    .farmers
                    .count()
                    .await
                    .map_err(store_error("count farmers"))?;
                default_farmer_color(count).to_string()
            }
        };

        let password_hash = self
            .hasher
            .hash(&new.password)
            .map_err(store_error("hash password"))?;

        let now = Utc::now();
        let farmer = Farmer {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            company_code,
            village,
            email,
            phone: normalize_optional(new.phone.as_deref()),
            password_hash,
            color: Some(color),
            created_at: now,
            updated_at: now,
        };

        self.farmers
            .create(&farmer)
            .await
            .map_err(store_error("create farmer"))
    }

    async fn ensure_company_code_free(
        &self,
        company_code: &str,
        except: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        let existing = self
            .farmers
            .find_by_company_code(company_code)
            .await
            .map_err(store_error("check company code"))?;
        match existing {
            Some(other) if Some(other.id) != except => Err(RegistryError::UniquenessViolation {
                field: "company_code".to_string(),
                value: company_code.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn ensure_farmer_email_free(
        &self,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        let existing = self
            .farmers
            .find_by_email(email)
            .await
            .map_err(store_error("check farmer email"))?;
        match existing {
            Some(other) if Some(other.id) != except => Err(RegistryError::UniquenessViolation {
                field: "email".to_string(),
                value: email.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Apply a partial update. Farmers may edit their own contact details and
    /// color but not their company code or village.
    pub async fn update_farmer(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: FarmerPatch,
    ) -> Result<Farmer, RegistryError> {
        let result = self.update_farmer_inner(actor, id, patch).await;
        if let Err(err) = &result {
            self.audit_failure(actor, LogType::UserAction, "Failed Update Farmer", err)
                .await;
        }
        result
    }

    /// Parcels must stay with farmers of their own village, so a farmer who
    /// still owns or cultivates land cannot move
    async fn ensure_holds_no_parcels(&self, farmer: &Farmer) -> Result<(), RegistryError> {
        let owned = self
            .parcels
            .list_by_owner(farmer.id)
            .await
            .map_err(store_error("list owned parcels"))?;
        let cultivated = self
            .parcels
            .list_by_cultivator(farmer.id)
            .await
            .map_err(store_error("list cultivated parcels"))?;
        if owned.is_empty() && cultivated.is_empty() {
            return Ok(());
        }
        Err(RegistryError::validation(format!(
            "Farmer still owns {} and cultivates {} parcels in {}; release them before changing village",
            owned.len(),
            cultivated.len(),
            farmer.village
        )))
    }

    async fn update_farmer_inner(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: FarmerPatch,
    ) -> Result<Farmer, RegistryError> {
        let current = self.load_farmer(id).await?;
        Self::ensure_can_view_farmer(actor, &current)?;

        if matches!(actor, Actor::Farmer { .. })
            && (patch.company_code.is_some() || patch.village.is_some())
        {
            return Err(RegistryError::forbidden(
                "farmers cannot change company code or village",
            ));
        }

        let mut updated = current.clone();
        let mut changes: Vec<String> = Vec::new();

        if let Some(name) = &patch.name {
            validate_required(&[("name", name.as_str())])?;
            updated.name = name.trim().to_string();
        }
        if let Some(code) = &patch.company_code {
            validate_required(&[("company_code", code.as_str())])?;
            updated.company_code = code.trim().to_string();
            if updated.company_code != current.company_code {
                self.ensure_company_code_free(&updated.company_code, Some(id))
                    .await?;
            }
        }
        if let Some(village) = &patch.village {
            validate_required(&[("village", village.as_str())])?;
            updated.village = village.trim().to_string();
            // A mayor cannot move a farmer out of their village
            Self::ensure_can_manage_farmer(actor, &updated.village)?;
            if updated.village != current.village {
                self.ensure_holds_no_parcels(&current).await?;
            }
        }
        if let Some(email) = &patch.email {
            updated.email = normalize_optional(Some(email.as_str()));
            if let Some(email) = &updated.email {
                validate_email(email)?;
                if current.email.as_ref() != Some(email) {
                    self.ensure_farmer_email_free(email, Some(id)).await?;
                }
            }
        }
        if let Some(phone) = &patch.phone {
            updated.phone = normalize_optional(Some(phone.as_str()));
        }
        if let Some(color) = &patch.color {
            updated.color = normalize_optional(Some(color.as_str()));
        }

        record_change(&mut changes, "name", Some(&current.name), Some(&updated.name));
        record_change(
            &mut changes,
            "companyCode",
            Some(&current.company_code),
            Some(&updated.company_code),
        );
        record_change(&mut changes, "village", Some(&current.village), Some(&updated.village));
        record_change(&mut changes, "email", current.email.as_ref(), updated.email.as_ref());
        record_change(&mut changes, "phone", current.phone.as_ref(), updated.phone.as_ref());
        record_change(&mut changes, "color", current.color.as_ref(), updated.color.as_ref());

        let saved = if changes.is_empty() {
            current
        } else {
            updated.updated_at = Utc::now();
            self.farmers
                .update(&updated)
                .await
                .map_err(store_error("update farmer"))?
        };

        let summary = if changes.is_empty() {
            "None".to_string()
        } else {
            changes.join(", ")
        };
        self.audit
            .record(
                LogType::UserAction,
                &actor.audit_id(),
                "Updated Farmer",
                format!("ID: {}, Changes: {}", id, summary),
            )
            .await;
        tracing::info!(farmer_id = %id, changes = changes.len(), "Farmer updated");

        Ok(saved)
    }

    /// Delete a farmer; their parcels become unowned and uncultivated
    pub async fn delete_farmer(&self, actor: &Actor, id: Uuid) -> Result<(), RegistryError> {
        let result: Result<Farmer, RegistryError> = async {
            let farmer = self.load_farmer(id).await?;
            Self::ensure_can_manage_farmer(actor, &farmer.village)?;
            self.farmers
                .delete(id)
                .await
                .map_err(store_error("delete farmer"))?;
            Ok::<_, RegistryError>(farmer)
        }
        .await;

        match result {
            Ok(farmer) => {
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Deleted Farmer",
                        format!(
                            "ID: {}, Name: {}, Village: {}",
                            farmer.id, farmer.name, farmer.village
                        ),
                    )
                    .await;
                tracing::info!(farmer_id = %id, "Farmer deleted");
                Ok(())
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Delete Farmer", &err)
                    .await;
                Err(err)
            }
        }
    }

    // ===== Mayor Operations =====

    /// Mayors ordered by village, then name. Administrators only.
    pub async fn list_mayors(&self, actor: &Actor) -> Result<Vec<Mayor>, RegistryError> {
        Self::ensure_admin(actor)?;
        self.mayors
            .list()
            .await
            .map_err(store_error("list mayors"))
    }

    /// Administrators, or the mayor reading their own account
    pub async fn get_mayor(&self, actor: &Actor, id: Uuid) -> Result<Mayor, RegistryError> {
        match actor {
            Actor::Mayor { id: own, .. } if *own == id => {}
            _ => Self::ensure_admin(actor)?,
        }
        self.load_mayor(id).await
    }

    async fn load_mayor(&self, id: Uuid) -> Result<Mayor, RegistryError> {
        self.mayors
            .find_by_id(id)
            .await
            .map_err(store_error("load mayor"))?
            .ok_or_else(|| RegistryError::not_found("mayor", id))
    }

    /// Create a mayor with `PENDING` subscription and no end date
    pub async fn add_mayor(&self, actor: &Actor, new: NewMayor) -> Result<Mayor, RegistryError> {
        let result: Result<Mayor, RegistryError> = async {
            Self::ensure_admin(actor)?;
            validate_required(&[
                ("name", new.name.as_str()),
                ("village", new.village.as_str()),
                ("email", new.email.as_str()),
                ("password", new.password.as_str()),
            ])?;
            validate_password(&new.password, self.options.min_password_length)?;

            let email = new.email.trim().to_string();
            let village = new.village.trim().to_string();
            validate_email(&email)?;
            self.ensure_mayor_email_free(&email, None).await?;

            if self
                .mayors
                .find_by_village(&village)
                .await
                .map_err(store_error("check mayor village"))?
                .is_some()
            {
                return Err(RegistryError::UniquenessViolation {
                    field: "village".to_string(),
                    value: village,
                });
            }

            let password_hash = self
                .hasher
                .hash(&new.password)
                .map_err(store_error("hash password"))?;
            let now = Utc::now();
            let mayor = Mayor {
                id: Uuid::new_v4(),
                name: new.name.trim().to_string(),
                village,
                email,
                password_hash,
                subscription_status: SubscriptionStatus::Pending,
                subscription_end_date: None,
                created_at: now,
                updated_at: now,
            };

            let created = self
                .mayors
                .create(&mayor)
                .await
                .map_err(store_error("create mayor"))?;
            Ok::<_, RegistryError>(created)
        }
        .await;

        match &result {
            Ok(mayor) => {
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Added Mayor",
                        format!(
                            "ID: {}, Name: {}, Village: {}, Status: PENDING",
                            mayor.id, mayor.name, mayor.village
                        ),
                    )
                    .await;
                tracing::info!(mayor_id = %mayor.id, village = %mayor.village, "Mayor created");
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Add Mayor", err)
                    .await
            }
        }
        result
    }

    async fn ensure_mayor_email_free(
        &self,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        let existing = self
            .mayors
            .find_by_email(email)
            .await
            .map_err(store_error("check mayor email"))?;
        match existing {
            Some(other) if Some(other.id) != except => Err(RegistryError::UniquenessViolation {
                field: "email".to_string(),
                value: email.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Update a mayor's name and email
    pub async fn update_mayor_details(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: MayorPatch,
    ) -> Result<Mayor, RegistryError> {
        let result: Result<(Mayor, Vec<String>), RegistryError> = async {
            Self::ensure_admin(actor)?;
            let current = self.load_mayor(id).await?;
            let mut updated = current.clone();

            if let Some(name) = &patch.name {
                validate_required(&[("name", name.as_str())])?;
                updated.name = name.trim().to_string();
            }
            if let Some(email) = &patch.email {
                validate_required(&[("email", email.as_str())])?;
                let email = email.trim().to_string();
                validate_email(&email)?;
                if email != current.email {
                    self.ensure_mayor_email_free(&email, Some(id)).await?;
                }
                updated.email = email;
            }

            let mut changes = Vec::new();
            record_change(&mut changes, "name", Some(&current.name), Some(&updated.name));
            record_change(&mut changes, "email", Some(&current.email), Some(&updated.email));

            if changes.is_empty() {
                return Ok((current, changes));
            }
            updated.updated_at = Utc::now();
            let saved = self
                .mayors
                .update(&updated)
                .await
                .map_err(store_error("update mayor"))?;
            Ok::<_, RegistryError>((saved, changes))
        }
        .await;

        match result {
            Ok((mayor, changes)) => {
                let summary = if changes.is_empty() {
                    "None".to_string()
                } else {
                    changes.join(", ")
                };
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Updated Mayor Details",
                        format!("ID: {}, Changes: {}", id, summary),
                    )
                    .await;
                Ok(mayor)
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Update Mayor Details", &err)
                    .await;
                Err(err)
            }
        }
    }

    /// Change subscription status. `end_date: None` keeps the stored end date,
    /// `Some(None)` clears it.
    pub async fn update_mayor_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: SubscriptionStatus,
        end_date: Option<Option<DateTime<Utc>>>,
    ) -> Result<Mayor, RegistryError> {
        let result: Result<(Mayor, SubscriptionStatus), RegistryError> = async {
            Self::ensure_admin(actor)?;
            let mut mayor = self.load_mayor(id).await?;
            let old_status = mayor.subscription_status;

            mayor.subscription_status = status;
            if let Some(end_date) = end_date {
                mayor.subscription_end_date = end_date;
            }
            mayor.updated_at = Utc::now();

            let saved = self
                .mayors
                .update(&mayor)
                .await
                .map_err(store_error("update mayor status"))?;
            Ok::<_, RegistryError>((saved, old_status))
        }
        .await;

        match result {
            Ok((mayor, old_status)) => {
                let end = mayor
                    .subscription_end_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "None".to_string());
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Updated Mayor Status",
                        format!(
                            "ID: {}, Status: {} -> {}, EndDate: {}",
                            id,
                            old_status.as_str(),
                            status.as_str(),
                            end
                        ),
                    )
                    .await;
                tracing::info!(mayor_id = %id, status = status.as_str(), "Mayor status updated");
                Ok(mayor)
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Update Mayor Status", &err)
                    .await;
                Err(err)
            }
        }
    }

    pub async fn delete_mayor(&self, actor: &Actor, id: Uuid) -> Result<(), RegistryError> {
        let result: Result<Mayor, RegistryError> = async {
            Self::ensure_admin(actor)?;
            let mayor = self.load_mayor(id).await?;
            self.mayors
                .delete(id)
                .await
                .map_err(store_error("delete mayor"))?;
            Ok::<_, RegistryError>(mayor)
        }
        .await;

        match result {
            Ok(mayor) => {
                self.audit
                    .record(
                        LogType::UserAction,
                        &actor.audit_id(),
                        "Deleted Mayor",
                        format!(
                            "ID: {}, Name: {}, Village: {}",
                            mayor.id, mayor.name, mayor.village
                        ),
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                self.audit_failure(actor, LogType::UserAction, "Failed Delete Mayor", &err)
                    .await;
                Err(err)
            }
        }
    }

    // ===== Parcel Operations =====

    /// Parcels ordered by id. Mayors and farmers only see their own village.
    pub async fn list_parcels(
        &self,
        actor: &Actor,
        village: Option<&str>,
    ) -> Result<Vec<Parcel>, RegistryError> {
        let village = self.scoped_village(actor, village).await?;
        self.parcels
            .list(village.as_deref())
            .await
            .map_err(store_error("list parcels"))
    }

    pub async fn get_parcel(&self, actor: &Actor, id: &str) -> Result<Parcel, RegistryError> {
        let parcel = self
            .parcels
            .find_by_id(id)
            .await
            .map_err(store_error("load parcel"))?
            .ok_or_else(|| RegistryError::not_found("parcel", id))?;
        self.ensure_village_access(actor, &parcel.village).await?;
        Ok(parcel)
    }

    pub async fn parcels_by_owner(
        &self,
        actor: &Actor,
        farmer_id: Uuid,
    ) -> Result<Vec<Parcel>, RegistryError> {
        let farmer = self.load_farmer(farmer_id).await?;
        Self::ensure_can_view_farmer(actor, &farmer)?;
        self.parcels
            .list_by_owner(farmer_id)
            .await
            .map_err(store_error("list owned parcels"))
    }

    pub async fn parcels_by_cultivator(
        &self,
        actor: &Actor,
        farmer_id: Uuid,
    ) -> Result<Vec<Parcel>, RegistryError> {
        let farmer = self.load_farmer(farmer_id).await?;
        Self::ensure_can_view_farmer(actor, &farmer)?;
        self.parcels
            .list_by_cultivator(farmer_id)
            .await
            .map_err(store_error("list cultivated parcels"))
    }

    // ===== Map Operations =====

    /// Parcels of one village prepared for the viewport and zoom
    ///
    /// The village extent is returned at every zoom so a client can fit its
    /// first view before any parcel is drawn.
    pub async fn render_map(
        &self,
        actor: &Actor,
        request: &RenderRequest,
    ) -> Result<RenderedMap, RegistryError> {
        self.ensure_village_access(actor, &request.village).await?;

        let parcels = self
            .parcels
            .list(Some(&request.village))
            .await
            .map_err(store_error("list parcels"))?;
        let bounds = bounds_of(&parcels);

        let lod = self.options.lod;
        if lod.detail_for(request.zoom) == super::geometry::DetailLevel::Hidden {
            return Ok(RenderedMap {
                parcels: Vec::new(),
                bounds,
            });
        }
        let farmers = self
            .farmers
            .list(Some(&request.village))
            .await
            .map_err(store_error("list farmers"))?;

        let style = StylePolicy {
            owner_colors: farmers
                .into_iter()
                .filter_map(|f| f.color.map(|c| (f.id, c)))
                .collect(),
            mode: request.color_mode.clone(),
            selected: request.selected_parcel_id.clone(),
        };

        let rendered = render_parcels(&parcels, &request.viewport, request.zoom, &lod, &style);
        tracing::debug!(
            village = %request.village,
            zoom = request.zoom,
            total = parcels.len(),
            rendered = rendered.len(),
            "Map rendered"
        );
        Ok(RenderedMap {
            parcels: rendered,
            bounds,
        })
    }

    // ===== Administration =====

    /// Current site settings, falling back to the configured default name
    pub async fn site_settings(&self) -> Result<SiteSettings, RegistryError> {
        let stored = self
            .site_settings
            .get()
            .await
            .map_err(store_error("load site settings"))?;
        Ok(stored.unwrap_or_else(|| SiteSettings {
            site_name: self.options.default_site_name.clone(),
            updated_at: Utc::now(),
        }))
    }

    pub async fn update_site_name(
        &self,
        actor: &Actor,
        name: &str,
    ) -> Result<SiteSettings, RegistryError> {
        Self::ensure_admin(actor)?;
        validate_site_name(name)?;

        let old = self.site_settings().await?;
        let saved = self
            .site_settings
            .put(&SiteSettings {
                site_name: name.trim().to_string(),
                updated_at: Utc::now(),
            })
            .await
            .map_err(store_error("save site settings"))?;

        self.audit
            .record(
                LogType::UserAction,
                &actor.audit_id(),
                "Updated Site Name",
                format!("From: '{}' To: '{}'", old.site_name, saved.site_name),
            )
            .await;
        Ok(saved)
    }

    /// Audit entries, newest first
    pub async fn list_logs(
        &self,
        actor: &Actor,
        log_type: Option<LogType>,
        limit: u64,
    ) -> Result<Vec<LogEntry>, RegistryError> {
        Self::ensure_admin(actor)?;
        self.audit_log
            .list(log_type, limit)
            .await
            .map_err(store_error("list logs"))
    }

    /// Remove every audit entry, then record that the log was cleared
    pub async fn clear_logs(&self, actor: &Actor) -> Result<u64, RegistryError> {
        Self::ensure_admin(actor)?;
        let removed = match self.audit_log.clear().await {
            Ok(removed) => removed,
            Err(e) => {
                let err = store_error("clear logs")(e);
                self.audit_failure(actor, LogType::System, "Failed Clear Logs Trigger", &err)
                    .await;
                return Err(err);
            }
        };

        self.audit
            .record(
                LogType::System,
                &actor.audit_id(),
                "Cleared All Logs",
                format!("Removed {} log entries.", removed),
            )
            .await;
        tracing::info!(removed, "Audit log cleared");
        Ok(removed)
    }

    /// Delete all parcels, farmers and mayors. Logs and settings are kept.
    pub async fn clear_application_data(&self, actor: &Actor) -> Result<(), RegistryError> {
        Self::ensure_admin(actor)?;
        if let Err(e) = self.maintenance.clear_application_data().await {
            let err = store_error("clear application data")(e);
            self.audit_failure(
                actor,
                LogType::System,
                "Failed Clear Application Data Attempt",
                &err,
            )
            .await;
            return Err(err);
        }

        self.audit
            .record(
                LogType::System,
                &actor.audit_id(),
                "Cleared All Application Data",
                "Farmers, Mayors, and Parcels deleted.",
            )
            .await;
        tracing::warn!(actor = %actor.audit_id(), "Application data cleared");
        Ok(())
    }
}

/// Append `field: 'old' -> 'new'` when the value changed
fn record_change(changes: &mut Vec<String>, field: &str, old: Option<&String>, new: Option<&String>) {
    if old != new {
        changes.push(format!(
            "{}: '{}' -> '{}'",
            field,
            old.map(String::as_str).unwrap_or(""),
            new.map(String::as_str).unwrap_or("")
        ));
    }
}
