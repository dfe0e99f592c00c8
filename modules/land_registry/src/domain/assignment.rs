//! Parcel assignment reconciliation
//!
//! A request carries the complete final owned/cultivated sets for one farmer.
//! Planning diffs that state against what the farmer currently holds inside
//! their village and produces guarded column updates. Conflict detection and
//! commit are separate steps so the caller can resolve conflicts in between.

use crate::contract::{
    Actor, AssignmentConflict, AssignmentOutcome, AssignmentRequest, AssignmentRole,
    AssignmentSummary, Farmer, LogType, Parcel, ParcelId, RegistryError,
};
use crate::domain::repository::ApplyOutcome;
use crate::domain::service::{store_error, Service};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

/// Single guarded write of one ownership column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelUpdate {
    pub parcel_id: ParcelId,
    pub role: AssignmentRole,
    /// Value the column must still hold for the write to apply
    pub expected: Option<Uuid>,
    pub value: Option<Uuid>,
}

/// Desired IDs with no parcel in the loaded village set, sorted and deduplicated
pub fn find_invalid_ids(
    request: &AssignmentRequest,
    parcels: &BTreeMap<ParcelId, Parcel>,
) -> Vec<ParcelId> {
    request
        .all_desired()
        .into_iter()
        .filter(|id| !parcels.contains_key(id))
        .collect()
}

/// Conflicts the request would cause if committed
///
/// A cultivator conflict is waived when the target also takes ownership and the
/// current cultivator is the current owner: the cultivation moves with the
/// ownership transfer.
pub fn detect(
    request: &AssignmentRequest,
    target: &Farmer,
    parcels: &BTreeMap<ParcelId, Parcel>,
    holder_names: &HashMap<Uuid, String>,
) -> Vec<AssignmentConflict> {
    let conflict = |parcel_id: &ParcelId, role: AssignmentRole, holder: Uuid| AssignmentConflict {
        parcel_id: parcel_id.clone(),
        role,
        current_holder_id: holder,
        current_holder_name: holder_names.get(&holder).cloned(),
        target_farmer_id: target.id,
        target_farmer_name: target.name.clone(),
    };

    let mut conflicts = Vec::new();

    for id in &request.desired_owned {
        let Some(parcel) = parcels.get(id) else { continue };
        if let Some(owner) = parcel.owner_id {
            if owner != target.id {
                conflicts.push(conflict(id, AssignmentRole::Owner, owner));
            }
        }
    }

    for id in &request.desired_cultivated {
        let Some(parcel) = parcels.get(id) else { continue };
        if let Some(cultivator) = parcel.cultivator_id {
            let moves_with_ownership =
                request.desired_owned.contains(id) && parcel.owner_id == Some(cultivator);
            if cultivator != target.id && !moves_with_ownership {
                conflicts.push(conflict(id, AssignmentRole::Cultivator, cultivator));
            }
        }
    }

    conflicts
}

/// Updates that turn the current holdings into the desired state
///
/// Order: owner deassignments, cultivator deassignments, owner assignments,
/// cultivator assignments. Within each group parcels are ordered by id.
pub fn plan(
    request: &AssignmentRequest,
    target_id: Uuid,
    parcels: &BTreeMap<ParcelId, Parcel>,
) -> Vec<ParcelUpdate> {
    let mut updates = Vec::new();

    for parcel in parcels.values() {
        if parcel.owner_id == Some(target_id) && !request.desired_owned.contains(&parcel.id) {
            updates.push(ParcelUpdate {
                parcel_id: parcel.id.clone(),
                role: AssignmentRole::Owner,
                expected: Some(target_id),
                value: None,
            });
        }
    }

    for parcel in parcels.values() {
        if parcel.cultivator_id == Some(target_id)
            && !request.desired_cultivated.contains(&parcel.id)
        {
            updates.push(ParcelUpdate {
                parcel_id: parcel.id.clone(),
                role: AssignmentRole::Cultivator,
                expected: Some(target_id),
                value: None,
            });
        }
    }

    for id in &request.desired_owned {
        if let Some(parcel) = parcels.get(id) {
            if parcel.owner_id != Some(target_id) {
                updates.push(ParcelUpdate {
                    parcel_id: id.clone(),
                    role: AssignmentRole::Owner,
                    expected: parcel.owner_id,
                    value: Some(target_id),
                });
            }
        }
    }

    for id in &request.desired_cultivated {
        if let Some(parcel) = parcels.get(id) {
            if parcel.cultivator_id != Some(target_id) {
                updates.push(ParcelUpdate {
                    parcel_id: id.clone(),
                    role: AssignmentRole::Cultivator,
                    expected: parcel.cultivator_id,
                    value: Some(target_id),
                });
            }
        }
    }

    updates
}

/// Whether the farmer currently holds any loaded parcel in either role
fn holds_any(target_id: Uuid, parcels: &BTreeMap<ParcelId, Parcel>) -> bool {
    parcels
        .values()
        .any(|p| p.owner_id == Some(target_id) || p.cultivator_id == Some(target_id))
}

fn format_ids(ids: &BTreeSet<ParcelId>) -> String {
    if ids.is_empty() {
        "N".to_string()
    } else {
        ids.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

/// Target farmer and the parcels relevant to one request
struct PreparedAssignment {
    target: Farmer,
    parcels: BTreeMap<ParcelId, Parcel>,
}

impl Service {
    // ===== Assignment Operations =====

    /// Report the conflicts `request` would cause. Writes nothing.
    #[tracing::instrument(skip(self, request), fields(farmer_id = %request.farmer_id))]
    pub async fn detect_conflicts(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<Vec<AssignmentConflict>, RegistryError> {
        let prepared = match self.prepare_assignment(actor, request).await {
            Ok(prepared) => prepared,
            Err(err) => {
                self.audit_assignment_failure(actor, request, &err).await;
                return Err(err);
            }
        };
        self.collect_conflicts(request, &prepared).await
    }

    /// Commit a resolved request. Any claim still held by another farmer on a
    /// desired parcel is overwritten.
    #[tracing::instrument(skip(self, request), fields(farmer_id = %request.farmer_id))]
    pub async fn commit_resolved(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome, RegistryError> {
        let result = match self.prepare_assignment(actor, request).await {
            Ok(prepared) => self.commit_prepared(actor, request, prepared, true).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.audit_assignment_failure(actor, request, err).await;
        }
        result
    }

    /// Reconcile the farmer's holdings to `request`
    ///
    /// Without `force`, a request with conflicts returns
    /// `AssignmentOutcome::Conflicts` and nothing is written.
    #[tracing::instrument(skip(self, request), fields(farmer_id = %request.farmer_id))]
    pub async fn assign_parcels(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        force: bool,
    ) -> Result<AssignmentOutcome, RegistryError> {
        let result = self.assign_inner(actor, request, force).await;
        if let Err(err) = &result {
            self.audit_assignment_failure(actor, request, err).await;
        }
        result
    }

    async fn assign_inner(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        force: bool,
    ) -> Result<AssignmentOutcome, RegistryError> {
        let prepared = self.prepare_assignment(actor, request).await?;

        if !force {
            let conflicts = self.collect_conflicts(request, &prepared).await?;
            if !conflicts.is_empty() {
                tracing::info!(
                    conflicts = conflicts.len(),
                    "Assignment has conflicts, nothing written"
                );
                return Ok(AssignmentOutcome::Conflicts(conflicts));
            }
        }

        self.commit_prepared(actor, request, prepared, force).await
    }

    async fn prepare_assignment(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
    ) -> Result<PreparedAssignment, RegistryError> {
        if matches!(actor, Actor::Farmer { .. }) {
            return Err(RegistryError::forbidden("farmers cannot assign parcels"));
        }

        let target = self
            .farmers
            .find_by_id(request.farmer_id)
            .await
            .map_err(store_error("load target farmer"))?
            .ok_or_else(|| RegistryError::not_found("farmer", request.farmer_id))?;

        if let Some(scope) = actor.village_scope() {
            if scope != target.village {
                return Err(RegistryError::forbidden(format!(
                    "farmer belongs to village '{}'",
                    target.village
                )));
            }
        }

        let desired: Vec<ParcelId> = request.all_desired().into_iter().collect();
        let mut parcels: BTreeMap<ParcelId, Parcel> = BTreeMap::new();

        if !desired.is_empty() {
            let found = self
                .parcels
                .find_in_village(&target.village, &desired)
                .await
                .map_err(store_error("load desired parcels"))?;
            parcels.extend(found.into_iter().map(|p| (p.id.clone(), p)));
        }

        let held = self
            .parcels
            .find_held_by(&target.village, target.id)
            .await
            .map_err(store_error("load held parcels"))?;
        parcels.extend(held.into_iter().map(|p| (p.id.clone(), p)));

        let invalid = find_invalid_ids(request, &parcels);
        if !invalid.is_empty() {
            tracing::warn!(?invalid, village = %target.village, "Desired parcels not in village");
            return Err(RegistryError::InvalidParcelIds { ids: invalid });
        }

        tracing::debug!(
            village = %target.village,
            loaded = parcels.len(),
            "Prepared assignment"
        );

        Ok(PreparedAssignment { target, parcels })
    }

    async fn collect_conflicts(
        &self,
        request: &AssignmentRequest,
        prepared: &PreparedAssignment,
    ) -> Result<Vec<AssignmentConflict>, RegistryError> {
        // Names are only needed for reporting, so resolve them for the holders
        // that actually conflict.
        let unnamed = detect(request, &prepared.target, &prepared.parcels, &HashMap::new());
        if unnamed.is_empty() {
            return Ok(unnamed);
        }

        let holders: BTreeSet<Uuid> = unnamed.iter().map(|c| c.current_holder_id).collect();
        let mut names = HashMap::new();
        for holder in holders {
            if let Some(farmer) = self
                .farmers
                .find_by_id(holder)
                .await
                .map_err(store_error("load conflicting holder"))?
            {
                names.insert(holder, farmer.name);
            }
        }

        Ok(detect(request, &prepared.target, &prepared.parcels, &names))
    }

    async fn commit_prepared(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        prepared: PreparedAssignment,
        forced: bool,
    ) -> Result<AssignmentOutcome, RegistryError> {
        let PreparedAssignment { target, parcels } = prepared;

        if request.is_empty() && !holds_any(target.id, &parcels) {
            tracing::debug!("Nothing desired and nothing held");
            return Ok(AssignmentOutcome::NoChange);
        }

        let updates = plan(request, target.id, &parcels);
        tracing::debug!(updates = updates.len(), "Assignment plan");

        let changes = if updates.is_empty() {
            0
        } else {
            match self
                .parcels
                .apply_assignment(&updates)
                .await
                .map_err(store_error("apply assignment"))?
            {
                ApplyOutcome::Applied(n) => n,
                ApplyOutcome::Stale(parcel_ids) => {
                    tracing::warn!(?parcel_ids, "Assignment rolled back, parcels changed");
                    return Err(RegistryError::StaleAssignment { parcel_ids });
                }
            }
        };

        self.audit
            .record(
                LogType::Assignment,
                &actor.audit_id(),
                "Assigned Parcels",
                format!(
                    "Fmr: {}. Own: [{}] Cult: [{}] F:{}",
                    target.name,
                    format_ids(&request.desired_owned),
                    format_ids(&request.desired_cultivated),
                    forced
                ),
            )
            .await;

        tracing::info!(
            farmer_id = %target.id,
            changes,
            forced,
            "Assignment committed"
        );

        Ok(AssignmentOutcome::Committed(AssignmentSummary {
            farmer_id: target.id,
            owned: request.desired_owned.iter().cloned().collect(),
            cultivated: request.desired_cultivated.iter().cloned().collect(),
            forced,
            changes,
        }))
    }

    async fn audit_assignment_failure(
        &self,
        actor: &Actor,
        request: &AssignmentRequest,
        err: &RegistryError,
    ) {
        self.audit
            .record(
                LogType::Assignment,
                &actor.audit_id(),
                "Failed Assignment",
                format!("FmrID: {}. Err: {}", request.farmer_id, err),
            )
            .await;
    }
}
