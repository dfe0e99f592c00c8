//! Common test utilities: in-memory repositories and the "Valea Mare" fixture
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use land_registry::contract::*;
use land_registry::domain::repository::{
    ApplyOutcome, AuditLogRepository, FarmerRepository, MaintenanceRepository, MayorRepository,
    ParcelRepository, Repositories, SiteSettingsRepository,
};
use land_registry::domain::{
    ParcelUpdate, PasswordHasher, Reprojector, Service, ServiceOptions, Wgs84Passthrough,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

pub const VILLAGE: &str = "Valea Mare";
pub const OTHER_VILLAGE: &str = "Albești";

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

// ===== Actors =====

pub fn admin() -> Actor {
    Actor::Admin {
        id: "root".to_string(),
    }
}

pub fn mayor_of(village: &str) -> Actor {
    Actor::Mayor {
        id: Uuid::new_v4(),
        village: village.to_string(),
    }
}

pub fn farmer_actor(farmer: &Farmer) -> Actor {
    Actor::Farmer { id: farmer.id }
}

// ===== Geometry =====

/// Closed axis-aligned square ring starting at `(lon, lat)`
pub fn square(lon: f64, lat: f64, size: f64) -> Vec<LonLat> {
    vec![
        [lon, lat],
        [lon + size, lat],
        [lon + size, lat + size],
        [lon, lat + size],
        [lon, lat],
    ]
}

// ===== Password hashing =====

/// Reversible stand-in for bcrypt so tests stay fast
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(hash == format!("plain${}", password))
    }
}

// ===== In-memory store =====

/// Every repository over shared in-memory tables
#[derive(Default)]
pub struct InMemoryStore {
    farmers: RwLock<HashMap<Uuid, Farmer>>,
    mayors: RwLock<HashMap<Uuid, Mayor>>,
    parcels: RwLock<BTreeMap<ParcelId, Parcel>>,
    logs: RwLock<Vec<LogEntry>>,
    settings: RwLock<Option<SiteSettings>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            farmers: self.clone(),
            mayors: self.clone(),
            parcels: self.clone(),
            audit_log: self.clone(),
            site_settings: self.clone(),
            maintenance: self.clone(),
        }
    }

    pub fn seed_farmer(&self, name: &str, company_code: &str, village: &str) -> Farmer {
        let now = Utc::now();
        let farmer = Farmer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company_code: company_code.to_string(),
            village: village.to_string(),
            email: None,
            phone: None,
            password_hash: "plain$password1".to_string(),
            color: Some(format!("hsl({}, 70%, 50%)", company_code.len() * 40)),
            created_at: now,
            updated_at: now,
        };
        self.farmers.write().insert(farmer.id, farmer.clone());
        farmer
    }

    pub fn seed_parcel(
        &self,
        id: &str,
        village: &str,
        area: f64,
        owner: Option<Uuid>,
        cultivator: Option<Uuid>,
    ) -> Parcel {
        let now = Utc::now();
        let index = self.parcels.read().len() as f64;
        let parcel = Parcel {
            id: id.to_string(),
            village: village.to_string(),
            area,
            coordinates: square(25.0 + index * 0.01, 45.0, 0.005),
            owner_id: owner,
            cultivator_id: cultivator,
            created_at: now,
            updated_at: now,
        };
        self.parcels.write().insert(parcel.id.clone(), parcel.clone());
        parcel
    }

    pub fn parcel(&self, id: &str) -> Option<Parcel> {
        self.parcels.read().get(id).cloned()
    }

    pub fn parcel_count(&self) -> usize {
        self.parcels.read().len()
    }

    /// Parcel ids owned by `farmer`, sorted
    pub fn owned_by(&self, farmer: Uuid) -> Vec<String> {
        self.parcels
            .read()
            .values()
            .filter(|p| p.owner_id == Some(farmer))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Parcel ids cultivated by `farmer`, sorted
    pub fn cultivated_by(&self, farmer: Uuid) -> Vec<String> {
        self.parcels
            .read()
            .values()
            .filter(|p| p.cultivator_id == Some(farmer))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Overwrite a parcel's owner outside the service, as a concurrent writer would
    pub fn force_owner(&self, parcel_id: &str, owner: Option<Uuid>) {
        if let Some(parcel) = self.parcels.write().get_mut(parcel_id) {
            parcel.owner_id = owner;
        }
    }

    pub fn farmer_count(&self) -> usize {
        self.farmers.read().len()
    }

    pub fn stored_farmer(&self, id: Uuid) -> Option<Farmer> {
        self.farmers.read().get(&id).cloned()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.read().clone()
    }

    pub fn logs_of(&self, log_type: LogType) -> Vec<LogEntry> {
        self.logs
            .read()
            .iter()
            .filter(|l| l.log_type == log_type)
            .cloned()
            .collect()
    }

    pub fn print_parcels(&self, context: &str) {
        println!("\n========== Parcels: {} ==========", context);
        for parcel in self.parcels.read().values() {
            println!(
                "  {} [{}] area={} owner={:?} cultivator={:?}",
                parcel.id, parcel.village, parcel.area, parcel.owner_id, parcel.cultivator_id
            );
        }
        println!("==========================================\n");
    }
}

#[async_trait]
impl FarmerRepository for InMemoryStore {
    async fn create(&self, farmer: &Farmer) -> anyhow::Result<Farmer> {
        self.farmers.write().insert(farmer.id, farmer.clone());
        Ok(farmer.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Farmer>> {
        Ok(self.farmers.read().get(&id).cloned())
    }

    async fn find_by_company_code(&self, company_code: &str) -> anyhow::Result<Option<Farmer>> {
        Ok(self
            .farmers
            .read()
            .values()
            .find(|f| f.company_code == company_code)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Farmer>> {
        Ok(self
            .farmers
            .read()
            .values()
            .find(|f| f.email.as_deref() == Some(email))
            .cloned())
    }

    async fn list(&self, village: Option<&str>) -> anyhow::Result<Vec<Farmer>> {
        let mut farmers: Vec<Farmer> = self
            .farmers
            .read()
            .values()
            .filter(|f| village.map_or(true, |v| f.village == v))
            .cloned()
            .collect();
        farmers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(farmers)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.farmers.read().len() as u64)
    }

    async fn update(&self, farmer: &Farmer) -> anyhow::Result<Farmer> {
        let mut farmers = self.farmers.write();
        if !farmers.contains_key(&farmer.id) {
            anyhow::bail!("farmer {} not found", farmer.id);
        }
        farmers.insert(farmer.id, farmer.clone());
        Ok(farmer.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        let mut parcels = self.parcels.write();
        for parcel in parcels.values_mut() {
            if parcel.owner_id == Some(id) {
                parcel.owner_id = None;
            }
            if parcel.cultivator_id == Some(id) {
                parcel.cultivator_id = None;
            }
        }
        self.farmers.write().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MayorRepository for InMemoryStore {
    async fn create(&self, mayor: &Mayor) -> anyhow::Result<Mayor> {
        self.mayors.write().insert(mayor.id, mayor.clone());
        Ok(mayor.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Mayor>> {
        Ok(self.mayors.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Mayor>> {
        Ok(self
            .mayors
            .read()
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_by_village(&self, village: &str) -> anyhow::Result<Option<Mayor>> {
        Ok(self
            .mayors
            .read()
            .values()
            .find(|m| m.village == village)
            .cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Mayor>> {
        let mut mayors: Vec<Mayor> = self.mayors.read().values().cloned().collect();
        mayors.sort_by(|a, b| a.village.cmp(&b.village).then_with(|| a.name.cmp(&b.name)));
        Ok(mayors)
    }

    async fn update(&self, mayor: &Mayor) -> anyhow::Result<Mayor> {
        self.mayors.write().insert(mayor.id, mayor.clone());
        Ok(mayor.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.mayors.write().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ParcelRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Parcel>> {
        Ok(self.parcels.read().get(id).cloned())
    }

    async fn find_in_village(&self, village: &str, ids: &[ParcelId]) -> anyhow::Result<Vec<Parcel>> {
        Ok(self
            .parcels
            .read()
            .values()
            .filter(|p| p.village == village && ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_held_by(&self, village: &str, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        Ok(self
            .parcels
            .read()
            .values()
            .filter(|p| {
                p.village == village
                    && (p.owner_id == Some(farmer_id) || p.cultivator_id == Some(farmer_id))
            })
            .cloned()
            .collect())
    }

    async fn list(&self, village: Option<&str>) -> anyhow::Result<Vec<Parcel>> {
        Ok(self
            .parcels
            .read()
            .values()
            .filter(|p| village.map_or(true, |v| p.village == v))
            .cloned()
            .collect())
    }

    async fn list_by_owner(&self, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        Ok(self
            .parcels
            .read()
            .values()
            .filter(|p| p.owner_id == Some(farmer_id))
            .cloned()
            .collect())
    }

    async fn list_by_cultivator(&self, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        Ok(self
            .parcels
            .read()
            .values()
            .filter(|p| p.cultivator_id == Some(farmer_id))
            .cloned()
            .collect())
    }

    async fn upsert_geometry(&self, geometry: &ParcelGeometry) -> anyhow::Result<Parcel> {
        let now = Utc::now();
        let mut parcels = self.parcels.write();
        let parcel = parcels
            .entry(geometry.id.clone())
            .and_modify(|p| {
                p.village = geometry.village.clone();
                p.area = geometry.area;
                p.coordinates = geometry.coordinates.clone();
                p.updated_at = now;
            })
            .or_insert_with(|| Parcel {
                id: geometry.id.clone(),
                village: geometry.village.clone(),
                area: geometry.area,
                coordinates: geometry.coordinates.clone(),
                owner_id: None,
                cultivator_id: None,
                created_at: now,
                updated_at: now,
            });
        Ok(parcel.clone())
    }

    async fn apply_assignment(&self, updates: &[ParcelUpdate]) -> anyhow::Result<ApplyOutcome> {
        let mut parcels = self.parcels.write();
        let mut staged = parcels.clone();
        let mut stale: Vec<ParcelId> = Vec::new();
        let now = Utc::now();

        for update in updates {
            let matched = match staged.get_mut(&update.parcel_id) {
                Some(parcel) => {
                    let slot = match update.role {
                        AssignmentRole::Owner => &mut parcel.owner_id,
                        AssignmentRole::Cultivator => &mut parcel.cultivator_id,
                    };
                    if *slot == update.expected {
                        *slot = update.value;
                        parcel.updated_at = now;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };
            if !matched && !stale.contains(&update.parcel_id) {
                stale.push(update.parcel_id.clone());
            }
        }

        if !stale.is_empty() {
            return Ok(ApplyOutcome::Stale(stale));
        }
        *parcels = staged;
        Ok(ApplyOutcome::Applied(updates.len()))
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn append(&self, entry: &LogEntry) -> anyhow::Result<()> {
        self.logs.write().push(entry.clone());
        Ok(())
    }

    async fn list(&self, log_type: Option<LogType>, limit: u64) -> anyhow::Result<Vec<LogEntry>> {
        Ok(self
            .logs
            .read()
            .iter()
            .rev()
            .filter(|l| log_type.map_or(true, |t| l.log_type == t))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        let mut logs = self.logs.write();
        let removed = logs.len() as u64;
        logs.clear();
        Ok(removed)
    }
}

#[async_trait]
impl SiteSettingsRepository for InMemoryStore {
    async fn get(&self) -> anyhow::Result<Option<SiteSettings>> {
        Ok(self.settings.read().clone())
    }

    async fn put(&self, settings: &SiteSettings) -> anyhow::Result<SiteSettings> {
        *self.settings.write() = Some(settings.clone());
        Ok(settings.clone())
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryStore {
    async fn clear_application_data(&self) -> anyhow::Result<()> {
        self.parcels.write().clear();
        self.farmers.write().clear();
        self.mayors.write().clear();
        Ok(())
    }
}

// ===== Failure injection =====

/// Parcel repository that fails selected operations and can simulate a
/// concurrent writer between planning and commit
pub struct FaultyParcelRepo {
    inner: Arc<InMemoryStore>,
    fail_upsert_ids: HashSet<String>,
    fail_apply: bool,
    /// Owner written to a parcel right before the plan is applied
    race_owner: Option<(ParcelId, Uuid)>,
}

impl FaultyParcelRepo {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            fail_upsert_ids: HashSet::new(),
            fail_apply: false,
            race_owner: None,
        }
    }

    pub fn failing_upsert(mut self, id: &str) -> Self {
        self.fail_upsert_ids.insert(id.to_string());
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn racing_owner(mut self, parcel_id: &str, owner: Uuid) -> Self {
        self.race_owner = Some((parcel_id.to_string(), owner));
        self
    }
}

#[async_trait]
impl ParcelRepository for FaultyParcelRepo {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Parcel>> {
        ParcelRepository::find_by_id(&*self.inner, id).await
    }

    async fn find_in_village(&self, village: &str, ids: &[ParcelId]) -> anyhow::Result<Vec<Parcel>> {
        self.inner.find_in_village(village, ids).await
    }

    async fn find_held_by(&self, village: &str, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        self.inner.find_held_by(village, farmer_id).await
    }

    async fn list(&self, village: Option<&str>) -> anyhow::Result<Vec<Parcel>> {
        ParcelRepository::list(&*self.inner, village).await
    }

    async fn list_by_owner(&self, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        self.inner.list_by_owner(farmer_id).await
    }

    async fn list_by_cultivator(&self, farmer_id: Uuid) -> anyhow::Result<Vec<Parcel>> {
        self.inner.list_by_cultivator(farmer_id).await
    }

    async fn upsert_geometry(&self, geometry: &ParcelGeometry) -> anyhow::Result<Parcel> {
        if self.fail_upsert_ids.contains(&geometry.id) {
            anyhow::bail!("disk full while writing {}", geometry.id);
        }
        self.inner.upsert_geometry(geometry).await
    }

    async fn apply_assignment(&self, updates: &[ParcelUpdate]) -> anyhow::Result<ApplyOutcome> {
        if self.fail_apply {
            anyhow::bail!("connection reset during commit");
        }
        if let Some((parcel_id, owner)) = &self.race_owner {
            self.inner.force_owner(parcel_id, Some(*owner));
        }
        self.inner.apply_assignment(updates).await
    }
}

// ===== Fixture =====

/// Service over an in-memory store
pub struct TestRegistry {
    pub service: Arc<Service>,
    pub store: Arc<InMemoryStore>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::with_reprojector(Arc::new(Wgs84Passthrough))
    }

    pub fn with_reprojector(reprojector: Arc<dyn Reprojector>) -> Self {
        let store = InMemoryStore::new();
        Self::build(store.clone(), store.repositories(), reprojector)
    }

    /// Swap the parcel repository, keeping the rest on `store`
    pub fn with_parcels(store: Arc<InMemoryStore>, parcels: Arc<dyn ParcelRepository>) -> Self {
        let mut repos = store.repositories();
        repos.parcels = parcels;
        Self::build(store, repos, Arc::new(Wgs84Passthrough))
    }

    fn build(
        store: Arc<InMemoryStore>,
        repos: Repositories,
        reprojector: Arc<dyn Reprojector>,
    ) -> Self {
        let service = Arc::new(Service::new(
            repos,
            Arc::new(PlainHasher),
            reprojector,
            ServiceOptions::default(),
        ));
        Self { service, store }
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Farmers and parcels of "Valea Mare"
///
/// - Ion Popescu owns A1, A2 and cultivates A2
/// - Maria Ionescu owns and cultivates B1, cultivates C1
/// - C1 is unowned, A3 and A4 are free
/// - Z1 belongs to the neighbouring village
pub struct ValeaMare {
    pub ion: Farmer,
    pub maria: Farmer,
    pub neighbour: Farmer,
}

impl ValeaMare {
    pub fn seed(store: &InMemoryStore) -> Self {
        let ion = store.seed_farmer("Ion Popescu", "RO1001", VILLAGE);
        let maria = store.seed_farmer("Maria Ionescu", "RO1002", VILLAGE);
        let neighbour = store.seed_farmer("Vasile Marin", "RO2001", OTHER_VILLAGE);

        store.seed_parcel("A1", VILLAGE, 1.5, Some(ion.id), None);
        store.seed_parcel("A2", VILLAGE, 2.0, Some(ion.id), Some(ion.id));
        store.seed_parcel("A3", VILLAGE, 0.8, None, None);
        store.seed_parcel("A4", VILLAGE, 12.0, None, None);
        store.seed_parcel("B1", VILLAGE, 3.2, Some(maria.id), Some(maria.id));
        store.seed_parcel("C1", VILLAGE, 6.0, None, Some(maria.id));
        store.seed_parcel("Z1", OTHER_VILLAGE, 4.4, Some(neighbour.id), None);

        Self {
            ion,
            maria,
            neighbour,
        }
    }

    pub fn print_structure(&self) {
        println!("\n📊 Valea Mare fixture:");
        println!("   Ion Popescu: {} (owns A1, A2; cultivates A2)", self.ion.id);
        println!("   Maria Ionescu: {} (owns B1; cultivates B1, C1)", self.maria.id);
        println!("   Vasile Marin ({}): {} (owns Z1)", OTHER_VILLAGE, self.neighbour.id);
    }
}
