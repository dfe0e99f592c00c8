//! Dashboard statistics over parcels and farmers

use crate::contract::{Actor, Farmer, FarmerAreaStats, Parcel, RegistryError, SizeBucket, VillageStats};
use crate::domain::service::{store_error, Service};
use std::collections::{BTreeMap, HashMap};

/// Upper bounds (inclusive, hectares) and labels of the size buckets
const SIZE_BUCKETS: [(f64, &str); 4] = [
    (1.0, "0-1 ha"),
    (5.0, "1-5 ha"),
    (10.0, "5-10 ha"),
    (20.0, "10-20 ha"),
];
const LARGEST_BUCKET: &str = "20+ ha";

/// Per-village totals, sorted by village
pub fn village_totals(parcels: &[Parcel], farmers: &[Farmer]) -> Vec<VillageStats> {
    let mut by_village: BTreeMap<&str, VillageStats> = BTreeMap::new();

    for parcel in parcels {
        let entry = by_village
            .entry(parcel.village.as_str())
            .or_insert_with(|| empty_village(&parcel.village));
        entry.parcel_count += 1;
        entry.total_area += parcel.area;
    }

    for farmer in farmers {
        by_village
            .entry(farmer.village.as_str())
            .or_insert_with(|| empty_village(&farmer.village))
            .farmer_count += 1;
    }

    by_village.into_values().collect()
}

fn empty_village(village: &str) -> VillageStats {
    VillageStats {
        village: village.to_string(),
        parcel_count: 0,
        total_area: 0.0,
        farmer_count: 0,
    }
}

/// Owned and cultivated area per farmer, largest owned area first
pub fn farmer_areas(parcels: &[Parcel], farmers: &[Farmer]) -> Vec<FarmerAreaStats> {
    let mut owned: HashMap<_, f64> = HashMap::new();
    let mut cultivated: HashMap<_, f64> = HashMap::new();

    for parcel in parcels {
        if let Some(owner) = parcel.owner_id {
            *owned.entry(owner).or_default() += parcel.area;
        }
        if let Some(cultivator) = parcel.cultivator_id {
            *cultivated.entry(cultivator).or_default() += parcel.area;
        }
    }

    let mut stats: Vec<FarmerAreaStats> = farmers
        .iter()
        .map(|f| FarmerAreaStats {
            farmer_id: f.id,
            farmer_name: f.name.clone(),
            owned_area: owned.get(&f.id).copied().unwrap_or(0.0),
            cultivated_area: cultivated.get(&f.id).copied().unwrap_or(0.0),
        })
        .collect();

    stats.sort_by(|a, b| {
        b.owned_area
            .total_cmp(&a.owned_area)
            .then_with(|| a.farmer_name.cmp(&b.farmer_name))
    });
    stats
}

/// Parcel counts per area range; every bucket is present even when empty
pub fn size_distribution(parcels: &[Parcel]) -> Vec<SizeBucket> {
    let mut counts = [0usize; SIZE_BUCKETS.len() + 1];

    for parcel in parcels {
        let idx = SIZE_BUCKETS
            .iter()
            .position(|(upper, _)| parcel.area <= *upper)
            .unwrap_or(SIZE_BUCKETS.len());
        counts[idx] += 1;
    }

    SIZE_BUCKETS
        .iter()
        .map(|(_, label)| *label)
        .chain(std::iter::once(LARGEST_BUCKET))
        .zip(counts)
        .map(|(range, count)| SizeBucket {
            range: range.to_string(),
            count,
        })
        .collect()
}

impl Service {
    // ===== Statistics =====

    /// Totals for every village. Administrators only.
    pub async fn village_stats(&self, actor: &Actor) -> Result<Vec<VillageStats>, RegistryError> {
        if !matches!(actor, Actor::Admin { .. }) {
            return Err(RegistryError::forbidden("village statistics are admin only"));
        }
        let parcels = self
            .parcels
            .list(None)
            .await
            .map_err(store_error("list parcels"))?;
        let farmers = self
            .farmers
            .list(None)
            .await
            .map_err(store_error("list farmers"))?;
        Ok(village_totals(&parcels, &farmers))
    }

    pub async fn farmer_area_stats(
        &self,
        actor: &Actor,
        village: &str,
    ) -> Result<Vec<FarmerAreaStats>, RegistryError> {
        self.ensure_village_access(actor, village).await?;
        let parcels = self
            .parcels
            .list(Some(village))
            .await
            .map_err(store_error("list parcels"))?;
        let farmers = self
            .farmers
            .list(Some(village))
            .await
            .map_err(store_error("list farmers"))?;
        Ok(farmer_areas(&parcels, &farmers))
    }

    pub async fn parcel_size_distribution(
        &self,
        actor: &Actor,
        village: &str,
    ) -> Result<Vec<SizeBucket>, RegistryError> {
        self.ensure_village_access(actor, village).await?;
        let parcels = self
            .parcels
            .list(Some(village))
            .await
            .map_err(store_error("list parcels"))?;
        Ok(size_distribution(&parcels))
    }
}
