//! Map geometry: level of detail, viewport culling, simplification and styling
//!
//! All functions here are pure and never mutate the parcels they are given.

use crate::contract::{
    Bounds, ColorMode, EdgeDimension, LonLat, Parcel, ParcelId, ParcelStyle, RenderedParcel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Fill for parcels without an owner color
pub const UNASSIGNED_COLOR: &str = "hsl(0, 0%, 70%)";
/// Selection outline and fallback fill for a highlighted farmer
pub const HIGHLIGHT_COLOR: &str = "hsl(var(--accent))";
/// Fill for parcels not owned by the highlighted farmer
pub const MUTED_COLOR: &str = "hsl(0, 0%, 85%)";

/// Palette handed out to new farmers that do not pick a color
pub const DEFAULT_FARMER_COLORS: [&str; 8] = [
    "hsl(217, 91%, 60%)",
    "hsl(122, 39%, 49%)",
    "hsl(40, 90%, 60%)",
    "hsl(0, 70%, 65%)",
    "hsl(260, 60%, 60%)",
    "hsl(180, 50%, 50%)",
    "hsl(30, 90%, 55%)",
    "hsl(320, 70%, 60%)",
];

const EARTH_RADIUS_M: f64 = 6_371e3;

/// Palette entry for the next farmer, cycling by the current farmer count
pub fn default_farmer_color(existing_farmers: u64) -> &'static str {
    let idx = (existing_farmers % DEFAULT_FARMER_COLORS.len() as u64) as usize;
    DEFAULT_FARMER_COLORS[idx]
}

/// Zoom thresholds and simplification tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LodConfig {
    /// Below this zoom no individual parcel is drawn
    #[serde(default = "default_hide_zoom")]
    pub hide_individual_zoom: f64,

    /// From this zoom up to `full_detail_zoom` rings are simplified
    #[serde(default = "default_simplify_zoom")]
    pub simplify_start_zoom: f64,

    #[serde(default = "default_full_detail_zoom")]
    pub full_detail_zoom: f64,

    /// Tolerance in degrees for the lower half of the simplification band
    #[serde(default = "default_coarse_tolerance")]
    pub coarse_tolerance: f64,

    /// Tolerance in degrees for the upper half of the simplification band
    #[serde(default = "default_fine_tolerance")]
    pub fine_tolerance: f64,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            hide_individual_zoom: default_hide_zoom(),
            simplify_start_zoom: default_simplify_zoom(),
            full_detail_zoom: default_full_detail_zoom(),
            coarse_tolerance: default_coarse_tolerance(),
            fine_tolerance: default_fine_tolerance(),
        }
    }
}

fn default_hide_zoom() -> f64 {
    11.0
}

fn default_simplify_zoom() -> f64 {
    13.0
}

fn default_full_detail_zoom() -> f64 {
    15.0
}

fn default_coarse_tolerance() -> f64 {
    0.0005
}

fn default_fine_tolerance() -> f64 {
    0.0001
}

/// How rings are drawn at one zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailLevel {
    Hidden,
    Full,
    Simplified { tolerance: f64 },
}

impl LodConfig {
    pub fn detail_for(&self, zoom: f64) -> DetailLevel {
        if zoom < self.hide_individual_zoom {
            DetailLevel::Hidden
        } else if zoom >= self.simplify_start_zoom && zoom < self.full_detail_zoom {
            let midpoint = (self.simplify_start_zoom + self.full_detail_zoom) / 2.0;
            let tolerance = if zoom < midpoint {
                self.coarse_tolerance
            } else {
                self.fine_tolerance
            };
            DetailLevel::Simplified { tolerance }
        } else {
            DetailLevel::Full
        }
    }

    /// Thresholds must be ordered and tolerances positive
    pub fn validate(&self) -> Result<(), String> {
        if !(self.hide_individual_zoom <= self.simplify_start_zoom
            && self.simplify_start_zoom <= self.full_detail_zoom)
        {
            return Err("lod zoom thresholds must be non-decreasing".to_string());
        }
        if !(self.coarse_tolerance > 0.0 && self.fine_tolerance > 0.0) {
            return Err("lod tolerances must be positive".to_string());
        }
        Ok(())
    }
}

/// Colors and selection used to style rendered parcels
#[derive(Debug, Clone, Default)]
pub struct StylePolicy {
    /// Owner id to display color, for owners that have one
    pub owner_colors: HashMap<Uuid, String>,
    pub mode: ColorMode,
    pub selected: Option<ParcelId>,
}

impl StylePolicy {
    fn owner_color(&self, parcel: &Parcel) -> Option<&str> {
        parcel
            .owner_id
            .and_then(|owner| self.owner_colors.get(&owner))
            .map(String::as_str)
    }

    /// Fill color for one parcel under the active mode
    pub fn parcel_fill(&self, parcel: &Parcel) -> String {
        match &self.mode {
            ColorMode::Highlight(farmer_id) => {
                if parcel.owner_id == Some(*farmer_id) {
                    self.owner_color(parcel).unwrap_or(HIGHLIGHT_COLOR).to_string()
                } else {
                    MUTED_COLOR.to_string()
                }
            }
            ColorMode::ShowAllFarmers | ColorMode::Default => self
                .owner_color(parcel)
                .unwrap_or(UNASSIGNED_COLOR)
                .to_string(),
        }
    }

    pub fn style_for(&self, parcel: &Parcel) -> ParcelStyle {
        let fill_color = self.parcel_fill(parcel);
        let selected = self.selected.as_deref() == Some(parcel.id.as_str());
        let highlighted = matches!(self.mode, ColorMode::Highlight(id) if parcel.owner_id == Some(id));

        let fill_opacity = match (highlighted, selected) {
            (true, true) => 0.7,
            (true, false) => 0.5,
            (false, true) => 0.6,
            (false, false) => 0.4,
        };

        ParcelStyle {
            outline_color: if selected {
                HIGHLIGHT_COLOR.to_string()
            } else {
                fill_color.clone()
            },
            weight: if selected { 3 } else { 2 },
            fill_color,
            fill_opacity,
        }
    }
}

/// Bounding box of a ring, `None` when empty
pub fn ring_bounds(ring: &[LonLat]) -> Option<Bounds> {
    let (first, rest) = ring.split_first()?;
    let start = Bounds::new(first[0], first[1], first[0], first[1]);
    Some(rest.iter().fold(start, |acc, [lon, lat]| {
        acc.extend(&Bounds::new(*lon, *lat, *lon, *lat))
    }))
}

/// Bounding box of all renderable parcels, used to fit the initial map view
pub fn bounds_of(parcels: &[Parcel]) -> Option<Bounds> {
    parcels
        .iter()
        .filter(|p| p.coordinates.len() >= 3)
        .filter_map(|p| ring_bounds(&p.coordinates))
        .reduce(|acc, b| acc.extend(&b))
}

/// Parcels visible in `viewport` at `zoom`, with rings prepared for display
pub fn render_parcels(
    parcels: &[Parcel],
    viewport: &Bounds,
    zoom: f64,
    lod: &LodConfig,
    style: &StylePolicy,
) -> Vec<RenderedParcel> {
    let level = lod.detail_for(zoom);
    if level == DetailLevel::Hidden {
        return Vec::new();
    }

    parcels
        .iter()
        .filter(|p| p.coordinates.len() >= 3)
        .filter(|p| ring_bounds(&p.coordinates).is_some_and(|b| b.intersects(viewport)))
        .map(|parcel| {
            let (ring, simplified) = match level {
                DetailLevel::Simplified { tolerance } => {
                    simplify_ring_or_original(&parcel.coordinates, tolerance)
                }
                _ => (parcel.coordinates.clone(), false),
            };
            RenderedParcel {
                parcel_id: parcel.id.clone(),
                ring,
                simplified,
                style: style.style_for(parcel),
            }
        })
        .collect()
}

/// Simplified ring, or the original when simplification would degenerate it
fn simplify_ring_or_original(ring: &[LonLat], tolerance: f64) -> (Vec<LonLat>, bool) {
    if ring.len() < 4 {
        return (ring.to_vec(), false);
    }
    let simplified = simplify_ring(ring, tolerance);
    if simplified.len() < 4 {
        (ring.to_vec(), false)
    } else {
        (simplified, true)
    }
}

/// Radial-distance pre-pass followed by Douglas-Peucker
///
/// Both passes keep the first and last vertex, so a closed ring stays closed.
pub fn simplify_ring(points: &[LonLat], tolerance: f64) -> Vec<LonLat> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let sq_tolerance = tolerance * tolerance;
    let radial = simplify_radial_distance(points, sq_tolerance);
    simplify_douglas_peucker(&radial, sq_tolerance)
}

fn sq_distance(a: &LonLat, b: &LonLat) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `a`-`b`
fn sq_segment_distance(p: &LonLat, a: &LonLat, b: &LonLat) -> f64 {
    let [mut x, mut y] = *a;
    let dx = b[0] - x;
    let dy = b[1] - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p[0] - x) * dx + (p[1] - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b[0];
            y = b[1];
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    sq_distance(p, &[x, y])
}

fn simplify_radial_distance(points: &[LonLat], sq_tolerance: f64) -> Vec<LonLat> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut prev = *first;
    let mut out = vec![prev];

    for point in rest {
        if sq_distance(point, &prev) > sq_tolerance {
            out.push(*point);
            prev = *point;
        }
    }

    if let Some(last) = points.last() {
        if prev != *last {
            out.push(*last);
        }
    }
    out
}

fn simplify_douglas_peucker(points: &[LonLat], sq_tolerance: f64) -> Vec<LonLat> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut out = vec![points[0]];
    douglas_peucker_step(points, 0, last, sq_tolerance, &mut out);
    out.push(points[last]);
    out
}

fn douglas_peucker_step(
    points: &[LonLat],
    first: usize,
    last: usize,
    sq_tolerance: f64,
    out: &mut Vec<LonLat>,
) {
    let mut max_sq = sq_tolerance;
    let mut index = first;

    for i in first + 1..last {
        let sq = sq_segment_distance(&points[i], &points[first], &points[last]);
        if sq > max_sq {
            index = i;
            max_sq = sq;
        }
    }

    if max_sq > sq_tolerance {
        if index - first > 1 {
            douglas_peucker_step(points, first, index, sq_tolerance, out);
        }
        out.push(points[index]);
        if last - index > 1 {
            douglas_peucker_step(points, index, last, sq_tolerance, out);
        }
    }
}

/// Great-circle distance in metres
pub fn haversine_m(a: &LonLat, b: &LonLat) -> f64 {
    let phi1 = a[1].to_radians();
    let phi2 = b[1].to_radians();
    let d_phi = (b[1] - a[1]).to_radians();
    let d_lambda = (b[0] - a[0]).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Length label for every consecutive vertex pair of the ring
pub fn edge_dimensions(ring: &[LonLat]) -> Vec<EdgeDimension> {
    ring.windows(2)
        .enumerate()
        .map(|(i, pair)| EdgeDimension {
            segment_index: i + 1,
            midpoint: [(pair[0][0] + pair[1][0]) / 2.0, (pair[0][1] + pair[1][1]) / 2.0],
            length_m: haversine_m(&pair[0], &pair[1]).round(),
        })
        .collect()
}
