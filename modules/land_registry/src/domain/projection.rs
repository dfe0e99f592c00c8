//! Coordinate reprojection seam used by the ingestion pipeline

use crate::contract::LonLat;

/// Reprojection failure for a single vertex
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot reproject ({x}, {y}): {reason}")]
pub struct ProjectionError {
    pub x: f64,
    pub y: f64,
    pub reason: String,
}

/// Converts projected `(X, Y)` metres to WGS84 `[lon, lat]` degrees
pub trait Reprojector: Send + Sync {
    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;

    fn to_wgs84(&self, x: f64, y: f64) -> Result<LonLat, ProjectionError>;

    /// Reproject a whole ring; the first failing vertex aborts
    fn ring_to_wgs84(&self, ring: &[[f64; 2]]) -> Result<Vec<LonLat>, ProjectionError> {
        ring.iter().map(|[x, y]| self.to_wgs84(*x, *y)).collect()
    }
}

/// Input already in WGS84: `X` is longitude, `Y` is latitude
pub struct Wgs84Passthrough;

impl Reprojector for Wgs84Passthrough {
    fn name(&self) -> &'static str {
        "wgs84"
    }

    fn to_wgs84(&self, x: f64, y: f64) -> Result<LonLat, ProjectionError> {
        if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
            return Err(ProjectionError {
                x,
                y,
                reason: "outside WGS84 range".to_string(),
            });
        }
        Ok([x, y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_keeps_coordinates() {
        let ring = [[25.1, 45.2], [25.2, 45.2], [25.2, 45.3]];
        let projected = Wgs84Passthrough.ring_to_wgs84(&ring);
        assert_eq!(projected, Ok(ring.to_vec()));
    }

    #[test]
    fn test_passthrough_rejects_out_of_range() {
        let err = Wgs84Passthrough.to_wgs84(500_000.0, 45.0).unwrap_err();
        assert_eq!(err.x, 500_000.0);
        assert!(err.to_string().contains("outside WGS84 range"));
    }
}
