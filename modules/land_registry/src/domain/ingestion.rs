//! Parcel ingestion: CSV decoding, row validation, reprojection and upsert
//!
//! Rows are processed one at a time and fail independently. Uploads only
//! write geometry; ownership is never touched.

use crate::contract::{
    Actor, BatchResult, LogType, ParcelGeometry, RawParcelRow, RegistryError, RowError,
};
use crate::domain::projection::Reprojector;
use crate::domain::service::Service;
use serde::Deserialize;

/// Columns an upload must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["parcel_id", "area_hectares", "projected_polygon", "village"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One CSV record before numeric and geometry decoding
#[derive(Debug, Deserialize)]
struct CsvParcelRecord {
    parcel_id: String,
    area_hectares: String,
    projected_polygon: String,
    village: String,
}

/// Rows decoded from an upload plus the records that could not be decoded
#[derive(Debug, Default)]
pub struct ParsedUpload {
    /// Decoded rows with their 1-based data row number
    pub rows: Vec<(usize, RawParcelRow)>,
    pub errors: Vec<RowError>,
}

/// `((body))` to `body`, allowing whitespace between the parentheses
fn strip_double_parens(text: &str) -> Option<&str> {
    let open = text.strip_prefix('(')?.trim_start().strip_prefix('(')?;
    open.strip_suffix(')')?.trim_end().strip_suffix(')')
}

/// Parse `POLYGON((X Y, X Y, ...))` into its outer ring
///
/// Inner rings (holes) are ignored. Coordinates may carry a third value,
/// which is dropped.
pub fn parse_wkt_polygon(text: &str) -> Result<Vec<[f64; 2]>, String> {
    let trimmed = text.trim();
    let keyword_len = "POLYGON".len();
    let body = match (trimmed.get(..keyword_len), trimmed.get(keyword_len..)) {
        (Some(keyword), Some(body)) if keyword.eq_ignore_ascii_case("POLYGON") => body.trim(),
        _ => return Err("geometry must be a WKT POLYGON".to_string()),
    };
    let inner = strip_double_parens(body)
        .ok_or_else(|| "POLYGON must be wrapped in double parentheses".to_string())?;

    // Rings hold no nested parentheses, so the outer ring ends at the first ')'
    let outer = inner.split(')').next().unwrap_or(inner).trim();

    outer
        .split(',')
        .enumerate()
        .map(|(i, pair)| {
            let values: Vec<&str> = pair.split_whitespace().collect();
            if !(2..=3).contains(&values.len()) {
                return Err(format!("vertex {} is not an 'X Y' pair: '{}'", i + 1, pair.trim()));
            }
            let x = values[0]
                .parse::<f64>()
                .map_err(|_| format!("vertex {} has invalid X '{}'", i + 1, values[0]))?;
            let y = values[1]
                .parse::<f64>()
                .map_err(|_| format!("vertex {} has invalid Y '{}'", i + 1, values[1]))?;
            Ok([x, y])
        })
        .collect()
}

/// Decode an uploaded CSV document
///
/// Fails as a whole only when the header is unreadable or lacks a required
/// column; every other problem becomes a row error.
pub fn parse_parcel_csv(bytes: &[u8]) -> Result<ParsedUpload, RegistryError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| RegistryError::validation(format!("Unreadable CSV header: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(RegistryError::validation(format!(
            "CSV is missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut parsed = ParsedUpload::default();

    for (idx, record) in reader.deserialize::<CsvParcelRecord>().enumerate() {
        let row_number = idx + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(RowError {
                    id: None,
                    error: format!("Row {}: {}", row_number, e),
                });
                continue;
            }
        };

        let error_id = if record.parcel_id.is_empty() {
            format!("INVALID_ID_ROW_{}", row_number)
        } else {
            record.parcel_id.clone()
        };

        let area = match record.area_hectares.parse::<f64>() {
            Ok(area) => area,
            Err(_) => {
                parsed.errors.push(RowError {
                    id: Some(error_id),
                    error: format!("Invalid area_hectares '{}'", record.area_hectares),
                });
                continue;
            }
        };

        let ring = match parse_wkt_polygon(&record.projected_polygon) {
            Ok(ring) => ring,
            Err(e) => {
                parsed.errors.push(RowError {
                    id: Some(error_id),
                    error: format!("Invalid projected_polygon: {}", e),
                });
                continue;
            }
        };

        parsed.rows.push((
            row_number,
            RawParcelRow {
                id: record.parcel_id,
                village: record.village,
                area,
                ring,
            },
        ));
    }

    Ok(parsed)
}

/// Number of distinct vertices, collapsing consecutive duplicates and not
/// counting a closing vertex equal to the first
pub fn distinct_vertex_count(ring: &[[f64; 2]]) -> usize {
    let mut collapsed: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for vertex in ring {
        if collapsed.last() != Some(vertex) {
            collapsed.push(*vertex);
        }
    }
    if collapsed.len() > 1 && collapsed.first() == collapsed.last() {
        collapsed.pop();
    }
    collapsed.len()
}

/// Per-row checks run before reprojection
pub fn validate_row(row: &RawParcelRow) -> Result<(), String> {
    if row.id.trim().is_empty() {
        return Err("Parcel ID is invalid or empty.".to_string());
    }
    if row.village.trim().is_empty() {
        return Err("Parcel village is invalid or empty.".to_string());
    }
    if !row.area.is_finite() || row.area <= 0.0 {
        return Err("Parcel area is invalid or not a positive number.".to_string());
    }
    if row.ring.len() < 3 {
        return Err("Parcel polygon must have at least 3 vertices.".to_string());
    }
    if row.ring.iter().flatten().any(|v| !v.is_finite()) {
        return Err("Parcel polygon contains non-finite coordinates.".to_string());
    }
    if distinct_vertex_count(&row.ring) < 3 {
        return Err("Parcel polygon must have at least 3 distinct vertices.".to_string());
    }
    Ok(())
}

/// Validate and reproject one row into storable geometry
pub fn prepare_row(
    row: &RawParcelRow,
    reprojector: &dyn Reprojector,
) -> Result<ParcelGeometry, String> {
    validate_row(row)?;
    let coordinates = reprojector
        .ring_to_wgs84(&row.ring)
        .map_err(|e| format!("Reprojection failed: {}", e))?;

    Ok(ParcelGeometry {
        id: row.id.trim().to_string(),
        village: row.village.trim().to_string(),
        area: row.area,
        coordinates,
    })
}

impl Service {
    // ===== Ingestion Operations =====

    /// Validate, reproject and upsert a batch of rows
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn ingest_parcel_batch(
        &self,
        actor: &Actor,
        rows: Vec<RawParcelRow>,
    ) -> Result<BatchResult, RegistryError> {
        ensure_admin(actor)?;
        let numbered = rows.into_iter().enumerate().map(|(i, r)| (i + 1, r)).collect();
        Ok(self.ingest_rows(actor, numbered, Vec::new()).await)
    }

    /// Decode a CSV upload and ingest its rows. Undecodable records are
    /// reported alongside row failures.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn ingest_parcel_csv(
        &self,
        actor: &Actor,
        bytes: &[u8],
    ) -> Result<BatchResult, RegistryError> {
        ensure_admin(actor)?;
        if bytes.len() > self.options.max_upload_bytes {
            return Err(RegistryError::validation(format!(
                "Upload exceeds {} bytes",
                self.options.max_upload_bytes
            )));
        }

        let parsed = parse_parcel_csv(bytes)?;
        Ok(self.ingest_rows(actor, parsed.rows, parsed.errors).await)
    }

    async fn ingest_rows(
        &self,
        actor: &Actor,
        rows: Vec<(usize, RawParcelRow)>,
        mut errors: Vec<RowError>,
    ) -> BatchResult {
        let mut processed_count = 0;

        for (row_number, row) in rows {
            let geometry = match prepare_row(&row, self.reprojector.as_ref()) {
                Ok(geometry) => geometry,
                Err(error) => {
                    let trimmed = row.id.trim();
                    let id = (!trimmed.is_empty()).then(|| trimmed.to_string());
                    tracing::warn!(row = row_number, id = ?id, %error, "Skipping parcel row");
                    errors.push(RowError { id, error });
                    continue;
                }
            };

            match self.parcels.upsert_geometry(&geometry).await {
                Ok(_) => processed_count += 1,
                Err(e) => {
                    tracing::error!(row = row_number, id = %geometry.id, error = %e, "Parcel upsert failed");
                    errors.push(RowError {
                        id: Some(geometry.id),
                        error: "Failed to store parcel".to_string(),
                    });
                }
            }
        }

        let result = BatchResult {
            processed_count,
            errors,
        };
        self.audit_batch(actor, &result).await;

        tracing::info!(
            processed = result.processed_count,
            failed = result.errors.len(),
            "Parcel batch ingested"
        );
        result
    }

    async fn audit_batch(&self, actor: &Actor, result: &BatchResult) {
        if result.attempted() == 0 {
            return;
        }
        let uploader = actor.audit_id();

        match result.errors.first() {
            Some(first) => {
                let summary = format!(
                    "Processed {} of {} parcels. Failed to process {} parcels.",
                    result.processed_count,
                    result.attempted(),
                    result.errors.len()
                );
                let first_id = first.id.as_deref().unwrap_or("null");
                self.audit
                    .record(
                        LogType::ParcelUpload,
                        &uploader,
                        "Batch Process With Errors",
                        format!("{} First error: {} - {}", summary, first_id, first.error),
                    )
                    .await;
            }
            None => {
                self.audit
                    .record(
                        LogType::ParcelUpload,
                        &uploader,
                        "Batch Process Success",
                        format!("Successfully processed {} parcels.", result.processed_count),
                    )
                    .await;
            }
        }
    }
}

fn ensure_admin(actor: &Actor) -> Result<(), RegistryError> {
    match actor {
        Actor::Admin { .. } => Ok(()),
        _ => Err(RegistryError::forbidden("only administrators can upload parcels")),
    }
}
