//! Audit trail for registry mutations
//!
//! Every mutation appends one entry to the audit log repository:
//! - ASSIGNMENT: parcel owner/cultivator reconciliation
//! - PARCEL_UPLOAD: one entry per ingested batch
//! - USER_ACTION: account and settings changes
//! - SYSTEM: bulk administrative operations
//!
//! Writes are best effort: a failed append is logged and never replaces the
//! result of the operation being audited.

use crate::contract::{LogEntry, LogType};
use crate::domain::repository::AuditLogRepository;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditTrail {
    log: Arc<dyn AuditLogRepository>,
}

impl AuditTrail {
    pub fn new(log: Arc<dyn AuditLogRepository>) -> Self {
        Self { log }
    }

    /// Append an entry, logging instead of failing when the store rejects it
    pub async fn record(
        &self,
        log_type: LogType,
        actor: &str,
        action: &str,
        details: impl Into<String>,
    ) {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            log_type,
            actor: actor.to_string(),
            action: action.to_string(),
            details: details.into(),
            timestamp: Utc::now(),
        };

        if let Err(err) = self.log.append(&entry).await {
            tracing::warn!(
                log_type = log_type.as_str(),
                action,
                error = %err,
                "Failed to write audit entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct RecordingLog {
        entries: Mutex<Vec<LogEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl AuditLogRepository for RecordingLog {
        async fn append(&self, entry: &LogEntry) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("audit store offline");
            }
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        async fn list(&self, _log_type: Option<LogType>, _limit: u64) -> anyhow::Result<Vec<LogEntry>> {
            Ok(self.entries.lock().clone())
        }

        async fn clear(&self) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_record_appends_entry() {
        let log = Arc::new(RecordingLog {
            entries: Mutex::new(Vec::new()),
            fail: false,
        });
        let trail = AuditTrail::new(log.clone());

        trail
            .record(LogType::ParcelUpload, "admin:root", "Batch Process Success", "ok")
            .await;

        let entries = log.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].log_type, LogType::ParcelUpload);
        assert_eq!(entries[0].actor, "admin:root");
        assert_eq!(entries[0].details, "ok");
    }

    #[tokio::test]
    async fn test_record_swallows_store_failure() {
        let log = Arc::new(RecordingLog {
            entries: Mutex::new(Vec::new()),
            fail: true,
        });
        let trail = AuditTrail::new(log.clone());

        // Should not panic or propagate
        trail
            .record(LogType::System, "admin:root", "Cleared Logs", "")
            .await;

        assert!(log.entries.lock().is_empty());
    }
}
