//! Report persistence.
//!
//! Reports are addressed by id (`report_{student}_{YYYYMMDD_HHMMSS}`). The
//! filesystem store keeps one pretty-printed JSON document per report; the
//! memory store backs tests and embedded use.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use choreo_core::{Error, Result};
use choreo_motion::ComparisonOutcome;

/// Persisted comparison: the outcome plus coaching text and attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(flatten)]
    pub outcome: ComparisonOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
    pub student_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredReport {
    pub fn summary(&self, id: &str) -> ReportSummary {
        ReportSummary {
            id: id.to_string(),
            student_name: self.student_name.clone(),
            timestamp: self.timestamp,
            overall_similarity: self.outcome.overall_similarity(),
        }
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub student_name: String,
    pub timestamp: DateTime<Utc>,
    pub overall_similarity: f64,
}

/// Id for a report taken at `timestamp`. Characters outside
/// `[A-Za-z0-9_-]` in the student name become `_`.
pub fn report_id(student_name: &str, timestamp: &DateTime<Utc>) -> String {
    let student: String = student_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let student = if student.is_empty() { "Student".to_string() } else { student };

    format!("report_{}_{}", student, timestamp.format("%Y%m%d_%H%M%S"))
}

fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid report id: {id:?}")))
    }
}

fn newest_first(summaries: &mut [ReportSummary]) {
    summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Report storage keyed by id
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert or replace
    async fn put(&self, id: &str, report: &StoredReport) -> Result<()>;

    async fn get(&self, id: &str) -> Result<StoredReport>;

    /// Summaries, newest first
    async fn list(&self) -> Result<Vec<ReportSummary>>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn contains(&self, id: &str) -> Result<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(Error::ReportNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// One `{id}.json` file per report in a directory
pub struct FsReportStore {
    dir: PathBuf,
}

impl FsReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn not_found(id: &str, err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::ReportNotFound(id.to_string())
        } else {
            Error::from(err)
        }
    }
}

#[async_trait]
impl ReportStore for FsReportStore {
    async fn put(&self, id: &str, report: &StoredReport) -> Result<()> {
        let path = self.path_for(id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_string_pretty(report)?).await?;
        tracing::info!("saved report {} to {}", id, path.display());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<StoredReport> {
        let path = self.path_for(id)?;
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Self::not_found(id, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn list(&self) -> Result<Vec<ReportSummary>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
            else {
                continue;
            };

            let parsed = match tokio::fs::read_to_string(&path).await {
                Ok(json) => serde_json::from_str::<StoredReport>(&json).map_err(Error::from),
                Err(e) => Err(Error::from(e)),
            };
            match parsed {
                Ok(report) => summaries.push(report.summary(&id)),
                Err(e) => tracing::warn!("skipping unreadable report {}: {}", path.display(), e),
            }
        }

        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Self::not_found(id, e))?;
        tracing::info!("deleted report {}", id);
        Ok(())
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<String, StoredReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn put(&self, id: &str, report: &StoredReport) -> Result<()> {
        validate_id(id)?;
        let mut reports = self.reports.write().await;
        reports.insert(id.to_string(), report.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<StoredReport> {
        let reports = self.reports.read().await;
        reports
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ReportNotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<ReportSummary>> {
        let reports = self.reports.read().await;
        let mut summaries: Vec<_> = reports.iter().map(|(id, r)| r.summary(id)).collect();
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut reports = self.reports.write().await;
        reports
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::ReportNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored(student: &str, hour: u32, overall: f64) -> StoredReport {
        StoredReport {
            outcome: ComparisonOutcome::failed("no poses"),
            ai_feedback: Some(format!("Overall Performance: {overall:.1}%")),
            student_name: student.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, hour, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_report_id_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(report_id("Ana", &ts), "report_Ana_20260301_090507");
        assert_eq!(report_id("../evil name", &ts), "report____evil_name_20260301_090507");
        assert_eq!(report_id("  ", &ts), "report_Student_20260301_090507");
    }

    #[test]
    fn test_stored_report_flattens_outcome() {
        let report = stored("Ana", 9, 0.0);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["error"], "no poses");
        assert_eq!(value["overall_similarity"], 0.0);
        assert_eq!(value["student_name"], "Ana");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2026-03-01T09:30:00"));

        let back: StoredReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[tokio::test]
    async fn test_fs_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsReportStore::new(dir.path().join("reports"));

        assert!(store.list().await.unwrap().is_empty());

        store.put("report_a", &stored("Ana", 9, 0.0)).await.unwrap();
        store.put("report_b", &stored("Ben", 11, 0.0)).await.unwrap();
        tokio::fs::write(dir.path().join("reports/broken.json"), "{not json")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("reports/notes.txt"), "ignored")
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["report_b", "report_a"]);
        assert_eq!(listed[0].student_name, "Ben");

        assert_eq!(store.get("report_a").await.unwrap().student_name, "Ana");
        assert!(store.contains("report_a").await.unwrap());

        store.delete("report_a").await.unwrap();
        assert!(matches!(store.get("report_a").await, Err(Error::ReportNotFound(_))));
        assert!(matches!(store.delete("report_a").await, Err(Error::ReportNotFound(_))));
        assert!(!store.contains("report_a").await.unwrap());
    }

    #[tokio::test]
    async fn test_fs_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsReportStore::new(dir.path());
        assert!(matches!(store.get("../etc/passwd").await, Err(Error::InvalidInput(_))));
        assert!(store.put("a/b", &stored("Ana", 9, 0.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryReportStore::new();
        store.put("report_x", &stored("Ana", 8, 0.0)).await.unwrap();
        store.put("report_y", &stored("Ana", 10, 0.0)).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, "report_y");

        store.delete("report_y").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(store.get("report_y").await.is_err());
    }
}
