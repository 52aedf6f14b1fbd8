//! Comparison service tying the engine, coach and report store together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use choreo_coach::{CoachAgent, OpenAiClient};
use choreo_core::{FocusArea, PoseSequence};
use choreo_motion::{ComparisonEngine, ComparisonOutcome};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{report_id, FsReportStore, ReportStore, ReportSummary, StoredReport};

/// Student name used when none is given
pub const DEFAULT_STUDENT: &str = "Student";

/// A report together with the id it was saved under
#[derive(Debug, Clone)]
pub struct SavedReport {
    pub id: String,
    pub report: StoredReport,
}

/// Explicitly constructed service object. Owns one engine, one coach (with
/// its HTTP client) and one store for its whole lifetime.
pub struct ComparisonService {
    config: ServiceConfig,
    engine: ComparisonEngine,
    coach: CoachAgent,
    store: Arc<dyn ReportStore>,
}

impl ComparisonService {
    /// Build from configuration: filesystem store, and a chat backend when
    /// the coach section asks for one
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;

        let coach = if config.coach.wants_backend() {
            let client = OpenAiClient::new(
                config.coach.api_base.clone(),
                config.coach.resolved_api_key(),
            );
            CoachAgent::with_backend(config.coach.agent.clone(), Arc::new(client))
        } else {
            tracing::info!("coach backend disabled, feedback will use fallback text");
            CoachAgent::new(config.coach.agent.clone())
        };
        let store = Arc::new(FsReportStore::new(config.storage.reports_dir.clone()));

        Ok(Self::with_parts(config, ComparisonEngine::new(), coach, store))
    }

    pub fn with_parts(
        config: ServiceConfig,
        engine: ComparisonEngine,
        coach: CoachAgent,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            config,
            engine,
            coach,
            store,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn check_length(&self, sequence: &PoseSequence) -> ServiceResult<()> {
        let limit = self.config.limits.max_frames;
        if sequence.len() > limit {
            return Err(ServiceError::SequenceTooLong {
                frames: sequence.len(),
                limit,
            });
        }
        Ok(())
    }

    /// Relative paths that do not exist as given are looked up in the poses directory
    async fn resolve_pose_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || tokio::fs::try_exists(path).await.unwrap_or(false) {
            path.to_path_buf()
        } else {
            self.config.storage.poses_dir.join(path)
        }
    }

    pub async fn load_sequence(&self, path: &Path) -> ServiceResult<PoseSequence> {
        let resolved = self.resolve_pose_path(path).await;
        let json = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(choreo_core::Error::from)?;
        let sequence = PoseSequence::from_json(&json)?;
        tracing::debug!(
            "loaded {} ({} frames, {} detected)",
            resolved.display(),
            sequence.len(),
            sequence.detected_count()
        );
        Ok(sequence)
    }

    /// Run the engine off the async runtime
    pub async fn compare(
        &self,
        reference: &PoseSequence,
        candidate: &PoseSequence,
        focus_areas: Option<&[FocusArea]>,
    ) -> ServiceResult<ComparisonOutcome> {
        self.check_length(reference)?;
        self.check_length(candidate)?;

        let engine = self.engine.clone();
        let reference = reference.clone();
        let candidate = candidate.clone();
        let focus = focus_areas.map(<[FocusArea]>::to_vec);

        let outcome = tokio::task::spawn_blocking(move || {
            engine.compare(&reference, &candidate, focus.as_deref())
        })
        .await??;

        Ok(outcome)
    }

    /// Compare, add coaching text and persist. A failed outcome is saved
    /// without coaching text.
    pub async fn compare_sequences(
        &self,
        reference: &PoseSequence,
        candidate: &PoseSequence,
        focus_areas: Option<&[FocusArea]>,
        student_name: &str,
    ) -> ServiceResult<SavedReport> {
        let outcome = self.compare(reference, candidate, focus_areas).await?;

        let ai_feedback = match outcome.report() {
            Some(report) => Some(self.coach.generate_feedback(report).await.text),
            None => {
                tracing::warn!(
                    "comparison for {} failed: {}",
                    student_name,
                    outcome.error().unwrap_or_default()
                );
                None
            }
        };

        let student_name = if student_name.trim().is_empty() {
            DEFAULT_STUDENT.to_string()
        } else {
            student_name.to_string()
        };
        let timestamp = Utc::now();
        let id = self.unique_id(report_id(&student_name, &timestamp)).await?;

        let report = StoredReport {
            outcome,
            ai_feedback,
            student_name,
            timestamp,
        };
        self.store.put(&id, &report).await?;

        Ok(SavedReport { id, report })
    }

    /// Load both pose files, then [`Self::compare_sequences`]
    pub async fn compare_files(
        &self,
        reference_path: &Path,
        candidate_path: &Path,
        focus_areas: Option<&[FocusArea]>,
        student_name: &str,
    ) -> ServiceResult<SavedReport> {
        let reference = self.load_sequence(reference_path).await?;
        let candidate = self.load_sequence(candidate_path).await?;
        self.compare_sequences(&reference, &candidate, focus_areas, student_name)
            .await
    }

    /// Two reports for one student within the same second get a numeric suffix
    async fn unique_id(&self, base: String) -> ServiceResult<String> {
        if !self.store.contains(&base).await? {
            return Ok(base);
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.store.contains(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub async fn list_reports(&self) -> ServiceResult<Vec<ReportSummary>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_report(&self, id: &str) -> ServiceResult<StoredReport> {
        Ok(self.store.get(id).await?)
    }

    pub async fn delete_report(&self, id: &str) -> ServiceResult<()> {
        Ok(self.store.delete(id).await?)
    }
}
