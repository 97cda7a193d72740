use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::domain::{
    Designation, FormStatus, InvalidRecordKey, MarkAuthority, PartLetter, RecordKey,
};
use super::gate::{FormLocked, LockGate, StatusView};
use super::scoring::{
    score_academic, AcademicOutcome, AcademicScores, ExtraContribution, ExtraScore,
    InteractionEvaluation, MarkError, PortfolioForm, PortfolioScore, SectionTotal,
    VerificationSheet,
};
use crate::backend::{AppraisalBackend, BackendError};
use crate::roles::Role;
use crate::session::{SessionContext, SessionError};

/// Part A as submitted by the faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicSubmission {
    pub designation: Designation,
    #[serde(default)]
    pub scores: AcademicScores,
}

/// Stored payload for one part plus the lock state the caller should honour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartView {
    pub key: RecordKey,
    pub part: PartLetter,
    pub title: &'static str,
    pub status: StatusView,
    pub is_first_time: bool,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReceipt<S> {
    pub key: RecordKey,
    pub part: PartLetter,
    /// True when this save created the part rather than updating it.
    pub created: bool,
    pub score: S,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReceipt {
    pub key: RecordKey,
    pub payload: BTreeMap<&'static str, u32>,
    pub sections: Vec<SectionTotal>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionTotal {
    pub total: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CompletionProgress {
    pub academic: f64,
    pub portfolio: f64,
    pub extra: f64,
}

/// Per-part scores of one record, as the director's verification view shows them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub key: RecordKey,
    pub status: StatusView,
    pub academic: Option<AcademicOutcome>,
    pub research: Vec<SectionTotal>,
    pub portfolio: Option<PortfolioScore>,
    pub extra: Option<ExtraScore>,
    pub progress: CompletionProgress,
}

/// Applies ownership, lock and scoring rules before anything reaches the backend.
pub struct AppraisalService<B> {
    backend: Arc<B>,
    gate: LockGate,
}

impl<B> AppraisalService<B>
where
    B: AppraisalBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            gate: LockGate,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn status(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<StatusView, AppraisalServiceError> {
        let status = self.fetch_status(session, key).await?;
        Ok(self.gate.view(status, MarkAuthority::SelfAssessment))
    }

    pub async fn load_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
    ) -> Result<PartView, AppraisalServiceError> {
        let status = self.fetch_status(session, key).await?;
        let stored = self.fetch_part(session, key, part).await?;

        Ok(PartView {
            key: key.clone(),
            part,
            title: part.title(),
            status: self.gate.view(status, part.primary_authority()),
            is_first_time: stored.is_none(),
            data: stored.unwrap_or(Value::Null),
        })
    }

    pub async fn save_academic(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        submission: AcademicSubmission,
    ) -> Result<SaveReceipt<AcademicOutcome>, AppraisalServiceError> {
        self.authorize(session, MarkAuthority::SelfAssessment)?;
        self.ensure_editable(session, key, PartLetter::A, MarkAuthority::SelfAssessment)
            .await?;

        let is_first_time = self.fetch_part(session, key, PartLetter::A).await?.is_none();
        let outcome = score_academic(&submission.scores, &submission.designation);
        if !outcome.designation_recognized {
            warn!(
                record = %key,
                designation = %outcome.designation,
                "designation has no weighting; applying fallback"
            );
        }

        let mut record = serde_json::to_value(submission.scores.sanitized())
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if let Value::Object(fields) = &mut record {
            fields.insert("designation".to_string(), json!(outcome.designation));
            fields.insert("marks".to_string(), json!(outcome.final_score));
        }

        self.write_part(session, key, PartLetter::A, record, is_first_time)
            .await?;
        Ok(self.receipt(key, PartLetter::A, is_first_time, outcome))
    }

    /// Saves the faculty-owned Part D fields. Superior marks already on the
    /// record are carried over untouched.
    pub async fn save_portfolio(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        form: PortfolioForm,
    ) -> Result<SaveReceipt<PortfolioScore>, AppraisalServiceError> {
        self.authorize(session, MarkAuthority::SelfAssessment)?;
        self.ensure_editable(session, key, PartLetter::D, MarkAuthority::SelfAssessment)
            .await?;

        let stored = self.fetch_part(session, key, PartLetter::D).await?;
        let is_first_time = stored.is_none();
        let mut form = match stored {
            Some(value) => {
                let stored: PortfolioForm = decode(PartLetter::D, value)?;
                form.with_superior_marks_from(&stored)
            }
            None => form.without_superior_marks(),
        }
        .sanitized();

        let score = form.score();
        form.marks = Some(score.total);
        let record = serde_json::to_value(&form).map_err(|e| BackendError::Decode(e.to_string()))?;

        self.write_part(session, key, PartLetter::D, record, is_first_time)
            .await?;
        Ok(self.receipt(key, PartLetter::D, is_first_time, score))
    }

    pub async fn save_extra(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        contribution: ExtraContribution,
    ) -> Result<SaveReceipt<ExtraScore>, AppraisalServiceError> {
        self.authorize(session, MarkAuthority::SelfAssessment)?;
        self.ensure_editable(session, key, PartLetter::E, MarkAuthority::SelfAssessment)
            .await?;

        let is_first_time = self.fetch_part(session, key, PartLetter::E).await?.is_none();
        let contribution = contribution.sanitized();
        let record = json!({
            "total_marks": contribution.total_marks,
            "bullet_points": contribution.bullet_points,
        });

        self.write_part(session, key, PartLetter::E, record, is_first_time)
            .await?;
        Ok(self.receipt(key, PartLetter::E, is_first_time, contribution.score()))
    }

    /// Records verified counts for Part B and posts the full category mapping.
    pub async fn submit_verification(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        verified: BTreeMap<String, Value>,
    ) -> Result<VerificationReceipt, AppraisalServiceError> {
        self.authorize(session, MarkAuthority::Verification)?;

        let mut sheet = self.verification_sheet(session, key).await?;
        sheet.apply_verified(&verified)?;
        self.ensure_editable(session, key, PartLetter::B, MarkAuthority::Verification)
            .await?;

        let payload = sheet.submission_payload();
        let body = serde_json::to_value(&payload).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.backend
            .save_part(session, key, PartLetter::B, body)
            .await
            .map_err(|err| log_backend_failure(key, PartLetter::B, err))?;
        info!(record = %key, part = %PartLetter::B, "verification submitted");

        Ok(VerificationReceipt {
            key: key.clone(),
            payload,
            sections: sheet.section_totals(),
            recorded_at: Utc::now(),
        })
    }

    /// Writes the caller's superior mark into the stored Part D record.
    pub async fn save_superior_mark(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        mark: f64,
    ) -> Result<SaveReceipt<PortfolioScore>, AppraisalServiceError> {
        let role = session.require_role()?;
        let authority = MarkAuthority::superior_for(role)
            .ok_or(AppraisalServiceError::NoSuperiorAuthority(role))?;
        super::scoring::validate_superior_mark(authority, mark)?;
        self.ensure_editable(session, key, PartLetter::D, authority)
            .await?;

        let stored = self
            .fetch_part(session, key, PartLetter::D)
            .await?
            .ok_or(AppraisalServiceError::PartMissing(PartLetter::D))?;
        let mut form: PortfolioForm = decode(PartLetter::D, stored)?;
        form.apply_superior_mark(authority, mark)?;
        let score = form.score();
        let record = serde_json::to_value(&form).map_err(|e| BackendError::Decode(e.to_string()))?;

        self.write_part(session, key, PartLetter::D, record, false)
            .await?;
        if authority == MarkAuthority::Director {
            self.backend
                .mark_director_given(session, key)
                .await
                .map_err(|err| log_backend_failure(key, PartLetter::D, err))?;
            info!(record = %key, "director mark flagged");
        }

        Ok(self.receipt(key, PartLetter::D, false, score))
    }

    /// Final submission of an external reviewer's interaction marks.
    pub async fn submit_interaction(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        evaluation: InteractionEvaluation,
    ) -> Result<InteractionTotal, AppraisalServiceError> {
        self.authorize(session, MarkAuthority::Interaction)?;
        evaluation.ensure_complete()?;

        let status = self.fetch_status(session, key).await?;
        if let Err(locked) = self.gate.ensure_editable(status, MarkAuthority::Interaction) {
            warn!(record = %key, status = %status, "interaction marks refused on locked form");
            return Err(locked.into());
        }

        self.backend
            .save_interaction_marks(session, key, evaluation.payload())
            .await
            .map_err(|err| {
                error!(record = %key, error = %err, "interaction marks were not saved");
                AppraisalServiceError::Backend(err)
            })?;
        info!(record = %key, total = evaluation.total(), "interaction marks submitted");

        Ok(InteractionTotal {
            total: evaluation.total(),
            max: 100,
        })
    }

    pub async fn scorecard(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<Scorecard, AppraisalServiceError> {
        session.require_role()?;
        let status = self.fetch_status(session, key).await?;
        let mut progress = CompletionProgress::default();

        let academic = match self.fetch_part(session, key, PartLetter::A).await? {
            Some(value) => {
                let designation = value
                    .get("designation")
                    .and_then(Value::as_str)
                    .map(Designation::parse)
                    .unwrap_or_else(|| Designation::Unlisted(String::new()));
                let scores: AcademicScores = decode(PartLetter::A, value)?;
                progress.academic = scores.progress_percent();
                Some(score_academic(&scores, &designation))
            }
            None => None,
        };

        let research = self.verification_sheet(session, key).await?.section_totals();

        let portfolio = match self.fetch_part(session, key, PartLetter::D).await? {
            Some(value) => {
                let form: PortfolioForm = decode(PartLetter::D, value)?;
                progress.portfolio = form.progress_percent();
                Some(form.score())
            }
            None => None,
        };

        let extra = match self.fetch_part(session, key, PartLetter::E).await? {
            Some(value) => {
                let contribution: ExtraContribution = decode(PartLetter::E, value)?;
                let score = contribution.score();
                progress.extra = score.progress_percent;
                Some(score)
            }
            None => None,
        };

        Ok(Scorecard {
            key: key.clone(),
            status: self.gate.view(status, MarkAuthority::SelfAssessment),
            academic,
            research,
            portfolio,
            extra,
            progress,
        })
    }

    fn authorize(
        &self,
        session: &SessionContext,
        authority: MarkAuthority,
    ) -> Result<Role, AppraisalServiceError> {
        let role = session.require_role()?;
        if authority.permits(role) {
            Ok(role)
        } else {
            Err(AppraisalServiceError::Forbidden { role, authority })
        }
    }

    async fn ensure_editable(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
        authority: MarkAuthority,
    ) -> Result<FormStatus, AppraisalServiceError> {
        let status = self.fetch_status(session, key).await?;
        self.gate.ensure_editable(status, authority).map_err(|locked| {
            warn!(record = %key, %part, status = %status, "save refused on locked form");
            AppraisalServiceError::Locked(locked)
        })?;
        Ok(status)
    }

    async fn fetch_status(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<FormStatus, AppraisalServiceError> {
        // Each operation's first backend call is one of the two reads.
        key.validate()?;
        self.backend.fetch_status(session, key).await.map_err(|err| {
            error!(record = %key, error = %err, "status lookup failed");
            AppraisalServiceError::Backend(err)
        })
    }

    async fn fetch_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
    ) -> Result<Option<Value>, AppraisalServiceError> {
        key.validate()?;
        let stored = self
            .backend
            .fetch_part(session, key, part)
            .await
            .map_err(|err| log_backend_failure(key, part, err))?;
        Ok(stored.map(|value| unwrap_part(part, value)))
    }

    async fn verification_sheet(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<VerificationSheet, AppraisalServiceError> {
        Ok(self
            .fetch_part(session, key, PartLetter::B)
            .await?
            .map(|record| VerificationSheet::from_record(&record))
            .unwrap_or_default())
    }

    async fn write_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
        record: Value,
        is_first_time: bool,
    ) -> Result<(), AppraisalServiceError> {
        let mut body = serde_json::Map::new();
        body.insert(part.as_str().to_string(), record);
        body.insert("isFirstTime".to_string(), Value::Bool(is_first_time));

        self.backend
            .save_part(session, key, part, Value::Object(body))
            .await
            .map_err(|err| log_backend_failure(key, part, err))?;
        info!(record = %key, %part, created = is_first_time, "appraisal part saved");
        Ok(())
    }

    fn receipt<S>(&self, key: &RecordKey, part: PartLetter, created: bool, score: S) -> SaveReceipt<S> {
        SaveReceipt {
            key: key.clone(),
            part,
            created,
            score,
            recorded_at: Utc::now(),
        }
    }
}

/// Backend responses may wrap a part under its letter, as saves do.
fn unwrap_part(part: PartLetter, value: Value) -> Value {
    match value {
        Value::Object(mut fields) if fields.get(part.as_str()).is_some_and(Value::is_object) => {
            fields.remove(part.as_str()).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(part: PartLetter, value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value)
        .map_err(|e| BackendError::Decode(format!("part {part}: {e}")))
}

fn log_backend_failure(key: &RecordKey, part: PartLetter, err: BackendError) -> AppraisalServiceError {
    error!(record = %key, %part, error = %err, "backend call failed");
    AppraisalServiceError::Backend(err)
}

#[derive(Debug, thiserror::Error)]
pub enum AppraisalServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("role '{role}' may not write {authority} marks")]
    Forbidden { role: Role, authority: MarkAuthority },
    #[error("role '{0}' does not award portfolio marks")]
    NoSuperiorAuthority(Role),
    #[error(transparent)]
    InvalidKey(#[from] InvalidRecordKey),
    #[error(transparent)]
    Locked(#[from] FormLocked),
    #[error(transparent)]
    Marks(#[from] MarkError),
    #[error("part {0} has not been submitted yet")]
    PartMissing(PartLetter),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
