//! Annual faculty appraisal: scoring of Parts A, B, D and E, the status lock
//! gate, and the service and routes that front the appraisal backend.

pub mod domain;
pub mod gate;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Department, Designation, FormStatus, InvalidRecordKey, MarkAuthority, PartLetter, RecordKey,
    UnknownPart, UnrecognizedStatus, UserId,
};
pub use gate::{FormLocked, LockGate, StatusView};
pub use router::appraisal_router;
pub use scoring::{
    score_academic, AcademicCriterion, AcademicOutcome, AcademicScores, ExtraContribution,
    ExtraScore, InteractionCriterion, InteractionEvaluation, MarkError, PortfolioForm,
    PortfolioScore, PortfolioType, ResearchCategory, SectionTotal, VerificationSheet,
};
pub use service::{
    AcademicSubmission, AppraisalService, AppraisalServiceError, CompletionProgress,
    InteractionTotal, PartView, SaveReceipt, Scorecard, VerificationReceipt,
};
