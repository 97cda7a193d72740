use serde::Serialize;

use super::domain::{FormStatus, MarkAuthority};

/// Refusal raised before any write reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{authority} marks are locked while the form is {status}")]
pub struct FormLocked {
    pub status: FormStatus,
    pub authority: MarkAuthority,
}

/// Decides whether a write may proceed given the record's workflow status.
///
/// Self-assessed parts are editable only while `pending`. Superior,
/// verification and interaction marks stay open until the record is `done`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockGate;

impl LockGate {
    pub fn is_locked(&self, status: FormStatus, authority: MarkAuthority) -> bool {
        match authority {
            MarkAuthority::SelfAssessment => status != FormStatus::Pending,
            _ => status.is_terminal(),
        }
    }

    pub fn ensure_editable(
        &self,
        status: FormStatus,
        authority: MarkAuthority,
    ) -> Result<(), FormLocked> {
        if self.is_locked(status, authority) {
            Err(FormLocked { status, authority })
        } else {
            Ok(())
        }
    }

    pub fn view(&self, status: FormStatus, authority: MarkAuthority) -> StatusView {
        StatusView {
            status,
            label: status.label(),
            locked: self.is_locked(status, authority),
        }
    }
}

/// Status as exposed to the browser, including the derived lock flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: FormStatus,
    pub label: &'static str,
    pub locked: bool,
}
