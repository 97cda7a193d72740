use serde::{Deserialize, Serialize};

use super::{clamp_mark, progress_percent, MarkError};
use crate::workflows::appraisal::domain::MarkAuthority;

pub const PORTFOLIO_SELF_MAX: f64 = 60.0;
pub const PORTFOLIO_SUPERIOR_MAX: f64 = 60.0;
pub const PORTFOLIO_TOTAL_MAX: f64 = 120.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioType {
    Institute,
    Department,
    #[default]
    Both,
}

/// Evaluator branch for faculty holding an administrative post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTrack {
    Director,
    AssociateDean,
}

impl AdminTrack {
    pub fn from_role_name(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        if normalized == "associate_dean" {
            Self::AssociateDean
        } else {
            Self::Director
        }
    }
}

/// Part D record as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioForm {
    pub portfolio_type: PortfolioType,
    pub self_awarded_marks: f64,
    pub dean_marks: f64,
    pub hod_marks: f64,
    #[serde(rename = "isMarkHOD")]
    pub is_mark_hod: bool,
    pub is_mark_dean: bool,
    pub is_administrative_role: bool,
    pub administrative_role: String,
    pub admin_self_awarded_marks: f64,
    pub director_marks: f64,
    pub admin_dean_marks: f64,
    pub institute_level_portfolio: String,
    pub department_level_portfolio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioScore {
    #[serde(rename = "self")]
    pub self_marks: f64,
    pub superior: f64,
    pub total: f64,
}

impl PortfolioForm {
    /// Copy with every mark forced into its range.
    pub fn sanitized(&self) -> Self {
        Self {
            self_awarded_marks: clamp_mark(self.self_awarded_marks, PORTFOLIO_SELF_MAX),
            admin_self_awarded_marks: clamp_mark(self.admin_self_awarded_marks, PORTFOLIO_SELF_MAX),
            dean_marks: clamp_mark(self.dean_marks, PORTFOLIO_SUPERIOR_MAX),
            hod_marks: clamp_mark(self.hod_marks, PORTFOLIO_SUPERIOR_MAX),
            director_marks: clamp_mark(self.director_marks, PORTFOLIO_SUPERIOR_MAX),
            admin_dean_marks: clamp_mark(self.admin_dean_marks, PORTFOLIO_SUPERIOR_MAX),
            ..self.clone()
        }
    }

    pub fn admin_track(&self) -> Option<AdminTrack> {
        self.is_administrative_role
            .then(|| AdminTrack::from_role_name(&self.administrative_role))
    }

    pub fn score(&self) -> PortfolioScore {
        let form = self.sanitized();

        let self_marks = match form.admin_track() {
            Some(_) => form.admin_self_awarded_marks,
            None => form.self_awarded_marks,
        };

        let superior = match form.admin_track() {
            Some(AdminTrack::AssociateDean) => form.admin_dean_marks,
            Some(AdminTrack::Director) => form.director_marks,
            None => match form.portfolio_type {
                PortfolioType::Both => (form.dean_marks + form.hod_marks) / 2.0,
                PortfolioType::Institute => form.dean_marks,
                PortfolioType::Department => form.hod_marks,
            },
        };

        PortfolioScore {
            self_marks,
            superior,
            total: (self_marks + superior).min(PORTFOLIO_TOTAL_MAX),
        }
    }

    pub fn shows_institute(&self) -> bool {
        self.is_administrative_role
            || matches!(
                self.portfolio_type,
                PortfolioType::Both | PortfolioType::Institute
            )
    }

    pub fn shows_department(&self) -> bool {
        self.is_administrative_role
            || matches!(
                self.portfolio_type,
                PortfolioType::Both | PortfolioType::Department
            )
    }

    pub fn progress_percent(&self) -> f64 {
        let self_marks = if self.is_administrative_role {
            self.admin_self_awarded_marks
        } else {
            self.self_awarded_marks
        };

        let mut filled = usize::from(self_marks > 0.0);
        let mut total = 1;
        if self.shows_institute() {
            total += 1;
            filled += usize::from(!self.institute_level_portfolio.trim().is_empty());
        }
        if self.shows_department() {
            total += 1;
            filled += usize::from(!self.department_level_portfolio.trim().is_empty());
        }
        progress_percent(filled, total)
    }

    /// Keeps the faculty-owned fields of `self` and every superior mark from
    /// `stored`, so a self-assessment save cannot overwrite evaluator marks.
    pub fn with_superior_marks_from(&self, stored: &PortfolioForm) -> Self {
        Self {
            dean_marks: stored.dean_marks,
            hod_marks: stored.hod_marks,
            is_mark_hod: stored.is_mark_hod,
            is_mark_dean: stored.is_mark_dean,
            director_marks: stored.director_marks,
            admin_dean_marks: stored.admin_dean_marks,
            ..self.clone()
        }
    }

    /// Clears superior marks on a first submission.
    pub fn without_superior_marks(&self) -> Self {
        self.with_superior_marks_from(&PortfolioForm::default())
    }

    /// Records a superior's mark under the field that authority owns.
    pub fn apply_superior_mark(
        &mut self,
        authority: MarkAuthority,
        mark: f64,
    ) -> Result<(), MarkError> {
        let mark = validate_superior_mark(authority, mark)?;
        match authority {
            MarkAuthority::Hod => {
                self.hod_marks = mark;
                self.is_mark_hod = true;
            }
            MarkAuthority::Dean => {
                self.dean_marks = mark;
                self.is_mark_dean = true;
            }
            MarkAuthority::Director => self.director_marks = mark,
            MarkAuthority::AssociateDean => self.admin_dean_marks = mark,
            MarkAuthority::SelfAssessment
            | MarkAuthority::Verification
            | MarkAuthority::Interaction => {
                return Err(MarkError::NotSuperiorAuthority(authority))
            }
        }
        self.marks = Some(self.score().total);
        Ok(())
    }
}

/// Superior marks are refused, not clamped, when outside `[0, 60]`.
pub fn validate_superior_mark(authority: MarkAuthority, mark: f64) -> Result<f64, MarkError> {
    if mark.is_finite() && (0.0..=PORTFOLIO_SUPERIOR_MAX).contains(&mark) {
        return Ok(mark);
    }

    let field = match authority {
        MarkAuthority::Hod => "hodMarks",
        MarkAuthority::Dean => "deanMarks",
        MarkAuthority::Director => "directorMarks",
        MarkAuthority::AssociateDean => "adminDeanMarks",
        other => return Err(MarkError::NotSuperiorAuthority(other)),
    };
    Err(MarkError::OutOfRange {
        field,
        max: PORTFOLIO_SUPERIOR_MAX,
        found: mark,
    })
}
