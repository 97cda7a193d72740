use serde::{Deserialize, Serialize};

use super::{clamp_mark, progress_percent};
use crate::workflows::appraisal::domain::Designation;

/// The eight Part A sub-scores and their individual caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcademicCriterion {
    ResultAnalysis,
    CourseOutcome,
    ELearning,
    AcademicEngagement,
    TeachingLoad,
    ProjectsGuided,
    StudentFeedback,
    PtgMeetings,
}

impl AcademicCriterion {
    pub const fn all() -> [Self; 8] {
        [
            Self::ResultAnalysis,
            Self::CourseOutcome,
            Self::ELearning,
            Self::AcademicEngagement,
            Self::TeachingLoad,
            Self::ProjectsGuided,
            Self::StudentFeedback,
            Self::PtgMeetings,
        ]
    }

    pub const fn max(self) -> f64 {
        match self {
            Self::ProjectsGuided => 40.0,
            Self::StudentFeedback => 100.0,
            _ => 50.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ResultAnalysis => "Result Analysis",
            Self::CourseOutcome => "Course Outcome Analysis",
            Self::ELearning => "E-Learning Content Development",
            Self::AcademicEngagement => "Academic Engagement",
            Self::TeachingLoad => "Teaching Load",
            Self::ProjectsGuided => "UG Projects / PG Dissertations Guided",
            Self::StudentFeedback => "Feedback of Faculty by Student",
            Self::PtgMeetings => "Guardian / PTG Meetings",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicScores {
    pub result_analysis: f64,
    pub course_outcome: f64,
    pub e_learning: f64,
    pub academic_engagement: f64,
    pub teaching_load: f64,
    pub projects_guided: f64,
    pub student_feedback: f64,
    pub ptg_meetings: f64,
}

impl AcademicScores {
    pub fn get(&self, criterion: AcademicCriterion) -> f64 {
        match criterion {
            AcademicCriterion::ResultAnalysis => self.result_analysis,
            AcademicCriterion::CourseOutcome => self.course_outcome,
            AcademicCriterion::ELearning => self.e_learning,
            AcademicCriterion::AcademicEngagement => self.academic_engagement,
            AcademicCriterion::TeachingLoad => self.teaching_load,
            AcademicCriterion::ProjectsGuided => self.projects_guided,
            AcademicCriterion::StudentFeedback => self.student_feedback,
            AcademicCriterion::PtgMeetings => self.ptg_meetings,
        }
    }

    /// Stores `value` clamped into the criterion's range.
    pub fn set(&mut self, criterion: AcademicCriterion, value: f64) {
        let value = clamp_mark(value, criterion.max());
        let slot = match criterion {
            AcademicCriterion::ResultAnalysis => &mut self.result_analysis,
            AcademicCriterion::CourseOutcome => &mut self.course_outcome,
            AcademicCriterion::ELearning => &mut self.e_learning,
            AcademicCriterion::AcademicEngagement => &mut self.academic_engagement,
            AcademicCriterion::TeachingLoad => &mut self.teaching_load,
            AcademicCriterion::ProjectsGuided => &mut self.projects_guided,
            AcademicCriterion::StudentFeedback => &mut self.student_feedback,
            AcademicCriterion::PtgMeetings => &mut self.ptg_meetings,
        };
        *slot = value;
    }

    /// Copy with every sub-score forced into range.
    pub fn sanitized(&self) -> Self {
        let mut clean = Self::default();
        for criterion in AcademicCriterion::all() {
            clean.set(criterion, self.get(criterion));
        }
        clean
    }

    pub fn raw_sum(&self) -> f64 {
        AcademicCriterion::all()
            .into_iter()
            .map(|criterion| self.get(criterion))
            .sum()
    }

    pub fn progress_percent(&self) -> f64 {
        let filled = AcademicCriterion::all()
            .into_iter()
            .filter(|criterion| self.get(*criterion) > 0.0)
            .count();
        progress_percent(filled, AcademicCriterion::all().len())
    }
}

/// Factor and ceiling applied to the raw Part A sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleWeighting {
    pub factor: f64,
    pub max_score: u32,
}

impl RoleWeighting {
    /// Weighting for designations outside the table.
    pub const FALLBACK: Self = Self {
        factor: 1.0,
        max_score: 440,
    };

    pub fn for_designation(designation: &Designation) -> Self {
        match designation {
            Designation::Professor => Self {
                factor: 0.68,
                max_score: 300,
            },
            Designation::AssociateProfessor => Self {
                factor: 0.79,
                max_score: 350,
            },
            Designation::AssistantProfessor => Self {
                factor: 1.0,
                max_score: 440,
            },
            Designation::Unlisted(_) => Self::FALLBACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicOutcome {
    pub designation: String,
    pub raw_sum: f64,
    pub factor: f64,
    pub max_score: u32,
    pub final_score: u32,
    /// False when the fallback weighting was applied.
    pub designation_recognized: bool,
    pub progress_percent: f64,
}

pub fn score_academic(scores: &AcademicScores, designation: &Designation) -> AcademicOutcome {
    let scores = scores.sanitized();
    let weighting = RoleWeighting::for_designation(designation);
    let raw_sum = scores.raw_sum();
    let weighted = (raw_sum * weighting.factor).min(f64::from(weighting.max_score));

    AcademicOutcome {
        designation: designation.as_str().to_string(),
        raw_sum,
        factor: weighting.factor,
        max_score: weighting.max_score,
        final_score: weighted.round() as u32,
        designation_recognized: designation.is_listed(),
        progress_percent: scores.progress_percent(),
    }
}
