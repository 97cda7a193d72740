use serde::{Deserialize, Serialize};

use super::{clamp_mark, progress_percent};

pub const EXTRA_MAX: f64 = 50.0;

/// Part E as the backend stores it: free text plus one self-awarded mark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraContribution {
    pub bullet_points: String,
    pub total_marks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtraScore {
    pub marks: f64,
    pub max: f64,
    pub progress_percent: f64,
}

impl ExtraContribution {
    pub fn sanitized(&self) -> Self {
        Self {
            bullet_points: self.bullet_points.clone(),
            total_marks: clamp_mark(self.total_marks, EXTRA_MAX),
        }
    }

    pub fn score(&self) -> ExtraScore {
        let marks = clamp_mark(self.total_marks, EXTRA_MAX);
        let filled = usize::from(!self.bullet_points.trim().is_empty()) + usize::from(marks > 0.0);
        ExtraScore {
            marks,
            max: EXTRA_MAX,
            progress_percent: progress_percent(filled, 2),
        }
    }
}
