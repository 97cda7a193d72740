use crate::workflows::appraisal::{
    score_academic, AcademicOutcome, AcademicScores, Designation, RecordKey,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum SheetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SheetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetImportError::Io(err) => write!(f, "failed to read academic sheet: {}", err),
            SheetImportError::Csv(err) => write!(f, "invalid academic sheet data: {}", err),
        }
    }
}

impl std::error::Error for SheetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetImportError::Io(err) => Some(err),
            SheetImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SheetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SheetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    department: String,
    user_id: String,
    #[serde(default)]
    designation: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    result_analysis: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    course_outcome: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    e_learning: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    academic_engagement: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    teaching_load: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    projects_guided: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    student_feedback: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    ptg_meetings: f64,
}

impl SheetRow {
    fn scores(&self) -> AcademicScores {
        AcademicScores {
            result_analysis: self.result_analysis,
            course_outcome: self.course_outcome,
            e_learning: self.e_learning,
            academic_engagement: self.academic_engagement,
            teaching_load: self.teaching_load,
            projects_guided: self.projects_guided,
            student_feedback: self.student_feedback,
            ptg_meetings: self.ptg_meetings,
        }
    }
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(value) => value.parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// One scored row of an academic sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicSheetEntry {
    pub key: RecordKey,
    pub outcome: AcademicOutcome,
}

/// Scores Part A for every row of a CSV export with the columns
/// `department,user_id,designation` followed by the eight sub-scores.
pub struct AcademicSheetImporter;

impl AcademicSheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<AcademicSheetEntry>, SheetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<AcademicSheetEntry>, SheetImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for record in csv_reader.deserialize::<SheetRow>() {
            let row = record?;
            if row.department.is_empty() && row.user_id.is_empty() {
                continue;
            }

            let designation = Designation::parse(&row.designation);
            entries.push(AcademicSheetEntry {
                key: RecordKey::new(row.department.clone(), row.user_id.clone()),
                outcome: score_academic(&row.scores(), &designation),
            });
        }

        Ok(entries)
    }
}
