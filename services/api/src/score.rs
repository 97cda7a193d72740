use clap::{Args, Subcommand};
use faculty_appraisal::error::AppError;
use faculty_appraisal::import::{AcademicSheetEntry, AcademicSheetImporter};
use faculty_appraisal::workflows::appraisal::{
    score_academic, AcademicOutcome, AcademicScores, Designation, PortfolioForm, PortfolioScore,
    PortfolioType,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Subcommand, Debug)]
pub(crate) enum ScoreCommand {
    /// Compute the Part A (academic involvement) score for one faculty member
    Academic(AcademicArgs),
    /// Compute the Part D (portfolio) total from self and evaluator marks
    Portfolio(PortfolioArgs),
    /// Score every row of an academic CSV sheet
    Sheet(SheetArgs),
}

#[derive(Args, Debug)]
pub(crate) struct AcademicArgs {
    /// Designation as stored on the profile, e.g. "Professor"
    #[arg(long)]
    pub(crate) designation: String,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) result_analysis: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) course_outcome: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) e_learning: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) academic_engagement: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) teaching_load: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) projects_guided: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) student_feedback: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) ptg_meetings: f64,
}

#[derive(Args, Debug)]
pub(crate) struct PortfolioArgs {
    /// institute, department or both
    #[arg(long, default_value = "both", value_parser = parse_portfolio_type)]
    pub(crate) portfolio_type: PortfolioType,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) self_marks: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) hod_marks: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) dean_marks: f64,
    /// Administrative post held (director or associate_dean track)
    #[arg(long)]
    pub(crate) admin_role: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) admin_self_marks: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) director_marks: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) admin_dean_marks: f64,
}

#[derive(Args, Debug)]
pub(crate) struct SheetArgs {
    /// CSV with department,user_id,designation and the eight sub-scores
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Debug, Serialize)]
struct PortfolioReport {
    #[serde(flatten)]
    score: PortfolioScore,
    progress_percent: f64,
}

pub(crate) fn run_score(command: ScoreCommand) -> Result<(), AppError> {
    match command {
        ScoreCommand::Academic(args) => print_json(&academic_outcome(&args)),
        ScoreCommand::Portfolio(args) => print_json(&portfolio_report(&args)),
        ScoreCommand::Sheet(args) => print_json(&score_sheet(&args.csv)?),
    }
}

fn score_sheet(path: &Path) -> Result<Vec<AcademicSheetEntry>, AppError> {
    let entries = AcademicSheetImporter::from_path(path)?;
    for entry in entries.iter().filter(|e| !e.outcome.designation_recognized) {
        warn!(
            record = %entry.key,
            designation = %entry.outcome.designation,
            "unrecognized designation scored with fallback weighting"
        );
    }
    Ok(entries)
}

fn academic_outcome(args: &AcademicArgs) -> AcademicOutcome {
    let scores = AcademicScores {
        result_analysis: args.result_analysis,
        course_outcome: args.course_outcome,
        e_learning: args.e_learning,
        academic_engagement: args.academic_engagement,
        teaching_load: args.teaching_load,
        projects_guided: args.projects_guided,
        student_feedback: args.student_feedback,
        ptg_meetings: args.ptg_meetings,
    };
    score_academic(&scores, &Designation::parse(&args.designation))
}

fn portfolio_report(args: &PortfolioArgs) -> PortfolioReport {
    let form = PortfolioForm {
        portfolio_type: args.portfolio_type,
        self_awarded_marks: args.self_marks,
        hod_marks: args.hod_marks,
        dean_marks: args.dean_marks,
        is_administrative_role: args.admin_role.is_some(),
        administrative_role: args.admin_role.clone().unwrap_or_default(),
        admin_self_awarded_marks: args.admin_self_marks,
        director_marks: args.director_marks,
        admin_dean_marks: args.admin_dean_marks,
        ..PortfolioForm::default()
    };

    PortfolioReport {
        score: form.score(),
        progress_percent: form.progress_percent(),
    }
}

fn parse_portfolio_type(raw: &str) -> Result<PortfolioType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "institute" => Ok(PortfolioType::Institute),
        "department" => Ok(PortfolioType::Department),
        "both" => Ok(PortfolioType::Both),
        other => Err(format!(
            "'{other}' is not a portfolio type (institute, department, both)"
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(std::io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}
