use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::common::full_scores;
use crate::workflows::appraisal::domain::{Designation, MarkAuthority};
use crate::workflows::appraisal::scoring::{
    parse_verified, score_academic, AcademicCriterion, AcademicScores, AdminTrack,
    ExtraContribution, InteractionCriterion, InteractionEvaluation, MarkError, PortfolioForm,
    PortfolioType, ResearchCategory, ResearchSection, VerificationSheet,
};

#[test]
fn professor_with_390_scores_265() {
    let outcome = score_academic(&full_scores(), &Designation::Professor);

    assert_eq!(outcome.raw_sum, 390.0);
    assert_eq!(outcome.factor, 0.68);
    assert_eq!(outcome.max_score, 300);
    assert_eq!(outcome.final_score, 265);
    assert!(outcome.designation_recognized);
    assert_eq!(outcome.progress_percent, 100.0);
}

#[test]
fn role_cap_limits_final_score() {
    let mut scores = full_scores();
    scores.student_feedback = 100.0;

    let professor = score_academic(&scores, &Designation::Professor);
    assert_eq!(professor.raw_sum, 440.0);
    assert_eq!(professor.final_score, 299);

    let associate = score_academic(&scores, &Designation::AssociateProfessor);
    assert_eq!(associate.final_score, 348);

    let assistant = score_academic(&scores, &Designation::AssistantProfessor);
    assert_eq!(assistant.final_score, 440);
}

#[test]
fn unknown_designation_falls_back_to_full_weighting() {
    let outcome = score_academic(&full_scores(), &Designation::parse("Visiting Lecturer"));

    assert_eq!(outcome.factor, 1.0);
    assert_eq!(outcome.max_score, 440);
    assert_eq!(outcome.final_score, 390);
    assert!(!outcome.designation_recognized);
    assert_eq!(outcome.designation, "Visiting Lecturer");
}

#[test]
fn sub_scores_are_clamped_into_their_caps() {
    let mut scores = AcademicScores::default();
    scores.set(AcademicCriterion::ProjectsGuided, 75.0);
    scores.set(AcademicCriterion::ResultAnalysis, -10.0);
    scores.student_feedback = 250.0;

    assert_eq!(scores.projects_guided, 40.0);
    assert_eq!(scores.result_analysis, 0.0);

    let outcome = score_academic(&scores, &Designation::AssistantProfessor);
    assert_eq!(outcome.raw_sum, 140.0);
}

#[test]
fn final_score_is_monotonic_in_each_sub_score() {
    let designations = [
        Designation::Professor,
        Designation::AssociateProfessor,
        Designation::AssistantProfessor,
    ];

    for designation in &designations {
        for criterion in AcademicCriterion::all() {
            let mut scores = AcademicScores::default();
            let mut previous = 0;
            let mut value = 0.0;
            while value <= criterion.max() {
                scores.set(criterion, value);
                let current = score_academic(&scores, designation).final_score;
                assert!(
                    current >= previous,
                    "{criterion:?} at {value} dropped from {previous} to {current}"
                );
                previous = current;
                value += 5.0;
            }
        }
    }
}

#[test]
fn academic_progress_counts_filled_scores() {
    let mut scores = AcademicScores::default();
    scores.e_learning = 10.0;
    scores.ptg_meetings = 5.0;
    assert_eq!(scores.progress_percent(), 25.0);
}

#[test]
fn portfolio_total_caps_at_120() {
    let form = PortfolioForm {
        portfolio_type: PortfolioType::Both,
        self_awarded_marks: 60.0,
        dean_marks: 60.0,
        hod_marks: 60.0,
        ..PortfolioForm::default()
    };

    let score = form.score();
    assert_eq!(score.self_marks, 60.0);
    assert_eq!(score.superior, 60.0);
    assert_eq!(score.total, 120.0);

    let inflated = PortfolioForm {
        self_awarded_marks: 95.0,
        dean_marks: 80.0,
        hod_marks: 75.0,
        ..form
    };
    assert_eq!(inflated.score().total, 120.0);
}

#[test]
fn portfolio_superior_follows_portfolio_type() {
    let base = PortfolioForm {
        self_awarded_marks: 30.0,
        dean_marks: 50.0,
        hod_marks: 20.0,
        ..PortfolioForm::default()
    };

    let both = PortfolioForm {
        portfolio_type: PortfolioType::Both,
        ..base.clone()
    };
    assert_eq!(both.score().superior, 35.0);
    assert_eq!(both.score().total, 65.0);

    let institute = PortfolioForm {
        portfolio_type: PortfolioType::Institute,
        ..base.clone()
    };
    assert_eq!(institute.score().superior, 50.0);

    let department = PortfolioForm {
        portfolio_type: PortfolioType::Department,
        ..base
    };
    assert_eq!(department.score().superior, 20.0);
}

#[test]
fn administrative_faculty_use_the_admin_branch() {
    let director_track = PortfolioForm {
        is_administrative_role: true,
        administrative_role: "director".to_string(),
        self_awarded_marks: 10.0,
        admin_self_awarded_marks: 45.0,
        director_marks: 55.0,
        dean_marks: 5.0,
        hod_marks: 5.0,
        ..PortfolioForm::default()
    };
    assert_eq!(director_track.admin_track(), Some(AdminTrack::Director));
    let score = director_track.score();
    assert_eq!(score.self_marks, 45.0);
    assert_eq!(score.superior, 55.0);
    assert_eq!(score.total, 100.0);

    let associate_dean_track = PortfolioForm {
        administrative_role: "Associate Dean".to_string(),
        admin_dean_marks: 40.0,
        ..director_track
    };
    assert_eq!(
        associate_dean_track.admin_track(),
        Some(AdminTrack::AssociateDean)
    );
    assert_eq!(associate_dean_track.score().superior, 40.0);
}

#[test]
fn portfolio_form_reads_backend_field_names() {
    let form: PortfolioForm = serde_json::from_value(json!({
        "portfolioType": "institute",
        "selfAwardedMarks": 50,
        "deanMarks": 40,
        "isMarkHOD": true,
        "isMarkDean": false,
        "instituteLevelPortfolio": "IQAC member"
    }))
    .expect("portfolio decodes");

    assert_eq!(form.portfolio_type, PortfolioType::Institute);
    assert!(form.is_mark_hod);
    assert_eq!(form.score().total, 90.0);

    let encoded = serde_json::to_value(&form).expect("portfolio encodes");
    assert_eq!(encoded["isMarkHOD"], json!(true));
    assert!(encoded.get("marks").is_none());
}

#[test]
fn portfolio_progress_counts_visible_sections() {
    let form = PortfolioForm {
        portfolio_type: PortfolioType::Department,
        self_awarded_marks: 20.0,
        department_level_portfolio: "Lab in-charge".to_string(),
        ..PortfolioForm::default()
    };
    assert!(!form.shows_institute());
    assert_eq!(form.progress_percent(), 100.0);

    let both = PortfolioForm {
        portfolio_type: PortfolioType::Both,
        ..form
    };
    assert!((both.progress_percent() - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn superior_marks_outside_range_are_refused() {
    let mut form = PortfolioForm::default();

    let err = form
        .apply_superior_mark(MarkAuthority::Hod, 61.0)
        .expect_err("61 is out of range");
    assert!(matches!(err, MarkError::OutOfRange { field: "hodMarks", .. }));

    let err = form
        .apply_superior_mark(MarkAuthority::Dean, -1.0)
        .expect_err("negative is out of range");
    assert!(matches!(err, MarkError::OutOfRange { field: "deanMarks", .. }));

    assert_eq!(form, PortfolioForm::default());
}

#[test]
fn superior_mark_sets_flag_and_rescores() {
    let mut form = PortfolioForm {
        portfolio_type: PortfolioType::Both,
        self_awarded_marks: 40.0,
        dean_marks: 50.0,
        ..PortfolioForm::default()
    };

    form.apply_superior_mark(MarkAuthority::Hod, 30.0)
        .expect("mark applies");

    assert_eq!(form.hod_marks, 30.0);
    assert!(form.is_mark_hod);
    assert_eq!(form.marks, Some(80.0));

    let refused = form.apply_superior_mark(MarkAuthority::Verification, 10.0);
    assert_eq!(
        refused,
        Err(MarkError::NotSuperiorAuthority(MarkAuthority::Verification))
    );
}

#[test]
fn faculty_edits_keep_stored_superior_marks() {
    let stored = PortfolioForm {
        dean_marks: 45.0,
        hod_marks: 35.0,
        is_mark_hod: true,
        is_mark_dean: true,
        ..PortfolioForm::default()
    };
    let edit = PortfolioForm {
        self_awarded_marks: 55.0,
        dean_marks: 60.0,
        hod_marks: 60.0,
        institute_level_portfolio: "Exam cell".to_string(),
        ..PortfolioForm::default()
    };

    let merged = edit.with_superior_marks_from(&stored);
    assert_eq!(merged.self_awarded_marks, 55.0);
    assert_eq!(merged.dean_marks, 45.0);
    assert_eq!(merged.hod_marks, 35.0);
    assert_eq!(merged.institute_level_portfolio, "Exam cell");

    let fresh = edit.without_superior_marks();
    assert_eq!(fresh.dean_marks, 0.0);
    assert!(!fresh.is_mark_hod);
}

#[test]
fn extra_marks_clamp_to_fifty() {
    let extra = ExtraContribution {
        bullet_points: "Organised hackathon".to_string(),
        total_marks: 80.0,
    };
    let score = extra.score();
    assert_eq!(score.marks, 50.0);
    assert_eq!(score.progress_percent, 100.0);

    let blank = ExtraContribution::default().score();
    assert_eq!(blank.marks, 0.0);
    assert_eq!(blank.progress_percent, 0.0);
}

#[test]
fn blank_verified_values_submit_as_zero() {
    let mut sheet = VerificationSheet::from_record(&json!({
        "sci": { "claimed": 3, "proofUrl": "https://doi.org/x" },
        "scopus": 2,
        "citation_google": { "count": 140, "verified": 120 }
    }));

    let mut input = BTreeMap::new();
    input.insert("sci".to_string(), json!("2"));
    input.insert("scopus".to_string(), json!(""));
    input.insert("ugc".to_string(), Value::Null);
    sheet.apply_verified(&input).expect("known categories");

    let payload = sheet.submission_payload();
    assert_eq!(payload.len(), ResearchCategory::ALL.len());
    assert_eq!(payload["sci"], 2);
    assert_eq!(payload["scopus"], 0);
    assert_eq!(payload["ugc"], 0);
    assert_eq!(payload["citation_google"], 120);
    assert_eq!(payload["industry_association"], 0);
}

#[test]
fn verification_never_alters_claims() {
    let mut sheet = VerificationSheet::from_record(&json!({ "esci": 4 }));

    let mut input = BTreeMap::new();
    input.insert("esci".to_string(), json!(-7));
    sheet.apply_verified(&input).expect("known category");

    let entry = sheet.entry(ResearchCategory::Esci).expect("entry exists");
    assert_eq!(entry.claimed, 4);
    assert_eq!(entry.verified, Some(0));
}

#[test]
fn unknown_research_keys_are_refused_before_applying() {
    let mut sheet = VerificationSheet::blank();

    let mut input = BTreeMap::new();
    input.insert("sci".to_string(), json!(5));
    input.insert("h_index".to_string(), json!(9));

    let err = sheet.apply_verified(&input).expect_err("unknown key");
    assert_eq!(err, MarkError::UnknownCategory("h_index".to_string()));
    assert_eq!(
        sheet.entry(ResearchCategory::Sci).and_then(|entry| entry.verified),
        None
    );
}

#[test]
fn section_totals_group_categories() {
    let mut sheet = VerificationSheet::from_record(&json!({
        "sci": 2,
        "ugc": 3,
        "conf_national": 1
    }));
    let mut input = BTreeMap::new();
    input.insert("sci".to_string(), json!(2));
    input.insert("ugc".to_string(), json!(1));
    sheet.apply_verified(&input).expect("known categories");

    let totals = sheet.section_totals();
    assert_eq!(totals.len(), 7);

    let journals = totals
        .iter()
        .find(|total| total.section == ResearchSection::Journals)
        .expect("journal section");
    assert_eq!((journals.claimed, journals.verified), (5, 3));

    let conference = totals
        .iter()
        .find(|total| total.section == ResearchSection::Conference)
        .expect("conference section");
    assert_eq!((conference.claimed, conference.verified), (1, 0));
}

#[test]
fn parse_verified_is_lenient() {
    assert_eq!(parse_verified("12"), 12);
    assert_eq!(parse_verified(" 4 papers"), 4);
    assert_eq!(parse_verified(""), 0);
    assert_eq!(parse_verified("n/a"), 0);
    assert_eq!(parse_verified("-2"), 0);
}

#[test]
fn interaction_marks_clamp_and_total() {
    let evaluation = InteractionEvaluation {
        knowledge: Some(25),
        skills: Some(18),
        attributes: Some(10),
        outcomes_initiatives: Some(-3),
        self_branching: Some(7),
        team_performance: Some(20),
        comments: "Strong lab work".to_string(),
    };

    assert_eq!(evaluation.mark(InteractionCriterion::Knowledge), 20);
    assert_eq!(evaluation.mark(InteractionCriterion::OutcomesInitiatives), 0);
    assert_eq!(evaluation.total(), 75);

    let payload = evaluation.payload();
    assert_eq!(payload["knowledge"], json!(20));
    assert_eq!(payload["total"], json!(75));
    assert_eq!(payload["comments"], json!("Strong lab work"));
}

#[test]
fn interaction_submission_requires_every_criterion() {
    let evaluation = InteractionEvaluation {
        knowledge: Some(10),
        skills: Some(10),
        attributes: Some(5),
        ..InteractionEvaluation::default()
    };

    let err = evaluation.ensure_complete().expect_err("incomplete");
    assert_eq!(
        err,
        MarkError::Incomplete {
            missing: vec!["outcomesInitiatives", "selfBranching", "teamPerformance"]
        }
    );

    let max: u32 = InteractionCriterion::all()
        .into_iter()
        .map(InteractionCriterion::max)
        .sum();
    assert_eq!(max, 100);
}
