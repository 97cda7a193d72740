mod academic;
mod extra;
mod interaction;
mod portfolio;
mod research;

pub use academic::{
    score_academic, AcademicCriterion, AcademicOutcome, AcademicScores, RoleWeighting,
};
pub use extra::{ExtraContribution, ExtraScore, EXTRA_MAX};
pub use interaction::{InteractionCriterion, InteractionEvaluation};
pub use portfolio::{
    validate_superior_mark, AdminTrack, PortfolioForm, PortfolioScore, PortfolioType,
    PORTFOLIO_SELF_MAX, PORTFOLIO_SUPERIOR_MAX, PORTFOLIO_TOTAL_MAX,
};
pub use research::{
    parse_verified, ResearchCategory, ResearchSection, SectionTotal, VerificationEntry,
    VerificationSheet,
};

use serde_json::Value;

use super::domain::MarkAuthority;

/// Clamps an input mark into `[0, max]`; non-finite input counts as zero.
pub fn clamp_mark(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

/// Share of `filled` over `total` as a percentage.
pub(crate) fn progress_percent(filled: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        filled as f64 / total as f64 * 100.0
    }
}

/// Mirrors `parseInt(x)`: optional sign then leading digits, anything else
/// yields `None`.
pub(crate) fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Reads an integer-ish JSON value the way form inputs arrive: numbers are
/// truncated, strings go through [`parse_int_prefix`], anything else is absent.
pub(crate) fn integer_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(raw) => parse_int_prefix(raw),
        _ => None,
    }
}

/// Validation failures on submitted marks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkError {
    #[error("{field} must be between 0 and {max}, found {found}")]
    OutOfRange {
        field: &'static str,
        max: f64,
        found: f64,
    },
    #[error("every criterion must be scored before submitting (missing: {})", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error("unknown research category '{0}'")]
    UnknownCategory(String),
    #[error("{0} does not award portfolio marks")]
    NotSuperiorAuthority(MarkAuthority),
}
