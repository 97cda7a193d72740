use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::MarkError;

/// Criteria scored by external reviewers during the interaction round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionCriterion {
    Knowledge,
    Skills,
    Attributes,
    OutcomesInitiatives,
    SelfBranching,
    TeamPerformance,
}

impl InteractionCriterion {
    pub const fn all() -> [Self; 6] {
        [
            Self::Knowledge,
            Self::Skills,
            Self::Attributes,
            Self::OutcomesInitiatives,
            Self::SelfBranching,
            Self::TeamPerformance,
        ]
    }

    pub const fn max(self) -> u32 {
        match self {
            Self::Attributes | Self::SelfBranching => 10,
            _ => 20,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Skills => "skills",
            Self::Attributes => "attributes",
            Self::OutcomesInitiatives => "outcomesInitiatives",
            Self::SelfBranching => "selfBranching",
            Self::TeamPerformance => "teamPerformance",
        }
    }
}

/// Reviewer input; `None` means the criterion was left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionEvaluation {
    pub knowledge: Option<i64>,
    pub skills: Option<i64>,
    pub attributes: Option<i64>,
    pub outcomes_initiatives: Option<i64>,
    pub self_branching: Option<i64>,
    pub team_performance: Option<i64>,
    pub comments: String,
}

impl InteractionEvaluation {
    pub fn get(&self, criterion: InteractionCriterion) -> Option<i64> {
        match criterion {
            InteractionCriterion::Knowledge => self.knowledge,
            InteractionCriterion::Skills => self.skills,
            InteractionCriterion::Attributes => self.attributes,
            InteractionCriterion::OutcomesInitiatives => self.outcomes_initiatives,
            InteractionCriterion::SelfBranching => self.self_branching,
            InteractionCriterion::TeamPerformance => self.team_performance,
        }
    }

    /// Clamped mark for `criterion`, blank counting as zero.
    pub fn mark(&self, criterion: InteractionCriterion) -> u32 {
        self.get(criterion)
            .map(|value| value.clamp(0, i64::from(criterion.max())) as u32)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        InteractionCriterion::all()
            .into_iter()
            .map(|criterion| self.mark(criterion))
            .sum()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        InteractionCriterion::all()
            .into_iter()
            .filter(|criterion| self.get(*criterion).is_none())
            .map(InteractionCriterion::key)
            .collect()
    }

    /// A final submission needs every criterion scored.
    pub fn ensure_complete(&self) -> Result<(), MarkError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MarkError::Incomplete { missing })
        }
    }

    /// Body posted to the backend's interaction-marks endpoint.
    pub fn payload(&self) -> Value {
        let mut body = serde_json::Map::new();
        for criterion in InteractionCriterion::all() {
            body.insert(criterion.key().to_string(), json!(self.mark(criterion)));
        }
        body.insert("total".to_string(), json!(self.total()));
        body.insert("comments".to_string(), json!(self.comments));
        Value::Object(body)
    }
}
