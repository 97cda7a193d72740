use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Department(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// One faculty member's appraisal for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub department: Department,
    pub user_id: UserId,
}

impl RecordKey {
    pub fn new(department: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            department: Department(department.into()),
            user_id: UserId(user_id.into()),
        }
    }
}

impl RecordKey {
    /// Both halves become backend path segments, so blank values and dot
    /// segments (including their `%2e` spellings) are refused.
    pub fn validate(&self) -> Result<(), InvalidRecordKey> {
        for (field, value) in [
            ("department", &self.department.0),
            ("user id", &self.user_id.0),
        ] {
            let dots = value.to_ascii_lowercase().replace("%2e", ".");
            if value.trim().is_empty() || dots == "." || dots == ".." {
                return Err(InvalidRecordKey {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {field}")]
pub struct InvalidRecordKey {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.department.0, self.user_id.0)
    }
}

/// Independently submitted sections of the appraisal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartLetter {
    A,
    B,
    D,
    E,
}

impl PartLetter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::D => "D",
            Self::E => "E",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::A => "Academic Involvement",
            Self::B => "Research Verification",
            Self::D => "Portfolio",
            Self::E => "Extra Contributions",
        }
    }

    /// The authority whose edits the part's lock state governs.
    pub const fn primary_authority(self) -> MarkAuthority {
        match self {
            Self::B => MarkAuthority::Verification,
            Self::A | Self::D | Self::E => MarkAuthority::SelfAssessment,
        }
    }
}

impl fmt::Display for PartLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartLetter {
    type Err = UnknownPart;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "D" | "d" => Ok(Self::D),
            "E" | "e" => Ok(Self::E),
            other => Err(UnknownPart(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appraisal part '{0}'")]
pub struct UnknownPart(pub String);

/// Workflow status reported by the backend's `get-status` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FormStatus {
    Pending,
    Submitted,
    SentToDirector,
    Reviewed,
    InProgress,
    VerificationPending,
    AuthorityVerificationPending,
    InteractionPending,
    Verified,
    Done,
}

impl FormStatus {
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::SentToDirector => "SentToDirector",
            Self::Reviewed => "reviewed",
            Self::InProgress => "in_progress",
            Self::VerificationPending => "verification_pending",
            Self::AuthorityVerificationPending => "authority_verification_pending",
            Self::InteractionPending => "interaction_pending",
            Self::Verified => "verified",
            Self::Done => "done",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Submitted => "Submitted",
            Self::SentToDirector => "Sent to Director",
            Self::Reviewed => "Reviewed",
            Self::InProgress => "In Progress",
            Self::VerificationPending => "Verification Pending",
            Self::AuthorityVerificationPending => "Authority Verification Pending",
            Self::InteractionPending => "Interaction Pending",
            Self::Verified => "Verified",
            Self::Done => "Done",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FormStatus {
    type Err = UnrecognizedStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let status = match normalized.as_str() {
            "pending" => Self::Pending,
            "submitted" => Self::Submitted,
            "senttodirector" | "sent_to_director" => Self::SentToDirector,
            "reviewed" => Self::Reviewed,
            "in_progress" => Self::InProgress,
            "verification_pending" => Self::VerificationPending,
            "authority_verification_pending" => Self::AuthorityVerificationPending,
            "interaction_pending" => Self::InteractionPending,
            "verified" => Self::Verified,
            "done" => Self::Done,
            _ => return Err(UnrecognizedStatus(value.to_string())),
        };
        Ok(status)
    }
}

impl TryFrom<String> for FormStatus {
    type Error = UnrecognizedStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormStatus> for String {
    fn from(value: FormStatus) -> Self {
        value.wire_name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized form status '{0}'")]
pub struct UnrecognizedStatus(pub String);

/// Faculty designation driving the Part A role weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Designation {
    Professor,
    AssociateProfessor,
    AssistantProfessor,
    /// Any designation outside the weighting table, kept verbatim.
    Unlisted(String),
}

impl Designation {
    pub fn parse(value: &str) -> Self {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "professor" => Self::Professor,
            "associate professor" => Self::AssociateProfessor,
            "assistant professor" => Self::AssistantProfessor,
            _ => Self::Unlisted(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Professor => "Professor",
            Self::AssociateProfessor => "Associate Professor",
            Self::AssistantProfessor => "Assistant Professor",
            Self::Unlisted(raw) => raw,
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, Self::Unlisted(_))
    }
}

impl From<String> for Designation {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Designation> for String {
    fn from(value: Designation) -> Self {
        value.as_str().to_string()
    }
}

/// Who may write a given class of marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkAuthority {
    SelfAssessment,
    Hod,
    Dean,
    Director,
    AssociateDean,
    Verification,
    Interaction,
}

impl MarkAuthority {
    pub fn permits(self, role: Role) -> bool {
        match self {
            Self::SelfAssessment => matches!(
                role,
                Role::Faculty | Role::Hod | Role::Dean | Role::AssociateDean | Role::Director
            ),
            Self::Hod => role == Role::Hod,
            Self::Dean => role == Role::Dean,
            Self::Director => role == Role::Director,
            Self::AssociateDean => role == Role::AssociateDean,
            Self::Verification => role == Role::VerificationTeam,
            Self::Interaction => matches!(role, Role::External | Role::CollegeExternal),
        }
    }

    /// The superior-mark authority a role holds over Part D, if any.
    pub fn superior_for(role: Role) -> Option<Self> {
        match role {
            Role::Hod => Some(Self::Hod),
            Role::Dean => Some(Self::Dean),
            Role::Director => Some(Self::Director),
            Role::AssociateDean => Some(Self::AssociateDean),
            _ => None,
        }
    }
}

impl fmt::Display for MarkAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SelfAssessment => "self assessment",
            Self::Hod => "HOD",
            Self::Dean => "Dean",
            Self::Director => "Director",
            Self::AssociateDean => "Associate Dean",
            Self::Verification => "verification",
            Self::Interaction => "interaction",
        };
        f.write_str(label)
    }
}
