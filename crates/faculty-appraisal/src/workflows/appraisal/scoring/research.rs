use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{integer_from_json, parse_int_prefix, MarkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchSection {
    Journals,
    Conference,
    Books,
    Citations,
    Ip,
    Grants,
    Startups,
}

impl ResearchSection {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Journals => "Journal Papers",
            Self::Conference => "Conference Papers",
            Self::Books => "Books & Book Chapters",
            Self::Citations => "Citations",
            Self::Ip => "Intellectual Property",
            Self::Grants => "Research Grants & Revenue",
            Self::Startups => "Products, Startups & Awards",
        }
    }
}

/// Claimable research categories, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchCategory {
    Sci,
    Esci,
    Scopus,
    Ugc,
    OtherJournal,
    ConfInternational,
    ConfNational,
    BookAuthored,
    BookEdited,
    BookChapter,
    CitationWos,
    CitationScopus,
    CitationGoogle,
    CopyrightIndividual,
    CopyrightInstitute,
    PatentIndividual,
    PatentInstitute,
    ResearchGrant,
    TrainingRevenue,
    NonResearchGrant,
    Products,
    Startups,
    Awards,
    Mou,
    IndustryAssociation,
}

impl ResearchCategory {
    pub const ALL: [Self; 25] = [
        Self::Sci,
        Self::Esci,
        Self::Scopus,
        Self::Ugc,
        Self::OtherJournal,
        Self::ConfInternational,
        Self::ConfNational,
        Self::BookAuthored,
        Self::BookEdited,
        Self::BookChapter,
        Self::CitationWos,
        Self::CitationScopus,
        Self::CitationGoogle,
        Self::CopyrightIndividual,
        Self::CopyrightInstitute,
        Self::PatentIndividual,
        Self::PatentInstitute,
        Self::ResearchGrant,
        Self::TrainingRevenue,
        Self::NonResearchGrant,
        Self::Products,
        Self::Startups,
        Self::Awards,
        Self::Mou,
        Self::IndustryAssociation,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Sci => "sci",
            Self::Esci => "esci",
            Self::Scopus => "scopus",
            Self::Ugc => "ugc",
            Self::OtherJournal => "other_journal",
            Self::ConfInternational => "conf_international",
            Self::ConfNational => "conf_national",
            Self::BookAuthored => "book_authored",
            Self::BookEdited => "book_edited",
            Self::BookChapter => "book_chapter",
            Self::CitationWos => "citation_wos",
            Self::CitationScopus => "citation_scopus",
            Self::CitationGoogle => "citation_google",
            Self::CopyrightIndividual => "copyright_individual",
            Self::CopyrightInstitute => "copyright_institute",
            Self::PatentIndividual => "patent_individual",
            Self::PatentInstitute => "patent_institute",
            Self::ResearchGrant => "research_grant",
            Self::TrainingRevenue => "training_revenue",
            Self::NonResearchGrant => "non_research_grant",
            Self::Products => "products",
            Self::Startups => "startups",
            Self::Awards => "awards",
            Self::Mou => "mou",
            Self::IndustryAssociation => "industry_association",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sci => "SCI / SCI-E Indexed",
            Self::Esci => "ESCI Indexed",
            Self::Scopus => "Scopus Indexed",
            Self::Ugc => "UGC Listed",
            Self::OtherJournal => "Other Journals",
            Self::ConfInternational => "International Conference",
            Self::ConfNational => "National Conference",
            Self::BookAuthored => "Books Authored",
            Self::BookEdited => "Books Edited",
            Self::BookChapter => "Book Chapters",
            Self::CitationWos => "Web of Science Citations",
            Self::CitationScopus => "Scopus Citations",
            Self::CitationGoogle => "Google Scholar Citations",
            Self::CopyrightIndividual => "Copyright - Individual",
            Self::CopyrightInstitute => "Copyright - Institute",
            Self::PatentIndividual => "Patent - Individual",
            Self::PatentInstitute => "Patent - Institute",
            Self::ResearchGrant => "Research Grants",
            Self::TrainingRevenue => "Training Revenue",
            Self::NonResearchGrant => "Non-Research Grants",
            Self::Products => "Products Developed",
            Self::Startups => "Startups Founded",
            Self::Awards => "Awards & Fellowships",
            Self::Mou => "MoUs Signed",
            Self::IndustryAssociation => "Industry Association Activities",
        }
    }

    pub const fn section(self) -> ResearchSection {
        match self {
            Self::Sci | Self::Esci | Self::Scopus | Self::Ugc | Self::OtherJournal => {
                ResearchSection::Journals
            }
            Self::ConfInternational | Self::ConfNational => ResearchSection::Conference,
            Self::BookAuthored | Self::BookEdited | Self::BookChapter => ResearchSection::Books,
            Self::CitationWos | Self::CitationScopus | Self::CitationGoogle => {
                ResearchSection::Citations
            }
            Self::CopyrightIndividual
            | Self::CopyrightInstitute
            | Self::PatentIndividual
            | Self::PatentInstitute => ResearchSection::Ip,
            Self::ResearchGrant | Self::TrainingRevenue | Self::NonResearchGrant => {
                ResearchSection::Grants
            }
            Self::Products | Self::Startups | Self::Awards | Self::Mou | Self::IndustryAssociation => {
                ResearchSection::Startups
            }
        }
    }
}

impl FromStr for ResearchCategory {
    type Err = MarkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.key() == value)
            .ok_or_else(|| MarkError::UnknownCategory(value.to_string()))
    }
}

/// Blank or unparsable input counts as zero and negatives are floored at zero.
pub fn parse_verified(raw: &str) -> u32 {
    clamp_count(parse_int_prefix(raw))
}

fn clamp_count(value: Option<i64>) -> u32 {
    value
        .map(|count| count.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationEntry {
    pub claimed: u32,
    pub proof_url: String,
    /// `None` until the verification team enters a value.
    pub verified: Option<u32>,
}

/// Claimed versus verified totals for one research section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionTotal {
    pub section: ResearchSection,
    pub label: &'static str,
    pub claimed: u32,
    pub verified: u32,
}

/// Part B worksheet: backend-supplied claims with verification counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationSheet {
    entries: BTreeMap<ResearchCategory, VerificationEntry>,
}

impl Default for VerificationSheet {
    fn default() -> Self {
        Self::blank()
    }
}

impl VerificationSheet {
    pub fn blank() -> Self {
        let entries = ResearchCategory::ALL
            .into_iter()
            .map(|category| (category, VerificationEntry::default()))
            .collect();
        Self { entries }
    }

    /// Builds the sheet from a stored Part B record. Each category may be a
    /// bare claimed count or an object with `claimed`, `proofUrl` and
    /// `verified`. Unknown keys are ignored.
    pub fn from_record(record: &Value) -> Self {
        let mut sheet = Self::blank();
        let Some(object) = record.as_object() else {
            return sheet;
        };

        for (key, value) in object {
            let Ok(category) = key.parse::<ResearchCategory>() else {
                continue;
            };
            let entry = sheet.entries.entry(category).or_default();
            match value {
                Value::Object(fields) => {
                    entry.claimed = clamp_count(
                        fields
                            .get("claimed")
                            .or_else(|| fields.get("count"))
                            .and_then(integer_from_json),
                    );
                    entry.proof_url = fields
                        .get("proofUrl")
                        .or_else(|| fields.get("proof_url"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    entry.verified = fields
                        .get("verified")
                        .and_then(integer_from_json)
                        .map(|count| clamp_count(Some(count)));
                }
                other => entry.claimed = clamp_count(integer_from_json(other)),
            }
        }
        sheet
    }

    pub fn entry(&self, category: ResearchCategory) -> Option<&VerificationEntry> {
        self.entries.get(&category)
    }

    /// Records verification input for each key. Claimed counts are never
    /// touched; unknown keys are refused before anything is applied.
    pub fn apply_verified(&mut self, input: &BTreeMap<String, Value>) -> Result<(), MarkError> {
        let parsed = input
            .iter()
            .map(|(key, value)| {
                let category = key.parse::<ResearchCategory>()?;
                let count = match value {
                    Value::Null => None,
                    Value::String(raw) if raw.trim().is_empty() => None,
                    other => Some(clamp_count(integer_from_json(other))),
                };
                Ok((category, count))
            })
            .collect::<Result<Vec<_>, MarkError>>()?;

        for (category, count) in parsed {
            if let Some(entry) = self.entries.get_mut(&category) {
                entry.verified = count;
            }
        }
        Ok(())
    }

    /// Flat `key -> verified` mapping covering every category; blanks are 0.
    pub fn submission_payload(&self) -> BTreeMap<&'static str, u32> {
        self.entries
            .iter()
            .map(|(category, entry)| (category.key(), entry.verified.unwrap_or(0)))
            .collect()
    }

    pub fn section_totals(&self) -> Vec<SectionTotal> {
        let mut totals: BTreeMap<ResearchSection, (u32, u32)> = BTreeMap::new();
        for (category, entry) in &self.entries {
            let slot = totals.entry(category.section()).or_default();
            slot.0 = slot.0.saturating_add(entry.claimed);
            slot.1 = slot.1.saturating_add(entry.verified.unwrap_or(0));
        }

        totals
            .into_iter()
            .map(|(section, (claimed, verified))| SectionTotal {
                section,
                label: section.title(),
                claimed,
                verified,
            })
            .collect()
    }
}
