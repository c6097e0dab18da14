use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::types::ListingEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawType {
    Projets,
    Propositions,
    Adopted,
}

impl LawType {
    pub const ALL: [LawType; 3] = [LawType::Projets, LawType::Propositions, LawType::Adopted];

    /// Key used for this category in output files.
    pub fn category(&self) -> &'static str {
        match self {
            LawType::Projets => "projets_de_loi",
            LawType::Propositions => "propositions_de_loi",
            LawType::Adopted => "textes_de_loi",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            LawType::Projets => "projets",
            LawType::Propositions => "propositions",
            LawType::Adopted => "adopted",
        }
    }
}

impl Display for LawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LawType::Projets => write!(f, "Projets de loi"),
            LawType::Propositions => write!(f, "Propositions de loi"),
            LawType::Adopted => write!(f, "Textes adoptés"),
        }
    }
}

impl FromStr for LawType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "projets" | "projets_de_loi" => Ok(LawType::Projets),
            "propositions" | "propositions_de_loi" => Ok(LawType::Propositions),
            "adopted" | "textes" | "textes_de_loi" => Ok(LawType::Adopted),
            _ => Err(format!(
                "Unknown category '{s}' (expected projets, propositions or adopted)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VoteTallyRepr", into = "VoteTallyRepr")]
pub enum VoteTally {
    Unanimous,
    Counted {
        yes: Option<u32>,
        no: Option<u32>,
        abstain: Option<u32>,
        outcome: Option<Outcome>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VoteTallyRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unanimous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    yes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    no: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    abstain: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
}

impl From<VoteTally> for VoteTallyRepr {
    fn from(tally: VoteTally) -> Self {
        match tally {
            VoteTally::Unanimous => VoteTallyRepr {
                unanimous: Some(true),
                ..Default::default()
            },
            VoteTally::Counted {
                yes,
                no,
                abstain,
                outcome,
            } => VoteTallyRepr {
                unanimous: None,
                yes,
                no,
                abstain,
                outcome,
            },
        }
    }
}

impl From<VoteTallyRepr> for VoteTally {
    fn from(repr: VoteTallyRepr) -> Self {
        if repr.unanimous == Some(true) {
            return VoteTally::Unanimous;
        }
        VoteTally::Counted {
            yes: repr.yes,
            no: repr.no,
            abstain: repr.abstain,
            outcome: repr.outcome,
        }
    }
}

impl Display for VoteTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteTally::Unanimous => write!(f, "unanimous"),
            VoteTally::Counted {
                yes,
                no,
                abstain,
                outcome,
            } => {
                let count = |n: &Option<u32>| n.map_or("?".to_string(), |n| n.to_string());
                write!(f, "{}/{}/{}", count(yes), count(no), count(abstain))?;
                if let Some(outcome) = outcome {
                    write!(f, " ({outcome:?})")?;
                }
                Ok(())
            }
        }
    }
}

/// The kind of procedural block found inside a reading section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCategory {
    ChamberOffice,
    Committee,
    PlenarySession,
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteTally>,
}

impl Reading {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            deposit_date: None,
            commission: None,
            vote: None,
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stage)?;
        if let Some(date) = &self.deposit_date {
            write!(f, " | deposited {}", date)?;
        }
        if let Some(commission) = &self.commission {
            write!(f, " | {}", commission)?;
        }
        if let Some(vote) = &self.vote {
            write!(f, " | vote {}", vote)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawRecord {
    #[serde(rename = "type")]
    pub law_type: LawType,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legislature_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl LawRecord {
    pub fn from_entry(law_type: LawType, entry: ListingEntry) -> Self {
        Self {
            law_type,
            title: entry.title,
            url: entry.detail_url,
            readings: Vec::new(),
            legislature_period: None,
            commission: None,
            date: None,
        }
    }
}

impl Display for LawRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ [{}] {}", self.law_type.slug(), self.title)?;
        if let Some(period) = &self.legislature_period {
            writeln!(f, "│  Legislature: {}", period)?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "│  Date: {}", date)?;
        }
        if let Some(commission) = &self.commission {
            writeln!(f, "│  Commission: {}", commission)?;
        }
        for reading in &self.readings {
            writeln!(f, "│  ▸ {}", reading)?;
        }
        write!(f, "└─ {}", self.url)
    }
}

/// Menu links to the three legislation listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegislationLinks {
    pub projets: Option<String>,
    pub propositions: Option<String>,
    pub adopted: Option<String>,
}

impl LegislationLinks {
    pub fn get(&self, law_type: LawType) -> Option<&str> {
        match law_type {
            LawType::Projets => self.projets.as_deref(),
            LawType::Propositions => self.propositions.as_deref(),
            LawType::Adopted => self.adopted.as_deref(),
        }
    }

    pub(crate) fn slot(&mut self, law_type: LawType) -> &mut Option<String> {
        match law_type {
            LawType::Projets => &mut self.projets,
            LawType::Propositions => &mut self.propositions,
            LawType::Adopted => &mut self.adopted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegislaturePeriod {
    pub label: String,
    pub url: String,
}

/// Every category collected in a run, keyed the way the output files are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislationCatalog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projets_de_loi: Vec<LawRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub propositions_de_loi: Vec<LawRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textes_de_loi: Vec<LawRecord>,
}

impl LegislationCatalog {
    pub fn get(&self, law_type: LawType) -> &[LawRecord] {
        match law_type {
            LawType::Projets => &self.projets_de_loi,
            LawType::Propositions => &self.propositions_de_loi,
            LawType::Adopted => &self.textes_de_loi,
        }
    }

    pub fn insert(&mut self, law_type: LawType, records: Vec<LawRecord>) {
        match law_type {
            LawType::Projets => self.projets_de_loi = records,
            LawType::Propositions => self.propositions_de_loi = records,
            LawType::Adopted => self.textes_de_loi = records,
        }
    }

    pub fn is_empty(&self) -> bool {
        LawType::ALL.iter().all(|t| self.get(*t).is_empty())
    }

    pub fn len(&self) -> usize {
        LawType::ALL.iter().map(|t| self.get(*t).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_law() -> LawRecord {
        LawRecord {
            law_type: LawType::Projets,
            title: "مشروع قانون رقم 12.34".into(),
            url: "https://www.chambredesrepresentants.ma/ar/law-1".into(),
            readings: vec![
                Reading {
                    stage: "القراءة الأولى".into(),
                    deposit_date: Some("12/01/2024".into()),
                    commission: Some("العدل والتشريع".into()),
                    vote: Some(VoteTally::Unanimous),
                },
                Reading {
                    stage: "القراءة الثانية".into(),
                    deposit_date: None,
                    commission: None,
                    vote: Some(VoteTally::Counted {
                        yes: Some(120),
                        no: Some(30),
                        abstain: Some(0),
                        outcome: Some(Outcome::Approved),
                    }),
                },
                Reading::new("قراءة بدون معطيات"),
            ],
            legislature_period: None,
            commission: None,
            date: None,
        }
    }

    #[test]
    fn test_vote_tally_serialization_shape() {
        assert_eq!(
            serde_json::to_value(VoteTally::Unanimous).unwrap(),
            json!({"unanimous": true})
        );
        assert_eq!(
            serde_json::to_value(VoteTally::Counted {
                yes: Some(120),
                no: None,
                abstain: Some(0),
                outcome: Some(Outcome::Rejected),
            })
            .unwrap(),
            json!({"yes": 120, "abstain": 0, "outcome": "rejected"})
        );
    }

    #[test]
    fn test_law_record_json_round_trip() {
        let law = sample_law();
        let json = serde_json::to_string_pretty(&law).unwrap();

        assert!(json.contains("\"type\": \"projets\""));
        assert!(json.contains("القراءة الأولى"), "Arabic must not be escaped");

        let back: LawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, law);
        assert_eq!(back.readings[1].stage, "القراءة الثانية");
    }

    #[test]
    fn test_law_record_without_readings_keeps_empty_list() {
        let entry = ListingEntry {
            title: "مشروع قانون رقم 10.24".into(),
            detail_url: "https://www.chambredesrepresentants.ma/ar/law-2".into(),
        };
        let law = LawRecord::from_entry(LawType::Projets, entry);

        let value = serde_json::to_value(&law).unwrap();
        assert_eq!(value["readings"], json!([]));
        assert!(value.get("commission").is_none());
        assert!(value.get("date").is_none());
    }

    #[test]
    fn test_catalog_skips_empty_categories() {
        let mut catalog = LegislationCatalog::default();
        assert!(catalog.is_empty());
        catalog.insert(LawType::Projets, vec![sample_law()]);

        let value = serde_json::to_value(&catalog).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["projets_de_loi"]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_law_type_from_str() {
        assert_eq!("projets".parse::<LawType>(), Ok(LawType::Projets));
        assert_eq!("textes-de-loi".parse::<LawType>(), Ok(LawType::Adopted));
        assert_eq!("Propositions".parse::<LawType>(), Ok(LawType::Propositions));
        assert!("ministers".parse::<LawType>().is_err());
    }
}
