use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minister {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "ministre_de_rattachement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attached_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    pub government: String,
}

impl Display for Minister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(party) = &self.party {
            write!(f, " ({})", party)?;
        }
        if let Some(title) = &self.title {
            write!(f, ", {}", title)?;
        }
        if let Some(attached_to) = &self.attached_to {
            write!(f, ", auprès de {}", attached_to)?;
        }
        write!(f, " [{}]", self.government)
    }
}

/// A link from one government's page to another's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Succession {
    pub from: String,
    pub to: String,
}

/// Everything read from a single government page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernmentPage {
    pub government: String,
    pub url: String,
    pub ministers: Vec<Minister>,
    /// Other government pages linked from the infobox.
    pub related: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernmentCatalog {
    pub ministers: Vec<Minister>,
    pub successions: Vec<Succession>,
}

impl Display for GovernmentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for minister in &self.ministers {
            writeln!(f, "  {}", minister)?;
        }
        for succession in &self.successions {
            writeln!(f, "  {} → {}", succession.from, succession.to)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minister_field_names() {
        let minister = Minister {
            name: "Nadia Fettah Alaoui".into(),
            title: None,
            attached_to: Some("Ministre de l'Économie et des Finances".into()),
            party: Some("RNI".into()),
            government: "Akhannouch II".into(),
        };
        assert_eq!(
            serde_json::to_value(&minister).unwrap(),
            json!({
                "name": "Nadia Fettah Alaoui",
                "ministre_de_rattachement": "Ministre de l'Économie et des Finances",
                "party": "RNI",
                "government": "Akhannouch II",
            })
        );
    }
}
