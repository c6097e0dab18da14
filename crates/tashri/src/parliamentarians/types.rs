use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parliamentarian {
    pub name: String,
    pub party: String,
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
}

impl Display for Parliamentarian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.party)?;
        if !self.function.is_empty() {
            write!(f, " - {}", self.function)?;
        }
        if let Some(term) = &self.term {
            write!(f, " [{}]", term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_term_is_omitted_when_absent() {
        let member = Parliamentarian {
            name: "رشيد الطالبي العلمي".into(),
            party: "التجمع الوطني للأحرار".into(),
            function: "رئيس مجلس النواب".into(),
            term: None,
        };
        assert_eq!(
            serde_json::to_value(&member).unwrap(),
            json!({
                "name": "رشيد الطالبي العلمي",
                "party": "التجمع الوطني للأحرار",
                "function": "رئيس مجلس النواب",
            })
        );

        let stamped = Parliamentarian {
            term: Some("2021-2026".into()),
            ..member
        };
        assert_eq!(
            stamped.to_string(),
            "رشيد الطالبي العلمي (التجمع الوطني للأحرار) - رئيس مجلس النواب [2021-2026]"
        );
    }
}
