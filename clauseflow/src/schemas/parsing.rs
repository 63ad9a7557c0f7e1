//! Document parsing record.

use super::de;
use serde::{Deserialize, Serialize};

/// A party to the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party name as written in the contract.
    #[serde(alias = "name", deserialize_with = "de::text")]
    pub party_name: String,
    /// Role such as "Client" or "Service Provider".
    #[serde(default, deserialize_with = "de::opt_string")]
    pub role: Option<String>,
}

impl Party {
    /// Creates a party.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Option<&str>) -> Self {
        Self {
            party_name: name.into(),
            role: role.map(str::to_string),
        }
    }

    fn key(&self) -> (String, String) {
        (
            self.party_name.trim().to_lowercase(),
            self.role.as_deref().unwrap_or_default().trim().to_lowercase(),
        )
    }
}

/// Metadata and outline of a contract, produced by the Parsing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Contract title.
    #[serde(default, alias = "title", deserialize_with = "de::opt_string")]
    pub contract_title: Option<String>,
    /// Contract date, as written.
    #[serde(default, alias = "date", deserialize_with = "de::opt_string")]
    pub contract_date: Option<String>,
    /// Parties named in the contract.
    #[serde(default, alias = "parties")]
    pub parties_involved: Vec<Party>,
    /// Section headings in document order.
    #[serde(default, deserialize_with = "de::string_list")]
    pub sections: Vec<String>,
    /// Things the model flagged for human review.
    #[serde(default, deserialize_with = "de::string_list")]
    pub warnings: Vec<String>,
}

impl ParsedDocument {
    /// Folds another partial parse into this one.
    ///
    /// The first non-empty title and date win. Parties are deduplicated on a
    /// case-insensitive name and role. Sections keep first-seen order without
    /// repeats; warnings are concatenated.
    pub fn merge(&mut self, other: Self) {
        if self.contract_title.is_none() {
            self.contract_title = other.contract_title;
        }
        if self.contract_date.is_none() {
            self.contract_date = other.contract_date;
        }
        for party in other.parties_involved {
            if party.party_name.trim().is_empty() {
                continue;
            }
            if !self.parties_involved.iter().any(|p| p.key() == party.key()) {
                self.parties_involved.push(party);
            }
        }
        for section in other.sections {
            if !self.sections.contains(&section) {
                self.sections.push(section);
            }
        }
        self.warnings.extend(other.warnings);
    }

    /// Returns true if nothing at all was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contract_title.is_none()
            && self.contract_date.is_none()
            && self.parties_involved.is_empty()
            && self.sections.is_empty()
    }
}
