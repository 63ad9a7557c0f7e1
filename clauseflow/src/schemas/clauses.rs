//! Clause extraction records.

use super::de;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed clause classification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClauseCategory {
    /// Payment obligations, fees, penalties.
    #[serde(rename = "Financial Terms")]
    Financial,
    /// Non-disclosure, data protection, trade secrets.
    #[serde(rename = "Confidentiality & NDA")]
    Confidentiality,
    /// Exit clauses, renewals, breach consequences.
    #[serde(rename = "Termination & Breach")]
    Termination,
    /// Risk allocation, damages, liability caps.
    #[serde(rename = "Indemnification & Liability")]
    Indemnification,
    /// Arbitration, jurisdiction, governing law.
    #[serde(rename = "Dispute Resolution & Governing Law")]
    DisputeResolution,
    /// Ownership, IP, exclusivity, non-compete.
    #[serde(rename = "Rights & Restrictions")]
    Rights,
    /// Anything else.
    #[serde(rename = "Miscellaneous")]
    Miscellaneous,
}

impl ClauseCategory {
    /// All categories in presentation order.
    pub const ALL: [Self; 7] = [
        Self::Financial,
        Self::Confidentiality,
        Self::Termination,
        Self::Indemnification,
        Self::DisputeResolution,
        Self::Rights,
        Self::Miscellaneous,
    ];

    /// The category label used in prompts and replies.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Financial => "Financial Terms",
            Self::Confidentiality => "Confidentiality & NDA",
            Self::Termination => "Termination & Breach",
            Self::Indemnification => "Indemnification & Liability",
            Self::DisputeResolution => "Dispute Resolution & Governing Law",
            Self::Rights => "Rights & Restrictions",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// Maps a free-form label onto a category.
    ///
    /// Exact labels match case-insensitively; otherwise the label is matched
    /// on keywords, and anything unrecognized is `Miscellaneous`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if let Some(exact) = Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(&lower))
        {
            return exact;
        }

        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has(&["payment", "financial", "fee", "compensation", "penalt", "price"]) {
            Self::Financial
        } else if has(&["confidential", "nda", "non-disclosure", "data protection", "secret"]) {
            Self::Confidentiality
        } else if has(&["terminat", "breach", "renewal", "exit"]) {
            Self::Termination
        } else if has(&["indemn", "liabilit", "damages", "warrant"]) {
            Self::Indemnification
        } else if has(&["dispute", "governing", "arbitration", "jurisdiction", "mediation"]) {
            Self::DisputeResolution
        } else if has(&["rights", "restrict", "intellectual", "licens", "exclusiv", "compete"]) {
            Self::Rights
        } else {
            Self::Miscellaneous
        }
    }
}

impl fmt::Display for ClauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One clause found in the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Classification label as the model gave it.
    #[serde(
        default,
        alias = "clause_category",
        alias = "category",
        deserialize_with = "de::text"
    )]
    pub clause_type: String,
    /// Section the clause appears under.
    #[serde(default, alias = "section", deserialize_with = "de::opt_string")]
    pub section_name: Option<String>,
    /// The clause wording.
    #[serde(default, alias = "clause_text", deserialize_with = "de::text")]
    pub text: String,
    /// Where the clause sits in the document, e.g. "Section 4.2".
    #[serde(default, deserialize_with = "de::opt_string")]
    pub location: Option<String>,
    /// Dates the clause refers to.
    #[serde(default, deserialize_with = "de::string_list")]
    pub related_dates: Vec<String>,
    /// Monetary amounts the clause refers to.
    #[serde(default, alias = "related_amounts", deserialize_with = "de::string_list")]
    pub amounts: Vec<String>,
    /// Model confidence in `[0, 1]`.
    #[serde(default, alias = "confidence_score", deserialize_with = "de::opt_f64")]
    pub confidence: Option<f64>,
    /// Review warnings for this clause.
    #[serde(default, alias = "warning", deserialize_with = "de::string_list")]
    pub warnings: Vec<String>,
}

impl Clause {
    /// Creates a clause with only type and text set.
    #[must_use]
    pub fn new(clause_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            clause_type: clause_type.into(),
            section_name: None,
            text: text.into(),
            location: None,
            related_dates: Vec::new(),
            amounts: Vec::new(),
            confidence: None,
            warnings: Vec::new(),
        }
    }

    /// The clause's category, derived from its type label.
    #[must_use]
    pub fn category(&self) -> ClauseCategory {
        ClauseCategory::from_label(&self.clause_type)
    }
}

/// Ordered clauses produced by the ClauseExtraction stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseSet {
    /// Clauses in document order.
    pub clauses: Vec<Clause>,
}

impl ClauseSet {
    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if no clause was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses that fall in the given category.
    pub fn in_category(&self, category: ClauseCategory) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.category() == category)
    }

    /// All amounts mentioned by any clause, first occurrence order, no repeats.
    #[must_use]
    pub fn amounts(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for amount in self.clauses.iter().flat_map(|c| &c.amounts) {
            if !out.contains(amount) {
                out.push(amount.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_from_exact_label() {
        assert_eq!(ClauseCategory::from_label("Termination & Breach"), ClauseCategory::Termination);
        assert_eq!(ClauseCategory::from_label("financial terms"), ClauseCategory::Financial);
    }

    #[test]
    fn test_category_from_keywords() {
        assert_eq!(ClauseCategory::from_label("Payment Obligations"), ClauseCategory::Financial);
        assert_eq!(ClauseCategory::from_label("Governing Law"), ClauseCategory::DisputeResolution);
        assert_eq!(ClauseCategory::from_label("Non-Compete"), ClauseCategory::Rights);
        assert_eq!(ClauseCategory::from_label("Force Majeure"), ClauseCategory::Miscellaneous);
        assert_eq!(ClauseCategory::from_label(""), ClauseCategory::Miscellaneous);
    }

    #[test]
    fn test_clause_aliases() {
        let json = r#"{
            "clause_category": "Financial Terms",
            "clause_text": "Client shall pay $50,000 within 30 days.",
            "related_amounts": ["$50,000"],
            "confidence_score": "0.95",
            "warning": "Late fee not specified"
        }"#;
        let clause: Clause = serde_json::from_str(json).unwrap();

        assert_eq!(clause.category(), ClauseCategory::Financial);
        assert_eq!(clause.amounts, vec!["$50,000"]);
        assert_eq!(clause.confidence, Some(0.95));
        assert_eq!(clause.warnings, vec!["Late fee not specified"]);
    }

    #[test]
    fn test_clause_set_amounts_dedupe() {
        let mut a = Clause::new("Financial Terms", "Pay $10.");
        a.amounts = vec!["$10".to_string(), "$20".to_string()];
        let mut b = Clause::new("Termination & Breach", "Pay $10 on exit.");
        b.amounts = vec!["$10".to_string()];
        let set = ClauseSet { clauses: vec![a, b] };

        assert_eq!(set.amounts(), vec!["$10", "$20"]);
        assert_eq!(set.in_category(ClauseCategory::Termination).count(), 1);
    }

    #[test]
    fn test_clause_set_requires_clauses_key() {
        assert!(serde_json::from_str::<ClauseSet>("{}").is_err());
    }
}
