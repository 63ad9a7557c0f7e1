//! The combined contract report.

use crate::schemas::{
    Clause, ClauseSuggestion, Entity, Party, RiskLevel, StageResult,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Outcome of processing one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Every stage completed.
    Success,
    /// A stage failed.
    Error,
}

/// Everything the pipeline learned about a contract, in one record.
///
/// Fields belonging to stages that did not complete are left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractReport {
    /// Source file or upload name.
    pub source_name: Option<String>,
    /// Contract title.
    pub contract_title: Option<String>,
    /// Contract date.
    pub contract_date: Option<String>,
    /// Parties and roles.
    pub parties_involved: Vec<Party>,
    /// Extracted clauses.
    pub clauses: Vec<Clause>,
    /// Recognized entities.
    pub entities: Vec<Entity>,
    /// Wording suggestions.
    pub suggestions: Vec<ClauseSuggestion>,
    /// Summary text.
    pub summary: Option<String>,
    /// Overall risk rating.
    pub risk_level: Option<RiskLevel>,
    /// Monetary amounts from clauses and MONEY entities, without repeats.
    pub amounts: Vec<String>,
    /// Review warnings from parsing and extraction, plus flagged terms.
    pub warnings: Vec<String>,
}

impl ContractReport {
    /// Builds the report from whatever results exist.
    #[must_use]
    pub fn from_results(source_name: Option<&str>, results: &[StageResult]) -> Self {
        let mut report = Self {
            source_name: source_name.map(str::to_string),
            ..Self::default()
        };

        for result in results {
            match result {
                StageResult::Parsing(parsed) => {
                    report.contract_title.clone_from(&parsed.contract_title);
                    report.contract_date.clone_from(&parsed.contract_date);
                    report.parties_involved.clone_from(&parsed.parties_involved);
                    report.warnings.extend(parsed.warnings.iter().cloned());
                }
                StageResult::ClauseExtraction(set) => {
                    report.clauses.clone_from(&set.clauses);
                    report.amounts.extend(set.amounts());
                    for clause in &set.clauses {
                        report.warnings.extend(clause.warnings.iter().cloned());
                    }
                }
                StageResult::Ner(set) => {
                    report.entities.clone_from(&set.entities);
                    report
                        .amounts
                        .extend(set.of_type("MONEY").map(|e| e.value.clone()));
                }
                StageResult::ClauseGeneration(set) => {
                    report.suggestions.clone_from(&set.suggestions);
                }
                StageResult::Summarization(summary) => {
                    report.summary = Some(summary.summary.clone());
                    report.risk_level = summary.risk_level;
                    report.warnings.extend(summary.flagged_terms.iter().cloned());
                }
            }
        }

        report.amounts = dedupe(std::mem::take(&mut report.amounts));
        report.warnings = dedupe(std::mem::take(&mut report.warnings));
        report
    }
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Status envelope around a [`ContractReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResponse {
    /// Success or error.
    pub status: ProcessingStatus,
    /// Failure message, for failed runs.
    pub error: Option<String>,
    /// The report. Partial for failed runs; absent if nothing completed.
    pub document: Option<ContractReport>,
}

impl ProcessingResponse {
    /// A successful response.
    #[must_use]
    pub fn success(document: Option<ContractReport>) -> Self {
        Self {
            status: ProcessingStatus::Success,
            error: None,
            document,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn error(message: impl Into<String>, document: Option<ContractReport>) -> Self {
        Self {
            status: ProcessingStatus::Error,
            error: Some(message.into()),
            document,
        }
    }

    /// Returns true for successful runs.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }

    /// Plain-text rendering for terminals.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Processing failed: {error}\n");
        }
        let Some(report) = &self.document else {
            return out;
        };

        let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".to_string());
        if let Some(source) = &report.source_name {
            let _ = writeln!(out, "Source: {source}");
        }
        let _ = writeln!(out, "Title:  {}", or_unknown(&report.contract_title));
        let _ = writeln!(out, "Date:   {}", or_unknown(&report.contract_date));

        if !report.parties_involved.is_empty() {
            let _ = writeln!(out, "\nParties:");
            for party in &report.parties_involved {
                match &party.role {
                    Some(role) => {
                        let _ = writeln!(out, "  - {} ({role})", party.party_name);
                    }
                    None => {
                        let _ = writeln!(out, "  - {}", party.party_name);
                    }
                }
            }
        }

        if !report.clauses.is_empty() {
            let _ = writeln!(out, "\nClauses ({}):", report.clauses.len());
            for clause in &report.clauses {
                let _ = writeln!(out, "  [{}] {}", clause.clause_type, clause.text);
            }
        }

        if !report.entities.is_empty() {
            let _ = writeln!(out, "\nEntities:");
            for entity in &report.entities {
                let _ = writeln!(out, "  {}: {}", entity.entity_type, entity.value);
            }
        }

        let changes: Vec<_> = report.suggestions.iter().filter(|s| s.is_change()).collect();
        if !changes.is_empty() {
            let _ = writeln!(out, "\nSuggested rewordings ({}):", changes.len());
            for suggestion in changes {
                let _ = writeln!(out, "  - {}", suggestion.improved_clause_text);
                if !suggestion.modification_reason.is_empty() {
                    let _ = writeln!(out, "    reason: {}", suggestion.modification_reason);
                }
            }
        }

        if !report.amounts.is_empty() {
            let _ = writeln!(out, "\nAmounts: {}", report.amounts.join(", "));
        }

        if let Some(summary) = &report.summary {
            let _ = writeln!(out, "\nSummary:\n{summary}");
        }
        if let Some(risk) = report.risk_level {
            let _ = writeln!(out, "\nRisk: {risk}");
        }

        if !report.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings:");
            for warning in &report.warnings {
                let _ = writeln!(out, "  ! {warning}");
            }
        }
        out
    }
}
