//! Schema and query compatibility analyzers.
//!
//! Both analyzers start from a perfect score and subtract fixed penalties for
//! what the catalog says will not port cleanly. Neither parses SQL: syntax
//! errors in the input go unnoticed and simply produce fewer findings.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::catalog::{DialectCatalog, Scope};
use crate::dialect::DialectPair;
use crate::matcher::{contains_token, replace_tokens};
use crate::parser::split_statements;
use crate::rules::Severity;

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a score into `[0, 100]`.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}

/// Kind of compatibility finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    TypeConversion,
    ArrayConversion,
    AutoIncrement,
    StorageEngine,
    NumericPrecision,
    DocumentModel,
    FunctionConversion,
    IdentifierQuotes,
    LimitSyntax,
    AggregationConversion,
}

/// A single compatibility finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub description: String,
    pub severity: Severity,
    pub category: IssueKind,
}

impl Issue {
    pub fn new(description: impl Into<String>, severity: Severity, category: IssueKind) -> Self {
        Self {
            description: description.into(),
            severity,
            category,
        }
    }
}

/// Migration complexity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    /// `>= 90` low, `>= 70` medium, `>= 50` high, else very high.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Low
        } else if score >= 70.0 {
            Self::Medium
        } else if score >= 50.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected runtime impact for a given compatibility score.
pub fn performance_impact(score: f64) -> &'static str {
    if score >= 90.0 {
        "Minimal performance impact expected"
    } else if score >= 70.0 {
        "Low to moderate performance impact"
    } else if score >= 50.0 {
        "Moderate performance impact - testing required"
    } else {
        "Significant performance impact - extensive optimization needed"
    }
}

/// Outcome of analyzing one schema or one statement.
///
/// Complexity is derived from the score on demand; it is serialized alongside
/// the other fields but never stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompatibilityResult {
    score: f64,
    issues: Vec<Issue>,
    recommendations: Vec<String>,
    converted_code: String,
}

impl CompatibilityResult {
    pub fn new(
        score: f64,
        issues: Vec<Issue>,
        recommendations: Vec<String>,
        converted_code: impl Into<String>,
    ) -> Self {
        Self {
            score: clamp_score(score),
            issues,
            recommendations,
            converted_code: converted_code.into(),
        }
    }

    /// A clean result: full score, nothing to report, code unchanged.
    pub fn clean(code: &str) -> Self {
        Self::new(MAX_SCORE, Vec::new(), Vec::new(), code)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn converted_code(&self) -> &str {
        &self.converted_code
    }

    pub fn complexity(&self) -> Complexity {
        Complexity::from_score(self.score)
    }

    pub fn performance_impact(&self) -> &'static str {
        performance_impact(self.score)
    }
}

impl Serialize for CompatibilityResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompatibilityResult", 6)?;
        state.serialize_field("score", &self.score)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("recommendations", &self.recommendations)?;
        state.serialize_field("converted_code", &self.converted_code)?;
        state.serialize_field("complexity", &self.complexity())?;
        state.serialize_field("performance_impact", self.performance_impact())?;
        state.end()
    }
}

/// Scores DDL against the catalog's type tables and schema heuristics.
#[derive(Debug, Clone)]
pub struct SchemaAnalyzer {
    catalog: Arc<DialectCatalog>,
}

impl SchemaAnalyzer {
    pub fn new(catalog: Arc<DialectCatalog>) -> Self {
        Self { catalog }
    }

    /// Analyze a schema definition for migration from `pair.source` to `pair.target`.
    pub fn analyze(&self, pair: DialectPair, ddl: &str) -> CompatibilityResult {
        if ddl.trim().is_empty() {
            return CompatibilityResult::clean(ddl);
        }

        let (types, _) = self.catalog.lookup(pair);
        let mut score = MAX_SCORE;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut substitutions: Vec<(&str, &str)> = Vec::new();

        for mapping in types {
            if !mapping.occurs_in(ddl) || mapping.is_identity() {
                continue;
            }
            if mapping.targets_array() {
                issues.push(Issue::new(
                    format!("Array conversion required for {}", mapping.source_type),
                    Severity::Medium,
                    IssueKind::ArrayConversion,
                ));
                score -= 10.0;
                recommendations.push(format!(
                    "Convert {} to {} with proper array handling",
                    mapping.source_type, mapping.target_type
                ));
            } else {
                // Direct substitutions are presumed low-risk: no penalty.
                substitutions.push((&mapping.source_type, &mapping.target_type));
                recommendations.push(format!(
                    "Convert {} to {}",
                    mapping.source_type, mapping.target_type
                ));
            }
        }

        let mut converted = replace_tokens(ddl, &substitutions);

        for heuristic in self.catalog.heuristics(pair, Scope::Schema) {
            if !heuristic.trigger.fires(ddl) {
                continue;
            }
            issues.push(Issue::new(&heuristic.issue, heuristic.severity, heuristic.kind));
            score -= heuristic.penalty;
            if let Some(recommendation) = &heuristic.recommendation {
                recommendations.push(recommendation.clone());
            }
            converted = heuristic.rewrite(&converted);
        }

        let result = CompatibilityResult::new(score, issues, recommendations, converted);
        debug!(
            pair = %pair,
            score = result.score(),
            issues = result.issues().len(),
            "schema analyzed"
        );
        result
    }
}

/// Scores single statements against the catalog's function tables and query
/// heuristics.
#[derive(Debug, Clone)]
pub struct QueryAnalyzer {
    catalog: Arc<DialectCatalog>,
}

impl QueryAnalyzer {
    pub fn new(catalog: Arc<DialectCatalog>) -> Self {
        Self { catalog }
    }

    /// Analyze exactly one statement. Splitting is the caller's job; see
    /// [`QueryAnalyzer::analyze_all`].
    pub fn analyze(&self, pair: DialectPair, query: &str) -> CompatibilityResult {
        if query.trim().is_empty() {
            return CompatibilityResult::clean(query);
        }

        let (_, functions) = self.catalog.lookup(pair);
        let mut score = MAX_SCORE;
        let mut issues = Vec::new();
        let mut substitutions: Vec<(&str, &str)> = Vec::new();

        for mapping in functions {
            if mapping.is_identity() || !contains_token(query, &mapping.source_fn) {
                continue;
            }
            substitutions.push((&mapping.source_fn, &mapping.target_fn));
            issues.push(Issue::new(
                format!(
                    "Function {} converted to {}",
                    mapping.source_fn, mapping.target_fn
                ),
                Severity::Medium,
                IssueKind::FunctionConversion,
            ));
            score -= 5.0;
        }

        let mut converted = replace_tokens(query, &substitutions);
        let mut recommendations = Vec::new();

        for heuristic in self.catalog.heuristics(pair, Scope::Query) {
            if !heuristic.trigger.fires(query) {
                continue;
            }
            issues.push(Issue::new(&heuristic.issue, heuristic.severity, heuristic.kind));
            score -= heuristic.penalty;
            if let Some(recommendation) = &heuristic.recommendation {
                recommendations.push(recommendation.clone());
            }
            converted = heuristic.rewrite(&converted);
        }

        let result = CompatibilityResult::new(score, issues, recommendations, converted);
        debug!(
            pair = %pair,
            score = result.score(),
            issues = result.issues().len(),
            "query analyzed"
        );
        result
    }

    /// Split `text` on `;` (outside quotes) and analyze each statement.
    pub fn analyze_all(&self, pair: DialectPair, text: &str) -> Vec<CompatibilityResult> {
        split_statements(text)
            .iter()
            .map(|statement| self.analyze(pair, statement))
            .collect()
    }
}
