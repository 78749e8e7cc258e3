//! Aggregated migration report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::advisor::AdvisorReport;
use crate::analyzer::{CompatibilityResult, Complexity, MAX_SCORE};
use crate::dialect::DialectPair;
use crate::fix::AutoFixResult;

/// Rough effort label for a schema score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// `> 80` low, `> 60` medium, else high.
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            Self::Low
        } else if score > 60.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A query alongside its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub statement: String,
    pub result: CompatibilityResult,
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub pair: DialectPair,
    pub schema: CompatibilityResult,
    pub queries: Vec<QueryReport>,
    pub fixes: AutoFixResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor: Option<AdvisorReport>,
}

impl MigrationReport {
    pub fn new(
        pair: DialectPair,
        schema: CompatibilityResult,
        queries: Vec<QueryReport>,
        fixes: AutoFixResult,
    ) -> Self {
        Self {
            pair,
            schema,
            queries,
            fixes,
            advisor: None,
        }
    }

    pub fn with_advisor(mut self, advisor: AdvisorReport) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.statement.clone()).collect()
    }

    /// Mean query score; 100 when there are no queries.
    pub fn average_query_score(&self) -> f64 {
        if self.queries.is_empty() {
            return MAX_SCORE;
        }
        let total: f64 = self.queries.iter().map(|q| q.result.score()).sum();
        total / self.queries.len() as f64
    }

    pub fn total_query_issues(&self) -> usize {
        self.queries.iter().map(|q| q.result.issues().len()).sum()
    }

    /// Most frequent query complexity; ties go to the one seen first.
    pub fn dominant_query_complexity(&self) -> Option<(Complexity, usize)> {
        let mut counts: Vec<(Complexity, usize)> = Vec::new();
        for query in &self.queries {
            let complexity = query.result.complexity();
            match counts.iter_mut().find(|(c, _)| *c == complexity) {
                Some((_, n)) => *n += 1,
                None => counts.push((complexity, 1)),
            }
        }
        counts
            .into_iter()
            .fold(None, |best, (c, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((c, n)),
            })
    }

    pub fn migration_effort(&self) -> Effort {
        Effort::from_score(self.schema.score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn query(score: f64) -> QueryReport {
        QueryReport {
            statement: "SELECT 1".to_string(),
            result: CompatibilityResult::new(score, vec![], vec![], "SELECT 1"),
        }
    }

    fn report(queries: Vec<QueryReport>, schema_score: f64) -> MigrationReport {
        MigrationReport::new(
            DialectPair::new(Dialect::MySql, Dialect::Postgres),
            CompatibilityResult::new(schema_score, vec![], vec![], ""),
            queries,
            AutoFixResult::from_fixes(vec![]),
        )
    }

    #[test]
    fn test_query_aggregates() {
        let r = report(vec![query(100.0), query(80.0), query(75.0), query(95.0)], 100.0);
        assert_eq!(r.average_query_score(), 87.5);
        // Two low, two medium: low was seen first.
        assert_eq!(r.dominant_query_complexity(), Some((Complexity::Low, 2)));
    }

    #[test]
    fn test_empty_queries() {
        let r = report(vec![], 100.0);
        assert_eq!(r.average_query_score(), 100.0);
        assert_eq!(r.dominant_query_complexity(), None);
        assert_eq!(r.total_query_issues(), 0);
    }

    #[test]
    fn test_effort_thresholds() {
        assert_eq!(Effort::from_score(81.0), Effort::Low);
        assert_eq!(Effort::from_score(80.0), Effort::Medium);
        assert_eq!(Effort::from_score(60.0), Effort::High);
        assert_eq!(report(vec![], 75.0).migration_effort(), Effort::Medium);
    }
}
