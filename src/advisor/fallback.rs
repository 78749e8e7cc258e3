//! Deterministic advisor stand-in.

use async_trait::async_trait;

use super::{Advisor, AdvisorContext, AdvisorReport, ReportSource};
use crate::analyzer::Complexity;
use crate::error::SqlportResult;

/// Build the fallback report for `context`. Depends only on the dialect pair.
pub fn report(context: &AdvisorContext) -> AdvisorReport {
    let source = context.pair.source;
    let target = context.pair.target;

    AdvisorReport {
        analysis: format!(
            "Advisor not available - using fallback assessment for {} to {} migration",
            source.display_name(),
            target.display_name()
        ),
        compatibility_score: 70.0,
        complexity: Complexity::Medium,
        recommendations: vec![
            "Conduct thorough testing in staging environment".to_string(),
            format!(
                "Review all {} and stored procedures",
                source.query_term().to_lowercase()
            ),
            "Validate data type conversions".to_string(),
        ],
        risks: vec![
            format!(
                "{} to {} schema conversion complexity varies by object type",
                source.display_name(),
                target.display_name()
            ),
            "Data type mappings require validation".to_string(),
            format!(
                "{} may need rewriting for {}",
                source.query_term(),
                target.display_name()
            ),
        ],
        confidence: 0.5,
        timeline_estimate: "6-8 weeks".to_string(),
        source: ReportSource::Fallback,
    }
}

/// An [`Advisor`] that always answers with the fallback report.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAdvisor;

#[async_trait]
impl Advisor for FallbackAdvisor {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn request(&self, context: &AdvisorContext) -> SqlportResult<AdvisorReport> {
        Ok(report(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, DialectPair};

    #[test]
    fn test_fallback_names_dialects() {
        let ctx = AdvisorContext::new(DialectPair::new(Dialect::SqlServer, Dialect::Postgres), vec![]);
        let report = report(&ctx);
        assert_eq!(report.compatibility_score, 70.0);
        assert_eq!(report.complexity, Complexity::Medium);
        assert_eq!(
            report.risks[2],
            "T-SQL Queries may need rewriting for PostgreSQL"
        );
        assert_eq!(report.recommendations[1], "Review all t-sql queries and stored procedures");
        assert_eq!(report.timeline_estimate, "6-8 weeks");
    }
}
