//! Optional external advisor.
//!
//! An advisor adds a natural-language second opinion on a migration. It is
//! strictly best-effort: [`consult`] never fails, and any error, timeout or
//! cancellation yields the deterministic [`fallback`] report.

pub mod anthropic;
pub mod fallback;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzer::Complexity;
use crate::dialect::DialectPair;
use crate::error::SqlportResult;
use crate::parser::SchemaObject;

pub use anthropic::AnthropicAdvisor;
pub use fallback::FallbackAdvisor;

/// Everything an advisor gets to see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorContext {
    pub pair: DialectPair,
    pub objects: Vec<SchemaObject>,
    /// Score from the local schema analysis, if one ran.
    pub schema_score: Option<f64>,
}

impl AdvisorContext {
    pub fn new(pair: DialectPair, objects: Vec<SchemaObject>) -> Self {
        Self {
            pair,
            objects,
            schema_score: None,
        }
    }

    pub fn with_schema_score(mut self, score: f64) -> Self {
        self.schema_score = Some(score);
        self
    }
}

/// Where a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Advisor,
    Fallback,
}

/// Advisor response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorReport {
    pub analysis: String,
    pub compatibility_score: f64,
    pub complexity: Complexity,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    pub confidence: f64,
    pub timeline_estimate: String,
    pub source: ReportSource,
}

/// A source of supplementary migration analysis.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn request(&self, context: &AdvisorContext) -> SqlportResult<AdvisorReport>;
}

/// Ask `advisor` for a report, bounded by `timeout` and abandoned as soon as
/// `cancel` completes. Never fails: every miss becomes the fallback report.
pub async fn consult<C>(
    advisor: Option<&dyn Advisor>,
    context: &AdvisorContext,
    timeout: Duration,
    cancel: C,
) -> AdvisorReport
where
    C: Future<Output = ()>,
{
    let Some(advisor) = advisor else {
        debug!("no advisor configured, using fallback");
        return fallback::report(context);
    };

    tokio::select! {
        outcome = tokio::time::timeout(timeout, advisor.request(context)) => match outcome {
            Ok(Ok(report)) => {
                debug!(advisor = advisor.name(), "advisor responded");
                report
            }
            Ok(Err(e)) => {
                warn!(advisor = advisor.name(), error = %e, "advisor failed, using fallback");
                fallback::report(context)
            }
            Err(_) => {
                warn!(
                    advisor = advisor.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "advisor timed out, using fallback"
                );
                fallback::report(context)
            }
        },
        _ = cancel => {
            warn!(advisor = advisor.name(), "analysis cancelled, abandoning advisor call");
            fallback::report(context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::error::SqlportError;

    struct Canned;

    #[async_trait]
    impl Advisor for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn request(&self, _context: &AdvisorContext) -> SqlportResult<AdvisorReport> {
            Ok(AdvisorReport {
                analysis: "fine".to_string(),
                compatibility_score: 88.0,
                complexity: Complexity::Low,
                recommendations: vec![],
                risks: vec![],
                confidence: 0.8,
                timeline_estimate: "2 weeks".to_string(),
                source: ReportSource::Advisor,
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl Advisor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn request(&self, _context: &AdvisorContext) -> SqlportResult<AdvisorReport> {
            Err(SqlportError::Advisor("connection refused".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl Advisor for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn request(&self, context: &AdvisorContext) -> SqlportResult<AdvisorReport> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Canned.request(context).await
        }
    }

    fn context() -> AdvisorContext {
        AdvisorContext::new(DialectPair::new(Dialect::Oracle, Dialect::Postgres), vec![])
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let report = consult(Some(&Canned), &context(), Duration::from_secs(1), std::future::pending()).await;
        assert_eq!(report.source, ReportSource::Advisor);
        assert_eq!(report.compatibility_score, 88.0);
    }

    #[tokio::test]
    async fn test_absent_and_error_fall_back() {
        let ctx = context();
        let none = consult(None, &ctx, Duration::from_secs(1), std::future::pending()).await;
        let failed = consult(Some(&Broken), &ctx, Duration::from_secs(1), std::future::pending()).await;
        assert_eq!(none, fallback::report(&ctx));
        assert_eq!(failed, none);
        assert_eq!(none.source, ReportSource::Fallback);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let report = consult(Some(&Slow), &context(), Duration::from_millis(50), std::future::pending()).await;
        assert_eq!(report.source, ReportSource::Fallback);
    }

    #[tokio::test]
    async fn test_cancel_falls_back_immediately() {
        let report = consult(Some(&Slow), &context(), Duration::from_secs(3600), async {}).await;
        assert_eq!(report.source, ReportSource::Fallback);
    }
}
