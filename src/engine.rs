//! Migration analysis engine.
//!
//! Wires the catalog, rule library, analyzers and fix engine together behind
//! one entry point. The engine is immutable after construction; each call
//! builds and returns its own results.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::advisor::{self, Advisor, AdvisorContext, AdvisorReport, AnthropicAdvisor};
use crate::analyzer::{CompatibilityResult, QueryAnalyzer, SchemaAnalyzer};
use crate::catalog::DialectCatalog;
use crate::config::EngineConfig;
use crate::dialect::DialectPair;
use crate::error::{SqlportError, SqlportResult};
use crate::fix::{AutoFixEngine, AutoFixResult, FixRequest};
use crate::parser::{SchemaObject, schema_objects, split_statements};
use crate::report::{MigrationReport, QueryReport};
use crate::rules::RuleLibrary;

/// Input to [`MigrationEngine::analyze`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub pair: DialectPair,
    pub schema: String,
    /// One or more statements, `;`-delimited.
    pub queries: String,
}

impl AnalysisRequest {
    pub fn new(pair: DialectPair) -> Self {
        Self {
            pair,
            ..Default::default()
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn queries(mut self, queries: impl Into<String>) -> Self {
        self.queries = queries.into();
        self
    }
}

/// Entry point for analysis, fix generation and advisor consultation.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    config: EngineConfig,
    catalog: Arc<DialectCatalog>,
    rules: Arc<RuleLibrary>,
    schema: SchemaAnalyzer,
    queries: QueryAnalyzer,
    fixer: AutoFixEngine,
}

impl MigrationEngine {
    /// Engine over the built-in catalog and rules.
    pub fn new(config: EngineConfig) -> SqlportResult<Self> {
        Ok(Self::with_parts(
            config,
            Arc::new(DialectCatalog::builtin()?),
            Arc::new(RuleLibrary::builtin()?),
        ))
    }

    /// Engine over caller-supplied catalog and rules.
    pub fn with_parts(
        config: EngineConfig,
        catalog: Arc<DialectCatalog>,
        rules: Arc<RuleLibrary>,
    ) -> Self {
        let fixer = AutoFixEngine::new(Arc::clone(&rules)).with_min_confidence(config.min_confidence);
        Self {
            schema: SchemaAnalyzer::new(Arc::clone(&catalog)),
            queries: QueryAnalyzer::new(Arc::clone(&catalog)),
            fixer,
            config,
            catalog,
            rules,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DialectCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleLibrary {
        &self.rules
    }

    pub fn fixer(&self) -> &AutoFixEngine {
        &self.fixer
    }

    fn check_size(&self, text: &str) -> SqlportResult<()> {
        let limit = self.config.max_input_bytes;
        if text.len() > limit {
            return Err(SqlportError::InputTooLarge {
                size: text.len(),
                limit,
            });
        }
        Ok(())
    }

    pub fn analyze_schema(&self, pair: DialectPair, ddl: &str) -> SqlportResult<CompatibilityResult> {
        self.check_size(ddl)?;
        Ok(self.schema.analyze(pair, ddl))
    }

    /// Analyze a single statement.
    pub fn analyze_query(&self, pair: DialectPair, query: &str) -> SqlportResult<CompatibilityResult> {
        self.check_size(query)?;
        Ok(self.queries.analyze(pair, query))
    }

    /// Generate fixes. The request's own category and auto-apply settings win
    /// over the config.
    pub fn generate_fixes(&self, request: &FixRequest) -> SqlportResult<AutoFixResult> {
        self.check_size(&request.schema)?;
        for query in &request.queries {
            self.check_size(query)?;
        }
        Ok(self.fixer.generate(request))
    }

    /// Full run: schema analysis, per-statement query analysis and fixes, with
    /// categories and auto-apply taken from the config.
    pub fn analyze(&self, request: &AnalysisRequest) -> SqlportResult<MigrationReport> {
        self.check_size(&request.schema)?;
        self.check_size(&request.queries)?;

        let pair = request.pair;
        if !self.catalog.knows(pair) {
            warn!(pair = %pair, "no mapping tables for this pair, generic heuristics only");
        }

        let schema = self.schema.analyze(pair, &request.schema);
        let statements = split_statements(&request.queries);
        let queries: Vec<QueryReport> = statements
            .iter()
            .map(|statement| QueryReport {
                statement: statement.clone(),
                result: self.queries.analyze(pair, statement),
            })
            .collect();

        let fix_request = FixRequest::new(pair)
            .schema(request.schema.clone())
            .queries(statements)
            .categories(self.config.categories.clone())
            .auto_apply_safe(self.config.auto_apply_safe);
        let fixes = self.fixer.generate(&fix_request);

        let report = MigrationReport::new(pair, schema, queries, fixes);
        info!(
            pair = %pair,
            schema_score = report.schema.score(),
            queries = report.queries.len(),
            fixes = report.fixes.total_issues,
            "analysis complete"
        );
        Ok(report)
    }

    /// The configured advisor, if enabled. Creating it performs no I/O.
    pub fn advisor(&self) -> SqlportResult<Option<AnthropicAdvisor>> {
        if !self.config.advisor.enabled {
            return Ok(None);
        }
        AnthropicAdvisor::from_config(&self.config.advisor).map(Some)
    }

    /// Consult the configured advisor about a finished report. Falls back to
    /// the deterministic report when the advisor is disabled, fails, times out
    /// or `cancel` fires first.
    pub async fn advise<C>(&self, report: &MigrationReport, cancel: C) -> SqlportResult<AdvisorReport>
    where
        C: Future<Output = ()>,
    {
        let context = AdvisorContext::new(report.pair, schema_objects_of(report))
            .with_schema_score(report.schema.score());
        let advisor = self.advisor()?;
        let advisor = advisor.as_ref().map(|a| a as &dyn Advisor);
        Ok(advisor::consult(advisor, &context, self.config.advisor.timeout(), cancel).await)
    }
}

fn schema_objects_of(report: &MigrationReport) -> Vec<SchemaObject> {
    // The converted text keeps every CREATE TABLE and collection name.
    schema_objects(report.schema.converted_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::ReportSource;
    use crate::dialect::Dialect;

    fn mysql_pg() -> DialectPair {
        DialectPair::new(Dialect::MySql, Dialect::Postgres)
    }

    #[test]
    fn test_analyze_bundles_everything() {
        let engine = MigrationEngine::new(EngineConfig::default()).unwrap();
        let request = AnalysisRequest::new(mysql_pg())
            .schema("CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY);")
            .queries("SELECT `id` FROM users; SELECT IFNULL(a, 0) FROM t;");
        let report = engine.analyze(&request).unwrap();

        assert_eq!(report.schema.score(), 95.0);
        assert_eq!(report.queries.len(), 2);
        assert_eq!(report.queries[0].result.score(), 98.0);
        assert_eq!(report.queries[1].result.score(), 95.0);
        assert!(report.fixes.fix("syntax-001").is_some());
    }

    #[test]
    fn test_input_limit() {
        let config = EngineConfig::builder().max_input_bytes(16).build().unwrap();
        let engine = MigrationEngine::new(config).unwrap();
        let err = engine
            .analyze_schema(mysql_pg(), "CREATE TABLE far_too_long (id INT);")
            .unwrap_err();
        assert!(matches!(err, SqlportError::InputTooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_disabled_advisor_falls_back() {
        let engine = MigrationEngine::new(EngineConfig::default()).unwrap();
        let report = engine
            .analyze(&AnalysisRequest::new(mysql_pg()).schema("CREATE TABLE t (id INT);"))
            .unwrap();
        let advice = engine.advise(&report, std::future::pending()).await.unwrap();
        assert_eq!(advice.source, ReportSource::Fallback);
    }
}
