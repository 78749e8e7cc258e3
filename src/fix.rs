//! Auto-fix generation, lifecycle and application.
//!
//! A fix starts `Pending`. Accepting, skipping or marking it reviewed is a
//! one-way move; the only exception is `apply`, which demotes an accepted fix to
//! `Failed` when the text it targets is no longer there.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzer::{MAX_SCORE, clamp_score};
use crate::catalog::Scope;
use crate::dialect::DialectPair;
use crate::error::{SqlportError, SqlportResult};
use crate::matcher::replace_exact_tokens;
use crate::rules::{FixCategory, Finding, Rule, RuleLibrary, Severity};

/// Default confidence a fix must exceed to be applied automatically.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.9;

/// Lifecycle state of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixStatus {
    Pending,
    Applied,
    Skipped,
    Reviewed,
    Failed,
}

impl FixStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::Reviewed => "reviewed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for FixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which text a fix edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixTarget {
    Schema,
    /// Index into the request's query list.
    Query(usize),
}

impl fmt::Display for FixTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixTarget::Schema => f.write_str("schema"),
            FixTarget::Query(i) => write!(f, "query #{}", i + 1),
        }
    }
}

/// One proposed text transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFix {
    pub id: String,
    /// Id of the rule that produced this fix.
    pub rule: String,
    pub category: FixCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub original_code: String,
    pub fixed_code: String,
    pub explanation: String,
    pub confidence: f64,
    pub estimated_impact: String,
    pub prerequisites: Vec<String>,
    pub warnings: Vec<String>,
    status: FixStatus,
    pub auto_apply: bool,
    pub target: FixTarget,
}

impl AutoFix {
    fn from_finding(rule: &Rule, finding: Finding, target: FixTarget, seq: usize) -> Self {
        Self {
            id: format!("{}-{:03}", rule.category, seq),
            rule: rule.id.to_string(),
            category: rule.category,
            severity: rule.severity,
            title: rule.title.to_string(),
            description: finding
                .detail
                .unwrap_or_else(|| rule.description.to_string()),
            original_code: finding.original,
            fixed_code: finding.fixed,
            explanation: rule.explanation.to_string(),
            confidence: rule.confidence,
            estimated_impact: rule.impact.to_string(),
            prerequisites: rule.prerequisites.iter().map(|s| s.to_string()).collect(),
            warnings: rule.warnings.iter().map(|s| s.to_string()).collect(),
            status: FixStatus::Pending,
            auto_apply: rule.auto_apply,
            target,
        }
    }

    pub fn status(&self) -> FixStatus {
        self.status
    }

    /// True when applying appends `fixed_code` instead of replacing text.
    pub fn is_additive(&self) -> bool {
        self.category.is_additive() || self.original_code.is_empty()
    }

    /// Whether the auto-apply gate lets this fix through at `threshold`.
    pub fn passes_gate(&self, threshold: f64) -> bool {
        self.auto_apply && self.confidence > threshold && self.severity.allows_auto_apply()
    }

    fn transition(&mut self, to: FixStatus) -> SqlportResult<()> {
        if self.status.is_terminal() {
            return Err(SqlportError::transition(&self.id, self.status, to));
        }
        self.status = to;
        Ok(())
    }

    /// Pending -> Applied.
    pub fn accept(&mut self) -> SqlportResult<()> {
        self.transition(FixStatus::Applied)
    }

    /// Pending -> Skipped.
    pub fn skip(&mut self) -> SqlportResult<()> {
        self.transition(FixStatus::Skipped)
    }

    /// Pending -> Reviewed.
    pub fn review(&mut self) -> SqlportResult<()> {
        self.transition(FixStatus::Reviewed)
    }

    fn fail(&mut self) {
        self.status = FixStatus::Failed;
    }
}

/// Input to [`AutoFixEngine::generate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixRequest {
    pub pair: DialectPair,
    pub schema: String,
    pub queries: Vec<String>,
    /// Categories to run; empty runs all.
    pub categories: Vec<FixCategory>,
    pub auto_apply_safe: bool,
}

impl FixRequest {
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

    pub fn queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    pub fn categories(mut self, categories: Vec<FixCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn auto_apply_safe(mut self, enabled: bool) -> Self {
        self.auto_apply_safe = enabled;
        self
    }

    fn wants(&self, category: FixCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

/// Text produced by [`apply_fixes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub fixed_schema: String,
    pub fixed_queries: Vec<String>,
    pub applied_count: usize,
    /// Ids of fixes that were applied but whose original text was gone.
    pub failed: Vec<String>,
}

/// Fixes from one run plus aggregate counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFixResult {
    pub total_issues: usize,
    pub fixes_available: usize,
    pub fixes_applied: usize,
    pub critical_issues: usize,
    pub performance_gains: Vec<String>,
    pub security_improvements: Vec<String>,
    pub score_before: f64,
    pub score_after: f64,
    pub fixes: Vec<AutoFix>,
    pub summary: String,
}

impl AutoFixResult {
    pub fn from_fixes(fixes: Vec<AutoFix>) -> Self {
        let mut result = Self {
            total_issues: 0,
            fixes_available: 0,
            fixes_applied: 0,
            critical_issues: 0,
            performance_gains: Vec::new(),
            security_improvements: Vec::new(),
            score_before: MAX_SCORE,
            score_after: MAX_SCORE,
            fixes,
            summary: String::new(),
        };
        result.refresh();
        result
    }

    /// Recompute counters, scores and summary from the fixes' current state.
    pub fn refresh(&mut self) {
        let count = |status: FixStatus| self.fixes.iter().filter(|f| f.status == status).count();

        self.total_issues = self.fixes.len();
        self.fixes_available = count(FixStatus::Pending);
        self.fixes_applied = count(FixStatus::Applied);
        self.critical_issues = self
            .fixes
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();

        let live = |f: &&AutoFix| !matches!(f.status, FixStatus::Skipped | FixStatus::Failed);
        self.performance_gains = first_seen(
            self.fixes
                .iter()
                .filter(live)
                .filter(|f| matches!(f.category, FixCategory::Performance | FixCategory::Optimization))
                .map(|f| f.estimated_impact.as_str()),
        );
        self.security_improvements = first_seen(
            self.fixes
                .iter()
                .filter(live)
                .filter(|f| f.category == FixCategory::Security)
                .map(|f| f.title.as_str()),
        );

        self.score_before = clamp_score(MAX_SCORE - 10.0 * self.total_issues as f64);
        self.score_after = clamp_score(self.score_before + 15.0 * self.fixes_applied as f64);
        self.summary = format!(
            "{} issues found, {} fixes applied, {} awaiting review; score {:.0} -> {:.0}",
            self.total_issues,
            self.fixes_applied,
            self.fixes_available,
            self.score_before,
            self.score_after
        );
    }

    pub fn fix(&self, id: &str) -> Option<&AutoFix> {
        self.fixes.iter().find(|f| f.id == id)
    }

    fn fix_mut(&mut self, id: &str) -> SqlportResult<&mut AutoFix> {
        self.fixes
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| SqlportError::UnknownFix(id.to_string()))
    }

    /// Accept a pending fix by id.
    pub fn accept(&mut self, id: &str) -> SqlportResult<()> {
        self.fix_mut(id)?.accept()?;
        self.refresh();
        Ok(())
    }

    pub fn skip(&mut self, id: &str) -> SqlportResult<()> {
        self.fix_mut(id)?.skip()?;
        self.refresh();
        Ok(())
    }

    pub fn review(&mut self, id: &str) -> SqlportResult<()> {
        self.fix_mut(id)?.review()?;
        self.refresh();
        Ok(())
    }

    /// Apply every accepted fix and refresh the counters.
    pub fn apply(&mut self, schema: &str, queries: &[String]) -> ApplyOutcome {
        let outcome = apply_fixes(&mut self.fixes, schema, queries);
        self.refresh();
        outcome
    }
}

/// Runs the rule library and gates automatic application.
///
/// Holds only shared read-only state, so one engine serves any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct AutoFixEngine {
    rules: Arc<RuleLibrary>,
    min_confidence: f64,
}

impl AutoFixEngine {
    pub fn new(rules: Arc<RuleLibrary>) -> Self {
        Self {
            rules,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Generate fixes in category order, then rule order, then schema before
    /// queries, then match order.
    pub fn generate(&self, request: &FixRequest) -> AutoFixResult {
        let pair = request.pair;
        let mut fixes = Vec::new();

        for category in FixCategory::ORDER {
            if !request.wants(category) {
                continue;
            }
            let mut seq = 0;
            for rule in self.rules.in_category(category) {
                let mut emit = |finding: Finding, target: FixTarget| {
                    seq += 1;
                    let fix = AutoFix::from_finding(rule, finding, target, seq);
                    debug!(id = %fix.id, rule = rule.id, target = %target, "fix generated");
                    fixes.push(fix);
                };
                if rule.applies_to(pair, Scope::Schema) {
                    for finding in rule.detect(pair, &request.schema) {
                        emit(finding, FixTarget::Schema);
                    }
                }
                if rule.applies_to(pair, Scope::Query) {
                    for (i, query) in request.queries.iter().enumerate() {
                        for finding in rule.detect(pair, query) {
                            emit(finding, FixTarget::Query(i));
                        }
                    }
                }
            }
        }

        if request.auto_apply_safe {
            for fix in fixes.iter_mut().filter(|f| f.passes_gate(self.min_confidence)) {
                fix.status = FixStatus::Applied;
            }
        }

        let result = AutoFixResult::from_fixes(fixes);
        debug!(
            pair = %pair,
            fixes = result.total_issues,
            auto_applied = result.fixes_applied,
            "fixes generated"
        );
        result
    }

    /// See [`apply_fixes`].
    pub fn apply(&self, fixes: &mut [AutoFix], schema: &str, queries: &[String]) -> ApplyOutcome {
        apply_fixes(fixes, schema, queries)
    }
}

/// Distinct items in order of first appearance.
fn first_seen<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

fn append_block(text: &mut String, block: &str) {
    if block.is_empty() {
        return;
    }
    text.truncate(text.trim_end().len());
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(block);
}

/// Apply `Applied` fixes in order. Replacing fixes substitute every exact,
/// token-bounded occurrence of their original text, so `INT AUTO_INCREMENT`
/// leaves `BIGINT AUTO_INCREMENT` alone; additive fixes append a trailing block.
///
/// Overlapping fixes are not reconciled: a fix whose original text was consumed
/// by an earlier one is marked `Failed` and the batch continues.
pub fn apply_fixes(fixes: &mut [AutoFix], schema: &str, queries: &[String]) -> ApplyOutcome {
    let mut fixed_schema = schema.to_string();
    let mut fixed_queries = queries.to_vec();
    let mut applied_count = 0;
    let mut failed = Vec::new();

    for fix in fixes.iter_mut().filter(|f| f.status == FixStatus::Applied) {
        let text = match fix.target {
            FixTarget::Schema => Some(&mut fixed_schema),
            FixTarget::Query(i) => fixed_queries.get_mut(i),
        };
        let Some(text) = text else {
            warn!(id = %fix.id, target = %fix.target, "fix target out of range");
            fix.fail();
            failed.push(fix.id.clone());
            continue;
        };

        if fix.is_additive() {
            append_block(text, &fix.fixed_code);
        } else if let Some(rewritten) = replace_exact_tokens(text, &fix.original_code, &fix.fixed_code) {
            *text = rewritten;
        } else {
            debug!(id = %fix.id, "original text no longer present");
            fix.fail();
            failed.push(fix.id.clone());
            continue;
        }
        applied_count += 1;
    }

    info!(applied = applied_count, failed = failed.len(), "fixes applied");
    ApplyOutcome {
        fixed_schema,
        fixed_queries,
        applied_count,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;

    fn engine() -> AutoFixEngine {
        AutoFixEngine::new(Arc::new(RuleLibrary::builtin().unwrap()))
    }

    fn mysql_pg() -> DialectPair {
        DialectPair::new(Dialect::MySql, Dialect::Postgres)
    }

    const DDL: &str = "CREATE TABLE users (\n  id INT AUTO_INCREMENT PRIMARY KEY,\n  email VARCHAR(255)\n) ENGINE=InnoDB;";

    #[test]
    fn test_ids_are_per_category() {
        let result = engine().generate(&FixRequest::new(mysql_pg()).schema(DDL));
        let ids: Vec<_> = result.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["syntax-001", "compatibility-001", "compliance-001", "optimization-001"]
        );
        assert_eq!(result.total_issues, 4);
        assert_eq!(result.score_before, 60.0);
        assert_eq!(result.fixes_available, 4);
    }

    #[test]
    fn test_category_filter() {
        let request = FixRequest::new(mysql_pg())
            .schema(DDL)
            .categories(vec![FixCategory::Optimization]);
        let result = engine().generate(&request);
        assert_eq!(result.fixes.len(), 1);
        assert_eq!(result.fixes[0].category, FixCategory::Optimization);
    }

    #[test]
    fn test_gate_respects_severity_and_threshold() {
        let request = FixRequest::new(mysql_pg()).schema(DDL).auto_apply_safe(true);
        let result = engine().generate(&request);
        let status = |id: &str| result.fix(id).unwrap().status();
        // HIGH severity stays pending despite its flag.
        assert_eq!(status("syntax-001"), FixStatus::Pending);
        // MEDIUM at 0.85 is below the default threshold.
        assert_eq!(status("compatibility-001"), FixStatus::Pending);
        assert_eq!(status("optimization-001"), FixStatus::Applied);
        assert_eq!(result.fixes_applied, 1);
        assert_eq!(result.score_after, 75.0);

        let lenient = engine().with_min_confidence(0.8);
        let result = lenient.generate(&request);
        assert_eq!(result.fix("compatibility-001").unwrap().status(), FixStatus::Applied);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut result = engine().generate(&FixRequest::new(mysql_pg()).schema(DDL));
        result.skip("syntax-001").unwrap();
        let err = result.accept("syntax-001").unwrap_err();
        assert!(matches!(err, SqlportError::InvalidTransition { .. }));
        assert!(matches!(result.review("nope-001"), Err(SqlportError::UnknownFix(_))));
    }

    #[test]
    fn test_apply_replaces_and_appends() {
        let mut result = engine().generate(&FixRequest::new(mysql_pg()).schema(DDL));
        result.accept("syntax-001").unwrap();
        result.accept("optimization-001").unwrap();
        let outcome = result.apply(DDL, &[]);

        assert_eq!(outcome.applied_count, 2);
        assert!(outcome.fixed_schema.contains("id SERIAL PRIMARY KEY"));
        assert!(outcome.fixed_schema.ends_with("ANALYZE users;"));
        assert_eq!(result.fixes_applied, 2);
        assert_eq!(result.score_after, 90.0);
    }

    #[test]
    fn test_apply_marks_consumed_fix_failed() {
        let query = "SELECT IFNULL(a, 0) FROM t".to_string();
        let mut result = engine().generate(&FixRequest::new(mysql_pg()).queries(vec![query.clone()]));
        let mut duplicate = result.fixes[0].clone();
        duplicate.id = "compatibility-999".to_string();
        result.fixes.push(duplicate);
        for fix in result.fixes.iter_mut() {
            fix.accept().unwrap();
        }

        let outcome = result.apply("", &[query]);
        assert_eq!(outcome.applied_count, 1);
        assert_eq!(outcome.failed, vec!["compatibility-999".to_string()]);
        assert_eq!(outcome.fixed_queries[0], "SELECT COALESCE(a, 0) FROM t");
        assert_eq!(result.fix("compatibility-999").unwrap().status(), FixStatus::Failed);
    }

    #[test]
    fn test_apply_leaves_skipped_and_longer_matches_alone() {
        let ddl = "CREATE TABLE a (id INT AUTO_INCREMENT PRIMARY KEY);\n\
                   CREATE TABLE b (id TINYINT AUTO_INCREMENT PRIMARY KEY);\n\
                   CREATE TABLE c (id BIGINT AUTO_INCREMENT PRIMARY KEY);";
        let request = FixRequest::new(mysql_pg())
            .schema(ddl)
            .categories(vec![FixCategory::Syntax]);
        let mut result = engine().generate(&request);
        let originals: Vec<_> = result.fixes.iter().map(|f| f.original_code.as_str()).collect();
        assert_eq!(
            originals,
            vec!["INT AUTO_INCREMENT", "TINYINT AUTO_INCREMENT", "BIGINT AUTO_INCREMENT"]
        );

        result.accept("syntax-001").unwrap();
        result.skip("syntax-003").unwrap();
        let outcome = result.apply(ddl, &[]);

        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.failed.is_empty());
        assert_eq!(
            outcome.fixed_schema,
            "CREATE TABLE a (id SERIAL PRIMARY KEY);\n\
             CREATE TABLE b (id TINYINT AUTO_INCREMENT PRIMARY KEY);\n\
             CREATE TABLE c (id BIGINT AUTO_INCREMENT PRIMARY KEY);"
        );
        assert!(!outcome.fixed_schema.contains("TINYSERIAL"));
        assert!(!outcome.fixed_schema.contains("BIGSERIAL"));
    }

    #[test]
    fn test_apply_fails_when_only_a_longer_token_remains() {
        let ddl = "CREATE TABLE a (id INT AUTO_INCREMENT);";
        let mut result = engine().generate(
            &FixRequest::new(mysql_pg())
                .schema(ddl)
                .categories(vec![FixCategory::Syntax]),
        );
        result.accept("syntax-001").unwrap();

        let outcome = result.apply("CREATE TABLE a (id BIGINT AUTO_INCREMENT);", &[]);
        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.failed, vec!["syntax-001".to_string()]);
    }

    #[test]
    fn test_gains_are_distinct_in_first_seen_order() {
        let request = FixRequest::new(mysql_pg())
            .schema("CREATE TABLE orders (id INT, user_id INT, FOREIGN KEY (user_id) REFERENCES users(id));")
            .queries(vec![
                "SELECT * FROM a ORDER BY RAND()".to_string(),
                "SELECT * FROM b ORDER BY RAND()".to_string(),
            ])
            .categories(vec![FixCategory::Performance]);
        let mut result = engine().generate(&request);
        assert_eq!(result.fixes.len(), 3);

        // Interleave so equal impacts are no longer adjacent.
        result.fixes.swap(0, 1);
        result.refresh();
        assert_eq!(
            result.performance_gains,
            vec![
                "Statement runs on the target; consider TABLESAMPLE for large tables".to_string(),
                "Faster joins and cascading deletes".to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_nothing_is_identity() {
        let queries = vec!["SELECT `a` FROM t".to_string()];
        let outcome = apply_fixes(&mut [], DDL, &queries);
        assert_eq!(outcome.fixed_schema, DDL);
        assert_eq!(outcome.fixed_queries, queries);
        assert_eq!(outcome.applied_count, 0);
    }

    #[test]
    fn test_scores_clamp() {
        let query = (0..12).map(|i| format!("`c{}`", i)).collect::<Vec<_>>().join(", ");
        let result = engine().generate(&FixRequest::new(mysql_pg()).queries(vec![query]));
        assert_eq!(result.total_issues, 12);
        assert_eq!(result.score_before, 0.0);
    }
}
