//! Rule library: detection patterns paired with fix synthesizers.
//!
//! Every rule is tagged with a category, a default severity and a static
//! confidence. The library is built once and shared read-only; evaluation order
//! is category order first, then the order rules appear here.

use std::fmt;
use std::str::FromStr;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::{Scope, TargetFilter, pattern};
use crate::dialect::{Dialect, DialectPair};
use crate::error::{SqlportError, SqlportResult};
use crate::matcher::contains_token;
use crate::parser::{ObjectKind, SchemaObject, schema_objects};

/// Fix category. Declaration order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixCategory {
    Syntax,
    Compatibility,
    Performance,
    Security,
    Compliance,
    Optimization,
}

impl FixCategory {
    /// Fixed evaluation order.
    pub const ORDER: [FixCategory; 6] = [
        FixCategory::Syntax,
        FixCategory::Compatibility,
        FixCategory::Performance,
        FixCategory::Security,
        FixCategory::Compliance,
        FixCategory::Optimization,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Compatibility => "compatibility",
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Compliance => "compliance",
            Self::Optimization => "optimization",
        }
    }

    /// Optimization fixes are additive blocks with nothing to replace.
    pub const fn is_additive(&self) -> bool {
        matches!(self, Self::Optimization)
    }
}

impl fmt::Display for FixCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixCategory {
    type Err = SqlportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ORDER
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| SqlportError::UnknownCategory(s.to_string()))
    }
}

/// Severity of an issue or fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Cosmetic,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Cosmetic => "cosmetic",
        }
    }

    /// Only low and medium fixes may be applied without a human decision.
    pub const fn allows_auto_apply(&self) -> bool {
        matches!(self, Self::Low | Self::Medium)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One match of a rule: the text to replace and its replacement.
///
/// An empty `original` means the fix appends `fixed` as a new block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub original: String,
    pub fixed: String,
    /// Match-specific description, overriding the rule's generic one.
    pub detail: Option<String>,
}

impl Finding {
    pub fn replace(original: impl Into<String>, fixed: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            fixed: fixed.into(),
            detail: None,
        }
    }

    pub fn append(fixed: impl Into<String>) -> Self {
        Self::replace(String::new(), fixed)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// How a rewrite rule turns a match into its replacement.
#[derive(Clone)]
pub enum Replacement {
    /// Capture expansion template (`$1`, `${2}`).
    Template(&'static str),
    With(fn(&Captures<'_>) -> String),
}

type Synthesizer = fn(&Regex, &str, DialectPair) -> Vec<Finding>;

#[derive(Clone)]
enum Detector {
    /// One fix per distinct match, replacing the matched text.
    Rewrite { pattern: Regex, replace: Replacement },
    /// Pattern is a presence check; the synthesizer inspects the whole text.
    Structural { pattern: Regex, synth: Synthesizer },
}

const SCHEMA: &[Scope] = &[Scope::Schema];
const QUERY: &[Scope] = &[Scope::Query];
const BOTH: &[Scope] = &[Scope::Schema, Scope::Query];

/// A detection pattern plus fix synthesizer with static metadata.
#[derive(Clone)]
pub struct Rule {
    pub id: &'static str,
    pub category: FixCategory,
    pub severity: Severity,
    pub confidence: f64,
    /// Static eligibility for automatic application.
    pub auto_apply: bool,
    pub scopes: &'static [Scope],
    /// `None` matches any source dialect.
    pub source: Option<Dialect>,
    pub targets: TargetFilter,
    pub title: &'static str,
    pub description: &'static str,
    pub explanation: &'static str,
    pub impact: &'static str,
    pub prerequisites: &'static [&'static str],
    pub warnings: &'static [&'static str],
    detector: Detector,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

impl Rule {
    fn rewrite(
        id: &'static str,
        category: FixCategory,
        severity: Severity,
        confidence: f64,
        re: &str,
        replace: Replacement,
    ) -> SqlportResult<Self> {
        Ok(Self::with_detector(
            id,
            category,
            severity,
            confidence,
            Detector::Rewrite {
                pattern: pattern(id, re)?,
                replace,
            },
        ))
    }

    fn structural(
        id: &'static str,
        category: FixCategory,
        severity: Severity,
        confidence: f64,
        re: &str,
        synth: Synthesizer,
    ) -> SqlportResult<Self> {
        Ok(Self::with_detector(
            id,
            category,
            severity,
            confidence,
            Detector::Structural {
                pattern: pattern(id, re)?,
                synth,
            },
        ))
    }

    fn with_detector(
        id: &'static str,
        category: FixCategory,
        severity: Severity,
        confidence: f64,
        detector: Detector,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            auto_apply: false,
            scopes: BOTH,
            source: None,
            targets: TargetFilter::Other,
            title: "",
            description: "",
            explanation: "",
            impact: "",
            prerequisites: &[],
            warnings: &[],
            detector,
        }
    }

    fn auto(mut self) -> Self {
        self.auto_apply = true;
        self
    }

    fn scopes(mut self, scopes: &'static [Scope]) -> Self {
        self.scopes = scopes;
        self
    }

    fn for_source(mut self, source: Dialect) -> Self {
        self.source = Some(source);
        self
    }

    fn for_targets(mut self, targets: TargetFilter) -> Self {
        self.targets = targets;
        self
    }

    fn text(
        mut self,
        title: &'static str,
        description: &'static str,
        explanation: &'static str,
        impact: &'static str,
    ) -> Self {
        self.title = title;
        self.description = description;
        self.explanation = explanation;
        self.impact = impact;
        self
    }

    fn prerequisites(mut self, prerequisites: &'static [&'static str]) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    fn warnings(mut self, warnings: &'static [&'static str]) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn applies_to(&self, pair: DialectPair, scope: Scope) -> bool {
        self.scopes.contains(&scope)
            && self.source.is_none_or(|source| source == pair.source)
            && self.targets.accepts(pair)
    }

    /// Run detection over `text`. Rewrite rules yield one finding per distinct
    /// matched text, in match order.
    pub fn detect(&self, pair: DialectPair, text: &str) -> Vec<Finding> {
        let findings = match &self.detector {
            Detector::Rewrite { pattern, replace } => {
                let mut findings: Vec<Finding> = Vec::new();
                for caps in pattern.captures_iter(text) {
                    let original = &caps[0];
                    if findings.iter().any(|f| f.original == original) {
                        continue;
                    }
                    let fixed = match replace {
                        Replacement::Template(template) => {
                            let mut out = String::new();
                            caps.expand(template, &mut out);
                            out
                        }
                        Replacement::With(build) => build(&caps),
                    };
                    findings.push(Finding::replace(original, fixed));
                }
                findings
            }
            Detector::Structural { pattern, synth } => {
                if pattern.is_match(text) {
                    synth(pattern, text, pair)
                } else {
                    Vec::new()
                }
            }
        };
        if !findings.is_empty() {
            trace!(rule = self.id, hits = findings.len(), "rule matched");
        }
        findings
    }
}

/// Ordered, immutable set of rules.
#[derive(Debug, Clone)]
pub struct RuleLibrary {
    rules: Vec<Rule>,
}

impl RuleLibrary {
    /// The built-in rules.
    pub fn builtin() -> SqlportResult<Self> {
        Ok(Self {
            rules: builtin_rules()?,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules of one category, in library order.
    pub fn in_category(&self, category: FixCategory) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// Synthesizers
// ============================================================================

/// MySQL integer key column: type, optional display width, sign and
/// nullability modifiers, then `AUTO_INCREMENT`.
const AUTO_INCREMENT_COLUMN: &str = r"(?i)\b(TINYINT|SMALLINT|MEDIUMINT|INTEGER|INT|BIGINT)(?:\s*\(\s*\d+\s*\))?((?:\s+(?:UNSIGNED|SIGNED|NOT\s+NULL|NULL))*)\s+AUTO_INCREMENT\b";

fn modifiers(caps: &Captures<'_>) -> Vec<String> {
    caps.get(2)
        .map_or("", |m| m.as_str())
        .split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect()
}

fn not_null(modifiers: &[String]) -> &'static str {
    if modifiers.iter().any(|m| m == "NOT") {
        " NOT NULL"
    } else {
        ""
    }
}

fn serial_column(caps: &Captures<'_>) -> String {
    let modifiers = modifiers(caps);
    let unsigned = modifiers.iter().any(|m| m == "UNSIGNED");
    // Unsigned ranges only fit the next wider serial.
    let serial = match (caps[1].to_ascii_uppercase().as_str(), unsigned) {
        ("TINYINT", _) | ("SMALLINT", false) => "SMALLSERIAL",
        ("INT" | "INTEGER", true) | ("BIGINT", _) => "BIGSERIAL",
        _ => "SERIAL",
    };
    format!("{}{}", serial, not_null(&modifiers))
}

fn oracle_identity_column(caps: &Captures<'_>) -> String {
    let number = match caps[1].to_ascii_uppercase().as_str() {
        "TINYINT" => "NUMBER(3)",
        "SMALLINT" => "NUMBER(5)",
        "MEDIUMINT" => "NUMBER(7)",
        "BIGINT" => "NUMBER(19)",
        _ => "NUMBER(10)",
    };
    format!("{} GENERATED BY DEFAULT AS IDENTITY", number)
}

fn sqlserver_identity_column(caps: &Captures<'_>) -> String {
    let kind = match caps[1].to_ascii_uppercase().as_str() {
        "TINYINT" => "TINYINT",
        "SMALLINT" => "SMALLINT",
        "BIGINT" => "BIGINT",
        _ => "INT",
    };
    format!("{} IDENTITY(1,1){}", kind, not_null(&modifiers(caps)))
}

fn tables(ddl: &str) -> impl Iterator<Item = SchemaObject> {
    schema_objects(ddl)
        .into_iter()
        .filter(|o| o.kind == ObjectKind::Table)
}

fn index_foreign_keys(fk: &Regex, ddl: &str, _pair: DialectPair) -> Vec<Finding> {
    // Whitespace-free lowercase copy: `ON orders (user_id` and `on orders(user_id` compare equal.
    let squashed: String = ddl.to_ascii_lowercase().split_whitespace().collect();
    let mut findings = Vec::new();
    for table in tables(ddl) {
        for caps in fk.captures_iter(&table.definition) {
            let column = caps[1].trim_matches(|c| c == '"' || c == '`');
            let key = format!("on{}({}", table.name.to_ascii_lowercase(), column.to_ascii_lowercase());
            if squashed.contains(&key) {
                continue;
            }
            findings.push(
                Finding::append(format!(
                    "CREATE INDEX idx_{table}_{column} ON {table} ({column});",
                    table = table.name,
                    column = column
                ))
                .with_detail(format!(
                    "Foreign key {}.{} has no supporting index",
                    table.name, column
                )),
            );
        }
    }
    findings
}

fn created_at_column(table: &str, target: Dialect) -> String {
    match target {
        Dialect::MySql => format!(
            "ALTER TABLE {table} ADD COLUMN created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP;"
        ),
        Dialect::Oracle => {
            format!("ALTER TABLE {table} ADD created_at TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL;")
        }
        Dialect::SqlServer => {
            format!("ALTER TABLE {table} ADD created_at DATETIME2 NOT NULL DEFAULT SYSUTCDATETIME();")
        }
        _ => format!(
            "ALTER TABLE {table} ADD COLUMN created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP;"
        ),
    }
}

fn audit_columns(_: &Regex, ddl: &str, pair: DialectPair) -> Vec<Finding> {
    let missing: Vec<String> = tables(ddl)
        .filter(|t| !contains_token(&t.definition, "created_at"))
        .map(|t| t.name)
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }

    let mut block = String::from("-- Audit columns");
    for table in &missing {
        block.push('\n');
        block.push_str(&created_at_column(table, pair.target));
    }
    vec![Finding::append(block).with_detail(format!(
        "Tables without a created_at audit column: {}",
        missing.join(", ")
    ))]
}

fn refresh_statistics(table: &str, target: Dialect) -> String {
    match target {
        Dialect::MySql => format!("ANALYZE TABLE {table};"),
        Dialect::SqlServer => format!("UPDATE STATISTICS {table};"),
        Dialect::Oracle => format!(
            "EXEC DBMS_STATS.GATHER_TABLE_STATS(USER, '{}');",
            table.to_ascii_uppercase()
        ),
        _ => format!("ANALYZE {table};"),
    }
}

fn statistics_block(_: &Regex, ddl: &str, pair: DialectPair) -> Vec<Finding> {
    let names: Vec<String> = tables(ddl).map(|t| t.name).collect();
    if names.is_empty() {
        return Vec::new();
    }
    let mut block = String::from("-- Refresh planner statistics after the data load");
    for name in &names {
        block.push('\n');
        block.push_str(&refresh_statistics(name, pair.target));
    }
    vec![Finding::append(block)]
}

fn document_table(name: &str, target: Dialect) -> String {
    let (id, document, now) = match target {
        Dialect::MySql => ("CHAR(36)", "JSON", "CURRENT_TIMESTAMP"),
        Dialect::Oracle => ("RAW(16)", "CLOB", "SYSTIMESTAMP"),
        Dialect::SqlServer => ("UNIQUEIDENTIFIER", "NVARCHAR(MAX)", "SYSUTCDATETIME()"),
        _ => ("UUID", "JSONB", "CURRENT_TIMESTAMP"),
    };
    let stamp = if target == Dialect::SqlServer { "DATETIME2" } else { "TIMESTAMP" };
    format!(
        "CREATE TABLE {name} (\n    id {id} PRIMARY KEY,\n    document {document} NOT NULL,\n    created_at {stamp} DEFAULT {now} NOT NULL\n);"
    )
}

fn collection_tables(_: &Regex, ddl: &str, pair: DialectPair) -> Vec<Finding> {
    let collections: Vec<SchemaObject> = schema_objects(ddl)
        .into_iter()
        .filter(|o| o.kind == ObjectKind::Collection)
        .collect();
    if collections.is_empty() {
        return Vec::new();
    }
    let block = collections
        .iter()
        .map(|c| document_table(&c.name, pair.target))
        .collect::<Vec<_>>()
        .join("\n\n");
    vec![Finding::append(block)]
}

// ============================================================================
// Built-in rules
// ============================================================================

fn builtin_rules() -> SqlportResult<Vec<Rule>> {
    use Dialect::*;
    use FixCategory::*;
    use Replacement::{Template, With};

    Ok(vec![
        // Syntax
        Rule::rewrite(
            "auto-increment-to-serial",
            Syntax,
            Severity::High,
            0.95,
            AUTO_INCREMENT_COLUMN,
            With(serial_column),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Postgres]))
        .text(
            "Convert AUTO_INCREMENT to SERIAL",
            "MySQL AUTO_INCREMENT column must become a PostgreSQL SERIAL column",
            "SERIAL creates an owned sequence and sets the column default to its next value.",
            "Keeps surrogate key generation working after migration",
        )
        .warnings(&["Reset the sequence to MAX(id) + 1 after loading existing rows"]),
        Rule::rewrite(
            "auto-increment-to-identity",
            Syntax,
            Severity::High,
            0.9,
            AUTO_INCREMENT_COLUMN,
            With(oracle_identity_column),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Oracle]))
        .text(
            "Convert AUTO_INCREMENT to identity column",
            "MySQL AUTO_INCREMENT column must become an identity column",
            "Oracle 12c and later generate keys through identity columns.",
            "Keeps surrogate key generation working after migration",
        )
        .prerequisites(&["Oracle Database 12c or later"]),
        Rule::rewrite(
            "auto-increment-to-sqlserver-identity",
            Syntax,
            Severity::High,
            0.9,
            AUTO_INCREMENT_COLUMN,
            With(sqlserver_identity_column),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![SqlServer]))
        .text(
            "Convert AUTO_INCREMENT to IDENTITY(1,1)",
            "MySQL AUTO_INCREMENT column must become an IDENTITY column",
            "SQL Server generates keys through the IDENTITY property.",
            "Keeps surrogate key generation working after migration",
        )
        .warnings(&["Explicit key inserts need SET IDENTITY_INSERT ON"]),
        Rule::rewrite(
            "identity-to-generated",
            Syntax,
            Severity::High,
            0.9,
            r"(?i)\bIDENTITY\s*\(\s*\d+\s*,\s*\d+\s*\)",
            Template("GENERATED BY DEFAULT AS IDENTITY"),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(SqlServer)
        .for_targets(TargetFilter::Only(vec![Postgres, Oracle]))
        .text(
            "Convert IDENTITY(seed, step) to a standard identity column",
            "SQL Server IDENTITY property has no direct equivalent",
            "GENERATED BY DEFAULT AS IDENTITY is the SQL standard form.",
            "Keeps surrogate key generation working after migration",
        )
        .warnings(&["Custom seed and step values are not carried over"]),
        Rule::rewrite(
            "backtick-identifiers",
            Syntax,
            Severity::Low,
            0.98,
            r"`([^`]+)`",
            Template("\"${1}\""),
        )?
        .auto()
        .for_source(MySql)
        .text(
            "Quote identifiers with double quotes",
            "MySQL backtick-quoted identifier",
            "Standard SQL quotes identifiers with double quotes.",
            "Statement parses on the target engine",
        )
        .warnings(&["Double-quoted identifiers are case-sensitive on PostgreSQL and Oracle"]),
        Rule::rewrite(
            "limit-offset",
            Syntax,
            Severity::Medium,
            0.92,
            r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)",
            Template("LIMIT $2 OFFSET $1"),
        )?
        .auto()
        .scopes(QUERY)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Postgres]))
        .text(
            "Rewrite LIMIT offset, count",
            "MySQL two-argument LIMIT is not valid PostgreSQL",
            "PostgreSQL takes the row count in LIMIT and the skip count in OFFSET.",
            "Statement parses on the target engine",
        ),
        // Compatibility
        Rule::rewrite(
            "ifnull-to-coalesce",
            Compatibility,
            Severity::Low,
            0.97,
            r"(?i)\bIFNULL\s*\(",
            Template("COALESCE("),
        )?
        .auto()
        .for_source(MySql)
        .text(
            "Replace IFNULL with COALESCE",
            "IFNULL is MySQL-specific",
            "COALESCE is standard SQL and behaves identically for two arguments.",
            "Function call portable across engines",
        ),
        Rule::rewrite(
            "nvl-to-coalesce",
            Compatibility,
            Severity::Low,
            0.97,
            r"(?i)\bNVL\s*\(",
            Template("COALESCE("),
        )?
        .auto()
        .for_source(Oracle)
        .text(
            "Replace NVL with COALESCE",
            "NVL is Oracle-specific",
            "COALESCE is standard SQL and behaves identically for two arguments.",
            "Function call portable across engines",
        ),
        Rule::rewrite(
            "isnull-to-coalesce",
            Compatibility,
            Severity::Low,
            0.97,
            r"(?i)\bISNULL\s*\(",
            Template("COALESCE("),
        )?
        .auto()
        .for_source(SqlServer)
        .text(
            "Replace ISNULL with COALESCE",
            "ISNULL is SQL Server-specific",
            "COALESCE is standard SQL; its result type follows all arguments, not the first.",
            "Function call portable across engines",
        ),
        Rule::rewrite(
            "getdate-to-current-timestamp",
            Compatibility,
            Severity::Low,
            0.97,
            r"(?i)\bGETDATE\s*\(\s*\)",
            Template("CURRENT_TIMESTAMP"),
        )?
        .auto()
        .for_source(SqlServer)
        .text(
            "Replace GETDATE() with CURRENT_TIMESTAMP",
            "GETDATE() is SQL Server-specific",
            "CURRENT_TIMESTAMP is standard SQL.",
            "Function call portable across engines",
        ),
        Rule::rewrite(
            "sysdate-to-current-timestamp",
            Compatibility,
            Severity::Low,
            0.95,
            r"(?i)\bSYSDATE\b",
            Template("CURRENT_TIMESTAMP"),
        )?
        .auto()
        .for_source(Oracle)
        .text(
            "Replace SYSDATE with CURRENT_TIMESTAMP",
            "SYSDATE is Oracle-specific",
            "CURRENT_TIMESTAMP is standard SQL.",
            "Function call portable across engines",
        )
        .warnings(&["CURRENT_TIMESTAMP carries the session time zone"]),
        Rule::rewrite(
            "tinyint-to-boolean",
            Compatibility,
            Severity::Low,
            0.9,
            r"(?i)\bTINYINT\s*\(\s*1\s*\)",
            Template("BOOLEAN"),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Postgres]))
        .text(
            "Convert TINYINT(1) to BOOLEAN",
            "MySQL TINYINT(1) flag column",
            "PostgreSQL has a native BOOLEAN type.",
            "Flag columns keep their meaning with a stricter type",
        )
        .warnings(&["Integer literals 0/1 in queries must become FALSE/TRUE"]),
        Rule::rewrite(
            "datetime-to-timestamp",
            Compatibility,
            Severity::Low,
            0.96,
            r"(?i)\bDATETIME\b",
            Template("TIMESTAMP"),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Postgres]))
        .text(
            "Convert DATETIME to TIMESTAMP",
            "PostgreSQL has no DATETIME type",
            "TIMESTAMP without time zone stores the same values.",
            "Column definition accepted by the target engine",
        ),
        Rule::rewrite(
            "drop-default-charset",
            Compatibility,
            Severity::Low,
            0.93,
            r"(?i)\s*(?:DEFAULT\s+)?(?:CHARSET|CHARACTER\s+SET)\s*=\s*\w+",
            Template(""),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .text(
            "Remove table character set option",
            "MySQL table-level DEFAULT CHARSET option",
            "The target stores text in the database encoding.",
            "Table definition accepted by the target engine",
        )
        .prerequisites(&["Target database created with UTF-8 encoding"]),
        Rule::rewrite(
            "drop-storage-engine",
            Compatibility,
            Severity::Medium,
            0.85,
            r"(?i)\s*\bENGINE\s*=\s*\w+",
            Template(""),
        )?
        .auto()
        .scopes(SCHEMA)
        .for_source(MySql)
        .text(
            "Remove storage engine option",
            "MySQL ENGINE= table option",
            "Storage engines are a MySQL concept with no counterpart on the target.",
            "Table definition accepted by the target engine",
        )
        .warnings(&["MyISAM tables gain transactional semantics"]),
        Rule::structural(
            "collections-to-tables",
            Compatibility,
            Severity::Critical,
            0.6,
            r#"db\.createCollection\s*\(\s*["']"#,
            collection_tables,
        )?
        .scopes(SCHEMA)
        .for_source(MongoDb)
        .for_targets(TargetFilter::Relational)
        .text(
            "Create staging tables for collections",
            "Document collections have no relational counterpart",
            "Each collection lands in a table holding the raw document until a normalized model exists.",
            "Unblocks data loading while the relational redesign proceeds",
        )
        .prerequisites(&["Relational data model designed for each collection"])
        .warnings(&["Staging tables are not a normalized schema"]),
        // Performance
        Rule::structural(
            "index-foreign-keys",
            Performance,
            Severity::Medium,
            0.85,
            r#"(?i)FOREIGN\s+KEY\s*\(\s*([\w"`]+)\s*\)"#,
            index_foreign_keys,
        )?
        .auto()
        .scopes(SCHEMA)
        .for_targets(TargetFilter::Only(vec![Postgres, Oracle, SqlServer]))
        .text(
            "Index foreign key column",
            "Foreign key column without an index",
            "Unlike MySQL InnoDB, the target does not index referencing columns automatically.",
            "Faster joins and cascading deletes",
        ),
        Rule::rewrite(
            "order-by-rand",
            Performance,
            Severity::Medium,
            0.9,
            r"(?i)\bORDER\s+BY\s+RAND\s*\(\s*\)",
            Template("ORDER BY RANDOM()"),
        )?
        .auto()
        .scopes(QUERY)
        .for_source(MySql)
        .for_targets(TargetFilter::Only(vec![Postgres]))
        .text(
            "Replace ORDER BY RAND()",
            "RAND() does not exist in PostgreSQL",
            "RANDOM() is the PostgreSQL equivalent; both sort the full result.",
            "Statement runs on the target; consider TABLESAMPLE for large tables",
        ),
        // Security
        Rule::rewrite(
            "plaintext-password-column",
            Security,
            Severity::High,
            0.6,
            r"(?i)\bpassword\s+(VARCHAR|CHAR|TEXT)\b",
            Template("password_hash $1"),
        )?
        .scopes(SCHEMA)
        .text(
            "Store password hashes instead of passwords",
            "Column named password suggests plaintext credentials",
            "Renaming the column forces the application to write a hash.",
            "Credentials no longer readable from backups",
        )
        .prerequisites(&["Application hashes passwords before storing them"])
        .warnings(&["Existing rows must be re-hashed"]),
        Rule::rewrite(
            "grant-all-privileges",
            Security,
            Severity::Critical,
            0.7,
            r"(?i)\bGRANT\s+ALL(?:\s+PRIVILEGES)?\s+ON\b",
            Template("GRANT SELECT, INSERT, UPDATE, DELETE ON"),
        )?
        .text(
            "Narrow GRANT ALL",
            "GRANT ALL gives DDL and administrative rights",
            "Application roles normally need only data manipulation rights.",
            "Least-privilege access on the target",
        )
        .warnings(&["Roles that run migrations need additional grants"]),
        // Compliance
        Rule::structural(
            "audit-created-at",
            Compliance,
            Severity::Low,
            0.8,
            r"(?i)\bCREATE\s+TABLE\b",
            audit_columns,
        )?
        .scopes(SCHEMA)
        .for_targets(TargetFilter::Relational)
        .text(
            "Add created_at audit columns",
            "Tables without a creation timestamp",
            "Record creation time supports retention and audit requirements.",
            "Every row carries its creation time",
        ),
        // Optimization
        Rule::structural(
            "refresh-statistics",
            Optimization,
            Severity::Low,
            0.92,
            r"(?i)\bCREATE\s+TABLE\b",
            statistics_block,
        )?
        .auto()
        .scopes(SCHEMA)
        .for_targets(TargetFilter::Relational)
        .text(
            "Refresh planner statistics",
            "Freshly loaded tables have no statistics",
            "The planner needs row estimates to choose good plans after a bulk load.",
            "Stable query plans right after cut-over",
        ),
    ])
}
