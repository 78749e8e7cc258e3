//! Dialect catalog: per-pair type and function mappings plus the per-source
//! heuristics the analyzers score against.
//!
//! The catalog is plain data. Analyzers never branch on a dialect themselves,
//! so teaching sqlport a new pair means adding rows here, nothing else.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::IssueKind;
use crate::dialect::{Dialect, DialectPair};
use crate::error::{SqlportError, SqlportResult};
use crate::matcher::{contains_token, find_tokens};
use crate::rules::Severity;

/// How well a source type survives the trip to the target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCompatibility {
    Compatible,
    PartiallyCompatible,
    Incompatible,
    RequiresManualReview,
}

/// Data type mapping between engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub source_type: String,
    pub target_type: String,
    pub compatibility: TypeCompatibility,
    pub note: String,
    pub precision_loss: bool,
    /// Only a type when a value list follows, as in `SET('a','b')`. Keeps
    /// `ON DELETE SET NULL` and `CHARACTER SET` out.
    #[serde(default)]
    pub takes_values: bool,
}

impl TypeMapping {
    pub fn new(
        source_type: &str,
        target_type: &str,
        compatibility: TypeCompatibility,
        note: &str,
        precision_loss: bool,
    ) -> Self {
        Self {
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
            compatibility,
            note: note.to_string(),
            precision_loss,
            takes_values: false,
        }
    }

    pub fn with_values(mut self) -> Self {
        self.takes_values = true;
        self
    }

    /// True if the source type is used somewhere in `ddl`.
    pub fn occurs_in(&self, ddl: &str) -> bool {
        let mut hits = find_tokens(ddl, &self.source_type).into_iter();
        if self.takes_values {
            hits.any(|range| ddl[range.end..].trim_start().starts_with('('))
        } else {
            hits.next().is_some()
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source_type == self.target_type
    }

    /// Targets such as `VARCHAR[]` hold several values per column.
    pub fn targets_array(&self) -> bool {
        self.target_type.ends_with("[]")
    }
}

/// Function (or operator) rename between engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMapping {
    pub source_fn: String,
    pub target_fn: String,
}

impl FunctionMapping {
    pub fn new(source_fn: &str, target_fn: &str) -> Self {
        Self {
            source_fn: source_fn.to_string(),
            target_fn: target_fn.to_string(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source_fn == self.target_fn
    }
}

/// Mapping tables for one dialect pair.
#[derive(Debug, Clone, Default)]
pub struct PairTables {
    pub types: Vec<TypeMapping>,
    pub functions: Vec<FunctionMapping>,
}

/// Which input a heuristic inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Schema,
    Query,
}

/// Which targets a heuristic applies to, given its source dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetFilter {
    /// Any target other than the source itself.
    Other,
    Only(Vec<Dialect>),
    Relational,
}

impl TargetFilter {
    pub fn accepts(&self, pair: DialectPair) -> bool {
        match self {
            TargetFilter::Other => pair.source != pair.target,
            TargetFilter::Only(targets) => targets.contains(&pair.target),
            TargetFilter::Relational => pair.target.is_relational(),
        }
    }
}

/// What makes a heuristic fire.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Whole-token, case-insensitive name.
    Token(String),
    /// Raw substring, case-sensitive.
    Literal(String),
    Pattern(Regex),
    /// Any input with non-whitespace content.
    NonEmpty,
}

impl Trigger {
    pub fn fires(&self, text: &str) -> bool {
        match self {
            Trigger::Token(token) => contains_token(text, token),
            Trigger::Literal(literal) => text.contains(literal.as_str()),
            Trigger::Pattern(re) => re.is_match(text),
            Trigger::NonEmpty => !text.trim().is_empty(),
        }
    }
}

/// Text change a heuristic contributes to the converted code.
#[derive(Debug, Clone)]
pub enum Rewrite {
    Literal { from: String, to: String },
    /// Expansion template for a `Trigger::Pattern` (`$1`, `$2`, ...).
    Template(String),
}

/// A dialect-specific check with a fixed penalty and message.
#[derive(Debug, Clone)]
pub struct Heuristic {
    pub source: Dialect,
    pub targets: TargetFilter,
    pub scope: Scope,
    pub trigger: Trigger,
    pub kind: IssueKind,
    pub severity: Severity,
    pub penalty: f64,
    pub issue: String,
    pub recommendation: Option<String>,
    pub rewrite: Option<Rewrite>,
}

impl Heuristic {
    pub fn applies_to(&self, pair: DialectPair, scope: Scope) -> bool {
        self.scope == scope && self.source == pair.source && self.targets.accepts(pair)
    }

    /// Apply this heuristic's rewrite (if any) to `text`.
    pub fn rewrite(&self, text: &str) -> String {
        match (&self.rewrite, &self.trigger) {
            (Some(Rewrite::Literal { from, to }), _) => text.replace(from.as_str(), to),
            (Some(Rewrite::Template(template)), Trigger::Pattern(re)) => {
                re.replace_all(text, template.as_str()).into_owned()
            }
            _ => text.to_string(),
        }
    }
}

/// Immutable per-pair mapping tables and heuristics.
#[derive(Debug, Clone, Default)]
pub struct DialectCatalog {
    pairs: BTreeMap<DialectPair, PairTables>,
    heuristics: Vec<Heuristic>,
}

impl DialectCatalog {
    /// A catalog with no pairs and no heuristics.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in tables.
    pub fn builtin() -> SqlportResult<Self> {
        use Dialect::*;

        let mut catalog = Self::empty()
            .with_types(DialectPair::new(MySql, Postgres), mysql_to_postgres_types())
            .with_types(DialectPair::new(MySql, Oracle), mysql_to_oracle_types())
            .with_types(DialectPair::new(Oracle, Postgres), oracle_to_postgres_types())
            .with_types(DialectPair::new(SqlServer, Postgres), sqlserver_to_postgres_types())
            .with_types(DialectPair::new(MongoDb, Postgres), mongodb_to_postgres_types())
            .with_functions(DialectPair::new(MySql, Postgres), mysql_to_postgres_functions())
            .with_functions(DialectPair::new(Oracle, Postgres), oracle_to_postgres_functions())
            .with_functions(
                DialectPair::new(SqlServer, Postgres),
                sqlserver_to_postgres_functions(),
            )
            .with_functions(DialectPair::new(MongoDb, Postgres), mongodb_to_postgres_functions());

        for heuristic in builtin_heuristics()? {
            catalog = catalog.with_heuristic(heuristic);
        }
        Ok(catalog)
    }

    /// Add (or extend) the type table for a pair.
    pub fn with_types(mut self, pair: DialectPair, types: Vec<TypeMapping>) -> Self {
        self.pairs.entry(pair).or_default().types.extend(types);
        self
    }

    /// Add (or extend) the function table for a pair.
    pub fn with_functions(mut self, pair: DialectPair, functions: Vec<FunctionMapping>) -> Self {
        self.pairs.entry(pair).or_default().functions.extend(functions);
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristics.push(heuristic);
        self
    }

    /// Mapping tables for a pair. Unknown pairs get empty tables, never an error.
    pub fn lookup(&self, pair: DialectPair) -> (&[TypeMapping], &[FunctionMapping]) {
        match self.pairs.get(&pair) {
            Some(tables) => (tables.types.as_slice(), tables.functions.as_slice()),
            None => (&[], &[]),
        }
    }

    /// Heuristics that apply to `pair` in `scope`, in catalog order.
    pub fn heuristics(&self, pair: DialectPair, scope: Scope) -> impl Iterator<Item = &Heuristic> {
        self.heuristics
            .iter()
            .filter(move |h| h.applies_to(pair, scope))
    }

    /// Pairs with at least one mapping table, in stable order.
    pub fn pairs(&self) -> impl Iterator<Item = (&DialectPair, &PairTables)> {
        self.pairs.iter()
    }

    pub fn knows(&self, pair: DialectPair) -> bool {
        self.pairs.contains_key(&pair)
    }
}

// ============================================================================
// Built-in tables
// ============================================================================

use TypeCompatibility::{Compatible, PartiallyCompatible, RequiresManualReview};

fn mysql_to_postgres_types() -> Vec<TypeMapping> {
    vec![
        TypeMapping::new("VARCHAR", "VARCHAR", Compatible, "", false),
        TypeMapping::new("TEXT", "TEXT", Compatible, "", false),
        TypeMapping::new("INT", "INTEGER", Compatible, "", false),
        TypeMapping::new("BIGINT", "BIGINT", Compatible, "", false),
        TypeMapping::new("DECIMAL", "NUMERIC", Compatible, "same precision semantics", false),
        TypeMapping::new("DATETIME", "TIMESTAMP", Compatible, "no time zone is stored", false),
        TypeMapping::new("TINYINT(1)", "BOOLEAN", PartiallyCompatible, "0/1 become false/true", false),
        TypeMapping::new("LONGTEXT", "TEXT", Compatible, "", false),
        TypeMapping::new("MEDIUMTEXT", "TEXT", Compatible, "", false),
        TypeMapping::new("ENUM", "VARCHAR", PartiallyCompatible, "add a CHECK constraint for the allowed values", false),
        TypeMapping::new("SET", "VARCHAR[]", RequiresManualReview, "multi-value column becomes an array", false)
            .with_values(),
        TypeMapping::new("TIMESTAMP", "TIMESTAMP WITH TIME ZONE", PartiallyCompatible, "session time zone is applied on read", false),
    ]
}

fn mysql_to_oracle_types() -> Vec<TypeMapping> {
    vec![
        TypeMapping::new("VARCHAR", "VARCHAR2", Compatible, "", false),
        TypeMapping::new("TEXT", "CLOB", Compatible, "", false),
        TypeMapping::new("INT", "NUMBER(10)", Compatible, "", false),
        TypeMapping::new("BIGINT", "NUMBER(19)", Compatible, "", false),
        TypeMapping::new("DECIMAL", "NUMBER", Compatible, "", false),
        TypeMapping::new("DATETIME", "DATE", PartiallyCompatible, "fractional seconds are dropped", true),
        TypeMapping::new("TINYINT(1)", "NUMBER(1)", Compatible, "", false),
        TypeMapping::new("LONGTEXT", "CLOB", Compatible, "", false),
        TypeMapping::new("TIMESTAMP", "TIMESTAMP", Compatible, "", false),
    ]
}

fn oracle_to_postgres_types() -> Vec<TypeMapping> {
    vec![
        TypeMapping::new("VARCHAR2", "VARCHAR", Compatible, "", false),
        TypeMapping::new("CLOB", "TEXT", Compatible, "", false),
        TypeMapping::new("NUMBER", "NUMERIC", PartiallyCompatible, "review precision and scale", false),
        TypeMapping::new("DATE", "TIMESTAMP", Compatible, "Oracle DATE carries a time part", false),
        TypeMapping::new("TIMESTAMP", "TIMESTAMP", Compatible, "", false),
        TypeMapping::new("RAW", "BYTEA", Compatible, "", false),
        TypeMapping::new("LONG", "TEXT", Compatible, "", false),
    ]
}

fn sqlserver_to_postgres_types() -> Vec<TypeMapping> {
    vec![
        TypeMapping::new("NVARCHAR", "VARCHAR", Compatible, "PostgreSQL strings are UTF-8", false),
        TypeMapping::new("NTEXT", "TEXT", Compatible, "", false),
        TypeMapping::new("INT", "INTEGER", Compatible, "", false),
        TypeMapping::new("BIGINT", "BIGINT", Compatible, "", false),
        TypeMapping::new("DECIMAL", "NUMERIC", Compatible, "", false),
        TypeMapping::new("DATETIME", "TIMESTAMP", Compatible, "", false),
        TypeMapping::new("DATETIME2", "TIMESTAMP", PartiallyCompatible, "precision above microseconds is truncated", true),
        TypeMapping::new("BIT", "BOOLEAN", Compatible, "", false),
        TypeMapping::new("UNIQUEIDENTIFIER", "UUID", Compatible, "", false),
        TypeMapping::new("MONEY", "MONEY", PartiallyCompatible, "currency formatting follows lc_monetary", false),
    ]
}

fn mongodb_to_postgres_types() -> Vec<TypeMapping> {
    vec![
        TypeMapping::new("string", "VARCHAR", Compatible, "", false),
        TypeMapping::new("number", "NUMERIC", Compatible, "", false),
        TypeMapping::new("boolean", "BOOLEAN", Compatible, "", false),
        TypeMapping::new("date", "TIMESTAMP", Compatible, "", false),
        TypeMapping::new("objectId", "UUID", RequiresManualReview, "ObjectId values need a re-keying strategy", false),
        TypeMapping::new("array", "JSONB", PartiallyCompatible, "consider a child table instead", false),
    ]
}

fn mysql_to_postgres_functions() -> Vec<FunctionMapping> {
    [
        ("CONCAT", "CONCAT"),
        ("LENGTH", "LENGTH"),
        ("SUBSTRING", "SUBSTRING"),
        ("NOW()", "NOW()"),
        ("DATE_FORMAT", "TO_CHAR"),
        ("STR_TO_DATE", "TO_DATE"),
        ("IFNULL", "COALESCE"),
        ("IF", "CASE WHEN"),
        ("LIMIT", "LIMIT"),
        ("GROUP_CONCAT", "STRING_AGG"),
    ]
    .into_iter()
    .map(|(s, t)| FunctionMapping::new(s, t))
    .collect()
}

fn oracle_to_postgres_functions() -> Vec<FunctionMapping> {
    [
        ("SYSDATE", "NOW()"),
        ("TO_DATE", "TO_TIMESTAMP"),
        ("TO_CHAR", "TO_CHAR"),
        ("NVL", "COALESCE"),
        ("DECODE", "CASE WHEN"),
        ("ROWNUM", "ROW_NUMBER()"),
        ("SUBSTR", "SUBSTRING"),
        ("INSTR", "POSITION"),
    ]
    .into_iter()
    .map(|(s, t)| FunctionMapping::new(s, t))
    .collect()
}

fn sqlserver_to_postgres_functions() -> Vec<FunctionMapping> {
    [
        ("GETDATE()", "NOW()"),
        ("LEN", "LENGTH"),
        ("ISNULL", "COALESCE"),
        ("CHARINDEX", "POSITION"),
        ("DATEDIFF", "EXTRACT"),
        ("TOP", "LIMIT"),
        ("NEWID()", "GEN_RANDOM_UUID()"),
    ]
    .into_iter()
    .map(|(s, t)| FunctionMapping::new(s, t))
    .collect()
}

fn mongodb_to_postgres_functions() -> Vec<FunctionMapping> {
    [
        ("$match", "WHERE"),
        ("$group", "GROUP BY"),
        ("$sort", "ORDER BY"),
        ("$limit", "LIMIT"),
        ("$lookup", "JOIN"),
    ]
    .into_iter()
    .map(|(s, t)| FunctionMapping::new(s, t))
    .collect()
}

pub(crate) fn pattern(name: &str, re: &str) -> SqlportResult<Regex> {
    Regex::new(re).map_err(|e| SqlportError::pattern(name, e.to_string()))
}

/// MySQL `LIMIT offset, count`. Each target family pages differently.
fn limit_offset(
    targets: Vec<Dialect>,
    recommendation: Option<&str>,
    rewrite: Option<&str>,
) -> SqlportResult<Heuristic> {
    Ok(Heuristic {
        source: Dialect::MySql,
        targets: TargetFilter::Only(targets),
        scope: Scope::Query,
        trigger: Trigger::Pattern(pattern("limit-offset", r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)")?),
        kind: IssueKind::LimitSyntax,
        severity: Severity::Medium,
        penalty: 8.0,
        issue: "MySQL LIMIT offset syntax needs conversion to OFFSET".to_string(),
        recommendation: recommendation.map(str::to_string),
        rewrite: rewrite.map(|template| Rewrite::Template(template.to_string())),
    })
}

fn builtin_heuristics() -> SqlportResult<Vec<Heuristic>> {
    use Dialect::*;

    Ok(vec![
        // Schema
        Heuristic {
            source: MySql,
            targets: TargetFilter::Only(vec![Postgres]),
            scope: Scope::Schema,
            trigger: Trigger::Token("AUTO_INCREMENT".to_string()),
            kind: IssueKind::AutoIncrement,
            severity: Severity::Medium,
            penalty: 5.0,
            issue: "AUTO_INCREMENT needs conversion to SERIAL or IDENTITY".to_string(),
            recommendation: Some("Replace AUTO_INCREMENT with SERIAL or IDENTITY column".to_string()),
            rewrite: None,
        },
        Heuristic {
            source: MySql,
            targets: TargetFilter::Other,
            scope: Scope::Schema,
            trigger: Trigger::Pattern(pattern("storage-engine", r"(?i)\bENGINE\s*=")?),
            kind: IssueKind::StorageEngine,
            severity: Severity::Low,
            penalty: 3.0,
            issue: "Storage engine specifications need review".to_string(),
            recommendation: None,
            rewrite: None,
        },
        Heuristic {
            source: Oracle,
            targets: TargetFilter::Only(vec![Postgres]),
            scope: Scope::Schema,
            trigger: Trigger::Token("NUMBER".to_string()),
            kind: IssueKind::NumericPrecision,
            severity: Severity::Medium,
            penalty: 8.0,
            issue: "Oracle NUMBER type precision and scale need careful mapping".to_string(),
            recommendation: Some(
                "Review NUMBER precision and scale for PostgreSQL NUMERIC conversion".to_string(),
            ),
            rewrite: None,
        },
        Heuristic {
            source: MongoDb,
            targets: TargetFilter::Relational,
            scope: Scope::Schema,
            trigger: Trigger::NonEmpty,
            kind: IssueKind::DocumentModel,
            severity: Severity::High,
            penalty: 25.0,
            issue: "Document structure requires relational redesign".to_string(),
            recommendation: Some(
                "Design normalized relational schema for document collections".to_string(),
            ),
            rewrite: None,
        },
        // Queries
        Heuristic {
            source: MySql,
            targets: TargetFilter::Other,
            scope: Scope::Query,
            trigger: Trigger::Literal("`".to_string()),
            kind: IssueKind::IdentifierQuotes,
            severity: Severity::Low,
            penalty: 2.0,
            issue: "MySQL backticks converted to double quotes".to_string(),
            recommendation: None,
            rewrite: Some(Rewrite::Literal {
                from: "`".to_string(),
                to: "\"".to_string(),
            }),
        },
        limit_offset(vec![Postgres], None, Some("LIMIT $2 OFFSET $1"))?,
        limit_offset(
            vec![Oracle, SqlServer],
            Some("OFFSET ... FETCH needs an ORDER BY clause"),
            Some("OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY"),
        )?,
        limit_offset(vec![MongoDb, Redis, Cassandra], None, None)?,
        Heuristic {
            source: MongoDb,
            targets: TargetFilter::Other,
            scope: Scope::Query,
            trigger: Trigger::Literal("$match".to_string()),
            kind: IssueKind::AggregationConversion,
            severity: Severity::High,
            penalty: 20.0,
            issue: "MongoDB aggregation pipeline requires SQL rewrite".to_string(),
            recommendation: None,
            rewrite: None,
        },
    ])
}
