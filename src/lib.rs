//! # sqlport: cross-dialect migration analysis
//!
//! > **Know what breaks before you move the data.**
//!
//! sqlport scores how well a schema or query written for one database will
//! carry over to another, rewrites what it can, and proposes categorized
//! fixes you can accept, skip or apply.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqlport::prelude::*;
//!
//! let pair = DialectPair::new(Dialect::MySql, Dialect::Postgres);
//! let result = sqlport::analyze_schema(pair, "CREATE TABLE t (id INT AUTO_INCREMENT);")?;
//! assert_eq!(result.score(), 95.0);
//! ```
//!
//! ## Layout
//!
//! | Module     | Role                                          |
//! |------------|-----------------------------------------------|
//! | `catalog`  | Per-pair type/function tables and heuristics  |
//! | `analyzer` | Schema and query compatibility scoring        |
//! | `rules`    | Categorized fix rules                         |
//! | `fix`      | Fix generation, lifecycle and application     |
//! | `advisor`  | Optional external second opinion              |
//! | `engine`   | Everything above behind one entry point       |

pub mod advisor;
pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod fix;
pub mod matcher;
pub mod parser;
pub mod report;
pub mod rules;
pub mod script;

pub mod prelude {
    pub use crate::advisor::{Advisor, AdvisorContext, AdvisorReport, ReportSource};
    pub use crate::analyzer::{CompatibilityResult, Complexity, Issue, IssueKind};
    pub use crate::config::EngineConfig;
    pub use crate::dialect::{Dialect, DialectPair};
    pub use crate::engine::{AnalysisRequest, MigrationEngine};
    pub use crate::error::*;
    pub use crate::fix::{AutoFix, AutoFixResult, FixRequest, FixStatus, FixTarget};
    pub use crate::report::MigrationReport;
    pub use crate::rules::{FixCategory, Severity};
}

use dialect::DialectPair;
use error::SqlportResult;

/// Analyze a schema with the built-in catalog and default limits.
///
/// # Example
///
/// ```
/// use sqlport::dialect::{Dialect, DialectPair};
///
/// let pair = DialectPair::new(Dialect::MySql, Dialect::Postgres);
/// let result = sqlport::analyze_schema(pair, "CREATE TABLE t (id INT AUTO_INCREMENT);").unwrap();
/// assert_eq!(result.score(), 95.0);
/// ```
pub fn analyze_schema(pair: DialectPair, ddl: &str) -> SqlportResult<analyzer::CompatibilityResult> {
    engine::MigrationEngine::new(config::EngineConfig::default())?.analyze_schema(pair, ddl)
}

/// Analyze one query with the built-in catalog and default limits.
pub fn analyze_query(pair: DialectPair, query: &str) -> SqlportResult<analyzer::CompatibilityResult> {
    engine::MigrationEngine::new(config::EngineConfig::default())?.analyze_query(pair, query)
}
