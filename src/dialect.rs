//! Supported database dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SqlportError;

/// Supported database engines.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql")]
    Postgres,
    Oracle,
    SqlServer,
    #[serde(rename = "mongodb")]
    MongoDb,
    Redis,
    Cassandra,
}

impl Dialect {
    /// Every dialect, in catalog order.
    pub const ALL: [Dialect; 7] = [
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Oracle,
        Dialect::SqlServer,
        Dialect::MongoDb,
        Dialect::Redis,
        Dialect::Cassandra,
    ];

    /// Stable identifier, as used in config files and the CLI.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgresql",
            Self::Oracle => "oracle",
            Self::SqlServer => "sql_server",
            Self::MongoDb => "mongodb",
            Self::Redis => "redis",
            Self::Cassandra => "cassandra",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Oracle => "Oracle Database",
            Self::SqlServer => "SQL Server",
            Self::MongoDb => "MongoDB",
            Self::Redis => "Redis",
            Self::Cassandra => "Cassandra",
        }
    }

    /// What users of this engine call their statements.
    pub const fn query_term(&self) -> &'static str {
        match self {
            Self::MySql | Self::Postgres => "SQL Queries",
            Self::Oracle => "PL/SQL Queries",
            Self::SqlServer => "T-SQL Queries",
            Self::MongoDb => "MongoDB Queries",
            Self::Redis => "Redis Commands",
            Self::Cassandra => "CQL Queries",
        }
    }

    /// Document stores model data as nested collections rather than tables.
    pub const fn is_document(&self) -> bool {
        matches!(self, Self::MongoDb)
    }

    pub const fn is_relational(&self) -> bool {
        matches!(
            self,
            Self::MySql | Self::Postgres | Self::Oracle | Self::SqlServer
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Dialect {
    type Err = SqlportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        // Managed flavours share the engine's dialect.
        let normalized = normalized.trim_start_matches("aurora_");
        match normalized {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgresql" | "postgres" | "pg" => Ok(Self::Postgres),
            "oracle" => Ok(Self::Oracle),
            "sql_server" | "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "redis" => Ok(Self::Redis),
            "cassandra" => Ok(Self::Cassandra),
            _ => Err(SqlportError::UnknownDialect(s.to_string())),
        }
    }
}

/// A migration direction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DialectPair {
    pub source: Dialect,
    pub target: Dialect,
}

impl DialectPair {
    pub const fn new(source: Dialect, target: Dialect) -> Self {
        Self { source, target }
    }

    /// True when migrating a document store into a relational engine.
    pub const fn is_document_to_relational(&self) -> bool {
        self.source.is_document() && self.target.is_relational()
    }
}

impl fmt::Display for DialectPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
