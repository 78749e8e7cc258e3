//! Migration script generation.
//!
//! Scripts are plain SQL text. The timestamp is passed in so output is
//! reproducible.

use chrono::{DateTime, Utc};

use crate::dialect::{Dialect, DialectPair};
use crate::parser::{ObjectKind, SchemaObject};

fn header(title: &str, pair: DialectPair, now: DateTime<Utc>) -> String {
    format!(
        "-- {}\n-- Generated on: {}\n-- Source: {} ({})\n-- Target: {} ({})\n",
        title,
        now.format("%Y-%m-%d %H:%M:%S"),
        pair.source.display_name(),
        pair.source.query_term(),
        pair.target.display_name(),
        pair.target.query_term(),
    )
}

fn row_count(object: &SchemaObject) -> String {
    format!(
        "SELECT '{name}' AS table_name, COUNT(*) AS row_count FROM {name};",
        name = object.name
    )
}

/// Backup every table into a dated schema and record row counts.
pub fn pre_migration_script(
    pair: DialectPair,
    objects: &[SchemaObject],
    now: DateTime<Utc>,
) -> String {
    let date = now.format("%Y%m%d");
    let tables: Vec<&SchemaObject> = objects
        .iter()
        .filter(|o| o.kind == ObjectKind::Table)
        .collect();

    let mut script = header("Pre-migration schema backup", pair, now);
    script.push_str(&format!(
        "\n-- Create backup schema\nCREATE SCHEMA IF NOT EXISTS migration_backup_{date};\n"
    ));
    script.push_str("\n-- Backup existing tables\n");
    for table in &tables {
        script.push_str(&format!(
            "CREATE TABLE migration_backup_{date}.{name} AS SELECT * FROM {name};\n",
            name = table.name
        ));
    }
    script.push_str("\n-- Row count validation\n");
    for table in &tables {
        script.push_str(&row_count(table));
        script.push('\n');
    }
    script
}

/// Row counts for every object, then a statistics refresh where the target
/// has one.
pub fn post_migration_script(
    pair: DialectPair,
    objects: &[SchemaObject],
    now: DateTime<Utc>,
) -> String {
    let mut script = header("Post-migration validation", pair, now);
    script.push_str("\n-- Row count validation\n");
    for object in objects {
        script.push_str(&row_count(object));
        script.push('\n');
    }

    let analyze: fn(&str) -> String = match pair.target {
        Dialect::Postgres => |t: &str| format!("ANALYZE {t};"),
        Dialect::MySql => |t: &str| format!("ANALYZE TABLE {t};"),
        _ => return script,
    };
    script.push_str(&format!(
        "\n-- {} performance analysis\n-- Update table statistics\n",
        pair.target.display_name()
    ));
    for table in objects.iter().filter(|o| o.kind == ObjectKind::Table) {
        script.push_str(&analyze(&table.name));
        script.push('\n');
    }
    script
}

/// Drop-and-recreate script around already converted DDL.
pub fn conversion_script(
    pair: DialectPair,
    objects: &[SchemaObject],
    converted_ddl: &str,
    now: DateTime<Utc>,
) -> String {
    let mut script = header("Schema conversion", pair, now);
    script.push_str("\n-- Drop existing objects if they exist\n");
    for table in objects.iter().filter(|o| o.kind == ObjectKind::Table) {
        script.push_str(&format!("DROP TABLE IF EXISTS {};\n", table.name));
    }
    script.push_str("\n-- Create tables\n");
    script.push_str(converted_ddl.trim());
    script.push('\n');
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema_objects;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    fn objects() -> Vec<SchemaObject> {
        schema_objects("CREATE TABLE users (id INT);\nCREATE TABLE orders (id INT);")
    }

    #[test]
    fn test_pre_migration_backup() {
        let pair = DialectPair::new(Dialect::MySql, Dialect::Postgres);
        let script = pre_migration_script(pair, &objects(), now());
        assert!(script.contains("-- Generated on: 2024-03-09 14:05:00"));
        assert!(script.contains("CREATE SCHEMA IF NOT EXISTS migration_backup_20240309;"));
        assert!(script.contains(
            "CREATE TABLE migration_backup_20240309.orders AS SELECT * FROM orders;"
        ));
        assert!(script.contains("-- Source: MySQL (SQL Queries)"));
    }

    #[test]
    fn test_post_migration_per_target() {
        let pg = post_migration_script(DialectPair::new(Dialect::MySql, Dialect::Postgres), &objects(), now());
        assert!(pg.contains("ANALYZE users;"));
        assert!(pg.contains("SELECT 'users' AS table_name, COUNT(*) AS row_count FROM users;"));

        let my = post_migration_script(DialectPair::new(Dialect::Postgres, Dialect::MySql), &objects(), now());
        assert!(my.contains("ANALYZE TABLE orders;"));

        let ora = post_migration_script(DialectPair::new(Dialect::MySql, Dialect::Oracle), &objects(), now());
        assert!(!ora.contains("ANALYZE"));
    }

    #[test]
    fn test_conversion_script() {
        let pair = DialectPair::new(Dialect::MySql, Dialect::Postgres);
        let script = conversion_script(pair, &objects(), "CREATE TABLE users (id INTEGER);", now());
        assert!(script.contains("DROP TABLE IF EXISTS users;\nDROP TABLE IF EXISTS orders;"));
        assert!(script.ends_with("CREATE TABLE users (id INTEGER);\n"));
    }
}
