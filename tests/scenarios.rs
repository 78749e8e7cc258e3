//! End-to-end migration scenarios through the public API.

use pretty_assertions::assert_eq;
use sqlport::analyzer::{Complexity, IssueKind};
use sqlport::fix::apply_fixes;
use sqlport::prelude::*;

fn engine() -> MigrationEngine {
    MigrationEngine::new(EngineConfig::default()).unwrap()
}

fn pair(source: Dialect, target: Dialect) -> DialectPair {
    DialectPair::new(source, target)
}

const USERS_DDL: &str = "CREATE TABLE users (\n  id INT AUTO_INCREMENT PRIMARY KEY,\n  email VARCHAR(255)\n);";

#[test]
fn auto_increment_becomes_serial_fix() {
    let request = FixRequest::new(pair(Dialect::MySql, Dialect::Postgres))
        .schema(USERS_DDL)
        .auto_apply_safe(true);
    let result = engine().generate_fixes(&request).unwrap();

    let fix = result.fix("syntax-001").unwrap();
    assert_eq!(fix.category, FixCategory::Syntax);
    assert_eq!(fix.severity, Severity::High);
    assert_eq!(fix.confidence, 0.95);
    assert!(fix.auto_apply);
    assert_eq!(fix.original_code, "INT AUTO_INCREMENT");
    assert_eq!(fix.fixed_code, "SERIAL");
    assert_eq!(fix.target, FixTarget::Schema);
    // High severity never passes the gate, whatever the confidence.
    assert_eq!(fix.status(), FixStatus::Pending);
}

#[test]
fn backticks_cost_two_points() {
    let result = engine()
        .analyze_query(pair(Dialect::MySql, Dialect::Postgres), "SELECT `id` FROM users")
        .unwrap();

    assert_eq!(result.score(), 98.0);
    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.issues()[0].severity, Severity::Low);
    assert_eq!(result.issues()[0].category, IssueKind::IdentifierQuotes);
    assert_eq!(result.converted_code(), "SELECT \"id\" FROM users");
}

#[test]
fn document_source_needs_redesign() {
    let result = engine()
        .analyze_schema(
            pair(Dialect::MongoDb, Dialect::Postgres),
            r#"db.createCollection("users")"#,
        )
        .unwrap();

    assert_eq!(result.score(), 75.0);
    assert_eq!(result.issues().len(), 1);
    let issue = &result.issues()[0];
    assert_eq!(issue.severity, Severity::High);
    assert_eq!(issue.category, IssueKind::DocumentModel);
    assert_eq!(issue.description, "Document structure requires relational redesign");
    assert_eq!(result.complexity(), Complexity::Medium);
}

#[test]
fn unknown_pair_is_clean() {
    let engine = engine();
    let p = pair(Dialect::Redis, Dialect::Cassandra);

    let schema = engine.analyze_schema(p, "CREATE TABLE t (id INT);").unwrap();
    assert_eq!(schema.score(), 100.0);
    assert!(schema.issues().is_empty());
    assert!(schema.recommendations().is_empty());
    assert_eq!(schema.converted_code(), "CREATE TABLE t (id INT);");

    let query = engine.analyze_query(p, "GET user:1").unwrap();
    assert_eq!(query.score(), 100.0);
    assert!(query.issues().is_empty());
}

#[test]
fn two_accepted_fixes_both_apply() {
    let queries = vec!["SELECT NVL(a, 0), SYSDATE FROM dual".to_string()];
    let request = FixRequest::new(pair(Dialect::Oracle, Dialect::Postgres)).queries(queries.clone());
    let mut result = engine().generate_fixes(&request).unwrap();

    let ids: Vec<&str> = result.fixes.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["compatibility-001", "compatibility-002"]);
    result.accept("compatibility-001").unwrap();
    result.accept("compatibility-002").unwrap();

    let outcome = result.apply("", &queries);
    assert_eq!(outcome.applied_count, 2);
    assert!(outcome.failed.is_empty());
    assert_eq!(
        outcome.fixed_queries,
        vec!["SELECT COALESCE(a, 0), CURRENT_TIMESTAMP FROM dual".to_string()]
    );
    assert_eq!(result.score_before, 80.0);
    assert_eq!(result.score_after, 100.0);
}

#[test]
fn applied_fixes_do_not_reappear() {
    let p = pair(Dialect::MySql, Dialect::Postgres);
    let ddl = "CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY, active TINYINT(1));";
    let request = FixRequest::new(p)
        .schema(ddl)
        .categories(vec![FixCategory::Syntax, FixCategory::Compatibility]);
    let engine = engine();

    let mut result = engine.generate_fixes(&request).unwrap();
    let ids: Vec<String> = result.fixes.iter().map(|f| f.id.clone()).collect();
    for id in &ids {
        result.accept(id).unwrap();
    }
    let outcome = result.apply(ddl, &[]);
    assert_eq!(
        outcome.fixed_schema,
        "CREATE TABLE users (id SERIAL PRIMARY KEY, active BOOLEAN);"
    );

    let again = engine
        .generate_fixes(&request.clone().schema(outcome.fixed_schema))
        .unwrap();
    assert_eq!(again.total_issues, 0);
}

#[test]
fn auto_increment_forms_from_mysqldump() {
    let ddl = "CREATE TABLE `users` (\n  `id` int(11) NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n);\n\
               CREATE TABLE `events` (`id` INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY);\n\
               CREATE TABLE `tags` (`id` MEDIUMINT AUTO_INCREMENT PRIMARY KEY);";
    let request = FixRequest::new(pair(Dialect::MySql, Dialect::Postgres))
        .schema(ddl)
        .categories(vec![FixCategory::Syntax]);
    let result = engine().generate_fixes(&request).unwrap();

    let serials: Vec<(&str, &str)> = result
        .fixes
        .iter()
        .filter(|f| f.title == "Convert AUTO_INCREMENT to SERIAL")
        .map(|f| (f.original_code.as_str(), f.fixed_code.as_str()))
        .collect();
    assert_eq!(
        serials,
        vec![
            ("int(11) NOT NULL AUTO_INCREMENT", "SERIAL NOT NULL"),
            ("INT UNSIGNED NOT NULL AUTO_INCREMENT", "BIGSERIAL NOT NULL"),
            ("MEDIUMINT AUTO_INCREMENT", "SERIAL"),
        ]
    );
}

/// Every accepted replacing fix leaves its fixed text in place of its original
/// text, across a corpus mixing several sources and targets.
#[test]
fn accepted_fixes_replace_their_original() {
    let corpus: Vec<(DialectPair, &str, Vec<&str>)> = vec![
        (
            pair(Dialect::MySql, Dialect::Postgres),
            "CREATE TABLE users (\n  id int(11) NOT NULL AUTO_INCREMENT,\n  active TINYINT(1),\n  created DATETIME,\n  password VARCHAR(64),\n  PRIMARY KEY (id)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n\
             CREATE TABLE events (id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY);\n\
             CREATE TABLE flags (id TINYINT AUTO_INCREMENT PRIMARY KEY);",
            vec!["SELECT `id`, IFNULL(name, '') FROM users ORDER BY RAND() LIMIT 20, 10"],
        ),
        (
            pair(Dialect::MySql, Dialect::Oracle),
            "CREATE TABLE a (id int(11) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY);",
            vec!["SELECT `id`, IFNULL(x, 0) FROM a"],
        ),
        (
            pair(Dialect::MySql, Dialect::SqlServer),
            "CREATE TABLE a (id MEDIUMINT NOT NULL AUTO_INCREMENT PRIMARY KEY);",
            vec![],
        ),
        (
            pair(Dialect::Oracle, Dialect::Postgres),
            "CREATE TABLE t (n NUMBER(10), d DATE);",
            vec!["SELECT NVL(a, 0), SYSDATE FROM dual"],
        ),
        (
            pair(Dialect::SqlServer, Dialect::Postgres),
            "CREATE TABLE t (id INT IDENTITY(1,1) PRIMARY KEY, at DATETIME DEFAULT GETDATE());",
            vec!["SELECT ISNULL(x, 1) FROM t"],
        ),
    ];

    let engine = engine();
    for (p, schema, queries) in corpus {
        let queries: Vec<String> = queries.into_iter().map(String::from).collect();
        let request = FixRequest::new(p).schema(schema).queries(queries.clone());
        let mut result = engine.generate_fixes(&request).unwrap();

        let replacing: Vec<String> = result
            .fixes
            .iter()
            .filter(|f| !f.is_additive())
            .map(|f| f.id.clone())
            .collect();
        assert!(!replacing.is_empty(), "{p}");
        for id in &replacing {
            result.accept(id).unwrap();
        }

        let outcome = result.apply(schema, &queries);
        assert!(outcome.failed.is_empty(), "{p}: {:?}", outcome.failed);
        assert_eq!(outcome.applied_count, replacing.len(), "{p}");

        for fix in result.fixes.iter().filter(|f| replacing.contains(&f.id)) {
            assert_eq!(fix.status(), FixStatus::Applied, "{p} {}", fix.id);
            let text = match fix.target {
                FixTarget::Schema => outcome.fixed_schema.as_str(),
                FixTarget::Query(i) => outcome.fixed_queries[i].as_str(),
            };
            assert!(!text.contains(&fix.original_code), "{p} {}: {text}", fix.id);
            assert!(text.contains(&fix.fixed_code), "{p} {}: {text}", fix.id);
        }
    }
}

#[test]
fn limit_offset_targets_each_dialect() {
    let engine = engine();
    let query = "SELECT * FROM t ORDER BY id LIMIT 20, 10";

    let pg = engine.analyze_query(pair(Dialect::MySql, Dialect::Postgres), query).unwrap();
    assert_eq!(pg.converted_code(), "SELECT * FROM t ORDER BY id LIMIT 10 OFFSET 20");

    let oracle = engine.analyze_query(pair(Dialect::MySql, Dialect::Oracle), query).unwrap();
    assert_eq!(
        oracle.converted_code(),
        "SELECT * FROM t ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(oracle.score(), 92.0);
    assert!(!oracle.converted_code().contains("LIMIT"));
}

#[test]
fn applying_nothing_is_identity() {
    let queries = vec!["SELECT 1".to_string(), "SELECT `x` FROM t".to_string()];
    let outcome = apply_fixes(&mut [], USERS_DDL, &queries);
    assert_eq!(outcome.fixed_schema, USERS_DDL);
    assert_eq!(outcome.fixed_queries, queries);
    assert_eq!(outcome.applied_count, 0);
}

#[test]
fn analysis_is_deterministic() {
    let engine = engine();
    let request = AnalysisRequest::new(pair(Dialect::MySql, Dialect::Postgres))
        .schema(USERS_DDL)
        .queries("SELECT IFNULL(a, 0) FROM t LIMIT 5, 10; SELECT `b` FROM u;");

    let first = engine.analyze(&request).unwrap();
    let second = engine.analyze(&request).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.queries.len(), 2);
}

#[test]
fn scores_stay_in_bounds() {
    let engine = engine();
    let ddl = "CREATE TABLE t (a SET('x'), b NUMBER, c INT AUTO_INCREMENT) ENGINE=InnoDB;";
    let query = "SELECT `a`, IFNULL(b, 0), NVL(c, 1), ISNULL(d, 2) FROM t LIMIT 1, 2 -- $match";
    for source in Dialect::ALL {
        for target in Dialect::ALL {
            let p = pair(source, target);
            for result in [
                engine.analyze_schema(p, ddl).unwrap(),
                engine.analyze_query(p, query).unwrap(),
            ] {
                assert!((0.0..=100.0).contains(&result.score()), "{p}: {}", result.score());
            }
        }
    }
}

#[test]
fn complexity_thresholds() {
    assert_eq!(Complexity::from_score(90.0), Complexity::Low);
    assert_eq!(Complexity::from_score(89.9), Complexity::Medium);
    assert_eq!(Complexity::from_score(70.0), Complexity::Medium);
    assert_eq!(Complexity::from_score(69.9), Complexity::High);
    assert_eq!(Complexity::from_score(50.0), Complexity::High);
    assert_eq!(Complexity::from_score(49.9), Complexity::VeryHigh);
}

#[test]
fn oversized_input_is_rejected() {
    let config = EngineConfig::builder().max_input_bytes(8).build().unwrap();
    let engine = MigrationEngine::new(config).unwrap();
    let request = AnalysisRequest::new(pair(Dialect::MySql, Dialect::Postgres))
        .queries("SELECT * FROM a_rather_long_table");
    assert!(matches!(
        engine.analyze(&request),
        Err(SqlportError::InputTooLarge { limit: 8, .. })
    ));
}

#[test]
fn report_survives_json() {
    let request = AnalysisRequest::new(pair(Dialect::MySql, Dialect::Postgres))
        .schema(USERS_DDL)
        .queries("SELECT GROUP_CONCAT(name) FROM users");
    let report = engine().analyze(&request).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["schema"]["complexity"], "low");
    assert_eq!(value["fixes"]["fixes"][0]["status"], "pending");

    let back: MigrationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[tokio::test]
async fn cancelled_advice_falls_back() {
    let mut config = EngineConfig::default();
    config.advisor.enabled = true;
    config.advisor.api_key_env = "SQLPORT_SCENARIO_KEY_THAT_IS_NEVER_SET".to_string();
    let engine = MigrationEngine::new(config).unwrap();
    let report = engine
        .analyze(&AnalysisRequest::new(pair(Dialect::SqlServer, Dialect::Postgres)).schema("CREATE TABLE t (id INT);"))
        .unwrap();

    let advice = engine.advise(&report, async {}).await.unwrap();
    assert_eq!(advice.source, ReportSource::Fallback);
    assert_eq!(advice.compatibility_score, 70.0);
    assert_eq!(advice.timeline_estimate, "6-8 weeks");
}
