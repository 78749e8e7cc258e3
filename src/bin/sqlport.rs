//! sqlport: migration compatibility CLI
//!
//! # Usage
//!
//! ```bash
//! # Score a schema and its queries
//! sqlport analyze --from mysql --to postgresql --schema schema.sql --queries app.sql
//!
//! # Propose fixes, accept one and write the result
//! sqlport fix --from mysql --to postgresql --schema schema.sql --accept syntax-001
//!
//! # Backup and validation scripts
//! sqlport script pre --from mysql --to postgresql --schema schema.sql
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlport::advisor::AdvisorReport;
use sqlport::fix::ApplyOutcome;
use sqlport::parser::schema_objects;
use sqlport::prelude::*;
use sqlport::script;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlport")]
#[command(version)]
#[command(about = "Cross-dialect migration compatibility and auto-fix engine", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlport analyze --from mysql --to postgresql --schema schema.sql
    sqlport fix --from oracle --to postgresql --queries reports.sql --category compatibility
    sqlport advise --from sql_server --to postgresql --schema schema.sql --timeout 10")]
struct Cli {
    /// Config file (default: ./sqlport.toml, then the user config dir)
    #[arg(short, long, global = true, env = "SQLPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Args)]
struct Input {
    /// Source dialect
    #[arg(long)]
    from: Dialect,

    /// Target dialect
    #[arg(long)]
    to: Dialect,

    /// Schema file (`-` for stdin)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Query file, `;`-delimited (`-` for stdin)
    #[arg(long)]
    queries: Option<PathBuf>,
}

impl Input {
    fn pair(&self) -> DialectPair {
        DialectPair::new(self.from, self.to)
    }

    fn read(&self) -> Result<(String, String)> {
        let schema = read_optional(self.schema.as_deref())?;
        let queries = read_optional(self.queries.as_deref())?;
        Ok((schema, queries))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score schema and query compatibility
    Analyze {
        #[command(flatten)]
        input: Input,

        /// Also consult the configured advisor
        #[arg(long)]
        advise: bool,
    },
    /// Generate, review and apply fixes
    Fix {
        #[command(flatten)]
        input: Input,

        /// Restrict to these categories (repeatable)
        #[arg(long = "category", value_delimiter = ',')]
        categories: Vec<FixCategory>,

        /// Apply fixes that pass the safety gate during generation
        #[arg(long)]
        apply_safe: bool,

        /// Confidence a fix must exceed for automatic application
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Accept fixes by id; accepted and auto-applied fixes are then written out
        #[arg(long, value_delimiter = ',')]
        accept: Vec<String>,

        /// Skip fixes by id
        #[arg(long, value_delimiter = ',')]
        skip: Vec<String>,

        /// Write the fixed schema here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List dialects and built-in pairs
    Dialects,
    /// Ask the advisor for a migration assessment
    Advise {
        #[command(flatten)]
        input: Input,

        /// Advisor timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Generate migration scripts
    Script {
        #[arg(value_enum)]
        kind: ScriptKind,

        #[command(flatten)]
        input: Input,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScriptKind {
    Pre,
    Post,
    Convert,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sqlport=debug" } else { "sqlport=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::discover(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Analyze { input, advise } => {
            let engine = MigrationEngine::new(config)?;
            let (schema, queries) = input.read()?;
            let request = AnalysisRequest::new(input.pair()).schema(schema).queries(queries);
            let mut report = engine.analyze(&request)?;
            if advise {
                let advice = engine.advise(&report, ctrl_c()).await?;
                report = report.with_advisor(advice);
            }
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => print_report(&report),
            }
        }
        Commands::Fix {
            input,
            categories,
            apply_safe,
            min_confidence,
            accept,
            skip,
            output,
        } => {
            let mut config = config;
            if let Some(threshold) = min_confidence {
                config.min_confidence = threshold;
            }
            let engine = MigrationEngine::new(config)?;
            let (schema, queries) = input.read()?;
            let statements = sqlport::parser::split_statements(&queries);
            let request = FixRequest::new(input.pair())
                .schema(schema.clone())
                .queries(statements.clone())
                .categories(categories)
                .auto_apply_safe(apply_safe);
            let mut result = engine.generate_fixes(&request)?;

            for id in &skip {
                result.skip(id)?;
            }
            for id in &accept {
                result.accept(id)?;
            }
            let outcome = (apply_safe || !accept.is_empty())
                .then(|| result.apply(&schema, &statements));

            if let (Some(path), Some(outcome)) = (&output, &outcome) {
                std::fs::write(path, &outcome.fixed_schema)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }

            match cli.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => print_fixes(&result, outcome.as_ref(), output.as_deref()),
            }
        }
        Commands::Dialects => {
            let engine = MigrationEngine::new(config)?;
            show_dialects(&engine);
        }
        Commands::Advise { input, timeout } => {
            let mut config = config;
            config.advisor.enabled = true;
            if let Some(secs) = timeout {
                config.advisor.timeout_secs = secs;
            }
            let engine = MigrationEngine::new(config)?;
            let (schema, _) = input.read()?;
            let report = engine.analyze(&AnalysisRequest::new(input.pair()).schema(schema))?;
            let advice = engine.advise(&report, ctrl_c()).await?;
            match cli.format {
                OutputFormat::Json => print_json(&advice)?,
                OutputFormat::Table => print_advice(&advice),
            }
        }
        Commands::Script { kind, input } => {
            let engine = MigrationEngine::new(config)?;
            let (schema, _) = input.read()?;
            let pair = input.pair();
            let objects = schema_objects(&schema);
            let now = Utc::now();
            let text = match kind {
                ScriptKind::Pre => script::pre_migration_script(pair, &objects, now),
                ScriptKind::Post => script::post_migration_script(pair, &objects, now),
                ScriptKind::Convert => {
                    let result = engine.analyze_schema(pair, &schema)?;
                    script::conversion_script(pair, &objects, result.converted_code(), now)
                }
            };
            print!("{}", text);
        }
    }
    Ok(())
}

async fn ctrl_c() {
    // An error means no signal handler could be installed; never cancel then.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn read_optional(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(String::new()),
        Some(p) if p == Path::new("-") => {
            std::io::read_to_string(std::io::stdin()).context("failed to read stdin")
        }
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn score_colored(score: f64) -> ColoredString {
    let text = format!("{:.0}", score);
    if score >= 90.0 {
        text.green().bold()
    } else if score >= 70.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn severity_colored(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => severity.as_str().red().bold(),
        Severity::High => severity.as_str().red(),
        Severity::Medium => severity.as_str().yellow(),
        Severity::Low => severity.as_str().cyan(),
        Severity::Cosmetic => severity.as_str().dimmed(),
    }
}

fn print_result(title: &str, result: &CompatibilityResult) {
    println!(
        "{} {} {} ({})",
        title.white().bold(),
        score_colored(result.score()),
        "/ 100".dimmed(),
        result.complexity().label().cyan()
    );
    for issue in result.issues() {
        println!("  {} [{}] {}", "•".dimmed(), severity_colored(issue.severity), issue.description);
    }
    for recommendation in result.recommendations() {
        println!("  {} {}", "→".green(), recommendation);
    }
}

fn print_report(report: &MigrationReport) {
    println!("{} {}", "Migration:".cyan().bold(), report.pair);
    println!();

    if !report.schema.converted_code().trim().is_empty() {
        print_result("Schema", &report.schema);
        println!(
            "  {} {}",
            "Effort:".dimmed(),
            report.migration_effort().to_string().yellow()
        );
        println!();
    }

    for (i, query) in report.queries.iter().enumerate() {
        print_result(&format!("Query #{}", i + 1), &query.result);
        if query.result.converted_code() != query.statement {
            println!("  {} {}", "Converted:".dimmed(), query.result.converted_code().white());
        }
    }
    if !report.queries.is_empty() {
        println!(
            "{} {:.1} across {} queries",
            "Average query score:".dimmed(),
            report.average_query_score(),
            report.queries.len()
        );
        println!();
    }

    println!("{} {}", "Fixes:".cyan().bold(), report.fixes.summary);
    for fix in &report.fixes.fixes {
        println!(
            "  {:18} [{}] {} {}",
            fix.id.yellow(),
            severity_colored(fix.severity),
            fix.title,
            format!("({})", fix.target).dimmed()
        );
    }

    if let Some(advice) = &report.advisor {
        println!();
        print_advice(advice);
    }
}

fn print_fixes(result: &AutoFixResult, outcome: Option<&ApplyOutcome>, output: Option<&Path>) {
    if result.fixes.is_empty() {
        println!("{}", "(no fixes)".dimmed());
        return;
    }

    for fix in &result.fixes {
        println!(
            "{} [{}] {} {}",
            fix.id.yellow().bold(),
            severity_colored(fix.severity),
            fix.title.white().bold(),
            fix.status().to_string().cyan()
        );
        println!("  {} {}", "Target:".dimmed(), fix.target);
        println!("  {} {:.2}", "Confidence:".dimmed(), fix.confidence);
        println!("  {}", fix.description);
        if !fix.original_code.is_empty() {
            println!("  {} {}", "-".red(), fix.original_code.red());
        }
        for line in fix.fixed_code.lines() {
            println!("  {} {}", "+".green(), line.green());
        }
        for warning in &fix.warnings {
            println!("  {} {}", "⚠".yellow(), warning.yellow());
        }
        println!();
    }

    println!("{} {}", "Summary:".cyan().bold(), result.summary);

    if let Some(outcome) = outcome {
        for id in &outcome.failed {
            println!("{} {} could not be applied", "✗".red(), id);
        }
        match output {
            Some(path) => println!(
                "{} Wrote fixed schema to {}",
                "✓".green(),
                path.display().to_string().cyan()
            ),
            None => {
                println!();
                println!("{}", "Fixed schema:".green().bold());
                println!("{}", outcome.fixed_schema);
                for (i, query) in outcome.fixed_queries.iter().enumerate() {
                    println!("{} {}", format!("Query #{}:", i + 1).green(), query);
                }
            }
        }
    }
}

fn print_advice(advice: &AdvisorReport) {
    let source = match advice.source {
        ReportSource::Advisor => "advisor".green(),
        ReportSource::Fallback => "fallback".yellow(),
    };
    println!("{} {}", "Assessment".cyan().bold(), format!("({})", source).dimmed());
    println!("  {} {:.0}%", "Compatibility:".dimmed(), advice.compatibility_score);
    println!("  {} {}", "Complexity:".dimmed(), advice.complexity.label());
    println!("  {} {}", "Timeline:".dimmed(), advice.timeline_estimate);
    println!("  {} {:.1}", "Confidence:".dimmed(), advice.confidence);
    if !advice.risks.is_empty() {
        println!("  {}", "Risks:".dimmed());
        for risk in &advice.risks {
            println!("    {} {}", "•".red(), risk);
        }
    }
    if !advice.recommendations.is_empty() {
        println!("  {}", "Recommendations:".dimmed());
        for recommendation in &advice.recommendations {
            println!("    {} {}", "→".green(), recommendation);
        }
    }
    if advice.source == ReportSource::Advisor {
        println!();
        println!("{}", advice.analysis);
    }
}

fn show_dialects(engine: &MigrationEngine) {
    println!(
        "{:12} {:18} {}",
        "Id".white().bold(),
        "Name".white().bold(),
        "Statements".white().bold()
    );
    println!("{}", "─".repeat(50).dimmed());
    for dialect in Dialect::ALL {
        println!(
            "{:12} {:18} {}",
            dialect.id().cyan().bold(),
            dialect.display_name().yellow(),
            dialect.query_term().dimmed()
        );
    }

    println!();
    println!("{}", "Built-in mapping tables:".green().bold());
    for (pair, tables) in engine.catalog().pairs() {
        println!(
            "  {:28} {} types, {} functions",
            pair.to_string(),
            tables.types.len(),
            tables.functions.len()
        );
    }
    println!();
    println!("{} {} rules", "Fix library:".green().bold(), engine.rules().len());
}
