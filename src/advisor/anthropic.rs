//! Advisor backed by the Anthropic Messages API.
//!
//! Construction never touches the network or the environment. The API key is
//! looked up on first use, so a machine without credentials can still build and
//! test everything around the advisor.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Advisor, AdvisorContext, AdvisorReport, ReportSource};
use crate::analyzer::{Complexity, clamp_score};
use crate::catalog::pattern;
use crate::config::AdvisorConfig;
use crate::error::{SqlportError, SqlportResult};

/// Anthropic Messages API endpoint.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Required API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Objects listed in the prompt.
const MAX_PROMPT_OBJECTS: usize = 10;

/// Items kept per extracted list.
const MAX_ITEMS: usize = 5;

/// Confidence assigned to a parsed live response.
const ADVISOR_CONFIDENCE: f64 = 0.8;

/// Advisor that asks a Claude model for a migration assessment.
pub struct AnthropicAdvisor {
    model: String,
    api_key_env: String,
    api_key: OnceLock<Option<String>>,
    parser: ResponseParser,
}

impl std::fmt::Debug for AnthropicAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicAdvisor")
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .finish_non_exhaustive()
    }
}

impl AnthropicAdvisor {
    pub fn new(model: impl Into<String>, api_key_env: impl Into<String>) -> SqlportResult<Self> {
        Ok(Self {
            model: model.into(),
            api_key_env: api_key_env.into(),
            api_key: OnceLock::new(),
            parser: ResponseParser::new()?,
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> SqlportResult<Self> {
        Self::new(&config.model, &config.api_key_env)
    }

    /// Whether credentials are available. Reads the environment once.
    pub fn is_configured(&self) -> bool {
        self.key().is_some()
    }

    fn key(&self) -> Option<&str> {
        self.api_key
            .get_or_init(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
            .as_deref()
    }
}

#[async_trait]
impl Advisor for AnthropicAdvisor {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn request(&self, context: &AdvisorContext) -> SqlportResult<AdvisorReport> {
        let api_key = self
            .key()
            .ok_or_else(|| SqlportError::Advisor(format!("{} is not set", self.api_key_env)))?
            .to_string();
        let model = self.model.clone();
        let prompt = build_prompt(context);

        debug!(model = %model, objects = context.objects.len(), "requesting advisor analysis");

        // ureq is synchronous, so wrap in spawn_blocking
        let text = tokio::task::spawn_blocking(move || call_api(&api_key, &model, &prompt))
            .await
            .map_err(|e| SqlportError::Advisor(format!("task join error: {}", e)))??;

        Ok(self.parser.report(&text))
    }
}

fn build_prompt(context: &AdvisorContext) -> String {
    let source = context.pair.source;
    let target = context.pair.target;

    let mut prompt = format!(
        "As a database migration expert, analyze the compatibility of migrating from {} to {}.\n\n\
         Source database: {} ({})\n\
         Target database: {} ({})\n",
        source.display_name(),
        target.display_name(),
        source.display_name(),
        source.query_term(),
        target.display_name(),
        target.query_term(),
    );
    if let Some(score) = context.schema_score {
        prompt.push_str(&format!("Local heuristic compatibility score: {:.0}%\n", score));
    }

    prompt.push_str("\nSchema objects:\n");
    if context.objects.is_empty() {
        prompt.push_str("- (none provided)\n");
    }
    for object in context.objects.iter().take(MAX_PROMPT_OBJECTS) {
        prompt.push_str(&format!("- {} ({:?})\n", object.name, object.kind));
    }

    prompt.push_str(
        "\nPlease provide:\n\
         1. Overall compatibility assessment (percentage)\n\
         2. Major compatibility issues and risks, as a list of lines starting with '-'\n\
         3. Recommendations, as a list of lines starting with '-'\n\
         4. Migration complexity (Low/Medium/High/Very High)\n\
         5. Timeline estimate\n",
    );
    prompt
}

// ── API call ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

fn call_api(api_key: &str, model: &str, prompt: &str) -> SqlportResult<String> {
    let body = MessagesRequest {
        model,
        max_tokens: 2000,
        temperature: 0.2,
        messages: vec![ApiMessage {
            role: "user",
            content: prompt,
        }],
    };

    let agent = ureq::Agent::new_with_defaults();
    let response = agent
        .post(ANTHROPIC_API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("content-type", "application/json")
        .send_json(&body)
        .map_err(|e| SqlportError::Advisor(format!("API request failed: {}", e)))?;

    let parsed: MessagesResponse = response
        .into_body()
        .read_json()
        .map_err(|e| SqlportError::Advisor(format!("failed to parse API response: {}", e)))?;

    parsed
        .content
        .into_iter()
        .find_map(|block| block.text)
        .ok_or_else(|| SqlportError::Advisor("API response contained no text content".to_string()))
}

// ── Response parsing ─────────────────────────────────────────────────────────

/// Pulls structured fields out of free-form advisor prose.
#[derive(Debug, Clone)]
struct ResponseParser {
    score: Regex,
    timeline: Regex,
}

impl ResponseParser {
    fn new() -> SqlportResult<Self> {
        Ok(Self {
            score: pattern("advisor-score", r"(\d+(?:\.\d+)?)\s*%")?,
            timeline: pattern("advisor-timeline", r"(\d+)\s*(week|month|day)")?,
        })
    }

    fn report(&self, text: &str) -> AdvisorReport {
        AdvisorReport {
            analysis: text.trim().to_string(),
            compatibility_score: self.score(text),
            complexity: complexity(text),
            recommendations: section_items(text, &["recommend"]),
            risks: section_items(text, &["issue", "risk"]),
            confidence: ADVISOR_CONFIDENCE,
            timeline_estimate: self.timeline(text),
            source: ReportSource::Advisor,
        }
    }

    /// First percentage in the text, default 75.
    fn score(&self, text: &str) -> f64 {
        self.score
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok())
            .map(clamp_score)
            .unwrap_or(75.0)
    }

    fn timeline(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        match self.timeline.captures(&lowered) {
            Some(caps) => format!("{} {}s", &caps[1], &caps[2]),
            None => "4-6 weeks".to_string(),
        }
    }
}

fn complexity(text: &str) -> Complexity {
    let lowered = text.to_lowercase();
    if lowered.contains("very high") {
        Complexity::VeryHigh
    } else if lowered.contains("high") {
        Complexity::High
    } else if lowered.contains("medium") {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

/// Bullet lines following a heading that mentions one of `keywords`, up to
/// the next blank line.
fn section_items(text: &str, keywords: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;
    for line in text.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();
        let bullet = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('*'))
            .or_else(|| trimmed.strip_prefix('•'));

        if let (true, Some(item)) = (in_section, bullet) {
            let item = item.trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        } else if keywords.iter().any(|k| lowered.contains(k)) {
            in_section = true;
        } else if trimmed.is_empty() {
            in_section = false;
        }
    }
    items.truncate(MAX_ITEMS);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, DialectPair};
    use crate::parser::{ObjectKind, SchemaObject};
    use pretty_assertions::assert_eq;

    const RESPONSE: &str = "Overall compatibility: 82%\n\
        \n\
        Major issues and risks:\n\
        - Sequences must be recreated\n\
        - PL/SQL packages need rewriting\n\
        \n\
        Recommendations:\n\
        - Use ora2pg for the bulk of the schema\n\
        * Validate NUMBER precision\n\
        \n\
        Complexity: Medium\n\
        Timeline: about 10 Weeks of effort.";

    fn parser() -> ResponseParser {
        ResponseParser::new().unwrap()
    }

    #[test]
    fn test_extracts_fields() {
        let report = parser().report(RESPONSE);
        assert_eq!(report.compatibility_score, 82.0);
        assert_eq!(report.complexity, Complexity::Medium);
        assert_eq!(
            report.risks,
            vec!["Sequences must be recreated", "PL/SQL packages need rewriting"]
        );
        assert_eq!(
            report.recommendations,
            vec!["Use ora2pg for the bulk of the schema", "Validate NUMBER precision"]
        );
        assert_eq!(report.timeline_estimate, "10 weeks");
        assert_eq!(report.source, ReportSource::Advisor);
    }

    #[test]
    fn test_defaults_when_missing() {
        let report = parser().report("Looks straightforward.");
        assert_eq!(report.compatibility_score, 75.0);
        assert_eq!(report.complexity, Complexity::Low);
        assert!(report.risks.is_empty());
        assert_eq!(report.timeline_estimate, "4-6 weeks");
    }

    #[test]
    fn test_very_high_wins() {
        assert_eq!(complexity("Complexity: Very High"), Complexity::VeryHigh);
    }

    #[test]
    fn test_lists_are_capped() {
        let text = "Risks:\n- a\n- b\n- c\n- d\n- e\n- f\n- g";
        assert_eq!(section_items(text, &["risk"]).len(), MAX_ITEMS);
    }

    #[test]
    fn test_prompt_lists_objects() {
        let ctx = AdvisorContext::new(
            DialectPair::new(Dialect::MySql, Dialect::Postgres),
            vec![SchemaObject {
                name: "users".to_string(),
                kind: ObjectKind::Table,
                definition: String::new(),
            }],
        )
        .with_schema_score(92.0);
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("from MySQL to PostgreSQL"));
        assert!(prompt.contains("- users (Table)"));
        assert!(prompt.contains("score: 92%"));
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let advisor = AnthropicAdvisor::new("claude-test", "SQLPORT_TEST_KEY_THAT_IS_NEVER_SET").unwrap();
        assert!(!advisor.is_configured());
        let ctx = AdvisorContext::new(DialectPair::new(Dialect::MySql, Dialect::Postgres), vec![]);
        assert!(matches!(advisor.request(&ctx).await, Err(SqlportError::Advisor(_))));
    }
}
