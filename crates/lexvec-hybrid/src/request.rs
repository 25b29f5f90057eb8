use serde::{Deserialize, Serialize};

use lexvec_core::config::SearchSettings;
use lexvec_core::error::{Error, Result};

use crate::engine::{validate_alpha, validate_query};
use crate::fusion::FusedResult;

/// A search as a front end submits it. Omitting `top_k` uses the configured
/// default; omitting `alpha` asks the engine to pick one from the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), top_k: None, alpha: None }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Rejects empty queries, `top_k` outside `1..=max_top_k` and alpha
    /// outside `[0, 1]`. Returns the effective `top_k`.
    pub fn validate(&self, settings: &SearchSettings) -> Result<usize> {
        validate_query(&self.query)?;
        let top_k = self.top_k.unwrap_or(settings.default_top_k);
        let max_top_k = settings.max_top_k;
        if !(1..=max_top_k).contains(&top_k) {
            return Err(Error::InvalidInput(format!("top_k must be between 1 and {max_top_k}, got {top_k}")));
        }
        if let Some(alpha) = self.alpha {
            validate_alpha(alpha)?;
        }
        Ok(top_k)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHitView {
    pub text: String,
    pub section: String,
    pub page: u32,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub alpha_used: f32,
    pub total: usize,
    pub results: Vec<SearchHitView>,
}

impl SearchResponse {
    pub fn new(query: &str, alpha: f32, results: Vec<FusedResult>) -> Self {
        let results: Vec<SearchHitView> = results
            .into_iter()
            .map(|r| SearchHitView {
                text: r.chunk.content,
                section: r.chunk.section,
                page: r.chunk.page,
                score: round4(r.score),
            })
            .collect();
        Self { query: query.to_string(), alpha_used: alpha, total: results.len(), results }
    }
}

fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}

/// Human-readable rendering used by the CLI.
pub fn format_text(response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results found for query: '{}'", response.query);
    }
    let mut out = format!("Found {} results for query: '{}'\n{}\n", response.total, response.query, "=".repeat(60));
    for (i, hit) in response.results.iter().enumerate() {
        out.push_str(&format!(
            "\n**Result {}**\nSection: {}\nPage: {}\nRelevance Score: {:.3}\nContent: {}\n{}\n",
            i + 1,
            hit.section,
            hit.page,
            hit.score,
            hit.text,
            "-".repeat(40)
        ));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleQuery {
    pub query: &'static str,
    pub description: &'static str,
    pub expected: &'static str,
}

/// Canned queries that show off both retrieval methods.
pub fn example_queries() -> Vec<ExampleQuery> {
    vec![
        ExampleQuery {
            query: "SALT deduction limit",
            description: "State and local tax deduction cap",
            expected: "Section 164 limits on state and local taxes",
        },
        ExampleQuery {
            query: "senior citizen additional deduction",
            description: "Extra standard deduction for taxpayers 65 and older",
            expected: "Section 63 additional standard deduction amounts",
        },
        ExampleQuery {
            query: "Section 164",
            description: "Direct section citation, weighted toward keyword matching",
            expected: "Text of Section 164 on deductible taxes",
        },
        ExampleQuery {
            query: "child tax credit",
            description: "Credit for qualifying children",
            expected: "Section 24 child tax credit rules",
        },
        ExampleQuery {
            query: "401k contribution limits",
            description: "Elective deferral limits for retirement plans",
            expected: "Sections 401 and 402 on qualified plan limits",
        },
    ]
}
