//! Resolved context fragments and batch outcomes
//!
//! A batch resolution never throws for an individual reference: the outcome
//! carries the successful fragments together with a per-reference error list,
//! and the synthesis layer above decides what to do with each.

use super::reference::{Reference, ReferenceKind};
use crate::error::Error;
use serde::Serialize;
use std::collections::HashMap;

/// Per-fragment size cap applied when formatting for the AI
const FRAGMENT_CHAR_LIMIT: usize = 2000;

/// Total size cap for the formatted context block
const TOTAL_CHAR_LIMIT: usize = 8 * 1024;

/// Successfully resolved content for one reference
#[derive(Debug, Clone, Serialize)]
pub struct ContextFragment {
    /// Reference kind
    pub kind: ReferenceKind,
    /// The declared locator
    pub locator: String,
    /// Resolved, formatted content
    pub content: String,
}

/// A non-fatal, per-reference resolution failure
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceError {
    /// Reference kind
    pub kind: ReferenceKind,
    /// The declared locator
    pub locator: String,
    /// Human-readable failure description
    pub error: String,
}

impl ReferenceError {
    /// Record a failure for one reference
    pub fn new(reference: &Reference, error: &Error) -> Self {
        Self {
            kind: reference.kind,
            locator: reference.locator.clone(),
            error: error.to_string(),
        }
    }
}

/// Combined result of resolving a reference batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionOutcome {
    /// Successfully resolved fragments, in declaration order
    pub fragments: Vec<ContextFragment>,
    /// Per-reference failures, in declaration order
    pub errors: Vec<ReferenceError>,
}

impl ResolutionOutcome {
    /// Format successful fragments for AI consumption.
    ///
    /// Returns an empty string when nothing resolved. Individual fragments
    /// and the whole block are size-capped.
    pub fn format_for_ai(&self) -> String {
        let successful: Vec<&ContextFragment> = self
            .fragments
            .iter()
            .filter(|f| !f.content.is_empty())
            .collect();

        if successful.is_empty() {
            return String::new();
        }

        let mut parts = vec!["CONTEXTUAL INFORMATION:".to_string()];
        let mut total = 0usize;

        for fragment in successful {
            let mut content = fragment.content.clone();
            if content.len() > FRAGMENT_CHAR_LIMIT {
                content.truncate(FRAGMENT_CHAR_LIMIT);
                content.push_str("\n[Content truncated for size]");
            }

            if total + content.len() > TOTAL_CHAR_LIMIT {
                parts.push("\n[Additional references omitted due to size limit]".to_string());
                break;
            }

            let block = format!(
                "\n{} Reference ({}):\n{}\n",
                title_case(fragment.kind.as_str()),
                fragment.locator,
                content
            );
            total += block.len();
            parts.push(block);
        }

        parts.push("\nUse this contextual information to generate more relevant tools.\n".to_string());
        parts.concat()
    }

    /// Compute aggregate statistics for this outcome
    pub fn stats(&self) -> ResolutionStats {
        let mut breakdown: HashMap<String, usize> = HashMap::new();
        for fragment in &self.fragments {
            *breakdown.entry(fragment.kind.as_str().to_string()).or_default() += 1;
        }
        for error in &self.errors {
            *breakdown.entry(error.kind.as_str().to_string()).or_default() += 1;
        }

        let total = self.fragments.len() + self.errors.len();
        let success_rate = if total > 0 {
            self.fragments.len() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        ResolutionStats {
            total_references: total,
            resolved_count: self.fragments.len(),
            failed_count: self.errors.len(),
            total_content_size: self.fragments.iter().map(|f| f.content.len()).sum(),
            type_breakdown: breakdown,
            success_rate,
        }
    }
}

/// Aggregate statistics over one resolution batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionStats {
    /// References in the batch
    pub total_references: usize,
    /// References that resolved
    pub resolved_count: usize,
    /// References that failed
    pub failed_count: usize,
    /// Combined size of resolved content
    pub total_content_size: usize,
    /// Reference count per kind
    pub type_breakdown: HashMap<String, usize>,
    /// Resolved fraction as a percentage
    #[serde(rename = "success_rate_percent")]
    pub success_rate: f64,
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
