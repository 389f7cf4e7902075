//! Keyword extraction for session tagging
//!
//! Tag derivation is heuristic and deliberately swappable: storage code only
//! sees the [`KeywordExtractor`] trait. The default implementation keeps
//! lowercase words longer than a configured minimum that are not stop-words.

use crate::config::KeywordConfig;
use std::collections::HashSet;

/// Words too common to be useful tags
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "her",
    "was", "one", "our", "out", "day", "had", "has", "his", "how", "its",
    "may", "new", "now", "old", "see", "two", "way", "who", "boy", "did",
    "get", "got", "him", "let", "put", "say", "she", "too", "use", "will",
    "with", "have", "this", "that", "from", "what", "when", "where", "which",
    "some", "would", "there", "their", "about", "after", "before", "could",
    "should", "other", "because",
];

/// Extracts searchable keywords from free-form message text
pub trait KeywordExtractor: Send + Sync {
    /// Return the keywords found in `text`, lowercased
    fn keywords(&self, text: &str) -> Vec<String>;
}

/// Default stop-word extractor
pub struct StopWordExtractor {
    min_length: usize,
    stop_words: HashSet<String>,
}

impl StopWordExtractor {
    /// Build an extractor from keyword configuration
    pub fn new(config: &KeywordConfig) -> Self {
        let mut stop_words: HashSet<String> =
            STOP_WORDS.iter().map(|w| w.to_string()).collect();
        stop_words.extend(config.extra_stop_words.iter().map(|w| w.to_lowercase()));

        Self {
            min_length: config.min_length,
            stop_words,
        }
    }
}

impl Default for StopWordExtractor {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}

impl KeywordExtractor for StopWordExtractor {
    fn keywords(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() > self.min_length && !self.stop_words.contains(w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_words_dropped() {
        let extractor = StopWordExtractor::default();
        let words = extractor.keywords("build a tiny parser quickly");
        assert_eq!(words, vec!["parser", "quickly"]);
    }

    #[test]
    fn test_stop_words_dropped() {
        let extractor = StopWordExtractor::default();
        // "should" and "because" are long enough but too common
        let words = extractor.keywords("should happen because reasons");
        assert_eq!(words, vec!["happen", "reasons"]);
    }

    #[test]
    fn test_lowercased() {
        let extractor = StopWordExtractor::default();
        let words = extractor.keywords("Deploy KUBERNETES");
        assert_eq!(words, vec!["deploy", "kubernetes"]);
    }

    #[test]
    fn test_extra_stop_words_from_config() {
        let config = KeywordConfig {
            min_length: 5,
            extra_stop_words: vec!["Kubernetes".to_string()],
        };
        let extractor = StopWordExtractor::new(&config);
        let words = extractor.keywords("deploy kubernetes cluster");
        assert_eq!(words, vec!["deploy", "cluster"]);
    }

    #[test]
    fn test_configurable_min_length() {
        let config = KeywordConfig {
            min_length: 3,
            extra_stop_words: Vec::new(),
        };
        let extractor = StopWordExtractor::new(&config);
        let words = extractor.keywords("ship fast code");
        assert_eq!(words, vec!["ship", "fast", "code"]);
    }
}
