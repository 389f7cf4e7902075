//! Typed reference declarations
//!
//! A reference is declared as `kind:locator` at the caller boundary. Parsing
//! is structural and fails fast: a malformed declaration aborts the whole
//! batch before any resolution work begins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The resolvable reference kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Query stored content and memory
    Search,
    /// A previously declared tool, by name
    Tool,
    /// A stored session, by id
    Memory,
    /// A local file, by path
    File,
    /// A remote URL, resolved through the artifact cache
    Url,
}

impl ReferenceKind {
    /// Lowercase wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Search => "search",
            ReferenceKind::Tool => "tool",
            ReferenceKind::Memory => "memory",
            ReferenceKind::File => "file",
            ReferenceKind::Url => "url",
        }
    }

    fn from_str(kind: &str) -> Option<Self> {
        match kind {
            "search" => Some(ReferenceKind::Search),
            "tool" => Some(ReferenceKind::Tool),
            "memory" => Some(ReferenceKind::Memory),
            "file" => Some(ReferenceKind::File),
            "url" => Some(ReferenceKind::Url),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `kind:locator` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Reference kind
    pub kind: ReferenceKind,
    /// Kind-specific locator; may itself contain `:` (URLs)
    pub locator: String,
}

impl Reference {
    /// Parse a single `kind:locator` declaration.
    ///
    /// The declaration splits on the first `:` only, so URL locators keep
    /// their scheme separator intact.
    pub fn parse(spec: &str) -> Result<Self> {
        let (kind, locator) = spec
            .split_once(':')
            .ok_or_else(|| Error::InvalidReference(format!("missing ':' in '{spec}'")))?;

        let kind = ReferenceKind::from_str(kind)
            .ok_or_else(|| Error::InvalidReference(format!("unknown kind '{kind}' in '{spec}'")))?;

        if locator.is_empty() {
            return Err(Error::InvalidReference(format!("empty locator in '{spec}'")));
        }

        Ok(Self {
            kind,
            locator: locator.to_string(),
        })
    }

    /// Parse a whole batch, failing on the first malformed declaration
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Self>> {
        specs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_kind() {
        for (spec, kind) in [
            ("search:error handling", ReferenceKind::Search),
            ("tool:git-haiku", ReferenceKind::Tool),
            ("memory:sess-1", ReferenceKind::Memory),
            ("file:/etc/hosts", ReferenceKind::File),
            ("url:https://example.com/doc", ReferenceKind::Url),
        ] {
            let reference = Reference::parse(spec).unwrap();
            assert_eq!(reference.kind, kind);
        }
    }

    #[test]
    fn test_url_locator_keeps_scheme() {
        let reference = Reference::parse("url:https://example.com/a?b=c").unwrap();
        assert_eq!(reference.locator, "https://example.com/a?b=c");
    }

    #[test]
    fn test_malformed_shapes_rejected() {
        for spec in ["memory", "bogus:x", "tool:", ":locator", ""] {
            let err = Reference::parse(spec).unwrap_err();
            assert!(matches!(err, Error::InvalidReference(_)), "accepted '{spec}'");
        }
    }

    #[test]
    fn test_parse_all_fails_fast() {
        let specs = ["file:ok.txt", "bogus:x", "memory:sess-1"];
        let err = Reference::parse_all(&specs).unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));

        let specs = ["file:ok.txt", "memory:sess-1"];
        let parsed = Reference::parse_all(&specs).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_display_round_trip() {
        let reference = Reference::parse("url:https://example.com").unwrap();
        assert_eq!(reference.to_string(), "url:https://example.com");
    }
}
