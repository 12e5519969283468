/// Per-source settings as sent by the host
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum base length before a source is asked for completions
///
/// Either a fixed length, or a table of `[min_priority, length]` tiers. With a
/// table, the tier with the highest threshold that the source's priority
/// reaches wins. Negative thresholds never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompleteLength {
    Fixed(usize),
    Tiered(Vec<(i64, usize)>),
}

impl CompleteLength {
    /// Resolve the minimum length for a source of the given priority
    pub fn resolve(&self, priority: i64) -> Option<usize> {
        match self {
            CompleteLength::Fixed(len) => Some(*len),
            CompleteLength::Tiered(tiers) => {
                let mut best: Option<(i64, usize)> = None;
                for &(min_priority, len) in tiers {
                    if min_priority < 0 || priority < min_priority {
                        continue;
                    }
                    if best.map_or(true, |(threshold, _)| min_priority > threshold) {
                        best = Some((min_priority, len));
                    }
                }
                best.map(|(_, len)| len)
            }
        }
    }
}

/// Word pattern override: one regex, or one per scope with `*` as wildcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WordPattern {
    Single(String),
    PerScope(HashMap<String, String>),
}

impl WordPattern {
    /// Pattern for a (lowercased) scope name
    pub fn for_scope(&self, scope: &str) -> Option<&str> {
        match self {
            WordPattern::Single(pattern) => Some(pattern),
            WordPattern::PerScope(map) => map
                .get(scope)
                .or_else(|| map.get("*"))
                .map(String::as_str),
        }
    }
}

/// Completion source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Unique source name
    pub name: String,
    pub enable: bool,
    /// Higher priority sources are listed first
    pub priority: i64,
    /// Scopes this source applies to; `None` means a general, root-only source
    pub scopes: Option<Vec<String>>,
    /// Allow matching a scope that was discovered as a subscope
    pub subscope_enable: bool,
    /// Ask this source on automatic (non-manual) triggers
    pub auto_popup: bool,
    /// Tolerate being asked with a non-empty, pattern-ineligible base
    pub early_cache: bool,
    /// Extra trigger regexes
    pub complete_pattern: Vec<String>,
    pub complete_length: Option<CompleteLength>,
    pub word_pattern: Option<WordPattern>,
    /// Decoration tag prepended to the menu text
    pub mark: String,
    /// Filter id overriding the default filter
    pub filter: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enable: true,
            priority: 5,
            scopes: None,
            subscope_enable: false,
            auto_popup: true,
            early_cache: false,
            complete_pattern: Vec::new(),
            complete_length: None,
            word_pattern: None,
            mark: String::new(),
            filter: None,
        }
    }
}

impl SourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_complete_length(mut self, len: usize) -> Self {
        self.complete_length = Some(CompleteLength::Fixed(len));
        self
    }

    pub fn with_complete_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.complete_pattern.push(pattern.into());
        self
    }

    pub fn with_mark(mut self, mark: impl Into<String>) -> Self {
        self.mark = mark.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn subscope_enabled(mut self) -> Self {
        self.subscope_enable = true;
        self
    }

    pub fn manual_only(mut self) -> Self {
        self.auto_popup = false;
        self
    }

    pub fn early_cache(mut self) -> Self {
        self.early_cache = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enable = false;
        self
    }
}
