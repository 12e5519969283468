/// Base-token extraction and per-source pattern eligibility
///
/// The base is the token right before the cursor, as recognised by the
/// active word pattern. A source is eligible for a context when one of its
/// trigger patterns ends inside the base region, or when the base is at
/// least as long as the source's minimum completion length.
use crate::error::{EngineError, EngineResult};
use crate::text::{byte_to_char, char_len};
use confluo_protocol::{CompleteLength, CompletionState, Context, SourceConfig, WordPattern};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Word pattern used for scopes without a tuned entry
pub const DEFAULT_WORD_PATTERN: &str =
    r#"(-?\d*\.\d\w*)|([^`~!@#$%^&*()\-=+\[{\]}\\|;:'",.<>/?\s]+)"#;

/// CSS keeps `-` inside words
pub const CSS_WORD_PATTERN: &str =
    r#"(-?\d*\.\d[\w-]*)|([^`~!@#$%^&*()=+\[{\]}\\|;:'",.<>/?\s]+)"#;

/// PHP keeps `$` and splits on `-`
pub const PHP_WORD_PATTERN: &str =
    r#"(-?\d*\.\d\w*)|([^\-`~!@#%^&*()=+\[{\]}\\|;:'",.<>/?\s]+)"#;

/// Vim script keeps `#`, `$` and `:` (autoload names, options, scopes)
pub const VIM_WORD_PATTERN: &str =
    r#"(-?\d*\.\d\w*)|([^\-`~!@%^&*()=+\[{\]}\\|;'",.<>/?\s]+)"#;

/// Built-in word pattern table keyed by scope
pub fn builtin_word_patterns() -> HashMap<String, String> {
    let mut patterns = HashMap::new();
    patterns.insert("*".to_string(), DEFAULT_WORD_PATTERN.to_string());
    patterns.insert("css".to_string(), CSS_WORD_PATTERN.to_string());
    patterns.insert("scss".to_string(), CSS_WORD_PATTERN.to_string());
    patterns.insert("php".to_string(), PHP_WORD_PATTERN.to_string());
    patterns.insert("vim".to_string(), VIM_WORD_PATTERN.to_string());
    patterns
}

/// Request-level overrides that take part in eligibility
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchSettings<'a> {
    pub complete_length: Option<&'a CompleteLength>,
    pub word_pattern: Option<&'a WordPattern>,
}

impl<'a> MatchSettings<'a> {
    pub fn from_state(state: &'a CompletionState) -> Self {
        Self {
            complete_length: state.complete_length.as_ref(),
            word_pattern: state.word_pattern.as_ref(),
        }
    }
}

/// Extracts base tokens and evaluates source eligibility
///
/// Compiled regexes are memoised; results only depend on the inputs.
pub struct PatternMatcher {
    word_patterns: HashMap<String, String>,
    default_complete_length: Option<CompleteLength>,
    compiled: Mutex<HashMap<String, Regex>>,
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self {
            word_patterns: builtin_word_patterns(),
            default_complete_length: None,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Layer scope -> pattern overrides over the built-in table
    pub fn with_word_patterns(mut self, overrides: &HashMap<String, String>) -> Self {
        for (scope, pattern) in overrides {
            self.word_patterns
                .insert(scope.to_lowercase(), pattern.clone());
        }
        self
    }

    /// Minimum base length used when neither source nor request sets one
    pub fn with_default_complete_length(mut self, complete_length: Option<CompleteLength>) -> Self {
        self.default_complete_length = complete_length;
        self
    }

    /// Resolve the word pattern for a context and source
    pub fn word_pattern<'a>(
        &'a self,
        context: &Context,
        source: &'a SourceConfig,
        settings: MatchSettings<'a>,
    ) -> &'a str {
        let scope = if context.scope.is_empty() {
            context.filetype.to_lowercase()
        } else {
            context.scope.to_lowercase()
        };

        if let Some(pattern) = source
            .word_pattern
            .as_ref()
            .and_then(|p| p.for_scope(&scope))
        {
            return pattern;
        }
        if let Some(pattern) = settings.word_pattern.and_then(|p| p.for_scope(&scope)) {
            return pattern;
        }

        self.word_patterns
            .get(&scope)
            .or_else(|| self.word_patterns.get("*"))
            .map(String::as_str)
            .unwrap_or(DEFAULT_WORD_PATTERN)
    }

    /// Extract `(base, startccol)` from the text before the cursor
    pub fn extract_base(&self, typed: &str, ccol: usize, word_pattern: &str) -> (String, usize) {
        let anchored = format!("(?:{})$", word_pattern);
        let found = match self.regex(&anchored) {
            Ok(re) => re.find(typed).map(|m| m.as_str().to_string()),
            Err(err) => {
                warn!("word pattern ignored: {}", err);
                None
            }
        };

        match found {
            Some(base) => {
                let startccol = ccol.saturating_sub(char_len(&base));
                (base, startccol)
            }
            None => (String::new(), ccol),
        }
    }

    /// Decide whether `source` should complete `context`
    ///
    /// Sets `base`, `startccol` and `match_end` on the context as a side
    /// effect.
    pub fn is_eligible(
        &self,
        source: &SourceConfig,
        context: &mut Context,
        settings: MatchSettings<'_>,
    ) -> bool {
        let word_pattern = self.word_pattern(context, source, settings);
        let (base, startccol) = self.extract_base(&context.typed, context.ccol, word_pattern);

        let typed_len = char_len(&context.typed);
        let base_len = char_len(&base);
        let word_start = typed_len.saturating_sub(base_len);

        context.base = base;
        context.startccol = startccol;
        context.match_end = word_start;

        for pattern in &source.complete_pattern {
            // a leading greedy wildcard pushes the match to the last occurrence
            let pattern = if pattern.starts_with('^') {
                pattern.clone()
            } else {
                format!(".*(?:{})", pattern)
            };

            let re = match self.regex(&pattern) {
                Ok(re) => re,
                Err(err) => {
                    warn!(source = %source.name, "complete pattern ignored: {}", err);
                    continue;
                }
            };

            if let Some(m) = re.find(&context.typed) {
                let end = byte_to_char(&context.typed, m.end());
                if end >= word_start {
                    context.match_end = end;
                    return true;
                }
            }
        }

        match self.complete_length(source, settings) {
            Some(min_len) => base_len >= min_len,
            None => {
                debug!(source = %source.name, "no complete_length resolved");
                false
            }
        }
    }

    /// Minimum base length: source setting, then request, then engine default
    pub fn complete_length(&self, source: &SourceConfig, settings: MatchSettings<'_>) -> Option<usize> {
        source
            .complete_length
            .as_ref()
            .or(settings.complete_length)
            .or(self.default_complete_length.as_ref())
            .and_then(|len| len.resolve(source.priority))
    }

    /// Compile (or fetch) a regex
    pub fn regex(&self, pattern: &str) -> EngineResult<Regex> {
        let mut compiled = self.compiled.lock();
        if let Some(re) = compiled.get(pattern) {
            return Ok(re.clone());
        }

        let re = Regex::new(pattern).map_err(|err| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        compiled.insert(pattern.to_string(), re.clone());
        Ok(re)
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}
