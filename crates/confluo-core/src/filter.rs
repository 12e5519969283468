/// Candidate filters and the filter registry
///
/// A filter takes the text typed since a source's start column and the
/// source's raw candidates, and returns the candidates to show. Filters
/// are chained: the source's own filter (or the default one) runs first,
/// followed by every configured extra filter.
use crate::error::{EngineError, EngineResult};
use crate::text::display_width;
use confluo_protocol::Match;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Candidate filter
pub trait Filter: Send + Sync {
    fn filter(&self, base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>>;
}

fn smart_case(base: &str) -> bool {
    base.chars().any(char::is_uppercase)
}

/// Keeps candidates whose word starts with the base (smart case)
pub struct PrefixFilter;

impl Filter for PrefixFilter {
    fn filter(&self, base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        if base.is_empty() {
            return Ok(matches);
        }
        if smart_case(base) {
            return Ok(matches
                .into_iter()
                .filter(|m| m.word.starts_with(base))
                .collect());
        }
        let base = base.to_lowercase();
        Ok(matches
            .into_iter()
            .filter(|m| m.word.to_lowercase().starts_with(&base))
            .collect())
    }
}

/// Keeps candidates whose word starts with the base, ignoring case
pub struct IgnoreCasePrefixFilter;

impl Filter for IgnoreCasePrefixFilter {
    fn filter(&self, base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        let base = base.to_lowercase();
        Ok(matches
            .into_iter()
            .filter(|m| m.word.to_lowercase().starts_with(&base))
            .collect())
    }
}

/// Keeps candidates whose word contains the base (smart case)
pub struct SubstringFilter;

impl Filter for SubstringFilter {
    fn filter(&self, base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        if base.is_empty() {
            return Ok(matches);
        }
        if smart_case(base) {
            return Ok(matches
                .into_iter()
                .filter(|m| m.word.contains(base))
                .collect());
        }
        let base = base.to_lowercase();
        Ok(matches
            .into_iter()
            .filter(|m| m.word.to_lowercase().contains(&base))
            .collect())
    }
}

/// Fuzzy matching with nucleo; best matches first, ties keep source order
pub struct FuzzyFilter;

impl Filter for FuzzyFilter {
    fn filter(&self, base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        use nucleo::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
        use nucleo::{Config, Matcher, Utf32Str};

        if base.is_empty() {
            return Ok(matches);
        }

        let mut matcher = Matcher::new(Config::DEFAULT);
        let pattern = Pattern::new(base, CaseMatching::Smart, Normalization::Smart, AtomKind::Fuzzy);

        let mut buf = Vec::new();
        let mut scored: Vec<(u32, Match)> = matches
            .into_iter()
            .filter_map(|m| {
                let score = {
                    let haystack = Utf32Str::new(&m.word, &mut buf);
                    pattern.score(haystack, &mut matcher)
                };
                score.map(|score| (score, m))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }
}

/// Drops candidates whose word was already seen
pub struct DedupFilter;

impl Filter for DedupFilter {
    fn filter(&self, _base: &str, matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        let mut seen = HashSet::new();
        Ok(matches
            .into_iter()
            .filter(|m| seen.insert(m.word.clone()))
            .collect())
    }
}

/// Truncates long abbreviations to a display width
pub struct AbbrEllipsisFilter {
    max_width: usize,
}

impl AbbrEllipsisFilter {
    pub fn new(max_width: usize) -> Self {
        Self { max_width }
    }
}

impl Filter for AbbrEllipsisFilter {
    fn filter(&self, _base: &str, mut matches: Vec<Match>) -> EngineResult<Vec<Match>> {
        if self.max_width == 0 {
            return Err(EngineError::Filter {
                filter: "abbr_ellipsis".to_string(),
                message: "max width must be positive".to_string(),
            });
        }

        for m in &mut matches {
            if display_width(&m.abbr) <= self.max_width {
                continue;
            }
            let mut truncated = String::new();
            for ch in m.abbr.chars() {
                let next = format!("{}{}", truncated, ch);
                if display_width(&next) + 1 > self.max_width {
                    break;
                }
                truncated = next;
            }
            truncated.push('…');
            m.abbr = truncated;
        }
        Ok(matches)
    }
}

/// Filter id -> implementation
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Registry with every built-in filter
    pub fn with_builtin_filters() -> Self {
        let mut registry = Self::new();
        registry.register("prefix", Arc::new(PrefixFilter));
        registry.register("icase_prefix", Arc::new(IgnoreCasePrefixFilter));
        registry.register("substr", Arc::new(SubstringFilter));
        registry.register("fuzzy", Arc::new(FuzzyFilter));
        registry.register("dedup", Arc::new(DedupFilter));
        registry.register("abbr_ellipsis", Arc::new(AbbrEllipsisFilter::new(50)));
        registry
    }

    /// Register a filter; an existing filter with the same id is replaced
    pub fn register(&mut self, id: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.insert(id.into(), filter);
    }

    pub fn get(&self, id: &str) -> EngineResult<Arc<dyn Filter>> {
        self.filters
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownFilter(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    /// Run `primary` then each of `extra` over the candidates
    pub fn apply_chain(
        &self,
        primary: &str,
        extra: &[String],
        base: &str,
        matches: Vec<Match>,
    ) -> EngineResult<Vec<Match>> {
        let mut matches = self.get(primary)?.filter(base, matches)?;
        for id in extra {
            matches = self.get(id)?.filter(base, matches)?;
        }
        Ok(matches)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtin_filters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<Match> {
        items.iter().map(|w| Match::new(*w)).collect()
    }

    fn labels(items: &[Match]) -> Vec<&str> {
        items.iter().map(|m| m.word.as_str()).collect()
    }

    #[test]
    fn test_prefix_filter_smart_case() {
        let items = words(&["Foo", "foobar", "bar"]);
        let lower = PrefixFilter.filter("fo", items.clone()).unwrap();
        assert_eq!(labels(&lower), vec!["Foo", "foobar"]);

        let upper = PrefixFilter.filter("Fo", items).unwrap();
        assert_eq!(labels(&upper), vec!["Foo"]);
    }

    #[test]
    fn test_prefix_filter_empty_base_keeps_all() {
        let items = words(&["a", "b"]);
        assert_eq!(PrefixFilter.filter("", items).unwrap().len(), 2);
    }

    #[test]
    fn test_substring_filter() {
        let items = words(&["read_file", "write", "filename"]);
        let filtered = SubstringFilter.filter("file", items).unwrap();
        assert_eq!(labels(&filtered), vec!["read_file", "filename"]);
    }

    #[test]
    fn test_fuzzy_filter_drops_non_matches() {
        let items = words(&["test_variable", "other", "tv"]);
        let filtered = FuzzyFilter.filter("tv", items).unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|m| m.word != "other"));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut items = words(&["foo", "bar", "foo"]);
        items[0].menu = "first".to_string();
        let filtered = DedupFilter.filter("", items).unwrap();
        assert_eq!(labels(&filtered), vec!["foo", "bar"]);
        assert_eq!(filtered[0].menu, "first");
    }

    #[test]
    fn test_abbr_ellipsis_truncates() {
        let items = words(&["abcdefghij", "abc"]);
        let filtered = AbbrEllipsisFilter::new(5).filter("", items).unwrap();
        assert_eq!(filtered[0].abbr, "abcd…");
        assert_eq!(filtered[0].word, "abcdefghij");
        assert_eq!(filtered[1].abbr, "abc");
    }

    #[test]
    fn test_chain_with_unknown_filter_fails() {
        let registry = FilterRegistry::with_builtin_filters();
        let result = registry.apply_chain("prefix", &["nope".to_string()], "f", words(&["foo"]));
        assert!(matches!(result, Err(EngineError::UnknownFilter(id)) if id == "nope"));
    }

    #[test]
    fn test_chain_applies_in_order() {
        let registry = FilterRegistry::with_builtin_filters();
        let result = registry
            .apply_chain("prefix", &["dedup".to_string()], "fo", words(&["foo", "foo", "bar"]))
            .unwrap();
        assert_eq!(labels(&result), vec!["foo"]);
    }
}
