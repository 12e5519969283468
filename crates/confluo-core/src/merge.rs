/// Merging cached source results into one popup list
///
/// Every source reports its own start column. The merged list starts at the
/// leftmost column of all sources that still have candidates; candidates of
/// sources starting further right get the text in between prepended to
/// their word (and the same width of padding prepended to their
/// abbreviation) so that the whole list lines up on one column.
use crate::cache::{CacheEntry, CompletionCache};
use crate::error::{EngineError, EngineResult};
use crate::filter::FilterRegistry;
use crate::text::{char_slice, display_width, from_column};
use confluo_protocol::{Context, Match, SourceConfig};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Merged popup candidates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeResult {
    /// Unified start column
    pub startccol: usize,
    pub matches: Vec<Match>,
}

/// Filter chain defaults used while merging
#[derive(Debug, Clone, Copy)]
pub struct FilterChain<'a> {
    pub default_filter: &'a str,
    pub extra_filters: &'a [String],
}

impl<'a> FilterChain<'a> {
    /// Filter id for a source: its own override, else the default
    pub fn filter_for<'s>(&self, source: &'s SourceConfig) -> &'s str
    where
        'a: 's,
    {
        source.filter.as_deref().unwrap_or(self.default_filter)
    }
}

pub struct Merger<'a> {
    filters: &'a FilterRegistry,
    chain: FilterChain<'a>,
}

impl<'a> Merger<'a> {
    pub fn new(filters: &'a FilterRegistry, chain: FilterChain<'a>) -> Self {
        Self { filters, chain }
    }

    /// Filter and align every enabled cache entry against the live context
    ///
    /// `filtered_matches` of each entry is recomputed as a side effect.
    pub fn merge(
        &self,
        live: &Context,
        cache: &mut CompletionCache,
        sources: &IndexMap<String, SourceConfig>,
    ) -> MergeResult {
        let names = ordered_names(cache, sources);
        let ccol = live.ccol;
        let mut startccol = ccol;

        for name in &names {
            let entry = match cache.get_mut(name) {
                Some(entry) => entry,
                None => continue,
            };
            entry.filtered_matches.clear();

            match self.filter_entry(name, entry, sources, live) {
                Ok(Some(sccol)) => startccol = startccol.min(sccol),
                Ok(None) => {}
                Err(err) => warn!(source = %name, "merge process exception: {}", err),
            }
        }

        let mut matches = Vec::new();
        for name in &names {
            let entry = match cache.get(name) {
                Some(entry) if !entry.filtered_matches.is_empty() => entry,
                _ => continue,
            };
            match self.align_entry(name, entry, sources, &live.typed, startccol) {
                Ok(aligned) => matches.extend(aligned),
                Err(err) => warn!(source = %name, "merge process exception: {}", err),
            }
        }

        info!(
            "popup names: {:?}, startccol: {}, matches cnt: {}",
            names,
            startccol,
            matches.len()
        );

        MergeResult { startccol, matches }
    }

    /// Run the filter chain for one entry; returns its column if it has candidates left
    fn filter_entry(
        &self,
        name: &str,
        entry: &mut CacheEntry,
        sources: &IndexMap<String, SourceConfig>,
        live: &Context,
    ) -> EngineResult<Option<usize>> {
        let source = sources
            .get(name)
            .ok_or_else(|| EngineError::UnknownSource(name.to_string()))?;

        if !entry.enable {
            debug!(source = %name, "ignored by disabled");
            return Ok(None);
        }

        let sccol = entry.startccol;
        if sccol > live.ccol || sccol == 0 {
            warn!(source = %name, "ignoring invalid startccol {}", sccol);
            return Ok(None);
        }

        let base = from_column(&live.typed, sccol);
        let filtered = self.filters.apply_chain(
            self.chain.filter_for(source),
            self.chain.extra_filters,
            base,
            entry.matches.clone(),
        )?;

        entry.filtered_matches = filtered;
        if entry.filtered_matches.is_empty() {
            return Ok(None);
        }
        Ok(Some(sccol))
    }

    /// Prefix, pad and decorate one entry's filtered candidates
    fn align_entry(
        &self,
        name: &str,
        entry: &CacheEntry,
        sources: &IndexMap<String, SourceConfig>,
        typed: &str,
        startccol: usize,
    ) -> EngineResult<Vec<Match>> {
        let source = sources
            .get(name)
            .ok_or_else(|| EngineError::UnknownSource(name.to_string()))?;

        let prefix = char_slice(
            typed,
            startccol.saturating_sub(1),
            Some(entry.startccol.saturating_sub(1)),
        );
        let pad = " ".repeat(display_width(prefix));

        Ok(entry
            .filtered_matches
            .iter()
            .cloned()
            .map(|mut m| {
                m.abbr = format!("{}{}", pad, m.abbr);
                m.word = format!("{}{}", prefix, m.word);
                if !source.mark.is_empty() {
                    m.menu = format!("<{}> {}", source.mark, m.menu);
                }
                m
            })
            .collect())
    }
}

/// Cached source names, highest priority first (name breaks ties)
fn ordered_names(cache: &CompletionCache, sources: &IndexMap<String, SourceConfig>) -> Vec<String> {
    let mut names = cache.names();
    names.sort_by(|a, b| {
        let pa = sources.get(a).map_or(i64::MIN, |s| s.priority);
        let pb = sources.get(b).map_or(i64::MIN, |s| s.priority);
        pb.cmp(&pa).then_with(|| a.cmp(b))
    });
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Delivery;
    use crate::pattern::PatternMatcher;
    use confluo_protocol::{CompletionState, DeliveredMatch};

    fn deliver(cache: &mut CompletionCache, state: &CompletionState, name: &str, startccol: usize, words: &[&str]) {
        let delivery = Delivery {
            context: state.context.clone().with_source(name),
            startccol,
            matches: words.iter().map(|w| DeliveredMatch::from(*w)).collect(),
            refresh: false,
        };
        cache.deliver(state, &PatternMatcher::new(), delivery);
    }

    fn merge(state: &CompletionState, cache: &mut CompletionCache) -> MergeResult {
        let filters = FilterRegistry::with_builtin_filters();
        let chain = FilterChain {
            default_filter: "prefix",
            extra_filters: &[],
        };
        Merger::new(&filters, chain).merge(&state.context, cache, &state.sources)
    }

    #[test]
    fn test_single_source_is_unfiltered_when_all_match() {
        let state = CompletionState::new(Context::new("text", "fo"))
            .with_source(SourceConfig::new("buffer").with_complete_length(2));
        let mut cache = CompletionCache::new();
        deliver(&mut cache, &state, "buffer", 1, &["foo", "food"]);

        let result = merge(&state, &mut cache);
        assert_eq!(result.startccol, 1);
        let words: Vec<_> = result.matches.iter().map(|m| m.word.as_str()).collect();
        assert_eq!(words, vec!["foo", "food"]);
    }

    #[test]
    fn test_sources_are_aligned_to_leftmost_column() {
        let state = CompletionState::new(Context::new("text", "obj.me"))
            .with_source(SourceConfig::new("words").with_priority(3))
            .with_source(SourceConfig::new("members").with_priority(9).with_mark("M"));
        let mut cache = CompletionCache::new();
        deliver(&mut cache, &state, "members", 5, &["method"]);
        deliver(&mut cache, &state, "words", 1, &["obj.meta"]);

        let result = merge(&state, &mut cache);
        assert_eq!(result.startccol, 1);
        assert_eq!(result.matches[0].word, "obj.method");
        assert_eq!(result.matches[0].abbr, "    method");
        assert_eq!(result.matches[0].menu, "<M> ");
        assert_eq!(result.matches[1].word, "obj.meta");
    }

    #[test]
    fn test_disabled_and_invalid_entries_are_skipped() {
        let state = CompletionState::new(Context::new("text", "fo"))
            .with_source(SourceConfig::new("a"))
            .with_source(SourceConfig::new("b"));
        let mut cache = CompletionCache::new();
        deliver(&mut cache, &state, "a", 1, &["foo"]);
        deliver(&mut cache, &state, "b", 1, &["fox"]);
        cache.set_enabled("a", false);
        cache.get_mut("b").unwrap().startccol = 9;

        let result = merge(&state, &mut cache);
        assert!(result.matches.is_empty());
        assert_eq!(result.startccol, 3);
    }

    #[test]
    fn test_failing_source_does_not_abort_merge() {
        let state = CompletionState::new(Context::new("text", "fo"))
            .with_source(SourceConfig::new("good"))
            .with_source(SourceConfig::new("bad").with_filter("missing"));
        let mut cache = CompletionCache::new();
        deliver(&mut cache, &state, "good", 1, &["foo"]);
        deliver(&mut cache, &state, "bad", 1, &["fob"]);

        let result = merge(&state, &mut cache);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].word, "foo");
    }

    #[test]
    fn test_wide_prefix_padding_uses_display_width() {
        let state = CompletionState::new(Context::new("text", "日本.x"))
            .with_source(SourceConfig::new("near").with_priority(9))
            .with_source(SourceConfig::new("far"));
        let mut cache = CompletionCache::new();
        deliver(&mut cache, &state, "near", 4, &["xyz"]);
        deliver(&mut cache, &state, "far", 1, &["日本.xa"]);

        let result = merge(&state, &mut cache);
        assert_eq!(result.startccol, 1);
        assert_eq!(result.matches[0].word, "日本.xyz");
        assert_eq!(result.matches[0].abbr, "     xyz");
    }
}
