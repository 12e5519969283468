/// Property-based tests for merge alignment
///
/// Property: all merged candidates start at one column; candidates of
/// sources starting further right carry the text in between as a prefix.
use confluo_core::{
    CompletionCache, Delivery, FilterChain, FilterRegistry, Merger, PatternMatcher,
};
use confluo_protocol::{CompletionState, Context, DeliveredMatch, SourceConfig};
use proptest::prelude::*;
use proptest::sample::Index;

fn typed_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,4}", 1..5).prop_map(|parts| parts.join("."))
}

/// 1-based columns at which a dotted word starts
fn word_starts(typed: &str) -> Vec<usize> {
    let mut starts = vec![1];
    for (idx, ch) in typed.chars().enumerate() {
        if ch == '.' {
            starts.push(idx + 2);
        }
    }
    starts
}

fn suffix(typed: &str, col: usize) -> String {
    typed.chars().skip(col - 1).collect()
}

proptest! {
    /// Property: every merged word extends the text from the unified column
    #[test]
    fn prop_merged_words_share_start_column(
        typed in typed_strategy(),
        picks in prop::collection::vec(any::<Index>(), 1..5),
    ) {
        let starts = word_starts(&typed);
        let mut state = CompletionState::new(Context::new("text", typed.clone()));
        for i in 0..picks.len() {
            state = state.with_source(SourceConfig::new(format!("s{}", i)).with_priority(i as i64));
        }

        let matcher = PatternMatcher::new();
        let mut cache = CompletionCache::new();
        let mut columns = Vec::new();
        for (i, pick) in picks.iter().enumerate() {
            let col = starts[pick.index(starts.len())];
            columns.push(col);
            let word = format!("{}x", suffix(&typed, col));
            cache.deliver(&state, &matcher, Delivery {
                context: state.context.clone().with_source(format!("s{}", i)),
                startccol: col,
                matches: vec![DeliveredMatch::from(word.as_str())],
                refresh: false,
            });
        }

        let filters = FilterRegistry::with_builtin_filters();
        let chain = FilterChain { default_filter: "prefix", extra_filters: &[] };
        let result = Merger::new(&filters, chain).merge(&state.context, &mut cache, &state.sources);

        let unified = *columns.iter().min().unwrap();
        prop_assert_eq!(result.startccol, unified);
        prop_assert_eq!(result.matches.len(), picks.len());

        let expected = format!("{}x", suffix(&typed, unified));
        for m in &result.matches {
            prop_assert_eq!(&m.word, &expected);
            prop_assert_eq!(m.abbr.chars().count(), expected.chars().count());
        }
    }

    /// Property: merged order follows descending priority
    #[test]
    fn prop_merge_orders_by_priority(
        priorities in prop::collection::vec(-5i64..5, 1..6),
    ) {
        let mut state = CompletionState::new(Context::new("text", "ab"));
        for (i, priority) in priorities.iter().enumerate() {
            state = state.with_source(SourceConfig::new(format!("s{}", i)).with_priority(*priority));
        }

        let matcher = PatternMatcher::new();
        let mut cache = CompletionCache::new();
        for i in 0..priorities.len() {
            cache.deliver(&state, &matcher, Delivery {
                context: state.context.clone().with_source(format!("s{}", i)),
                startccol: 1,
                matches: vec![DeliveredMatch::from("abc")],
                refresh: false,
            });
        }

        let filters = FilterRegistry::with_builtin_filters();
        let chain = FilterChain { default_filter: "prefix", extra_filters: &[] };
        let result = Merger::new(&filters, chain).merge(&state.context, &mut cache, &state.sources);

        let seen: Vec<i64> = result
            .matches
            .iter()
            .map(|m| state.sources[m.source().unwrap()].priority)
            .collect();
        let mut sorted = seen.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        prop_assert_eq!(seen, sorted);
    }
}
