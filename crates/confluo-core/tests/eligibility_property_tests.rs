/// Property-based tests for source eligibility
///
/// Property: eligibility depends on nothing but its inputs, and the base
/// always ends at the cursor.
use confluo_core::{MatchSettings, PatternMatcher};
use confluo_protocol::{Context, SourceConfig};
use proptest::prelude::*;

fn typed_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_.() é]{0,16}"
}

fn source_strategy() -> impl Strategy<Value = SourceConfig> {
    (0usize..5, prop::option::of(prop_oneof![Just(r"\."), Just(r"::"), Just(r"^\s*import ")]))
        .prop_map(|(len, pattern)| {
            let source = SourceConfig::new("src").with_complete_length(len);
            match pattern {
                Some(pattern) => source.with_complete_pattern(pattern),
                None => source,
            }
        })
}

proptest! {
    /// Property: identical inputs give identical results
    #[test]
    fn prop_eligibility_is_deterministic(
        typed in typed_strategy(),
        source in source_strategy(),
    ) {
        let matcher = PatternMatcher::new();
        let mut first = Context::new("text", typed.clone());
        let mut second = Context::new("text", typed);

        let a = matcher.is_eligible(&source, &mut first, MatchSettings::default());
        let b = matcher.is_eligible(&source, &mut second, MatchSettings::default());

        prop_assert_eq!(a, b);
        prop_assert_eq!(&first, &second);

        // a fresh matcher without memoised regexes agrees too
        let mut third = Context::new("text", first.typed.clone());
        let c = PatternMatcher::new().is_eligible(&source, &mut third, MatchSettings::default());
        prop_assert_eq!(a, c);
    }

    /// Property: base ends at the cursor
    #[test]
    fn prop_base_ends_at_cursor(
        typed in typed_strategy(),
        source in source_strategy(),
    ) {
        let matcher = PatternMatcher::new();
        let mut ctx = Context::new("text", typed.clone());
        matcher.is_eligible(&source, &mut ctx, MatchSettings::default());

        prop_assert_eq!(ctx.startccol + ctx.base.chars().count(), ctx.ccol);
        prop_assert!(typed.ends_with(&ctx.base));
    }

    /// Property: without trigger patterns the minimum length decides alone
    #[test]
    fn prop_length_threshold(
        word in "[a-z]{0,10}",
        min in 0usize..8,
    ) {
        let matcher = PatternMatcher::new();
        let source = SourceConfig::new("buffer").with_complete_length(min);
        let mut ctx = Context::new("text", format!("x = {}", word));

        let eligible = matcher.is_eligible(&source, &mut ctx, MatchSettings::default());
        prop_assert_eq!(eligible, word.len() >= min);
        prop_assert_eq!(ctx.base, word);
    }
}
