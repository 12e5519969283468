/// Per-source result cache with staleness rules
///
/// Sources answer asynchronously, so results can arrive out of order or
/// after the buffer moved on. A delivery is only stored when it is not
/// older than what is cached, and - for dated deliveries - when the
/// delivered context and the live context still agree on where the word
/// being completed starts.
use crate::pattern::{MatchSettings, PatternMatcher};
use confluo_protocol::{CompletionState, Context, DeliveredMatch, Match, SourceConfig};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Cached result of one source
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Column the candidates start at, in the root line
    pub startccol: usize,
    pub matches: Vec<Match>,
    /// Output of the last merge pass
    pub filtered_matches: Vec<Match>,
    /// Context the source computed `matches` for
    pub context: Context,
    /// Source asked to be re-queried on the next keystroke
    pub refresh: bool,
    /// False while the current text does not satisfy the source's patterns
    pub enable: bool,
}

/// A source result on its way into the cache
#[derive(Debug, Clone)]
pub struct Delivery {
    pub context: Context,
    pub startccol: usize,
    pub matches: Vec<DeliveredMatch>,
    pub refresh: bool,
}

/// What happened to a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Entry created or replaced
    Stored,
    /// Empty delivery; entry removed
    Removed,
    /// Older than the cached entry
    Stale,
    /// Dated delivery no longer matches the live text
    Outdated,
    /// No source with that name in the live state
    UnknownSource,
}

impl DeliveryOutcome {
    /// Whether the cache changed and the popup needs recomputing
    pub fn changed_cache(&self) -> bool {
        matches!(self, DeliveryOutcome::Stored | DeliveryOutcome::Removed)
    }
}

/// Source name -> cached result
#[derive(Debug, Default)]
pub struct CompletionCache {
    entries: HashMap<String, CacheEntry>,
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn remove(&mut self, name: &str) -> Option<CacheEntry> {
        self.entries.remove(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Toggle an existing entry; no-op when the source has no entry
    pub fn set_enabled(&mut self, name: &str, enable: bool) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.enable = enable;
        }
    }

    /// Store a source result
    pub fn deliver(
        &mut self,
        live: &CompletionState,
        matcher: &PatternMatcher,
        delivery: Delivery,
    ) -> DeliveryOutcome {
        let Delivery {
            context,
            mut startccol,
            matches,
            refresh,
        } = delivery;

        let name = context.source.clone().unwrap_or_default();
        let source = match live.sources.get(&name) {
            Some(source) => source,
            None => {
                error!("invalid completion source name [{}]", name);
                return DeliveryOutcome::UnknownSource;
            }
        };

        if let Some(cached) = self.entries.get(&name) {
            if cached.context.reltime > context.reltime {
                debug!(source = %name, "newer result already cached");
                return DeliveryOutcome::Stale;
            }
        }

        if context.dated {
            if !is_kw_type(matcher, source, &context, live) {
                info!(
                    source = %name,
                    "dated is_kw_type fail, old[{}] cur[{}]",
                    context.typed,
                    live.context.typed
                );
                return DeliveryOutcome::Outdated;
            }
            info!(
                source = %name,
                "dated is_kw_type ok, old[{}] cur[{}]",
                context.typed,
                live.context.typed
            );
        }

        // subscope columns are relative to the scope's first column
        if context.lnum == 1 {
            startccol = (startccol + context.scope_ccol).saturating_sub(1);
        }

        let matches: Vec<Match> = matches
            .into_iter()
            .map(|m| m.into_match(&name))
            .collect();

        if matches.is_empty() {
            self.entries.remove(&name);
            return DeliveryOutcome::Removed;
        }

        let enable = !context.early_cache;
        match self.entries.get_mut(&name) {
            Some(entry) => {
                entry.startccol = startccol;
                entry.refresh = refresh;
                entry.matches = matches;
                entry.context = context;
                entry.enable = enable;
            }
            None => {
                self.entries.insert(
                    name,
                    CacheEntry {
                        startccol,
                        matches,
                        filtered_matches: Vec::new(),
                        context,
                        refresh,
                        enable,
                    },
                );
            }
        }
        DeliveryOutcome::Stored
    }
}

/// Whether a result computed for `stale` is still usable at `live.context`
///
/// Both contexts have to be pattern-eligible for the source and agree on
/// the start column of the word being completed.
pub fn is_kw_type(
    matcher: &PatternMatcher,
    source: &SourceConfig,
    stale: &Context,
    live: &CompletionState,
) -> bool {
    let settings = MatchSettings::from_state(live);
    let mut old_ctx = stale.clone();
    let mut cur_ctx = live.context.clone();

    if !matcher.is_eligible(source, &mut old_ctx, settings) {
        debug!("old_ctx source_check_patterns failed");
        return false;
    }
    if !matcher.is_eligible(source, &mut cur_ctx, settings) {
        debug!("cur_ctx source_check_patterns failed");
        return false;
    }

    old_ctx.startccol == cur_ctx.startccol
}
