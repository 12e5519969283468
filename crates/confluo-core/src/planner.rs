/// Per-keystroke source request planning
///
/// For every (context, source) pair the planner decides whether the source
/// has to be asked for fresh candidates. Sources whose cached result still
/// covers the current word are left alone.
use crate::cache::CompletionCache;
use crate::merge::FilterChain;
use crate::pattern::{MatchSettings, PatternMatcher};
use confluo_protocol::{Context, SourceConfig, SourceRequest};
use indexmap::IndexMap;
use tracing::debug;

pub struct RequestPlanner<'a> {
    matcher: &'a PatternMatcher,
    settings: MatchSettings<'a>,
}

impl<'a> RequestPlanner<'a> {
    pub fn new(matcher: &'a PatternMatcher, settings: MatchSettings<'a>) -> Self {
        Self { matcher, settings }
    }

    /// Whether `source` completes in the context's scope; sets `scope_match`
    ///
    /// Sources without scopes only serve the root context. Scoped sources
    /// need an exact scope hit and, below the root, `subscope_enable`.
    pub fn source_check_scope(&self, source: &SourceConfig, context: &mut Context) -> bool {
        context.scope_match = None;
        let is_root = context.is_root();

        let scopes = match source.scopes.as_deref() {
            Some(scopes) if !scopes.is_empty() => scopes,
            _ => return is_root,
        };

        match scopes.iter().find(|scope| **scope == context.scope) {
            Some(scope) => {
                context.scope_match = Some(scope.clone());
                source.subscope_enable || is_root
            }
            None => false,
        }
    }

    /// Decide whether `source` must be refreshed for `context`
    ///
    /// Toggles the source's cache entry as a side effect: entries are
    /// disabled while the text does not satisfy the source's patterns.
    pub fn should_request(
        &self,
        source: &SourceConfig,
        context: &mut Context,
        cache: &mut CompletionCache,
    ) -> bool {
        let name = source.name.as_str();

        if !source.enable {
            return false;
        }

        if !self.source_check_scope(source, context) {
            debug!(source = %name, "source_check_scope ignore for context scope <{}>", context.scope);
            return false;
        }

        let manual = context.manual;
        if !source.auto_popup && !manual {
            debug!(source = %name, "not auto_popup");
            return false;
        }

        if self.matcher.is_eligible(source, context, self.settings) {
            cache.set_enabled(name, true);
        } else if source.early_cache && !context.base.is_empty() {
            context.early_cache = true;
        } else {
            debug!(source = %name, "source_check_patterns failed, base [{}]", context.base);
            cache.set_enabled(name, false);
            return false;
        }

        if let Some(entry) = cache.get(name) {
            if !entry.refresh
                && !manual
                && entry.startccol == context.startccol
                && entry.context.match_end == context.match_end
            {
                debug!(source = %name, "cached, {} candidates", entry.matches.len());
                return false;
            }
        }

        true
    }

    /// Per-source request contexts for every expanded context
    pub fn plan_refresh(
        &self,
        contexts: &[Context],
        sources: &IndexMap<String, SourceConfig>,
        cache: &mut CompletionCache,
        chain: FilterChain<'_>,
    ) -> Vec<SourceRequest> {
        let mut requests = Vec::new();
        for scoped in contexts {
            for (name, source) in sources {
                let mut context = scoped.clone();
                context.early_cache = false;
                context.source = Some(name.clone());
                context.filter = Some(chain.filter_for(source).to_string());

                if !self.should_request(source, &mut context, cache) {
                    continue;
                }
                requests.push(SourceRequest {
                    name: name.clone(),
                    context,
                });
            }
        }
        requests
    }

    /// Warmup targets: enabled sources whose scope fits, no pattern checks
    pub fn plan_warmup(
        &self,
        contexts: &[Context],
        sources: &IndexMap<String, SourceConfig>,
    ) -> Vec<SourceRequest> {
        let mut requests = Vec::new();
        for scoped in contexts {
            for (name, source) in sources {
                if !source.enable {
                    continue;
                }
                let mut context = scoped.clone();
                context.early_cache = false;
                context.source = Some(name.clone());

                if !self.source_check_scope(source, &mut context) {
                    continue;
                }
                requests.push(SourceRequest {
                    name: name.clone(),
                    context,
                });
            }
        }
        requests
    }
}
