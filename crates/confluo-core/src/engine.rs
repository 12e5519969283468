/// The completion engine state machine
///
/// One `Engine` owns the cache, the detector and filter registries, the
/// last rendered popup and the last live buffer state. Every inbound
/// message runs to completion and yields the outbound messages it caused.
use crate::cache::{CompletionCache, Delivery, DeliveryOutcome};
use crate::config::EngineConfig;
use crate::filter::{Filter, FilterRegistry};
use crate::merge::{FilterChain, Merger};
use crate::pattern::{MatchSettings, PatternMatcher};
use crate::planner::RequestPlanner;
use crate::popup::PopupNotifier;
use crate::subscope::{ContextDetector, DetectorRegistry, SubscopeDetector};
use confluo_protocol::{CompletionState, Inbound, Outbound};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Engine {
    config: EngineConfig,
    matcher: PatternMatcher,
    filters: FilterRegistry,
    detectors: DetectorRegistry,
    cache: CompletionCache,
    popup: PopupNotifier,
    state: Option<CompletionState>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let matcher = PatternMatcher::new()
            .with_word_patterns(&config.word_patterns)
            .with_default_complete_length(config.complete_length.clone());

        Self {
            config,
            matcher,
            filters: FilterRegistry::with_builtin_filters(),
            detectors: DetectorRegistry::new(),
            cache: CompletionCache::new(),
            popup: PopupNotifier::new(),
            state: None,
        }
    }

    /// Replace the filter registry
    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn register_filter(&mut self, id: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.register(id, filter);
    }

    /// Register a subscope detector
    ///
    /// Returns the sync message to forward to the host when the detector
    /// covers a scope that had none before.
    pub fn register_detector(&mut self, detector: Arc<dyn SubscopeDetector>) -> Option<Outbound> {
        if self.detectors.register(detector) {
            Some(Outbound::SyncDetectors {
                scopes: self.detectors.sync_table(),
            })
        } else {
            None
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }

    pub fn popup(&self) -> &PopupNotifier {
        &self.popup
    }

    /// Last live buffer state, if any was received
    pub fn state(&self) -> Option<&CompletionState> {
        self.state.as_ref()
    }

    /// Dispatch one inbound message
    pub fn handle(&mut self, message: Inbound) -> Vec<Outbound> {
        match message {
            Inbound::Complete { state, manual } => self.on_complete(state, manual),
            Inbound::Warmup { state } => self.on_warmup(state),
            Inbound::Deliver {
                context,
                startccol,
                matches,
                refresh,
                state,
            } => self.on_deliver(
                Delivery {
                    context,
                    startccol,
                    matches,
                    refresh,
                },
                state,
            ),
            Inbound::UpdateState { state } => {
                self.update_state(state);
                Vec::new()
            }
            Inbound::InsertEnter | Inbound::Reset => {
                self.reset();
                Vec::new()
            }
        }
    }

    /// A keystroke: plan source refreshes, then re-render from the cache
    pub fn on_complete(&mut self, mut state: CompletionState, manual: bool) -> Vec<Outbound> {
        state.normalize();
        state.context.manual = manual;

        let contexts = ContextDetector::new(&self.detectors).expand(
            state.context.clone(),
            &state.lines,
            &state.subscope_detectors,
        );

        if manual {
            self.popup.reset();
        }

        if state.context.at_word_boundary() {
            debug!("typed [{}] at word boundary, cache cleared", state.context.typed);
            self.cache.clear();
        }

        let requests = RequestPlanner::new(&self.matcher, MatchSettings::from_state(&state)).plan_refresh(
            &contexts,
            &state.sources,
            &mut self.cache,
            filter_chain(&self.config, &state),
        );
        info!("notify {} source refresh requests", requests.len());

        self.state = Some(state);

        let mut outbound = vec![Outbound::RequestRefresh { requests }];
        outbound.extend(self.update_popup());
        outbound
    }

    /// Tell scope-matching sources a completion may follow soon
    pub fn on_warmup(&mut self, mut state: CompletionState) -> Vec<Outbound> {
        state.normalize();

        let contexts = ContextDetector::new(&self.detectors).expand(
            state.context.clone(),
            &state.lines,
            &state.subscope_detectors,
        );
        let requests = RequestPlanner::new(&self.matcher, MatchSettings::from_state(&state))
            .plan_warmup(&contexts, &state.sources);

        vec![Outbound::RequestWarmup { requests }]
    }

    /// A source result; re-renders when the cache changed
    pub fn on_deliver(&mut self, delivery: Delivery, state: Option<CompletionState>) -> Vec<Outbound> {
        if let Some(state) = state {
            self.update_state(state);
        }

        let live = match self.state.as_ref() {
            Some(live) => live,
            None => {
                warn!("delivery before any completion state, ignored");
                return Vec::new();
            }
        };

        let outcome = self.cache.deliver(live, &self.matcher, delivery);
        if !outcome.changed_cache() {
            if outcome == DeliveryOutcome::Stale {
                debug!("stale delivery dropped");
            }
            return Vec::new();
        }

        self.update_popup().into_iter().collect()
    }

    /// Replace the live buffer state
    pub fn update_state(&mut self, mut state: CompletionState) {
        state.normalize();
        self.state = Some(state);
    }

    /// Drop all cached results and the popup snapshot
    pub fn reset(&mut self) {
        self.cache.clear();
        self.popup.reset();
    }

    fn update_popup(&mut self) -> Option<Outbound> {
        let state = self.state.as_ref()?;
        let merged = Merger::new(&self.filters, filter_chain(&self.config, state)).merge(
            &state.context,
            &mut self.cache,
            &state.sources,
        );

        self.popup
            .notify(&state.context, merged.startccol, merged.matches)
            .map(Outbound::RenderPopup)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Request-level filter settings over the configured ones
fn filter_chain<'a>(config: &'a EngineConfig, state: &'a CompletionState) -> FilterChain<'a> {
    FilterChain {
        default_filter: state
            .default_filter
            .as_deref()
            .unwrap_or(&config.default_filter),
        extra_filters: state
            .extra_filters
            .as_deref()
            .unwrap_or(&config.extra_filters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscope::MarkdownFenceDetector;
    use confluo_protocol::{Context, DeliveredMatch, SourceConfig};

    fn state(typed: &str) -> CompletionState {
        CompletionState::new(Context::new("text", typed).with_reltime(1.0))
            .with_source(SourceConfig::new("buffer").with_complete_length(2))
    }

    fn deliver(context: Context, words: &[&str]) -> Inbound {
        Inbound::Deliver {
            context,
            startccol: 1,
            matches: words.iter().map(|w| DeliveredMatch::from(*w)).collect(),
            refresh: false,
            state: None,
        }
    }

    #[test]
    fn test_complete_requests_then_delivery_renders() {
        let mut engine = Engine::default();

        let out = engine.handle(Inbound::Complete {
            state: state("fo"),
            manual: false,
        });
        let request = match &out[0] {
            Outbound::RequestRefresh { requests } => requests[0].clone(),
            other => panic!("unexpected message: {:?}", other),
        };
        assert_eq!(out.len(), 1);
        assert_eq!(request.name, "buffer");

        let out = engine.handle(deliver(request.context, &["foo", "bar"]));
        match &out[..] {
            [Outbound::RenderPopup(render)] => {
                assert_eq!(render.startbcol, 1);
                assert_eq!(render.matches.len(), 1);
                assert_eq!(render.matches[0].word, "foo");
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[test]
    fn test_delivery_without_state_is_ignored() {
        let mut engine = Engine::default();
        let out = engine.handle(deliver(Context::new("text", "fo").with_source("buffer"), &["foo"]));
        assert!(out.is_empty());
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_insert_enter_clears_cache() {
        let mut engine = Engine::default();
        engine.handle(Inbound::UpdateState { state: state("fo") });
        engine.handle(deliver(Context::new("text", "fo").with_source("buffer"), &["foo"]));
        assert_eq!(engine.cache().len(), 1);

        engine.handle(Inbound::InsertEnter);
        assert!(engine.cache().is_empty());
        assert!(engine.popup().last_matches().is_empty());
    }

    #[test]
    fn test_request_filter_overrides_config() {
        let mut engine = Engine::new(EngineConfig::default().with_default_filter("substr"));
        let mut live = state("oo");
        engine.update_state(live.clone());
        let out = engine.handle(deliver(Context::new("text", "oo").with_source("buffer"), &["foo"]));
        assert!(matches!(&out[..], [Outbound::RenderPopup(r)] if r.matches.len() == 1));

        live.default_filter = Some("prefix".to_string());
        live.context.reltime = 2.0;
        let out = engine.handle(Inbound::Complete {
            state: live,
            manual: false,
        });
        match out.last() {
            Some(Outbound::RenderPopup(render)) => assert!(render.matches.is_empty()),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_register_detector_announces_new_scopes_once() {
        let mut engine = Engine::default();
        let first = engine.register_detector(Arc::new(MarkdownFenceDetector::new()));
        match first {
            Some(Outbound::SyncDetectors { scopes }) => assert_eq!(scopes.get("markdown"), Some(&true)),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(engine
            .register_detector(Arc::new(MarkdownFenceDetector::new()))
            .is_none());
    }

    #[test]
    fn test_warmup_does_not_touch_cache() {
        let mut engine = Engine::default();
        engine.handle(Inbound::UpdateState { state: state("fo") });
        engine.handle(deliver(Context::new("text", "fo").with_source("buffer"), &["foo"]));

        let out = engine.handle(Inbound::Warmup { state: state("") });
        match &out[..] {
            [Outbound::RequestWarmup { requests }] => assert_eq!(requests.len(), 1),
            other => panic!("unexpected messages: {:?}", other),
        }
        assert_eq!(engine.cache().len(), 1);
    }
}
