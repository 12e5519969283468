/// Messages crossing the host/core boundary
///
/// Both directions are internally tagged by `"type"` so that a host can
/// speak newline-delimited JSON to the core.
use crate::candidate::{DeliveredMatch, RenderedMatch};
use crate::context::Context;
use crate::source::{CompleteLength, SourceConfig, WordPattern};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Live editor state attached to completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionState {
    pub context: Context,
    /// Registered sources, keyed by name
    #[serde(default)]
    pub sources: IndexMap<String, SourceConfig>,
    /// Host view of which scopes have subscope detectors
    #[serde(default)]
    pub subscope_detectors: HashMap<String, bool>,
    /// Buffer lines
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub default_filter: Option<String>,
    #[serde(default)]
    pub extra_filters: Option<Vec<String>>,
    #[serde(default)]
    pub complete_length: Option<CompleteLength>,
    #[serde(default)]
    pub word_pattern: Option<WordPattern>,
}

impl CompletionState {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            sources: IndexMap::new(),
            subscope_detectors: HashMap::new(),
            lines: Vec::new(),
            default_filter: None,
            extra_filters: None,
            complete_length: None,
            word_pattern: None,
        }
    }

    /// Register a source, keyed by its name
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.insert(source.name.clone(), source);
        self
    }

    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_detector_sync(mut self, scope: impl Into<String>) -> Self {
        self.subscope_detectors.insert(scope.into(), true);
        self
    }

    /// Copy map keys into `SourceConfig::name` where the host left it empty
    pub fn normalize(&mut self) {
        for (name, source) in self.sources.iter_mut() {
            if source.name.is_empty() {
                source.name = name.clone();
            }
        }
    }
}

/// Message from the host to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// A keystroke; plan refreshes and re-render
    Complete {
        state: CompletionState,
        #[serde(default)]
        manual: bool,
    },
    /// Pre-notify sources without pattern checks
    Warmup { state: CompletionState },
    /// A source's (possibly late) result
    Deliver {
        context: Context,
        startccol: usize,
        matches: Vec<DeliveredMatch>,
        #[serde(default)]
        refresh: bool,
        #[serde(default)]
        state: Option<CompletionState>,
    },
    /// Replace the live buffer state without planning
    UpdateState { state: CompletionState },
    InsertEnter,
    Reset,
}

/// A source addressed with its own context copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRequest {
    pub name: String,
    pub context: Context,
}

/// Render instruction for the popup menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupRender {
    pub context: Context,
    /// 1-based byte column where the candidates start
    pub startbcol: usize,
    pub matches: Vec<RenderedMatch>,
    /// Identical to the previous render
    pub unchanged: bool,
}

/// Message from the core to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    RequestRefresh { requests: Vec<SourceRequest> },
    RequestWarmup { requests: Vec<SourceRequest> },
    RenderPopup(PopupRender),
    /// Scopes that now have subscope detectors
    SyncDetectors { scopes: BTreeMap<String, bool> },
}
