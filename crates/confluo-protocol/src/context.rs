/// Cursor/text snapshot shared by every stage of a completion pass
use serde::{Deserialize, Serialize};

/// One cursor/text snapshot.
///
/// Columns are 1-based and counted in characters. A root context has
/// `scope_level == 1`; nested contexts are only ever produced by subscope
/// detection and carry the position of their scope origin in the root
/// buffer (`scope_offset`, `scope_lnum`, `scope_ccol`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Scope (language/region) name
    pub scope: String,
    /// Buffer filetype as reported by the host
    pub filetype: String,
    /// Line number, relative to the scope slice for nested contexts
    pub lnum: usize,
    /// Cursor column in characters
    pub ccol: usize,
    /// Text on the current line from its start up to the cursor
    pub typed: String,
    /// Start column of the current base token
    pub startccol: usize,
    /// Character offset in `typed` where the trigger match ended
    pub match_end: usize,
    /// Token immediately before the cursor
    pub base: String,
    /// Nesting depth, 1 for the root
    pub scope_level: usize,
    /// Character offset of this scope's slice in the root buffer text
    pub scope_offset: usize,
    /// Character length of this scope's slice, `None` for the whole buffer
    pub scope_len: Option<usize>,
    /// First line of this scope in the root buffer
    pub scope_lnum: usize,
    /// First column of this scope on `scope_lnum`
    pub scope_ccol: usize,
    /// Monotonic request timestamp
    pub reltime: f64,
    /// Explicit (manual) trigger
    pub manual: bool,
    /// Computed against buffer text that may have changed since
    pub dated: bool,
    /// The target source was asked despite failing its pattern check
    pub early_cache: bool,
    /// Source this per-source copy is addressed to
    pub source: Option<String>,
    /// Scope name the target source matched on
    pub scope_match: Option<String>,
    /// Filter id resolved for the target source
    pub filter: Option<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            scope: String::new(),
            filetype: String::new(),
            lnum: 1,
            ccol: 1,
            typed: String::new(),
            startccol: 1,
            match_end: 0,
            base: String::new(),
            scope_level: 1,
            scope_offset: 0,
            scope_len: None,
            scope_lnum: 1,
            scope_ccol: 1,
            reltime: 0.0,
            manual: false,
            dated: false,
            early_cache: false,
            source: None,
            scope_match: None,
            filter: None,
        }
    }
}

impl Context {
    /// Create a root context with the cursor at the end of `typed`
    pub fn new(scope: impl Into<String>, typed: impl Into<String>) -> Self {
        let scope = scope.into();
        let typed = typed.into();
        let ccol = typed.chars().count() + 1;
        Self {
            filetype: scope.clone(),
            scope,
            ccol,
            startccol: ccol,
            typed,
            ..Self::default()
        }
    }

    pub fn with_lnum(mut self, lnum: usize) -> Self {
        self.lnum = lnum;
        self
    }

    pub fn with_reltime(mut self, reltime: f64) -> Self {
        self.reltime = reltime;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn dated(mut self) -> Self {
        self.dated = true;
        self
    }

    pub fn is_root(&self) -> bool {
        self.scope_level == 1
    }

    /// Whether the typed text is empty or ends in whitespace
    pub fn at_word_boundary(&self) -> bool {
        self.typed
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace)
    }
}
