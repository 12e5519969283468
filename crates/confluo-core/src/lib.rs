//! Confluo Completion Core
//!
//! The decision engine behind a multi-source completion popup. Sources
//! produce candidates asynchronously; the core decides which of them to ask
//! on every keystroke, keeps their latest results, and merges the results
//! that are still valid into one column-aligned list.
//!
//! # Architecture
//!
//! 1. **Pattern Layer**: Extract the word before the cursor and decide per source
//!    whether the text is eligible ([`PatternMatcher`])
//! 2. **Context Layer**: Expand the cursor context into nested scopes such as a code
//!    block inside markdown ([`ContextDetector`])
//! 3. **Planning Layer**: Choose the sources to refresh ([`RequestPlanner`])
//! 4. **Cache Layer**: Keep each source's latest result and reject late or outdated
//!    ones ([`CompletionCache`])
//! 5. **Merge Layer**: Filter and align cached results into one list ([`Merger`])
//! 6. **Popup Layer**: Suppress redundant renders ([`PopupNotifier`])
//!
//! [`Engine`] ties the layers together as a synchronous state machine, and
//! [`EngineHandle`] runs an engine on its own tokio task.
//!
//! # Example
//!
//! ```
//! use confluo_core::{Engine, EngineConfig};
//! use confluo_protocol::{CompletionState, Context, Inbound, Outbound, SourceConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! let state = CompletionState::new(Context::new("rust", "pri"))
//!     .with_source(SourceConfig::new("buffer").with_complete_length(2));
//!
//! let out = engine.handle(Inbound::Complete { state, manual: false });
//! assert!(matches!(&out[0], Outbound::RequestRefresh { requests } if requests.len() == 1));
//! ```

pub mod actor;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod merge;
pub mod pattern;
pub mod planner;
pub mod popup;
pub mod subscope;
pub mod text;

pub use actor::EngineHandle;
pub use cache::{is_kw_type, CacheEntry, CompletionCache, Delivery, DeliveryOutcome};
pub use config::{ConfigFormat, ConfigLoader, EngineConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use filter::{
    AbbrEllipsisFilter, DedupFilter, Filter, FilterRegistry, FuzzyFilter, IgnoreCasePrefixFilter,
    PrefixFilter, SubstringFilter,
};
pub use merge::{FilterChain, MergeResult, Merger};
pub use pattern::{builtin_word_patterns, MatchSettings, PatternMatcher};
pub use planner::RequestPlanner;
pub use popup::PopupNotifier;
pub use subscope::{
    ContextDetector, DetectorRegistry, MarkdownFenceDetector, SubscopeDetector, SubscopeMatch,
};
