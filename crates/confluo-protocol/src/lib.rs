//! # Confluo Protocol
//!
//! Data model and messages shared between an editor host and the confluo
//! completion core: cursor contexts, source settings, candidates, and the
//! inbound/outbound message enums.

pub mod candidate;
pub mod context;
pub mod message;
pub mod source;

pub use candidate::{DeliveredMatch, Match, RenderedMatch};
pub use context::Context;
pub use message::{CompletionState, Inbound, Outbound, PopupRender, SourceRequest};
pub use source::{CompleteLength, SourceConfig, WordPattern};
