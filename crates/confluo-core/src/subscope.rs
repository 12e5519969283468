/// Subscope detection: expanding one root context into a tree of contexts
///
/// A region of a buffer can be written in a different language than the
/// buffer itself (a fenced code block in markdown, a script tag in html).
/// Detectors registered for a scope find such regions around the cursor;
/// each discovery produces a nested context that is itself expanded again.
///
/// # Example
///
/// ```ignore
/// use confluo_core::subscope::{ContextDetector, DetectorRegistry, MarkdownFenceDetector};
/// use std::sync::Arc;
///
/// let mut registry = DetectorRegistry::new();
/// registry.register(Arc::new(MarkdownFenceDetector::new()));
///
/// let contexts = ContextDetector::new(&registry).expand(root, &lines, &sync);
/// ```
use crate::error::{EngineError, EngineResult};
use crate::text::char_slice;
use confluo_protocol::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A nested scope found by a detector
///
/// Offsets are relative to the slice the detector was given: `scope_offset`
/// is a character offset into the slice, `scope_lnum`/`scope_ccol` locate
/// the scope's first character, and `lnum`/`ccol` are the cursor position
/// relative to the nested scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscopeMatch {
    pub scope: String,
    pub scope_offset: usize,
    pub scope_len: Option<usize>,
    pub scope_lnum: usize,
    pub scope_ccol: usize,
    pub lnum: usize,
    pub ccol: usize,
}

/// Finds a nested scope around the cursor
pub trait SubscopeDetector: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Parent scopes this detector looks into
    fn scopes(&self) -> &[String];

    /// Look for a nested scope containing the cursor
    ///
    /// `lnum`/`ccol` are 1-based and relative to `src`, the text of the
    /// parent scope.
    fn detect(&self, lnum: usize, ccol: usize, src: &str) -> EngineResult<Option<SubscopeMatch>>;
}

/// Scope -> detectors registry
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Vec<Arc<dyn SubscopeDetector>>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detector for all of its scopes
    ///
    /// Returns true when at least one of the scopes had no detector yet, in
    /// which case the host's sync table is out of date.
    pub fn register(&mut self, detector: Arc<dyn SubscopeDetector>) -> bool {
        let mut new_scope = false;
        for scope in detector.scopes() {
            let entry = self.detectors.entry(scope.clone()).or_insert_with(|| {
                new_scope = true;
                Vec::new()
            });
            entry.push(Arc::clone(&detector));
        }
        info!("subscope detector <{}> for {:?}", detector.name(), detector.scopes());
        new_scope
    }

    pub fn detectors_for(&self, scope: &str) -> &[Arc<dyn SubscopeDetector>] {
        self.detectors.get(scope).map_or(&[], Vec::as_slice)
    }

    /// Sync table announced to the host
    pub fn sync_table(&self) -> BTreeMap<String, bool> {
        self.detectors
            .keys()
            .map(|scope| (scope.clone(), true))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

/// Breadth-first expansion of a root context
pub struct ContextDetector<'a> {
    registry: &'a DetectorRegistry,
}

impl<'a> ContextDetector<'a> {
    pub fn new(registry: &'a DetectorRegistry) -> Self {
        Self { registry }
    }

    /// Expand `root` into itself plus every nested context found below it
    ///
    /// A scope is only looked into when the host's `sync` table has it
    /// enabled and a detector is registered for it. Failing detectors are
    /// logged and skipped.
    pub fn expand(
        &self,
        mut root: Context,
        lines: &[String],
        sync: &HashMap<String, bool>,
    ) -> Vec<Context> {
        root.scope_level = 1;
        let src = lines.join("\n");

        let mut contexts = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(ctx) = queue.pop_front() {
            if sync.get(&ctx.scope).copied().unwrap_or(false) {
                for detector in self.registry.detectors_for(&ctx.scope) {
                    match self.detect_one(detector.as_ref(), &ctx, &src) {
                        Ok(Some(sub)) => {
                            info!(
                                scope = %sub.scope,
                                level = sub.scope_level,
                                "new sub context"
                            );
                            queue.push_back(sub);
                        }
                        Ok(None) => {}
                        Err(err) => warn!("exception on scope processing: {}", err),
                    }
                }
            } else if !self.registry.detectors_for(&ctx.scope).is_empty() {
                debug!(scope = %ctx.scope, "subscope detection not synced");
            }
            contexts.push(ctx);
        }

        contexts
    }

    fn detect_one(
        &self,
        detector: &dyn SubscopeDetector,
        parent: &Context,
        src: &str,
    ) -> EngineResult<Option<Context>> {
        let scope_src = scope_source(src, parent);
        let found = match detector.detect(parent.lnum, parent.ccol, scope_src)? {
            Some(found) => found,
            None => return Ok(None),
        };

        let mut sub = parent.clone();
        sub.scope = found.scope;
        sub.scope_offset = found.scope_offset + parent.scope_offset;
        sub.scope_len = found.scope_len;
        sub.scope_lnum = (found.scope_lnum + parent.scope_lnum).saturating_sub(1);
        sub.scope_ccol = found.scope_ccol;
        sub.lnum = found.lnum;
        sub.ccol = found.ccol;
        sub.scope_level = parent.scope_level + 1;

        if sub.lnum == 1 {
            sub.typed = char_slice(&parent.typed, sub.scope_ccol.saturating_sub(1), None).to_string();
            sub.scope_ccol = (sub.scope_ccol + parent.scope_ccol).saturating_sub(1);
        }

        Ok(Some(sub))
    }
}

/// Text of the scope a context lives in
pub fn scope_source<'s>(src: &'s str, ctx: &Context) -> &'s str {
    char_slice(src, ctx.scope_offset, ctx.scope_len.map(|len| ctx.scope_offset + len))
}

/// Detects fenced code blocks (```` ```lang ````) in markdown
pub struct MarkdownFenceDetector {
    scopes: Vec<String>,
}

impl MarkdownFenceDetector {
    pub fn new() -> Self {
        Self {
            scopes: vec!["markdown".to_string()],
        }
    }
}

impl Default for MarkdownFenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// An opened, not yet closed, fenced block
struct OpenFence {
    line_idx: usize,
    marker: String,
    lang: String,
    body_offset: usize,
}

impl OpenFence {
    /// Match for a cursor inside the block body that ends at `close_offset`
    fn into_match(self, close_offset: usize, lnum: usize, ccol: usize) -> Option<SubscopeMatch> {
        if self.lang.is_empty() || lnum <= self.line_idx + 1 {
            return None;
        }
        Some(SubscopeMatch {
            scope: self.lang,
            scope_offset: self.body_offset,
            scope_len: Some(close_offset.saturating_sub(self.body_offset + 1)),
            scope_lnum: self.line_idx + 2,
            scope_ccol: 1,
            lnum: lnum - self.line_idx - 1,
            ccol,
        })
    }
}

/// `(marker, lang)` of an opening fence line
fn parse_fence(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_start();
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let marker: String = trimmed.chars().take_while(|c| *c == fence_char).collect();
    if marker.len() < 3 {
        return None;
    }
    let lang: String = trimmed[marker.len()..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-' | '_'))
        .collect();
    Some((marker, lang.to_lowercase()))
}

fn closes_fence(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(marker) && trimmed.chars().all(|c| c == '`' || c == '~')
}

impl SubscopeDetector for MarkdownFenceDetector {
    fn name(&self) -> &str {
        "markdown_fence"
    }

    fn scopes(&self) -> &[String] {
        &self.scopes
    }

    fn detect(&self, lnum: usize, ccol: usize, src: &str) -> EngineResult<Option<SubscopeMatch>> {
        if lnum == 0 {
            return Err(EngineError::Detector {
                detector: self.name().to_string(),
                message: "line numbers are 1-based".to_string(),
            });
        }

        let mut open: Option<OpenFence> = None;
        let mut offset = 0;

        for (idx, line) in src.split('\n').enumerate() {
            let next_offset = offset + line.chars().count() + 1;

            match open.take() {
                None => {
                    if idx + 1 >= lnum {
                        return Ok(None);
                    }
                    if let Some((marker, lang)) = parse_fence(line) {
                        open = Some(OpenFence {
                            line_idx: idx,
                            marker,
                            lang,
                            body_offset: next_offset,
                        });
                    }
                }
                Some(fence) => {
                    if !closes_fence(line, &fence.marker) {
                        open = Some(fence);
                    } else if idx + 1 > lnum {
                        return Ok(fence.into_match(offset, lnum, ccol));
                    }
                }
            }
            offset = next_offset;
        }

        // unterminated block runs to the end of the text
        let end = src.chars().count() + 1;
        Ok(open.and_then(|fence| fence.into_match(end, lnum, ccol)))
    }
}
