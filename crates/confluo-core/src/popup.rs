/// Popup render de-duplication
use crate::text::byte_column;
use confluo_protocol::{Context, Match, PopupRender, RenderedMatch};
use tracing::debug;

/// Remembers the last rendered popup and suppresses redundant updates
#[derive(Debug, Default)]
pub struct PopupNotifier {
    last_startccol: usize,
    last_matches: Vec<Match>,
}

impl PopupNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last render so the next one is never reported unchanged
    pub fn reset(&mut self) {
        self.last_startccol = 0;
        self.last_matches.clear();
    }

    pub fn last_startccol(&self) -> usize {
        self.last_startccol
    }

    pub fn last_matches(&self) -> &[Match] {
        &self.last_matches
    }

    /// Build the render message for a merged popup
    ///
    /// Returns `None` when nothing was shown and nothing is to be shown.
    pub fn notify(&mut self, context: &Context, startccol: usize, matches: Vec<Match>) -> Option<PopupRender> {
        if matches.is_empty() && self.last_matches.is_empty() {
            debug!("matches==0, last_matches==0, skip");
            return None;
        }

        let unchanged = self.last_startccol == startccol && self.last_matches == matches;
        let rendered = matches.iter().map(RenderedMatch::from).collect();

        self.last_startccol = startccol;
        self.last_matches = matches;

        Some(PopupRender {
            context: context.clone(),
            startbcol: byte_column(&context.typed, startccol),
            matches: rendered,
            unchanged,
        })
    }
}
