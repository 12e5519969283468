/// Completion candidates, as delivered by sources and as rendered
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Text inserted when the candidate is accepted
    pub word: String,
    /// Text shown in the popup, defaults to `word`
    #[serde(default)]
    pub abbr: String,
    /// Annotation shown next to the abbreviation
    #[serde(default)]
    pub menu: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Opaque data bag; always carries the owning source under `"source"`
    #[serde(default)]
    pub user_data: Map<String, Value>,
}

impl Match {
    pub fn new(word: impl Into<String>) -> Self {
        let word = word.into();
        Self {
            abbr: word.clone(),
            word,
            menu: String::new(),
            kind: None,
            info: None,
            user_data: Map::new(),
        }
    }

    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.menu = menu.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Name of the source that produced this candidate
    pub fn source(&self) -> Option<&str> {
        self.user_data.get("source").and_then(Value::as_str)
    }
}

/// A candidate as a source may deliver it: a bare word or a full item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliveredMatch {
    Word(String),
    Item(Match),
}

impl From<&str> for DeliveredMatch {
    fn from(word: &str) -> Self {
        DeliveredMatch::Word(word.to_string())
    }
}

impl From<Match> for DeliveredMatch {
    fn from(item: Match) -> Self {
        DeliveredMatch::Item(item)
    }
}

impl DeliveredMatch {
    /// Normalise into a full candidate owned by `source`
    pub fn into_match(self, source: &str) -> Match {
        let mut item = match self {
            DeliveredMatch::Word(word) => Match::new(word),
            DeliveredMatch::Item(item) => item,
        };
        if item.abbr.is_empty() {
            item.abbr = item.word.clone();
        }
        item.user_data
            .insert("source".to_string(), Value::String(source.to_string()));
        item
    }
}

/// A candidate at the render boundary, with `user_data` encoded as JSON text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMatch {
    pub word: String,
    pub abbr: String,
    pub menu: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    pub user_data: String,
}

impl From<&Match> for RenderedMatch {
    fn from(item: &Match) -> Self {
        Self {
            word: item.word.clone(),
            abbr: item.abbr.clone(),
            menu: item.menu.clone(),
            kind: item.kind.clone(),
            info: item.info.clone(),
            user_data: Value::Object(item.user_data.clone()).to_string(),
        }
    }
}
