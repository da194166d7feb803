//! Script model: content types, generated scripts, chunking policy.

pub mod chunker;
pub mod speech;

pub use chunker::{split_into_chunks, split_into_sentences, ChunkPolicy};
pub use speech::extract_speech_parts;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of script being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// The main long-form script (target 2700–3300 chars).
    Longform,
    /// A numbered short-form variant (target 250–400 chars).
    Shortform(u8),
}

impl ContentType {
    /// The label used in file names and reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Longform => "longform".to_string(),
            Self::Shortform(n) => format!("shortform{n}"),
        }
    }

    /// Returns true for short-form variants.
    #[must_use]
    pub const fn is_shortform(&self) -> bool {
        matches!(self, Self::Shortform(_))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Which variant this is.
    pub content_type: ContentType,
    /// The script text, post-processed for Korean.
    pub text: String,
}

impl Script {
    /// Creates a script.
    #[must_use]
    pub fn new(content_type: ContentType, text: impl Into<String>) -> Self {
        Self {
            content_type,
            text: text.into(),
        }
    }

    /// Script length in characters (Korean text is multi-byte; bytes lie).
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// The set of scripts produced for one run, keyed by content type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Script>", into = "Vec<Script>")]
pub struct ScriptSet {
    scripts: BTreeMap<ContentType, Script>,
}

impl From<Vec<Script>> for ScriptSet {
    fn from(scripts: Vec<Script>) -> Self {
        let mut set = Self::new();
        for script in scripts {
            set.insert(script);
        }
        set
    }
}

impl From<ScriptSet> for Vec<Script> {
    fn from(set: ScriptSet) -> Self {
        set.scripts.into_values().collect()
    }
}

impl ScriptSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a script, replacing any previous one of the same type.
    pub fn insert(&mut self, script: Script) {
        self.scripts.insert(script.content_type, script);
    }

    /// Returns the script for a content type.
    #[must_use]
    pub fn get(&self, content_type: ContentType) -> Option<&Script> {
        self.scripts.get(&content_type)
    }

    /// Returns the long-form script, if generated.
    #[must_use]
    pub fn longform(&self) -> Option<&Script> {
        self.get(ContentType::Longform)
    }

    /// Iterates scripts in content-type order.
    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    /// Returns how many scripts were generated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Returns true if no script was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_type_labels() {
        assert_eq!(ContentType::Longform.label(), "longform");
        assert_eq!(ContentType::Shortform(2).label(), "shortform2");
        assert!(ContentType::Shortform(1).is_shortform());
        assert!(!ContentType::Longform.is_shortform());
    }

    #[test]
    fn test_char_count_is_chars_not_bytes() {
        let script = Script::new(ContentType::Longform, "한국어");
        assert_eq!(script.char_count(), 3);
        assert_eq!(script.text.len(), 9);
    }

    #[test]
    fn test_script_set_ordering() {
        let mut set = ScriptSet::new();
        set.insert(Script::new(ContentType::Shortform(2), "b"));
        set.insert(Script::new(ContentType::Longform, "a"));
        set.insert(Script::new(ContentType::Shortform(1), "c"));

        let order: Vec<ContentType> = set.iter().map(|s| s.content_type).collect();
        assert_eq!(
            order,
            vec![
                ContentType::Longform,
                ContentType::Shortform(1),
                ContentType::Shortform(2)
            ]
        );
    }
}
