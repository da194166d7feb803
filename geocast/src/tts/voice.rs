//! Voice name resolution.
//!
//! Users pick voices by friendly name; providers want their own ids.
//! Unknown names pass through unchanged so raw provider ids keep working.

use std::collections::HashMap;

/// Maps friendly voice names to provider voice ids.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    voices: HashMap<String, String>,
}

impl VoiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            voices: HashMap::new(),
        }
    }

    /// Registers a name → id mapping (names are case-insensitive).
    pub fn register(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.voices.insert(name.into().to_lowercase(), id.into());
    }

    /// Resolves a name to its provider id, passing unknown names through.
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.voices
            .get(&name.to_lowercase())
            .map_or(name, String::as_str)
    }
}

impl Default for VoiceRegistry {
    /// The stock narration voices.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("wyatt", "YXpFCvM1S3JbWEJhoskW");
        registry.register("james", "EkK5I93UQWFDigLMpZcX");
        registry.register("brian", "nPczCjzI2devNBz1zQrb");
        registry
    }
}
