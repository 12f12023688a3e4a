use serde::Deserialize;

pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Host-supplied engine options. Defaults match the widget the engine was
/// built for: completion on, value filtering case-insensitive, a hundred
/// cached value pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub completion_enabled: bool,
    pub values_case_sensitive: bool,
    pub cache_size: usize,
    pub syntax_help_url: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            completion_enabled: true,
            values_case_sensitive: false,
            cache_size: DEFAULT_CACHE_SIZE,
            syntax_help_url: None,
        }
    }
}

impl CompletionConfig {
    /// A zero cache size cannot back the LRU store; the engine treats it
    /// as a configuration error and stays inert.
    pub fn is_valid(&self) -> bool {
        self.cache_size > 0
    }
}
