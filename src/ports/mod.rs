mod backend;

pub use backend::{SuggestionBackend, ValuePage, ValueRequest};

#[cfg(test)]
pub use backend::MockSuggestionBackend;
