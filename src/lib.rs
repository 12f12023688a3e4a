//! Schema-aware completion analysis for a typed search query language.
//!
//! The crate takes the raw text of a query, a cursor offset, and an
//! introspected model schema, and answers the question an editor widget
//! keeps asking: what can be typed here? It tokenizes the fragment
//! before the cursor, classifies the grammatical scope at that point
//! (field name, comparison operator, value, or logical connector),
//! resolves dotted names through the schema's relation graph, and
//! produces a filtered, ranked suggestion list.
//!
//! Remote value lookups are debounced, paginated, and cached behind
//! [`SuggestionEngine`]; the host supplies the transport by implementing
//! [`SuggestionBackend`] and drives the engine from its event loop.

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod ports;
pub mod schema;
pub mod suggest;

pub use config::CompletionConfig;
pub use context::{Context, Scope, resolve_context};
pub use engine::{FETCH_DEBOUNCE, SuggestionEngine};
pub use error::{BackendError, EngineError, SchemaError};
pub use lexer::{Lexer, Token, TokenKind};
pub use ports::{SuggestionBackend, ValuePage, ValueRequest};
pub use schema::{FieldDef, FieldOptions, FieldType, Resolution, Schema};
pub use suggest::{Suggestion, SuggestionSet};
