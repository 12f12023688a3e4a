//! Cursor-context resolution: reconstructs the grammatical state at the
//! cursor from a possibly-incomplete token stream.
//!
//! The scope dispatch is an ordered predicate chain over the last two
//! complete tokens, the whitespace flag, and the raw prefix; rule order
//! carries the tie-break semantics, so the guards below must stay in
//! sequence.

use crate::lexer::{Lexer, Token, TokenKind};
use crate::schema::{FieldType, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Field,
    Comparison,
    Value,
    Logical,
}

/// Grammatical context at the cursor. Produced fresh on every call and
/// never cached: it is cheap to recompute and depends on exact cursor
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub prefix: String,
    pub scope: Option<Scope>,
    pub model: Option<String>,
    pub field: Option<String>,
    pub current_full_token: Option<Token>,
    pub model_stack: Vec<String>,
}

impl Context {
    fn none() -> Self {
        Self {
            prefix: String::new(),
            scope: None,
            model: None,
            field: None,
            current_full_token: None,
            model_stack: Vec::new(),
        }
    }
}

/// Clamps a host-supplied cursor offset to a valid char boundary within
/// the text. Hosts report byte offsets; a mid-character offset degrades
/// to the preceding boundary instead of panicking.
pub(crate) fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while cursor > 0 && !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

pub fn resolve_context(schema: &Schema, text: &str, cursor: usize) -> Context {
    let cursor = clamp_cursor(text, cursor);

    let mut tokens = Lexer::tokenize(&text[..cursor]);
    let mut current_full_token = None;

    // The cursor sits inside or at the end of an in-progress token: drop
    // it from the stream and remember the full-length token instead.
    if let Some(last) = tokens.last()
        && last.end >= cursor
    {
        let all_tokens = Lexer::tokenize(text);
        current_full_token = all_tokens.get(tokens.len() - 1).cloned();
        tokens.pop();
    }

    let last_token = tokens.last();
    let next_to_last = tokens.len().checked_sub(2).and_then(|i| tokens.get(i));

    let raw_prefix = &text[last_token.map_or(0, |t| t.end)..cursor];
    let stripped = raw_prefix.trim_start();
    let whitespace = stripped.len() < raw_prefix.len();
    let mut prefix = stripped.to_string();
    // A lone open paren is punctuation, not a suggestible prefix.
    if prefix == "(" {
        prefix.clear();
    }

    let mut context = Context {
        prefix,
        current_full_token,
        ..Context::none()
    };

    let starts_field_scope = last_token.is_none()
        || (last_token.is_some_and(|t| t.kind.is_logical()) && whitespace)
        || (context.prefix == "." && last_token.is_some() && !whitespace)
        || (last_token.is_some_and(|t| t.kind == TokenKind::ParenL)
            && next_to_last.is_none_or(|t| t.kind.is_logical()));

    if context.prefix == ")" && !whitespace {
        // Nothing is suggestible immediately after a closing paren.
    } else if starts_field_scope {
        context.scope = Some(Scope::Field);
        context.model = Some(schema.current_model.clone());
        context.model_stack = vec![schema.current_model.clone()];

        // Continuing a dotted path: widen the prefix to the whole
        // fragment, starting from the NAME the dot attaches to.
        if context.prefix == "."
            && let Some(last) = last_token
        {
            context.prefix = text[last.start..cursor].to_string();
        }

        if let Some((path, leaf)) = context.prefix.rsplit_once('.') {
            let resolved = schema.resolve(path);
            let leaf = leaf.to_string();
            context.prefix = leaf;
            if resolved.model.is_some() && resolved.field.is_none() {
                context.model = resolved.model;
                context.model_stack = resolved.model_stack;
            } else {
                // Unknown path, or a path ending in a concrete field:
                // nothing sensible to suggest.
                context.scope = None;
                context.model = None;
                context.model_stack.clear();
            }
        }
    } else if whitespace
        && let (Some(prev), Some(last)) = (next_to_last, last_token)
        && prev.kind == TokenKind::Name
        && last.kind.is_comparison()
    {
        let resolved = schema.resolve(&prev.value);
        if let Some(model) = resolved.model {
            context.scope = Some(Scope::Value);
            context.field = resolved.field;
            context.model_stack = resolved.model_stack;

            // An opening quote belongs to the value being typed, not to
            // the search prefix, for fields whose values are strings.
            if context.prefix.starts_with('"') {
                let strip = context
                    .field
                    .as_deref()
                    .and_then(|f| schema.field(&model, f))
                    .is_some_and(|def| def.field_type == FieldType::Str || def.has_options());
                if strip {
                    context.prefix.remove(0);
                }
            }
            context.model = Some(model);
        }
    } else if whitespace
        && let Some(last) = last_token
        && last.kind == TokenKind::Name
    {
        let resolved = schema.resolve(&last.value);
        if resolved.model.is_some() {
            context.scope = Some(Scope::Comparison);
            context.model = resolved.model;
            context.field = resolved.field;
            context.model_stack = resolved.model_stack;
        }
    } else if whitespace && last_token.is_some_and(|t| t.kind.ends_expression()) {
        context.scope = Some(Scope::Logical);
    }

    context
}
