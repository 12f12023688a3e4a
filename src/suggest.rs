//! Scope-specific suggestion generation, filtering, and ranking.

use std::collections::HashSet;

use crate::cache::ValueCacheEntry;
use crate::config::CompletionConfig;
use crate::context::{Context, Scope};
use crate::schema::{FieldDef, FieldType, Schema};

/// One completion candidate. `snippet_before`/`snippet_after` wrap the
/// text when spliced into the document; a `|` inside `snippet_after`
/// marks where the cursor lands. `display_text` may carry a short
/// explanation for the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub snippet_before: String,
    pub snippet_after: String,
    pub display_text: String,
}

impl Suggestion {
    pub fn new(text: &str, snippet_before: &str, snippet_after: &str) -> Self {
        Self {
            text: text.to_string(),
            snippet_before: snippet_before.to_string(),
            snippet_after: snippet_after.to_string(),
            display_text: text.to_string(),
        }
    }

    pub fn explained(text: &str, snippet_after: &str, explanation: &str) -> Self {
        Self {
            text: text.to_string(),
            snippet_before: String::new(),
            snippet_after: snippet_after.to_string(),
            display_text: format!("{text} ({explanation})"),
        }
    }
}

/// Host-facing result of one suggestion pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionSet {
    pub suggestions: Vec<Suggestion>,
    pub prefix: String,
    pub loading: bool,
    pub selected: Option<usize>,
}

impl SuggestionSet {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Generates the candidate list for a resolved context. Remote-backed
/// value lookups read from `remote` (the cache entry for the active
/// key); scheduling the fetch itself is the engine's job.
pub fn generate(
    schema: &Schema,
    config: &CompletionConfig,
    context: &Context,
    remote: Option<&ValueCacheEntry>,
) -> SuggestionSet {
    let mut prefix = context.prefix.clone();
    let mut loading = false;

    let candidates = match context.scope {
        Some(Scope::Field) => field_candidates(schema, context),
        Some(Scope::Comparison) => comparison_candidates(schema, context),
        Some(Scope::Value) => {
            let (candidates, entry_loading, keep_prefix) =
                value_candidates(schema, context, remote);
            loading = entry_loading;
            if !keep_prefix {
                prefix.clear();
            }
            candidates
        }
        Some(Scope::Logical) => vec![
            Suggestion::new("and", "", " "),
            Suggestion::new("or", "", " "),
        ],
        None => {
            prefix.clear();
            Vec::new()
        }
    };

    let filtered = filter_candidates(candidates, &prefix, context.scope, config);
    let selected = (filtered.len() == 1).then_some(0);

    SuggestionSet {
        suggestions: filtered,
        prefix,
        loading,
        selected,
    }
}

fn field_candidates(schema: &Schema, context: &Context) -> Vec<Suggestion> {
    let Some(fields) = context.model.as_deref().and_then(|m| schema.fields(m)) else {
        return Vec::new();
    };

    // The model we arrived from: suggesting a relation straight back to
    // it would loop the path one hop.
    let came_from = context
        .model_stack
        .len()
        .checked_sub(2)
        .and_then(|i| context.model_stack.get(i));

    let mut names: Vec<(&String, &FieldDef)> = fields
        .iter()
        .filter(|(_, def)| match (&def.relation, came_from) {
            (Some(target), Some(previous)) => target != previous,
            _ => true,
        })
        .collect();
    names.sort_by_key(|(name, _)| (*name).clone());

    names
        .into_iter()
        .map(|(name, def)| {
            if def.field_type == FieldType::Relation {
                Suggestion::new(name, "", ".")
            } else {
                Suggestion::new(name, "", " ")
            }
        })
        .collect()
}

fn comparison_candidates(schema: &Schema, context: &Context) -> Vec<Suggestion> {
    let def = match (&context.model, &context.field) {
        (Some(model), Some(field)) => schema.field(model, field),
        _ => None,
    };

    let mut candidates = vec![
        Suggestion::new("=", "", " "),
        Suggestion::explained("!=", " ", "is not equal to"),
    ];

    // A bare relation only compares against None.
    let Some(def) = def else {
        return candidates;
    };
    if def.field_type == FieldType::Bool {
        return candidates;
    }

    let string_like = def.field_type.is_string_like();
    if string_like {
        candidates.push(Suggestion::explained("~", " ", "contains"));
        candidates.push(Suggestion::explained("!~", " ", "does not contain"));
    }
    if def.field_type == FieldType::Str {
        candidates.push(Suggestion::new("startswith", "", " "));
        candidates.push(Suggestion::new("not startswith", "", " "));
        candidates.push(Suggestion::new("endswith", "", " "));
        candidates.push(Suggestion::new("not endswith", "", " "));
    }
    if def.field_type != FieldType::Str {
        candidates.push(Suggestion::new(">", "", " "));
        candidates.push(Suggestion::new(">=", "", " "));
        candidates.push(Suggestion::new("<", "", " "));
        candidates.push(Suggestion::new("<=", "", " "));
    }

    // The in-list snippet opens pre-quoted for fields whose values are
    // written as strings.
    let list_snippet = if string_like || def.has_options() {
        " (\"|\")"
    } else {
        " (|)"
    };
    candidates.push(Suggestion::explained("in", list_snippet, "is one of"));
    candidates.push(Suggestion::explained("not in", list_snippet, "is not one of"));

    candidates
}

/// Returns (candidates, loading, keep_prefix). `keep_prefix` is false
/// when the field type cannot be determined: the host should stop
/// suggesting rather than guess.
fn value_candidates(
    schema: &Schema,
    context: &Context,
    remote: Option<&ValueCacheEntry>,
) -> (Vec<Suggestion>, bool, bool) {
    let Some(model) = context.model.as_deref() else {
        return (Vec::new(), false, false);
    };

    // Relation with no scalar field resolved: the only value is None.
    let Some(field) = context.field.as_deref() else {
        return (vec![Suggestion::new("None", "", " ")], false, true);
    };

    let Some(def) = schema.field(model, field) else {
        return (Vec::new(), false, false);
    };

    let quoted = def.field_type.is_string_like();
    let wrap = |value: &str| {
        if quoted {
            Suggestion::new(value, "\"", "\" ")
        } else {
            Suggestion::new(value, "", " ")
        }
    };

    if let Some(inline) = def.inline_options() {
        return (inline.iter().map(|v| wrap(v)).collect(), false, true);
    }
    if def.has_remote_options() {
        let (items, loading) = remote
            .map(|entry| (entry.items.as_slice(), entry.loading))
            .unwrap_or((&[], false));
        return (items.iter().map(|v| wrap(v)).collect(), loading, true);
    }

    match def.field_type {
        FieldType::Bool => {
            let mut candidates = vec![
                Suggestion::new("True", "", " "),
                Suggestion::new("False", "", " "),
            ];
            if def.nullable {
                candidates.push(Suggestion::new("None", "", " "));
            }
            (candidates, false, true)
        }
        FieldType::Unknown => (Vec::new(), false, false),
        // Free-form value: nothing to suggest, prefix kept for the host.
        _ => (Vec::new(), false, true),
    }
}

fn filter_candidates(
    candidates: Vec<Suggestion>,
    prefix: &str,
    scope: Option<Scope>,
    config: &CompletionConfig,
) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|s| matches(&s.text, prefix, scope, config))
        .filter(|s| seen.insert(s.text.clone()))
        .collect()
}

fn matches(text: &str, prefix: &str, scope: Option<Scope>, config: &CompletionConfig) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match scope {
        // Comparison filtering is prefix-anchored: "st" must match
        // startswith but never endswith.
        Some(Scope::Comparison) => text.starts_with(prefix),
        Some(Scope::Value) if !config.values_case_sensitive => {
            text.to_lowercase().contains(&prefix.to_lowercase())
        }
        _ => text.contains(prefix),
    }
}
