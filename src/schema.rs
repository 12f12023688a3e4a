//! Model schema graph and dotted-name resolution.
//!
//! The schema is loaded once (from an in-memory value or the wire JSON
//! payload) and treated as read-only for the lifetime of the engine.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Str,
    Bool,
    Date,
    Datetime,
    Relation,
    #[serde(other)]
    #[default]
    Unknown,
}

impl FieldType {
    /// Fields whose values are written as quoted strings in the query.
    pub fn is_string_like(self) -> bool {
        matches!(self, Self::Str | Self::Date | Self::Datetime)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// Value completion source for a field: either an inline list declared in
/// the schema, or `true` on the wire meaning "look values up remotely".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldOptions {
    Remote(bool),
    Inline(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub options: Option<FieldOptions>,
    #[serde(default)]
    pub nullable: bool,
}

impl FieldDef {
    pub fn inline_options(&self) -> Option<&[String]> {
        match &self.options {
            Some(FieldOptions::Inline(values)) => Some(values),
            _ => None,
        }
    }

    pub fn has_remote_options(&self) -> bool {
        matches!(self.options, Some(FieldOptions::Remote(true)))
    }

    pub fn has_options(&self) -> bool {
        self.inline_options().is_some() || self.has_remote_options()
    }
}

/// Result of walking a dotted name through the relation graph.
///
/// `model_stack` records every model traversed, starting from the current
/// model. An unknown segment nulls `model` and `field` and stops the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub model_stack: Vec<String>,
    pub model: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    pub current_model: String,
    pub models: HashMap<String, HashMap<String, FieldDef>>,
    #[serde(default)]
    pub suggestions_api_url: Option<String>,
}

impl Schema {
    pub fn from_json(payload: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(payload)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.current_model.is_empty() {
            return Err(SchemaError::MissingCurrentModel);
        }
        if !self.models.contains_key(&self.current_model) {
            return Err(SchemaError::UnknownCurrentModel(self.current_model.clone()));
        }
        Ok(())
    }

    pub fn fields(&self, model: &str) -> Option<&HashMap<String, FieldDef>> {
        self.models.get(model)
    }

    pub fn field(&self, model: &str, field: &str) -> Option<&FieldDef> {
        self.models.get(model).and_then(|fields| fields.get(field))
    }

    /// Resolves a dotted name against the relation graph, starting at the
    /// current model.
    pub fn resolve(&self, name: &str) -> Resolution {
        self.resolve_from(&self.current_model, name)
    }

    pub fn resolve_from(&self, start_model: &str, name: &str) -> Resolution {
        let mut model = Some(start_model.to_string());
        let mut field = None;
        let mut model_stack = vec![start_model.to_string()];

        for part in name.split('.') {
            let def = model
                .as_deref()
                .and_then(|m| self.field(m, part))
                .cloned();
            match def {
                Some(def) if def.field_type == FieldType::Relation => {
                    // A relation naming a model absent from the schema
                    // degrades like an unknown part instead of panicking.
                    match def.relation.filter(|target| self.models.contains_key(target)) {
                        Some(target) => {
                            model_stack.push(target.clone());
                            model = Some(target);
                            field = None;
                        }
                        None => {
                            model = None;
                            field = None;
                            break;
                        }
                    }
                }
                Some(_) => {
                    field = Some(part.to_string());
                }
                None => {
                    model = None;
                    field = None;
                    break;
                }
            }
        }

        Resolution {
            model_stack,
            model,
            field,
        }
    }
}
