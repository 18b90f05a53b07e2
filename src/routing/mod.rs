//! Route resolution for symbolic actions and input objects.
//!
//! The request builder never inspects user types. An input object is
//! reduced to an [`InputFields`] mapping (by hand, through [`RouteInput`],
//! or through serde), and a [`RouteResolver`] turns action names and input
//! type names into [`RouteTemplate`]s.

mod template;

pub use template::RouteTemplate;
pub(crate) use template::append_query;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::CodecError;
use crate::http::HttpMethod;

/// Ordered field name to value mapping standing in for an input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFields {
    input_type: String,
    fields: Vec<(String, Option<String>)>,
}

impl InputFields {
    pub fn new(input_type: impl Into<String>) -> Self {
        Self {
            input_type: input_type.into(),
            fields: Vec::new(),
        }
    }

    /// An input type that carries no fields at all.
    pub fn marker(input_type: impl Into<String>) -> Self {
        Self::new(input_type)
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), Some(value.into())));
        self
    }

    pub fn null_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), None));
        self
    }

    /// Flatten the top-level fields of a serializable struct.
    ///
    /// Strings are used as-is, other scalars through their JSON text, nulls
    /// stay null. Field order follows the serialized map (sorted by name).
    pub fn from_serialize<T: Serialize + ?Sized>(
        input_type: impl Into<String>,
        value: &T,
    ) -> Result<Self, CodecError> {
        let input_type = input_type.into();
        let value = serde_json::to_value(value).map_err(|err| CodecError::Encode {
            content_type: "route values".to_string(),
            reason: err.to_string(),
        })?;

        match value {
            Value::Object(map) if map.is_empty() => Ok(Self::marker(input_type)),
            Value::Object(map) => Ok(map.into_iter().fold(
                Self::new(input_type),
                |fields, (name, value)| match value {
                    Value::Null => fields.null_field(name),
                    Value::String(text) => fields.field(name, text),
                    other => fields.field(name, other.to_string()),
                },
            )),
            Value::Null => Ok(Self::marker(input_type)),
            other => Err(CodecError::Encode {
                content_type: "route values".to_string(),
                reason: format!("expected an object with named fields, got `{other}`"),
            }),
        }
    }

    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn is_marker(&self) -> bool {
        self.fields.is_empty()
    }

    /// Non-null `(name, value)` pairs in field order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|value| (name.as_str(), value)))
    }

    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.values()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Declared mapping from a caller's type to route values.
pub trait RouteInput {
    fn input_fields(&self) -> InputFields;
}

impl RouteInput for InputFields {
    fn input_fields(&self) -> InputFields {
        self.clone()
    }
}

/// Resolves symbolic routes to URL templates.
pub trait RouteResolver: Send + Sync {
    fn resolve_action(&self, action: &str) -> Option<RouteTemplate>;

    fn resolve_input(&self, input_type: &str) -> Option<RouteTemplate>;
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub template: RouteTemplate,
}

/// Lookup table of named actions and input types.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    actions: HashMap<String, RouteEntry>,
    inputs: HashMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, name: impl Into<String>, method: HttpMethod, template: &str) -> Self {
        self.insert_action(name, method, template);
        self
    }

    pub fn input(mut self, input_type: impl Into<String>, method: HttpMethod, template: &str) -> Self {
        self.insert_input(input_type, method, template);
        self
    }

    pub fn insert_action(&mut self, name: impl Into<String>, method: HttpMethod, template: &str) {
        self.actions.insert(
            name.into(),
            RouteEntry {
                method,
                template: RouteTemplate::parse(template),
            },
        );
    }

    pub fn insert_input(&mut self, input_type: impl Into<String>, method: HttpMethod, template: &str) {
        self.inputs.insert(
            input_type.into(),
            RouteEntry {
                method,
                template: RouteTemplate::parse(template),
            },
        );
    }

    pub fn action_entry(&self, name: &str) -> Option<&RouteEntry> {
        self.actions.get(name)
    }

    pub fn input_entry(&self, input_type: &str) -> Option<&RouteEntry> {
        self.inputs.get(input_type)
    }
}

impl RouteResolver for RouteTable {
    fn resolve_action(&self, action: &str) -> Option<RouteTemplate> {
        self.actions.get(action).map(|entry| entry.template.clone())
    }

    fn resolve_input(&self, input_type: &str) -> Option<RouteTemplate> {
        self.inputs.get(input_type).map(|entry| entry.template.clone())
    }
}
