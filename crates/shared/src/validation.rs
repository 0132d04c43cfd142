//! Validation-error documents returned by the deposit backend.
//!
//! The backend reports problems as a tree mirroring the draft's shape whose
//! leaves are human readable messages. Decoding classifies every JSON node into
//! one [`ErrorNode`] variant up front, so consumers traverse on the variant and
//! never inspect raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the message field carried by error records.
pub const MESSAGE_FIELD: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ErrorNode {
    /// A bare message string.
    Message(String),
    /// An error object exposing a message field.
    Record { message: String },
    /// Keyed children in backend order. Keys are unique.
    Mapping(Vec<(String, ErrorNode)>),
    Sequence(Vec<ErrorNode>),
    /// Anything else (null, numbers, booleans); carries no message.
    Unrecognized,
}

impl Default for ErrorNode {
    fn default() -> Self {
        Self::Mapping(Vec::new())
    }
}

/// One entry of the flat `errors` list the backend sends with draft responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl ErrorNode {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// True when the node carries no children and no message.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Message(_) | Self::Record { .. } => false,
            Self::Mapping(children) => children.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Unrecognized => true,
        }
    }

    /// Child of a mapping node by key.
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        match self {
            Self::Mapping(children) => children
                .iter()
                .find(|(child_key, _)| child_key == key)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Descendant by dotted path, e.g. `access.embargo`.
    pub fn lookup(&self, path: &str) -> Option<&ErrorNode> {
        path.split('.')
            .try_fold(self, |node, segment| node.get(segment))
    }

    /// Folds the backend's flat `{field, messages}` list into a nested tree.
    ///
    /// Dotted fields become nested mappings (`metadata.creators.0.name`), and
    /// messages for a repeated field accumulate in the same leaf sequence.
    pub fn from_field_errors<'a, I>(errors: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldError>,
    {
        let mut root = Self::empty();
        for error in errors {
            let path: Vec<&str> = error.field.split('.').filter(|s| !s.is_empty()).collect();
            if path.is_empty() {
                continue;
            }
            root.insert_messages(&path, &error.messages);
        }
        root
    }

    /// Decodes the `errors` member of a backend body, which is either the flat
    /// field list or an already nested tree.
    pub fn from_response_errors(value: Value) -> Self {
        if value.is_null() {
            return Self::empty();
        }
        if let Value::Array(entries) = &value {
            let looks_like_field_list =
                !entries.is_empty() && entries.iter().all(|entry| entry.get("field").is_some());
            if looks_like_field_list {
                if let Ok(field_errors) = serde_json::from_value::<Vec<FieldError>>(value.clone()) {
                    return Self::from_field_errors(&field_errors);
                }
            }
        }
        Self::from(value)
    }

    fn insert_messages(&mut self, path: &[&str], messages: &[String]) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };

        if !matches!(self, Self::Mapping(_)) {
            *self = Self::empty();
        }
        let Self::Mapping(children) = self else {
            return;
        };

        let index = match children.iter().position(|(key, _)| key == head) {
            Some(index) => index,
            None => {
                let fresh = if rest.is_empty() {
                    Self::Sequence(Vec::new())
                } else {
                    Self::empty()
                };
                children.push(((*head).to_string(), fresh));
                children.len() - 1
            }
        };
        let child = &mut children[index].1;

        if rest.is_empty() {
            if !matches!(child, Self::Sequence(_)) {
                let previous = std::mem::replace(child, Self::Sequence(Vec::new()));
                if let Self::Sequence(items) = &mut *child {
                    if !previous.is_empty() {
                        items.push(previous);
                    }
                }
            }
            if let Self::Sequence(items) = child {
                items.extend(messages.iter().cloned().map(Self::Message));
            }
        } else {
            child.insert_messages(rest, messages);
        }
    }
}

impl From<Value> for ErrorNode {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Message(text),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(mut fields) => {
                if matches!(fields.get(MESSAGE_FIELD), Some(Value::String(_))) {
                    if let Some(Value::String(message)) = fields.remove(MESSAGE_FIELD) {
                        return Self::Record { message };
                    }
                }
                Self::Mapping(
                    fields
                        .into_iter()
                        .map(|(key, child)| (key, Self::from(child)))
                        .collect(),
                )
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Unrecognized,
        }
    }
}

impl From<ErrorNode> for Value {
    fn from(node: ErrorNode) -> Self {
        match node {
            ErrorNode::Message(text) => Value::String(text),
            ErrorNode::Record { message } => {
                let mut fields = Map::new();
                fields.insert(MESSAGE_FIELD.to_string(), Value::String(message));
                Value::Object(fields)
            }
            ErrorNode::Mapping(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(key, child)| (key, Value::from(child)))
                    .collect(),
            ),
            ErrorNode::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ErrorNode::Unrecognized => Value::Null,
        }
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
