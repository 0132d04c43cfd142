//! Turns a validation-error document into grouped, human labelled messages.

use std::{collections::BTreeMap, fmt};

use shared::validation::ErrorNode;

pub const UNKNOWN_FIELD_LABEL: &str = "Unknown field";

/// Top-level sections of the error document that are surfaced to the user.
const ERROR_SECTIONS: [&str; 4] = ["metadata", "files", "access.embargo", "pids"];

const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("files.enabled", "Files"),
    ("files.entries", "Files"),
    ("metadata.resource_type", "Resource type"),
    ("metadata.title", "Title"),
    ("metadata.additional_titles", "Title"),
    ("metadata.publication_date", "Publication date"),
    ("metadata.creators", "Creators"),
    ("metadata.contributors", "Contributors"),
    ("metadata.description", "Description"),
    ("metadata.additional_descriptions", "Description"),
    ("metadata.rights", "Licenses"),
    ("metadata.languages", "Languages"),
    ("metadata.dates", "Dates"),
    ("metadata.version", "Version"),
    ("metadata.publisher", "Publisher"),
    ("metadata.related_identifiers", "Related works"),
    ("metadata.references", "References"),
    ("metadata.identifiers", "Alternate identifiers"),
    ("metadata.subjects", "Keywords and subjects"),
    ("metadata.funding", "Funding"),
    ("metadata.locations", "Locations"),
    ("access.embargo.until", "Embargo until"),
    ("access.embargo.reason", "Embargo reason"),
    ("pids", "PIDS"),
    ("pids.doi", "DOI"),
];

/// Maps dotted error keys (`metadata.creators`) to display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<String, String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS
                .iter()
                .map(|(key, label)| ((*key).to_string(), (*label).to_string()))
                .collect(),
        }
    }
}

impl LabelTable {
    pub fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(key.into(), label.into());
        self
    }

    pub fn label_for(&self, key: &str) -> &str {
        self.labels
            .get(key)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_FIELD_LABEL)
    }
}

/// Label → messages, in the order labels were first encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelledErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl LabelledErrors {
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(label, messages)| (label.as_str(), messages.as_slice()))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append(&mut self, label: &str, messages: Vec<String>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, existing)) => existing.extend(messages),
            None => self.entries.push((label.to_string(), messages)),
        }
    }
}

/// Every message under `node`, depth first in natural child order.
pub fn flatten_errors(node: &ErrorNode) -> Vec<String> {
    let mut messages = Vec::new();
    collect_messages(node, &mut messages);
    messages
}

fn collect_messages(node: &ErrorNode, out: &mut Vec<String>) {
    match node {
        ErrorNode::Message(text) => out.push(text.clone()),
        ErrorNode::Record { message } => out.push(message.clone()),
        ErrorNode::Mapping(children) => {
            for (_, child) in children {
                collect_messages(child, out);
            }
        }
        ErrorNode::Sequence(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        ErrorNode::Unrecognized => {}
    }
}

/// Groups the messages of an error document under display labels.
///
/// Each section expands into `section.child` keys. A section whose value is
/// not a mapping (a plain `pids: "Invalid DOI"`) is kept whole under the
/// section key. Keys sharing a label have their messages concatenated.
pub fn label_errors(errors: &ErrorNode, labels: &LabelTable) -> LabelledErrors {
    let mut labelled = LabelledErrors::default();
    for (key, node) in error_fields(errors) {
        let messages = flatten_errors(node);
        if messages.is_empty() {
            continue;
        }
        labelled.append(labels.label_for(&key), messages);
    }
    labelled
}

fn error_fields(errors: &ErrorNode) -> Vec<(String, &ErrorNode)> {
    let mut fields = Vec::new();
    for section in ERROR_SECTIONS {
        let Some(node) = errors.lookup(section) else {
            continue;
        };
        match node {
            ErrorNode::Mapping(children) => {
                for (key, child) in children {
                    fields.push((format!("{section}.{key}"), child));
                }
            }
            other => fields.push((section.to_string(), other)),
        }
    }
    fields
}

/// A message group ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Inline(String),
    List(Vec<String>),
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(message) => f.write_str(message),
            Self::List(messages) => {
                for (index, message) in messages.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "- {message}")?;
                }
                Ok(())
            }
        }
    }
}

/// Deduplicates (first occurrence wins); a single survivor renders inline.
pub fn render_messages(messages: &[String]) -> Rendered {
    let mut unique: Vec<String> = Vec::with_capacity(messages.len());
    for message in messages {
        if !unique.contains(message) {
            unique.push(message.clone());
        }
    }

    if unique.len() == 1 {
        Rendered::Inline(unique.remove(0))
    } else {
        Rendered::List(unique)
    }
}

#[cfg(test)]
#[path = "tests/error_labels_tests.rs"]
mod tests;
