use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(RecordId);
id_newtype!(RequestId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub Uuid);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-provided URLs keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, String>);

impl Links {
    pub const SELF: &'static str = "self";
    pub const SELF_HTML: &'static str = "self_html";
    pub const PUBLISH: &'static str = "publish";
    pub const REVIEW: &'static str = "review";
    pub const SUBMIT_REVIEW: &'static str = "submit-review";
    pub const RECORD_HTML: &'static str = "record_html";

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str)
    }

    pub fn insert(&mut self, rel: impl Into<String>, url: impl Into<String>) {
        self.0.insert(rel.into(), url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn self_api(&self) -> Option<&str> {
        self.get(Self::SELF)
    }

    pub fn self_html(&self) -> Option<&str> {
        self.get(Self::SELF_HTML)
    }

    pub fn publish(&self) -> Option<&str> {
        self.get(Self::PUBLISH)
    }

    pub fn review(&self) -> Option<&str> {
        self.get(Self::REVIEW)
    }

    pub fn submit_review(&self) -> Option<&str> {
        self.get(Self::SUBMIT_REVIEW)
    }

    pub fn record_html(&self) -> Option<&str> {
        self.get(Self::RECORD_HTML)
    }

    /// Relation name of the reservation endpoint for a PID scheme, e.g. `reserve_doi`.
    pub fn reserve_rel(pid_type: &str) -> String {
        format!("reserve_{pid_type}")
    }

    pub fn reserve_pid(&self, pid_type: &str) -> Option<&str> {
        self.get(&Self::reserve_rel(pid_type))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Links {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(rel, url)| (rel.into(), url.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Restricted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embargo {
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Access {
    #[serde(default)]
    pub record: Visibility,
    #[serde(default)]
    pub files: Visibility,
    #[serde(default)]
    pub embargo: Embargo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesSection {
    #[serde(default = "files_enabled_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub entries: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preview: Option<String>,
}

fn files_enabled_default() -> bool {
    true
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            enabled: files_enabled_default(),
            entries: Map::new(),
            default_preview: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidRecord {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReceiver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<CommunityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<ReviewReceiver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ReviewRequest {
    pub fn community(&self) -> Option<CommunityId> {
        self.receiver.as_ref().and_then(|receiver| receiver.community)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewRequest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The editable, not-yet-published version of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub files: FilesSection,
    #[serde(default)]
    pub access: Access,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pids: BTreeMap<String, PidRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Draft {
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn review(&self) -> Option<&ReviewRequest> {
        self.parent.as_ref().and_then(|parent| parent.review.as_ref())
    }

    /// Shallow top-level merge of a backend response into this record.
    ///
    /// Sections always present in a response replace ours; optional fields
    /// replace ours only when the response carries them, so an `id` or
    /// `links` obtained on first save is never dropped again.
    pub fn merge(&mut self, incoming: Draft) {
        let Draft {
            id,
            links,
            metadata,
            files,
            access,
            pids,
            parent,
            created,
            updated,
            expires_at,
            extra,
        } = incoming;

        if id.is_some() {
            self.id = id;
        }
        if !links.is_empty() {
            self.links = links;
        }
        self.metadata = metadata;
        self.files = files;
        self.access = access;
        self.pids = pids;
        if parent.is_some() {
            self.parent = parent;
        }
        if created.is_some() {
            self.created = created;
        }
        if updated.is_some() {
            self.updated = updated;
        }
        if expires_at.is_some() {
            self.expires_at = expires_at;
        }
        self.extra.extend(extra);
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
