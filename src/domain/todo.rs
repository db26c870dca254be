use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TodoId(pub u32);

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse::<u32>().map(TodoId) }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Ordered list of attachment URLs.
///
/// Stored and serialized as a single comma-joined string; an empty list is the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments(Vec<String>);

impl Attachments {
    pub fn new(urls: Vec<String>) -> Self { Self(urls) }

    /// Decode the comma-joined column form.
    pub fn from_column(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        Self(raw.split(',').map(str::to_owned).collect())
    }

    pub fn to_column(&self) -> String { self.0.join(",") }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn urls(&self) -> &[String] { &self.0 }

    /// Object store keys for every attachment, in order.
    pub fn storage_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|url| storage_key(url))
    }
}

impl Serialize for Attachments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_column())
    }
}

impl<'de> Deserialize<'de> for Attachments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_column(&raw))
    }
}

/// Last `/`-delimited segment of an attachment URL.
pub fn storage_key(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    #[serde(rename = "attachment", default, skip_serializing_if = "Attachments::is_empty")]
    pub attachments: Attachments,
}

/// A row that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub attachments: Attachments,
}

/// A file received from the client, keyed by its original name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content: Bytes,
}

/// Decoded create/update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoInput {
    pub title: String,
    pub description: String,
    pub files: Vec<Upload>,
}
