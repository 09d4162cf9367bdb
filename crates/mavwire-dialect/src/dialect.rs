use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DialectError, Result};

/// Maximum size of a dialect document loaded from disk.
pub const MAX_DIALECT_FILE_SIZE: usize = 256 * 1024;

/// One message definition: its wire id, name and checksum seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageInfo {
    pub id: u8,
    pub name: String,
    pub crc_extra: u8,
}

impl MessageInfo {
    pub fn new(id: u8, name: impl Into<String>, crc_extra: u8) -> Self {
        Self {
            id,
            name: name.into(),
            crc_extra,
        }
    }
}

/// A named, immutable set of message definitions keyed by message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    name: String,
    messages: BTreeMap<u8, MessageInfo>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DialectDocument {
    name: String,
    messages: Vec<MessageInfo>,
}

impl Dialect {
    /// Build a dialect from message definitions.
    ///
    /// Fails with [`DialectError::DuplicateMessage`] if an id appears twice.
    pub fn from_entries<I>(name: impl Into<String>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = MessageInfo>,
    {
        let name = name.into();
        let mut messages = BTreeMap::new();
        for info in entries {
            let id = info.id;
            if messages.insert(id, info).is_some() {
                return Err(DialectError::DuplicateMessage { dialect: name, id });
            }
        }
        Ok(Self { name, messages })
    }

    /// Build a dialect from a compiled-in `(id, name, crc_extra)` table.
    ///
    /// The first definition of an id is kept.
    pub fn from_static(name: &str, table: &[(u8, &str, u8)]) -> Self {
        let mut messages = BTreeMap::new();
        for &(id, message, crc_extra) in table {
            messages
                .entry(id)
                .or_insert_with(|| MessageInfo::new(id, message, crc_extra));
        }
        Self {
            name: name.to_string(),
            messages,
        }
    }

    /// Parse a dialect from a JSON document.
    ///
    /// ```text
    /// {"name": "custom", "messages": [{"id": 0, "name": "HEARTBEAT", "crc_extra": 50}]}
    /// ```
    pub fn from_json(document: &str) -> Result<Self> {
        let doc: DialectDocument = serde_json::from_str(document)?;
        Self::from_entries(doc.name, doc.messages)
    }

    /// Load a dialect JSON document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            DialectError::LoadFailed(format!("failed opening {}: {err}", path.display()))
        })?;
        let metadata = file
            .metadata()
            .map_err(|err| DialectError::LoadFailed(err.to_string()))?;

        if !metadata.is_file() {
            return Err(DialectError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > MAX_DIALECT_FILE_SIZE as u64 {
            return Err(DialectError::LoadFailed(format!(
                "dialect file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(MAX_DIALECT_FILE_SIZE.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                DialectError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > MAX_DIALECT_FILE_SIZE {
            return Err(DialectError::LoadFailed(format!(
                "dialect file too large while reading: {}",
                path.display()
            )));
        }

        Self::from_json(&content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition of a message id, if this dialect has one.
    pub fn get(&self, id: u8) -> Option<&MessageInfo> {
        self.messages.get(&id)
    }

    /// Checksum seed for a message id, if this dialect defines it.
    pub fn crc_extra(&self, id: u8) -> Option<u8> {
        self.messages.get(&id).map(|info| info.crc_extra)
    }

    pub fn contains(&self, id: u8) -> bool {
        self.messages.contains_key(&id)
    }

    /// Message definitions in ascending id order.
    pub fn messages(&self) -> impl Iterator<Item = &MessageInfo> {
        self.messages.values()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
