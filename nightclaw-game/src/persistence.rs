//! Save records: a flat, line-oriented text format plus the storage seam.
//!
//! Version 1 layout, one field per line unless noted:
//!
//! ```text
//! NIGHTCLAW-SAVE 1
//! <node id>
//! <health> <hunger> <energy> <reputation> <day>
//! <event happened 0|1>
//! <item count>
//! <name> / <category ordinal> / <effect value> / <quantity>   (4 lines per item)
//! checksum <sha256 hex of all preceding lines>
//! ```
//!
//! Records without the header line are read with the older layout, where
//! the event flag line may be missing and there is no checksum.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    CHECKSUM_PREFIX, DEFAULT_SAVE_NAME, NodeId, SAVE_EXTENSION, SAVE_FORMAT_VERSION, SAVE_HEADER,
};
use crate::inventory::{Item, ItemCategory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("save record is empty")]
    Empty,
    #[error("unsupported save header {found:?}")]
    UnsupportedVersion { found: String },
    #[error("save record ends before the {field}")]
    MissingField { field: &'static str },
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("unknown item category ordinal {ordinal:?}")]
    UnknownCategory { ordinal: String },
    #[error("save record checksum does not match its contents")]
    ChecksumMismatch,
    #[error("unexpected data after the last item: {line:?}")]
    TrailingData { line: String },
    #[error("item name {name:?} cannot be written to a save record")]
    UnencodableName { name: String },
}

/// Whether `name` survives the one-field-per-line layout.
#[must_use]
pub fn is_storable_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['\n', '\r'])
}

/// The persisted subset of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub node_id: NodeId,
    pub health: i32,
    pub hunger: i32,
    pub energy: i32,
    pub reputation: i32,
    pub day_count: i32,
    pub event_happened: bool,
    pub items: Vec<Item>,
}

impl SaveRecord {
    /// # Errors
    ///
    /// Returns [`SaveError::UnencodableName`] if an item name is blank or
    /// spans more than one line.
    pub fn encode(&self) -> Result<String, SaveError> {
        if let Some(item) = self.items.iter().find(|item| !is_storable_name(&item.name)) {
            return Err(SaveError::UnencodableName {
                name: item.name.clone(),
            });
        }
        let mut lines = vec![
            format!("{SAVE_HEADER} {SAVE_FORMAT_VERSION}"),
            self.node_id.to_string(),
            format!(
                "{} {} {} {} {}",
                self.health, self.hunger, self.energy, self.reputation, self.day_count
            ),
            u8::from(self.event_happened).to_string(),
            self.items.len().to_string(),
        ];
        for item in &self.items {
            lines.push(item.name.clone());
            lines.push(item.category.ordinal().to_string());
            lines.push(item.effect_value.to_string());
            lines.push(item.quantity.to_string());
        }
        let mut body = lines.join("\n");
        body.push('\n');
        let digest = checksum(&body);
        Ok(format!("{body}{CHECKSUM_PREFIX} {digest}\n"))
    }

    /// # Errors
    ///
    /// Returns a [`SaveError`] naming the first field that is missing or
    /// malformed, a checksum mismatch, or leftover lines.
    pub fn decode(text: &str) -> Result<Self, SaveError> {
        let Some(first) = text.lines().find(|line| !line.trim().is_empty()) else {
            return Err(SaveError::Empty);
        };
        if first.trim_start().starts_with(SAVE_HEADER) {
            decode_versioned(text)
        } else {
            decode_legacy(text)
        }
    }
}

fn checksum(body: &str) -> String {
    format!("{:x}", Sha256::digest(body.as_bytes()))
}

fn decode_versioned(text: &str) -> Result<SaveRecord, SaveError> {
    let trimmed = text.trim();
    let missing_checksum = SaveError::MissingField { field: "checksum" };
    let split = trimmed.rfind('\n').ok_or_else(|| missing_checksum.clone())?;
    let (body, footer) = trimmed.split_at(split + 1);
    let digest = footer
        .strip_prefix(CHECKSUM_PREFIX)
        .map(str::trim)
        .ok_or(missing_checksum)?;
    if digest != checksum(body) {
        return Err(SaveError::ChecksumMismatch);
    }

    let mut fields = Fields::new(body);
    let header = fields.next("header")?;
    let version = header
        .trim()
        .strip_prefix(SAVE_HEADER)
        .and_then(|rest| rest.trim().parse::<u32>().ok());
    if version != Some(SAVE_FORMAT_VERSION) {
        return Err(SaveError::UnsupportedVersion {
            found: header.to_string(),
        });
    }
    let node_id = fields.parse("node id")?;
    let stats = parse_stats(fields.next("stats")?)?;
    let event_happened = parse_flag(fields.next("event flag")?)?;
    let items = read_items(&mut fields)?;
    fields.finish()?;
    Ok(stats.into_record(node_id, event_happened, items))
}

fn decode_legacy(text: &str) -> Result<SaveRecord, SaveError> {
    let mut fields = Fields::new(text);
    let node_id = fields.parse("node id")?;
    let stats = parse_stats(fields.next("stats")?)?;
    let event_happened = if fields.legacy_flag_present() {
        parse_flag(fields.next("event flag")?)?
    } else {
        false
    };
    let items = read_items(&mut fields)?;
    fields.finish()?;
    Ok(stats.into_record(node_id, event_happened, items))
}

struct StatLine {
    health: i32,
    hunger: i32,
    energy: i32,
    reputation: i32,
    day_count: i32,
}

impl StatLine {
    fn into_record(self, node_id: NodeId, event_happened: bool, items: Vec<Item>) -> SaveRecord {
        SaveRecord {
            node_id,
            health: self.health,
            hunger: self.hunger,
            energy: self.energy,
            reputation: self.reputation,
            day_count: self.day_count,
            event_happened,
            items,
        }
    }
}

fn parse_stats(line: &str) -> Result<StatLine, SaveError> {
    let invalid = || SaveError::InvalidField {
        field: "stats",
        value: line.to_string(),
    };
    let values = line
        .split_whitespace()
        .map(str::parse::<i32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let &[health, hunger, energy, reputation, day_count] = values.as_slice() else {
        return Err(invalid());
    };
    Ok(StatLine {
        health,
        hunger,
        energy,
        reputation,
        day_count,
    })
}

fn parse_flag(line: &str) -> Result<bool, SaveError> {
    match line.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(SaveError::InvalidField {
            field: "event flag",
            value: other.to_string(),
        }),
    }
}

fn read_items(fields: &mut Fields<'_>) -> Result<Vec<Item>, SaveError> {
    let count: usize = fields.parse("item count")?;
    let mut items = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let name = fields.next("item name")?;
        if name.trim().is_empty() {
            return Err(SaveError::InvalidField {
                field: "item name",
                value: name.to_string(),
            });
        }
        let ordinal = fields.next("item category")?;
        let category = ordinal
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(ItemCategory::from_ordinal)
            .ok_or_else(|| SaveError::UnknownCategory {
                ordinal: ordinal.to_string(),
            })?;
        let effect_value = fields.parse("item effect value")?;
        let quantity: u32 = fields.parse("item quantity")?;
        if quantity == 0 {
            return Err(SaveError::InvalidField {
                field: "item quantity",
                value: quantity.to_string(),
            });
        }
        items.push(Item::new(name, category, effect_value, quantity));
    }
    Ok(items)
}

/// Line cursor over a record.
struct Fields<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        Self { lines, pos: 0 }
    }

    fn next(&mut self, field: &'static str) -> Result<&'a str, SaveError> {
        let line = self
            .lines
            .get(self.pos)
            .copied()
            .ok_or(SaveError::MissingField { field })?;
        self.pos += 1;
        Ok(line)
    }

    fn parse<T: FromStr>(&mut self, field: &'static str) -> Result<T, SaveError> {
        let raw = self.next(field)?;
        raw.trim().parse().map_err(|_| SaveError::InvalidField {
            field,
            value: raw.to_string(),
        })
    }

    fn remaining(&self) -> &[&'a str] {
        self.lines.get(self.pos..).unwrap_or_default()
    }

    /// Older records only sometimes carry the event flag. It is present when
    /// the next two lines read as a 0/1 flag and an item count that accounts
    /// for every remaining line.
    fn legacy_flag_present(&self) -> bool {
        let rest = self.remaining();
        let [flag, count, ..] = rest else {
            return false;
        };
        let expected = count
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|count| count.checked_mul(4))
            .and_then(|lines| lines.checked_add(2));
        matches!(flag.trim(), "0" | "1") && expected == Some(rest.len())
    }

    fn finish(&self) -> Result<(), SaveError> {
        match self.remaining().first() {
            Some(line) => Err(SaveError::TrailingData {
                line: (*line).to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// File name a save is written under: blank names become the default, and
/// the `.txt` extension is appended when missing.
#[must_use]
pub fn normalize_save_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() {
        DEFAULT_SAVE_NAME
    } else {
        name
    };
    if name.ends_with(SAVE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{SAVE_EXTENSION}")
    }
}

/// Where save records live.
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `contents` under `name`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn write_record(&self, name: &str, contents: &str) -> Result<(), Self::Error>;

    /// Fetch the record stored under `name`; `Ok(None)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    fn read_record(&self, name: &str) -> Result<Option<String>, Self::Error>;
}

/// Records as files, resolved against a root directory. Absolute names
/// bypass the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    root: PathBuf,
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl SaveStorage for FileStorage {
    type Error = io::Error;

    fn write_record(&self, name: &str, contents: &str) -> Result<(), Self::Error> {
        std::fs::write(self.path_for(name), contents)
    }

    fn read_record(&self, name: &str) -> Result<Option<String>, Self::Error> {
        match std::fs::read_to_string(self.path_for(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// In-process records; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.records.borrow().get(name).cloned()
    }

    pub fn insert(&self, name: impl Into<String>, contents: impl Into<String>) {
        self.records.borrow_mut().insert(name.into(), contents.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl SaveStorage for MemoryStorage {
    type Error = Infallible;

    fn write_record(&self, name: &str, contents: &str) -> Result<(), Self::Error> {
        self.insert(name, contents);
        Ok(())
    }

    fn read_record(&self, name: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.get(name))
    }
}
