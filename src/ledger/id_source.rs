// Item id sources
//
// The ledger only needs ids that never collide. A counter is the default
// because it keeps tests deterministic.

use chrono::Utc;
use std::fmt;
use uuid::Uuid;

use crate::ledger::models::ItemId;

/// Generator of unique ledger item ids
pub trait ItemIdSource: Send {
    /// Produce an id that has not been handed out before
    fn next_id(&mut self) -> ItemId;

    /// Account for an id that already exists (e.g. restored from storage)
    fn observe(&mut self, _existing: &ItemId) {}
}

/// Monotonic counter: "1", "2", "3", ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemIdSource for SequentialIds {
    fn next_id(&mut self) -> ItemId {
        let id = self.next;
        self.next += 1;
        ItemId::new(id.to_string())
    }

    fn observe(&mut self, existing: &ItemId) {
        if let Ok(value) = existing.as_str().parse::<u64>() {
            self.next = self.next.max(value.saturating_add(1));
        }
    }
}

/// Millisecond timestamps, bumped forward when two ids land in the same tick
#[derive(Debug, Clone, Default)]
pub struct TimestampIds {
    last: i64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemIdSource for TimestampIds {
    fn next_id(&mut self) -> ItemId {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        ItemId::new(self.last.to_string())
    }

    fn observe(&mut self, existing: &ItemId) {
        if let Ok(value) = existing.as_str().parse::<i64>() {
            self.last = self.last.max(value);
        }
    }
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Default)]
pub struct UuidIds;

impl ItemIdSource for UuidIds {
    fn next_id(&mut self) -> ItemId {
        ItemId::new(Uuid::new_v4().to_string())
    }
}

/// Which id source a calculator should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    #[default]
    Sequential,
    Timestamp,
    Uuid,
}

impl IdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStrategy::Sequential => "sequential",
            IdStrategy::Timestamp => "timestamp",
            IdStrategy::Uuid => "uuid",
        }
    }

    pub fn into_source(self) -> Box<dyn ItemIdSource> {
        match self {
            IdStrategy::Sequential => Box::new(SequentialIds::new()),
            IdStrategy::Timestamp => Box::new(TimestampIds::new()),
            IdStrategy::Uuid => Box::new(UuidIds),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(IdStrategy::Sequential),
            "timestamp" => Ok(IdStrategy::Timestamp),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(format!("Invalid id strategy: {}", s)),
        }
    }
}
