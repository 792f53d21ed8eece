// SPDX-License-Identifier: AGPL-3.0-or-later
//! Block identifier generators
//!
//! Ids only need to be unique within one document's lifetime. Editors use
//! [`UuidIds`]; the markdown parser defaults to the cheaper [`SequentialIds`],
//! whose random salt keeps generators created in the same millisecond apart.

use crate::block::BlockId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of fresh, never-reused block ids
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> BlockId;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate(&self) -> BlockId {
        BlockId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// `<millis>-<salt>-<seq>` ids: creation time, a random per-generator salt
/// and a counter
#[derive(Debug)]
pub struct SequentialIds {
    epoch_ms: u128,
    salt: Option<String>,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut salt = uuid::Uuid::new_v4().simple().to_string();
        salt.truncate(12);

        Self {
            epoch_ms,
            salt: Some(salt),
            next: AtomicU64::new(0),
        }
    }

    /// Unsalted `<millis>-<seq>` ids with a fixed time component.
    ///
    /// Reproducible, so two generators started at the same value collide.
    pub fn starting_at(epoch_ms: u128) -> Self {
        Self {
            epoch_ms,
            salt: None,
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> BlockId {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        match &self.salt {
            Some(salt) => BlockId::new(format!("{}-{salt}-{seq:x}", self.epoch_ms)),
            None => BlockId::new(format!("{}-{seq:x}", self.epoch_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids_are_unique() {
        let ids = SequentialIds::starting_at(1700000000000);
        let generated: HashSet<_> = (0..1000).map(|_| ids.generate()).collect();
        assert_eq!(generated.len(), 1000);
    }

    #[test]
    fn test_sequential_ids_format() {
        let ids = SequentialIds::starting_at(42);
        assert_eq!(ids.generate().as_str(), "42-0");
        assert_eq!(ids.generate().as_str(), "42-1");
    }

    #[test]
    fn test_separate_generators_do_not_collide() {
        let first = SequentialIds::new();
        let second = SequentialIds::new();
        let generated: HashSet<_> = (0..100)
            .flat_map(|_| [first.generate(), second.generate()])
            .collect();
        assert_eq!(generated.len(), 200);
    }

    #[test]
    fn test_salted_ids_format() {
        let id = SequentialIds::new().generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 12);
        assert_eq!(parts[2], "0");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let a = UuidIds.generate();
        let b = UuidIds.generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
