//! Deferred, at-most-once producer of member bytes during a repack
//!
//! Production is split in two phases. [`ArchiveFileGenerator::assign_offset`]
//! claims a key and fixes the output offset; [`PendingFile::produce`] writes that
//! offset into the entry and only then runs the producer. A producer that needs
//! its own offset therefore always sees the final value.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use super::ArchiveEntry;
use crate::error::{Error, Result};

/// Produces the stored bytes for one entry. May update the entry's sizes.
pub type Producer<'a, E> = Box<dyn FnOnce(&mut E) -> Result<Vec<u8>> + 'a>;

/// Write-once map from entry key to byte producer
pub struct ArchiveFileGenerator<'a, K, E> {
    producers: HashMap<K, Producer<'a, E>>,
    claimed: HashSet<K>,
}

impl<K, E> Default for ArchiveFileGenerator<'_, K, E> {
    fn default() -> Self {
        Self {
            producers: HashMap::new(),
            claimed: HashSet::new(),
        }
    }
}

impl<'a, K, E> ArchiveFileGenerator<'a, K, E>
where
    K: Eq + Hash + Clone + Debug,
    E: ArchiveEntry,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the producer for `key`
    pub fn add(&mut self, key: K, producer: Producer<'a, E>) -> Result<()> {
        if self.producers.contains_key(&key) || self.claimed.contains(&key) {
            return Err(Error::InvariantViolation(format!(
                "producer for {key:?} registered twice"
            )));
        }
        self.producers.insert(key, producer);
        Ok(())
    }

    /// Claim `key` for production at `offset`.
    ///
    /// Fails if the key was already claimed or never registered.
    pub fn assign_offset(&mut self, key: &K, offset: u64) -> Result<PendingFile<'a, E>> {
        if self.claimed.contains(key) {
            return Err(Error::InvariantViolation(format!(
                "bytes for {key:?} were already produced"
            )));
        }
        let producer = self.producers.remove(key).ok_or_else(|| {
            Error::InvariantViolation(format!("no producer registered for {key:?}"))
        })?;
        self.claimed.insert(key.clone());

        Ok(PendingFile { offset, producer })
    }

    /// Number of registered producers not yet claimed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.producers.len()
    }
}

/// A claimed producer bound to its output offset
pub struct PendingFile<'a, E> {
    offset: u64,
    producer: Producer<'a, E>,
}

impl<E: ArchiveEntry> PendingFile<'_, E> {
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Record the offset in `entry`, then run the producer
    pub fn produce(self, entry: &mut E) -> Result<Vec<u8>> {
        entry.set_offset(self.offset);
        (self.producer)(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct Entry {
        offset: u64,
        size: u64,
    }

    impl ArchiveEntry for Entry {
        fn path(&self) -> &str {
            "entry"
        }
        fn offset(&self) -> u64 {
            self.offset
        }
        fn set_offset(&mut self, offset: u64) {
            self.offset = offset;
        }
        fn stored_size(&self) -> u64 {
            self.size
        }
        fn size(&self) -> u64 {
            self.size
        }
        fn is_compressed(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_offset_visible_to_producer() {
        let mut generator = ArchiveFileGenerator::new();
        generator
            .add(
                0usize,
                Box::new(|entry: &mut Entry| {
                    entry.size = 4;
                    Ok(entry.offset.to_le_bytes()[..4].to_vec())
                }),
            )
            .unwrap();

        let mut entry = Entry::default();
        let pending = generator.assign_offset(&0, 0x40).unwrap();
        assert_eq!(pending.offset(), 0x40);
        let bytes = pending.produce(&mut entry).unwrap();

        assert_eq!(bytes, vec![0x40, 0, 0, 0]);
        assert_eq!(entry.offset, 0x40);
        assert_eq!(entry.size, 4);
        assert_eq!(generator.remaining(), 0);
    }

    #[test]
    fn test_second_production_is_invariant_violation() {
        let calls = Cell::new(0);
        let mut generator = ArchiveFileGenerator::new();
        generator
            .add(
                "a",
                Box::new(|_: &mut Entry| {
                    calls.set(calls.get() + 1);
                    Ok(vec![1, 2, 3])
                }),
            )
            .unwrap();

        let mut entry = Entry::default();
        generator.assign_offset(&"a", 0).unwrap().produce(&mut entry).unwrap();

        let second = generator.assign_offset(&"a", 3);
        assert!(matches!(second, Err(Error::InvariantViolation(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_duplicate_and_unknown_keys() {
        let mut generator: ArchiveFileGenerator<'_, u32, Entry> = ArchiveFileGenerator::new();
        generator.add(1, Box::new(|_| Ok(Vec::new()))).unwrap();
        assert!(matches!(
            generator.add(1, Box::new(|_| Ok(Vec::new()))),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            generator.assign_offset(&7, 0),
            Err(Error::InvariantViolation(_))
        ));
        assert_eq!(generator.remaining(), 1);
    }
}
