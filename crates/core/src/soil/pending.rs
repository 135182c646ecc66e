//! Soil pending queue
//!
//! Soil found beneath a fire waits here until it is resolved. A record is due
//! once its timeout has elapsed or the fire above it is gone, but never before
//! the grace delay, which absorbs place/remove races within one tick.
//!
//! The queue is the only registry that survives a world save; it is persisted
//! as a [`PendingSoilSnapshot`].

use crate::core_types::block::BlockCode;
use crate::core_types::position::BlockPos;
use crate::error::SnapshotError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A soil block waiting for conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSoilRecord {
    pub pos: BlockPos,
    /// Block identifier when queued
    pub code: BlockCode,
    /// Simulation time when queued
    pub queued_at: f64,
    /// Fire that triggered the record
    pub fire_pos: BlockPos,
}

#[derive(Debug, Clone)]
pub struct SoilPendingQueue {
    records: FxHashMap<BlockPos, PendingSoilRecord>,
    timeout: f64,
    min_delay: f64,
}

impl SoilPendingQueue {
    pub fn new(timeout: f64, min_delay: f64) -> Self {
        Self {
            records: FxHashMap::default(),
            timeout,
            min_delay,
        }
    }

    /// Queue a record, replacing any earlier one at the same position
    pub fn insert(&mut self, record: PendingSoilRecord) -> Option<PendingSoilRecord> {
        self.records.insert(record.pos, record)
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<PendingSoilRecord> {
        self.records.remove(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&PendingSoilRecord> {
        self.records.get(&pos)
    }

    /// Remove the record triggered by `fire`.
    ///
    /// Falls back to the block directly below the fire for records whose fire
    /// position was not tracked.
    pub fn take_for_fire(&mut self, fire: BlockPos) -> Option<PendingSoilRecord> {
        let key = self
            .records
            .values()
            .filter(|r| r.fire_pos == fire)
            .map(|r| r.pos)
            .min()
            .or_else(|| Some(fire.below(1)).filter(|p| self.records.contains_key(p)))?;
        self.records.remove(&key)
    }

    /// Whether `record` should resolve at `now`
    pub fn is_due(&self, record: &PendingSoilRecord, now: f64, fire_present: bool) -> bool {
        let age = now - record.queued_at;
        (age >= self.timeout || !fire_present) && age >= self.min_delay
    }

    /// Remove and return every due record in position order
    pub fn take_due<F>(&mut self, now: f64, fire_present: F) -> Vec<PendingSoilRecord>
    where
        F: Fn(BlockPos) -> bool,
    {
        let mut due: Vec<BlockPos> = self
            .records
            .values()
            .filter(|r| self.is_due(r, now, fire_present(r.fire_pos)))
            .map(|r| r.pos)
            .collect();
        due.sort_unstable();
        due.into_iter()
            .filter_map(|pos| self.records.remove(&pos))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Serializable copy of the queue
    pub fn snapshot(&self) -> PendingSoilSnapshot {
        let mut records: Vec<PendingSoilRecord> = self.records.values().cloned().collect();
        records.sort_unstable_by_key(|r| r.pos);
        PendingSoilSnapshot {
            version: SNAPSHOT_VERSION,
            records,
        }
    }

    /// Replace the queue contents with a snapshot
    pub fn restore(&mut self, snapshot: PendingSoilSnapshot) {
        self.records.clear();
        for record in snapshot.records {
            self.insert(record);
        }
    }
}

/// Persisted form of the pending queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSoilSnapshot {
    pub version: u32,
    pub records: Vec<PendingSoilRecord>,
}

impl Default for PendingSoilSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: Vec::new(),
        }
    }
}

impl PendingSoilSnapshot {
    /// Encode as JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializeFailed(e.to_string()))
    }

    /// Decode from JSON, rejecting unknown format versions
    ///
    /// # Errors
    /// Returns error if the text cannot be parsed or has the wrong version
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| SnapshotError::ParseFailed(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Load snapshot from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let contents =
            fs::read_to_string(path).map_err(|e| SnapshotError::LoadFailed(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Save snapshot to file
    ///
    /// # Errors
    /// Returns error if snapshot cannot be serialized or written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let contents = self.to_json()?;
        fs::write(path, contents).map_err(|e| SnapshotError::SaveFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pos: BlockPos, queued_at: f64) -> PendingSoilRecord {
        PendingSoilRecord {
            pos,
            code: "game:soil-low-normal".into(),
            queued_at,
            fire_pos: pos.above(1),
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut queue = SoilPendingQueue::new(60.0, 0.5);
        let pos = BlockPos::new(0, 0, 0);
        assert!(queue.insert(record(pos, 1.0)).is_none());
        assert!(queue.insert(record(pos, 2.0)).is_some());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(pos).unwrap().queued_at, 2.0);
    }

    #[test]
    fn test_due_rules() {
        let queue = SoilPendingQueue::new(60.0, 0.5);
        let r = record(BlockPos::new(0, 0, 0), 10.0);

        // Fire still burning: only the timeout resolves
        assert!(!queue.is_due(&r, 30.0, true));
        assert!(queue.is_due(&r, 70.0, true));
        // Fire gone: resolves after the grace delay
        assert!(!queue.is_due(&r, 10.2, false));
        assert!(queue.is_due(&r, 10.5, false));
    }

    #[test]
    fn test_take_due_sorted_and_removed() {
        let mut queue = SoilPendingQueue::new(60.0, 0.5);
        queue.insert(record(BlockPos::new(3, 0, 0), 0.0));
        queue.insert(record(BlockPos::new(1, 0, 0), 0.0));
        queue.insert(record(BlockPos::new(2, 0, 0), 0.0));

        let burning = BlockPos::new(2, 1, 0);
        let due = queue.take_due(1.0, |fire| fire == burning);
        let positions: Vec<BlockPos> = due.iter().map(|r| r.pos).collect();
        assert_eq!(positions, vec![BlockPos::new(1, 0, 0), BlockPos::new(3, 0, 0)]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_take_for_fire() {
        let mut queue = SoilPendingQueue::new(60.0, 0.5);
        let grass_fire = BlockPos::new(2, 20, 2);
        queue.insert(PendingSoilRecord {
            pos: BlockPos::new(2, 18, 2),
            code: "game:soil-low-normal".into(),
            queued_at: 0.0,
            fire_pos: grass_fire,
        });
        queue.insert(record(BlockPos::new(5, 9, 5), 0.0));

        assert_eq!(queue.take_for_fire(grass_fire).unwrap().pos, BlockPos::new(2, 18, 2));
        assert!(queue.take_for_fire(grass_fire).is_none());
        assert_eq!(
            queue.take_for_fire(BlockPos::new(5, 10, 5)).unwrap().pos,
            BlockPos::new(5, 9, 5)
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_through_json() {
        let mut queue = SoilPendingQueue::new(60.0, 0.5);
        queue.insert(record(BlockPos::new(4, 2, -1), 3.5));
        queue.insert(record(BlockPos::new(-7, 2, 0), 1.0));

        let json = queue.snapshot().to_json().unwrap();
        let snapshot = PendingSoilSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.records[0].pos, BlockPos::new(-7, 2, 0));

        let mut restored = SoilPendingQueue::new(60.0, 0.5);
        restored.insert(record(BlockPos::new(100, 0, 0), 0.0));
        restored.restore(snapshot);
        assert_eq!(restored.len(), 2);
        assert!(restored.get(BlockPos::new(100, 0, 0)).is_none());
        assert_eq!(restored.get(BlockPos::new(4, 2, -1)), queue.get(BlockPos::new(4, 2, -1)));
    }

    #[test]
    fn test_snapshot_rejects_other_versions() {
        let json = r#"{ "version": 99, "records": [] }"#;
        assert_eq!(
            PendingSoilSnapshot::from_json(json),
            Err(SnapshotError::UnsupportedVersion(99))
        );
        assert!(matches!(
            PendingSoilSnapshot::from_json("[]"),
            Err(SnapshotError::ParseFailed(_))
        ));
    }
}
