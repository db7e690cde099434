//! Rotation schedule.
//!
//! Rotation is driven by key set age, not by wall-clock cron. A key set is
//! due once it is within `margin` seconds of its nominal expiry
//! (`creation_time + period`). The margin is the same TTL written to the
//! backends, so a rotation started at the due time has finished propagating
//! before any consumer sees an expired key set.

use serde::{Deserialize, Serialize};

use crate::keyset::KeySet;

/// Unix time at which `key_set` becomes due for rotation.
pub fn rotation_due_at(key_set: &KeySet, margin_secs: u64) -> i64 {
    let margin = i64::try_from(margin_secs).unwrap_or(i64::MAX);
    key_set
        .creation_time
        .saturating_add(key_set.period)
        .saturating_sub(margin)
}

/// Check if `key_set` should be rotated at `now`.
///
/// True iff `now >= creation_time + period - margin_secs`; the boundary
/// itself is due.
pub fn should_rotate(key_set: &KeySet, now: i64, margin_secs: u64) -> bool {
    now >= rotation_due_at(key_set, margin_secs)
}

/// Snapshot of where a key set stands in its rotation schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatus {
    /// Number of keys in the set.
    pub key_count: usize,
    /// Unix time of the last rotation.
    pub creation_time: i64,
    /// Rotation period in seconds.
    pub period: i64,
    /// Unix time the snapshot was taken.
    pub now: i64,
    /// Seconds since the last rotation.
    pub age_secs: i64,
    /// Unix time the next rotation is due.
    pub rotates_at: i64,
    /// Whether a cycle run now would rotate.
    pub rotation_due: bool,
}

impl KeyStatus {
    /// Describe `key_set` as of `now`.
    pub fn of(key_set: &KeySet, now: i64, margin_secs: u64) -> Self {
        Self {
            key_count: key_set.len(),
            creation_time: key_set.creation_time,
            period: key_set.period,
            now,
            age_secs: key_set.age(now),
            rotates_at: rotation_due_at(key_set, margin_secs),
            rotation_due: should_rotate(key_set, now, margin_secs),
        }
    }

    /// Seconds from the snapshot until the next rotation, zero if already due.
    pub fn secs_until_rotation(&self) -> i64 {
        self.rotates_at.saturating_sub(self.now).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_700_000_000;

    fn key_set() -> KeySet {
        KeySet::new(vec!["a".into(), "b".into(), "c".into()], T, 3_600)
    }

    #[test]
    fn test_due_at() {
        assert_eq!(rotation_due_at(&key_set(), 300), T + 3_300);
        assert_eq!(rotation_due_at(&key_set(), 0), T + 3_600);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(!should_rotate(&key_set(), T + 3_299, 300));
        assert!(should_rotate(&key_set(), T + 3_300, 300));
        assert!(should_rotate(&key_set(), T + 3_301, 300));
    }

    #[test]
    fn test_fresh_and_stale() {
        assert!(!should_rotate(&key_set(), T + 3_200, 300));
        assert!(should_rotate(&key_set(), T + 100_000, 300));
    }

    #[test]
    fn test_margin_larger_than_period() {
        // Always due; the configuration layer rejects this setup.
        assert!(should_rotate(&key_set(), T, 7_200));
    }

    #[test]
    fn test_huge_margin_does_not_overflow() {
        assert!(should_rotate(&key_set(), T, u64::MAX));
    }

    #[test]
    fn test_key_status() {
        let status = KeyStatus::of(&key_set(), T + 1_000, 300);

        assert_eq!(status.key_count, 3);
        assert_eq!(status.age_secs, 1_000);
        assert_eq!(status.rotates_at, T + 3_300);
        assert!(!status.rotation_due);
        assert_eq!(status.now, T + 1_000);
        assert_eq!(status.secs_until_rotation(), 2_300);

        let due = KeyStatus::of(&key_set(), T + 5_000, 300);
        assert!(due.rotation_due);
        assert_eq!(due.secs_until_rotation(), 0);
    }

    #[test]
    fn test_key_status_keeps_clock_value_for_extreme_creation_time() {
        let key_set = KeySet::new(vec!["a".into(), "b".into(), "c".into()], i64::MIN + 1, 3_600);

        let status = KeyStatus::of(&key_set, T, 300);

        // Age saturates, so the snapshot time cannot be derived from it.
        assert_eq!(status.age_secs, i64::MAX);
        assert_eq!(status.now, T);
        assert_eq!(status.secs_until_rotation(), 0);
    }
}
