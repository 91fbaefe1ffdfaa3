//! Fixed-capacity singleton hot cache.
//!
//! Open addressing over 16-slot groups. Each slot has a control byte:
//! `0x80` empty, `0xFE` deleted, otherwise the low 7 bits of the key's
//! hash. Lookups compare control bytes first and only then the full key.
//!
//! The table never grows. Once 7/8 of the slots are in use, inserts of new
//! keys are refused and the caller treats that as a cache miss.

use crate::key::Identifier;

pub const GROUP_WIDTH: usize = 16;
pub const DEFAULT_GROUPS: usize = 4;
pub const MAX_GROUPS: usize = 16;

const EMPTY: u8 = 0x80;
const DELETED: u8 = 0xFE;

#[inline]
fn fingerprint(hash: u64) -> u8 {
    (hash & 0x7F) as u8
}

/// Fingerprinted, group-probed map from [`Identifier`] to `V`.
///
/// # Examples
/// ```
/// use rabita_container::fast_lookup::FastLookup;
/// use rabita_container::key::Identifier;
///
/// let mut table = FastLookup::new(4);
/// let key = Identifier::new("App\\Db");
///
/// assert!(table.insert(key.clone(), 1));
/// assert_eq!(table.find(&key), Some(&1));
/// assert_eq!(table.remove(&key), Some(1));
/// assert_eq!(table.find(&key), None);
/// ```
#[derive(Debug, Clone)]
pub struct FastLookup<V> {
    ctrl: Vec<u8>,
    slots: Vec<Option<(Identifier, V)>>,
    num_groups: usize,
    len: usize,
}

impl<V> FastLookup<V> {
    /// Creates a table with `groups` groups, clamped to `1..=MAX_GROUPS`.
    pub fn new(groups: usize) -> Self {
        let num_groups = groups.clamp(1, MAX_GROUPS);
        let capacity = num_groups * GROUP_WIDTH;

        Self {
            ctrl: vec![EMPTY; capacity],
            slots: (0..capacity).map(|_| None).collect(),
            num_groups,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ctrl.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of live entries before inserts are refused.
    #[inline]
    pub fn max_load(&self) -> usize {
        self.capacity() * 7 / 8
    }

    #[inline]
    fn start_group(&self, hash: u64) -> usize {
        ((hash >> 7) % self.num_groups as u64) as usize
    }

    fn find_slot(&self, key: &Identifier) -> Option<usize> {
        let hash = key.hash_value();
        let fp = fingerprint(hash);
        let mut group = self.start_group(hash);

        for _ in 0..self.num_groups {
            let base = group * GROUP_WIDTH;
            let mut saw_empty = false;

            for i in base..base + GROUP_WIDTH {
                let ctrl = self.ctrl[i];
                if ctrl == fp {
                    if let Some((stored, _)) = &self.slots[i] {
                        if stored == key {
                            return Some(i);
                        }
                    }
                } else if ctrl == EMPTY {
                    saw_empty = true;
                }
            }

            // A group that still has an empty slot never overflowed into the next.
            if saw_empty {
                return None;
            }
            group = (group + 1) % self.num_groups;
        }

        None
    }

    pub fn find(&self, key: &Identifier) -> Option<&V> {
        self.find_slot(key)
            .and_then(|i| self.slots[i].as_ref())
            .map(|(_, value)| value)
    }

    #[inline]
    pub fn contains(&self, key: &Identifier) -> bool {
        self.find_slot(key).is_some()
    }

    /// Inserts or updates. Returns `false` if the table is at its load
    /// limit and `key` is not already present.
    pub fn insert(&mut self, key: Identifier, value: V) -> bool {
        if let Some(i) = self.find_slot(&key) {
            self.slots[i] = Some((key, value));
            return true;
        }

        if self.len >= self.max_load() {
            return false;
        }

        let hash = key.hash_value();
        let mut group = self.start_group(hash);

        for _ in 0..self.num_groups {
            let base = group * GROUP_WIDTH;
            for i in base..base + GROUP_WIDTH {
                let ctrl = self.ctrl[i];
                if ctrl == EMPTY || ctrl == DELETED {
                    self.ctrl[i] = fingerprint(hash);
                    self.slots[i] = Some((key, value));
                    self.len += 1;
                    return true;
                }
            }
            group = (group + 1) % self.num_groups;
        }

        false
    }

    /// Removes `key`, leaving a tombstone so later probes keep working.
    pub fn remove(&mut self, key: &Identifier) -> Option<V> {
        let i = self.find_slot(key)?;
        self.ctrl[i] = DELETED;
        self.len -= 1;
        self.slots[i].take().map(|(_, value)| value)
    }

    pub fn clear(&mut self) {
        self.ctrl.fill(EMPTY);
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }
}

impl<V> Default for FastLookup<V> {
    fn default() -> Self {
        Self::new(DEFAULT_GROUPS)
    }
}
