//! ChainedHashMap: fixed-capacity separate chaining built entirely from `List`.
//!
//! The slot table is itself a `List` holding one bucket `List` of `Pair`s per
//! slot. All buckets are allocated up front and the table never grows.

use crate::hash::{KeyHasher, LoseLose};
use crate::list::{List, ListError};
use crate::pair::{Pair, PairType};
use crate::value_type::{ShallowBytes, ValueType};
use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MapError {
    /// A map needs at least one bucket.
    ZeroCapacity,
    /// Looking up a bucket in the slot table failed.
    Bucket(ListError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::ZeroCapacity => f.write_str("hash map capacity must be greater than zero"),
            MapError::Bucket(e) => write!(f, "bucket lookup failed: {}", e),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::ZeroCapacity => None,
            MapError::Bucket(e) => Some(e),
        }
    }
}

impl From<ListError> for MapError {
    fn from(e: ListError) -> Self {
        MapError::Bucket(e)
    }
}

/// How a lookup decides that a stored key matches the queried one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum KeyMatch {
    /// Keys match when their contents are equal.
    #[default]
    Content,
    /// Keys match only when they are the same string slice (same address and
    /// length). Distinct allocations with equal contents are distinct keys.
    Identity,
}

impl KeyMatch {
    #[inline]
    fn matches(self, stored: &str, key: &str) -> bool {
        match self {
            KeyMatch::Content => stored == key,
            KeyMatch::Identity => core::ptr::eq(stored, key),
        }
    }
}

type Bucket<'k, D> = List<PairType<'k, D>>;

/// Descriptor for the slot table: each element is a bucket list.
pub struct BucketType<'k, D>(PhantomData<fn() -> Bucket<'k, D>>)
where
    D: ValueType;

impl<'k, D: ValueType> BucketType<'k, D> {
    pub const fn new() -> Self {
        BucketType(PhantomData)
    }
}

impl<'k, D: ValueType> Default for BucketType<'k, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k, D: ValueType> Clone for BucketType<'k, D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<'k, D: ValueType> ValueType for BucketType<'k, D> {
    type Source = Bucket<'k, D>;
    type Elem = Bucket<'k, D>;

    fn copy(&self, src: &Bucket<'k, D>) -> Bucket<'k, D> {
        src.clone()
    }
}

pub struct ChainedHashMap<'k, D: ValueType, S = LoseLose> {
    slots: List<BucketType<'k, D>>,
    ty: Rc<D>,
    capacity: usize,
    count: usize,
    hasher: S,
    key_match: KeyMatch,
}

impl<'k> ChainedHashMap<'k, ShallowBytes> {
    /// Map of raw `size`-byte records. Panics if `size` is zero.
    pub fn new_default(size: usize, capacity: usize) -> Result<Self, MapError> {
        Self::new(ShallowBytes::new(size), capacity)
    }
}

impl<'k, D: ValueType> ChainedHashMap<'k, D> {
    pub fn new(ty: D, capacity: usize) -> Result<Self, MapError> {
        Self::with_hasher(ty, capacity, LoseLose)
    }

    pub fn with_key_match(ty: D, capacity: usize, key_match: KeyMatch) -> Result<Self, MapError> {
        Self::with_hasher_and_match(ty, capacity, LoseLose, key_match)
    }
}

impl<'k, D: ValueType, S: KeyHasher> ChainedHashMap<'k, D, S> {
    pub fn with_hasher(ty: D, capacity: usize, hasher: S) -> Result<Self, MapError> {
        Self::with_hasher_and_match(ty, capacity, hasher, KeyMatch::default())
    }

    /// The key match policy is fixed for the map's lifetime: switching it
    /// after insertion could leave two pairs answering to the same key.
    pub fn with_hasher_and_match(
        ty: D,
        capacity: usize,
        hasher: S,
        key_match: KeyMatch,
    ) -> Result<Self, MapError> {
        if capacity == 0 {
            log::warn!("refusing to build a hash map with zero buckets");
            return Err(MapError::ZeroCapacity);
        }
        log::debug!("allocating hash map with {} buckets", capacity);
        Ok(Self {
            slots: Self::empty_slots(capacity),
            ty: Rc::new(ty),
            capacity,
            count: 0,
            hasher,
            key_match,
        })
    }

    fn empty_slots(capacity: usize) -> List<BucketType<'k, D>> {
        let mut slots = List::new(BucketType::new());
        for _ in 0..capacity {
            slots.push_back_stored(List::new(PairType::new()));
        }
        slots
    }

    pub fn key_match(&self) -> KeyMatch {
        self.key_match
    }

    pub fn value_type(&self) -> &D {
        &self.ty
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bucket_index(&self, key: &str) -> usize {
        (self.hasher.hash(key) % self.capacity as u64) as usize
    }

    /// Number of pairs chained in bucket `index`.
    pub fn bucket_len(&self, index: usize) -> Result<usize, MapError> {
        Ok(self.slots.get(index)?.len())
    }

    fn bucket(&self, key: &str) -> &Bucket<'k, D> {
        self.slots
            .get(self.bucket_index(key))
            .expect("bucket index is always below capacity")
    }

    fn bucket_mut(&mut self, key: &str) -> &mut Bucket<'k, D> {
        let index = self.bucket_index(key);
        self.slots
            .get_mut(index)
            .expect("bucket index is always below capacity")
    }

    fn position(bucket: &Bucket<'k, D>, key_match: KeyMatch, key: &str) -> Option<usize> {
        bucket.iter().position(|p| key_match.matches(p.key(), key))
    }

    /// Store a copy of `value` under `key`, releasing any value it replaces.
    pub fn set(&mut self, key: &'k str, value: &D::Source) -> Result<(), MapError> {
        let index = self.bucket_index(key);
        let key_match = self.key_match;
        let bucket = self.slots.get_mut(index)?;
        match Self::position(bucket, key_match, key) {
            Some(pos) => {
                log::debug!("replacing value for {:?} in bucket {}", key, index);
                bucket.get_mut(pos)?.replace(value);
            }
            None => {
                log::trace!("chaining {:?} into bucket {} at depth {}", key, index, bucket.len());
                bucket.push_back_stored(Pair::new(key, value, &self.ty));
                self.count += 1;
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&D::Elem> {
        let bucket = self.bucket(key);
        let pos = Self::position(bucket, self.key_match, key)?;
        bucket.get(pos).ok().map(Pair::value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut D::Elem> {
        let key_match = self.key_match;
        let bucket = self.bucket_mut(key);
        let pos = Self::position(bucket, key_match, key)?;
        bucket.get_mut(pos).ok().map(Pair::value_mut)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        Self::position(self.bucket(key), self.key_match, key).is_some()
    }

    /// Remove `key` and release its value. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let key_match = self.key_match;
        let bucket = self.bucket_mut(key);
        let Some(pos) = Self::position(bucket, key_match, key) else {
            return false;
        };
        bucket
            .remove(pos)
            .expect("position was found in this bucket");
        self.count -= 1;
        true
    }

    /// Remove `key` and hand its value to the caller without releasing it.
    pub fn take(&mut self, key: &str) -> Option<D::Elem> {
        let key_match = self.key_match;
        let bucket = self.bucket_mut(key);
        let pos = Self::position(bucket, key_match, key)?;
        let pair = bucket.pop(pos).expect("position was found in this bucket");
        self.count -= 1;
        Some(pair.into_value())
    }

    /// Release every entry, keeping all buckets allocated.
    pub fn clear(&mut self) {
        for bucket in self.slots.iter_mut() {
            bucket.clear();
        }
        self.count = 0;
    }

    /// Release every entry and the map itself. Equivalent to dropping it.
    pub fn free(self) {
        log::debug!(
            "freeing hash map with {} entries in {} buckets",
            self.count,
            self.capacity
        );
        drop(self);
    }

    /// Entries bucket by bucket, each bucket in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'k str, &D::Elem)> + '_ {
        self.slots
            .iter()
            .flat_map(|bucket| bucket.iter().map(|p| (p.key(), p.value())))
    }
}

impl<'k, D: ValueType, S: KeyHasher + Clone> Clone for ChainedHashMap<'k, D, S> {
    /// Deep copy: every value is duplicated through the shared descriptor;
    /// keys stay borrowed.
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            ty: Rc::clone(&self.ty),
            capacity: self.capacity,
            count: self.count,
            hasher: self.hasher.clone(),
            key_match: self.key_match,
        }
    }
}

impl<'k, D: ValueType, S: KeyHasher> fmt::Debug for ChainedHashMap<'k, D, S>
where
    D::Elem: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::{Owned, Shallow};

    #[test]
    fn zero_capacity_is_rejected() {
        let r = ChainedHashMap::new(Shallow::<i32>::new(), 0);
        assert_eq!(r.err(), Some(MapError::ZeroCapacity));
    }

    #[test]
    fn buckets_are_allocated_eagerly() {
        let m = ChainedHashMap::new(Shallow::<i32>::new(), 5).unwrap();
        assert_eq!(m.capacity(), 5);
        for i in 0..5 {
            assert_eq!(m.bucket_len(i), Ok(0));
        }
        assert_eq!(
            m.bucket_len(5),
            Err(MapError::Bucket(ListError::OutOfRange { index: 5, len: 5 }))
        );
        assert!(m.is_empty());
    }

    #[test]
    fn set_then_get() {
        let mut m = ChainedHashMap::new(Owned::<str>::new(), 4).unwrap();
        m.set("one", "uno").unwrap();
        m.set("two", "dos").unwrap();
        assert_eq!(m.get("one").map(String::as_str), Some("uno"));
        assert_eq!(m.get("two").map(String::as_str), Some("dos"));
        assert_eq!(m.get("three"), None);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let mut m = ChainedHashMap::new(Shallow::<i32>::new(), 8).unwrap();
        m.set("k", &1).unwrap();
        m.set("k", &2).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k"), Some(&2));
        assert_eq!(m.bucket_len(m.bucket_index("k")), Ok(1));
    }

    #[test]
    fn content_match_unifies_distinct_allocations() {
        let a = String::from("key");
        let b = String::from("key");
        let mut m = ChainedHashMap::new(Shallow::<i32>::new(), 8).unwrap();
        m.set(&a, &1).unwrap();
        m.set(&b, &2).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("key"), Some(&2));
    }

    #[test]
    fn identity_match_separates_distinct_allocations() {
        let a = String::from("key");
        let b = String::from("key");
        let mut m =
            ChainedHashMap::with_key_match(Shallow::<i32>::new(), 8, KeyMatch::Identity).unwrap();
        m.set(&a, &1).unwrap();
        m.set(&b, &2).unwrap();
        m.set(&a, &3).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&a), Some(&3));
        assert_eq!(m.get(&b), Some(&2));
        assert_eq!(m.key_match(), KeyMatch::Identity);
    }

    #[test]
    fn remove_and_take() {
        let mut m = ChainedHashMap::new(Owned::<str>::new(), 2).unwrap();
        m.set("a", "1").unwrap();
        m.set("b", "2").unwrap();
        assert!(m.remove("a"));
        assert!(!m.remove("a"));
        assert_eq!(m.take("b"), Some("2".to_string()));
        assert_eq!(m.take("b"), None);
        assert!(m.is_empty());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut m = ChainedHashMap::new(Shallow::<u64>::new(), 3).unwrap();
        m.set("x", &10).unwrap();
        *m.get_mut("x").unwrap() += 5;
        assert_eq!(m.get("x"), Some(&15));
        assert!(m.get_mut("y").is_none());
    }

    #[test]
    fn key_match_is_fixed_at_construction() {
        let a = String::from("key");
        let b = String::from("key");
        let mut m =
            ChainedHashMap::with_key_match(Shallow::<i32>::new(), 4, KeyMatch::Identity).unwrap();
        m.set(&a, &1).unwrap();
        m.set(&b, &2).unwrap();
        assert_eq!(m.len(), 2);

        // Clearing and cloning keep the policy, so a later equal-content key
        // still lands in its own pair.
        let c = m.clone();
        assert_eq!(c.key_match(), KeyMatch::Identity);
        m.clear();
        assert_eq!(m.key_match(), KeyMatch::Identity);
        m.set(&a, &3).unwrap();
        m.set(&b, &4).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.bucket_len(m.bucket_index("key")), Ok(2));

        let d = ChainedHashMap::new(Shallow::<i32>::new(), 4).unwrap();
        assert_eq!(d.key_match(), KeyMatch::Content);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut m = ChainedHashMap::new(Shallow::<i32>::new(), 3).unwrap();
        m.set("a", &1).unwrap();
        m.set("b", &2).unwrap();
        let first = m.slots.get(0).map(|b| b as *const _);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 3);
        assert_eq!(m.slots.len(), 3);
        assert_eq!(m.slots.get(0).map(|b| b as *const _), first);
        for i in 0..3 {
            assert_eq!(m.bucket_len(i), Ok(0));
        }
        assert!(!m.contains_key("a"));
        m.set("a", &3).unwrap();
        assert_eq!(m.get("a"), Some(&3));
    }

    #[test]
    fn default_map_stores_bytes() {
        let mut m = ChainedHashMap::new_default(2, 4).unwrap();
        m.set("p", &[1, 2]).unwrap();
        assert_eq!(m.get("p").map(|b| &b[..]), Some(&[1u8, 2][..]));
        assert_eq!(m.value_type().size(), 2);
    }

    #[test]
    fn clone_duplicates_values() {
        let mut m = ChainedHashMap::new(Owned::<str>::new(), 2).unwrap();
        m.set("a", "x").unwrap();
        let mut c = m.clone();
        c.get_mut("a").unwrap().push('y');
        c.set("b", "z").unwrap();
        assert_eq!(m.get("a").map(String::as_str), Some("x"));
        assert_eq!(c.get("a").map(String::as_str), Some("xy"));
        assert_eq!((m.len(), c.len()), (1, 2));
    }

    #[test]
    fn debug_lists_entries() {
        let mut m = ChainedHashMap::new(Shallow::<i32>::new(), 1).unwrap();
        m.set("a", &1).unwrap();
        m.set("b", &2).unwrap();
        assert_eq!(format!("{:?}", m), r#"{"a": 1, "b": 2}"#);
    }
}
