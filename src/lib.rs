//! cboxes: a doubly linked list and a separately chained hash map whose
//! element storage is described by an explicit value descriptor.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one container implementation that stores arbitrary element types,
//!   including types with non-trivial copy/destroy behavior and non-owning
//!   handles, with the storage contract chosen per container instance.
//! - Layers:
//!   - ValueType: the descriptor. Says how a value is sized, copied in and
//!     freed. Concrete strategies: `Shallow`, `ShallowBytes`, `Owned`,
//!     `Reference` and the function-pointer `Descriptor`.
//!   - List<D>: doubly linked list over a slotmap arena; every stored value
//!     went through `D::store` and leaves through `D::free` or `pop`.
//!   - Pair / PairType: bucket entries. Keys are borrowed, values are stored
//!     through the map's descriptor and freed when the pair goes away.
//!   - ChainedHashMap<D, S>: a `List` of bucket `List`s of `Pair`s, routed by
//!     a `KeyHasher` (default `LoseLose`) modulo a fixed capacity.
//!
//! Constraints
//! - Single-threaded: `ChainedHashMap` is `!Send`/`!Sync` through its `Rc`
//!   descriptor; no synchronization anywhere.
//! - Fixed capacity: buckets are allocated up front; no rehashing.
//! - Free exactly once: each stored value is released by its descriptor once,
//!   on removal, replacement, `clear` or drop. Values handed back by `pop`
//!   or `take` are the caller's.
//! - Ownership: `free(self)` consumes the container, so a second free does
//!   not compile.
//!
//! Error policy
//! - Positional misuse is reported as `ListError::IndexError` (empty list,
//!   malformed bounds) or `ListError::OutOfRange` (index >= len).
//! - `MapError` wraps bucket lookup failures and rejects zero capacity.
//! - Descriptor contract violations (zero-sized byte records, length
//!   mismatches) panic.
//!
//! Notes and non-goals
//! - Keys are compared by content by default; `KeyMatch::Identity` compares
//!   string slices by address and length instead.
//! - Positional access reaches head and tail in O(1) and walks from the nearer
//!   end otherwise.
//! - No generic hashing of non-string keys.

mod hash;
mod hash_map;
mod list;
mod list_proptest;
mod pair;
pub mod value_type;

// Public surface
pub use hash::{lose_lose, KeyHasher, LoseLose};
pub use hash_map::{BucketType, ChainedHashMap, KeyMatch, MapError};
pub use list::{Iter, IterMut, List, ListError};
pub use pair::{Pair, PairType};
pub use value_type::{Descriptor, Owned, Ownership, Reference, Shallow, ShallowBytes, ValueType};
