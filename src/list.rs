//! List: doubly linked sequence of values stored through a single `ValueType`.
//!
//! Nodes live in a generational arena and link to each other by key, so the
//! structure never aliases raw pointers. The first and last positions are
//! reached in O(1); any other position is reached by walking from the nearer
//! end.

use crate::value_type::{ShallowBytes, ValueType};
use core::borrow::Borrow;
use core::fmt;
use core::ops::Range;
use slotmap::{DefaultKey, SlotMap};

/// Failure of a positional operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ListError {
    /// Structural misuse: the list is empty or the bounds are malformed.
    IndexError,
    /// `index` is past the last element.
    OutOfRange { index: usize, len: usize },
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::IndexError => f.write_str("index error: no element at the requested position"),
            ListError::OutOfRange { index, len } => {
                write!(f, "index {} out of range for list of length {}", index, len)
            }
        }
    }
}

impl std::error::Error for ListError {}

#[derive(Debug)]
struct Node<E> {
    next: Option<DefaultKey>,
    prev: Option<DefaultKey>,
    value: E,
}

pub struct List<D: ValueType> {
    nodes: SlotMap<DefaultKey, Node<D::Elem>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    ty: D,
}

impl List<ShallowBytes> {
    /// Empty list of raw `size`-byte records. Panics if `size` is zero.
    pub fn new_default(size: usize) -> Self {
        Self::new(ShallowBytes::new(size))
    }
}

impl<D: ValueType> List<D> {
    pub fn new(ty: D) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
            ty,
        }
    }

    pub fn value_type(&self) -> &D {
        &self.ty
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_in_range(&self, index: usize) -> bool {
        index < self.len()
    }

    fn check(&self, index: usize) -> Result<(), ListError> {
        if self.is_empty() {
            Err(ListError::IndexError)
        } else if index >= self.len() {
            Err(ListError::OutOfRange {
                index,
                len: self.len(),
            })
        } else {
            Ok(())
        }
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), ListError> {
        if self.is_empty() || range.start > range.end {
            Err(ListError::IndexError)
        } else if range.end > self.len() {
            Err(ListError::OutOfRange {
                index: range.end,
                len: self.len(),
            })
        } else {
            Ok(())
        }
    }

    fn locate(&self, index: usize) -> Result<DefaultKey, ListError> {
        self.check(index)?;
        let last = self.len() - 1;
        if index == 0 {
            return Ok(self.head.expect("non-empty list has a head"));
        }
        if index == last {
            return Ok(self.tail.expect("non-empty list has a tail"));
        }

        if index <= last / 2 {
            let mut k = self.head.expect("non-empty list has a head");
            for _ in 0..index {
                k = self.nodes[k].next.expect("interior node has a successor");
            }
            Ok(k)
        } else {
            let mut k = self.tail.expect("non-empty list has a tail");
            for _ in index..last {
                k = self.nodes[k].prev.expect("interior node has a predecessor");
            }
            Ok(k)
        }
    }

    pub(crate) fn push_back_stored(&mut self, value: D::Elem) {
        let key = self.nodes.insert(Node {
            next: None,
            prev: self.tail,
            value,
        });
        match self.tail {
            Some(t) => self.nodes[t].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
    }

    pub(crate) fn push_front_stored(&mut self, value: D::Elem) {
        let key = self.nodes.insert(Node {
            next: self.head,
            prev: None,
            value,
        });
        match self.head {
            Some(h) => self.nodes[h].prev = Some(key),
            None => self.tail = Some(key),
        }
        self.head = Some(key);
    }

    // Link a new node immediately before `at`.
    fn link_before(&mut self, at: DefaultKey, value: D::Elem) {
        let prev = self.nodes[at].prev;
        let key = self.nodes.insert(Node {
            next: Some(at),
            prev,
            value,
        });
        self.nodes[at].prev = Some(key);
        match prev {
            Some(p) => self.nodes[p].next = Some(key),
            None => self.head = Some(key),
        }
    }

    fn unlink(&mut self, key: DefaultKey) -> D::Elem {
        let node = self
            .nodes
            .remove(key)
            .expect("linked key refers to a live node");
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        node.value
    }

    /// Append a copy of `value`.
    pub fn push_back(&mut self, value: &D::Source) {
        let stored = self.ty.store(value);
        self.push_back_stored(stored);
    }

    /// Prepend a copy of `value`.
    pub fn push_front(&mut self, value: &D::Source) {
        let stored = self.ty.store(value);
        self.push_front_stored(stored);
    }

    pub fn get(&self, index: usize) -> Result<&D::Elem, ListError> {
        let k = self.locate(index)?;
        Ok(&self.nodes[k].value)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut D::Elem, ListError> {
        let k = self.locate(index)?;
        Ok(&mut self.nodes[k].value)
    }

    /// Insert a copy of `value` before the element currently at `index`.
    ///
    /// Fails under the same conditions as [`List::get`]; appending past the
    /// end is done with [`List::push_back`].
    pub fn insert(&mut self, index: usize, value: &D::Source) -> Result<(), ListError> {
        let at = self.locate(index)?;
        let stored = self.ty.store(value);
        self.link_before(at, stored);
        Ok(())
    }

    /// Detach the element at `index` and hand it to the caller.
    pub fn pop(&mut self, index: usize) -> Result<D::Elem, ListError> {
        let k = self.locate(index)?;
        Ok(self.unlink(k))
    }

    /// Detach the element at `index` and release it through the descriptor.
    pub fn remove(&mut self, index: usize) -> Result<(), ListError> {
        let value = self.pop(index)?;
        self.ty.free(value);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<D::Elem> {
        let k = self.head?;
        Some(self.unlink(k))
    }

    pub fn pop_back(&mut self) -> Option<D::Elem> {
        let k = self.tail?;
        Some(self.unlink(k))
    }

    /// Append copies of every value, in order.
    pub fn extend_back<'s, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'s D::Source>,
        D::Source: 's,
    {
        for v in values {
            self.push_back(v);
        }
    }

    /// Prepend copies of every value; the block keeps its iteration order.
    pub fn extend_front<'s, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'s D::Source>,
        D::Source: 's,
    {
        match self.head {
            Some(anchor) => {
                for v in values {
                    let stored = self.ty.store(v);
                    self.link_before(anchor, stored);
                }
            }
            None => self.extend_back(values),
        }
    }

    /// Insert copies of every value before the element at `index`, keeping
    /// their iteration order.
    pub fn extend_insert<'s, I>(&mut self, index: usize, values: I) -> Result<(), ListError>
    where
        I: IntoIterator<Item = &'s D::Source>,
        D::Source: 's,
    {
        let at = self.locate(index)?;
        for v in values {
            let stored = self.ty.store(v);
            self.link_before(at, stored);
        }
        Ok(())
    }

    /// Detach the half-open `range` of positions, in order.
    pub fn pop_range(&mut self, range: Range<usize>) -> Result<Vec<D::Elem>, ListError> {
        self.check_range(&range)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut cursor = Some(self.locate(range.start)?);
        let mut out = Vec::with_capacity(range.len());
        for _ in range {
            let k = cursor.expect("range end lies within the list");
            cursor = self.nodes[k].next;
            out.push(self.unlink(k));
        }
        Ok(out)
    }

    /// Detach and release the half-open `range` of positions.
    pub fn free_range(&mut self, range: Range<usize>) -> Result<(), ListError> {
        for v in self.pop_range(range)? {
            self.ty.free(v);
        }
        Ok(())
    }

    /// Release every value, head to tail.
    pub fn clear(&mut self) {
        let mut cursor = self.head.take();
        self.tail = None;
        while let Some(k) = cursor {
            let node = self
                .nodes
                .remove(k)
                .expect("linked key refers to a live node");
            cursor = node.next;
            self.ty.free(node.value);
        }
        debug_assert!(self.nodes.is_empty());
    }

    /// Release every value and the list itself. Equivalent to dropping it.
    pub fn free(self) {
        log::debug!("freeing list of {} values", self.len());
        drop(self);
    }

    pub fn iter(&self) -> Iter<'_, D::Elem> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    /// Head-to-tail traversal yielding mutable access to each stored value.
    pub fn iter_mut(&mut self) -> IterMut<'_, D::Elem> {
        IterMut {
            front: self.head,
            back: self.tail,
            remaining: self.len(),
            nodes: &mut self.nodes,
        }
    }
}

impl<D: ValueType> Drop for List<D> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<D: ValueType + Clone> Clone for List<D> {
    /// Deep copy: every value is duplicated through the descriptor.
    fn clone(&self) -> Self {
        let mut out = List::new(self.ty.clone());
        for v in self.iter() {
            out.push_back_stored(self.ty.store(<D::Elem as Borrow<D::Source>>::borrow(v)));
        }
        out
    }
}

impl<D: ValueType> fmt::Debug for List<D>
where
    D::Elem: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, D: ValueType> IntoIterator for &'a List<D> {
    type Item = &'a D::Elem;
    type IntoIter = Iter<'a, D::Elem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Head-to-tail traversal; also walks backward from the tail.
pub struct Iter<'a, E> {
    nodes: &'a SlotMap<DefaultKey, Node<E>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, E> DoubleEndedIterator for Iter<'a, E> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<'a, E> ExactSizeIterator for Iter<'a, E> {}

pub struct IterMut<'a, E> {
    nodes: &'a mut SlotMap<DefaultKey, Node<E>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, E> IterMut<'a, E> {
    fn yield_node(&mut self, key: DefaultKey) -> &'a mut Node<E> {
        let node: *mut Node<E> = &mut self.nodes[key];
        self.remaining -= 1;
        // SAFETY: `remaining` bounds the walk so each live key is yielded at
        // most once, and the arena is exclusively borrowed for `'a` without
        // inserting or removing nodes, so the returned borrows are disjoint.
        unsafe { &mut *node }
    }
}

impl<'a, E> Iterator for IterMut<'a, E> {
    type Item = &'a mut E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.yield_node(self.front?);
        self.front = node.next;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, E> DoubleEndedIterator for IterMut<'a, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.yield_node(self.back?);
        self.back = node.prev;
        Some(&mut node.value)
    }
}

impl<'a, E> ExactSizeIterator for IterMut<'a, E> {}
