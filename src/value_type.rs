//! Value descriptors: how a container stores, duplicates and releases the
//! values it holds.
//!
//! A container is bound to exactly one descriptor for its whole lifetime and
//! routes every insertion through [`ValueType::store`] and every release
//! through [`ValueType::free`]. Containers guarantee `free` runs exactly once
//! per stored value, on removal, replacement or teardown. Values handed back
//! to the caller (`pop`, `take`) are detached and never freed by the
//! container.

use core::borrow::Borrow;
use core::fmt;
use core::marker::PhantomData;

/// Storage strategy of a descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Ownership {
    /// The container holds an independent copy and releases it on free.
    Owned,
    /// The container holds a non-owning handle to caller memory; the target is
    /// never duplicated and never released by the container.
    Borrowed,
}

/// Describes how one semantic type is stored in a container.
///
/// `copy` and `free` must be mutually consistent: whatever `copy` acquires,
/// `free` releases.
pub trait ValueType {
    /// Form the caller hands to the container on insertion.
    type Source: ?Sized;
    /// Form the container holds once the value has been copied in.
    type Elem: Borrow<Self::Source>;

    /// Per-element footprint when stored by value.
    fn size(&self) -> usize {
        core::mem::size_of::<Self::Elem>()
    }

    fn ownership(&self) -> Ownership {
        Ownership::Owned
    }

    #[inline]
    fn is_reference(&self) -> bool {
        self.ownership() == Ownership::Borrowed
    }

    /// Duplicate `src` into a value the container may hold.
    fn copy(&self, src: &Self::Source) -> Self::Elem;

    /// Release one stored value.
    fn free(&self, value: Self::Elem) {
        drop(value);
    }

    /// Produce a newly owned value suitable for insertion into a container.
    #[inline]
    fn store(&self, src: &Self::Source) -> Self::Elem {
        log::trace!(
            "storing {} value of {} bytes",
            if self.is_reference() { "borrowed" } else { "owned" },
            self.size()
        );
        self.copy(src)
    }
}

/// Bytewise duplicate of `Copy` values; free simply drops the duplicate.
pub struct Shallow<T>(PhantomData<fn() -> T>);

impl<T> Shallow<T> {
    pub const fn new() -> Self {
        Shallow(PhantomData)
    }
}

impl<T> Default for Shallow<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Shallow<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Shallow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shallow")
            .field("size", &core::mem::size_of::<T>())
            .finish()
    }
}

impl<T: Copy> ValueType for Shallow<T> {
    type Source = T;
    type Elem = T;

    #[inline]
    fn copy(&self, src: &T) -> T {
        *src
    }
}

/// Fixed-size raw byte records. Backs every `new_default(size)` constructor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShallowBytes {
    size: usize,
}

impl ShallowBytes {
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size != 0, "ShallowBytes: element size must be non-zero");
        Self { size }
    }
}

impl ValueType for ShallowBytes {
    type Source = [u8];
    type Elem = Box<[u8]>;

    fn size(&self) -> usize {
        self.size
    }

    /// Panics if `src` is not exactly `size` bytes long.
    fn copy(&self, src: &[u8]) -> Box<[u8]> {
        assert_eq!(
            src.len(),
            self.size,
            "ShallowBytes: source length does not match element size"
        );
        Box::from(src)
    }
}

/// Owned duplicates of types with non-trivial copy/destroy behavior, e.g.
/// `Owned<str>` stores `String`s.
pub struct Owned<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> Owned<T> {
    pub const fn new() -> Self {
        Owned(PhantomData)
    }
}

impl<T: ?Sized> Default for Owned<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Owned")
    }
}

impl<T: ?Sized + ToOwned> ValueType for Owned<T> {
    type Source = T;
    type Elem = T::Owned;

    #[inline]
    fn copy(&self, src: &T) -> T::Owned {
        src.to_owned()
    }
}

/// Borrowing handles into caller-owned memory.
///
/// Stored values are the references themselves: the target is shared with
/// the caller, so interior mutation through a stored handle is visible to
/// the owner. `free` is a no-op.
pub struct Reference<'a, T: ?Sized>(PhantomData<&'a T>);

impl<'a, T: ?Sized> Reference<'a, T> {
    pub const fn new() -> Self {
        Reference(PhantomData)
    }
}

impl<'a, T: ?Sized> Default for Reference<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized> Clone for Reference<'a, T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized> fmt::Debug for Reference<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reference")
    }
}

impl<'a, T: ?Sized> ValueType for Reference<'a, T> {
    type Source = &'a T;
    type Elem = &'a T;

    fn ownership(&self) -> Ownership {
        Ownership::Borrowed
    }

    #[inline]
    fn copy(&self, src: &&'a T) -> &'a T {
        *src
    }

    #[inline]
    fn free(&self, _value: &'a T) {}
}

/// Caller-supplied descriptor assembled from `(size, is_reference, copy, free)`.
///
/// With `is_reference` set, `copy` must produce a handle to the caller's value
/// rather than a duplicate of it, and `free` is never called: the container
/// just drops the handle.
pub struct Descriptor<S: ?Sized, E> {
    size: usize,
    ownership: Ownership,
    copy: fn(&S) -> E,
    free: fn(E),
}

impl<S: ?Sized, E> Descriptor<S, E> {
    pub fn new(size: usize, is_reference: bool, copy: fn(&S) -> E, free: fn(E)) -> Self {
        let ownership = if is_reference {
            Ownership::Borrowed
        } else {
            Ownership::Owned
        };
        Self {
            size,
            ownership,
            copy,
            free,
        }
    }
}

impl<S: ?Sized, E> Clone for Descriptor<S, E> {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            ownership: self.ownership,
            copy: self.copy,
            free: self.free,
        }
    }
}

impl<S: ?Sized, E> fmt::Debug for Descriptor<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("size", &self.size)
            .field("ownership", &self.ownership)
            .finish()
    }
}

impl<S: ?Sized, E: Borrow<S>> ValueType for Descriptor<S, E> {
    type Source = S;
    type Elem = E;

    fn size(&self) -> usize {
        self.size
    }

    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn copy(&self, src: &S) -> E {
        (self.copy)(src)
    }

    fn free(&self, value: E) {
        match self.ownership {
            Ownership::Owned => (self.free)(value),
            Ownership::Borrowed => drop(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn shallow_copies_are_independent() {
        let ty = Shallow::<u32>::new();
        let mut src = 7u32;
        let stored = ty.store(&src);
        src = 9;
        assert_eq!(stored, 7);
        assert_eq!(src, 9);
        assert_eq!(ty.size(), 4);
        assert!(!ty.is_reference());
    }

    #[test]
    fn shallow_bytes_duplicates_exactly_size_bytes() {
        let ty = ShallowBytes::new(3);
        let stored = ty.store(&[1, 2, 3]);
        assert_eq!(&*stored, &[1, 2, 3]);
        assert_eq!(ty.size(), 3);
    }

    #[test]
    #[should_panic(expected = "element size must be non-zero")]
    fn shallow_bytes_rejects_zero_size() {
        let _ = ShallowBytes::new(0);
    }

    #[test]
    #[should_panic(expected = "source length does not match")]
    fn shallow_bytes_rejects_wrong_length() {
        let ty = ShallowBytes::new(4);
        let _ = ty.store(&[1, 2]);
    }

    #[test]
    fn owned_str_stores_string() {
        let ty = Owned::<str>::new();
        let s: String = ty.store("hello");
        assert_eq!(s, "hello");
        assert_eq!(ty.ownership(), Ownership::Owned);
    }

    #[test]
    fn reference_shares_target() {
        let cell = Cell::new(1);
        let ty = Reference::<Cell<i32>>::new();
        let stored = ty.store(&&cell);
        stored.set(5);
        assert_eq!(cell.get(), 5);
        assert!(ty.is_reference());
        ty.free(stored);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn descriptor_from_fns() {
        fn copy(v: &i64) -> i64 {
            *v * 2
        }
        fn free(_: i64) {}
        let ty = Descriptor::new(8, false, copy, free);
        assert_eq!(ty.store(&21), 42);
        assert_eq!(ty.size(), 8);
        assert!(!ty.is_reference());
    }

    thread_local! {
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    fn handle(v: &std::rc::Rc<str>) -> std::rc::Rc<str> {
        std::rc::Rc::clone(v)
    }

    fn count_free(_: std::rc::Rc<str>) {
        FREED.with(|n| n.set(n.get() + 1));
    }

    #[test]
    fn descriptor_in_reference_mode_never_frees() {
        use std::rc::Rc;
        let target: Rc<str> = Rc::from("shared");
        let ty = Descriptor::new(core::mem::size_of::<Rc<str>>(), true, handle, count_free);
        assert_eq!(ty.ownership(), Ownership::Borrowed);

        let handle = ty.store(&target);
        assert!(Rc::ptr_eq(&handle, &target));
        assert_eq!(Rc::strong_count(&target), 2);
        ty.free(handle);
        assert_eq!(FREED.with(Cell::get), 0);
        assert_eq!(Rc::strong_count(&target), 1);

        let owned = Descriptor::new(core::mem::size_of::<Rc<str>>(), false, self::handle, count_free);
        owned.free(owned.store(&target));
        assert_eq!(FREED.with(Cell::get), 1);
    }
}
