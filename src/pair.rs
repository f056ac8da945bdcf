//! Pair: key/value entry held by hash map buckets.

use crate::value_type::ValueType;
use core::borrow::Borrow;
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use std::rc::Rc;

/// A borrowed key with a value stored through the map's descriptor.
///
/// The key is never duplicated. The value is released through the descriptor
/// exactly once: on `replace` or when the pair is dropped.
pub struct Pair<'k, D: ValueType> {
    key: &'k str,
    value: ManuallyDrop<D::Elem>,
    ty: Rc<D>,
}

impl<'k, D: ValueType> Pair<'k, D> {
    pub fn new(key: &'k str, value: &D::Source, ty: &Rc<D>) -> Self {
        Self {
            key,
            value: ManuallyDrop::new(ty.store(value)),
            ty: Rc::clone(ty),
        }
    }

    pub fn key(&self) -> &'k str {
        self.key
    }

    pub fn value(&self) -> &D::Elem {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut D::Elem {
        &mut self.value
    }

    /// Release the current value and store a copy of `value` in its place.
    pub fn replace(&mut self, value: &D::Source) {
        let stored = self.ty.store(value);
        let old = core::mem::replace(&mut *self.value, stored);
        self.ty.free(old);
    }

    /// Detach the value without releasing it.
    pub fn into_value(self) -> D::Elem {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `value` is taken exactly once and
        // `ty` is dropped exactly once here.
        unsafe {
            core::ptr::drop_in_place(&mut this.ty);
            ManuallyDrop::take(&mut this.value)
        }
    }
}

impl<'k, D: ValueType> Drop for Pair<'k, D> {
    fn drop(&mut self) {
        // SAFETY: `value` is not touched again after drop.
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        self.ty.free(value);
    }
}

impl<'k, D: ValueType> fmt::Debug for Pair<'k, D>
where
    D::Elem: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pair")
            .field("key", &self.key)
            .field("value", &*self.value)
            .finish()
    }
}

/// Descriptor for bucket lists: pairs are copied by duplicating their value
/// through its own descriptor and freed by dropping them.
pub struct PairType<'k, D>(PhantomData<fn() -> Pair<'k, D>>)
where
    D: ValueType;

impl<'k, D: ValueType> PairType<'k, D> {
    pub const fn new() -> Self {
        PairType(PhantomData)
    }
}

impl<'k, D: ValueType> Default for PairType<'k, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k, D: ValueType> Clone for PairType<'k, D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<'k, D: ValueType> ValueType for PairType<'k, D> {
    type Source = Pair<'k, D>;
    type Elem = Pair<'k, D>;

    fn copy(&self, src: &Pair<'k, D>) -> Pair<'k, D> {
        let value = <D::Elem as Borrow<D::Source>>::borrow(&src.value);
        Pair {
            key: src.key,
            value: ManuallyDrop::new(src.ty.store(value)),
            ty: Rc::clone(&src.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::Owned;
    use std::cell::Cell;

    #[derive(Clone, Default)]
    struct Counting {
        copies: Cell<usize>,
        frees: Cell<usize>,
    }

    impl ValueType for Counting {
        type Source = u8;
        type Elem = u8;

        fn copy(&self, src: &u8) -> u8 {
            self.copies.set(self.copies.get() + 1);
            *src
        }

        fn free(&self, _value: u8) {
            self.frees.set(self.frees.get() + 1);
        }
    }

    #[test]
    fn key_is_borrowed_not_copied() {
        let key = String::from("k");
        let ty = Rc::new(Owned::<str>::new());
        let p = Pair::new(&key, "v", &ty);
        assert!(core::ptr::eq(p.key(), key.as_str()));
        assert_eq!(p.value(), "v");
    }

    #[test]
    fn replace_frees_old_value_once() {
        let ty = Rc::new(Counting::default());
        let mut p = Pair::new("k", &1, &ty);
        p.replace(&2);
        assert_eq!(*p.value(), 2);
        assert_eq!(ty.copies.get(), 2);
        assert_eq!(ty.frees.get(), 1);
        drop(p);
        assert_eq!(ty.frees.get(), 2);
    }

    #[test]
    fn into_value_detaches_without_free() {
        let ty = Rc::new(Counting::default());
        let p = Pair::new("k", &9, &ty);
        assert_eq!(Rc::strong_count(&ty), 2);
        assert_eq!(p.into_value(), 9);
        assert_eq!(ty.frees.get(), 0);
        assert_eq!(Rc::strong_count(&ty), 1);
    }

    #[test]
    fn pair_type_copies_through_value_descriptor() {
        let ty = Rc::new(Counting::default());
        let p = Pair::new("k", &3, &ty);
        let q = PairType::new().store(&p);
        assert_eq!(q.key(), "k");
        assert_eq!(*q.value(), 3);
        assert_eq!(ty.copies.get(), 2);
        drop(p);
        drop(q);
        assert_eq!(ty.frees.get(), 2);
    }
}
