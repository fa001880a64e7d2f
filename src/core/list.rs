//! Purpose: ABI-stable owned list and borrowed list view.
//! Exports: `List`, `SharedList`.
//! Role: Backing container for every sequence in a `ParserResult` (tokens, nodes, lines, bytes).
//! Invariants: A `List` uniquely owns its allocation; releasing it drops `len` elements in index order, then frees once.
//! Invariants: A `SharedList` never frees anything and cannot outlive the data it borrows.
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;

/// Owned, contiguous, growable sequence laid out as `{ptr, len, capacity}`.
#[repr(C)]
pub struct List<T> {
    ptr: *mut T,
    len: u64,
    capacity: u64,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(Vec::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Borrows element `index`; ownership stays with the list.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` comes from a live Vec with `len` initialised elements.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len()) }
    }

    pub fn push(&mut self, item: T) {
        self.with_vec(|vec| vec.push(item));
    }

    pub fn pop(&mut self) -> Option<T> {
        self.with_vec(|vec| vec.pop())
    }

    /// Non-owning view over the same elements.
    pub fn as_shared(&self) -> SharedList<'_, T> {
        SharedList::from(self.as_slice())
    }

    pub fn into_vec(self) -> Vec<T> {
        let this = ManuallyDrop::new(self);
        // SAFETY: the parts were taken from a Vec in `From<Vec<T>>` and `this` is never dropped.
        unsafe { Vec::from_raw_parts(this.ptr, this.len(), this.capacity()) }
    }

    /// Releases every element in index order, then the backing storage.
    /// Returns the number of elements released.
    pub fn release(self) -> usize {
        let released = self.len();
        drop(self);
        released
    }

    fn with_vec<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut vec = std::mem::take(self).into_vec();
        let out = f(&mut vec);
        *self = Self::from(vec);
        out
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(vec: Vec<T>) -> Self {
        let mut vec = ManuallyDrop::new(vec);
        Self {
            ptr: vec.as_mut_ptr(),
            len: vec.len() as u64,
            capacity: vec.capacity() as u64,
        }
    }
}

impl<T> From<List<T>> for Vec<T> {
    fn from(list: List<T>) -> Self {
        list.into_vec()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        // SAFETY: the parts describe a Vec we own; Vec drops elements front to back.
        drop(unsafe { Vec::from_raw_parts(self.ptr, self.len(), self.capacity()) });
    }
}

impl<T> Deref for List<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        Self::from(self.as_slice().to_vec())
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for List<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowed `{ptr, len}` view. Holders read through it and never release it.
#[repr(C)]
pub struct SharedList<'a, T> {
    ptr: *const T,
    len: u64,
    _owner: PhantomData<&'a [T]>,
}

impl<'a, T> SharedList<'a, T> {
    pub fn empty() -> Self {
        Self::from(&[][..])
    }

    /// Rebuilds a view from raw parts handed in by foreign code.
    ///
    /// # Safety
    /// `ptr` must point to `len` initialised values that stay alive and unmodified for `'a`,
    /// or be null with `len == 0`.
    pub unsafe fn from_raw_parts(ptr: *const T, len: u64) -> Self {
        Self {
            ptr,
            len,
            _owner: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &'a [T] {
        if self.ptr.is_null() {
            return &[];
        }
        // SAFETY: constructed from a slice living for 'a, or promised so by `from_raw_parts`.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len()) }
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.as_slice().get(index)
    }
}

impl<'a, T> From<&'a [T]> for SharedList<'a, T> {
    fn from(slice: &'a [T]) -> Self {
        Self {
            ptr: slice.as_ptr(),
            len: slice.len() as u64,
            _owner: PhantomData,
        }
    }
}

impl<T> Clone for SharedList<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedList<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for SharedList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
