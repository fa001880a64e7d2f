//! Purpose: Opaque, layout-stable storage for values whose representation stays private.
//! Exports: `Blob`.
//! Role: Lets enums such as `NodeKind` and `DiagnosticMessage` cross the C boundary as plain bytes.
//! Invariants: `Blob<T>` has exactly the size and alignment of `T`.
//! Invariants: A blob is consumed by exactly one of `unpack` or release (drop), never both.
use std::fmt;
use std::mem::{self, ManuallyDrop, MaybeUninit};

/// A value of `T` held behind an opaque byte region.
///
/// Foreign code sees only `SIZE` bytes aligned to `ALIGN`; it may move the region
/// around but must hand it back to this crate to read or release it.
#[repr(transparent)]
pub struct Blob<T> {
    value: MaybeUninit<T>,
}

impl<T> Blob<T> {
    pub const SIZE: usize = mem::size_of::<T>();
    pub const ALIGN: usize = mem::align_of::<T>();

    /// Moves `value` into a new blob.
    pub fn pack(value: T) -> Self {
        Self {
            value: MaybeUninit::new(value),
        }
    }

    /// Moves the value back out. The blob is consumed and nothing is left to release.
    pub fn unpack(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: every constructor initialises `value`, and `this` is never dropped,
        // so the value is read out exactly once.
        unsafe { this.value.assume_init_read() }
    }

    pub fn get(&self) -> &T {
        // SAFETY: `value` is initialised for the whole life of the blob.
        unsafe { self.value.assume_init_ref() }
    }

    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: as in `get`.
        unsafe { self.value.assume_init_mut() }
    }

    /// Runs the value's own release logic in place.
    pub fn release(self) {
        drop(self)
    }
}

impl<T> Drop for Blob<T> {
    fn drop(&mut self) {
        // SAFETY: initialised since construction; `unpack` bypasses this via ManuallyDrop.
        unsafe { self.value.assume_init_drop() }
    }
}

impl<T: Clone> Clone for Blob<T> {
    fn clone(&self) -> Self {
        Self::pack(self.get().clone())
    }
}

impl<T: PartialEq> PartialEq for Blob<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: Eq> Eq for Blob<T> {}

impl<T: fmt::Debug> fmt::Debug for Blob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}
