//! Purpose: Owned and borrowed byte buffers with explicit lengths.
//! Exports: `StringPtr`, `Bytes`, `ByteList`, `SharedByteList`.
//! Role: Leaf buffers of the result tree (token values, names, decoded input, error text).
//! Invariants: Length is authoritative; no buffer relies on a NUL terminator.
//! Invariants: Owned buffers free their storage exactly once; shared views never free.
use std::fmt;

use bstr::{BStr, ByteSlice};

use crate::core::list::{List, SharedList};

pub type ByteList = List<u8>;
pub type SharedByteList<'a> = SharedList<'a, u8>;

/// Owned, length-prefixed byte string (`{ptr, len}`), usually but not necessarily UTF-8.
#[repr(C)]
pub struct StringPtr {
    ptr: *mut u8,
    len: u64,
}

impl StringPtr {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr`/`len` come from a boxed slice owned by `self`.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len()) }
    }

    pub fn as_shared(&self) -> SharedByteList<'_> {
        SharedByteList::from(self.as_bytes())
    }

    pub fn to_string_lossy(&self) -> String {
        self.as_bytes().to_str_lossy().into_owned()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let this = std::mem::ManuallyDrop::new(self);
        // SAFETY: reclaims the boxed slice leaked in `From<Vec<u8>>`; `this` is never dropped.
        unsafe { this.take_box() }.into_vec()
    }

    unsafe fn take_box(&self) -> Box<[u8]> {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr, self.len());
        // SAFETY: caller guarantees this runs once for the allocation.
        unsafe { Box::from_raw(slice) }
    }
}

impl Drop for StringPtr {
    fn drop(&mut self) {
        // SAFETY: drop runs once; `into_bytes` skips it.
        drop(unsafe { self.take_box() });
    }
}

impl From<Vec<u8>> for StringPtr {
    fn from(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len() as u64;
        let ptr = Box::into_raw(boxed) as *mut u8;
        Self { ptr, len }
    }
}

impl From<&[u8]> for StringPtr {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

impl From<String> for StringPtr {
    fn from(value: String) -> Self {
        Self::from(value.into_bytes())
    }
}

impl From<&str> for StringPtr {
    fn from(value: &str) -> Self {
        Self::from(value.as_bytes())
    }
}

impl Default for StringPtr {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl Clone for StringPtr {
    fn clone(&self) -> Self {
        Self::from(self.as_bytes())
    }
}

impl PartialEq for StringPtr {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<str> for StringPtr {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for StringPtr {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for StringPtr {}

impl fmt::Debug for StringPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(BStr::new(self.as_bytes()), f)
    }
}

/// Owned token payload. Wraps a `ByteList` so it stays a distinct type at the boundary.
#[repr(C)]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bytes {
    raw: ByteList,
}

impl Bytes {
    pub fn new(raw: Vec<u8>) -> Self {
        Self {
            raw: ByteList::from(raw),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.raw.as_slice()
    }

    pub fn as_shared(&self) -> SharedByteList<'_> {
        self.raw.as_shared()
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw.into_vec()
    }

    pub fn push(&mut self, byte: u8) {
        self.raw.push(byte);
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn to_string_lossy(&self) -> String {
        self.as_raw().to_str_lossy().into_owned()
    }

    pub fn to_utf8(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.as_raw().to_vec())
    }
}

impl From<&str> for Bytes {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(BStr::new(self.as_raw()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteList, Bytes, StringPtr};

    #[test]
    fn string_ptr_keeps_interior_nul() {
        let value = StringPtr::from(vec![b'a', 0, b'b']);
        assert_eq!(value.len(), 3);
        assert_eq!(value.as_bytes(), b"a\0b");
    }

    #[test]
    fn string_ptr_round_trips_through_vec() {
        let value = StringPtr::from("shift_jis");
        assert_eq!(value, "shift_jis");
        assert_eq!(value.into_bytes(), b"shift_jis".to_vec());
    }

    #[test]
    fn empty_string_ptr_is_valid() {
        let value = StringPtr::default();
        assert!(value.is_empty());
        assert_eq!(value.as_bytes(), b"");
        assert_eq!(value.clone(), value);
    }

    #[test]
    fn debug_is_lossy_text() {
        assert_eq!(format!("{:?}", StringPtr::from("abc")), "\"abc\"");
        assert_eq!(format!("{:?}", Bytes::from("tok")), "\"tok\"");
    }

    #[test]
    fn bytes_views_share_storage() {
        let mut bytes = Bytes::from("ab");
        bytes.push(b'c');
        assert_eq!(bytes.as_raw(), b"abc");
        assert_eq!(bytes.as_shared().as_slice().as_ptr(), bytes.as_raw().as_ptr());
        assert_eq!(bytes.to_utf8().expect("utf-8"), "abc");
    }

    #[test]
    fn byte_list_is_a_plain_list() {
        let list = ByteList::from(vec![1, 2]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.release(), 2);
    }
}
