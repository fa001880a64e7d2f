//! Purpose: Discriminated unions with a C-compatible layout.
//! Exports: `Maybe`, `TaggedResult`.
//! Role: Encoding for every optional or either-shaped field (`MaybeLoc`, `DecoderResult`, `ParseOutcome`, ...).
//! Invariants: Layout is `{u8 tag, union payload}`; the tag and payload are always written together.
//! Invariants: Release inspects the tag and drops only the active payload.

/// Optional value. Tag `0` is `Some`, tag `1` is `None`.
#[repr(C, u8)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Maybe<T> {
    Some(T),
    None,
}

impl<T> Maybe<T> {
    pub fn some(value: T) -> Self {
        Maybe::Some(value)
    }

    pub fn none() -> Self {
        Maybe::None
    }

    pub fn is_some(&self) -> bool {
        matches!(self, Maybe::Some(_))
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Maybe::Some(value) => Some(value),
            Maybe::None => None,
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Maybe::Some(value) => Some(value),
            Maybe::None => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Some(value) => Some(value),
            Maybe::None => None,
        }
    }

    /// Moves the payload out, leaving `None` behind.
    pub fn take(&mut self) -> Option<T> {
        std::mem::replace(self, Maybe::None).into_option()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Maybe<U> {
        self.into_option().map(f).into()
    }

    /// No-op for `None`; drops the payload for `Some`.
    pub fn release(self) {
        drop(self)
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Maybe::None
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Maybe::Some(value),
            None => Maybe::None,
        }
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(value: Maybe<T>) -> Self {
        value.into_option()
    }
}

/// Two-variant result. Tag `0` is `Ok`, tag `1` is `Err`.
#[repr(C, u8)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaggedResult<T, E> {
    Ok(T),
    Err(E),
}

impl<T, E> TaggedResult<T, E> {
    pub fn ok(value: T) -> Self {
        TaggedResult::Ok(value)
    }

    pub fn err(error: E) -> Self {
        TaggedResult::Err(error)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TaggedResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn as_result(&self) -> Result<&T, &E> {
        match self {
            TaggedResult::Ok(value) => Ok(value),
            TaggedResult::Err(error) => Err(error),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            TaggedResult::Ok(value) => Ok(value),
            TaggedResult::Err(error) => Err(error),
        }
    }

    /// Drops whichever member is active.
    pub fn release(self) {
        drop(self)
    }
}

impl<T, E> From<Result<T, E>> for TaggedResult<T, E> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => TaggedResult::Ok(value),
            Err(error) => TaggedResult::Err(error),
        }
    }
}

impl<T, E> From<TaggedResult<T, E>> for Result<T, E> {
    fn from(value: TaggedResult<T, E>) -> Self {
        value.into_result()
    }
}
