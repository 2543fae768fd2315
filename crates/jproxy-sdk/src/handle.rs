//! A native-side holder for one foreign object reference

use std::cell::OnceCell;
use std::fmt;

use crate::runtime::ObjectRef;

/// Holds at most one foreign object reference.
///
/// Starts empty and is bound at most once, by the result decoder when a call
/// returns an object. Only the marshaler and the decoder can see or set the
/// reference. The foreign runtime owns the object; the reference is invalid
/// once the runtime reclaims it.
#[derive(Clone, Default)]
pub struct OpaqueHandle {
    raw: OnceCell<ObjectRef>,
}

impl OpaqueHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bound(raw: ObjectRef) -> Self {
        let handle = Self::new();
        handle.bind(raw);
        handle
    }

    /// Bind the reference. A handle that is already bound keeps its first one.
    pub(crate) fn bind(&self, raw: ObjectRef) -> bool {
        self.raw.set(raw).is_ok()
    }

    pub(crate) fn raw(&self) -> Option<ObjectRef> {
        self.raw.get().copied()
    }

    /// Check whether a reference has been bound
    pub fn is_bound(&self) -> bool {
        self.raw.get().is_some()
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueHandle")
            .field("bound", &self.is_bound())
            .finish()
    }
}
