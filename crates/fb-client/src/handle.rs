//! Single-owner wrappers around native handles.
//!
//! An [`Owned`] handle is released exactly once: either explicitly through
//! [`Owned::release`], which reports failure and keeps the handle so the
//! caller may retry, or implicitly on drop, which logs failure. Dropping a
//! released or null handle does nothing.

use std::sync::Arc;

use fb_protocol::StatusVector;

use crate::library::{ClientLibrary, DbHandle, StmtHandle, SvcHandle};

/// A native handle type that can be released through the library.
pub(crate) trait NativeHandle: Copy + std::fmt::Display {
    /// The null value of this handle type.
    const NULL: Self;

    fn is_null(self) -> bool;

    fn release_with(self, library: &dyn ClientLibrary) -> Result<(), StatusVector>;
}

impl NativeHandle for DbHandle {
    const NULL: Self = DbHandle::NULL;

    fn is_null(self) -> bool {
        DbHandle::is_null(self)
    }

    fn release_with(self, library: &dyn ClientLibrary) -> Result<(), StatusVector> {
        library.detach_database(self)
    }
}

impl NativeHandle for StmtHandle {
    const NULL: Self = StmtHandle::NULL;

    fn is_null(self) -> bool {
        StmtHandle::is_null(self)
    }

    fn release_with(self, library: &dyn ClientLibrary) -> Result<(), StatusVector> {
        library.free_statement(self)
    }
}

impl NativeHandle for SvcHandle {
    const NULL: Self = SvcHandle::NULL;

    fn is_null(self) -> bool {
        SvcHandle::is_null(self)
    }

    fn release_with(self, library: &dyn ClientLibrary) -> Result<(), StatusVector> {
        library.service_detach(self)
    }
}

/// Exclusive owner of one native handle.
pub(crate) struct Owned<H: NativeHandle> {
    library: Arc<dyn ClientLibrary>,
    handle: H,
}

/// An owned database attachment.
pub(crate) type Attachment = Owned<DbHandle>;

impl<H: NativeHandle> Owned<H> {
    pub(crate) fn new(library: Arc<dyn ClientLibrary>, handle: H) -> Self {
        Self { library, handle }
    }

    pub(crate) fn get(&self) -> H {
        self.handle
    }

    pub(crate) fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub(crate) fn library(&self) -> &Arc<dyn ClientLibrary> {
        &self.library
    }

    /// Release the handle now. On failure the handle is kept.
    pub(crate) fn release(&mut self) -> Result<(), StatusVector> {
        if self.handle.is_null() {
            return Ok(());
        }
        self.handle.release_with(self.library.as_ref())?;
        self.handle = H::NULL;
        Ok(())
    }

    /// Give up ownership without releasing (the library already did).
    pub(crate) fn forget(&mut self) {
        self.handle = H::NULL;
    }
}

impl<H: NativeHandle> Drop for Owned<H> {
    fn drop(&mut self) {
        let handle = self.handle;
        if let Err(status) = self.release() {
            tracing::warn!(%handle, error = %status, "failed to release native handle on drop");
        }
    }
}

impl<H: NativeHandle> std::fmt::Debug for Owned<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owned").field("handle", &format_args!("{}", self.handle)).finish()
    }
}
