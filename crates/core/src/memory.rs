//! Aligned model memory
//!
//! The sandboxed inference runtime requires model payloads at
//! kind-specific alignments (see [`crate::model::FileKind::alignment`]).
//! [`AlignedBuf`] owns a heap allocation at an explicit alignment; the
//! bytes are copied in once and the buffer is immutable afterwards.

use std::alloc::{self, Layout};
use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;

/// An immutable byte buffer with a guaranteed start alignment.
pub struct AlignedBuf {
    ptr: NonNull<u8>,
    len: usize,
    layout: Option<Layout>,
}

// The buffer has a single owner and is never aliased mutably.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

impl AlignedBuf {
    /// Copy `data` into a fresh allocation aligned to `align` bytes.
    ///
    /// `align` must be a power of two. Allocation failure aborts via the
    /// global allocation error handler, as is conventional for buffer
    /// types.
    pub fn from_slice(data: &[u8], align: usize) -> Self {
        assert!(align.is_power_of_two(), "alignment must be a power of two");

        if data.is_empty() {
            return Self {
                ptr: NonNull::dangling(),
                len: 0,
                layout: None,
            };
        }

        let layout = match Layout::from_size_align(data.len(), align) {
            Ok(layout) => layout,
            Err(_) => panic!("invalid layout: {} bytes @ {}", data.len(), align),
        };

        // SAFETY: layout has non-zero size; the copy stays within the
        // freshly allocated region.
        unsafe {
            let raw = alloc::alloc(layout);
            let Some(ptr) = NonNull::new(raw) else {
                alloc::handle_alloc_error(layout);
            };
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len());
            Self {
                ptr,
                len: data.len(),
                layout: Some(layout),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alignment this buffer was allocated with (1 for empty buffers).
    pub fn alignment(&self) -> usize {
        self.layout.map(|l| l.align()).unwrap_or(1)
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/len describe the owned allocation (or a dangling
        // pointer with len 0, which is a valid empty slice).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: allocated in from_slice with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) }
        }
    }
}

impl fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish()
    }
}
