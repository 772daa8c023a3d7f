use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

/// Alignment of every non-empty buffer handed out by this module.
pub const BUFFER_ALIGN: usize = 64;

/// A capability that hands out zero-initialized, sized memory regions.
///
/// The returned buffer is owned by the caller and released when it is dropped.
/// Implementations must be thread-safe (`Sync`): frontiers for different tables
/// may be sized and allocated from several threads.
pub trait FrontierAllocator: Sync {
    /// Allocates `size_bytes` bytes of zeroed memory.
    ///
    /// # Errors
    /// Returns `AllocError` if the region cannot be provided.
    fn allocate(&self, size_bytes: usize) -> Result<MemoryBuffer, AllocError>;
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    requested: usize,
}

impl AllocError {
    /// Creates an error for a failed request of `requested` bytes.
    pub const fn new(requested: usize) -> Self {
        Self { requested }
    }

    /// Size of the request that failed.
    pub const fn requested(&self) -> usize {
        self.requested
    }
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "memory allocation of {} bytes failed", self.requested)
    }
}

impl std::error::Error for AllocError {}

/// An owned, zero-initialized memory region.
///
/// The region is freed when the buffer is dropped.
pub struct MemoryBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: the buffer exclusively owns its region; shared access only goes through
// atomic views.
unsafe impl Send for MemoryBuffer {}
unsafe impl Sync for MemoryBuffer {}

impl MemoryBuffer {
    /// Allocates a zeroed region of `size` bytes from the global allocator.
    ///
    /// # Errors
    /// Returns `AllocError` if the layout is invalid or the global allocator fails.
    pub fn zeroed(size: usize) -> Result<Self, AllocError> {
        let layout =
            Layout::from_size_align(size, BUFFER_ALIGN).map_err(|_| AllocError::new(size))?;
        if size == 0 {
            return Ok(Self {
                ptr: NonNull::<u64>::dangling().cast(),
                layout,
            });
        }
        // SAFETY: layout has non-zero size.
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        NonNull::new(raw)
            .map(|ptr| Self { ptr, layout })
            .ok_or(AllocError::new(size))
    }

    /// Size of the region in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Returns `true` if the region is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Views the region as a slice of `AtomicU16` entries.
    ///
    /// A trailing odd byte is not part of the view.
    #[inline(always)]
    pub fn as_atomic_u16(&self) -> &[AtomicU16] {
        let len = self.len() / core::mem::size_of::<AtomicU16>();
        // SAFETY: the pointer is aligned to at least 8 bytes, the region is initialized
        // (zeroed) and lives as long as `self`; `AtomicU16` has no invalid bit patterns.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().cast::<AtomicU16>(), len) }
    }
}

impl Drop for MemoryBuffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl core::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryBuffer").field("len", &self.len()).finish()
    }
}

/// Allocator backed by the process-global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl FrontierAllocator for SystemAllocator {
    fn allocate(&self, size_bytes: usize) -> Result<MemoryBuffer, AllocError> {
        MemoryBuffer::zeroed(size_bytes)
    }
}

/// Allocator with a fixed lifetime byte budget.
///
/// Every successful allocation is charged against the budget; dropping a buffer
/// does not refund it. Useful for bounding the memory of one query.
#[derive(Debug)]
pub struct BudgetAllocator {
    remaining: AtomicUsize,
}

impl BudgetAllocator {
    /// Creates an allocator that hands out at most `budget` bytes in total.
    pub const fn new(budget: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(budget),
        }
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

impl FrontierAllocator for BudgetAllocator {
    fn allocate(&self, size_bytes: usize) -> Result<MemoryBuffer, AllocError> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(size_bytes))
            .map_err(|_| AllocError::new(size_bytes))?;
        MemoryBuffer::zeroed(size_bytes)
    }
}
