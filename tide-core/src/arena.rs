//! Arena-based bump allocator for `no_std` environments.
//!
//! Every structure of a [`MatchingGraph`](crate::MatchingGraph) and its
//! [`RegionArena`](crate::RegionArena) is carved out of one caller-provided
//! byte buffer. The graph is built once and then reused across many decoding
//! runs, so nothing is ever freed individually: the buffer is released as a
//! whole when the caller drops it.
//!
//! # Usage Pattern
//!
//! ```ignore
//! let size = required_buffer_size(num_nodes, edges.len(), region_capacity);
//! let mut buffer = vec![0u8; size];
//! let mut arena = Arena::new(&mut buffer);
//!
//! let weights = arena.alloc_slice::<u32>(num_slots, 0)?;
//! let dirty = arena.alloc_slice_aligned::<u64>(num_words, 64, 0)?;
//! ```
//!
//! Unlike a general allocator, every slice is initialized with a fill value
//! before it is handed out, so any `Copy` type can live in the arena.

use core::mem::{align_of, size_of};

use crate::error::FloodError;
use crate::flooder::detector_node::DetectorNode;
use crate::flooder::region::GraphFillRegion;
use crate::flooder::types::{NodeIdx, ObsMask, Weight};

/// Calculates a buffer size large enough for [`GraphBuilder::build`](crate::GraphBuilder::build).
///
/// The estimate is conservative: it assumes every edge is internal (and
/// therefore stored twice in the adjacency lists) and adds worst-case
/// alignment padding to every allocation.
///
/// # Arguments
///
/// * `num_nodes` - Number of detector nodes.
/// * `num_edges` - Number of entries in the edge list (boundary edges included).
/// * `region_capacity` - Number of region slots in the region pool.
///
/// # Example
///
/// ```
/// use tide_core::required_buffer_size;
///
/// let small = required_buffer_size(16, 24, 16);
/// let large = required_buffer_size(1024, 2048, 1024);
/// assert!(large > small);
/// ```
#[must_use]
pub const fn required_buffer_size(
    num_nodes: usize,
    num_edges: usize,
    region_capacity: usize,
) -> usize {
    // Each allocation has up to 63 bytes of alignment padding (for 64-byte alignment)
    const ALIGN_PAD: usize = 64;
    let adjacency_slots = num_edges * 2;

    let mut total = 0;

    // nodes
    total += num_nodes * size_of::<DetectorNode<'static>>() + ALIGN_PAD;
    // CSR offsets (u32, num_nodes + 1)
    total += (num_nodes + 1) * size_of::<u32>() + ALIGN_PAD;
    // neighbor list
    total += adjacency_slots * size_of::<NodeIdx>() + ALIGN_PAD;
    // per-slot weights
    total += adjacency_slots * size_of::<Weight>() + ALIGN_PAD;
    // per-slot observables
    total += adjacency_slots * size_of::<ObsMask>() + ALIGN_PAD;
    // dirty mask
    total += num_nodes.div_ceil(64) * size_of::<u64>() + ALIGN_PAD;
    // region slots
    total += region_capacity * size_of::<GraphFillRegion>() + ALIGN_PAD;
    // region free list
    total += region_capacity * size_of::<u32>() + ALIGN_PAD;

    total
}

/// A bump allocator that manages a pre-allocated byte buffer.
///
/// # Memory Layout
///
/// ```text
/// Buffer: [====allocated====|----available----|]
///         ^                 ^                  ^
///         base              offset             end
/// ```
///
/// Each allocation advances the offset, with padding added for alignment.
///
/// # Thread Safety
///
/// The arena is not thread-safe. Build one graph per thread from separate buffers.
pub struct Arena<'a> {
    /// The underlying byte buffer from which memory is allocated.
    buffer: &'a mut [u8],
    /// Current allocation offset within the buffer.
    offset: usize,
}

impl<'a> Arena<'a> {
    /// Creates a new arena backed by the given buffer.
    ///
    /// Use [`required_buffer_size`] to size the buffer for a graph.
    #[must_use]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Bytes handed out so far, padding included.
    #[inline]
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes left in the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Allocates `len` elements with natural alignment, each set to `fill`.
    ///
    /// # Errors
    ///
    /// [`FloodError::ArenaExhausted`] if the buffer cannot hold the slice.
    #[inline]
    pub fn alloc_slice<T: Copy>(&mut self, len: usize, fill: T) -> Result<&'a mut [T], FloodError> {
        self.alloc_slice_aligned(len, align_of::<T>(), fill)
    }

    /// Allocates `len` elements aligned to at least `align` bytes, each set to `fill`.
    ///
    /// Hot per-node arrays are allocated on 64-byte boundaries so the first
    /// element starts a cache line.
    ///
    /// # Alignment Calculation
    ///
    /// ```text
    /// current_ptr = base + offset
    /// padding = (align - (current_ptr % align)) % align
    /// new_offset = offset + padding
    /// ```
    ///
    /// # Errors
    ///
    /// [`FloodError::ArenaExhausted`] if the buffer cannot hold the slice and
    /// its padding.
    pub fn alloc_slice_aligned<T: Copy>(
        &mut self,
        len: usize,
        align: usize,
        fill: T,
    ) -> Result<&'a mut [T], FloodError> {
        let t_align = align_of::<T>();
        let actual_align = if align > t_align { align } else { t_align };
        let available = self.remaining();
        let size = size_of::<T>()
            .checked_mul(len)
            .ok_or(FloodError::ArenaExhausted {
                requested: usize::MAX,
                available,
            })?;

        let base_ptr = self.buffer.as_mut_ptr() as usize;
        let current_ptr = base_ptr + self.offset;
        let padding = (actual_align - (current_ptr % actual_align)) % actual_align;

        let requested = padding.checked_add(size).unwrap_or(usize::MAX);
        if requested > available {
            return Err(FloodError::ArenaExhausted {
                requested,
                available,
            });
        }

        self.offset += padding;
        // SAFETY: offset + size <= buffer.len() was checked above, so the
        // pointer and the `len` elements after it stay inside the buffer.
        let ptr = unsafe { self.buffer.as_mut_ptr().add(self.offset) as *mut T };
        self.offset += size;

        // SAFETY: `ptr` is aligned for T (padding above) and addresses `len`
        // elements of memory exclusively borrowed for 'a. Every element is
        // written before the slice is formed, so no reference ever observes
        // bytes that are not a valid T.
        unsafe {
            for i in 0..len {
                ptr.add(i).write(fill);
            }
            Ok(core::slice::from_raw_parts_mut(ptr, len))
        }
    }
}
