//! Kani formal verification proofs for the arena allocator.
//!
//! Every node, adjacency slot and region slot lives in the arena, so a wrong
//! bounds or alignment computation would corrupt the whole graph.
//!
//! Run with: `cargo kani --package tide-core`

// ============================================================================
// Proof 1: Alignment padding is bounded and aligns
// ============================================================================
// File: arena.rs (alloc_slice_aligned)
// What: `(align - (ptr % align)) % align` is < align and aligns ptr
// Why: Misaligned DetectorNode slices → undefined behavior

/// Verify alignment padding calculation is bounded and correct.
#[kani::proof]
fn verify_alignment_calculation_bounded() {
    let current_ptr: usize = kani::any();
    let align: usize = kani::any();
    kani::assume(current_ptr < usize::MAX / 2);
    kani::assume(align > 0 && align <= 128 && align.is_power_of_two());

    let padding = (align - (current_ptr % align)) % align;

    kani::assert(padding < align, "padding must be less than alignment");
    kani::assert(
        (current_ptr + padding) % align == 0,
        "aligned ptr must be divisible by align",
    );
}

// ============================================================================
// Proof 2: Successful allocations stay in bounds
// ============================================================================
// File: arena.rs (alloc_slice_aligned)
// What: padding + size <= remaining ⇒ new offset <= buffer length
// Why: Out-of-bounds offset → writes past the caller's buffer

/// Verify that the capacity check keeps the offset within the buffer.
#[kani::proof]
fn verify_offset_bounds() {
    let buffer_len: usize = kani::any();
    let offset: usize = kani::any();
    let padding: usize = kani::any();
    let size: usize = kani::any();
    kani::assume(buffer_len <= 1 << 30);
    kani::assume(offset <= buffer_len);
    kani::assume(padding < 128);
    kani::assume(size <= 1 << 30);

    let available = buffer_len - offset;
    if padding + size <= available {
        kani::assert(offset + padding + size <= buffer_len, "offset within buffer");
    }
}

// ============================================================================
// Proof 3: Alignment selection never under-aligns
// ============================================================================
// File: arena.rs (alloc_slice_aligned)
// What: actual_align >= max(align_of::<T>(), requested)
// Why: Under-alignment → undefined behavior on strict-alignment platforms

/// Verify that the selected alignment dominates both inputs.
#[kani::proof]
fn verify_alignment_selection() {
    let t_align: usize = kani::any();
    let requested: usize = kani::any();
    kani::assume(t_align > 0 && t_align <= 64 && t_align.is_power_of_two());
    kani::assume(requested > 0 && requested <= 128 && requested.is_power_of_two());

    let actual = if requested > t_align { requested } else { t_align };

    kani::assert(actual >= t_align, "actual alignment must be >= type alignment");
    kani::assert(actual >= requested, "actual alignment must be >= requested alignment");
    kani::assert(actual.is_power_of_two(), "actual alignment must be power of two");
}
