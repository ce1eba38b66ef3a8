//! Unit tests for arena allocation edge cases.

use tide_core::{required_buffer_size, Arena, DetectorNode, FloodError, NodeIdx};

/// Allocation larger than the whole buffer reports what was asked for.
#[test]
fn test_arena_exhausted_error() {
    let mut memory = [0u8; 64];
    let mut arena = Arena::new(&mut memory);

    match arena.alloc_slice::<u64>(100, 0) {
        Err(FloodError::ArenaExhausted {
            requested,
            available,
        }) => {
            assert!(requested >= 800);
            assert_eq!(available, 64);
        }
        other => panic!("expected ArenaExhausted, got {other:?}"),
    }
}

/// A failed allocation leaves the arena untouched.
#[test]
fn test_arena_failed_alloc_consumes_nothing() {
    let mut memory = [0u8; 128];
    let mut arena = Arena::new(&mut memory);

    assert!(arena.alloc_slice::<u64>(8, 0).is_ok());
    let used = arena.used();

    assert!(arena.alloc_slice::<u64>(100, 0).is_err());
    assert_eq!(arena.used(), used);
    assert_eq!(arena.used() + arena.remaining(), 128);
}

/// Length overflow is reported instead of wrapping.
#[test]
fn test_arena_size_overflow() {
    let mut memory = [0u8; 64];
    let mut arena = Arena::new(&mut memory);
    assert!(matches!(
        arena.alloc_slice::<u64>(usize::MAX / 4, 0),
        Err(FloodError::ArenaExhausted { .. })
    ));
}

/// Every element is set to the fill value, even over dirty memory.
#[test]
fn test_arena_fill_value() {
    let mut memory = [0xAAu8; 512];
    let mut arena = Arena::new(&mut memory);

    let words = arena.alloc_slice::<u32>(16, 7).unwrap();
    assert!(words.iter().all(|&w| w == 7));

    let handles = arena.alloc_slice(5, NodeIdx::BOUNDARY).unwrap();
    assert!(handles.iter().all(|h| h.is_boundary()));

    let nodes = arena.alloc_slice(3, DetectorNode::default()).unwrap();
    assert!(nodes.iter().all(|n| !n.is_claimed() && n.neighbors.is_empty()));
}

/// Slices from one arena are disjoint.
#[test]
fn test_arena_slices_disjoint() {
    let mut memory = [0u8; 256];
    let mut arena = Arena::new(&mut memory);

    let a = arena.alloc_slice::<u64>(4, 1).unwrap();
    let b = arena.alloc_slice::<u64>(4, 2).unwrap();
    a.fill(9);
    assert!(b.iter().all(|&x| x == 2));
    assert!(a.as_ptr() as usize + 32 <= b.as_ptr() as usize);
}

/// Padding plus a near-maximal length is reported instead of wrapping.
#[test]
fn test_arena_padding_overflow() {
    #[repr(align(64))]
    struct CacheLine([u8; 128]);

    let mut memory = CacheLine([0; 128]);
    let mut arena = Arena::new(&mut memory.0);
    let _ = arena.alloc_slice::<u8>(1, 0).unwrap();

    match arena.alloc_slice_aligned::<u8>(usize::MAX, 64, 0) {
        Err(FloodError::ArenaExhausted {
            requested,
            available,
        }) => {
            assert_eq!(requested, usize::MAX);
            assert_eq!(available, 127);
        }
        other => panic!("expected ArenaExhausted, got {other:?}"),
    }
    assert_eq!(arena.used(), 1);
}

/// Natural alignment is restored after a misaligned allocation.
#[test]
fn test_arena_alignment_edge_cases() {
    let mut memory = [0u8; 512];
    let mut arena = Arena::new(&mut memory);

    let _ = arena.alloc_slice::<u8>(1, 0).unwrap();
    let slice = arena.alloc_slice::<u64>(1, 0).unwrap();
    assert_eq!(slice.as_ptr() as usize % 8, 0);
}

/// Cache-line alignment with alloc_slice_aligned.
#[test]
fn test_arena_custom_alignment() {
    let mut memory = [0u8; 512];
    let mut arena = Arena::new(&mut memory);

    let _ = arena.alloc_slice::<u8>(3, 0).unwrap();
    let slice = arena.alloc_slice_aligned::<u64>(4, 64, 0).unwrap();
    assert_eq!(slice.as_ptr() as usize % 64, 0);

    // A requested alignment below the type's own is ignored.
    let slice = arena.alloc_slice_aligned::<u64>(1, 1, 0).unwrap();
    assert_eq!(slice.as_ptr() as usize % 8, 0);
}

/// Padding counts toward the capacity check.
#[test]
fn test_arena_exhausted_due_to_alignment() {
    let mut memory = [0u8; 32];
    let mut arena = Arena::new(&mut memory);

    let _ = arena.alloc_slice::<u8>(1, 0).unwrap();
    // 31 bytes left, but 64-byte alignment plus 32 bytes of data cannot fit.
    assert!(arena.alloc_slice_aligned::<u64>(4, 64, 0).is_err());
}

/// Zero-length allocations succeed, even on a full arena.
#[test]
fn test_arena_zero_length_alloc() {
    let mut memory = [0u8; 64];
    let mut arena = Arena::new(&mut memory);
    assert_eq!(arena.alloc_slice::<u64>(0, 0).unwrap().len(), 0);

    let mut memory = [0u8; 8];
    let mut arena = Arena::new(&mut memory);
    let _ = arena.alloc_slice::<u8>(8, 0).unwrap();
    assert_eq!(arena.remaining(), 0);
    assert_eq!(arena.alloc_slice::<u8>(0, 0).unwrap().len(), 0);
}

/// Buffer size grows with every input.
#[test]
fn test_required_buffer_size_monotonic() {
    let base = required_buffer_size(100, 200, 200);
    assert!(required_buffer_size(101, 200, 200) > base);
    assert!(required_buffer_size(100, 201, 200) > base);
    assert!(required_buffer_size(100, 200, 201) > base);
    assert!(required_buffer_size(0, 0, 0) > 0);
}
