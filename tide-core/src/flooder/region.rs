//! Growing regions and the pool that owns them.
//!
//! A region is a growth front started by a detection event. Regions that
//! collide inconsistently are wrapped into a *blossom*: a new region whose
//! radius restarts from zero while each child's radius is frozen at the
//! moment of wrapping. Blossoms nest, so every region sits at the bottom of
//! a chain of blossom parents whose topmost member is the region currently
//! growing on its behalf.
//!
//! ```text
//!            B2            top: growing, restarted at t2
//!           /  \
//!         B1    R3         B1 frozen at t2
//!        /  \
//!      R1    R2            R1, R2 frozen at t1
//! ```
//!
//! Detector nodes only hold [`RegionIdx`] handles. The [`RegionArena`] is the
//! sole owner of region storage and must not reclaim a region while any node
//! of the current run still refers to it.

use super::types::{RegionIdx, Time};
use super::varying::Varying32;
use crate::arena::Arena;
use crate::error::FloodError;

/// Read access to the blossom hierarchy, as needed by detector-node radius
/// queries.
///
/// [`RegionArena`] is the production implementation. Keeping the node code
/// generic over this trait lets a scheduler back regions with its own storage.
pub trait RegionTree {
    /// Current radius of `region`.
    fn radius(&self, region: RegionIdx) -> Varying32;

    /// Blossom directly containing `region`, or `None` if it is top-level.
    fn blossom_parent(&self, region: RegionIdx) -> Option<RegionIdx>;

    /// Follows blossom parents from `region` to the topmost region.
    fn top_region(&self, region: RegionIdx) -> RegionIdx {
        let mut r = region;
        while let Some(parent) = self.blossom_parent(r) {
            r = parent;
        }
        r
    }

    /// Number of blossom-parent steps from `region` to its top region.
    fn chain_depth(&self, region: RegionIdx) -> usize {
        let mut depth = 0;
        let mut r = region;
        while let Some(parent) = self.blossom_parent(r) {
            r = parent;
            depth += 1;
        }
        depth
    }

    /// Returns `true` if `ancestor` is `region` or one of its blossom parents.
    fn is_in_chain(&self, region: RegionIdx, ancestor: RegionIdx) -> bool {
        let mut r = region;
        loop {
            if r == ancestor {
                return true;
            }
            match self.blossom_parent(r) {
                Some(parent) => r = parent,
                None => return false,
            }
        }
    }
}

/// One slot of the region pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphFillRegion {
    /// Radius as a function of global time.
    pub radius: Varying32,
    /// Blossom directly containing this region.
    pub blossom_parent: Option<RegionIdx>,
    /// Number of direct children when this region is a blossom.
    pub num_blossom_children: u32,
    /// `false` once the slot has been returned to the pool.
    pub live: bool,
}

impl GraphFillRegion {
    /// Returns `true` if this region is not nested in any blossom.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.blossom_parent.is_none()
    }

    /// Returns `true` if this region was formed by wrapping other regions.
    #[inline]
    pub fn is_blossom(&self) -> bool {
        self.num_blossom_children > 0
    }
}

/// Fixed-capacity region pool with O(1) allocation and reclamation.
///
/// Slots are allocated from the same [`Arena`] as the graph. Freed slots go
/// on a stack and are handed out again, most recently freed first.
pub struct RegionArena<'a> {
    slots: &'a mut [GraphFillRegion],
    free_list: &'a mut [u32],
    free_count: usize,
    high_water: usize,
    num_live: usize,
}

impl<'a> RegionArena<'a> {
    /// Allocates a pool of `capacity` region slots from `arena`.
    ///
    /// # Errors
    ///
    /// [`FloodError::ArenaExhausted`] if the arena is too small.
    pub fn new(arena: &mut Arena<'a>, capacity: usize) -> Result<Self, FloodError> {
        let slots = arena.alloc_slice_aligned(capacity, 64, GraphFillRegion::default())?;
        let free_list = arena.alloc_slice(capacity, 0u32)?;
        Ok(Self {
            slots,
            free_list,
            free_count: 0,
            high_water: 0,
            num_live: 0,
        })
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live regions.
    #[inline]
    pub fn num_live(&self) -> usize {
        self.num_live
    }

    /// Creates a top-level region with the given radius.
    ///
    /// # Errors
    ///
    /// [`FloodError::RegionPoolExhausted`] when every slot is live.
    pub fn alloc(&mut self, radius: Varying32) -> Result<RegionIdx, FloodError> {
        let slot = if self.free_count > 0 {
            self.free_count -= 1;
            self.free_list[self.free_count] as usize
        } else if self.high_water < self.slots.len() {
            self.high_water += 1;
            self.high_water - 1
        } else {
            tracing::warn!(capacity = self.slots.len(), "region pool exhausted");
            return Err(FloodError::RegionPoolExhausted {
                capacity: self.slots.len(),
            });
        };

        self.slots[slot] = GraphFillRegion {
            radius,
            blossom_parent: None,
            num_blossom_children: 0,
            live: true,
        };
        self.num_live += 1;
        Ok(RegionIdx(slot as u32))
    }

    /// Returns a region to the pool.
    ///
    /// # Errors
    ///
    /// [`FloodError::RegionReclaimed`] if the slot is already free.
    pub fn free(&mut self, region: RegionIdx) -> Result<(), FloodError> {
        let slot = self.live_slot_mut(region)?;
        slot.live = false;
        slot.blossom_parent = None;
        slot.num_blossom_children = 0;
        self.free_list[self.free_count] = region.0;
        self.free_count += 1;
        self.num_live -= 1;
        Ok(())
    }

    /// Reclaims every region, keeping the slot storage.
    pub fn clear(&mut self) {
        for slot in self.slots[..self.high_water].iter_mut() {
            *slot = GraphFillRegion::default();
        }
        self.free_count = 0;
        self.high_water = 0;
        self.num_live = 0;
    }

    /// Returns `true` if `region` addresses a live slot.
    #[inline]
    pub fn is_live(&self, region: RegionIdx) -> bool {
        self.slots.get(region.index()).is_some_and(|s| s.live)
    }

    /// Region behind `region`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is out of range. Debug builds also panic on a
    /// reclaimed handle.
    #[inline]
    pub fn get(&self, region: RegionIdx) -> &GraphFillRegion {
        let slot = &self.slots[region.index()];
        debug_assert!(slot.live, "query on reclaimed region {region}");
        slot
    }

    /// Mutable access to the region behind `region`.
    ///
    /// # Errors
    ///
    /// [`FloodError::RegionReclaimed`] if the handle is stale or out of range.
    pub fn get_mut(&mut self, region: RegionIdx) -> Result<&mut GraphFillRegion, FloodError> {
        self.live_slot_mut(region)
    }

    fn live_slot_mut(&mut self, region: RegionIdx) -> Result<&mut GraphFillRegion, FloodError> {
        match self.slots.get_mut(region.index()) {
            Some(slot) if slot.live => Ok(slot),
            _ => Err(FloodError::RegionReclaimed { region }),
        }
    }

    /// Wraps top-level `children` into a new blossom at `time`.
    ///
    /// Each child's radius is frozen at its value at `time`, which becomes the
    /// offset credited to nodes claimed below it. The blossom starts growing
    /// from zero at `time`.
    ///
    /// # Errors
    ///
    /// [`FloodError::RegionReclaimed`] for a stale child handle,
    /// [`FloodError::RegionNotTopLevel`] for a child already nested in a
    /// blossom, or [`FloodError::RegionPoolExhausted`] if no slot is left for
    /// the blossom. The pool is left unchanged on error.
    pub fn wrap_into_blossom(
        &mut self,
        children: &[RegionIdx],
        time: Time,
    ) -> Result<RegionIdx, FloodError> {
        for &child in children {
            if !self.live_slot_mut(child)?.is_top_level() {
                return Err(FloodError::RegionNotTopLevel { region: child });
            }
        }

        let blossom = self.alloc(Varying32::growing_varying_with_zero_distance_at_time(time))?;
        for &child in children {
            let slot = self.live_slot_mut(child)?;
            slot.radius = slot.radius.then_frozen_at_time(time);
            slot.blossom_parent = Some(blossom);
        }
        self.live_slot_mut(blossom)?.num_blossom_children = children.len() as u32;
        Ok(blossom)
    }

    /// Dissolves a top-level blossom at `time`.
    ///
    /// Direct children become top-level again and resume growing from the
    /// radius they were frozen at. The blossom slot is reclaimed, so every
    /// node stamped with it must be re-stamped before its next radius query.
    /// Nodes claimed by the blossom itself (`region_that_arrived == blossom`)
    /// have no child to fall back to and must be reset before the shatter.
    ///
    /// # Errors
    ///
    /// [`FloodError::RegionReclaimed`] if `blossom` is stale, or
    /// [`FloodError::RegionNotTopLevel`] if it is nested in another blossom.
    /// The pool is left unchanged on error.
    pub fn shatter_blossom(&mut self, blossom: RegionIdx, time: Time) -> Result<(), FloodError> {
        if !self.live_slot_mut(blossom)?.is_top_level() {
            return Err(FloodError::RegionNotTopLevel { region: blossom });
        }
        let mut remaining = self.slots[blossom.index()].num_blossom_children;
        for slot in self.slots[..self.high_water].iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.live && slot.blossom_parent == Some(blossom) {
                slot.blossom_parent = None;
                slot.radius = slot.radius.then_growing_at_time(time);
                remaining -= 1;
            }
        }
        self.free(blossom)
    }

    /// Live regions that are not nested in any blossom.
    pub fn top_level_regions(&self) -> impl Iterator<Item = RegionIdx> + '_ {
        self.slots[..self.high_water]
            .iter()
            .enumerate()
            .filter(|(_, s)| s.live && s.is_top_level())
            .map(|(i, _)| RegionIdx(i as u32))
    }
}

impl RegionTree for RegionArena<'_> {
    #[inline(always)]
    fn radius(&self, region: RegionIdx) -> Varying32 {
        self.get(region).radius
    }

    #[inline(always)]
    fn blossom_parent(&self, region: RegionIdx) -> Option<RegionIdx> {
        self.get(region).blossom_parent
    }
}
