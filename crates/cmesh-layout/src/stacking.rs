//! Z-order and the zone stack.
//!
//! Two independent orderings live here:
//!
//! - Item z-order: a monotonic counter. [`StackingManager::next_z_index`]
//!   hands out strictly increasing values that are never reused.
//! - The zone stack: an ordered list of zone ids laid out along one
//!   [`StackAxis`]. Zone drags reorder it by dropping onto a boundary band.
//!
//! # Boundary bands
//!
//! With the dragged zone taken out, a stack of `n` bounded zones has `n + 1`
//! seams: the leading edge of the first zone, the midpoint of the gap
//! between each neighbouring pair, and the trailing edge of the last zone.
//! Each seam becomes a band of fixed thickness spanning the stack's full
//! cross extent. The band with the largest overlap area wins.

use cmesh_core::geometry::{Rect, rect_overlap_area};
use cmesh_core::logging::targets;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::zone::{ZoneId, ZoneRegistry};

/// Direction along which stacked zones are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackAxis {
    /// Zones stacked top to bottom; seams are horizontal lines.
    #[default]
    Vertical,
    /// Zones stacked left to right; seams are vertical lines.
    Horizontal,
}

/// A drop band at a stack insertion index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackBoundary {
    /// Insertion index into the stack with the dragged zone removed.
    pub index: usize,
    pub band: Rect,
}

/// Build the boundary bands for `entries`, given as `(stack index, bounds)`
/// in stack order.
#[must_use]
pub fn stack_boundaries(entries: &[(usize, Rect)], axis: StackAxis, thickness: f64) -> Vec<StackBoundary> {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return Vec::new();
    };
    let cross = entries
        .iter()
        .skip(1)
        .fold(first.1, |acc, (_, rect)| acc.union(rect));
    let half = thickness / 2.0;

    let band_at = |seam: f64| match axis {
        StackAxis::Vertical => Rect::new(cross.x, seam - half, cross.width, thickness),
        StackAxis::Horizontal => Rect::new(seam - half, cross.y, thickness, cross.height),
    };
    let leading = |rect: &Rect| match axis {
        StackAxis::Vertical => rect.y,
        StackAxis::Horizontal => rect.x,
    };
    let trailing = |rect: &Rect| match axis {
        StackAxis::Vertical => rect.bottom(),
        StackAxis::Horizontal => rect.right(),
    };

    let mut out = Vec::with_capacity(entries.len() + 1);
    out.push(StackBoundary {
        index: first.0,
        band: band_at(leading(&first.1)),
    });
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let seam = (trailing(&prev.1) + leading(&next.1)) / 2.0;
        out.push(StackBoundary {
            index: next.0,
            band: band_at(seam),
        });
    }
    out.push(StackBoundary {
        index: last.0 + 1,
        band: band_at(trailing(&last.1)),
    });
    out
}

/// Boundary with the greatest overlap with `dragged`. Ties keep the lowest
/// index; zero overlap everywhere yields `None`.
#[must_use]
pub fn pick_boundary(dragged: &Rect, boundaries: &[StackBoundary]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for boundary in boundaries {
        let area = rect_overlap_area(dragged, &boundary.band);
        if area <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((boundary.index, area)),
        }
    }
    best.map(|(index, _)| index)
}

/// Owns the z-index counter and the zone stack.
#[derive(Debug, Clone, Default)]
pub struct StackingManager {
    counter: u64,
    stack: Vec<ZoneId>,
}

impl StackingManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the counter floor so later values stay above `z_index`.
    pub fn observe_z_index(&mut self, z_index: u64) {
        self.counter = self.counter.max(z_index);
    }

    /// Next z-index: strictly greater than every value handed out or observed.
    /// `None` once `u64::MAX` has been handed out; the counter never wraps.
    pub fn next_z_index(&mut self) -> Option<u64> {
        self.counter = self.counter.checked_add(1)?;
        Some(self.counter)
    }

    /// Highest z-index handed out or observed.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    #[must_use]
    pub fn stack(&self) -> &[ZoneId] {
        &self.stack
    }

    #[must_use]
    pub fn position(&self, zone: &ZoneId) -> Option<usize> {
        self.stack.iter().position(|id| id == zone)
    }

    /// Move (or add) `zone` to `index`, clamped to the stack length after
    /// removal. Returns the index actually used.
    pub fn insert_into_stack(&mut self, zone: ZoneId, index: usize) -> usize {
        self.stack.retain(|id| *id != zone);
        let index = index.min(self.stack.len());
        debug!(target: targets::STACK, zone = %zone, index, "zone inserted into stack");
        self.stack.insert(index, zone);
        index
    }

    /// Returns whether the zone was in the stack.
    pub fn remove_from_stack(&mut self, zone: &ZoneId) -> bool {
        let before = self.stack.len();
        self.stack.retain(|id| id != zone);
        before != self.stack.len()
    }

    /// Boundary index for dropping `dragged_zone` at `dragged_rect`.
    ///
    /// Zones without finite bounds are skipped. Indices refer to the stack
    /// with `dragged_zone` removed, which is what
    /// [`insert_into_stack`](Self::insert_into_stack) expects.
    #[must_use]
    pub fn boundary_candidate(
        &self,
        dragged_zone: &ZoneId,
        dragged_rect: &Rect,
        zones: &ZoneRegistry,
        axis: StackAxis,
        thickness: f64,
    ) -> Option<usize> {
        if !dragged_rect.is_finite() {
            return None;
        }
        let entries: Vec<(usize, Rect)> = self
            .stack
            .iter()
            .filter(|id| *id != dragged_zone)
            .enumerate()
            .filter_map(|(index, id)| {
                zones
                    .get(id)
                    .and_then(|zone| zone.bounds)
                    .filter(Rect::is_finite)
                    .map(|bounds| (index, bounds))
            })
            .collect();
        let boundaries = stack_boundaries(&entries, axis, thickness);
        let picked = pick_boundary(dragged_rect, &boundaries);
        trace!(target: targets::STACK, zone = %dragged_zone, bands = boundaries.len(), ?picked, "boundary evaluated");
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::DockZone;

    fn zid(raw: &str) -> ZoneId {
        ZoneId::from(raw)
    }

    fn ids(mgr: &StackingManager) -> Vec<&str> {
        mgr.stack().iter().map(ZoneId::as_str).collect()
    }

    #[test]
    fn z_indices_are_strictly_increasing() {
        let mut mgr = StackingManager::new();
        mgr.observe_z_index(7);
        let a = mgr.next_z_index();
        let b = mgr.next_z_index();
        assert_eq!(a, Some(8));
        assert!(b > a);
        mgr.observe_z_index(3);
        assert!(mgr.next_z_index() > b);
    }

    #[test]
    fn exhausted_counter_hands_out_nothing() {
        let mut mgr = StackingManager::new();
        mgr.observe_z_index(u64::MAX - 1);
        assert_eq!(mgr.next_z_index(), Some(u64::MAX));
        assert_eq!(mgr.next_z_index(), None);
        assert_eq!(mgr.counter(), u64::MAX);
    }

    #[test]
    fn insert_moves_and_clamps() {
        let mut mgr = StackingManager::new();
        for id in ["a", "b", "c"] {
            mgr.insert_into_stack(zid(id), usize::MAX);
        }
        assert_eq!(ids(&mgr), ["a", "b", "c"]);
        assert_eq!(mgr.insert_into_stack(zid("c"), 0), 0);
        assert_eq!(ids(&mgr), ["c", "a", "b"]);
        assert_eq!(mgr.insert_into_stack(zid("c"), 99), 2);
        assert_eq!(ids(&mgr), ["a", "b", "c"]);
        assert!(mgr.remove_from_stack(&zid("b")));
        assert!(!mgr.remove_from_stack(&zid("b")));
        assert_eq!(ids(&mgr), ["a", "c"]);
    }

    #[test]
    fn vertical_bands_sit_on_seams() {
        let entries = [
            (0, Rect::new(0.0, 0.0, 100.0, 100.0)),
            (1, Rect::new(0.0, 120.0, 200.0, 100.0)),
        ];
        let bands = stack_boundaries(&entries, StackAxis::Vertical, 10.0);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].band, Rect::new(0.0, -5.0, 200.0, 10.0));
        assert_eq!(bands[1].band, Rect::new(0.0, 105.0, 200.0, 10.0));
        assert_eq!(bands[2].index, 2);
        assert_eq!(bands[2].band, Rect::new(0.0, 215.0, 200.0, 10.0));
    }

    #[test]
    fn horizontal_bands_use_x_seams() {
        let entries = [(0, Rect::new(0.0, 0.0, 100.0, 50.0))];
        let bands = stack_boundaries(&entries, StackAxis::Horizontal, 4.0);
        assert_eq!(bands[0].band, Rect::new(-2.0, 0.0, 4.0, 50.0));
        assert_eq!(bands[1].band, Rect::new(98.0, 0.0, 4.0, 50.0));
    }

    #[test]
    fn pick_prefers_largest_overlap_then_lowest_index() {
        let boundaries = [
            StackBoundary { index: 0, band: Rect::new(0.0, 0.0, 100.0, 10.0) },
            StackBoundary { index: 1, band: Rect::new(0.0, 20.0, 100.0, 10.0) },
        ];
        let straddle = Rect::new(0.0, 5.0, 10.0, 20.0);
        assert_eq!(pick_boundary(&straddle, &boundaries), Some(0));
        let lower = Rect::new(0.0, 18.0, 10.0, 20.0);
        assert_eq!(pick_boundary(&lower, &boundaries), Some(1));
        let far = Rect::new(500.0, 500.0, 10.0, 10.0);
        assert_eq!(pick_boundary(&far, &boundaries), None);
    }

    #[test]
    fn candidate_skips_dragged_and_unbounded_zones() {
        let mut zones = ZoneRegistry::new();
        zones
            .register(DockZone::new("top", "Top").with_bounds(Rect::new(0.0, 0.0, 300.0, 100.0)))
            .expect("top");
        zones.register(DockZone::new("ghost", "Ghost")).expect("ghost");
        zones
            .register(DockZone::new("bottom", "Bottom").with_bounds(Rect::new(0.0, 100.0, 300.0, 100.0)))
            .expect("bottom");
        let mut mgr = StackingManager::new();
        for id in ["top", "ghost", "bottom"] {
            mgr.insert_into_stack(zid(id), usize::MAX);
        }

        // Dragging "top" down past "bottom": without "top" the stack is
        // [ghost, bottom]; the trailing band of "bottom" maps to index 2.
        let dragged = Rect::new(0.0, 195.0, 300.0, 50.0);
        let index = mgr
            .boundary_candidate(&zid("top"), &dragged, &zones, StackAxis::Vertical, 16.0)
            .expect("band hit");
        assert_eq!(index, 2);
        mgr.insert_into_stack(zid("top"), index);
        assert_eq!(ids(&mgr), ["ghost", "bottom", "top"]);
    }

    #[test]
    fn non_finite_drag_has_no_candidate() {
        let mgr = StackingManager::new();
        let zones = ZoneRegistry::new();
        let dragged = Rect::new(f64::NAN, 0.0, 10.0, 10.0);
        assert_eq!(
            mgr.boundary_candidate(&zid("a"), &dragged, &zones, StackAxis::Vertical, 16.0),
            None
        );
    }
}
