#![forbid(unsafe_code)]

//! Pointer input events and move coalescing.
//!
//! Hosts deliver pointer moves far faster than a layout engine needs them:
//! a single drag across a dashboard can produce hundreds of moves per frame
//! on high-refresh displays. [`PointerCoalescer`] keeps only the latest move
//! per pointer between flushes while passing every other event straight
//! through.
//!
//! The layout engine never consumes [`PointerEvent`]s itself. This is a
//! host-side helper: the host coalesces raw samples here, then translates
//! each surviving event into a `cmesh_layout::LayoutInputEvent`.
//!
//! # Design
//!
//! The coalescer uses a "latest wins" strategy for moves. Because the drag
//! and resize controllers derive everything from the *absolute* latest
//! pointer position (never from accumulated deltas), dropping intermediate
//! moves cannot change the final observable state.
//!
//! # Usage
//!
//! ```
//! use cmesh_core::geometry::Point;
//! use cmesh_core::input::{PointerCoalescer, PointerEvent, PointerEventKind};
//!
//! let mut coalescer = PointerCoalescer::new();
//!
//! assert!(coalescer.push(PointerEvent::moved(1, Point::new(10.0, 10.0))).is_none());
//! assert!(coalescer.push(PointerEvent::moved(1, Point::new(20.0, 20.0))).is_none());
//!
//! // Up passes through; the caller flushes pending moves first.
//! let pending = coalescer.flush();
//! assert_eq!(pending.len(), 1);
//! assert_eq!(pending[0].position, Point::new(20.0, 20.0));
//! let up = coalescer.push(PointerEvent::new(PointerEventKind::Up, 1, Point::new(20.0, 20.0)));
//! assert!(up.is_some());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    /// Host-initiated abort (escape key, focus loss, pointer capture lost).
    Cancel,
}

/// One raw pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Host pointer identifier; distinguishes touch points.
    pub pointer_id: u32,
    pub position: Point,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, pointer_id: u32, position: Point) -> Self {
        Self {
            kind,
            pointer_id,
            position,
        }
    }

    /// Shorthand for a move sample.
    #[must_use]
    pub const fn moved(pointer_id: u32, position: Point) -> Self {
        Self::new(PointerEventKind::Move, pointer_id, position)
    }
}

/// Coalesces high-frequency pointer moves.
///
/// # Thread Safety
///
/// Not thread-safe; intended for the single event-dispatch thread.
///
/// # Performance
///
/// `push` is O(log p) in the number of distinct pointers with pending moves,
/// which is bounded by the number of active touch points.
#[derive(Debug, Clone, Default)]
pub struct PointerCoalescer {
    pending_moves: BTreeMap<u32, PointerEvent>,
    coalesced: u64,
}

impl PointerCoalescer {
    /// Create an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event.
    ///
    /// Returns `Some(event)` if it should be processed now, or `None` if it
    /// was a move that is now pending.
    ///
    /// This method does NOT flush pending moves when a non-move arrives; call
    /// [`flush`](Self::flush) first so that moves are applied before the
    /// terminating up/cancel.
    pub fn push(&mut self, event: PointerEvent) -> Option<PointerEvent> {
        match event.kind {
            PointerEventKind::Move => {
                if self.pending_moves.insert(event.pointer_id, event).is_some() {
                    self.coalesced = self.coalesced.saturating_add(1);
                }
                None
            }
            PointerEventKind::Down | PointerEventKind::Up | PointerEventKind::Cancel => Some(event),
        }
    }

    /// Drain pending moves, ordered by pointer id.
    pub fn flush(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.pending_moves).into_values().collect()
    }

    /// Drop the pending move for one pointer (e.g. after its cancel).
    pub fn discard(&mut self, pointer_id: u32) -> Option<PointerEvent> {
        self.pending_moves.remove(&pointer_id)
    }

    /// Whether any moves are pending.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_moves.is_empty()
    }

    /// Total number of moves replaced by a later move since creation.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
