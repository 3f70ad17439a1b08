//! Resize controller: handle drags that change item or zone dimensions.
//!
//! Sessions are keyed by [`ResizeTarget`], so independent targets can be
//! resized at the same time. Position never changes during a resize; a
//! left or top handle grows the target when dragged outward, but the origin
//! stays put.
//!
//! Publication of final sizes can be debounced. The controller never looks
//! at the clock itself: callers pass `now` into every step and drive
//! [`ResizeController::flush_due`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use cmesh_core::geometry::{Point, Size};
use cmesh_core::logging::targets;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::error::{LayoutError, Result, SessionKind};
use crate::item::{ItemId, ItemRegistry, SizeConstraints};
use crate::zone::{ZoneId, ZoneRegistry};

/// What a resize session changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum ResizeTarget {
    Item(ItemId),
    Zone(ZoneId),
}

impl fmt::Display for ResizeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(id) => write!(f, "item {id}"),
            Self::Zone(id) => write!(f, "zone {id}"),
        }
    }
}

/// Edge or corner grabbed by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// `Some(true)` for the right edge, `Some(false)` for the left edge.
    #[must_use]
    pub const fn horizontal_edge(self) -> Option<bool> {
        match self {
            Self::Left | Self::TopLeft | Self::BottomLeft => Some(false),
            Self::Right | Self::TopRight | Self::BottomRight => Some(true),
            Self::Top | Self::Bottom => None,
        }
    }

    /// `Some(true)` for the bottom edge, `Some(false)` for the top edge.
    #[must_use]
    pub const fn vertical_edge(self) -> Option<bool> {
        match self {
            Self::Top | Self::TopLeft | Self::TopRight => Some(false),
            Self::Bottom | Self::BottomLeft | Self::BottomRight => Some(true),
            Self::Left | Self::Right => None,
        }
    }

    /// Apply a pointer delta to `origin`, before clamping.
    #[must_use]
    pub fn apply(self, origin: Size, dx: f64, dy: f64) -> Size {
        let width = match self.horizontal_edge() {
            Some(true) => origin.width + dx,
            Some(false) => origin.width - dx,
            None => origin.width,
        };
        let height = match self.vertical_edge() {
            Some(true) => origin.height + dy,
            Some(false) => origin.height - dy,
            None => origin.height,
        };
        Size::new(width, height)
    }
}

/// One in-progress resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub target: ResizeTarget,
    pub handle: ResizeHandle,
    pub origin_pointer: Point,
    pub origin_size: Size,
    pub current_size: Size,
    pub constraints: SizeConstraints,
    pub last_activity: Instant,
}

/// A final size ready to be written to its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub target: ResizeTarget,
    pub size: Size,
}

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeEnd {
    Published(Publication),
    /// Held back until `due_at`; see [`ResizeController::flush_due`].
    Deferred { due_at: Instant },
}

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    size: Size,
    due_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct ResizeController {
    sessions: BTreeMap<ResizeTarget, ResizeSession>,
    pending: BTreeMap<ResizeTarget, Pending>,
    debounce: Option<Duration>,
}

impl ResizeController {
    #[must_use]
    pub fn new(debounce: Option<Duration>) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_resizing(&self, target: &ResizeTarget) -> bool {
        self.sessions.contains_key(target)
    }

    #[must_use]
    pub fn session(&self, target: &ResizeTarget) -> Option<&ResizeSession> {
        self.sessions.get(target)
    }

    pub fn active_targets(&self) -> impl Iterator<Item = &ResizeTarget> + '_ {
        self.sessions.keys()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest deadline among deferred publications.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.due_at).min()
    }

    /// Size to render for `target`: the live session, else a deferred
    /// publication.
    #[must_use]
    pub fn preview(&self, target: &ResizeTarget) -> Option<Size> {
        self.sessions
            .get(target)
            .map(|session| session.current_size)
            .or_else(|| self.pending.get(target).map(|pending| pending.size))
    }

    /// Start resizing `target`.
    ///
    /// If a deferred publication is still waiting for this target it is
    /// returned and must be applied by the caller; the new session starts
    /// from that size.
    pub fn begin(
        &mut self,
        target: ResizeTarget,
        handle: ResizeHandle,
        pointer: Point,
        now: Instant,
        items: &ItemRegistry,
        zones: &ZoneRegistry,
    ) -> Result<Option<Publication>> {
        if self.sessions.contains_key(&target) {
            return Err(LayoutError::SessionAlreadyActive {
                active: format!("resize of {target}"),
            });
        }
        if !pointer.is_finite() {
            return Err(LayoutError::InvalidInput {
                reason: format!("resize start pointer is not finite: ({}, {})", pointer.x, pointer.y),
            });
        }
        let (size, constraints) = match &target {
            ResizeTarget::Item(id) => {
                let item = items.get(id).ok_or_else(|| LayoutError::unknown_item(id))?;
                (item.size, item.constraints)
            }
            ResizeTarget::Zone(id) => {
                let zone = zones.get(id).ok_or_else(|| LayoutError::unknown_zone(id))?;
                if !zone.resizable {
                    return Err(LayoutError::NotResizable { zone: id.clone() });
                }
                let bounds = zone
                    .bounds
                    .ok_or_else(|| LayoutError::MissingBounds { zone: id.clone() })?;
                (bounds.size(), SizeConstraints::min(zone.min_width, zone.min_height))
            }
        };

        let flushed = self.pending.remove(&target).map(|pending| Publication {
            target: target.clone(),
            size: pending.size,
        });
        let origin_size = flushed.as_ref().map_or(size, |publication| publication.size);
        debug!(target: targets::RESIZE, resize = %target, ?handle, flushed = flushed.is_some(), "resize started");
        self.sessions.insert(
            target.clone(),
            ResizeSession {
                target,
                handle,
                origin_pointer: pointer,
                origin_size,
                current_size: origin_size,
                constraints,
                last_activity: now,
            },
        );
        Ok(flushed)
    }

    /// Track the pointer. Returns the clamped transient size.
    pub fn update(&mut self, target: &ResizeTarget, pointer: Point, now: Instant) -> Result<Size> {
        let session = self.sessions.get_mut(target).ok_or(LayoutError::NoActiveSession {
            session: SessionKind::Resize,
        })?;
        if !pointer.is_finite() {
            warn!(target: targets::RESIZE, resize = %target, "non-finite pointer ignored");
            return Ok(session.current_size);
        }
        let (dx, dy) = pointer.delta_from(session.origin_pointer);
        let raw = session.handle.apply(session.origin_size, dx, dy);
        session.current_size = session.constraints.clamp(raw);
        session.last_activity = now;
        trace!(
            target: targets::RESIZE,
            resize = %target,
            width = session.current_size.width,
            height = session.current_size.height,
            "resize moved"
        );
        Ok(session.current_size)
    }

    /// Finish the session: publish now, or defer when debouncing.
    pub fn end(&mut self, target: &ResizeTarget, now: Instant) -> Result<ResizeEnd> {
        let session = self.sessions.remove(target).ok_or(LayoutError::NoActiveSession {
            session: SessionKind::Resize,
        })?;
        match self.debounce {
            None => {
                debug!(target: targets::RESIZE, resize = %target, "resize published");
                Ok(ResizeEnd::Published(Publication {
                    target: session.target,
                    size: session.current_size,
                }))
            }
            Some(window) => {
                let due_at = session.last_activity.max(now) + window;
                debug!(target: targets::RESIZE, resize = %target, window_ms = window.as_millis() as u64, "resize deferred");
                self.pending.insert(
                    session.target,
                    Pending {
                        size: session.current_size,
                        due_at,
                    },
                );
                Ok(ResizeEnd::Deferred { due_at })
            }
        }
    }

    /// Discard the session. Nothing is published.
    pub fn cancel(&mut self, target: &ResizeTarget) -> Result<ResizeSession> {
        let session = self.sessions.remove(target).ok_or(LayoutError::NoActiveSession {
            session: SessionKind::Resize,
        })?;
        debug!(target: targets::RESIZE, resize = %target, "resize cancelled");
        Ok(session)
    }

    /// Deferred publications whose idle window has elapsed at `now`.
    pub fn flush_due(&mut self, now: Instant) -> Vec<Publication> {
        let due: Vec<ResizeTarget> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due_at <= now)
            .map(|(target, _)| target.clone())
            .collect();
        due.into_iter()
            .filter_map(|target| {
                self.pending
                    .remove(&target)
                    .map(|pending| Publication { target, size: pending.size })
            })
            .collect()
    }

    /// Every deferred publication, regardless of deadline.
    pub fn flush_all(&mut self) -> Vec<Publication> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(target, pending)| Publication { target, size: pending.size })
            .collect()
    }

    /// Drop the session and any deferred publication for a target that is
    /// going away.
    pub fn discard_target(&mut self, target: &ResizeTarget) -> bool {
        let had_session = self.sessions.remove(target).is_some();
        let had_pending = self.pending.remove(target).is_some();
        had_session || had_pending
    }
}
