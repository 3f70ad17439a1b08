//! Semantic input events and their dispatch onto a workspace.
//!
//! Hosts translate raw pointer traffic (see [`cmesh_core::input`]) into
//! [`LayoutInputEvent`]s and feed them to [`LayoutWorkspace::apply_input`].
//! Every event carries a sequence number that must strictly increase;
//! replays and duplicated deliveries are dropped as stale instead of being
//! applied twice. Only accepted events advance the sequence; an event that
//! fails with an error can be delivered again under the same number.
//!
//! A move, end or cancel that arrives with no matching session is reported
//! as [`InputOutcome::Ignored`], not as an error. A pointer-up after the
//! drag was already cancelled is harmless.

use cmesh_core::geometry::{Point, Size};
use cmesh_core::logging::targets;
use serde::{Deserialize, Serialize};
use tracing::trace;
use web_time::Instant;

use crate::drag::{DragOutcome, DragSubject, DragUpdate};
use crate::error::{LayoutError, Result};
use crate::item::ItemId;
use crate::resize::{ResizeEnd, ResizeHandle, ResizeTarget};
use crate::workspace::LayoutWorkspace;

/// One semantic interaction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInputEvent {
    pub sequence: u64,
    pub kind: LayoutInputKind,
}

impl LayoutInputEvent {
    #[must_use]
    pub const fn new(sequence: u64, kind: LayoutInputKind) -> Self {
        Self { sequence, kind }
    }

    /// Reject start events with non-finite coordinates.
    pub fn validate(&self) -> Result<()> {
        let start = match &self.kind {
            LayoutInputKind::DragStart { position, .. } | LayoutInputKind::ResizeStart { position, .. } => {
                Some(*position)
            }
            _ => None,
        };
        match start {
            Some(position) if !position.is_finite() => Err(LayoutError::InvalidInput {
                reason: format!(
                    "event {} starts at a non-finite position ({}, {})",
                    self.sequence, position.x, position.y
                ),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LayoutInputKind {
    DragStart {
        subject: DragSubject,
        position: Point,
    },
    DragMove {
        position: Point,
    },
    DragEnd,
    DragCancel,
    ResizeStart {
        target: ResizeTarget,
        handle: ResizeHandle,
        position: Point,
    },
    ResizeMove {
        target: ResizeTarget,
        position: Point,
    },
    ResizeEnd {
        target: ResizeTarget,
    },
    ResizeCancel {
        target: ResizeTarget,
    },
    BringToFront {
        item: ItemId,
    },
}

/// Why an event had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    NoActiveDrag,
    NoActiveResize,
    StaleSequence,
}

/// What an applied event did.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    DragStarted,
    DragMoved(DragUpdate),
    DragCommitted(DragOutcome),
    DragCancelled,
    ResizeStarted,
    ResizeMoved { size: Size },
    ResizeEnded(ResizeEnd),
    ResizeCancelled,
    BroughtToFront { z_index: u64 },
    Ignored { reason: IgnoredReason },
}

impl LayoutWorkspace {
    /// Apply one semantic event using the wall clock for resize timing.
    pub fn apply_input(&mut self, event: &LayoutInputEvent) -> Result<InputOutcome> {
        self.apply_input_at(event, Instant::now())
    }

    /// Apply one semantic event at `now`.
    pub fn apply_input_at(&mut self, event: &LayoutInputEvent, now: Instant) -> Result<InputOutcome> {
        if self
            .last_input_sequence
            .is_some_and(|last| event.sequence <= last)
        {
            trace!(target: targets::WORKSPACE, sequence = event.sequence, "stale input dropped");
            return Ok(InputOutcome::Ignored {
                reason: IgnoredReason::StaleSequence,
            });
        }
        event.validate()?;
        let outcome = self.dispatch_input(&event.kind, now)?;
        self.last_input_sequence = Some(event.sequence);
        Ok(outcome)
    }

    fn dispatch_input(&mut self, kind: &LayoutInputKind, now: Instant) -> Result<InputOutcome> {
        let outcome = match kind {
            LayoutInputKind::DragStart { subject, position } => {
                match subject {
                    DragSubject::Item(item) => self.begin_drag(item, *position)?,
                    DragSubject::Zone(zone) => self.begin_zone_drag(zone, *position)?,
                }
                InputOutcome::DragStarted
            }
            LayoutInputKind::DragMove { position } => {
                if !self.is_dragging() {
                    return Ok(ignored(IgnoredReason::NoActiveDrag));
                }
                InputOutcome::DragMoved(self.update_drag(*position)?)
            }
            LayoutInputKind::DragEnd => {
                if !self.is_dragging() {
                    return Ok(ignored(IgnoredReason::NoActiveDrag));
                }
                InputOutcome::DragCommitted(self.commit_drag()?)
            }
            LayoutInputKind::DragCancel => {
                if !self.cancel_drag() {
                    return Ok(ignored(IgnoredReason::NoActiveDrag));
                }
                InputOutcome::DragCancelled
            }
            LayoutInputKind::ResizeStart {
                target,
                handle,
                position,
            } => {
                self.begin_resize_at(target.clone(), *handle, *position, now)?;
                InputOutcome::ResizeStarted
            }
            LayoutInputKind::ResizeMove { target, position } => {
                if !self.is_resizing(target) {
                    return Ok(ignored(IgnoredReason::NoActiveResize));
                }
                InputOutcome::ResizeMoved {
                    size: self.update_resize_at(target, *position, now)?,
                }
            }
            LayoutInputKind::ResizeEnd { target } => {
                if !self.is_resizing(target) {
                    return Ok(ignored(IgnoredReason::NoActiveResize));
                }
                InputOutcome::ResizeEnded(self.end_resize_at(target, now)?)
            }
            LayoutInputKind::ResizeCancel { target } => {
                if !self.is_resizing(target) {
                    return Ok(ignored(IgnoredReason::NoActiveResize));
                }
                self.cancel_resize(target)?;
                InputOutcome::ResizeCancelled
            }
            LayoutInputKind::BringToFront { item } => InputOutcome::BroughtToFront {
                z_index: self.bring_to_front(item)?,
            },
        };
        Ok(outcome)
    }
}

fn ignored(reason: IgnoredReason) -> InputOutcome {
    InputOutcome::Ignored { reason }
}
