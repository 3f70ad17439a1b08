//! Error taxonomy for registry and session operations.
//!
//! Every variant is a caller-side invariant breach. Geometry and pointer
//! anomalies (NaN, missing bounds, zero-size rectangles) never surface here;
//! the controllers recover from them locally.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::{ItemId, SizeClass};
use crate::zone::ZoneId;

/// Which registry an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    Zone,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => f.write_str("item"),
            Self::Zone => f.write_str("zone"),
        }
    }
}

/// Session family named in lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Drag,
    Resize,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drag => f.write_str("drag"),
            Self::Resize => f.write_str("resize"),
        }
    }
}

/// Why a zone refused an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    Full { max_items: usize },
    SizeClassNotAllowed { size_class: SizeClass },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { max_items } => write!(f, "zone is full (max_items={max_items})"),
            Self::SizeClassNotAllowed { size_class } => {
                write!(f, "size class {size_class} is not allowed")
            }
        }
    }
}

/// Failures surfaced by the layout engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("{kind} id already registered: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("unknown {kind} id: {id}")]
    UnknownId { kind: EntityKind, id: String },

    #[error("a session is already active for {active}")]
    SessionAlreadyActive { active: String },

    #[error("no active {session} session")]
    NoActiveSession { session: SessionKind },

    #[error("zone {zone} is not empty ({} member(s))", .members.len())]
    ZoneNotEmpty { zone: ZoneId, members: Vec<ItemId> },

    #[error("zone {zone} cannot accept item {item}: {reason}")]
    CapacityExceeded {
        zone: ZoneId,
        item: ItemId,
        reason: RejectReason,
    },

    #[error("zone {zone} is not resizable")]
    NotResizable { zone: ZoneId },

    #[error("zone {zone} has no observed bounds")]
    MissingBounds { zone: ZoneId },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl LayoutError {
    pub(crate) fn unknown_item(id: &ItemId) -> Self {
        Self::UnknownId {
            kind: EntityKind::Item,
            id: id.to_string(),
        }
    }

    pub(crate) fn unknown_zone(id: &ZoneId) -> Self {
        Self::UnknownId {
            kind: EntityKind::Zone,
            id: id.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
