//! Draggable items and the item registry.
//!
//! An item is either floating at an absolute position or docked in exactly
//! one zone. [`ItemPlacement`] encodes that as a sum type, so "docked without
//! an owner zone" or "floating with an owner zone" cannot be represented.

use std::fmt;

use cmesh_core::geometry::{Point, Rect, Size};
use cmesh_core::logging::targets;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EntityKind, LayoutError, Result};
use crate::zone::ZoneId;

/// Stable identifier for a draggable item, unique within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Presentation type tag. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(String);

impl ItemKind {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemKind {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Coarse size bucket used by zone allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    XLarge,
}

impl SizeClass {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::XLarge];
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::XLarge => "x-large",
        })
    }
}

/// Per-item dimension bounds applied while resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeConstraints {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            min_width: 0.0,
            min_height: 0.0,
            max_width: None,
            max_height: None,
        }
    }
}

impl SizeConstraints {
    /// Minimum-only constraints.
    #[must_use]
    pub const fn min(min_width: f64, min_height: f64) -> Self {
        Self {
            min_width,
            min_height,
            max_width: None,
            max_height: None,
        }
    }

    /// Clamp `size` into bounds. The minimum wins when `max < min`, and the
    /// result is never negative.
    #[must_use]
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            clamp_axis(size.width, self.min_width, self.max_width),
            clamp_axis(size.height, self.min_height, self.max_height),
        )
    }
}

fn clamp_axis(value: f64, min: f64, max: Option<f64>) -> f64 {
    let min = if min.is_finite() { min.max(0.0) } else { 0.0 };
    let capped = match max {
        Some(max) if max.is_finite() => value.min(max),
        _ => value,
    };
    capped.max(min)
}

/// Where an item lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "placement", rename_all = "snake_case")]
pub enum ItemPlacement {
    Floating {
        position: Point,
    },
    Docked {
        zone: ZoneId,
        /// Floating position held before docking, restored on undock.
        last_floating: Option<Point>,
    },
}

/// Registry state for one draggable panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraggableItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub size_class: SizeClass,
    pub size: Size,
    #[serde(default)]
    pub constraints: SizeConstraints,
    pub placement: ItemPlacement,
    #[serde(default)]
    pub z_index: u64,
}

impl DraggableItem {
    /// A floating item at `position`.
    #[must_use]
    pub fn floating(
        id: impl Into<ItemId>,
        kind: impl Into<ItemKind>,
        size_class: SizeClass,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            size_class,
            size,
            constraints: SizeConstraints::default(),
            placement: ItemPlacement::Floating { position },
            z_index: 0,
        }
    }

    /// An item registered directly into `zone`, with no floating history.
    #[must_use]
    pub fn docked(
        id: impl Into<ItemId>,
        kind: impl Into<ItemKind>,
        size_class: SizeClass,
        zone: impl Into<ZoneId>,
        size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            size_class,
            size,
            constraints: SizeConstraints::default(),
            placement: ItemPlacement::Docked {
                zone: zone.into(),
                last_floating: None,
            },
            z_index: 0,
        }
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: SizeConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: u64) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn is_docked(&self) -> bool {
        matches!(self.placement, ItemPlacement::Docked { .. })
    }

    /// Owning zone; `Some` iff docked.
    #[must_use]
    pub fn owner_zone(&self) -> Option<&ZoneId> {
        match &self.placement {
            ItemPlacement::Docked { zone, .. } => Some(zone),
            ItemPlacement::Floating { .. } => None,
        }
    }

    /// Floating position; `None` while docked.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match self.placement {
            ItemPlacement::Floating { position } => Some(position),
            ItemPlacement::Docked { .. } => None,
        }
    }

    /// Last known floating coordinates, whether or not currently docked.
    #[must_use]
    pub fn last_floating_position(&self) -> Option<Point> {
        match self.placement {
            ItemPlacement::Floating { position } => Some(position),
            ItemPlacement::Docked { last_floating, .. } => last_floating,
        }
    }

    /// Rectangle of the item placed at `origin`.
    #[must_use]
    pub fn rect_at(&self, origin: Point) -> Rect {
        Rect::from_origin_size(origin, self.size)
    }
}

/// Owner of all item state for one workspace.
///
/// Iteration follows registration order. Every successful mutation bumps
/// [`revision`](Self::revision).
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: FxHashMap<ItemId, DraggableItem>,
    order: Vec<ItemId>,
    revision: u64,
}

impl ItemRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Fails with `DuplicateId` if the id is taken.
    pub fn register(&mut self, item: DraggableItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(LayoutError::DuplicateId {
                kind: EntityKind::Item,
                id: item.id.to_string(),
            });
        }
        debug!(target: targets::ITEM, item = %item.id, docked = item.is_docked(), "item registered");
        self.order.push(item.id.clone());
        self.items.insert(item.id.clone(), item);
        self.bump();
        Ok(())
    }

    /// Remove an item, returning its final state.
    pub fn unregister(&mut self, id: &ItemId) -> Result<DraggableItem> {
        let item = self
            .items
            .remove(id)
            .ok_or_else(|| LayoutError::unknown_item(id))?;
        self.order.retain(|existing| existing != id);
        debug!(target: targets::ITEM, item = %id, "item unregistered");
        self.bump();
        Ok(item)
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&DraggableItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Set the floating position. For a docked item this updates the
    /// remembered floating position instead.
    pub fn update_position(&mut self, id: &ItemId, position: Point) -> Result<()> {
        let item = self.get_mut(id)?;
        match &mut item.placement {
            ItemPlacement::Floating { position: current } => *current = position,
            ItemPlacement::Docked { last_floating, .. } => *last_floating = Some(position),
        }
        self.bump();
        Ok(())
    }

    pub fn update_size(&mut self, id: &ItemId, size_class: SizeClass) -> Result<()> {
        self.get_mut(id)?.size_class = size_class;
        self.bump();
        Ok(())
    }

    pub fn update_dimensions(&mut self, id: &ItemId, size: Size) -> Result<()> {
        self.get_mut(id)?.size = size;
        self.bump();
        Ok(())
    }

    /// Dock into `zone`, or float when `zone` is `None`.
    ///
    /// Docking remembers the current floating position. Floating restores
    /// the remembered position, or `fallback` if the item has never floated.
    /// Zone membership lists are not touched here.
    pub fn set_docked(&mut self, id: &ItemId, zone: Option<ZoneId>, fallback: Point) -> Result<()> {
        let item = self.get_mut(id)?;
        let remembered = item.last_floating_position();
        item.placement = match zone {
            Some(zone) => ItemPlacement::Docked {
                zone,
                last_floating: remembered,
            },
            None => ItemPlacement::Floating {
                position: remembered.unwrap_or(fallback),
            },
        };
        self.bump();
        Ok(())
    }

    pub fn set_z_index(&mut self, id: &ItemId, z_index: u64) -> Result<()> {
        self.get_mut(id)?.z_index = z_index;
        self.bump();
        Ok(())
    }

    /// Items in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DraggableItem> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn get_mut(&mut self, id: &ItemId) -> Result<&mut DraggableItem> {
        self.items
            .get_mut(id)
            .ok_or_else(|| LayoutError::unknown_item(id))
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
