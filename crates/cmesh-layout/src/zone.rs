//! Dock zones and the zone registry.

use std::collections::BTreeSet;
use std::fmt;

use cmesh_core::geometry::{Rect, Size};
use cmesh_core::logging::targets;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EntityKind, LayoutError, RejectReason, Result};
use crate::item::{DraggableItem, ItemId, SizeClass};

/// Stable identifier for a dock zone, unique within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A rectangular region that can hold docked items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockZone {
    pub id: ZoneId,
    pub label: String,
    /// Last observed viewport bounds. `None` until the host reports them.
    pub bounds: Option<Rect>,
    /// Capacity. Unlimited when `None`.
    pub max_items: Option<usize>,
    /// Allow-list. Every class is accepted when `None`.
    pub allowed_size_classes: Option<BTreeSet<SizeClass>>,
    /// Docked items in display order.
    pub members: Vec<ItemId>,
    pub resizable: bool,
    pub min_width: f64,
    pub min_height: f64,
}

impl DockZone {
    #[must_use]
    pub fn new(id: impl Into<ZoneId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            bounds: None,
            max_items: None,
            allowed_size_classes: None,
            members: Vec::new(),
            resizable: false,
            min_width: 0.0,
            min_height: 0.0,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    #[must_use]
    pub fn with_allowed_size_classes(mut self, classes: impl IntoIterator<Item = SizeClass>) -> Self {
        self.allowed_size_classes = Some(classes.into_iter().collect());
        self
    }

    /// Mark the zone resizable with the given minimum dimensions.
    #[must_use]
    pub fn resizable(mut self, min_width: f64, min_height: f64) -> Self {
        self.resizable = true;
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    #[must_use]
    pub fn is_member(&self, item: &ItemId) -> bool {
        self.members.contains(item)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_items.is_some_and(|max| self.members.len() >= max)
    }

    /// Why this zone would refuse `item`, or `None` if it accepts.
    ///
    /// An item that is already a member never counts against capacity.
    #[must_use]
    pub fn rejection(&self, item: &DraggableItem) -> Option<RejectReason> {
        let allowed = self
            .allowed_size_classes
            .as_ref()
            .is_none_or(|classes| classes.contains(&item.size_class));
        if !allowed {
            return Some(RejectReason::SizeClassNotAllowed {
                size_class: item.size_class,
            });
        }
        if self.is_member(&item.id) {
            return None;
        }
        match self.max_items {
            Some(max_items) if self.members.len() >= max_items => {
                Some(RejectReason::Full { max_items })
            }
            _ => None,
        }
    }
}

/// Owner of all zone state for one workspace.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: FxHashMap<ZoneId, DockZone>,
    order: Vec<ZoneId>,
    revision: u64,
}

impl ZoneRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone. Zones are registered empty; members join via
    /// [`add_member`](Self::add_member).
    pub fn register(&mut self, zone: DockZone) -> Result<()> {
        if self.zones.contains_key(&zone.id) {
            return Err(LayoutError::DuplicateId {
                kind: EntityKind::Zone,
                id: zone.id.to_string(),
            });
        }
        if !zone.members.is_empty() {
            return Err(LayoutError::InvalidInput {
                reason: format!("zone {} must be registered without members", zone.id),
            });
        }
        debug!(target: targets::ZONE, zone = %zone.id, bounded = zone.bounds.is_some(), "zone registered");
        self.order.push(zone.id.clone());
        self.zones.insert(zone.id.clone(), zone);
        self.bump();
        Ok(())
    }

    /// Remove a zone. A non-empty zone is refused unless `force`; the caller
    /// owns re-placing the returned zone's former members.
    pub fn unregister(&mut self, id: &ZoneId, force: bool) -> Result<DockZone> {
        let zone = self.zones.get(id).ok_or_else(|| LayoutError::unknown_zone(id))?;
        if !zone.members.is_empty() && !force {
            return Err(LayoutError::ZoneNotEmpty {
                zone: id.clone(),
                members: zone.members.clone(),
            });
        }
        let zone = self
            .zones
            .remove(id)
            .ok_or_else(|| LayoutError::unknown_zone(id))?;
        self.order.retain(|existing| existing != id);
        debug!(target: targets::ZONE, zone = %id, orphaned = zone.members.len(), "zone unregistered");
        self.bump();
        Ok(zone)
    }

    #[must_use]
    pub fn get(&self, id: &ZoneId) -> Option<&DockZone> {
        self.zones.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ZoneId) -> bool {
        self.zones.contains_key(id)
    }

    pub fn update_bounds(&mut self, id: &ZoneId, bounds: Rect) -> Result<()> {
        self.get_mut(id)?.bounds = Some(bounds);
        self.bump();
        Ok(())
    }

    /// Resize the zone's bounds in place, keeping its origin.
    pub fn update_dimensions(&mut self, id: &ZoneId, size: Size) -> Result<()> {
        let zone = self.get_mut(id)?;
        let Some(bounds) = zone.bounds.as_mut() else {
            return Err(LayoutError::MissingBounds { zone: id.clone() });
        };
        bounds.width = size.width;
        bounds.height = size.height;
        self.bump();
        Ok(())
    }

    /// The single dock-eligibility predicate.
    #[must_use]
    pub fn can_accept(&self, zone: &ZoneId, item: &DraggableItem) -> bool {
        self.check_accept(zone, item).is_ok()
    }

    /// Like [`can_accept`](Self::can_accept) but reports why.
    pub fn check_accept(&self, zone: &ZoneId, item: &DraggableItem) -> Result<()> {
        let target = self.zones.get(zone).ok_or_else(|| LayoutError::unknown_zone(zone))?;
        match target.rejection(item) {
            None => Ok(()),
            Some(reason) => Err(LayoutError::CapacityExceeded {
                zone: zone.clone(),
                item: item.id.clone(),
                reason,
            }),
        }
    }

    /// Append `item` to the zone's members. Re-adding an existing member is
    /// a no-op.
    pub fn add_member(&mut self, zone: &ZoneId, item: &DraggableItem) -> Result<()> {
        self.check_accept(zone, item)?;
        let target = self.get_mut(zone)?;
        if target.is_member(&item.id) {
            return Ok(());
        }
        target.members.push(item.id.clone());
        debug!(target: targets::ZONE, zone = %zone, item = %item.id, members = target.members.len(), "member added");
        self.bump();
        Ok(())
    }

    /// Remove `item` from the zone's members. Returns whether it was present.
    pub fn remove_member(&mut self, zone: &ZoneId, item: &ItemId) -> Result<bool> {
        let target = self.get_mut(zone)?;
        let before = target.members.len();
        target.members.retain(|member| member != item);
        let removed = target.members.len() != before;
        if removed {
            debug!(target: targets::ZONE, zone = %zone, item = %item, "member removed");
            self.bump();
        }
        Ok(removed)
    }

    #[must_use]
    pub fn members(&self, id: &ZoneId) -> Option<&[ItemId]> {
        self.zones.get(id).map(|zone| zone.members.as_slice())
    }

    /// Zones in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DockZone> + '_ {
        self.order.iter().filter_map(|id| self.zones.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn get_mut(&mut self, id: &ZoneId) -> Result<&mut DockZone> {
        self.zones
            .get_mut(id)
            .ok_or_else(|| LayoutError::unknown_zone(id))
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmesh_core::geometry::Point;

    fn item(id: &str, class: SizeClass) -> DraggableItem {
        DraggableItem::floating(id, "chart", class, Point::ORIGIN, Size::new(50.0, 50.0))
    }

    fn registry_with(zone: DockZone) -> ZoneRegistry {
        let mut reg = ZoneRegistry::new();
        reg.register(zone).expect("register zone");
        reg
    }

    #[test]
    fn capacity_limits_acceptance() {
        let z = ZoneId::from("z1");
        let mut reg = registry_with(DockZone::new("z1", "Left").with_max_items(1));
        let a = item("a", SizeClass::Small);
        let b = item("b", SizeClass::Small);
        assert!(reg.can_accept(&z, &a));
        reg.add_member(&z, &a).expect("dock a");
        assert!(!reg.can_accept(&z, &b));
        let err = reg.add_member(&z, &b).expect_err("full");
        assert!(matches!(
            err,
            LayoutError::CapacityExceeded {
                reason: RejectReason::Full { max_items: 1 },
                ..
            }
        ));
        assert_eq!(reg.members(&z), Some(&[ItemId::from("a")][..]));
    }

    #[test]
    fn existing_member_does_not_count_against_capacity() {
        let z = ZoneId::from("z1");
        let mut reg = registry_with(DockZone::new("z1", "Left").with_max_items(1));
        let a = item("a", SizeClass::Small);
        reg.add_member(&z, &a).expect("dock a");
        assert!(reg.can_accept(&z, &a));
        let rev = reg.revision();
        reg.add_member(&z, &a).expect("re-add is a no-op");
        assert_eq!(reg.revision(), rev);
        assert_eq!(reg.members(&z).map(<[ItemId]>::len), Some(1));
    }

    #[test]
    fn allow_list_filters_size_classes() {
        let z = ZoneId::from("z");
        let reg = registry_with(
            DockZone::new("z", "Narrow").with_allowed_size_classes([SizeClass::Small, SizeClass::Medium]),
        );
        assert!(reg.can_accept(&z, &item("s", SizeClass::Small)));
        let err = reg
            .check_accept(&z, &item("xl", SizeClass::XLarge))
            .expect_err("x-large excluded");
        assert!(matches!(
            err,
            LayoutError::CapacityExceeded {
                reason: RejectReason::SizeClassNotAllowed {
                    size_class: SizeClass::XLarge
                },
                ..
            }
        ));
    }

    #[test]
    fn unknown_zone_never_accepts() {
        let reg = ZoneRegistry::new();
        assert!(!reg.can_accept(&ZoneId::from("nope"), &item("a", SizeClass::Small)));
    }

    #[test]
    fn unregister_non_empty_requires_force() {
        let z = ZoneId::from("z");
        let mut reg = registry_with(DockZone::new("z", "Main"));
        reg.add_member(&z, &item("a", SizeClass::Small)).expect("dock");
        let err = reg.unregister(&z, false).expect_err("not empty");
        assert!(matches!(err, LayoutError::ZoneNotEmpty { .. }));
        assert!(reg.contains(&z));

        let removed = reg.unregister(&z, true).expect("forced");
        assert_eq!(removed.members, vec![ItemId::from("a")]);
        assert!(reg.is_empty());
    }

    #[test]
    fn register_rejects_prepopulated_members() {
        let mut zone = DockZone::new("z", "Main");
        zone.members.push(ItemId::from("ghost"));
        let mut reg = ZoneRegistry::new();
        assert!(matches!(reg.register(zone), Err(LayoutError::InvalidInput { .. })));
    }

    #[test]
    fn update_dimensions_needs_bounds() {
        let z = ZoneId::from("z");
        let mut reg = registry_with(DockZone::new("z", "Main"));
        assert!(matches!(
            reg.update_dimensions(&z, Size::new(10.0, 10.0)),
            Err(LayoutError::MissingBounds { .. })
        ));
        reg.update_bounds(&z, Rect::new(5.0, 5.0, 100.0, 100.0)).expect("bounds");
        reg.update_dimensions(&z, Size::new(40.0, 60.0)).expect("resize");
        assert_eq!(reg.get(&z).and_then(|zone| zone.bounds), Some(Rect::new(5.0, 5.0, 40.0, 60.0)));
    }

    #[test]
    fn remove_member_reports_presence() {
        let z = ZoneId::from("z");
        let mut reg = registry_with(DockZone::new("z", "Main"));
        reg.add_member(&z, &item("a", SizeClass::Small)).expect("dock");
        assert_eq!(reg.remove_member(&z, &ItemId::from("a")), Ok(true));
        assert_eq!(reg.remove_member(&z, &ItemId::from("a")), Ok(false));
    }
}
