//! Serializable read model of a workspace and its invariant checks.
//!
//! A [`LayoutSnapshot`] is a plain-data copy of every item, zone and the
//! zone stack. Hosts use it for rendering diffs and replay logs; tests use
//! [`LayoutSnapshot::invariant_report`] to assert that no sequence of
//! operations can leave the registries inconsistent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::item::{DraggableItem, ItemId, ItemPlacement};
use crate::zone::{DockZone, ZoneId};

/// Current snapshot schema version.
pub const LAYOUT_SNAPSHOT_SCHEMA_VERSION: u16 = 1;

/// Point-in-time copy of a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub schema_version: u16,
    /// Workspace revision when taken. Excluded from the state hash.
    pub revision: u64,
    /// Items in registration order.
    pub items: Vec<DraggableItem>,
    /// Zones in registration order.
    pub zones: Vec<DockZone>,
    pub zone_stack: Vec<ZoneId>,
    /// Highest z-index handed out so far.
    pub z_counter: u64,
}

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantCode {
    UnsupportedSchemaVersion,
    DuplicateItemId,
    DuplicateZoneId,
    OwnerZoneMissing,
    DockedNotListed,
    MemberMissing,
    MemberOwnerMismatch,
    DuplicateMember,
    CapacityExceeded,
    SizeClassNotAllowed,
    StackZoneMissing,
    DuplicateStackEntry,
    ZIndexAboveCounter,
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantIssue {
    pub code: LayoutInvariantCode,
    pub severity: LayoutInvariantSeverity,
    pub item: Option<ItemId>,
    pub zone: Option<ZoneId>,
    pub message: String,
}

/// Structured invariant report over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantReport {
    pub snapshot_hash: u64,
    pub issues: Vec<LayoutInvariantIssue>,
}

impl LayoutInvariantReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == LayoutInvariantSeverity::Error)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Codes present, sorted and deduplicated.
    #[must_use]
    pub fn codes(&self) -> Vec<LayoutInvariantCode> {
        let codes: BTreeSet<_> = self.issues.iter().map(|issue| issue.code).collect();
        codes.into_iter().collect()
    }
}

impl LayoutSnapshot {
    /// Deterministic structural hash (FNV-1a). Ignores `revision`.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_f64(hash: &mut u64, value: f64) {
            mix_u64(hash, value.to_bits());
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_u64(hash, value.len() as u64);
            mix_bytes(hash, value.as_bytes());
        }

        fn mix_opt_f64(hash: &mut u64, value: Option<f64>) {
            match value {
                Some(value) => {
                    mix(hash, 1);
                    mix_f64(hash, value);
                }
                None => mix(hash, 0),
            }
        }

        let mut hash = OFFSET_BASIS;
        mix_bytes(&mut hash, &self.schema_version.to_le_bytes());
        mix_u64(&mut hash, self.z_counter);

        mix_u64(&mut hash, self.items.len() as u64);
        for item in &self.items {
            mix_str(&mut hash, item.id.as_str());
            mix_str(&mut hash, item.kind.as_str());
            mix(&mut hash, item.size_class as u8);
            mix_f64(&mut hash, item.size.width);
            mix_f64(&mut hash, item.size.height);
            mix_f64(&mut hash, item.constraints.min_width);
            mix_f64(&mut hash, item.constraints.min_height);
            mix_opt_f64(&mut hash, item.constraints.max_width);
            mix_opt_f64(&mut hash, item.constraints.max_height);
            match &item.placement {
                ItemPlacement::Floating { position } => {
                    mix(&mut hash, 0);
                    mix_f64(&mut hash, position.x);
                    mix_f64(&mut hash, position.y);
                }
                ItemPlacement::Docked {
                    zone,
                    last_floating,
                } => {
                    mix(&mut hash, 1);
                    mix_str(&mut hash, zone.as_str());
                    mix_opt_f64(&mut hash, last_floating.map(|p| p.x));
                    mix_opt_f64(&mut hash, last_floating.map(|p| p.y));
                }
            }
            mix_u64(&mut hash, item.z_index);
        }

        mix_u64(&mut hash, self.zones.len() as u64);
        for zone in &self.zones {
            mix_str(&mut hash, zone.id.as_str());
            mix_str(&mut hash, &zone.label);
            match zone.bounds {
                Some(bounds) => {
                    mix(&mut hash, 1);
                    mix_f64(&mut hash, bounds.x);
                    mix_f64(&mut hash, bounds.y);
                    mix_f64(&mut hash, bounds.width);
                    mix_f64(&mut hash, bounds.height);
                }
                None => mix(&mut hash, 0),
            }
            mix_u64(&mut hash, zone.max_items.map_or(u64::MAX, |max| max as u64));
            match &zone.allowed_size_classes {
                Some(classes) => {
                    mix(&mut hash, 1);
                    for class in classes {
                        mix(&mut hash, *class as u8);
                    }
                    mix(&mut hash, 0xff);
                }
                None => mix(&mut hash, 0),
            }
            mix_u64(&mut hash, zone.members.len() as u64);
            for member in &zone.members {
                mix_str(&mut hash, member.as_str());
            }
            mix(&mut hash, u8::from(zone.resizable));
            mix_f64(&mut hash, zone.min_width);
            mix_f64(&mut hash, zone.min_height);
        }

        mix_u64(&mut hash, self.zone_stack.len() as u64);
        for zone in &self.zone_stack {
            mix_str(&mut hash, zone.as_str());
        }
        hash
    }

    /// Check every registry invariant.
    #[must_use]
    pub fn invariant_report(&self) -> LayoutInvariantReport {
        use LayoutInvariantCode as Code;
        use LayoutInvariantSeverity::{Error, Warning};

        let mut issues = Vec::new();
        let mut push = |code: Code,
                        severity: LayoutInvariantSeverity,
                        item: Option<&ItemId>,
                        zone: Option<&ZoneId>,
                        message: String| {
            issues.push(LayoutInvariantIssue {
                code,
                severity,
                item: item.cloned(),
                zone: zone.cloned(),
                message,
            });
        };

        if self.schema_version != LAYOUT_SNAPSHOT_SCHEMA_VERSION {
            push(
                Code::UnsupportedSchemaVersion,
                Error,
                None,
                None,
                format!("schema version {} is not supported", self.schema_version),
            );
        }

        let mut items: BTreeMap<&ItemId, &DraggableItem> = BTreeMap::new();
        for item in &self.items {
            if items.insert(&item.id, item).is_some() {
                push(Code::DuplicateItemId, Error, Some(&item.id), None, format!("item {} appears twice", item.id));
            }
        }
        let mut zones: BTreeMap<&ZoneId, &DockZone> = BTreeMap::new();
        for zone in &self.zones {
            if zones.insert(&zone.id, zone).is_some() {
                push(Code::DuplicateZoneId, Error, None, Some(&zone.id), format!("zone {} appears twice", zone.id));
            }
        }

        for item in &self.items {
            if let Some(owner) = item.owner_zone() {
                match zones.get(owner) {
                    None => push(
                        Code::OwnerZoneMissing,
                        Error,
                        Some(&item.id),
                        Some(owner),
                        format!("item {} is docked in missing zone {owner}", item.id),
                    ),
                    Some(zone) if !zone.is_member(&item.id) => push(
                        Code::DockedNotListed,
                        Error,
                        Some(&item.id),
                        Some(owner),
                        format!("item {} is docked in {owner} but not listed as a member", item.id),
                    ),
                    Some(_) => {}
                }
            }
            if item.z_index > self.z_counter {
                push(
                    Code::ZIndexAboveCounter,
                    Warning,
                    Some(&item.id),
                    None,
                    format!("z-index {} exceeds counter {}", item.z_index, self.z_counter),
                );
            }
        }

        for zone in &self.zones {
            let mut seen = BTreeSet::new();
            for member in &zone.members {
                if !seen.insert(member) {
                    push(
                        Code::DuplicateMember,
                        Error,
                        Some(member),
                        Some(&zone.id),
                        format!("item {member} listed twice in zone {}", zone.id),
                    );
                    continue;
                }
                match items.get(member) {
                    None => push(
                        Code::MemberMissing,
                        Error,
                        Some(member),
                        Some(&zone.id),
                        format!("zone {} lists missing item {member}", zone.id),
                    ),
                    Some(item) => {
                        if item.owner_zone() != Some(&zone.id) {
                            push(
                                Code::MemberOwnerMismatch,
                                Error,
                                Some(member),
                                Some(&zone.id),
                                format!("item {member} is listed in {} but not docked there", zone.id),
                            );
                        }
                        let allowed = zone
                            .allowed_size_classes
                            .as_ref()
                            .is_none_or(|classes| classes.contains(&item.size_class));
                        if !allowed {
                            push(
                                Code::SizeClassNotAllowed,
                                Error,
                                Some(member),
                                Some(&zone.id),
                                format!("size class {} not allowed in {}", item.size_class, zone.id),
                            );
                        }
                    }
                }
            }
            if let Some(max) = zone.max_items {
                if zone.members.len() > max {
                    push(
                        Code::CapacityExceeded,
                        Error,
                        None,
                        Some(&zone.id),
                        format!("zone {} holds {} items, max {max}", zone.id, zone.members.len()),
                    );
                }
            }
        }

        let mut stacked = BTreeSet::new();
        for zone in &self.zone_stack {
            if !stacked.insert(zone) {
                push(Code::DuplicateStackEntry, Error, None, Some(zone), format!("zone {zone} stacked twice"));
            }
            if !zones.contains_key(zone) {
                push(Code::StackZoneMissing, Error, None, Some(zone), format!("stacked zone {zone} is not registered"));
            }
        }

        LayoutInvariantReport {
            snapshot_hash: self.state_hash(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::SizeClass;
    use cmesh_core::geometry::{Point, Rect, Size};

    fn consistent() -> LayoutSnapshot {
        let mut zone = DockZone::new("z", "Main")
            .with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0))
            .with_max_items(1);
        zone.members.push(ItemId::from("a"));
        LayoutSnapshot {
            schema_version: LAYOUT_SNAPSHOT_SCHEMA_VERSION,
            revision: 4,
            items: vec![
                DraggableItem::docked("a", "chart", SizeClass::Small, "z", Size::new(50.0, 50.0)).with_z_index(2),
                DraggableItem::floating("b", "chart", SizeClass::Large, Point::new(300.0, 10.0), Size::new(80.0, 60.0)),
            ],
            zones: vec![zone],
            zone_stack: vec![ZoneId::from("z")],
            z_counter: 2,
        }
    }

    #[test]
    fn consistent_snapshot_is_clean() {
        let report = consistent().invariant_report();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert!(!report.has_errors());
    }

    #[test]
    fn hash_ignores_revision_but_tracks_state() {
        let base = consistent();
        let mut bumped = base.clone();
        bumped.revision += 10;
        assert_eq!(base.state_hash(), bumped.state_hash());

        let mut moved = base.clone();
        moved.items[1].placement = ItemPlacement::Floating {
            position: Point::new(310.0, 10.0),
        };
        assert_ne!(base.state_hash(), moved.state_hash());
    }

    #[test]
    fn broken_membership_is_reported() {
        let mut snapshot = consistent();
        snapshot.zones[0].members.push(ItemId::from("b"));
        snapshot.zones[0].members.push(ItemId::from("ghost"));
        snapshot.zone_stack.push(ZoneId::from("nowhere"));
        snapshot.items[1].z_index = 99;

        let report = snapshot.invariant_report();
        assert!(report.has_errors());
        assert_eq!(
            report.codes(),
            vec![
                LayoutInvariantCode::MemberMissing,
                LayoutInvariantCode::MemberOwnerMismatch,
                LayoutInvariantCode::CapacityExceeded,
                LayoutInvariantCode::StackZoneMissing,
                LayoutInvariantCode::ZIndexAboveCounter,
            ]
        );
    }

    #[test]
    fn docked_item_missing_from_members_is_reported() {
        let mut snapshot = consistent();
        snapshot.zones[0].members.clear();
        let report = snapshot.invariant_report();
        assert_eq!(report.codes(), vec![LayoutInvariantCode::DockedNotListed]);

        snapshot.zones.clear();
        snapshot.zone_stack.clear();
        let report = snapshot.invariant_report();
        assert_eq!(report.codes(), vec![LayoutInvariantCode::OwnerZoneMissing]);
    }

    #[test]
    fn json_preserves_hash() {
        let snapshot = consistent();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: LayoutSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
        assert_eq!(back.state_hash(), snapshot.state_hash());
    }
}
