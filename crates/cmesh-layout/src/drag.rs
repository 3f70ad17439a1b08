//! Drag controller: one pointer-driven move session per workspace.
//!
//! # State machine
//!
//! ```text
//! Idle --begin--> Dragging --update*--> Dragging --commit--> Idle
//!                     \------------------cancel------------> Idle
//! ```
//!
//! `begin` and `update` only read the registries. `commit` validates the
//! whole placement first and then applies it, so either every registry and
//! membership change lands or none does. `cancel` never touches the
//! registries.
//!
//! # Candidate selection
//!
//! For item drags, every zone that would accept the item is scored by the
//! fraction of the item's rectangle it covers. The best score strictly above
//! the configured threshold wins; equal scores keep the zone registered
//! first. Zone drags target the boundary bands of the zone stack instead
//! (see [`crate::stacking`]).
//!
//! Geometry anomalies (non-finite pointers, zones without bounds) never
//! error. They simply produce no candidate.

use cmesh_core::geometry::{Point, Rect, Size, overlap_fraction};
use cmesh_core::logging::targets;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result, SessionKind};
use crate::item::{DraggableItem, ItemId, ItemRegistry};
use crate::stacking::StackingManager;
use crate::zone::{ZoneId, ZoneRegistry};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "subject", content = "id", rename_all = "snake_case")]
pub enum DragSubject {
    Item(ItemId),
    /// A stacked zone dragged by its frame.
    Zone(ZoneId),
}

impl std::fmt::Display for DragSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item(id) => write!(f, "item {id}"),
            Self::Zone(id) => write!(f, "zone {id}"),
        }
    }
}

/// Where the current drag would land if committed now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "candidate", rename_all = "snake_case")]
pub enum DropCandidate {
    /// Dock the dragged item into this zone.
    Zone { zone: ZoneId },
    /// Move the dragged zone to this stack index.
    StackBoundary { index: usize },
}

/// Transient state of the active drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragSession {
    pub subject: DragSubject,
    pub pointer_origin: Point,
    /// Subject's top-left corner when the drag began.
    pub origin_position: Point,
    pub size: Size,
    /// `origin_position` plus the pointer delta of the latest update.
    pub transient_position: Point,
    pub candidate: Option<DropCandidate>,
}

impl DragSession {
    /// Rectangle of the subject at its transient position.
    #[must_use]
    pub fn transient_rect(&self) -> Rect {
        Rect::from_origin_size(self.transient_position, self.size)
    }
}

/// Result of one `update` step.
#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub transient_position: Point,
    pub candidate: Option<DropCandidate>,
    /// Whether the candidate differs from the previous step.
    pub candidate_changed: bool,
}

/// Result of a commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DragOutcome {
    Docked {
        item: ItemId,
        zone: ZoneId,
        from: Option<ZoneId>,
    },
    Floated {
        item: ItemId,
        position: Point,
        from: Option<ZoneId>,
    },
    StackReordered {
        zone: ZoneId,
        index: usize,
    },
    /// Nothing moved: a same-zone re-dock or a zone drag with no band hit.
    Unchanged {
        subject: DragSubject,
    },
}

/// Best accepting zone for `item` placed at `rect`, if any clears
/// `threshold`.
#[must_use]
pub fn select_candidate_zone(
    item: &DraggableItem,
    rect: &Rect,
    zones: &ZoneRegistry,
    threshold: f64,
) -> Option<ZoneId> {
    if !rect.is_finite() {
        return None;
    }
    let mut best: Option<(&ZoneId, f64)> = None;
    for zone in zones.iter() {
        let Some(bounds) = zone.bounds else {
            continue;
        };
        if zone.rejection(item).is_some() {
            continue;
        }
        let fraction = overlap_fraction(rect, &bounds);
        if fraction <= threshold {
            continue;
        }
        match best {
            Some((_, best_fraction)) if fraction <= best_fraction => {}
            _ => best = Some((&zone.id, fraction)),
        }
    }
    best.map(|(id, _)| id.clone())
}

/// Owns the optional drag session.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn subject(&self) -> Option<&DragSubject> {
        self.session.as_ref().map(|session| &session.subject)
    }

    /// Zone the dragged item would dock into on commit.
    #[must_use]
    pub fn active_candidate_zone(&self) -> Option<&ZoneId> {
        match self.session.as_ref()?.candidate.as_ref()? {
            DropCandidate::Zone { zone } => Some(zone),
            DropCandidate::StackBoundary { .. } => None,
        }
    }

    /// Start a drag. Registries are only read.
    pub fn begin(
        &mut self,
        subject: DragSubject,
        pointer: Point,
        items: &ItemRegistry,
        zones: &ZoneRegistry,
        config: &LayoutConfig,
    ) -> Result<&DragSession> {
        if let Some(active) = &self.session {
            return Err(LayoutError::SessionAlreadyActive {
                active: active.subject.to_string(),
            });
        }
        if !pointer.is_finite() {
            return Err(LayoutError::InvalidInput {
                reason: format!("drag start pointer is not finite: ({}, {})", pointer.x, pointer.y),
            });
        }
        let (origin_position, size) = match &subject {
            DragSubject::Item(id) => {
                let item = items.get(id).ok_or_else(|| LayoutError::unknown_item(id))?;
                (item_drag_origin(item, zones, config), item.size)
            }
            DragSubject::Zone(id) => {
                let zone = zones.get(id).ok_or_else(|| LayoutError::unknown_zone(id))?;
                let bounds = zone
                    .bounds
                    .ok_or_else(|| LayoutError::MissingBounds { zone: id.clone() })?;
                (bounds.origin(), bounds.size())
            }
        };
        debug!(
            target: targets::DRAG,
            subject = %subject,
            x = origin_position.x,
            y = origin_position.y,
            "drag started"
        );
        Ok(&*self.session.insert(DragSession {
            subject,
            pointer_origin: pointer,
            origin_position,
            size,
            transient_position: origin_position,
            candidate: None,
        }))
    }

    /// Move the drag to `pointer` and recompute the candidate.
    pub fn update(
        &mut self,
        pointer: Point,
        items: &ItemRegistry,
        zones: &ZoneRegistry,
        stacking: &StackingManager,
        config: &LayoutConfig,
    ) -> Result<DragUpdate> {
        let session = self.session.as_mut().ok_or(LayoutError::NoActiveSession {
            session: SessionKind::Drag,
        })?;
        let (dx, dy) = pointer.delta_from(session.pointer_origin);
        session.transient_position = session.origin_position.offset(dx, dy);

        let candidate = if pointer.is_finite() {
            let rect = session.transient_rect();
            match &session.subject {
                DragSubject::Item(id) => items
                    .get(id)
                    .and_then(|item| select_candidate_zone(item, &rect, zones, config.overlap_threshold))
                    .map(|zone| DropCandidate::Zone { zone }),
                DragSubject::Zone(id) => stacking
                    .boundary_candidate(id, &rect, zones, config.stack_axis, config.stack_boundary_band)
                    .map(|index| DropCandidate::StackBoundary { index }),
            }
        } else {
            warn!(target: targets::DRAG, subject = %session.subject, "non-finite pointer; candidate cleared");
            None
        };

        let candidate_changed = candidate != session.candidate;
        if candidate_changed {
            trace!(target: targets::DRAG, subject = %session.subject, ?candidate, "candidate changed");
        }
        session.candidate = candidate.clone();
        Ok(DragUpdate {
            transient_position: session.transient_position,
            candidate,
            candidate_changed,
        })
    }

    /// Discard the session. Registries are untouched.
    pub fn cancel(&mut self) -> Option<DragSession> {
        let session = self.session.take()?;
        debug!(target: targets::DRAG, subject = %session.subject, "drag cancelled");
        Some(session)
    }

    /// Apply the drag to the registries and end the session.
    ///
    /// The session ends even if the commit fails; in that case nothing was
    /// mutated.
    pub fn commit(
        &mut self,
        items: &mut ItemRegistry,
        zones: &mut ZoneRegistry,
        stacking: &mut StackingManager,
        config: &LayoutConfig,
    ) -> Result<DragOutcome> {
        let session = self.session.take().ok_or(LayoutError::NoActiveSession {
            session: SessionKind::Drag,
        })?;
        let outcome = match &session.subject {
            DragSubject::Item(id) => commit_item(&session, id, items, zones, config)?,
            DragSubject::Zone(id) => {
                if !zones.contains(id) {
                    return Err(LayoutError::unknown_zone(id));
                }
                match session.candidate {
                    Some(DropCandidate::StackBoundary { index }) => DragOutcome::StackReordered {
                        zone: id.clone(),
                        index: stacking.insert_into_stack(id.clone(), index),
                    },
                    _ => DragOutcome::Unchanged {
                        subject: session.subject.clone(),
                    },
                }
            }
        };
        debug!(target: targets::DRAG, subject = %session.subject, ?outcome, "drag committed");
        Ok(outcome)
    }
}

/// Top-left corner a drag of `item` starts from.
///
/// Docked items start at their zone's bounds origin, then their remembered
/// floating position, then the configured fallback.
fn item_drag_origin(item: &DraggableItem, zones: &ZoneRegistry, config: &LayoutConfig) -> Point {
    match item.owner_zone() {
        None => item.position().unwrap_or(config.fallback_position),
        Some(zone) => zones
            .get(zone)
            .and_then(|zone| zone.bounds)
            .filter(Rect::is_finite)
            .map(|bounds| bounds.origin())
            .or_else(|| item.last_floating_position())
            .unwrap_or(config.fallback_position),
    }
}

fn commit_item(
    session: &DragSession,
    id: &ItemId,
    items: &mut ItemRegistry,
    zones: &mut ZoneRegistry,
    config: &LayoutConfig,
) -> Result<DragOutcome> {
    let item = items.get(id).ok_or_else(|| LayoutError::unknown_item(id))?.clone();
    let prior = item.owner_zone().cloned();
    if let Some(prior) = &prior {
        if !zones.contains(prior) {
            return Err(LayoutError::unknown_zone(prior));
        }
    }

    if let Some(DropCandidate::Zone { zone }) = &session.candidate {
        match zones.check_accept(zone, &item) {
            Ok(()) if prior.as_ref() == Some(zone) => {
                return Ok(DragOutcome::Unchanged {
                    subject: session.subject.clone(),
                });
            }
            Ok(()) => {
                if let Some(prior) = &prior {
                    zones.remove_member(prior, id)?;
                }
                zones.add_member(zone, &item)?;
                items.set_docked(id, Some(zone.clone()), config.fallback_position)?;
                return Ok(DragOutcome::Docked {
                    item: id.clone(),
                    zone: zone.clone(),
                    from: prior,
                });
            }
            Err(err) => {
                warn!(target: targets::DRAG, item = %id, zone = %zone, error = %err, "stale candidate at commit; floating instead");
            }
        }
    }

    let snapped = session.transient_position.snapped(config.grid_size);
    let position = if snapped.is_finite() {
        snapped
    } else {
        warn!(target: targets::DRAG, item = %id, "non-finite drop position; using drag origin");
        session.origin_position
    };
    if let Some(prior) = &prior {
        zones.remove_member(prior, id)?;
        items.set_docked(id, None, position)?;
    }
    items.update_position(id, position)?;
    Ok(DragOutcome::Floated {
        item: id.clone(),
        position,
        from: prior,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::SizeClass;
    use crate::zone::DockZone;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    struct Fixture {
        items: ItemRegistry,
        zones: ZoneRegistry,
        stacking: StackingManager,
        config: LayoutConfig,
        drag: DragController,
    }

    impl Fixture {
        /// A 50x50 at the origin; Z1 (0,0,200,200, max 1); Z2 (300,0,200,200).
        fn new() -> Self {
            let mut items = ItemRegistry::new();
            items
                .register(DraggableItem::floating(
                    "a",
                    "chart",
                    SizeClass::Medium,
                    Point::ORIGIN,
                    Size::new(50.0, 50.0),
                ))
                .expect("item a");
            let mut zones = ZoneRegistry::new();
            zones
                .register(
                    DockZone::new("z1", "Left")
                        .with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0))
                        .with_max_items(1),
                )
                .expect("z1");
            zones
                .register(DockZone::new("z2", "Right").with_bounds(Rect::new(300.0, 0.0, 200.0, 200.0)))
                .expect("z2");
            Self {
                items,
                zones,
                stacking: StackingManager::new(),
                config: LayoutConfig::default(),
                drag: DragController::new(),
            }
        }

        fn begin(&mut self, subject: DragSubject, pointer: Point) -> Result<DragSession> {
            self.drag
                .begin(subject, pointer, &self.items, &self.zones, &self.config)
                .cloned()
        }

        fn update(&mut self, pointer: Point) -> DragUpdate {
            self.drag
                .update(pointer, &self.items, &self.zones, &self.stacking, &self.config)
                .expect("active drag")
        }

        fn commit(&mut self) -> Result<DragOutcome> {
            self.drag
                .commit(&mut self.items, &mut self.zones, &mut self.stacking, &self.config)
        }
    }

    fn a() -> ItemId {
        ItemId::from("a")
    }

    #[test]
    fn drag_into_zone_docks_item() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::new(25.0, 25.0)).expect("begin");
        let step = fx.update(Point::new(85.0, 85.0));
        assert_eq!(step.transient_position, Point::new(60.0, 60.0));
        assert_eq!(step.candidate, Some(DropCandidate::Zone { zone: ZoneId::from("z1") }));
        assert!(step.candidate_changed);
        assert_eq!(fx.drag.active_candidate_zone(), Some(&ZoneId::from("z1")));

        let outcome = fx.commit().expect("commit");
        assert_eq!(
            outcome,
            DragOutcome::Docked {
                item: a(),
                zone: ZoneId::from("z1"),
                from: None
            }
        );
        assert!(!fx.drag.is_dragging());
        assert_eq!(fx.items.get(&a()).and_then(DraggableItem::owner_zone), Some(&ZoneId::from("z1")));
        assert_eq!(fx.zones.members(&ZoneId::from("z1")), Some(&[a()][..]));
    }

    #[test]
    fn repeated_update_reports_no_change() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        assert!(fx.update(Point::new(60.0, 60.0)).candidate_changed);
        assert!(!fx.update(Point::new(61.0, 61.0)).candidate_changed);
    }

    #[test]
    fn full_zone_is_skipped_and_item_floats_snapped() {
        let mut fx = Fixture::new();
        let b = DraggableItem::docked("b", "chart", SizeClass::Small, "z1", Size::new(50.0, 50.0));
        fx.zones.add_member(&ZoneId::from("z1"), &b).expect("b into z1");
        fx.items.register(b).expect("b");

        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        let step = fx.update(Point::new(63.0, 57.0));
        assert_eq!(step.candidate, None);
        let outcome = fx.commit().expect("commit");
        assert_eq!(
            outcome,
            DragOutcome::Floated {
                item: a(),
                position: Point::new(60.0, 60.0),
                from: None
            }
        );
        assert_eq!(fx.zones.members(&ZoneId::from("z1")).map(<[ItemId]>::len), Some(1));
    }

    #[test]
    fn overlap_below_threshold_has_no_candidate() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        // 10x50 of 50x50 inside Z2 = 0.2.
        assert_eq!(fx.update(Point::new(260.0, 0.0)).candidate, None);
        // 20x50 of 50x50 = 0.4.
        assert_eq!(
            fx.update(Point::new(270.0, 0.0)).candidate,
            Some(DropCandidate::Zone { zone: ZoneId::from("z2") })
        );
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        let err = fx
            .begin(DragSubject::Zone(ZoneId::from("z1")), Point::ORIGIN)
            .expect_err("already dragging");
        assert!(matches!(err, LayoutError::SessionAlreadyActive { .. }));
    }

    #[test]
    fn cancel_leaves_registries_untouched() {
        let mut fx = Fixture::new();
        let items_rev = fx.items.revision();
        let zones_rev = fx.zones.revision();
        let before = fx.items.get(&a()).cloned();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        fx.update(Point::new(100.0, 100.0));
        assert!(fx.drag.cancel().is_some());
        assert!(fx.drag.cancel().is_none());
        assert_eq!(fx.items.get(&a()).cloned(), before);
        assert_eq!(fx.items.revision(), items_rev);
        assert_eq!(fx.zones.revision(), zones_rev);
    }

    #[test]
    fn non_finite_pointer_clears_candidate_and_commit_uses_origin() {
        let mut fx = Fixture::new();
        fx.items.update_position(&a(), Point::new(400.0, 400.0)).expect("move a");
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        fx.update(Point::new(-390.0, -390.0));
        let step = fx.update(Point::new(f64::NAN, 0.0));
        assert_eq!(step.candidate, None);
        let outcome = fx.commit().expect("commit");
        assert_eq!(
            outcome,
            DragOutcome::Floated {
                item: a(),
                position: Point::new(400.0, 400.0),
                from: None
            }
        );
    }

    #[test]
    fn drop_near_coordinate_limit_stays_finite() {
        let mut fx = Fixture::new();
        fx.config = LayoutConfig::default().with_grid_size(0.5);
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        fx.update(Point::new(1.0e308, 0.0));
        let outcome = fx.commit().expect("commit");
        let DragOutcome::Floated { position, .. } = outcome else {
            panic!("expected float, got {outcome:?}");
        };
        assert!(position.is_finite());
        assert_eq!(position, Point::new(1.0e308, 0.0));
        assert_eq!(fx.items.get(&a()).and_then(DraggableItem::position), Some(position));
    }

    #[test]
    fn begin_rejects_non_finite_pointer() {
        let mut fx = Fixture::new();
        let err = fx
            .begin(DragSubject::Item(a()), Point::new(f64::INFINITY, 0.0))
            .expect_err("infinite");
        assert!(matches!(err, LayoutError::InvalidInput { .. }));
        assert!(!fx.drag.is_dragging());
    }

    #[test]
    fn docked_item_drags_from_zone_origin() {
        let mut fx = Fixture::new();
        let c = DraggableItem::docked("c", "chart", SizeClass::Small, "z2", Size::new(50.0, 50.0));
        fx.zones.add_member(&ZoneId::from("z2"), &c).expect("c into z2");
        fx.items.register(c).expect("c");
        let session = fx
            .begin(DragSubject::Item(ItemId::from("c")), Point::new(310.0, 10.0))
            .expect("begin");
        assert_eq!(session.origin_position, Point::new(300.0, 0.0));

        // Drop far from every zone: undocks and floats on the grid.
        fx.update(Point::new(1014.0, 1016.0));
        let outcome = fx.commit().expect("commit");
        assert_eq!(
            outcome,
            DragOutcome::Floated {
                item: ItemId::from("c"),
                position: Point::new(1000.0, 1010.0),
                from: Some(ZoneId::from("z2"))
            }
        );
        let c = fx.items.get(&ItemId::from("c")).expect("c");
        assert!(!c.is_docked());
        assert_eq!(fx.zones.members(&ZoneId::from("z2")).map(<[ItemId]>::is_empty), Some(true));
    }

    #[test]
    fn moving_between_zones_updates_both_member_lists() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        fx.update(Point::new(60.0, 60.0));
        fx.commit().expect("dock z1");

        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin again");
        fx.update(Point::new(320.0, 20.0));
        let outcome = fx.commit().expect("dock z2");
        assert_eq!(
            outcome,
            DragOutcome::Docked {
                item: a(),
                zone: ZoneId::from("z2"),
                from: Some(ZoneId::from("z1"))
            }
        );
        assert_eq!(fx.zones.members(&ZoneId::from("z1")).map(<[ItemId]>::is_empty), Some(true));
        assert_eq!(fx.zones.members(&ZoneId::from("z2")), Some(&[a()][..]));
    }

    #[test]
    fn redock_into_same_zone_is_unchanged() {
        let mut fx = Fixture::new();
        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
        fx.update(Point::new(60.0, 60.0));
        fx.commit().expect("dock z1");
        let rev = fx.zones.revision();

        fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin again");
        fx.update(Point::new(10.0, 10.0));
        let outcome = fx.commit().expect("commit");
        assert_eq!(outcome, DragOutcome::Unchanged { subject: DragSubject::Item(a()) });
        assert_eq!(fx.zones.revision(), rev);
    }

    #[test]
    fn ties_keep_first_registered_zone() {
        let mut zones = ZoneRegistry::new();
        zones
            .register(DockZone::new("first", "First").with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .expect("first");
        zones
            .register(DockZone::new("second", "Second").with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .expect("second");
        let item = DraggableItem::floating("i", "chart", SizeClass::Small, Point::ORIGIN, Size::new(10.0, 10.0));
        let picked = select_candidate_zone(&item, &Rect::new(5.0, 5.0, 10.0, 10.0), &zones, 0.3);
        assert_eq!(picked, Some(ZoneId::from("first")));
    }

    #[test]
    fn zone_drag_reorders_stack() {
        let mut fx = Fixture::new();
        fx.zones
            .register(DockZone::new("z3", "Bottom").with_bounds(Rect::new(0.0, 200.0, 200.0, 200.0)))
            .expect("z3");
        fx.zones
            .update_bounds(&ZoneId::from("z2"), Rect::new(0.0, 400.0, 200.0, 200.0))
            .expect("z2 below z3");
        for id in ["z1", "z3", "z2"] {
            fx.stacking.insert_into_stack(ZoneId::from(id), usize::MAX);
        }

        // Drag z1 so its rectangle straddles the seam after z2 (y = 600).
        fx.begin(DragSubject::Zone(ZoneId::from("z1")), Point::new(10.0, 10.0))
            .expect("begin zone drag");
        let step = fx.update(Point::new(10.0, 600.0));
        assert_eq!(step.candidate, Some(DropCandidate::StackBoundary { index: 2 }));
        let outcome = fx.commit().expect("commit");
        assert_eq!(
            outcome,
            DragOutcome::StackReordered {
                zone: ZoneId::from("z1"),
                index: 2
            }
        );
        let order: Vec<&str> = fx.stacking.stack().iter().map(ZoneId::as_str).collect();
        assert_eq!(order, ["z3", "z2", "z1"]);
    }

    #[test]
    fn zone_drag_requires_bounds() {
        let mut fx = Fixture::new();
        fx.zones.register(DockZone::new("bare", "Bare")).expect("bare");
        let err = fx
            .begin(DragSubject::Zone(ZoneId::from("bare")), Point::ORIGIN)
            .expect_err("no bounds");
        assert!(matches!(err, LayoutError::MissingBounds { .. }));
    }

    // Tracing capture, in the style of the runtime's effect tests.

    #[derive(Debug, Clone)]
    struct CapturedEvent {
        level: tracing::Level,
        target: String,
        fields: HashMap<String, String>,
    }

    struct EventCapture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    struct FieldVisitor(Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut visitor = FieldVisitor(Vec::new());
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedEvent {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                fields: visitor.0.into_iter().collect(),
            });
        }
    }

    fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = EventCapture {
            events: Arc::clone(&events),
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        events.lock().unwrap().clone()
    }

    #[test]
    fn stale_candidate_degrades_to_floating_with_warning() {
        let mut fx = Fixture::new();
        let events = with_captured_events(|| {
            fx.begin(DragSubject::Item(a()), Point::ORIGIN).expect("begin");
            fx.update(Point::new(60.0, 60.0));
            assert_eq!(fx.drag.active_candidate_zone(), Some(&ZoneId::from("z1")));

            // Z1 fills up while the drag is in flight.
            let b = DraggableItem::docked("b", "chart", SizeClass::Small, "z1", Size::new(50.0, 50.0));
            fx.zones.add_member(&ZoneId::from("z1"), &b).expect("b into z1");
            fx.items.register(b).expect("b");

            let outcome = fx.commit().expect("commit");
            assert!(matches!(outcome, DragOutcome::Floated { .. }));
        });

        let warning = events
            .iter()
            .find(|event| event.level == tracing::Level::WARN && event.target == "cmesh.drag")
            .expect("stale-candidate warning");
        assert_eq!(warning.fields.get("zone").map(String::as_str), Some("z1"));
        assert!(
            events
                .iter()
                .any(|event| event.level == tracing::Level::DEBUG && event.target == "cmesh.drag"),
            "lifecycle debug events expected"
        );
    }
}
