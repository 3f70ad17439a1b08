//! The workspace facade: one consistent set of registries and controllers.
//!
//! [`LayoutWorkspace`] is the only type that holds the registries mutably.
//! Hosts read items and zones through it and change them only through its
//! operations, each of which validates before mutating and publishes its
//! [`ChangeKind`]s after the mutation is complete.

use std::time::Duration;

use cmesh_core::geometry::{Point, Rect, Size};
use cmesh_core::logging::targets;
use tracing::{debug, warn};
use web_time::Instant;

use crate::config::LayoutConfig;
use crate::drag::{DragController, DragOutcome, DragSession, DragSubject, DragUpdate};
use crate::error::{EntityKind, LayoutError, RejectReason, Result, SessionKind};
use crate::item::{DraggableItem, ItemId, ItemRegistry, SizeClass};
use crate::notify::{ChangeKind, ChangeNotifier, LayoutChange, SubscriptionId};
use crate::resize::{Publication, ResizeController, ResizeEnd, ResizeHandle, ResizeTarget};
use crate::snapshot::{LAYOUT_SNAPSHOT_SCHEMA_VERSION, LayoutInvariantReport, LayoutSnapshot};
use crate::stacking::StackingManager;
use crate::zone::{DockZone, ZoneId, ZoneRegistry};

/// Registries, controllers and configuration for one dashboard.
///
/// Workspaces are independent; several can coexist.
#[derive(Debug)]
pub struct LayoutWorkspace {
    config: LayoutConfig,
    items: ItemRegistry,
    zones: ZoneRegistry,
    drag: DragController,
    resize: ResizeController,
    stacking: StackingManager,
    notifier: ChangeNotifier,
    pub(crate) last_input_sequence: Option<u64>,
}

impl Default for LayoutWorkspace {
    fn default() -> Self {
        Self::from_valid_config(LayoutConfig::default())
    }
}

impl LayoutWorkspace {
    /// Create an empty workspace. Fails if `config` does not validate.
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: LayoutConfig) -> Self {
        Self {
            resize: ResizeController::new(config.resize_debounce()),
            config,
            items: ItemRegistry::new(),
            zones: ZoneRegistry::new(),
            drag: DragController::new(),
            stacking: StackingManager::new(),
            notifier: ChangeNotifier::new(),
            last_input_sequence: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register an item. A docked item joins its zone's members, which
    /// requires the zone to accept it.
    pub fn register_item(&mut self, item: DraggableItem) -> Result<()> {
        if self.items.contains(&item.id) {
            return Err(LayoutError::DuplicateId {
                kind: EntityKind::Item,
                id: item.id.to_string(),
            });
        }
        if !item.size.width.is_finite() || !item.size.height.is_finite() {
            return Err(LayoutError::InvalidInput {
                reason: format!("item {} has non-finite size", item.id),
            });
        }
        if item.last_floating_position().is_some_and(|p| !p.is_finite()) {
            return Err(LayoutError::InvalidInput {
                reason: format!("item {} has a non-finite position", item.id),
            });
        }
        if item.z_index == u64::MAX {
            return Err(LayoutError::InvalidInput {
                reason: format!("item {} has z-index u64::MAX; no higher value exists", item.id),
            });
        }
        if let Some(zone) = item.owner_zone() {
            self.zones.check_accept(zone, &item)?;
        }

        let id = item.id.clone();
        let owner = item.owner_zone().cloned();
        self.stacking.observe_z_index(item.z_index);
        if let Some(zone) = &owner {
            self.zones.add_member(zone, &item)?;
        }
        self.items.register(item)?;
        debug!(target: targets::WORKSPACE, item = %id, zone = ?owner.as_ref().map(ZoneId::as_str), "item registered");
        self.notifier.publish(ChangeKind::ItemRegistered { item: id });
        Ok(())
    }

    /// Remove an item, ending any drag or resize of it and leaving its zone.
    pub fn unregister_item(&mut self, id: &ItemId) -> Result<DraggableItem> {
        let owner = self
            .items
            .get(id)
            .ok_or_else(|| LayoutError::unknown_item(id))?
            .owner_zone()
            .cloned();

        let dragged = self.drag.subject() == Some(&DragSubject::Item(id.clone()));
        if dragged {
            self.drag.cancel();
        }
        self.resize.discard_target(&ResizeTarget::Item(id.clone()));
        if let Some(zone) = &owner {
            if self.zones.contains(zone) {
                self.zones.remove_member(zone, id)?;
            }
        }
        let removed = self.items.unregister(id)?;

        if dragged {
            self.notifier.publish(ChangeKind::DragEnded {
                subject: DragSubject::Item(id.clone()),
                committed: false,
            });
        }
        self.notifier
            .publish(ChangeKind::ItemUnregistered { item: id.clone() });
        Ok(removed)
    }

    pub fn register_zone(&mut self, zone: DockZone) -> Result<()> {
        let id = zone.id.clone();
        self.zones.register(zone)?;
        self.notifier.publish(ChangeKind::ZoneRegistered { zone: id });
        Ok(())
    }

    /// Remove a zone. With `force`, former members float centred on the
    /// zone's last bounds (or at the configured fallback when bounds were
    /// never observed).
    pub fn unregister_zone(&mut self, id: &ZoneId, force: bool) -> Result<DockZone> {
        let removed = self.zones.unregister(id, force)?;

        let dragged = self.drag.subject() == Some(&DragSubject::Zone(id.clone()));
        if dragged {
            self.drag.cancel();
        }
        self.resize.discard_target(&ResizeTarget::Zone(id.clone()));
        self.stacking.remove_from_stack(id);

        let center = removed.bounds.filter(Rect::is_finite).map(|b| b.center());
        let mut floated = Vec::with_capacity(removed.members.len());
        for member in &removed.members {
            let Some(size) = self.items.get(member).map(|item| item.size) else {
                continue;
            };
            let position = center.map_or(self.config.fallback_position, |c| {
                Point::new(c.x - size.width / 2.0, c.y - size.height / 2.0)
            });
            self.items.set_docked(member, None, position)?;
            self.items.update_position(member, position)?;
            floated.push(member.clone());
        }
        debug!(target: targets::WORKSPACE, zone = %id, floated = floated.len(), "zone unregistered");

        if dragged {
            self.notifier.publish(ChangeKind::DragEnded {
                subject: DragSubject::Zone(id.clone()),
                committed: false,
            });
        }
        self.notifier.publish(ChangeKind::ZoneUnregistered {
            zone: id.clone(),
            floated,
        });
        Ok(removed)
    }

    /// Record the zone's latest viewport bounds.
    pub fn update_zone_bounds(&mut self, id: &ZoneId, bounds: Rect) -> Result<()> {
        self.zones.update_bounds(id, bounds)?;
        self.notifier
            .publish(ChangeKind::ZoneBoundsUpdated { zone: id.clone() });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Drag
    // ---------------------------------------------------------------------

    pub fn begin_drag(&mut self, item: &ItemId, pointer: Point) -> Result<()> {
        self.begin_drag_subject(DragSubject::Item(item.clone()), pointer)
    }

    /// Drag a stacked zone by its frame.
    pub fn begin_zone_drag(&mut self, zone: &ZoneId, pointer: Point) -> Result<()> {
        self.begin_drag_subject(DragSubject::Zone(zone.clone()), pointer)
    }

    fn begin_drag_subject(&mut self, subject: DragSubject, pointer: Point) -> Result<()> {
        self.drag.begin(
            subject.clone(),
            pointer,
            &self.items,
            &self.zones,
            &self.config,
        )?;
        self.notifier.publish(ChangeKind::DragStarted { subject });
        Ok(())
    }

    /// Move the active drag. Publishes only when the candidate changes.
    pub fn update_drag(&mut self, pointer: Point) -> Result<DragUpdate> {
        let update = self.drag.update(
            pointer,
            &self.items,
            &self.zones,
            &self.stacking,
            &self.config,
        )?;
        if update.candidate_changed {
            if let Some(subject) = self.drag.subject().cloned() {
                self.notifier.publish(ChangeKind::DragCandidateChanged {
                    subject,
                    candidate: update.candidate.clone(),
                });
            }
        }
        Ok(update)
    }

    /// Apply the active drag and end it.
    pub fn commit_drag(&mut self) -> Result<DragOutcome> {
        let subject = self
            .drag
            .subject()
            .cloned()
            .ok_or(LayoutError::NoActiveSession {
                session: SessionKind::Drag,
            })?;
        let result = self.drag.commit(
            &mut self.items,
            &mut self.zones,
            &mut self.stacking,
            &self.config,
        );
        match &result {
            Ok(outcome) => {
                if let Some(kind) = outcome_change(outcome) {
                    self.notifier.publish(kind);
                }
                self.notifier.publish(ChangeKind::DragEnded {
                    subject,
                    committed: true,
                });
            }
            Err(err) => {
                warn!(target: targets::WORKSPACE, subject = %subject, error = %err, "drag commit failed");
                self.notifier.publish(ChangeKind::DragEnded {
                    subject,
                    committed: false,
                });
            }
        }
        result
    }

    /// Abandon the active drag. Returns `false` when nothing was dragging.
    pub fn cancel_drag(&mut self) -> bool {
        match self.drag.cancel() {
            Some(session) => {
                self.notifier.publish(ChangeKind::DragEnded {
                    subject: session.subject,
                    committed: false,
                });
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Resize
    // ---------------------------------------------------------------------

    pub fn begin_resize(&mut self, target: ResizeTarget, handle: ResizeHandle, pointer: Point) -> Result<()> {
        self.begin_resize_at(target, handle, pointer, Instant::now())
    }

    pub fn begin_resize_at(
        &mut self,
        target: ResizeTarget,
        handle: ResizeHandle,
        pointer: Point,
        now: Instant,
    ) -> Result<()> {
        let flushed = self
            .resize
            .begin(target.clone(), handle, pointer, now, &self.items, &self.zones)?;
        if let Some(publication) = flushed {
            self.apply_publication(publication);
        }
        self.notifier.publish(ChangeKind::ResizeStarted { target });
        Ok(())
    }

    pub fn update_resize(&mut self, target: &ResizeTarget, pointer: Point) -> Result<Size> {
        self.update_resize_at(target, pointer, Instant::now())
    }

    /// Track the pointer; returns the transient size. Nothing is published.
    pub fn update_resize_at(&mut self, target: &ResizeTarget, pointer: Point, now: Instant) -> Result<Size> {
        self.resize.update(target, pointer, now)
    }

    pub fn end_resize(&mut self, target: &ResizeTarget) -> Result<ResizeEnd> {
        self.end_resize_at(target, Instant::now())
    }

    pub fn end_resize_at(&mut self, target: &ResizeTarget, now: Instant) -> Result<ResizeEnd> {
        let end = self.resize.end(target, now)?;
        if let ResizeEnd::Published(publication) = &end {
            self.apply_publication(publication.clone());
        }
        Ok(end)
    }

    pub fn cancel_resize(&mut self, target: &ResizeTarget) -> Result<()> {
        self.resize.cancel(target)?;
        self.notifier
            .publish(ChangeKind::ResizeCancelled { target: target.clone() });
        Ok(())
    }

    /// Publish every deferred resize whose idle window has elapsed.
    pub fn flush_resizes(&mut self, now: Instant) -> Vec<Publication> {
        let due = self.resize.flush_due(now);
        for publication in &due {
            self.apply_publication(publication.clone());
        }
        due
    }

    /// Publish every deferred resize immediately.
    pub fn flush_all_resizes(&mut self) -> Vec<Publication> {
        let all = self.resize.flush_all();
        for publication in &all {
            self.apply_publication(publication.clone());
        }
        all
    }

    /// Earliest pending resize deadline, for host timers.
    #[must_use]
    pub fn next_resize_due(&self) -> Option<Instant> {
        self.resize.next_due()
    }

    fn apply_publication(&mut self, publication: Publication) {
        let Publication { target, size } = publication;
        let applied = match &target {
            ResizeTarget::Item(id) => self.items.update_dimensions(id, size),
            ResizeTarget::Zone(id) => self.zones.update_dimensions(id, size),
        };
        match applied {
            Ok(()) => {
                debug!(target: targets::WORKSPACE, resize = %target, width = size.width, height = size.height, "resize applied");
                self.notifier.publish(ChangeKind::Resized { target, size });
            }
            Err(err) => {
                warn!(target: targets::WORKSPACE, resize = %target, error = %err, "resize publication dropped");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Manual operations
    // ---------------------------------------------------------------------

    /// Dock `item` into `zone` without a drag.
    pub fn dock_item(&mut self, item: &ItemId, zone: &ZoneId) -> Result<()> {
        self.ensure_not_dragging(item)?;
        let current = self
            .items
            .get(item)
            .ok_or_else(|| LayoutError::unknown_item(item))?
            .clone();
        self.zones.check_accept(zone, &current)?;
        let prior = current.owner_zone().cloned();
        if prior.as_ref() == Some(zone) {
            return Ok(());
        }
        if let Some(prior) = &prior {
            if self.zones.contains(prior) {
                self.zones.remove_member(prior, item)?;
            }
        }
        self.zones.add_member(zone, &current)?;
        self.items
            .set_docked(item, Some(zone.clone()), self.config.fallback_position)?;
        self.notifier.publish(ChangeKind::ItemDocked {
            item: item.clone(),
            zone: zone.clone(),
            from: prior,
        });
        Ok(())
    }

    /// Undock `item`. It floats at `position` if given, else at its last
    /// floating position, else at the configured fallback.
    pub fn undock_item(&mut self, item: &ItemId, position: Option<Point>) -> Result<Point> {
        self.ensure_not_dragging(item)?;
        let owner = self
            .items
            .get(item)
            .ok_or_else(|| LayoutError::unknown_item(item))?
            .owner_zone()
            .cloned()
            .ok_or_else(|| LayoutError::InvalidInput {
                reason: format!("item {item} is not docked"),
            })?;
        if position.is_some_and(|p| !p.is_finite()) {
            return Err(LayoutError::InvalidInput {
                reason: format!("undock position for {item} is not finite"),
            });
        }

        if self.zones.contains(&owner) {
            self.zones.remove_member(&owner, item)?;
        }
        self.items.set_docked(item, None, self.config.fallback_position)?;
        if let Some(position) = position {
            self.items.update_position(item, position)?;
        }
        let landed = self
            .items
            .get(item)
            .and_then(DraggableItem::position)
            .unwrap_or(self.config.fallback_position);
        self.notifier.publish(ChangeKind::ItemFloated {
            item: item.clone(),
            position: landed,
            from: Some(owner),
        });
        Ok(landed)
    }

    /// Change an item's size class. A docked item must stay allowed in its
    /// zone.
    pub fn set_item_size_class(&mut self, item: &ItemId, size_class: SizeClass) -> Result<()> {
        let current = self
            .items
            .get(item)
            .ok_or_else(|| LayoutError::unknown_item(item))?;
        if let Some(zone_id) = current.owner_zone() {
            let allowed = self
                .zones
                .get(zone_id)
                .and_then(|zone| zone.allowed_size_classes.as_ref())
                .is_none_or(|classes| classes.contains(&size_class));
            if !allowed {
                return Err(LayoutError::CapacityExceeded {
                    zone: zone_id.clone(),
                    item: item.clone(),
                    reason: RejectReason::SizeClassNotAllowed { size_class },
                });
            }
        }
        self.items.update_size(item, size_class)?;
        self.notifier.publish(ChangeKind::ItemSizeClassChanged {
            item: item.clone(),
            size_class,
        });
        Ok(())
    }

    /// Raise `item` above every other item. Returns its new z-index.
    pub fn bring_to_front(&mut self, item: &ItemId) -> Result<u64> {
        if !self.items.contains(item) {
            return Err(LayoutError::unknown_item(item));
        }
        let z_index = self.stacking.next_z_index().ok_or_else(|| LayoutError::InvalidInput {
            reason: format!("cannot raise {item}: z-index space exhausted"),
        })?;
        self.items.set_z_index(item, z_index)?;
        self.notifier.publish(ChangeKind::ZIndexChanged {
            item: item.clone(),
            z_index,
        });
        Ok(z_index)
    }

    /// Move `zone` to `index` in the zone stack, adding it if absent.
    /// Returns the index actually used.
    pub fn insert_into_stack(&mut self, zone: &ZoneId, index: usize) -> Result<usize> {
        if !self.zones.contains(zone) {
            return Err(LayoutError::unknown_zone(zone));
        }
        let index = self.stacking.insert_into_stack(zone.clone(), index);
        self.notifier.publish(ChangeKind::StackReordered {
            zone: zone.clone(),
            index,
        });
        Ok(index)
    }

    /// Take `zone` out of the stack. Returns whether it was stacked.
    pub fn remove_from_stack(&mut self, zone: &ZoneId) -> bool {
        let removed = self.stacking.remove_from_stack(zone);
        if removed {
            self.notifier
                .publish(ChangeKind::StackRemoved { zone: zone.clone() });
        }
        removed
    }

    fn ensure_not_dragging(&self, item: &ItemId) -> Result<()> {
        match self.drag.subject() {
            Some(DragSubject::Item(dragged)) if dragged == item => Err(LayoutError::SessionAlreadyActive {
                active: format!("item {item}"),
            }),
            _ => Ok(()),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&DraggableItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&DockZone> {
        self.zones.get(id)
    }

    pub fn list_members(&self, zone: &ZoneId) -> Result<&[ItemId]> {
        self.zones
            .members(zone)
            .ok_or_else(|| LayoutError::unknown_zone(zone))
    }

    /// Items in registration order.
    pub fn items(&self) -> impl Iterator<Item = &DraggableItem> + '_ {
        self.items.iter()
    }

    /// Zones in registration order.
    pub fn zones(&self) -> impl Iterator<Item = &DockZone> + '_ {
        self.zones.iter()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    #[must_use]
    pub fn active_candidate_zone(&self) -> Option<&ZoneId> {
        self.drag.active_candidate_zone()
    }

    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    #[must_use]
    pub fn is_resizing(&self, target: &ResizeTarget) -> bool {
        self.resize.is_resizing(target)
    }

    #[must_use]
    pub fn resize_preview(&self, target: &ResizeTarget) -> Option<Size> {
        self.resize.preview(target)
    }

    #[must_use]
    pub fn zone_stack(&self) -> &[ZoneId] {
        self.stacking.stack()
    }

    /// Monotonic counter bumped by every observable change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LayoutChange) + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            schema_version: LAYOUT_SNAPSHOT_SCHEMA_VERSION,
            revision: self.revision(),
            items: self.items.iter().cloned().collect(),
            zones: self.zones.iter().cloned().collect(),
            zone_stack: self.stacking.stack().to_vec(),
            z_counter: self.stacking.counter(),
        }
    }

    #[must_use]
    pub fn invariant_report(&self) -> LayoutInvariantReport {
        self.snapshot().invariant_report()
    }

    /// Resize debounce window in effect.
    #[must_use]
    pub fn resize_debounce(&self) -> Option<Duration> {
        self.config.resize_debounce()
    }
}

fn outcome_change(outcome: &DragOutcome) -> Option<ChangeKind> {
    match outcome {
        DragOutcome::Docked { item, zone, from } => Some(ChangeKind::ItemDocked {
            item: item.clone(),
            zone: zone.clone(),
            from: from.clone(),
        }),
        DragOutcome::Floated {
            item,
            position,
            from,
        } => Some(ChangeKind::ItemFloated {
            item: item.clone(),
            position: *position,
            from: from.clone(),
        }),
        DragOutcome::StackReordered { zone, index } => Some(ChangeKind::StackReordered {
            zone: zone.clone(),
            index: *index,
        }),
        DragOutcome::Unchanged { .. } => None,
    }
}
