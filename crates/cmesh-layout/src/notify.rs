//! Revision counter and change subscriptions.
//!
//! Every observable change bumps the workspace revision by exactly one and is
//! delivered to subscribers as a [`LayoutChange`]. Changes are published only
//! after the operation that caused them has finished mutating, so a
//! subscriber never sees a half-applied commit.

use std::fmt;

use cmesh_core::geometry::{Point, Size};
use serde::Serialize;

use crate::drag::{DragSubject, DropCandidate};
use crate::item::{ItemId, SizeClass};
use crate::resize::ResizeTarget;
use crate::zone::ZoneId;

/// What changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeKind {
    ItemRegistered {
        item: ItemId,
    },
    ItemUnregistered {
        item: ItemId,
    },
    ZoneRegistered {
        zone: ZoneId,
    },
    ZoneUnregistered {
        zone: ZoneId,
        /// Former members that were floated by a forced removal.
        floated: Vec<ItemId>,
    },
    ZoneBoundsUpdated {
        zone: ZoneId,
    },
    ItemDocked {
        item: ItemId,
        zone: ZoneId,
        from: Option<ZoneId>,
    },
    ItemFloated {
        item: ItemId,
        position: Point,
        from: Option<ZoneId>,
    },
    ItemSizeClassChanged {
        item: ItemId,
        size_class: SizeClass,
    },
    Resized {
        target: ResizeTarget,
        size: Size,
    },
    ZIndexChanged {
        item: ItemId,
        z_index: u64,
    },
    StackReordered {
        zone: ZoneId,
        index: usize,
    },
    StackRemoved {
        zone: ZoneId,
    },
    DragStarted {
        subject: DragSubject,
    },
    DragCandidateChanged {
        subject: DragSubject,
        candidate: Option<DropCandidate>,
    },
    DragEnded {
        subject: DragSubject,
        committed: bool,
    },
    ResizeStarted {
        target: ResizeTarget,
    },
    ResizeCancelled {
        target: ResizeTarget,
    },
}

/// One published change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutChange {
    /// Workspace revision after this change.
    pub revision: u64,
    pub kind: ChangeKind,
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&LayoutChange)>;

/// Revision counter plus subscriber list.
#[derive(Default)]
pub struct ChangeNotifier {
    revision: u64,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LayoutChange) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        before != self.subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Bump the revision and deliver `kind` to every subscriber in
    /// subscription order. Returns the new revision.
    pub fn publish(&mut self, kind: ChangeKind) -> u64 {
        self.revision = self.revision.wrapping_add(1);
        let change = LayoutChange {
            revision: self.revision,
            kind,
        };
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&change);
        }
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_bumps_revision_and_delivers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = ChangeNotifier::new();
        let first = Rc::clone(&seen);
        notifier.subscribe(move |change| first.borrow_mut().push(("first", change.revision)));
        let second = Rc::clone(&seen);
        notifier.subscribe(move |change| second.borrow_mut().push(("second", change.revision)));

        let rev = notifier.publish(ChangeKind::ZoneRegistered {
            zone: ZoneId::from("z"),
        });
        assert_eq!(rev, 1);
        assert_eq!(*seen.borrow(), [("first", 1), ("second", 1)]);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let count = Rc::new(RefCell::new(0_u32));
        let mut notifier = ChangeNotifier::new();
        let counter = Rc::clone(&count);
        let id = notifier.subscribe(move |_| *counter.borrow_mut() += 1);
        notifier.publish(ChangeKind::ItemRegistered { item: ItemId::from("a") });
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(ChangeKind::ItemUnregistered { item: ItemId::from("a") });
        assert_eq!(*count.borrow(), 1);
        assert_eq!(notifier.revision(), 2);
    }

    #[test]
    fn change_serializes_with_tag() {
        let change = LayoutChange {
            revision: 3,
            kind: ChangeKind::StackReordered {
                zone: ZoneId::from("z"),
                index: 1,
            },
        };
        let json = serde_json::to_value(&change).expect("serialize");
        assert_eq!(json["kind"]["change"], "stack_reordered");
        assert_eq!(json["kind"]["zone"], "z");
    }
}
