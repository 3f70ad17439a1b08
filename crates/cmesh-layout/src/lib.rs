#![forbid(unsafe_code)]

//! Floating and dockable panel layout for Cognitive Mesh dashboards.
//!
//! A [`LayoutWorkspace`] owns every item and zone of one dashboard. Hosts
//! register panels ([`DraggableItem`]) and dock regions ([`DockZone`]),
//! forward pointer gestures as drag and resize operations, and re-render
//! whenever [`LayoutWorkspace::revision`] moves or a subscriber is notified.
//!
//! # Example
//!
//! ```
//! use cmesh_core::geometry::{Point, Rect, Size};
//! use cmesh_layout::{DockZone, DraggableItem, DragOutcome, ItemId, LayoutWorkspace, SizeClass, ZoneId};
//!
//! let mut ws = LayoutWorkspace::default();
//! ws.register_zone(DockZone::new("left", "Left").with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0)))?;
//! ws.register_item(DraggableItem::floating(
//!     "chart",
//!     "line-chart",
//!     SizeClass::Medium,
//!     Point::new(400.0, 400.0),
//!     Size::new(50.0, 50.0),
//! ))?;
//!
//! let chart = ItemId::from("chart");
//! ws.begin_drag(&chart, Point::new(410.0, 410.0))?;
//! ws.update_drag(Point::new(70.0, 70.0))?;
//! assert_eq!(ws.active_candidate_zone(), Some(&ZoneId::from("left")));
//!
//! let outcome = ws.commit_drag()?;
//! assert!(matches!(outcome, DragOutcome::Docked { .. }));
//! assert_eq!(ws.list_members(&ZoneId::from("left"))?, &[chart]);
//! # Ok::<(), cmesh_layout::LayoutError>(())
//! ```

pub mod config;
pub mod drag;
pub mod error;
pub mod input;
pub mod item;
pub mod notify;
pub mod resize;
pub mod snapshot;
pub mod stacking;
pub mod workspace;
pub mod zone;

pub use config::LayoutConfig;
pub use drag::{DragOutcome, DragSession, DragSubject, DragUpdate, DropCandidate};
pub use error::{EntityKind, LayoutError, RejectReason, Result, SessionKind};
pub use input::{IgnoredReason, InputOutcome, LayoutInputEvent, LayoutInputKind};
pub use item::{DraggableItem, ItemId, ItemKind, ItemPlacement, SizeClass, SizeConstraints};
pub use notify::{ChangeKind, LayoutChange, SubscriptionId};
pub use resize::{Publication, ResizeEnd, ResizeHandle, ResizeTarget};
pub use snapshot::{LayoutInvariantCode, LayoutInvariantReport, LayoutSnapshot};
pub use stacking::StackAxis;
pub use workspace::LayoutWorkspace;
pub use zone::{DockZone, ZoneId};
