#![forbid(unsafe_code)]

//! Core: geometry, pointer input, and logging for the Cognitive Mesh layout
//! engine.
//!
//! # Role in Cognitive Mesh
//! `cmesh-core` holds everything the layout engine needs that carries no
//! layout state of its own: rectangle overlap and grid snapping, normalized
//! pointer events with move coalescing, and the logging facade.
//!
//! # How it fits in the system
//! `cmesh-layout` builds its registries and controllers on these types. A
//! presentation layer converts host pointer events into [`input::PointerEvent`]
//! values and reads [`geometry::Rect`] bounds back out to render.

pub mod geometry;
pub mod input;
pub mod logging;

pub use geometry::{Point, Rect, Size, overlap_fraction, rect_overlap_area, snap_to_grid};
