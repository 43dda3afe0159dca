//! Drag-to-reorder / drag-to-reparent engine for the sidebar file tree.
//!
//! The engine is DOM-free: the sidebar feeds it pointer samples and bounding
//! boxes, and it answers with highlight changes, drop slots and commit plans.
//!
//! Data flow for one gesture:
//!
//! - [`gesture::GestureTracker`] turns press/move/release into `idle → pending → active`.
//! - [`resolver::HitTestResolver`] resolves the pointer against the
//!   [`geometry::GeometryRegistry`] on sampled moves.
//! - [`highlight::HighlightState`] keeps at most one container highlighted.
//! - [`commit`] turns the final resolution into an optimistic mutation of the
//!   [`tree::FolderTree`], persists it through [`persist::OrderBackend`] and
//!   rolls back on failure.
//! - [`session::DragController`] owns the single session and its cleanup.

pub(crate) mod commit;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod geometry;
pub(crate) mod gesture;
pub(crate) mod highlight;
pub(crate) mod persist;
pub(crate) mod resolver;
pub(crate) mod session;
pub(crate) mod tree;

pub(crate) use commit::{CommitOutcome, CommitPlan, Committer};
pub(crate) use config::{DragConfig, ListKind};
pub(crate) use error::DragError;
pub(crate) use geometry::{BoundsFn, GeometryError, Point, Rect, TargetKind, ROOT_ZONE_ID};
pub(crate) use highlight::HighlightSink;
pub(crate) use persist::OrderBackend;
pub(crate) use resolver::TargetHint;
pub(crate) use session::{DragController, DragListener, DragSurface, ReleaseOutcome};
pub(crate) use tree::{ContainerRef, FolderTree};

#[cfg(test)]
pub(crate) mod testing;
