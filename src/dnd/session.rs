//! The drag session supervisor.
//!
//! [`DragController`] owns everything that lives for one gesture: the
//! [`GestureTracker`], the hover highlight and the [`DragSession`] itself.
//! Every session ends in exactly one of drop, cancel or timeout, and each of
//! those runs [`DragController::cleanup`].
//!
//! The controller never mutates the tree. A drop returns a [`CommitPlan`]; the
//! caller applies and persists it (see [`crate::dnd::commit`]) and reports back
//! through [`DragController::commit_settled`].

use crate::dnd::commit::{self, CommitOutcome, CommitPlan};
use crate::dnd::config::DragConfig;
use crate::dnd::error::DragError;
use crate::dnd::geometry::{GeometryRegistry, Point};
use crate::dnd::gesture::{GestureEvent, GesturePhase, GestureTracker};
use crate::dnd::highlight::{HighlightSink, HighlightState, SampleGate};
use crate::dnd::resolver::{HitTestResolver, ResolveInput, TargetHint};
use crate::dnd::tree::{ContainerRef, FolderTree};
use std::collections::HashSet;

/// Visual side effects of a drag, beyond the container highlight.
pub(crate) trait DragSurface: HighlightSink {
    /// Dim the dragged row.
    fn lift_item(&mut self, item: &str, opacity: f64);
    /// Translate the dragged row by the pointer's travel since the press.
    fn offset_item(&mut self, item: &str, dx: f64, dy: f64);
    /// Undo `lift_item` and `offset_item`.
    fn settle_item(&mut self, item: &str);
    /// Suppress text selection for the whole document.
    fn lock_selection(&mut self);
    fn unlock_selection(&mut self);
}

/// UI callbacks. All optional.
pub(crate) trait DragListener {
    fn on_drag_start(&mut self, _item: &str) {}
    fn on_hover_target_change(&mut self, _target: Option<&ContainerRef>) {}
    fn on_drop_slot_change(&mut self, _slot: Option<usize>) {}
    fn on_drop_committed(&mut self, _item: &str, _outcome: &CommitOutcome) {}
    fn on_drop_failed(&mut self, _item: &str, _error: &DragError) {}
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DragSession {
    pub item: String,
    pub origin: ContainerRef,
    pub origin_index: usize,
    pub phase: GesturePhase,
    pub hover: Option<ContainerRef>,
    pub slot: Option<usize>,
    pub started_ms: i64,
    pub activated_ms: Option<i64>,
}

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReleaseOutcome {
    /// No session was open.
    Ignored,
    /// Released before the drag activated: a click.
    Aborted { item: String },
    /// Dropped on nothing, or back where it started.
    Unchanged,
    /// Apply and persist this, then call `commit_settled`.
    Commit(CommitPlan),
}

pub(crate) struct DragController {
    config: DragConfig,
    registry: GeometryRegistry,
    gesture: GestureTracker,
    resolver: HitTestResolver,
    highlight: HighlightState,
    sampler: SampleGate,
    session: Option<DragSession>,
    in_flight: HashSet<String>,
    surface: Box<dyn DragSurface>,
    listener: Box<dyn DragListener>,
}

impl DragController {
    pub fn new(
        config: DragConfig,
        surface: Box<dyn DragSurface>,
        listener: Box<dyn DragListener>,
    ) -> Self {
        let config = config.validated();
        Self {
            gesture: GestureTracker::new(&config),
            resolver: HitTestResolver::new(config.axis),
            sampler: SampleGate::new(config.hover_sample_ms),
            highlight: HighlightState::default(),
            registry: GeometryRegistry::new(),
            session: None,
            in_flight: HashSet::new(),
            surface,
            listener,
            config,
        }
    }

    pub fn registry_mut(&mut self) -> &mut GeometryRegistry {
        &mut self.registry
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        matches!(&self.session, Some(s) if s.phase == GesturePhase::Active)
    }

    pub fn is_in_flight(&self, item: &str) -> bool {
        self.in_flight.contains(item)
    }

    /// Pointer down on an item row. Opens a pending session.
    pub fn press(
        &mut self,
        tree: &FolderTree,
        item: &str,
        at: Point,
        now_ms: i64,
    ) -> Result<(), DragError> {
        if self.session.is_some() || self.is_in_flight(item) {
            tracing::debug!(item, "press ignored: drag or commit still in progress");
            return Err(DragError::SessionBusy);
        }
        let (origin, origin_index) = tree.position_of(item)?;
        self.gesture.press(item, at, now_ms)?;
        self.sampler.reset();
        self.session = Some(DragSession {
            item: item.to_string(),
            origin,
            origin_index,
            phase: GesturePhase::Pending,
            hover: None,
            slot: None,
            started_ms: now_ms,
            activated_ms: None,
        });
        Ok(())
    }

    pub fn pointer_move(
        &mut self,
        tree: &FolderTree,
        at: Point,
        hint: Option<&TargetHint>,
        now_ms: i64,
    ) -> Result<(), DragError> {
        self.check_timeout(now_ms)?;

        match self.gesture.pointer_move(at, now_ms) {
            Some(GestureEvent::Activated { item, at }) => {
                self.activate(&item, now_ms);
                self.follow_pointer(&item, at);
            }
            Some(GestureEvent::Moved { item, at }) => self.follow_pointer(&item, at),
            _ => return Ok(()),
        }

        if self.sampler.admit(now_ms) {
            self.resolve_hover(tree, at, hint);
        }
        Ok(())
    }

    /// Timer hook: activates a stationary hold and enforces the session timeout.
    pub fn tick(&mut self, now_ms: i64) -> Result<(), DragError> {
        self.check_timeout(now_ms)?;
        if let Some(GestureEvent::Activated { item, .. }) = self.gesture.tick(now_ms) {
            self.activate(&item, now_ms);
        }
        Ok(())
    }

    /// Pointer up. Always closes the session.
    pub fn release(
        &mut self,
        tree: &FolderTree,
        at: Point,
        hint: Option<&TargetHint>,
        now_ms: i64,
    ) -> ReleaseOutcome {
        let Some(session) = self.session.clone() else {
            self.gesture.reset();
            return ReleaseOutcome::Ignored;
        };

        let item = match self.gesture.release(at) {
            Some(GestureEvent::Aborted { item }) => {
                self.cleanup();
                return ReleaseOutcome::Aborted { item };
            }
            Some(GestureEvent::Released { item, .. }) => item,
            _ => {
                self.cleanup();
                return ReleaseOutcome::Ignored;
            }
        };

        // The drop point is always resolved, even if the last move was sampled out.
        let resolution = self.resolver.resolve(&ResolveInput {
            registry: &self.registry,
            tree,
            dragged: &item,
            origin: &session.origin,
            point: at,
            hint,
        });
        let planned = commit::plan(tree, &item, &resolution);
        self.cleanup();

        tracing::info!(
            item = %item,
            resolution = ?resolution,
            duration_ms = now_ms - session.activated_ms.unwrap_or(session.started_ms),
            "drop"
        );

        match planned {
            Ok(plan) if plan.is_noop() => {
                self.listener.on_drop_committed(&item, &CommitOutcome::NoOp);
                ReleaseOutcome::Unchanged
            }
            Ok(plan) => {
                self.in_flight.insert(item);
                ReleaseOutcome::Commit(plan)
            }
            Err(DragError::ResolutionAmbiguous) => ReleaseOutcome::Unchanged,
            Err(e) => {
                tracing::warn!(item = %item, error = %e, "drop aborted");
                self.listener.on_drop_failed(&item, &e);
                ReleaseOutcome::Unchanged
            }
        }
    }

    /// Escape or pointer-cancel. Nothing is committed.
    pub fn cancel(&mut self) -> bool {
        match self.gesture.cancel() {
            Some(GestureEvent::Cancelled { item }) => {
                tracing::info!(item = %item, "drag cancelled");
                self.cleanup();
                true
            }
            _ => self.cleanup(),
        }
    }

    /// Report the end of a commit returned by `release`.
    pub fn commit_settled(&mut self, item: &str, result: &Result<CommitOutcome, DragError>) {
        self.in_flight.remove(item);
        match result {
            Ok(outcome) => {
                tracing::info!(item, outcome = ?outcome, "drop committed");
                self.listener.on_drop_committed(item, outcome);
            }
            Err(e) => {
                tracing::warn!(item, error = %e, "drop failed");
                self.listener.on_drop_failed(item, e);
            }
        }
    }

    /// Clear the highlight, settle the dragged row, release the selection lock
    /// and drop the session. Safe to call any number of times; returns whether
    /// there was a session to close.
    pub fn cleanup(&mut self) -> bool {
        let hover_changed = self.highlight.clear(self.surface.as_mut());
        self.gesture.reset();
        self.sampler.reset();

        let Some(session) = self.session.take() else {
            return false;
        };

        if session.activated_ms.is_some() {
            self.surface.settle_item(&session.item);
            self.surface.unlock_selection();
        }
        if hover_changed {
            self.listener.on_hover_target_change(None);
        }
        if session.slot.is_some() {
            self.listener.on_drop_slot_change(None);
        }
        true
    }

    fn check_timeout(&mut self, now_ms: i64) -> Result<(), DragError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        if now_ms - session.started_ms < self.config.session_timeout_ms {
            return Ok(());
        }
        tracing::warn!(
            item = %session.item,
            elapsed_ms = now_ms - session.started_ms,
            "drag session timed out; forcing cleanup"
        );
        self.cleanup();
        Err(DragError::SessionTimeout)
    }

    fn activate(&mut self, item: &str, now_ms: i64) {
        if let Some(session) = self.session.as_mut() {
            session.phase = GesturePhase::Active;
            session.activated_ms = Some(now_ms);
        }
        self.surface.lock_selection();
        self.surface.lift_item(item, self.config.dragged_opacity);
        self.listener.on_drag_start(item);
        tracing::debug!(item, "drag started");
    }

    fn follow_pointer(&mut self, item: &str, at: Point) {
        if let Some(origin) = self.gesture.press_point() {
            self.surface.offset_item(item, at.x - origin.x, at.y - origin.y);
        }
    }

    fn resolve_hover(&mut self, tree: &FolderTree, at: Point, hint: Option<&TargetHint>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let resolution = self.resolver.resolve(&ResolveInput {
            registry: &self.registry,
            tree,
            dragged: &session.item,
            origin: &session.origin,
            point: at,
            hint,
        });
        tracing::debug!(item = %session.item, x = at.x, y = at.y, resolution = ?resolution, "hover");

        let hover = resolution.hover_container().cloned();
        if self.highlight.set(hover.as_ref(), self.surface.as_mut()) {
            self.listener.on_hover_target_change(hover.as_ref());
        }
        session.hover = hover;

        let slot = resolution.slot();
        if session.slot != slot {
            session.slot = slot;
            self.listener.on_drop_slot_change(slot);
        }
    }
}
