//! Fixtures shared by the engine's unit tests.

use crate::api::{ApiError, ApiErrorKind, ApiResult};
use crate::dnd::commit::CommitOutcome;
use crate::dnd::error::DragError;
use crate::dnd::geometry::{BoundsFn, Rect};
use crate::dnd::highlight::HighlightSink;
use crate::dnd::persist::OrderBackend;
use crate::dnd::session::{DragListener, DragSurface};
use crate::dnd::tree::ContainerRef;
use crate::models::{Folder, Note, NoteFile};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) fn file(id: &str, order: i64, folder_id: Option<&str>) -> NoteFile {
    NoteFile {
        id: id.to_string(),
        name: format!("{id}.md"),
        order,
        folder_id: folder_id.map(str::to_string),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub(crate) fn folder(id: &str, name: &str) -> Folder {
    Folder {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub(crate) fn note(id: &str, order: i64, content: &str) -> Note {
    Note {
        id: id.to_string(),
        content: content.to_string(),
        format: "text".to_string(),
        order,
        file_id: Some("1".to_string()),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub(crate) fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn fixed(left: f64, top: f64, width: f64, height: f64) -> BoundsFn {
    Box::new(move || Ok(Rect::new(left, top, width, height)))
}

/// A 200x20 list row at position `index`.
pub(crate) fn row(index: usize) -> BoundsFn {
    fixed(0.0, index as f64 * 20.0, 200.0, 20.0)
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SurfaceCall {
    Apply(ContainerRef),
    Clear(ContainerRef),
    Lift(String),
    Offset(String, f64, f64),
    Settle(String),
    Lock,
    Unlock,
}

#[derive(Default)]
struct SurfaceLog {
    calls: Vec<SurfaceCall>,
    highlighted: Vec<ContainerRef>,
    max_highlighted: usize,
}

/// Records every visual mutation. Clones share the same log.
#[derive(Clone, Default)]
pub(crate) struct RecordingSurface {
    log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.log.borrow().calls.clone()
    }

    /// Calls other than offsets, which fire on every move.
    pub fn calls_without_offsets(&self) -> Vec<SurfaceCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, SurfaceCall::Offset(..)))
            .collect()
    }

    pub fn highlighted(&self) -> Vec<ContainerRef> {
        self.log.borrow().highlighted.clone()
    }

    pub fn max_concurrent_highlights(&self) -> usize {
        self.log.borrow().max_highlighted
    }

    fn push(&self, call: SurfaceCall) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl HighlightSink for RecordingSurface {
    fn apply_highlight(&mut self, target: &ContainerRef) {
        self.push(SurfaceCall::Apply(target.clone()));
        let mut log = self.log.borrow_mut();
        if !log.highlighted.contains(target) {
            log.highlighted.push(target.clone());
        }
        log.max_highlighted = log.max_highlighted.max(log.highlighted.len());
    }

    fn clear_highlight(&mut self, target: &ContainerRef) {
        self.push(SurfaceCall::Clear(target.clone()));
        self.log.borrow_mut().highlighted.retain(|c| c != target);
    }
}

impl DragSurface for RecordingSurface {
    fn lift_item(&mut self, item: &str, _opacity: f64) {
        self.push(SurfaceCall::Lift(item.to_string()));
    }

    fn offset_item(&mut self, item: &str, dx: f64, dy: f64) {
        self.push(SurfaceCall::Offset(item.to_string(), dx, dy));
    }

    fn settle_item(&mut self, item: &str) {
        self.push(SurfaceCall::Settle(item.to_string()));
    }

    fn lock_selection(&mut self) {
        self.push(SurfaceCall::Lock);
    }

    fn unlock_selection(&mut self) {
        self.push(SurfaceCall::Unlock);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ListenerEvent {
    Start(String),
    Hover(Option<ContainerRef>),
    Slot(Option<usize>),
    Committed(String, CommitOutcome),
    /// Item and the error's message.
    Failed(String, String),
}

#[derive(Clone, Default)]
pub(crate) struct RecordingListener {
    events: Rc<RefCell<Vec<ListenerEvent>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.borrow().clone()
    }
}

impl DragListener for RecordingListener {
    fn on_drag_start(&mut self, item: &str) {
        self.events.borrow_mut().push(ListenerEvent::Start(item.to_string()));
    }

    fn on_hover_target_change(&mut self, target: Option<&ContainerRef>) {
        self.events.borrow_mut().push(ListenerEvent::Hover(target.cloned()));
    }

    fn on_drop_slot_change(&mut self, slot: Option<usize>) {
        self.events.borrow_mut().push(ListenerEvent::Slot(slot));
    }

    fn on_drop_committed(&mut self, item: &str, outcome: &CommitOutcome) {
        self.events
            .borrow_mut()
            .push(ListenerEvent::Committed(item.to_string(), outcome.clone()));
    }

    fn on_drop_failed(&mut self, item: &str, error: &DragError) {
        self.events
            .borrow_mut()
            .push(ListenerEvent::Failed(item.to_string(), error.to_string()));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BackendCall {
    Fetch(ContainerRef),
    Reorder(ContainerRef, Vec<String>),
    Reparent(String, ContainerRef),
}

#[derive(Default)]
struct BackendState {
    calls: Vec<BackendCall>,
    failing: bool,
    orders: HashMap<ContainerRef, Vec<String>>,
}

/// In-memory backend. Clones share state, so a test can keep one handle
/// while the committer owns another.
#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Rc<RefCell<BackendState>>,
}

impl MockBackend {
    pub fn failing() -> Self {
        let backend = Self::default();
        backend.set_failing(true);
        backend
    }

    pub fn with_order(self, container: ContainerRef, order: Vec<String>) -> Self {
        self.state.borrow_mut().orders.insert(container, order);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    /// Persist calls only; fetches are left out.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| !matches!(c, BackendCall::Fetch(_)))
            .cloned()
            .collect()
    }

    fn record(&self, call: BackendCall) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.failing {
            return Err(ApiError::new(ApiErrorKind::Http, "Request failed (500): boom"));
        }
        Ok(())
    }
}

impl OrderBackend for MockBackend {
    fn fetch_order<'a>(&'a self, container: &'a ContainerRef) -> LocalBoxFuture<'a, ApiResult<Vec<String>>> {
        Box::pin(async move {
            self.record(BackendCall::Fetch(container.clone()))?;
            Ok(self
                .state
                .borrow()
                .orders
                .get(container)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn persist_reorder<'a>(
        &'a self,
        container: &'a ContainerRef,
        ordered_item_ids: &'a [String],
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let result = self.record(BackendCall::Reorder(container.clone(), ordered_item_ids.to_vec()));
            if result.is_ok() {
                self.state
                    .borrow_mut()
                    .orders
                    .insert(container.clone(), ordered_item_ids.to_vec());
            }
            result
        })
    }

    fn persist_reparent<'a>(
        &'a self,
        item_id: &'a str,
        new_container: &'a ContainerRef,
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        Box::pin(async move { self.record(BackendCall::Reparent(item_id.to_string(), new_container.clone())) })
    }
}
