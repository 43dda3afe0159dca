use crate::api::{ApiClient, NoteOrder};
use crate::dnd::commit::{self, apply_reconciled, persist, settle};
use crate::dnd::{
    BoundsFn, CommitOutcome, CommitPlan, Committer, ContainerRef, DragConfig, DragController,
    DragError, DragListener, DragSurface, GeometryError, HighlightSink, ListKind, OrderBackend,
    Point, Rect, ReleaseOutcome, TargetHint, TargetKind,
};
use crate::state::{AppContext, DragLane, LiftedRow};
use crate::util::now_ms;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use wasm_bindgen::JsCast;

/// Cadence of the hold/timeout timer.
const TICK_MS: i32 = 50;

/// Writes drag visuals into a lane's signals; the list renders from them.
struct SignalSurface {
    lane: DragLane,
}

impl HighlightSink for SignalSurface {
    fn apply_highlight(&mut self, target: &ContainerRef) {
        self.lane.highlighted.set(Some(target.clone()));
    }

    fn clear_highlight(&mut self, target: &ContainerRef) {
        self.lane.highlighted.update(|h| {
            if h.as_ref() == Some(target) {
                *h = None;
            }
        });
    }
}

impl DragSurface for SignalSurface {
    fn lift_item(&mut self, item: &str, opacity: f64) {
        self.lane.lifted.set(Some(LiftedRow {
            item: item.to_string(),
            dx: 0.0,
            dy: 0.0,
            opacity,
        }));
    }

    fn offset_item(&mut self, item: &str, dx: f64, dy: f64) {
        self.lane.lifted.update(|l| {
            if let Some(l) = l.as_mut().filter(|l| l.item == item) {
                l.dx = dx;
                l.dy = dy;
            }
        });
    }

    fn settle_item(&mut self, _item: &str) {
        self.lane.lifted.set(None);
    }

    fn lock_selection(&mut self) {
        set_body_user_select("none");
    }

    fn unlock_selection(&mut self) {
        set_body_user_select("");
    }
}

fn set_body_user_select(value: &str) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };
    let style = body.style();
    let _ = if value.is_empty() {
        style.remove_property("user-select").map(|_| ())
    } else {
        style.set_property("user-select", value)
    };
}

struct SignalListener {
    app_state: AppContext,
    lane: DragLane,
}

impl DragListener for SignalListener {
    fn on_drag_start(&mut self, item: &str) {
        self.lane.dragging.set(Some(item.to_string()));
        self.lane.suppress_click.set(true);
    }

    fn on_hover_target_change(&mut self, target: Option<&ContainerRef>) {
        // Hovering a collapsed folder is not enough to open it; dropping is.
        tracing::trace!(hovered = ?target, "hover target");
    }

    fn on_drop_slot_change(&mut self, slot: Option<usize>) {
        self.lane.drop_slot.set(slot);
    }

    fn on_drop_committed(&mut self, item: &str, outcome: &CommitOutcome) {
        if let CommitOutcome::Reparented {
            to: ContainerRef::Folder(folder_id),
            ..
        } = outcome
        {
            self.app_state.0.expand_folder(folder_id);
        }
        tracing::debug!(item, "drop settled");
    }

    fn on_drop_failed(&mut self, item: &str, error: &DragError) {
        if error.is_user_visible() {
            let name = self
                .lane
                .tree
                .with_untracked(|t| t.item(item).map(|i| i.display_name.clone()))
                .unwrap_or_else(|| item.to_string());
            self.app_state
                .0
                .show_notice(format!("Could not move \u{201c}{name}\u{201d}: {error}"));
        }
    }
}

/// Connects the DOM to one list's drag controller.
///
/// Responsibilities:
/// - window-level pointer/keyboard listeners for the active gesture
/// - the hold/timeout timer
/// - running commits (apply, persist, settle, reconcile) outside the
///   controller borrow
/// - drop-target registration for the list's rows
pub(crate) struct DragSync<B: 'static> {
    app_state: AppContext,
    lane: DragLane,
    kind: ListKind,
    controller: StoredValue<DragController, LocalStorage>,
    committer: StoredValue<Committer<B>, LocalStorage>,
    straggler_cleanup_ms: i32,

    /// Global listeners (keep handles alive).
    _move_handle: StoredValue<Option<WindowListenerHandle>>,
    _up_handle: StoredValue<Option<WindowListenerHandle>>,
    _cancel_handle: StoredValue<Option<WindowListenerHandle>>,
    _key_handle: StoredValue<Option<WindowListenerHandle>>,
    _blur_handle: StoredValue<Option<WindowListenerHandle>>,
    tick_timer_id: RwSignal<Option<i32>>,
}

/// Sidebar files: reorder within a folder, move between folders.
pub(crate) type FileDrag = DragSync<ApiClient>;
/// Notes of the open file: reorder only.
pub(crate) type NoteDrag = DragSync<NoteOrder>;

impl<B: 'static> Clone for DragSync<B> {
    fn clone(&self) -> Self {
        Self {
            app_state: self.app_state.clone(),
            lane: self.lane,
            kind: self.kind,
            controller: self.controller,
            committer: self.committer,
            straggler_cleanup_ms: self.straggler_cleanup_ms,
            _move_handle: self._move_handle,
            _up_handle: self._up_handle,
            _cancel_handle: self._cancel_handle,
            _key_handle: self._key_handle,
            _blur_handle: self._blur_handle,
            tick_timer_id: self.tick_timer_id,
        }
    }
}

impl<B> DragSync<B>
where
    B: OrderBackend + Clone + 'static,
{
    pub fn new(app_state: AppContext, lane: DragLane, kind: ListKind, backend: B) -> Self {
        let config = DragConfig::from_env(kind);
        let straggler_cleanup_ms = config.straggler_cleanup_ms.clamp(0, i32::MAX as i64) as i32;
        let controller = DragController::new(
            config,
            Box::new(SignalSurface { lane }),
            Box::new(SignalListener {
                app_state: app_state.clone(),
                lane,
            }),
        );

        let s = Self {
            app_state,
            lane,
            kind,
            controller: StoredValue::new_local(controller),
            committer: StoredValue::new_local(Committer::new(backend)),
            straggler_cleanup_ms,
            _move_handle: StoredValue::new(None),
            _up_handle: StoredValue::new(None),
            _cancel_handle: StoredValue::new(None),
            _key_handle: StoredValue::new(None),
            _blur_handle: StoredValue::new(None),
            tick_timer_id: RwSignal::new(None),
        };

        s.start_global_listeners();
        s.start_tick_worker();

        s
    }

    pub fn lane(&self) -> DragLane {
        self.lane
    }

    /// Returns the registration token, or `None` once the controller is gone.
    pub fn register(&self, id: &str, kind: TargetKind, layer: i32, bounds: BoundsFn) -> Option<u64> {
        let id = id.to_string();
        self.controller
            .try_update_value(move |c| c.registry_mut().register_layered(id, kind, layer, bounds))
    }

    pub fn unregister(&self, id: &str, token: u64) {
        self.controller
            .try_update_value(|c| c.registry_mut().unregister_token(id, token));
    }

    pub fn set_root_region(&self, bounds: Option<BoundsFn>) {
        self.controller.try_update_value(move |c| match bounds {
            Some(b) => c.registry_mut().designate_root_region(b),
            None => c.registry_mut().clear_root_region(),
        });
    }

    /// Pointer down on a row of this list.
    pub fn press(&self, item: &str, ev: &web_sys::PointerEvent) {
        // Primary button only.
        if ev.button() != 0 {
            return;
        }
        self.lane.suppress_click.set(false);

        // One drag at a time across every list.
        if self.app_state.0.is_dragging() {
            tracing::debug!(item, list = %self.kind, "press ignored: another list is dragging");
            return;
        }

        let at = point_of(ev);
        let tree = self.lane.tree;
        let result = tree.with_untracked(|tree| {
            self.controller
                .try_update_value(|c| c.press(tree, item, at, now_ms()))
        });
        if let Some(Err(e)) = result {
            tracing::debug!(item, list = %self.kind, error = %e, "press ignored");
        }
    }

    fn on_pointer_move(&self, ev: &web_sys::PointerEvent) {
        let hint = hint_of(ev, self.kind);
        let at = point_of(ev);
        let tree = self.lane.tree;
        let result = tree.with_untracked(|tree| {
            self.controller
                .try_update_value(|c| c.pointer_move(tree, at, hint.as_ref(), now_ms()))
        });
        if let Some(Err(DragError::SessionTimeout)) = result {
            self.after_session_end();
        }
    }

    fn on_pointer_up(&self, ev: &web_sys::PointerEvent) {
        let hint = hint_of(ev, self.kind);
        let at = point_of(ev);
        let tree = self.lane.tree;
        let outcome = tree
            .with_untracked(|tree| {
                self.controller
                    .try_update_value(|c| c.release(tree, at, hint.as_ref(), now_ms()))
            })
            .unwrap_or(ReleaseOutcome::Ignored);

        match outcome {
            // A plain click: the row's click handler takes it from here.
            ReleaseOutcome::Ignored | ReleaseOutcome::Aborted { .. } => {}
            ReleaseOutcome::Unchanged => self.after_session_end(),
            ReleaseOutcome::Commit(plan) => {
                self.after_session_end();
                self.run_commit(plan);
            }
        }
    }

    /// Escape, pointer-cancel or window blur.
    pub fn cancel(&self) {
        if self.controller.try_update_value(|c| c.cancel()).unwrap_or(false) {
            self.after_session_end();
        }
    }

    fn tick(&self) {
        let now = now_ms();
        if let Some(Err(DragError::SessionTimeout)) =
            self.controller.try_update_value(|c| c.tick(now))
        {
            self.after_session_end();
        }
    }

    fn after_session_end(&self) {
        self.lane.dragging.set(None);
        self.schedule_straggler_cleanup();
    }

    /// Second cleanup pass shortly after the drop, for feedback written by
    /// events that were already queued when the session closed.
    fn schedule_straggler_cleanup(&self) {
        let s = self.clone();
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
            wasm_bindgen::closure::Closure::once_into_js(move || {
                let closed = s.controller.try_update_value(|c| {
                    if c.session().is_none() {
                        c.cleanup();
                        true
                    } else {
                        false
                    }
                });
                // A new drag may have started in the meantime.
                if closed != Some(true) {
                    return;
                }
                s.lane.clear_feedback();
                set_body_user_select("");
            })
            .as_ref()
            .unchecked_ref(),
            self.straggler_cleanup_ms,
        );
    }

    /// Apply optimistically, persist, settle, then refetch whatever settle
    /// reported stale. Runs after the controller borrow has ended.
    fn run_commit(&self, plan: CommitPlan) {
        let item = plan.item().to_string();
        let tree = self.lane.tree;

        let applied = tree
            .try_update(|tree| commit::apply(tree, plan))
            .unwrap_or_else(|| Err(DragError::InvariantViolation("list is gone".to_string())));
        let pending = match applied {
            Ok(p) => p,
            Err(e) => {
                self.controller
                    .try_update_value(|c| c.commit_settled(&item, &Err(e)));
                return;
            }
        };

        // The backend in use when the drop happened, even if the list is
        // retargeted while the request is in flight.
        let Some(committer) = self.committer.try_get_value() else {
            return;
        };
        let s = self.clone();
        spawn_local(async move {
            let result = persist(committer.backend(), &pending).await;

            let Some(settled) = tree.try_update(|tree| settle(tree, pending, result)) else {
                return;
            };
            s.controller
                .try_update_value(|c| c.commit_settled(&item, &settled.outcome));

            for container in settled.stale {
                s.reconcile(&container).await;
            }
        });
    }

    /// Replace `container`'s local order with the backend's. Falls back to a
    /// full reload when the two disagree on membership.
    async fn reconcile(&self, container: &ContainerRef) {
        let Some(committer) = self.committer.try_get_value() else {
            return;
        };
        match committer.reconcile(container).await {
            Ok(order) => match self.lane.tree.try_update(|t| apply_reconciled(t, container, order)) {
                Some(Ok(changed)) => {
                    tracing::debug!(list = %self.kind, container = %container, changed, "reconciled");
                }
                Some(Err(e)) => {
                    tracing::info!(list = %self.kind, container = %container, error = %e, "reconcile mismatch; reloading");
                    self.reload();
                }
                None => {}
            },
            Err(e) => {
                tracing::warn!(list = %self.kind, container = %container, error = %e, "reconcile failed");
            }
        }
    }

    fn reload(&self) {
        match self.kind {
            ListKind::Files => self.app_state.0.load_tree(),
            ListKind::Notes => self.app_state.0.reload_notes(),
        }
    }

    fn start_tick_worker(&self) {
        if self.tick_timer_id.get_untracked().is_some() {
            return;
        }
        let Some(win) = web_sys::window() else {
            return;
        };

        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::wrap(Box::new(move || {
            s2.tick();
        }) as Box<dyn FnMut()>);

        let tid = win
            .set_interval_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                TICK_MS,
            )
            .unwrap_or(0);
        self.tick_timer_id.set(Some(tid));

        // Global controller lives for app lifetime; no on_cleanup needed.
        cb.forget();
    }

    fn start_global_listeners(&self) {
        let s = self.clone();
        let handle = window_event_listener(ev::pointermove, move |ev: web_sys::PointerEvent| {
            s.on_pointer_move(&ev);
        });
        self._move_handle.set_value(Some(handle));

        let s = self.clone();
        let handle = window_event_listener(ev::pointerup, move |ev: web_sys::PointerEvent| {
            s.on_pointer_up(&ev);
        });
        self._up_handle.set_value(Some(handle));

        let s = self.clone();
        let handle = window_event_listener(ev::pointercancel, move |_ev: web_sys::PointerEvent| {
            s.cancel();
        });
        self._cancel_handle.set_value(Some(handle));

        let s = self.clone();
        let handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
            if ev.key() == "Escape" {
                s.cancel();
            }
        });
        self._key_handle.set_value(Some(handle));

        let s = self.clone();
        let handle = window_event_listener(ev::blur, move |_ev: web_sys::FocusEvent| {
            s.cancel();
        });
        self._blur_handle.set_value(Some(handle));
    }
}

impl NoteDrag {
    /// Point the note list at another file. Any drag in progress is dropped
    /// first; commits already in flight finish against the old file.
    pub fn retarget(&self, file_id: Option<String>) {
        self.cancel();
        let client = self.app_state.0.api_client.get_value();
        self.committer
            .try_update_value(|c| *c = Committer::new(NoteOrder::new(client, file_id)));
    }
}

/// Register the element behind `node` with `sync` once it mounts; unregister
/// on cleanup.
pub(crate) fn use_drop_target<B>(
    sync: DragSync<B>,
    id: String,
    kind: TargetKind,
    layer: i32,
    node: NodeRef<html::Div>,
) where
    B: OrderBackend + Clone + 'static,
{
    let token: StoredValue<Option<u64>> = StoredValue::new(None);

    let s = sync.clone();
    let reg_id = id.clone();
    Effect::new(move |_| {
        if let Some(el) = node.get() {
            let el: web_sys::Element = el.into();
            let t = s.register(&reg_id, kind.clone(), layer, element_bounds(reg_id.clone(), el));
            token.set_value(t);
        }
    });

    on_cleanup(move || {
        if let Some(t) = token.try_get_value().flatten() {
            sync.unregister(&id, t);
        }
    });
}

fn point_of(ev: &web_sys::PointerEvent) -> Point {
    Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

/// The drop hint of the element under the pointer, from its closest
/// `data-drop-kind` ancestor. Only elements inside this list's
/// `data-drop-list` count: ids are not unique across lists.
fn hint_of(ev: &web_sys::PointerEvent, list: ListKind) -> Option<TargetHint> {
    let el = ev.target()?.dyn_into::<web_sys::Element>().ok()?;
    let scope = el.closest("[data-drop-list]").ok().flatten()?;
    if scope.get_attribute("data-drop-list").as_deref() != Some(list.to_string().as_str()) {
        return None;
    }
    let zone = el.closest("[data-drop-kind]").ok().flatten()?;
    TargetHint::from_attrs(
        zone.get_attribute("data-drop-kind").as_deref(),
        zone.get_attribute("data-drop-id").as_deref(),
    )
}

/// Live bounds of a mounted element.
pub(crate) fn element_bounds(id: String, el: web_sys::Element) -> BoundsFn {
    Box::new(move || {
        if !el.is_connected() {
            return Err(GeometryError::Detached(id.clone()));
        }
        let r = el.get_bounding_client_rect();
        Ok(Rect::new(r.left(), r.top(), r.width(), r.height()))
    })
}
