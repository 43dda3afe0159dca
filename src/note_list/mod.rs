//! Notes of the open file, reorderable by dragging.
//!
//! Every row is an `Item` target in the root list; there are no containers,
//! so a drop anywhere over the rows resolves to a reorder slot.

use crate::components::ui::{Button, ButtonSize, ButtonVariant, DropIndicator, Spinner};
use crate::dnd::{ContainerRef, TargetKind};
use crate::sidebar::drop_line_position;
use crate::state::drag_sync::{use_drop_target, NoteDrag};
use crate::state::AppContext;
use leptos::html;
use leptos::prelude::*;

#[component]
pub fn NoteList() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let lane = app_state.0.notes;

    let ids = move || {
        lane.tree
            .with(|t| t.children(&ContainerRef::Root).map(<[String]>::to_vec).unwrap_or_default())
    };

    let drop_line = Memo::new(move |_| {
        let dragged = lane.dragging.get()?;
        let slot = lane.drop_slot.get()?;
        lane.tree.with(|t| drop_line_position(t, &dragged, slot))
    });
    let line_at_end = move || drop_line.with(|l| matches!(l, Some((_, None))));

    let loading = app_state.0.notes_loading;
    let error = app_state.0.notes_error;
    let st_retry = app_state.0.clone();
    let empty = move || !loading.get() && error.with(Option::is_none) && lane.tree.with(|t| t.item_count() == 0);

    view! {
        <section data-drop-list="notes" class="mt-6 flex max-w-2xl flex-col gap-1">
            <div class="flex items-center gap-2">
                <h2 class="text-xs font-semibold uppercase tracking-wide text-muted-foreground">"Notes"</h2>
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner label="Loading notes" />
                </Show>
            </div>

            {move || error.get().map(|e| {
                let st_retry = st_retry.clone();
                view! {
                    <div class="rounded-md border border-destructive/40 px-2 py-1 text-xs text-destructive">
                        <span>{e}</span>
                        " "
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=move |_| st_retry.reload_notes()>
                            "Retry"
                        </Button>
                    </div>
                }
            })}

            <Show when=empty fallback=|| ().into_view()>
                <p class="text-sm text-muted-foreground">"This file has no notes."</p>
            </Show>

            <div class="flex flex-col gap-1">
                {move || {
                    ids()
                        .into_iter()
                        .map(|id| {
                            let above = id.clone();
                            let line_before = move || {
                                drop_line.with(|l| matches!(l, Some((_, Some(row))) if *row == above))
                            };
                            view! {
                                <Show when=line_before fallback=|| ().into_view()>
                                    <DropIndicator />
                                </Show>
                                <NoteRow note_id=id />
                            }
                        })
                        .collect_view()
                }}
                <Show when=line_at_end fallback=|| ().into_view()>
                    <DropIndicator />
                </Show>
            </div>
        </section>
    }
}

#[component]
fn NoteRow(note_id: String) -> impl IntoView {
    let sync = expect_context::<NoteDrag>();
    let lane = sync.lane();

    let node: NodeRef<html::Div> = NodeRef::new();
    use_drop_target(
        sync.clone(),
        note_id.clone(),
        TargetKind::Item {
            container: ContainerRef::Root,
        },
        0,
        node,
    );

    let id = note_id.clone();
    let label = move || {
        lane.tree
            .with(|t| t.item(&id).map(|i| i.display_name.clone()))
            .unwrap_or_default()
    };

    let id = note_id.clone();
    let style = move || {
        lane.lifted.with(|l| match l {
            Some(l) if l.item == id => format!(
                "transform: translate({}px, {}px); opacity: {}; pointer-events: none; position: relative; z-index: 10;",
                l.dx, l.dy, l.opacity
            ),
            _ => String::new(),
        })
    };

    let id = note_id.clone();
    let on_pointerdown = move |ev: web_sys::PointerEvent| sync.press(&id, &ev);

    view! {
        <div
            node_ref=node
            data-drop-kind="item"
            data-drop-id=note_id
            class="flex cursor-grab touch-none select-none items-center rounded-md border border-border px-3 py-2 text-sm hover:bg-accent/60"
            style=style
            on:pointerdown=on_pointerdown
        >
            <span class="min-w-0 flex-1 truncate">{label}</span>
        </div>
    }
}
