//! File sidebar: folders, root files and the drop targets the drag engine
//! resolves against.
//!
//! Registration layout:
//! - each file row is an `Item` target tagged with its folder (or root),
//! - each folder *header* is a `Container` target, so rows inside an
//!   expanded folder stay reorderable,
//! - the "All files" strip is the `Root` target (`ROOT_ZONE_ID`),
//! - the blank filler under the list is the designated root region.

use crate::components::ui::{Button, ButtonSize, ButtonVariant, DropIndicator, DropIndicatorShape, Spinner};
use crate::dnd::{BoundsFn, ContainerRef, FolderTree, TargetKind, ROOT_ZONE_ID};
use crate::state::drag_sync::{element_bounds, use_drop_target, FileDrag};
use crate::state::AppContext;
use icons::{ChevronDown, ChevronRight};
use leptos::html;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

/// Rows register above folders, the root strip above both.
const ITEM_LAYER: i32 = 1;
const ROOT_ZONE_LAYER: i32 = 2;

/// Where the drop line goes while reordering: the container being
/// reordered and the row the line sits above (`None` = after the last row).
pub(crate) fn drop_line_position(
    tree: &FolderTree,
    dragged: &str,
    slot: usize,
) -> Option<(ContainerRef, Option<String>)> {
    let (origin, _) = tree.position_of(dragged).ok()?;
    let siblings = tree
        .children(&origin)?
        .iter()
        .filter(|id| id.as_str() != dragged)
        .collect::<Vec<_>>();
    match siblings.get(slot) {
        Some(id) => Some((origin, Some((*id).clone()))),
        None if slot == siblings.len() => Some((origin, None)),
        None => None,
    }
}

fn use_root_region(node: NodeRef<html::Div>) {
    let sync = expect_context::<FileDrag>();

    let s = sync.clone();
    Effect::new(move |_| {
        if let Some(el) = node.get() {
            let el: web_sys::Element = el.into();
            let bounds: BoundsFn = element_bounds("root-region".to_string(), el);
            s.set_root_region(Some(bounds));
        }
    });

    on_cleanup(move || sync.set_root_region(None));
}

#[component]
pub fn Sidebar() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let st = app_state.0.clone();

    let filler_ref: NodeRef<html::Div> = NodeRef::new();
    use_root_region(filler_ref);

    let folder_ids = move || {
        st.files.tree.with(|t| {
            t.folders()
                .into_iter()
                .filter_map(|c| c.id.folder_id().map(str::to_string))
                .collect::<Vec<_>>()
        })
    };

    let loading = app_state.0.tree_loading;
    let error = app_state.0.tree_error;
    let st_retry = app_state.0.clone();

    view! {
        <aside data-drop-list="files" class="flex h-full w-64 shrink-0 flex-col border-r border-border bg-surface text-sm">
            <div class="flex items-center justify-between px-3 py-2">
                <span class="text-xs font-semibold uppercase tracking-wide text-muted-foreground">"Files"</span>
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner label="Loading files" />
                </Show>
            </div>

            {move || error.get().map(|e| {
                let st_retry = st_retry.clone();
                view! {
                    <div class="mx-3 mb-2 rounded-md border border-destructive/40 px-2 py-1 text-xs text-destructive">
                        <span>{e}</span>
                        " "
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=move |_| st_retry.load_tree()>
                            "Retry"
                        </Button>
                    </div>
                }
            })}

            <RootDropZone />

            <div class="min-h-0 flex-1 overflow-y-auto">
                {move || {
                    folder_ids()
                        .into_iter()
                        .map(|id| view! { <FolderRow folder_id=id /> })
                        .collect_view()
                }}

                <FileList container=ContainerRef::Root />

                <div node_ref=filler_ref class="min-h-16 flex-1" data-drop-kind="root"></div>
            </div>
        </aside>
    }
}

#[component]
fn RootDropZone() -> impl IntoView {
    let sync = expect_context::<FileDrag>();
    let node: NodeRef<html::Div> = NodeRef::new();
    use_drop_target(sync.clone(), ROOT_ZONE_ID.to_string(), TargetKind::Root, ROOT_ZONE_LAYER, node);

    let lane = sync.lane();
    let highlighted = lane.highlighted;
    let dragging = lane.dragging;
    let active = move || highlighted.with(|h| h.as_ref().is_some_and(ContainerRef::is_root));

    view! {
        <div
            node_ref=node
            data-drop-kind="root"
            data-drop-id=ROOT_ZONE_ID
            class=move || {
                if dragging.with(Option::is_some) {
                    "relative mx-2 mb-1 rounded-md border border-dashed border-border px-2 py-1.5 text-xs text-muted-foreground"
                } else {
                    "relative mx-2 mb-1 rounded-md border border-transparent px-2 py-1.5 text-xs text-muted-foreground"
                }
            }
        >
            "All files"
            <Show when=active fallback=|| ().into_view()>
                <DropIndicator shape=DropIndicatorShape::Zone />
            </Show>
        </div>
    }
}

#[component]
fn FolderRow(folder_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let header_ref: NodeRef<html::Div> = NodeRef::new();
    use_drop_target(
        expect_context::<FileDrag>(),
        folder_id.clone(),
        TargetKind::Container,
        0,
        header_ref,
    );

    let container = ContainerRef::Folder(folder_id.clone());
    let st = app_state.0.clone();
    let fid = folder_id.clone();
    let name = move || {
        st.files
            .tree
            .with(|t| t.container(&ContainerRef::Folder(fid.clone())).map(|c| c.name.clone()))
            .unwrap_or_default()
    };

    let st = app_state.0.clone();
    let fid = folder_id.clone();
    let expanded = Memo::new(move |_| st.is_expanded(&fid));

    let st = app_state.0.clone();
    let c = container.clone();
    let count = move || st.files.tree.with(|t| t.children(&c).map(<[String]>::len).unwrap_or(0));

    let highlighted = app_state.0.files.highlighted;
    let c = container.clone();
    let is_target = move || highlighted.with(|h| h.as_ref() == Some(&c));

    let st = app_state.0.clone();
    let fid = folder_id.clone();
    let on_toggle = move |_| st.toggle_folder(&fid);

    view! {
        <div class="flex flex-col">
            <div
                node_ref=header_ref
                data-drop-kind="container"
                data-drop-id=folder_id
                class="relative mx-1 flex cursor-pointer select-none items-center gap-1 rounded-md px-2 py-1 hover:bg-accent"
                on:click=on_toggle
            >
                <Show
                    when=move || expanded.get()
                    fallback=|| view! { <ChevronRight class="size-3.5 text-muted-foreground" /> }
                >
                    <ChevronDown class="size-3.5 text-muted-foreground" />
                </Show>
                <span class="min-w-0 flex-1 truncate font-medium">{name}</span>
                <span class="text-xs text-muted-foreground">{count}</span>
                <Show when=is_target fallback=|| ().into_view()>
                    <DropIndicator shape=DropIndicatorShape::Zone />
                </Show>
            </div>
            <Show when=move || expanded.get() fallback=|| ().into_view()>
                <div class="ml-4">
                    <FileList container=container.clone() />
                </div>
            </Show>
        </div>
    }
}

#[component]
fn FileList(container: ContainerRef) -> impl IntoView {
    let lane = expect_context::<AppContext>().0.files;

    let c = container.clone();
    let ids = move || lane.tree.with(|t| t.children(&c).map(<[String]>::to_vec).unwrap_or_default());

    let drop_line = Memo::new(move |_| {
        let dragged = lane.dragging.get()?;
        let slot = lane.drop_slot.get()?;
        lane.tree.with(|t| drop_line_position(t, &dragged, slot))
    });

    let c = container.clone();
    let line_at_end = move || drop_line.with(|l| matches!(l, Some((lc, None)) if *lc == c));

    view! {
        <div class="flex flex-col">
            {move || {
                let container = container.clone();
                ids()
                    .into_iter()
                    .map(|id| {
                        let c = container.clone();
                        let above = id.clone();
                        let line_before = move || {
                            drop_line.with(|l| matches!(l, Some((lc, Some(row))) if *lc == c && *row == above))
                        };
                        view! {
                            <Show when=line_before fallback=|| ().into_view()>
                                <DropIndicator />
                            </Show>
                            <FileRow item_id=id container=container.clone() />
                        }
                    })
                    .collect_view()
            }}
            <Show when=line_at_end fallback=|| ().into_view()>
                <DropIndicator />
            </Show>
        </div>
    }
}

#[component]
fn FileRow(item_id: String, container: ContainerRef) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<FileDrag>();
    let lane = sync.lane();
    let navigate = StoredValue::new(use_navigate());

    let node: NodeRef<html::Div> = NodeRef::new();
    use_drop_target(sync.clone(), item_id.clone(), TargetKind::Item { container }, ITEM_LAYER, node);

    let id = item_id.clone();
    let name = move || {
        lane.tree
            .with(|t| t.item(&id).map(|i| i.display_name.clone()))
            .unwrap_or_default()
    };

    let lifted = lane.lifted;
    let id = item_id.clone();
    let style = move || {
        lifted.with(|l| match l {
            Some(l) if l.item == id => format!(
                "transform: translate({}px, {}px); opacity: {}; pointer-events: none; position: relative; z-index: 10;",
                l.dx, l.dy, l.opacity
            ),
            _ => String::new(),
        })
    };

    let selected = app_state.0.selected_file;
    let id = item_id.clone();
    let class = move || {
        if selected.with(|s| s.as_deref() == Some(id.as_str())) {
            "mx-1 flex cursor-pointer touch-none select-none items-center rounded-md bg-accent px-2 py-1 text-accent-foreground"
        } else {
            "mx-1 flex cursor-pointer touch-none select-none items-center rounded-md px-2 py-1 hover:bg-accent/60"
        }
    };

    let id = item_id.clone();
    let on_pointerdown = move |ev: web_sys::PointerEvent| sync.press(&id, &ev);

    let suppress_click = lane.suppress_click;
    let id = item_id.clone();
    let on_click = move |_ev: web_sys::MouseEvent| {
        // The click that ends a drag is not a selection.
        if suppress_click.get_untracked() {
            suppress_click.set(false);
            return;
        }
        navigate.with_value(|nav| nav(&format!("/file/{id}"), Default::default()));
    };

    view! {
        <div
            node_ref=node
            data-drop-kind="item"
            data-drop-id=item_id
            class=class
            style=style
            on:pointerdown=on_pointerdown
            on:click=on_click
        >
            <span class="min-w-0 flex-1 truncate">{name}</span>
        </div>
    }
}
