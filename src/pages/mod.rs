use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant, NoticeStack};
use crate::dnd::{ContainerRef, FolderTree};
use crate::note_list::NoteList;
use crate::sidebar::Sidebar;
use crate::state::drag_sync::NoteDrag;
use crate::state::AppContext;
use icons::X;
use leptos::prelude::*;
use leptos_router::params::Params;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct FileRouteParams {
    pub file_id: Option<String>,
}

/// What the detail pane shows for a selected file.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FileSummary {
    pub name: String,
    pub location: String,
    pub position: usize,
    pub siblings: usize,
}

pub(crate) fn file_summary(tree: &FolderTree, file_id: &str) -> Option<FileSummary> {
    let item = tree.item(file_id)?;
    let (container, position) = tree.position_of(file_id).ok()?;
    let location = match &container {
        ContainerRef::Root => "All files".to_string(),
        c => tree.container(c).map(|f| f.name.clone()).unwrap_or_default(),
    };
    Some(FileSummary {
        name: item.display_name.clone(),
        location,
        position: position + 1,
        siblings: tree.children(&container).map(<[String]>::len).unwrap_or(0),
    })
}

#[component]
pub fn WorkspacePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = leptos_router::hooks::use_params::<FileRouteParams>();

    let file_id = move || params.get().ok().and_then(|p| p.file_id).unwrap_or_default();

    // Load once per mount.
    let st = app_state.0.clone();
    Effect::new(move |prev: Option<()>| {
        if prev.is_none() {
            st.load_tree();
        }
    });

    // Keep the selection, and the note list with it, in sync with the route.
    let selected = app_state.0.selected_file;
    let note_drag = expect_context::<NoteDrag>();
    let st = app_state.0.clone();
    Effect::new(move |_| {
        let id = file_id();
        let next = (!id.trim().is_empty()).then_some(id);
        if selected.get_untracked() != next {
            selected.set(next.clone());
        }
        if st.notes_file.get_untracked() != next {
            note_drag.retarget(next.clone());
            st.load_notes(next);
        }
    });

    let tree = app_state.0.files.tree;
    let summary = move || {
        let id = selected.get()?;
        tree.with(|t| file_summary(t, &id))
    };

    view! {
        <div class="flex h-screen w-full overflow-hidden bg-background text-foreground">
            <Sidebar />
            <main class="min-w-0 flex-1 overflow-y-auto px-8 py-6">
                {move || match summary() {
                    Some(s) => view! {
                        <div class="flex flex-col gap-1">
                            <h1 class="text-lg font-semibold">{s.name}</h1>
                            <p class="text-xs text-muted-foreground">
                                {format!("{} · {} of {}", s.location, s.position, s.siblings)}
                            </p>
                        </div>
                    }
                    .into_any(),
                    None => view! {
                        <div class="text-sm text-muted-foreground">
                            "Select a file, or drag files to reorder them and move them between folders. Notes inside a file reorder the same way."
                        </div>
                    }
                    .into_any(),
                }}
                // Outside the summary so file moves do not remount the rows.
                <Show when=move || selected.with(Option::is_some) fallback=|| ().into_view()>
                    <NoteList />
                </Show>
            </main>
            <NoticeBar />
        </div>
    }
}

#[component]
fn NoticeBar() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let notice = app_state.0.notice;
    let st = app_state.0.clone();

    view! {
        <NoticeStack>
            {move || notice.get().map(|n| {
                let st = st.clone();
                view! {
                    <Alert class="border-destructive/30 bg-background shadow-md">
                        <AlertDescription class="text-destructive">{n.message}</AlertDescription>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            attr:aria-label="Dismiss"
                            on:click=move |_| st.dismiss_notice()
                        >
                            <X />
                        </Button>
                    </Alert>
                }
            })}
        </NoticeStack>
    }
}
