use crate::api::NoteOrder;
use crate::dnd::ListKind;
use crate::pages::WorkspacePage;
use crate::state::drag_sync::{FileDrag, NoteDrag};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext(AppState::new());
    provide_context(ctx.clone());

    let client = ctx.0.api_client.get_value();
    let files = ctx.0.files;
    let notes = ctx.0.notes;
    provide_context(FileDrag::new(ctx.clone(), files, ListKind::Files, client.clone()));
    // Pointed at a file once one is selected.
    provide_context(NoteDrag::new(ctx, notes, ListKind::Notes, NoteOrder::new(client, None)));

    // Router hooks (navigation from file rows) need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("file/:file_id") view=WorkspacePage />
                <Route path=path!("") view=WorkspacePage />
            </Routes>
        </Router>
    }
}
