pub(crate) mod drag_sync;

use crate::api::ApiClient;
use crate::dnd::{ContainerRef, FolderTree};
use crate::storage::{load_expanded_folders, retain_known, save_expanded_folders};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::BTreeSet;
use wasm_bindgen::JsCast;

/// How long a notice stays on screen.
const NOTICE_MS: i32 = 3_000;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Notice {
    pub id: u64,
    pub message: String,
}

/// The row currently following the pointer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LiftedRow {
    pub item: String,
    pub dx: f64,
    pub dy: f64,
    pub opacity: f64,
}

/// One draggable list: its local mirror and the feedback its drag controller
/// writes.
#[derive(Clone, Copy)]
pub(crate) struct DragLane {
    pub tree: RwSignal<FolderTree>,
    pub highlighted: RwSignal<Option<ContainerRef>>,
    pub drop_slot: RwSignal<Option<usize>>,
    pub lifted: RwSignal<Option<LiftedRow>>,
    pub dragging: RwSignal<Option<String>>,

    /// Set when a drag ends, so the click the browser fires next is swallowed.
    pub suppress_click: RwSignal<bool>,
}

impl DragLane {
    pub fn new() -> Self {
        Self {
            tree: RwSignal::new(FolderTree::new()),
            highlighted: RwSignal::new(None),
            drop_slot: RwSignal::new(None),
            lifted: RwSignal::new(None),
            dragging: RwSignal::new(None),
            suppress_click: RwSignal::new(false),
        }
    }

    /// Drop every piece of drag feedback. Safe on a disposed lane.
    pub fn clear_feedback(&self) {
        self.highlighted.try_set(None);
        self.drop_slot.try_set(None);
        self.lifted.try_set(None);
        self.dragging.try_set(None);
    }
}

impl Default for DragLane {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: StoredValue<ApiClient>,

    /// Local mirror of `/files` + `/folders`.
    pub files: DragLane,
    pub tree_loading: RwSignal<bool>,
    pub tree_error: RwSignal<Option<String>>,

    /// Tree load guard (ignore stale responses).
    pub tree_request_id: RwSignal<u64>,

    pub expanded_folders: RwSignal<BTreeSet<String>>,
    pub selected_file: RwSignal<Option<String>>,

    /// Notes of the file in `notes_file`, in `order`.
    pub notes: DragLane,
    pub notes_file: RwSignal<Option<String>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,
    pub notes_request_id: RwSignal<u64>,

    pub notice: RwSignal<Option<Notice>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: StoredValue::new(ApiClient::from_env()),
            files: DragLane::new(),
            tree_loading: RwSignal::new(false),
            tree_error: RwSignal::new(None),
            tree_request_id: RwSignal::new(0),
            expanded_folders: RwSignal::new(load_expanded_folders()),
            selected_file: RwSignal::new(None),
            notes: DragLane::new(),
            notes_file: RwSignal::new(None),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            notes_request_id: RwSignal::new(0),
            notice: RwSignal::new(None),
        }
    }

    /// Fetch files and folders and replace the tree. Older in-flight loads
    /// are ignored when they resolve.
    pub fn load_tree(&self) {
        let req_id = self.tree_request_id.get_untracked().saturating_add(1);
        self.tree_request_id.set(req_id);
        self.tree_loading.set(true);
        self.tree_error.set(None);

        let s = self.clone();
        let api_client = self.api_client.get_value();
        spawn_local(async move {
            let result = match api_client.get_folders().await {
                Ok(folders) => api_client.get_files().await.map(|files| (files, folders)),
                Err(e) => Err(e),
            };

            // Ignore stale responses.
            if s.tree_request_id.get_untracked() != req_id {
                return;
            }

            match result {
                Ok((files, folders)) => {
                    let tree = FolderTree::from_wire(&files, &folders);
                    tracing::info!(
                        files = tree.item_count(),
                        folders = folders.len(),
                        "file tree loaded"
                    );
                    s.forget_missing_folders(&tree);
                    s.files.tree.update(|t| t.refresh(tree));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "file tree load failed");
                    s.tree_error.set(Some(e.to_string()));
                }
            }
            s.tree_loading.set(false);
        });
    }

    /// Fetch the notes of `file_id` (or clear the list for `None`). Same
    /// stale-response guard as [`Self::load_tree`].
    pub fn load_notes(&self, file_id: Option<String>) {
        let req_id = self.notes_request_id.get_untracked().saturating_add(1);
        self.notes_request_id.set(req_id);
        self.notes_error.set(None);
        if self.notes_file.get_untracked() != file_id {
            self.notes_file.set(file_id.clone());
        }

        let Some(file_id) = file_id else {
            self.notes_loading.set(false);
            self.notes.tree.update(|t| t.refresh(FolderTree::new()));
            return;
        };
        self.notes_loading.set(true);

        let s = self.clone();
        let api_client = self.api_client.get_value();
        spawn_local(async move {
            let result = api_client.get_notes(&file_id).await;

            if s.notes_request_id.get_untracked() != req_id {
                return;
            }

            match result {
                Ok(mut notes) => {
                    notes.retain(|n| n.file_id.as_deref().is_none_or(|f| f == file_id));
                    let tree = FolderTree::from_notes(&notes);
                    tracing::debug!(file = %file_id, notes = tree.item_count(), "notes loaded");
                    s.notes.tree.update(|t| t.refresh(tree));
                }
                Err(e) => {
                    tracing::warn!(file = %file_id, error = %e, "notes load failed");
                    s.notes_error.set(Some(e.to_string()));
                }
            }
            s.notes_loading.set(false);
        });
    }

    pub fn reload_notes(&self) {
        self.load_notes(self.notes_file.get_untracked());
    }

    /// A drag is running in either list.
    pub fn is_dragging(&self) -> bool {
        self.files.dragging.with_untracked(Option::is_some)
            || self.notes.dragging.with_untracked(Option::is_some)
    }

    pub fn is_expanded(&self, folder_id: &str) -> bool {
        self.expanded_folders.with(|set| set.contains(folder_id))
    }

    pub fn toggle_folder(&self, folder_id: &str) {
        self.expanded_folders.update(|set| {
            crate::storage::toggle_expanded(set, folder_id);
        });
        self.expanded_folders.with_untracked(save_expanded_folders);
    }

    pub fn expand_folder(&self, folder_id: &str) {
        if self.expanded_folders.with_untracked(|set| set.contains(folder_id)) {
            return;
        }
        self.expanded_folders.update(|set| {
            set.insert(folder_id.to_string());
        });
        self.expanded_folders.with_untracked(save_expanded_folders);
    }

    fn forget_missing_folders(&self, tree: &FolderTree) {
        let known = tree
            .folders()
            .into_iter()
            .filter_map(|c| c.id.folder_id().map(str::to_string))
            .collect::<Vec<_>>();
        let mut changed = false;
        self.expanded_folders.update(|set| {
            changed = retain_known(set, known.iter().map(String::as_str));
        });
        if changed {
            self.expanded_folders.with_untracked(save_expanded_folders);
        }
    }

    /// Show a transient notice. A newer notice replaces the current one and
    /// restarts the timer.
    pub fn show_notice(&self, message: impl Into<String>) {
        let id = self
            .notice
            .with_untracked(|n| n.as_ref().map(|n| n.id))
            .unwrap_or(0)
            .wrapping_add(1);
        self.notice.set(Some(Notice {
            id,
            message: message.into(),
        }));

        let notice = self.notice;
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
            wasm_bindgen::closure::Closure::once_into_js(move || {
                // Only dismiss the notice this timer was started for.
                if notice.try_get_untracked().flatten().map(|n| n.id) == Some(id) {
                    notice.set(None);
                }
            })
            .as_ref()
            .unchecked_ref(),
            NOTICE_MS,
        );
    }

    pub fn dismiss_notice(&self) {
        self.notice.set(None);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
