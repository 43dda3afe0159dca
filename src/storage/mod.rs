use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub(crate) const EXPANDED_FOLDERS_KEY: &str = "folio_expanded_folders";

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            if let Err(e) = storage.set_item(key, &json) {
                tracing::warn!(key, error = ?e, "localStorage write failed");
            }
        }
    }
}

pub(crate) fn load_expanded_folders() -> BTreeSet<String> {
    load_json_from_storage::<BTreeSet<String>>(EXPANDED_FOLDERS_KEY).unwrap_or_default()
}

pub(crate) fn save_expanded_folders(ids: &BTreeSet<String>) {
    save_json_to_storage(EXPANDED_FOLDERS_KEY, ids);
}

/// Flip `folder_id` in the set. Returns whether it is now expanded.
pub(crate) fn toggle_expanded(set: &mut BTreeSet<String>, folder_id: &str) -> bool {
    if set.remove(folder_id) {
        false
    } else {
        set.insert(folder_id.to_string());
        true
    }
}

/// Drop ids of folders that no longer exist.
pub(crate) fn retain_known<'a>(
    set: &mut BTreeSet<String>,
    known: impl IntoIterator<Item = &'a str>,
) -> bool {
    let known = known.into_iter().collect::<BTreeSet<_>>();
    let before = set.len();
    set.retain(|id| known.contains(id.as_str()));
    before != set.len()
}


// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_expanded_folders_roundtrip() {
        let set = ["7", "12"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        save_expanded_folders(&set);
        assert_eq!(load_expanded_folders(), set);

        save_expanded_folders(&BTreeSet::new());
        assert!(load_expanded_folders().is_empty());
    }

    #[wasm_bindgen_test]
    fn test_malformed_storage_falls_back_to_empty() {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(EXPANDED_FOLDERS_KEY, "{not json");
        }
        assert!(load_expanded_folders().is_empty());
    }
}
