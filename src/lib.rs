mod api;
mod app;
mod components;
mod dnd;
mod models;
mod note_list;
mod pages;
mod sidebar;
mod state;
mod storage;
mod util;

use crate::app::App;
use leptos::prelude::*;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_web::MakeWebConsoleWriter;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

/// Default log filter: app events at debug, everything else at info.
const LOG_FILTER: &str = "info,folio_notes_app=debug";

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(EnvFilter::new(LOG_FILTER));

    // A second init (hot reload, tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    init_tracing();
    tracing::info!("starting");
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_parses() {
        let filter = EnvFilter::try_new(LOG_FILTER).expect("filter should parse");
        assert!(filter.to_string().contains("folio_notes_app=debug"));
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::debug!("still logging");
    }
}
