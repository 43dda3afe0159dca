use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative flex w-full items-start gap-2 rounded-lg border px-3 py-2 text-sm"}
    clx! {AlertDescription, p, "min-w-0 flex-1 text-sm leading-snug"}
    clx! {NoticeStack, div, "pointer-events-none fixed bottom-4 left-1/2 z-50 w-[min(28rem,calc(100%-2rem))] -translate-x-1/2 [&>*]:pointer-events-auto"}
}

pub use components::*;
