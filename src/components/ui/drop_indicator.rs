use leptos::prelude::*;
use tw_merge::*;

/// Where a dragged row would land: a line between rows, or the outline of a
/// whole drop zone.
#[component]
pub fn DropIndicator(
    #[prop(into, optional)] shape: Signal<DropIndicatorShape>,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let merged_class = move || {
        let shape = shape.get();
        let indicator = DropIndicatorClass { shape };
        indicator.with_class(class.clone())
    };

    view! { <div class=merged_class aria-hidden="true" /> }
}

#[derive(TwClass, Default)]
#[tw(class = "pointer-events-none shrink-0 bg-primary")]
pub struct DropIndicatorClass {
    shape: DropIndicatorShape,
}

#[derive(TwVariant)]
pub enum DropIndicatorShape {
    #[tw(default, class = "mx-2 h-0.5 rounded-full")]
    Line,
    #[tw(class = "absolute inset-0 rounded-md bg-primary/10 ring-2 ring-primary")]
    Zone,
}
