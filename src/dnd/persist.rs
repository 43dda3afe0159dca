use crate::api::ApiResult;
use crate::dnd::tree::ContainerRef;
use futures::future::LocalBoxFuture;

/// Backend that owns the canonical order and parent of every item.
///
/// Futures are `!Send`: everything runs on the browser's single thread.
pub(crate) trait OrderBackend {
    fn fetch_order<'a>(&'a self, container: &'a ContainerRef) -> LocalBoxFuture<'a, ApiResult<Vec<String>>>;

    fn persist_reorder<'a>(
        &'a self,
        container: &'a ContainerRef,
        ordered_item_ids: &'a [String],
    ) -> LocalBoxFuture<'a, ApiResult<()>>;

    fn persist_reparent<'a>(
        &'a self,
        item_id: &'a str,
        new_container: &'a ContainerRef,
    ) -> LocalBoxFuture<'a, ApiResult<()>>;
}
