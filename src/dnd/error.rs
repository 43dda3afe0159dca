use crate::api::ApiError;
use crate::dnd::geometry::GeometryError;

#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum DragError {
    /// Nothing droppable under the pointer. Never shown to the user.
    #[error("no drop target under the pointer")]
    ResolutionAmbiguous,

    /// Backend rejected the reorder/reparent; local state was rolled back.
    #[error("could not save the move: {0}")]
    PersistenceFailure(#[from] ApiError),

    /// Local data disagrees with itself; the operation was aborted.
    #[error("drag state is inconsistent: {0}")]
    InvariantViolation(String),

    #[error("drag timed out")]
    SessionTimeout,

    /// A session is still open, or the item has a commit in flight.
    #[error("another drag is still in progress")]
    SessionBusy,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl DragError {
    /// Whether the user should see a notice for this error.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, DragError::PersistenceFailure(_))
    }
}
