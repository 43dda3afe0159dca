//! Turning a resolved drop into a persisted mutation.
//!
//! A commit runs in four steps so the UI never holds the tree across an
//! `.await`:
//!
//! 1. [`plan`] decides what the drop means (pure).
//! 2. [`apply`] writes it to the local tree and records where the item was.
//! 3. [`persist`] sends it to the backend.
//! 4. [`settle`] keeps the local write, or moves the item back.
//!
//! [`Committer`] holds the backend the steps persist to, and fetches the
//! canonical order of any container `settle` reports stale.

use crate::api::{ApiError, ApiResult};
use crate::dnd::error::DragError;
use crate::dnd::persist::OrderBackend;
use crate::dnd::resolver::Resolution;
use crate::dnd::tree::{ContainerRef, FolderTree};

/// Remove `dragged_id` and reinsert it at `drop_index` (clamped). Always a
/// permutation of `list`; an unknown id returns the list unchanged.
pub(crate) fn reorder(list: &[String], dragged_id: &str, drop_index: usize) -> Vec<String> {
    let mut out = list.to_vec();
    let Some(from) = out.iter().position(|id| id == dragged_id) else {
        return out;
    };
    let dragged = out.remove(from);
    let at = drop_index.min(out.len());
    out.insert(at, dragged);
    out
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CommitPlan {
    /// Dropped where it already was.
    NoOp { item: String },
    Reorder {
        item: String,
        container: ContainerRef,
        previous: Vec<String>,
        next: Vec<String>,
    },
    Reparent {
        item: String,
        from: ContainerRef,
        to: ContainerRef,
    },
}

impl CommitPlan {
    pub fn item(&self) -> &str {
        match self {
            CommitPlan::NoOp { item } => item,
            CommitPlan::Reorder { item, .. } => item,
            CommitPlan::Reparent { item, .. } => item,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, CommitPlan::NoOp { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CommitOutcome {
    NoOp,
    Reordered {
        container: ContainerRef,
        order: Vec<String>,
    },
    Reparented {
        from: ContainerRef,
        to: ContainerRef,
    },
}

/// A commit applied locally and waiting for the backend.
#[derive(Clone, Debug)]
pub(crate) struct PendingCommit {
    pub plan: CommitPlan,
    /// Where the item sat before `apply`.
    origin: (ContainerRef, usize),
    /// Where `apply` put it.
    placed: (ContainerRef, usize),
    /// Tree epoch at `apply` time.
    applied_epoch: u64,
}

impl PendingCommit {
    pub fn item(&self) -> &str {
        self.plan.item()
    }

    /// Containers whose order this commit touched.
    pub fn affected(&self) -> Vec<ContainerRef> {
        match &self.plan {
            CommitPlan::NoOp { .. } => vec![],
            CommitPlan::Reorder { container, .. } => vec![container.clone()],
            CommitPlan::Reparent { from, to, .. } => vec![from.clone(), to.clone()],
        }
    }

    /// A refresh replaced the tree after we applied. Local mutations made by
    /// other commits do not count.
    pub fn is_superseded(&self, tree: &FolderTree) -> bool {
        tree.epoch() != self.applied_epoch
    }

    /// Move the item back to its origin, if it is still where `apply` put it.
    /// Changes other commits made since are left alone.
    fn undo(&self, tree: &mut FolderTree) -> bool {
        if tree.position_of(self.item()).ok().as_ref() != Some(&self.placed) {
            return false;
        }
        let (origin, index) = &self.origin;
        tree.move_item(self.item(), origin, Some(*index)).is_ok()
    }
}

/// What [`settle`] decided.
#[derive(Debug)]
pub(crate) struct Settled {
    pub outcome: Result<CommitOutcome, DragError>,
    /// Containers whose local order may disagree with the backend. The caller
    /// refetches them through [`OrderBackend::fetch_order`].
    pub stale: Vec<ContainerRef>,
}

/// Decide what dropping `item` on `resolution` means.
///
/// `Ambiguous` is reported as [`DragError::ResolutionAmbiguous`]; callers treat
/// it as a silent no-op.
pub(crate) fn plan(
    tree: &FolderTree,
    item: &str,
    resolution: &Resolution,
) -> Result<CommitPlan, DragError> {
    let (origin, origin_index) = tree.position_of(item)?;

    match resolution {
        Resolution::Ambiguous => Err(DragError::ResolutionAmbiguous),
        Resolution::Container(dest) if *dest == origin => Ok(CommitPlan::NoOp {
            item: item.to_string(),
        }),
        Resolution::Container(dest) => {
            if tree.container(dest).is_none() {
                return Err(DragError::InvariantViolation(format!(
                    "drop target {dest} is not a known container"
                )));
            }
            Ok(CommitPlan::Reparent {
                item: item.to_string(),
                from: origin,
                to: dest.clone(),
            })
        }
        Resolution::Reorder { slot } => {
            let previous = tree.children(&origin).map(<[String]>::to_vec).unwrap_or_default();
            let next = reorder(&previous, item, *slot);
            if next == previous {
                tracing::debug!(item, origin_index, slot, "drop at original position");
                return Ok(CommitPlan::NoOp {
                    item: item.to_string(),
                });
            }
            Ok(CommitPlan::Reorder {
                item: item.to_string(),
                container: origin,
                previous,
                next,
            })
        }
    }
}

/// Optimistically write `plan` into the tree. `NoOp` plans are rejected: there
/// is nothing to apply or persist.
pub(crate) fn apply(tree: &mut FolderTree, plan: CommitPlan) -> Result<PendingCommit, DragError> {
    let origin = tree.position_of(plan.item())?;
    match &plan {
        CommitPlan::NoOp { item } => {
            return Err(DragError::InvariantViolation(format!(
                "no-op drop of {item} has nothing to apply"
            )))
        }
        CommitPlan::Reorder {
            container,
            previous,
            next,
            ..
        } => {
            if tree.children(container) != Some(previous.as_slice()) {
                return Err(DragError::InvariantViolation(format!(
                    "{container} changed since the drop was planned"
                )));
            }
            tree.set_order(container, next.clone())?;
        }
        CommitPlan::Reparent { item, from, to } => {
            if origin.0 != *from {
                return Err(DragError::InvariantViolation(format!(
                    "{item} left {from} since the drop was planned"
                )));
            }
            tree.move_item(item, to, None)?;
        }
    }

    Ok(PendingCommit {
        placed: tree.position_of(plan.item())?,
        origin,
        plan,
        applied_epoch: tree.epoch(),
    })
}

pub(crate) async fn persist<B: OrderBackend + ?Sized>(
    backend: &B,
    pending: &PendingCommit,
) -> ApiResult<()> {
    match &pending.plan {
        CommitPlan::NoOp { .. } => Ok(()),
        CommitPlan::Reorder {
            container, next, ..
        } => backend.persist_reorder(container, next).await,
        CommitPlan::Reparent { item, to, .. } => backend.persist_reparent(item, to).await,
    }
}

/// Finish a commit with the backend's answer.
///
/// - Success keeps the local write. If a refresh landed meanwhile it may
///   predate the write, so the touched containers are reported stale.
/// - Failure after a refresh keeps the refresh: the backend never had the
///   write, so the refreshed data already excludes it.
/// - Otherwise failure undoes this commit's own move. If the item has been
///   moved again since, nothing is undone and the containers are reported stale.
pub(crate) fn settle(tree: &mut FolderTree, pending: PendingCommit, result: ApiResult<()>) -> Settled {
    let superseded = pending.is_superseded(tree);
    match result {
        Ok(()) => Settled {
            stale: if superseded { pending.affected() } else { vec![] },
            outcome: Ok(match pending.plan {
                CommitPlan::NoOp { .. } => CommitOutcome::NoOp,
                CommitPlan::Reorder {
                    container, next, ..
                } => CommitOutcome::Reordered {
                    container,
                    order: next,
                },
                CommitPlan::Reparent { from, to, .. } => CommitOutcome::Reparented { from, to },
            }),
        },
        Err(e) => {
            let stale = if superseded {
                tracing::warn!(item = %pending.item(), error = %e, "commit failed after a refresh; keeping the refresh");
                vec![]
            } else if pending.undo(tree) {
                tracing::warn!(item = %pending.item(), error = %e, "commit failed; rolled back");
                vec![]
            } else {
                tracing::warn!(item = %pending.item(), error = %e, "commit failed; item moved since, refetching");
                pending.affected()
            };
            Settled {
                outcome: Err(DragError::PersistenceFailure(e)),
                stale,
            }
        }
    }
}

/// Overwrite a container's local order with the backend's, if it is a
/// permutation of what we have. Returns whether anything changed.
pub(crate) fn apply_reconciled(
    tree: &mut FolderTree,
    container: &ContainerRef,
    canonical: Vec<String>,
) -> Result<bool, DragError> {
    if tree.children(container) == Some(canonical.as_slice()) {
        return Ok(false);
    }
    tree.set_order(container, canonical)?;
    Ok(true)
}

/// Owns a backend and runs whole commits against it.
#[derive(Clone)]
pub(crate) struct Committer<B> {
    backend: B,
}

impl<B: OrderBackend> Committer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Plan-to-settle in one call, for callers that can hold the tree across
    /// the request.
    #[cfg(test)]
    pub async fn commit(&self, tree: &mut FolderTree, plan: CommitPlan) -> Result<CommitOutcome, DragError> {
        if plan.is_noop() {
            return Ok(CommitOutcome::NoOp);
        }
        let pending = apply(tree, plan)?;
        let result = persist(&self.backend, &pending).await;
        settle(tree, pending, result).outcome
    }

    /// Canonical order for `container`, straight from the backend.
    pub async fn reconcile(&self, container: &ContainerRef) -> Result<Vec<String>, ApiError> {
        self.backend.fetch_order(container).await
    }
}
