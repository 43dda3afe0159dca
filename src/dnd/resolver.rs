use crate::dnd::error::DragError;
use crate::dnd::geometry::{Axis, GeometryRegistry, Point, Rect, TargetKind, ROOT_ZONE_ID};
use crate::dnd::tree::{ContainerRef, FolderTree};

/// What the pointer primitive itself says is under the pointer, read from the
/// `data-drop-kind` / `data-drop-id` attributes of the hovered element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TargetHint {
    Container(String),
    Root,
    Item(String),
}

impl TargetHint {
    pub fn from_attrs(kind: Option<&str>, id: Option<&str>) -> Option<Self> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        match (kind?.trim(), id) {
            ("root", _) => Some(Self::Root),
            ("container", Some(id)) if id == ROOT_ZONE_ID => Some(Self::Root),
            ("container", Some(id)) => Some(Self::Container(id.to_string())),
            ("item", Some(id)) => Some(Self::Item(id.to_string())),
            _ => None,
        }
    }
}

/// Outcome of one hit-test pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Move into this container (possibly the one the item is already in).
    Container(ContainerRef),
    /// Reorder inside the origin container, inserting before `slot`
    /// (slot counts siblings with the dragged item removed).
    Reorder { slot: usize },
    Ambiguous,
}

impl Resolution {
    /// Container to highlight for this resolution.
    pub fn hover_container(&self) -> Option<&ContainerRef> {
        match self {
            Resolution::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<usize> {
        match self {
            Resolution::Reorder { slot } => Some(*slot),
            _ => None,
        }
    }
}

pub(crate) struct ResolveInput<'a> {
    pub registry: &'a GeometryRegistry,
    pub tree: &'a FolderTree,
    pub dragged: &'a str,
    pub origin: &'a ContainerRef,
    pub point: Point,
    pub hint: Option<&'a TargetHint>,
}

/// Resolves the pointer to a drop target. First match wins:
///
/// 1. a primitive hint naming a registered container (or the root),
/// 2. the topmost registered container/root under the pointer,
/// 3. the designated root region,
/// 4. a sibling row in the origin container (reorder slot),
/// 5. otherwise ambiguous.
///
/// Failures while reading geometry are logged and reported as ambiguous, so a
/// broken row never aborts the gesture.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct HitTestResolver {
    axis: Axis,
}

impl HitTestResolver {
    pub fn new(axis: Axis) -> Self {
        Self { axis }
    }

    pub fn resolve(&self, input: &ResolveInput<'_>) -> Resolution {
        match self.try_resolve(input) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(dragged = %input.dragged, error = %e, "hit-test failed; treating as ambiguous");
                Resolution::Ambiguous
            }
        }
    }

    fn try_resolve(&self, input: &ResolveInput<'_>) -> Result<Resolution, DragError> {
        if let Some(r) = Self::from_hint(input) {
            return Ok(r);
        }

        let candidates = input.registry.query_at(input.point, Some(input.dragged));

        if let Some(c) = candidates.iter().find(|c| c.kind.accepts_drop()) {
            return Ok(Resolution::Container(match c.kind {
                TargetKind::Root => ContainerRef::Root,
                _ => ContainerRef::Folder(c.id.clone()),
            }));
        }

        if input.registry.in_root_region(input.point)? {
            return Ok(Resolution::Container(ContainerRef::Root));
        }

        let over_sibling = candidates.iter().any(|c| {
            matches!(&c.kind, TargetKind::Item { container } if container == input.origin)
        });
        if over_sibling {
            let siblings = input
                .tree
                .children(input.origin)
                .ok_or_else(|| {
                    DragError::InvariantViolation(format!("origin {} is gone", input.origin))
                })?
                .iter()
                .filter(|id| id.as_str() != input.dragged)
                .map(|id| input.registry.bounds_of(id))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Resolution::Reorder {
                slot: drop_slot(&siblings, input.point, self.axis),
            });
        }

        Ok(Resolution::Ambiguous)
    }

    fn from_hint(input: &ResolveInput<'_>) -> Option<Resolution> {
        match input.hint? {
            TargetHint::Root => Some(Resolution::Container(ContainerRef::Root)),
            TargetHint::Container(id) if id == input.dragged => None,
            TargetHint::Container(id) => match input.registry.kind_of(id) {
                Some(TargetKind::Container) => {
                    Some(Resolution::Container(ContainerRef::Folder(id.clone())))
                }
                Some(TargetKind::Root) => Some(Resolution::Container(ContainerRef::Root)),
                _ => None,
            },
            TargetHint::Item(_) => None,
        }
    }
}

/// Insert-before index for a pointer over a list of sibling boxes in display
/// order: the first sibling whose midpoint the pointer has not passed, or the
/// end of the list.
pub(crate) fn drop_slot(siblings: &[Rect], point: Point, axis: Axis) -> usize {
    let p = axis.coord(point);
    siblings
        .iter()
        .position(|r| p <= r.midpoint(axis))
        .unwrap_or(siblings.len())
}
