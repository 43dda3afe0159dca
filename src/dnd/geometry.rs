use crate::dnd::tree::ContainerRef;
use serde::{Deserialize, Serialize};

/// Reserved id the root drop zone registers under.
pub(crate) const ROOT_ZONE_ID: &str = "__root__";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Screen-space box in CSS pixels (same space as `getBoundingClientRect`).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Half-open: the right and bottom edges belong to the next box.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.top && p.y < self.bottom()
    }

    pub fn midpoint(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.top + self.height / 2.0,
            Axis::Horizontal => self.left + self.width / 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn coord(&self, p: Point) -> f64 {
        match self {
            Axis::Vertical => p.y,
            Axis::Horizontal => p.x,
        }
    }
}

/// What a registered drop candidate is.
#[derive(Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TargetKind {
    /// A draggable row living in `container`.
    Item { container: ContainerRef },
    /// A folder that accepts items.
    Container,
    /// The root drop zone.
    Root,
}

impl TargetKind {
    pub fn accepts_drop(&self) -> bool {
        matches!(self, TargetKind::Container | TargetKind::Root)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum GeometryError {
    #[error("drop target `{0}` is not registered")]
    Unregistered(String),
    #[error("drop target `{0}` is no longer mounted")]
    Detached(String),
}

/// Live bounding-box accessor supplied by whoever rendered the target.
pub(crate) type BoundsFn = Box<dyn Fn() -> Result<Rect, GeometryError>>;

struct Registration {
    id: String,
    kind: TargetKind,
    layer: i32,
    seq: u64,
    bounds: BoundsFn,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub id: String,
    pub kind: TargetKind,
    pub rect: Rect,
}

/// Every drop candidate the sidebar has mounted, with live geometry.
///
/// Boxes are never cached: each query calls the accessors again, so scrolling
/// or resizing between samples needs no invalidation step.
///
/// Stacking: higher `layer` wins, then the most recent registration. Nested
/// rows mount after their parents, so the innermost target comes first.
#[derive(Default)]
pub(crate) struct GeometryRegistry {
    entries: Vec<Registration>,
    root_region: Option<BoundsFn>,
    next_seq: u64,
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn register(&mut self, id: impl Into<String>, kind: TargetKind, bounds: BoundsFn) -> u64 {
        self.register_layered(id, kind, 0, bounds)
    }

    /// Registering an id again (remount) replaces the old entry. Returns a
    /// token for [`Self::unregister_token`].
    pub fn register_layered(
        &mut self,
        id: impl Into<String>,
        kind: TargetKind,
        layer: i32,
        bounds: BoundsFn,
    ) -> u64 {
        let id = id.into();
        self.entries.retain(|e| e.id != id);
        self.next_seq += 1;
        tracing::trace!(target_id = %id, kind = %kind, "drop target registered");
        self.entries.push(Registration {
            id,
            kind,
            layer,
            seq: self.next_seq,
            bounds,
        });
        self.next_seq
    }

    #[cfg(test)]
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Unregister `id` only if it still holds the registration `token` came
    /// from. A row that unmounts after its replacement mounted leaves the
    /// replacement alone.
    pub fn unregister_token(&mut self, id: &str, token: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id || e.seq != token);
        before != self.entries.len()
    }

    /// Region that means "drop at the root" without being a candidate itself,
    /// typically the blank space under the list.
    pub fn designate_root_region(&mut self, bounds: BoundsFn) {
        self.root_region = Some(bounds);
    }

    pub fn clear_root_region(&mut self) {
        self.root_region = None;
    }

    pub fn in_root_region(&self, p: Point) -> Result<bool, GeometryError> {
        match &self.root_region {
            Some(bounds) => Ok(bounds()?.contains(p)),
            None => Ok(false),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind_of(&self, id: &str) -> Option<&TargetKind> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.kind)
    }

    pub fn bounds_of(&self, id: &str) -> Result<Rect, GeometryError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| GeometryError::Unregistered(id.to_string()))?;
        (entry.bounds)()
    }

    /// Candidates under `p`, topmost first. `excluded` (the dragged item) never
    /// shows up. Unmounted targets are skipped.
    pub fn query_at(&self, p: Point, excluded: Option<&str>) -> Vec<Candidate> {
        let mut hits = self
            .entries
            .iter()
            .filter(|e| Some(e.id.as_str()) != excluded)
            .filter_map(|e| match (e.bounds)() {
                Ok(rect) if rect.contains(p) => Some((e.layer, e.seq, rect, e)),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(target_id = %e.id, error = %err, "skipping drop target");
                    None
                }
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        hits.into_iter()
            .map(|(_, _, rect, e)| Candidate {
                id: e.id.clone(),
                kind: e.kind.clone(),
                rect,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::testing::fixed;

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.9, 9.9)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
        assert!(!r.contains(Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_query_orders_topmost_first_and_excludes_dragged() {
        let mut reg = GeometryRegistry::new();
        reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 200.0, 100.0));
        reg.register(
            "a",
            TargetKind::Item {
                container: ContainerRef::Root,
            },
            fixed(0.0, 0.0, 200.0, 20.0),
        );
        reg.register(
            "b",
            TargetKind::Item {
                container: ContainerRef::Root,
            },
            fixed(0.0, 0.0, 200.0, 20.0),
        );

        let hits = reg.query_at(Point::new(5.0, 5.0), Some("b"));
        let ids = hits.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "f1"]);
    }

    #[test]
    fn test_layer_beats_registration_order() {
        let mut reg = GeometryRegistry::new();
        reg.register_layered("zone", TargetKind::Root, 10, fixed(0.0, 0.0, 50.0, 50.0));
        reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 50.0, 50.0));

        let hits = reg.query_at(Point::new(1.0, 1.0), None);
        assert_eq!(hits.first().map(|c| c.id.as_str()), Some("zone"));
    }

    #[test]
    fn test_reregister_replaces_and_unregister_removes() {
        let mut reg = GeometryRegistry::new();
        reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 10.0, 10.0));
        reg.register("f1", TargetKind::Container, fixed(100.0, 100.0, 10.0, 10.0));
        assert_eq!(reg.len(), 1);
        assert!(reg.query_at(Point::new(1.0, 1.0), None).is_empty());

        assert!(reg.unregister("f1"));
        assert!(!reg.unregister("f1"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_stale_token_does_not_unregister_replacement() {
        let mut reg = GeometryRegistry::new();
        let old = reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 10.0, 10.0));
        let new = reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 10.0, 10.0));

        assert!(!reg.unregister_token("f1", old));
        assert_eq!(reg.len(), 1);
        assert!(reg.unregister_token("f1", new));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_detached_targets_are_skipped() {
        let mut reg = GeometryRegistry::new();
        reg.register(
            "gone",
            TargetKind::Container,
            Box::new(|| Err(GeometryError::Detached("gone".to_string()))),
        );
        reg.register("f1", TargetKind::Container, fixed(0.0, 0.0, 10.0, 10.0));

        let hits = reg.query_at(Point::new(1.0, 1.0), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(
            reg.bounds_of("missing"),
            Err(GeometryError::Unregistered("missing".to_string()))
        );
    }

    #[test]
    fn test_bounds_are_read_live() {
        use std::cell::Cell;
        use std::rc::Rc;

        let top = Rc::new(Cell::new(0.0));
        let top_for_bounds = top.clone();
        let mut reg = GeometryRegistry::new();
        reg.register(
            "f1",
            TargetKind::Container,
            Box::new(move || Ok(Rect::new(0.0, top_for_bounds.get(), 10.0, 10.0))),
        );

        assert_eq!(reg.query_at(Point::new(1.0, 1.0), None).len(), 1);
        // Simulate a scroll.
        top.set(500.0);
        assert!(reg.query_at(Point::new(1.0, 1.0), None).is_empty());
    }
}
