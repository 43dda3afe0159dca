use crate::dnd::tree::ContainerRef;

/// Where visual highlight mutations go (CSS classes in the app, a log in tests).
pub(crate) trait HighlightSink {
    fn apply_highlight(&mut self, target: &ContainerRef);
    fn clear_highlight(&mut self, target: &ContainerRef);
}

/// `none -> highlighted(id) -> none`, one container at a time.
///
/// Switching targets always clears the old one before applying the new one,
/// and re-resolving the same target touches nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HighlightState {
    highlighted: Option<ContainerRef>,
}

impl HighlightState {
    #[cfg(test)]
    pub fn current(&self) -> Option<&ContainerRef> {
        self.highlighted.as_ref()
    }

    /// Returns `true` when the highlighted target changed.
    pub fn set<S: HighlightSink + ?Sized>(&mut self, next: Option<&ContainerRef>, sink: &mut S) -> bool {
        if self.highlighted.as_ref() == next {
            return false;
        }
        if let Some(prev) = self.highlighted.take() {
            sink.clear_highlight(&prev);
        }
        if let Some(next) = next {
            sink.apply_highlight(next);
            self.highlighted = Some(next.clone());
        }
        true
    }

    pub fn clear<S: HighlightSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        self.set(None, sink)
    }
}

/// Lets a hit-test pass through at most once per `interval_ms`, however fast
/// pointer events arrive.
#[derive(Clone, Debug)]
pub(crate) struct SampleGate {
    interval_ms: i64,
    last_ms: Option<i64>,
}

impl SampleGate {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn admit(&mut self, now_ms: i64) -> bool {
        match self.last_ms {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::testing::{RecordingSurface, SurfaceCall};
    #[cfg(not(target_arch = "wasm32"))]
    use proptest::prelude::*;

    fn folder(id: &str) -> ContainerRef {
        ContainerRef::Folder(id.to_string())
    }

    #[test]
    fn test_switch_clears_before_apply() {
        let surface = RecordingSurface::default();
        let mut sink = surface.clone();
        let mut hl = HighlightState::default();

        assert!(hl.set(Some(&folder("a")), &mut sink));
        assert!(hl.set(Some(&folder("b")), &mut sink));

        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::Apply(folder("a")),
                SurfaceCall::Clear(folder("a")),
                SurfaceCall::Apply(folder("b")),
            ]
        );
    }

    #[test]
    fn test_same_target_is_idempotent() {
        let surface = RecordingSurface::default();
        let mut sink = surface.clone();
        let mut hl = HighlightState::default();

        hl.set(Some(&ContainerRef::Root), &mut sink);
        assert!(!hl.set(Some(&ContainerRef::Root), &mut sink));
        assert_eq!(surface.calls().len(), 1);

        assert!(hl.clear(&mut sink));
        assert!(!hl.clear(&mut sink));
        assert_eq!(surface.calls().len(), 2);
    }

    #[test]
    fn test_sample_gate_rate_limits() {
        let mut gate = SampleGate::new(100);
        assert!(gate.admit(0));
        assert!(!gate.admit(10));
        assert!(!gate.admit(99));
        assert!(gate.admit(100));
        gate.reset();
        assert!(gate.admit(101));
    }

    #[cfg(not(target_arch = "wasm32"))]
    proptest! {
        #[test]
        fn prop_never_two_highlighted(targets in proptest::collection::vec(proptest::option::of(0u8..4), 0..64)) {
            let surface = RecordingSurface::default();
            let mut sink = surface.clone();
            let mut hl = HighlightState::default();

            for t in &targets {
                let next = t.map(|n| folder(&n.to_string()));
                hl.set(next.as_ref(), &mut sink);
                prop_assert!(surface.max_concurrent_highlights() <= 1);
            }
            prop_assert_eq!(surface.highlighted(), hl.current().cloned().into_iter().collect::<Vec<_>>());
        }
    }
}
