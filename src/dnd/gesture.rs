//! Press → hold/move → release lifecycle of a single pointer.
//!
//! ```text
//! idle --press--> pending --(hold >= threshold) or (move >= tolerance)--> active
//! pending --release--> idle      (aborted: it was a click)
//! active  --release--> idle      (drop)
//! active  --cancel-->  idle      (no commit)
//! ```
//!
//! Time is passed in by the caller (`now_ms`), so the tracker never reads a
//! clock and tests can step it deterministically.

use crate::dnd::config::DragConfig;
use crate::dnd::error::DragError;
use crate::dnd::geometry::Point;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum GesturePhase {
    #[default]
    Idle,
    Pending,
    Active,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum GestureEvent {
    /// Pending press crossed the hold or travel threshold.
    Activated { item: String, at: Point },
    /// Pointer moved while active.
    Moved { item: String, at: Point },
    /// Released before activation. Treat as a click.
    Aborted { item: String },
    /// Released while active.
    Released { item: String, at: Point },
    Cancelled { item: String },
}

#[derive(Clone, Debug)]
struct Press {
    item: String,
    origin: Point,
    at_ms: i64,
}

#[derive(Clone, Debug)]
pub(crate) struct GestureTracker {
    hold_threshold_ms: i64,
    move_tolerance_px: f64,
    phase: GesturePhase,
    press: Option<Press>,
    last_point: Point,
}

impl GestureTracker {
    pub fn new(config: &DragConfig) -> Self {
        Self {
            hold_threshold_ms: config.hold_threshold_ms,
            move_tolerance_px: config.move_tolerance_px,
            phase: GesturePhase::Idle,
            press: None,
            last_point: Point::default(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    #[cfg(test)]
    pub fn item(&self) -> Option<&str> {
        self.press.as_ref().map(|p| p.item.as_str())
    }

    pub fn press_point(&self) -> Option<Point> {
        self.press.as_ref().map(|p| p.origin)
    }

    pub fn press(&mut self, item: &str, at: Point, now_ms: i64) -> Result<(), DragError> {
        if self.phase != GesturePhase::Idle {
            return Err(DragError::SessionBusy);
        }
        self.press = Some(Press {
            item: item.to_string(),
            origin: at,
            at_ms: now_ms,
        });
        self.phase = GesturePhase::Pending;
        self.last_point = at;
        Ok(())
    }

    pub fn pointer_move(&mut self, at: Point, now_ms: i64) -> Option<GestureEvent> {
        let press = self.press.as_ref()?;
        self.last_point = at;

        match self.phase {
            GesturePhase::Idle => None,
            GesturePhase::Pending => {
                let moved = press.origin.distance_to(at) >= self.move_tolerance_px;
                let held = now_ms - press.at_ms >= self.hold_threshold_ms;
                if moved || held {
                    self.phase = GesturePhase::Active;
                    Some(GestureEvent::Activated {
                        item: press.item.clone(),
                        at,
                    })
                } else {
                    None
                }
            }
            GesturePhase::Active => Some(GestureEvent::Moved {
                item: press.item.clone(),
                at,
            }),
        }
    }

    /// Timer-driven hold check, for a pointer that stays perfectly still.
    pub fn tick(&mut self, now_ms: i64) -> Option<GestureEvent> {
        let press = self.press.as_ref()?;
        if self.phase == GesturePhase::Pending && now_ms - press.at_ms >= self.hold_threshold_ms {
            self.phase = GesturePhase::Active;
            return Some(GestureEvent::Activated {
                item: press.item.clone(),
                at: self.last_point,
            });
        }
        None
    }

    pub fn release(&mut self, at: Point) -> Option<GestureEvent> {
        let press = self.press.take()?;
        let phase = std::mem::take(&mut self.phase);
        self.last_point = at;

        match phase {
            GesturePhase::Idle => None,
            GesturePhase::Pending => Some(GestureEvent::Aborted { item: press.item }),
            GesturePhase::Active => Some(GestureEvent::Released {
                item: press.item,
                at,
            }),
        }
    }

    pub fn cancel(&mut self) -> Option<GestureEvent> {
        let press = self.press.take()?;
        self.phase = GesturePhase::Idle;
        Some(GestureEvent::Cancelled { item: press.item })
    }

    pub fn reset(&mut self) {
        self.press = None;
        self.phase = GesturePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> GestureTracker {
        GestureTracker::new(&DragConfig {
            hold_threshold_ms: 150,
            move_tolerance_px: 8.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_release_before_threshold_aborts() {
        let mut g = tracker();
        g.press("a", Point::new(0.0, 0.0), 1_000).expect("idle tracker accepts press");
        assert_eq!(g.pointer_move(Point::new(2.0, 2.0), 1_050), None);
        assert_eq!(g.phase(), GesturePhase::Pending);

        assert_eq!(
            g.release(Point::new(2.0, 2.0)),
            Some(GestureEvent::Aborted {
                item: "a".to_string()
            })
        );
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_travel_activates() {
        let mut g = tracker();
        g.press("a", Point::new(0.0, 0.0), 0).expect("press");
        let ev = g.pointer_move(Point::new(0.0, 8.0), 10);
        assert!(matches!(ev, Some(GestureEvent::Activated { .. })));
        assert_eq!(g.phase(), GesturePhase::Active);

        let ev = g.pointer_move(Point::new(0.0, 20.0), 20);
        assert!(matches!(ev, Some(GestureEvent::Moved { .. })));
    }

    #[test]
    fn test_hold_activates_on_tick() {
        let mut g = tracker();
        g.press("a", Point::new(3.0, 4.0), 0).expect("press");
        assert_eq!(g.tick(149), None);
        assert_eq!(
            g.tick(150),
            Some(GestureEvent::Activated {
                item: "a".to_string(),
                at: Point::new(3.0, 4.0)
            })
        );
        // Only once.
        assert_eq!(g.tick(400), None);
    }

    #[test]
    fn test_second_press_is_rejected_while_busy() {
        let mut g = tracker();
        g.press("a", Point::default(), 0).expect("press");
        assert!(matches!(
            g.press("b", Point::default(), 1),
            Err(DragError::SessionBusy)
        ));
        assert_eq!(g.item(), Some("a"));
    }

    #[test]
    fn test_cancel_and_release_on_idle_are_noops() {
        let mut g = tracker();
        assert_eq!(g.cancel(), None);
        assert_eq!(g.release(Point::default()), None);
        assert_eq!(g.pointer_move(Point::new(50.0, 50.0), 0), None);
    }
}
