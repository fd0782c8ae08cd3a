use std::time::{Duration, Instant};

use kurbo::Point;

use crate::transform::ViewTransform;

pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;
pub const WHEEL_SETTLE: Duration = Duration::from_millis(300);

/// A single touch contact in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: TouchPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Raw pointer input, as delivered by the host event queue.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    TouchStart(Vec<TouchPoint>),
    TouchMove(Vec<TouchPoint>),
    TouchEnd,
    /// Positive `delta_y` scrolls down (zoom out), negative scrolls up.
    Wheel { delta_y: f64 },
}

/// What the host shell should do after an event was interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureOutcome {
    pub redraw: bool,
    /// Suppress the platform's default scroll/navigation handling.
    pub suppress_default: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Dragging { last: Point },
    Pinching { last_dist: f64 },
}

/// Translates raw pointer/touch/wheel events into pan and zoom updates on a
/// [`ViewTransform`], and owns the transient interaction flag that drives
/// the compositor's preview feedback.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    phase: Phase,
    interacting: bool,
    wheel_settle: Option<Instant>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            interacting: false,
            wheel_settle: None,
        }
    }

    /// True while a drag/pinch is active or a wheel burst has not settled.
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// Interpret one event. Gestures are silent no-ops while no photo is
    /// loaded; release events still clear state so the feedback cannot
    /// stick.
    pub fn handle(
        &mut self,
        event: GestureEvent,
        now: Instant,
        photo_loaded: bool,
        transform: &mut ViewTransform,
    ) -> GestureOutcome {
        match event {
            GestureEvent::PointerDown { x, y } => {
                if !photo_loaded {
                    return GestureOutcome::default();
                }
                self.phase = Phase::Dragging {
                    last: Point::new(x, y),
                };
                self.interacting = true;
                GestureOutcome::default()
            }
            GestureEvent::PointerMove { x, y } => {
                if !photo_loaded {
                    return GestureOutcome::default();
                }
                let Phase::Dragging { last } = self.phase else {
                    return GestureOutcome::default();
                };
                transform.apply_pan(x - last.x, y - last.y);
                self.phase = Phase::Dragging {
                    last: Point::new(x, y),
                };
                GestureOutcome {
                    redraw: true,
                    suppress_default: false,
                }
            }
            GestureEvent::PointerUp | GestureEvent::PointerLeave | GestureEvent::TouchEnd => {
                self.phase = Phase::Idle;
                self.interacting = false;
                GestureOutcome {
                    redraw: true,
                    suppress_default: false,
                }
            }
            GestureEvent::TouchStart(touches) => {
                if !photo_loaded {
                    return GestureOutcome::default();
                }
                self.interacting = true;
                match touches.as_slice() {
                    [t] => {
                        self.phase = Phase::Dragging {
                            last: Point::new(t.x, t.y),
                        };
                    }
                    [a, b, ..] => {
                        self.phase = Phase::Pinching {
                            last_dist: a.distance_to(*b),
                        };
                    }
                    [] => {}
                }
                GestureOutcome::default()
            }
            GestureEvent::TouchMove(touches) => {
                if !photo_loaded {
                    return GestureOutcome::default();
                }
                match touches.as_slice() {
                    [t] => {
                        if let Phase::Dragging { last } = self.phase {
                            transform.apply_pan(t.x - last.x, t.y - last.y);
                            self.phase = Phase::Dragging {
                                last: Point::new(t.x, t.y),
                            };
                        }
                    }
                    [a, b, ..] => {
                        let new_dist = a.distance_to(*b);
                        match self.phase {
                            Phase::Pinching { last_dist } if last_dist > 0.0 => {
                                transform.apply_zoom(new_dist / last_dist);
                                self.phase = Phase::Pinching {
                                    last_dist: new_dist,
                                };
                            }
                            // A second finger landed without a fresh
                            // touch-start: record the distance, zoom from
                            // the next move.
                            _ => {
                                self.phase = Phase::Pinching {
                                    last_dist: new_dist,
                                };
                            }
                        }
                    }
                    [] => {}
                }
                GestureOutcome {
                    redraw: true,
                    suppress_default: true,
                }
            }
            GestureEvent::Wheel { delta_y } => {
                if !photo_loaded {
                    return GestureOutcome::default();
                }
                self.interacting = true;
                let factor = if delta_y < 0.0 {
                    WHEEL_ZOOM_IN
                } else {
                    WHEEL_ZOOM_OUT
                };
                transform.apply_zoom(factor);
                self.wheel_settle = Some(now + WHEEL_SETTLE);
                GestureOutcome {
                    redraw: true,
                    suppress_default: true,
                }
            }
        }
    }

    /// Advance the wheel-settle timer. Returns an outcome requesting a
    /// redraw when the settle deadline passes with no intervening wheel
    /// tick; at most one settle fires per quiescent period.
    pub fn tick(&mut self, now: Instant) -> GestureOutcome {
        match self.wheel_settle {
            Some(deadline) if now >= deadline => {
                self.wheel_settle = None;
                self.interacting = false;
                GestureOutcome {
                    redraw: true,
                    suppress_default: false,
                }
            }
            _ => GestureOutcome::default(),
        }
    }
}
