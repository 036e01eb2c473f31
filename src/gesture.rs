//! Touch gesture interpreter
//!
//! Turns a raw touch stream into model/camera manipulations. One finger
//! rotates the model; two fingers pan (centroid motion), pinch (distance
//! ratio) and twist (angle change) at the same time. A sequence that never
//! moved far and ended quickly is a tap.
//!
//! Key concepts:
//! - `GesturePhase`: Idle, TouchStart, SingleTouchTrack, MultiTouchTrack
//! - `transition`: pure `(state, event) -> (state, effects)`
//! - Tap eligibility is decided incrementally during moves; whether the
//!   release was a tap is decided once, from endpoints and duration. A drag
//!   that wanders back to its start is therefore never a tap.

use crate::geometry::{angle_degrees, centroid, centroid_of, classify_tap, distance, Point2};

/// Movement (pixels, either axis) after which a sequence can no longer be a tap
pub const TAP_ELIGIBILITY_THRESHOLD: f32 = 5.0;

/// Radians of model rotation per pixel of single-finger drag
pub const ROTATE_SENSITIVITY: f32 = 0.01;

/// World units of model translation per pixel of two-finger drag
pub const PAN_SENSITIVITY: f32 = 0.005;

/// Fraction of the finger angle change applied as roll
pub const TWIST_DAMPING: f32 = 0.1;

/// Raw input delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    /// First contact(s) of a sequence
    Start { touches: Vec<Point2>, time_ms: f64 },
    /// Current positions of all active contacts
    Move { touches: Vec<Point2> },
    /// Last contact lifted
    End { time_ms: f64 },
}

/// Manipulation requested by a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    /// Add to model rotation: `yaw` around Y, `pitch` around X (radians)
    Rotate { yaw: f32, pitch: f32 },
    /// Add to model position (world units, Y up)
    Pan { dx: f32, dy: f32 },
    /// Multiply the zoom by `ratio`
    Pinch { ratio: f32 },
    /// Add to model rotation around Z (radians)
    Twist { radians: f32 },
    /// Selection intent at a screen position
    Tap { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    /// Contacts down, no movement yet
    TouchStart,
    SingleTouchTrack,
    MultiTouchTrack,
}

/// Per-sequence tracking data. Reset to default on release.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    pub phase: GesturePhase,
    pub start_time_ms: Option<f64>,
    /// Centroid of the initial contacts
    pub start_position: Option<Point2>,
    pub previous_position: Option<Point2>,
    pub previous_centroid: Option<Point2>,
    pub previous_distance: Option<f32>,
    pub previous_angle: Option<f32>,
    pub last_touch: Option<Point2>,
    pub tap_eligible: bool,
}

/// Wrap an angle difference into (-180, 180]
fn wrap_degrees(delta: f32) -> f32 {
    let wrapped = (delta + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

fn on_start(touches: &[Point2], time_ms: f64) -> GestureState {
    let mut state = GestureState {
        phase: GesturePhase::TouchStart,
        start_time_ms: Some(time_ms),
        start_position: centroid_of(touches),
        ..GestureState::default()
    };

    match touches {
        [p] => {
            state.previous_position = Some(*p);
            state.last_touch = Some(*p);
            state.tap_eligible = true;
        }
        [a, b] => {
            state.previous_distance = Some(distance(*a, *b));
            state.previous_angle = Some(angle_degrees(*a, *b));
            // Two-finger sequences are never taps
            state.tap_eligible = false;
        }
        _ => state.tap_eligible = false,
    }

    state
}

fn on_move(mut state: GestureState, touches: &[Point2]) -> (GestureState, Vec<GestureEffect>) {
    let mut effects = Vec::new();

    if let (Some(start), Some(now)) = (state.start_position, centroid_of(touches)) {
        if (now.x - start.x).abs() > TAP_ELIGIBILITY_THRESHOLD
            || (now.y - start.y).abs() > TAP_ELIGIBILITY_THRESHOLD
        {
            state.tap_eligible = false;
        }
    }

    match touches {
        [p] => {
            if state.phase == GesturePhase::MultiTouchTrack {
                // Back to one finger: the old single-touch anchor is stale
                state.previous_position = None;
            }
            state.previous_centroid = None;
            state.previous_distance = None;
            state.previous_angle = None;

            if let Some(prev) = state.previous_position {
                effects.push(GestureEffect::Rotate {
                    yaw: (p.x - prev.x) * ROTATE_SENSITIVITY,
                    pitch: (p.y - prev.y) * ROTATE_SENSITIVITY,
                });
            }
            state.previous_position = Some(*p);
            state.last_touch = Some(*p);
            state.phase = GesturePhase::SingleTouchTrack;
        }
        [a, b] => {
            // A second finger rules out a tap for the rest of the sequence
            state.tap_eligible = false;
            if state.phase == GesturePhase::SingleTouchTrack {
                // Second finger joined mid-drag; start the pair trackers fresh
                state.previous_centroid = None;
                state.previous_distance = None;
                state.previous_angle = None;
            }

            let center = centroid(*a, *b);
            if let Some(prev) = state.previous_centroid {
                effects.push(GestureEffect::Pan {
                    dx: (center.x - prev.x) * PAN_SENSITIVITY,
                    dy: -(center.y - prev.y) * PAN_SENSITIVITY,
                });
            }

            let spread = distance(*a, *b);
            if let Some(prev) = state.previous_distance.filter(|d| *d > 0.0) {
                effects.push(GestureEffect::Pinch { ratio: spread / prev });
            }

            let angle = angle_degrees(*a, *b);
            if let Some(prev) = state.previous_angle {
                let delta = wrap_degrees(angle - prev) * TWIST_DAMPING;
                effects.push(GestureEffect::Twist { radians: delta.to_radians() });
            }

            state.previous_centroid = Some(center);
            state.previous_distance = Some(spread);
            state.previous_angle = Some(angle);
            state.phase = GesturePhase::MultiTouchTrack;
        }
        [] => {}
        _ => state.tap_eligible = false,
    }

    (state, effects)
}

fn on_end(state: GestureState, time_ms: f64) -> Vec<GestureEffect> {
    let duration = time_ms - state.start_time_ms.unwrap_or(time_ms);

    match (state.tap_eligible, state.start_position, state.last_touch) {
        (true, Some(start), Some(last)) if classify_tap(start.x, start.y, last.x, last.y, duration) => {
            vec![GestureEffect::Tap { x: last.x, y: last.y }]
        }
        _ => Vec::new(),
    }
}

/// Pure state transition
pub fn transition(state: GestureState, event: &TouchEvent) -> (GestureState, Vec<GestureEffect>) {
    match event {
        TouchEvent::Start { touches, time_ms } => (on_start(touches, *time_ms), Vec::new()),
        TouchEvent::Move { touches } => {
            if state.phase == GesturePhase::Idle {
                return (state, Vec::new());
            }
            on_move(state, touches)
        }
        TouchEvent::End { time_ms } => {
            if state.phase == GesturePhase::Idle {
                return (GestureState::default(), Vec::new());
            }
            (GestureState::default(), on_end(state, *time_ms))
        }
    }
}

/// Owns the gesture state between events
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    state: GestureState,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn phase(&self) -> GesturePhase {
        self.state.phase
    }

    /// Feed one event, returning the manipulations it produced
    pub fn handle(&mut self, event: &TouchEvent) -> Vec<GestureEffect> {
        let (next, effects) = transition(std::mem::take(&mut self.state), event);
        self.state = next;
        effects
    }

    /// Abandon the current sequence without producing a tap
    pub fn cancel(&mut self) {
        self.state = GestureState::default();
    }
}
