//! Touch input adapter
//!
//! macroquad reports the current contacts each frame. `TouchTracker`
//! turns those snapshots into the start/move/end stream the gesture
//! interpreter expects. Contacts keep the order they first touched down,
//! so the "first" and "second" finger stay stable across a sequence.
//!
//! Without a touch screen the left mouse button acts as one finger.

use crate::geometry::Point2;
use crate::gesture::TouchEvent;

/// Contact id used for the mouse fallback
pub const MOUSE_CONTACT_ID: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Started,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

/// One contact as reported for a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: u64,
    pub phase: ContactPhase,
    pub position: Point2,
}

#[derive(Debug, Clone, Default)]
pub struct TouchTracker {
    /// Active contacts in touch-down order
    active: Vec<(u64, Point2)>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn positions(&self) -> Vec<Point2> {
        self.active.iter().map(|(_, p)| *p).collect()
    }

    /// Insert or move a contact. Returns true if anything changed.
    fn upsert(&mut self, id: u64, position: Point2) -> bool {
        match self.active.iter_mut().find(|(i, _)| *i == id) {
            Some((_, p)) if *p == position => false,
            Some((_, p)) => {
                *p = position;
                true
            }
            None => {
                self.active.push((id, position));
                true
            }
        }
    }

    /// Consume one frame of contacts and emit the resulting touch events
    pub fn update(&mut self, contacts: &[Contact], time_ms: f64) -> Vec<TouchEvent> {
        let mut events = Vec::new();
        let was_active = !self.active.is_empty();

        // Record final positions first, including lifting contacts,
        // so a release is reported where the finger left the screen
        let mut changed = false;
        for c in contacts {
            changed |= self.upsert(c.id, c.position);
        }

        if !was_active && !self.active.is_empty() {
            events.push(TouchEvent::Start { touches: self.positions(), time_ms });
        } else if changed {
            events.push(TouchEvent::Move { touches: self.positions() });
        }

        let before = self.active.len();
        self.active.retain(|(id, _)| {
            !contacts.iter().any(|c| {
                c.id == *id && matches!(c.phase, ContactPhase::Ended | ContactPhase::Cancelled)
            })
        });

        if self.active.len() < before {
            if self.active.is_empty() {
                events.push(TouchEvent::End { time_ms });
            } else {
                events.push(TouchEvent::Move { touches: self.positions() });
            }
        }

        events
    }

    /// Drop every contact without emitting events
    pub fn reset(&mut self) {
        self.active.clear();
    }
}

/// Left mouse button as a single contact
pub fn mouse_contact(pressed: bool, down: bool, released: bool, position: Point2) -> Option<Contact> {
    // A click shorter than a frame still starts and ends
    let phase = if released {
        ContactPhase::Ended
    } else if pressed {
        ContactPhase::Started
    } else if down {
        ContactPhase::Moved
    } else {
        return None;
    };
    Some(Contact { id: MOUSE_CONTACT_ID, phase, position })
}

/// This frame's contacts from the touch screen, or the mouse when there are none
pub fn poll_contacts() -> Vec<Contact> {
    use macroquad::prelude::*;

    let touches = touches();
    if !touches.is_empty() {
        return touches
            .iter()
            .map(|t| Contact {
                id: t.id,
                phase: match t.phase {
                    TouchPhase::Started => ContactPhase::Started,
                    TouchPhase::Moved => ContactPhase::Moved,
                    TouchPhase::Stationary => ContactPhase::Stationary,
                    TouchPhase::Ended => ContactPhase::Ended,
                    TouchPhase::Cancelled => ContactPhase::Cancelled,
                },
                position: Point2::new(t.position.x, t.position.y),
            })
            .collect();
    }

    let (x, y) = mouse_position();
    mouse_contact(
        is_mouse_button_pressed(MouseButton::Left),
        is_mouse_button_down(MouseButton::Left),
        is_mouse_button_released(MouseButton::Left),
        Point2::new(x, y),
    )
    .into_iter()
    .collect()
}
