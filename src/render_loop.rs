//! Render loop driver
//!
//! The loop is a handle that owns at most one pending frame request.
//! Each tick advances auto-rotation, renders, and asks for the next frame.
//! Starting again cancels the pending request first, so loops never stack.

use crate::scene::SceneState;

/// Identifies one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Source of frame callbacks (the display's vsync, or a fake in tests)
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Draws the scene through its camera
pub trait SceneRenderer {
    fn render(&mut self, scene: &SceneState);
}

/// In-process scheduler pumped once per display frame by the host
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    queued: Vec<FrameToken>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest request still waiting, removed from the queue
    pub fn take_ready(&mut self) -> Option<FrameToken> {
        if self.queued.is_empty() {
            None
        } else {
            Some(self.queued.remove(0))
        }
    }

    pub fn pending(&self) -> usize {
        self.queued.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.queued.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queued.retain(|t| *t != token);
    }
}

/// Loop-owning handle with start/stop lifecycle
#[derive(Debug, Default)]
pub struct RenderLoop {
    pending: Option<FrameToken>,
    /// Radians per frame around Y; None disables auto-rotate
    auto_rotate: Option<f32>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(auto_rotate: Option<f32>) -> Self {
        Self {
            pending: None,
            auto_rotate,
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Frames rendered since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Begin ticking. Any earlier pending tick is cancelled.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.stop(scheduler);
        self.pending = Some(scheduler.request_frame());
    }

    /// Cancel the pending tick. Safe to call repeatedly or before `start`.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel_frame(token);
        }
    }

    /// Run one frame if `token` is the one this loop is waiting for.
    /// Returns whether a frame was rendered.
    pub fn tick(
        &mut self,
        token: FrameToken,
        scene: &mut SceneState,
        renderer: &mut dyn SceneRenderer,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        if self.pending != Some(token) {
            return false;
        }

        if let Some(speed) = self.auto_rotate {
            if scene.is_loaded() {
                scene.model.rotation.y += speed;
            }
        }

        renderer.render(scene);
        self.frames += 1;
        self.pending = Some(scheduler.request_frame());
        true
    }
}
