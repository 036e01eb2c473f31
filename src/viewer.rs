//! Model viewer control surface
//!
//! `ModelViewer` owns the scene and every subsystem working on it. The host
//! feeds it touch events and pumps `frame` once per display frame; apps
//! drive it through the imperative methods below.
//!
//! Every operation is a no-op until a model has loaded, after a failed load
//! and after `unmount`. Only the boolean-returning lookups report failure.

use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::gesture::{GestureEffect, GestureInterpreter, TouchEvent};
use crate::highlight::HighlightManager;
use crate::math::{Axis, Vec3};
use crate::picking;
use crate::render_loop::{FrameQueue, RenderLoop, SceneRenderer};
use crate::scene::{Color, NodeId, SceneState, SceneTree, Selection};

pub type ModelLoadedCallback = Box<dyn FnMut(&[String])>;
pub type MeshClickedCallback = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStatus {
    /// Waiting for `complete_load`
    Loading,
    Ready,
    /// Load failed; the viewer stays inert
    Failed,
    Unmounted,
}

pub struct ModelViewer {
    config: ViewerConfig,
    scene: SceneState,
    gestures: GestureInterpreter,
    highlight: HighlightManager,
    render_loop: RenderLoop,
    frames: FrameQueue,
    renderer: Box<dyn SceneRenderer>,
    status: ViewerStatus,
    /// Drawable names captured at load
    mesh_names: Vec<String>,
    on_model_loaded: Option<ModelLoadedCallback>,
    on_mesh_clicked: Option<MeshClickedCallback>,
}

impl ModelViewer {
    pub fn new(config: ViewerConfig, renderer: Box<dyn SceneRenderer>) -> Self {
        let mut scene = SceneState::new(config.initial_camera_position());
        scene.model.rotation = config.initial_rotation;

        Self {
            gestures: GestureInterpreter::new(),
            highlight: HighlightManager::new(config.highlight_color()),
            render_loop: RenderLoop::new(config.auto_rotate_step()),
            frames: FrameQueue::new(),
            renderer,
            status: ViewerStatus::Loading,
            mesh_names: Vec::new(),
            on_model_loaded: None,
            on_mesh_clicked: None,
            scene,
            config,
        }
    }

    /// Called once with the mesh names after a successful load
    pub fn on_model_loaded(&mut self, callback: impl FnMut(&[String]) + 'static) {
        self.on_model_loaded = Some(Box::new(callback));
    }

    /// Called with the selected name whenever a mesh gets selected
    pub fn on_mesh_clicked(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_mesh_clicked = Some(Box::new(callback));
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn status(&self) -> ViewerStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.status == ViewerStatus::Ready
    }

    /// Frames rendered since the model loaded
    pub fn frames_rendered(&self) -> u64 {
        self.render_loop.frames()
    }

    /// Finish an asynchronous load. Results arriving after `unmount` are dropped.
    pub fn complete_load(&mut self, result: Result<SceneTree, LoadError>) {
        if self.status == ViewerStatus::Unmounted {
            log::debug!("Viewer unmounted, discarding load result");
            return;
        }

        match result {
            Ok(tree) => {
                self.scene.install(tree);
                self.restore_initial_view();
                self.mesh_names = self.scene.mesh_names();
                self.status = ViewerStatus::Ready;
                log::info!("Model loaded, meshes: {:?}", self.mesh_names);

                if let Some(callback) = self.on_model_loaded.as_mut() {
                    callback(&self.mesh_names);
                }
                self.render_loop.start(&mut self.frames);
            }
            Err(e) => {
                log::error!("Failed to load model: {}", e);
                self.status = ViewerStatus::Failed;
            }
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.scene.set_viewport(width, height);
    }

    /// Run the render loop's pending tick, if any. Returns whether a frame was drawn.
    pub fn frame(&mut self) -> bool {
        if self.status != ViewerStatus::Ready {
            return false;
        }
        match self.frames.take_ready() {
            Some(token) => self.render_loop.tick(
                token,
                &mut self.scene,
                self.renderer.as_mut(),
                &mut self.frames,
            ),
            None => false,
        }
    }

    /// Feed one raw touch event through the gesture interpreter
    pub fn handle_touch(&mut self, event: &TouchEvent) {
        if !self.is_loaded() || !self.config.enable_gestures {
            return;
        }
        for effect in self.gestures.handle(event) {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: GestureEffect) {
        match effect {
            GestureEffect::Rotate { yaw, pitch } => {
                self.scene.model.rotation.y += yaw;
                self.scene.model.rotation.x += pitch;
            }
            GestureEffect::Pan { dx, dy } => {
                self.scene.model.position.x += dx;
                self.scene.model.position.y += dy;
            }
            GestureEffect::Twist { radians } => self.scene.model.rotation.z += radians,
            GestureEffect::Pinch { ratio } => {
                let zoom = self.current_zoom() * ratio;
                self.zoom(zoom);
            }
            GestureEffect::Tap { x, y } => self.select_at(x, y),
        }
    }

    /// Select whatever is under a screen position; a miss clears the selection
    pub fn select_at(&mut self, x: f32, y: f32) {
        if !self.is_loaded() {
            return;
        }
        self.clear_selection();

        match picking::pick(&self.scene, x, y) {
            Some(hit) => {
                log::debug!("Tap at ({}, {}) hit '{}' at {:.3}", x, y, hit.name, hit.distance);
                self.select(hit.name, hit.mesh);
            }
            None => log::debug!("Tap at ({}, {}) hit nothing", x, y),
        }
    }

    fn clear_selection(&mut self) {
        HighlightManager::restore_all(&mut self.scene);
        self.scene.selection = None;
    }

    fn select(&mut self, name: String, mesh: NodeId) {
        self.highlight.highlight(&mut self.scene, mesh);
        log::info!("Selected '{}'", name);
        if let Some(callback) = self.on_mesh_clicked.as_mut() {
            callback(&name);
        }
        self.scene.selection = Some(Selection { name, mesh });
    }

    fn restore_initial_view(&mut self) {
        self.scene.model.rotation = self.config.initial_rotation;
        self.scene.model.position = Vec3::ZERO;
        self.scene.camera.position = self.config.initial_camera_position();
    }

    /// Zoom implied by the camera distance
    pub fn current_zoom(&self) -> f32 {
        self.config.reference_distance() / self.scene.camera.distance()
    }

    /// Set the model's absolute rotation around one axis
    pub fn rotate(&mut self, axis: Axis, radians: f32) {
        if !self.is_loaded() {
            return;
        }
        self.scene.model.rotation.set(axis, radians);
    }

    /// Set the zoom factor, clamped to the configured range
    pub fn zoom(&mut self, factor: f32) {
        if !self.is_loaded() || factor.is_nan() {
            return;
        }
        let clamped = self.config.clamp_zoom(factor);
        self.scene
            .camera
            .set_distance(self.config.reference_distance() / clamped);
    }

    /// Back to the configured rotation, camera and materials, with nothing selected
    pub fn reset_view(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.restore_initial_view();
        self.clear_selection();
        log::debug!("View reset");
    }

    /// Select the first mesh with this name. Unknown names change nothing.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let found = self
            .scene
            .tree
            .as_ref()
            .and_then(|tree| tree.find_drawable_by_name(name));

        match found {
            Some(mesh) => {
                self.clear_selection();
                self.select(name.to_string(), mesh);
                true
            }
            None => {
                log::warn!("No mesh named '{}'", name);
                false
            }
        }
    }

    /// Make `color` the highlight color and apply it to `name`.
    /// An already-selected mesh is recolored in place; otherwise it gets selected.
    pub fn change_color(&mut self, name: &str, color: Color) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.highlight.set_color(color);

        let current = self
            .scene
            .selection
            .as_ref()
            .filter(|s| s.name == name)
            .map(|s| s.mesh);
        match current {
            Some(mesh) => self.highlight.highlight(&mut self.scene, mesh),
            None => self.select_by_name(name),
        }
    }

    /// Mesh names captured at load, in traversal order
    pub fn list_mesh_names(&self) -> Vec<String> {
        if !self.is_loaded() {
            return Vec::new();
        }
        self.mesh_names.clone()
    }

    pub fn selected_mesh(&self) -> Option<&str> {
        self.scene.selected_name()
    }

    /// Stop rendering and drop the model. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.status == ViewerStatus::Unmounted {
            return;
        }
        self.render_loop.stop(&mut self.frames);
        self.gestures.cancel();
        self.scene.teardown();
        self.mesh_names.clear();
        self.on_model_loaded = None;
        self.on_mesh_clicked = None;
        self.status = ViewerStatus::Unmounted;
        log::debug!("Viewer unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use crate::highlight::highlighted_slot;
    use crate::math::{mat4_identity, mat4_translation};
    use crate::scene::{Geometry, Material, MaterialSlot};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullRenderer;

    impl SceneRenderer for NullRenderer {
        fn render(&mut self, _scene: &SceneState) {}
    }

    fn quad() -> Geometry {
        Geometry::new(
            vec![
                Vec3::new(-0.4, -0.4, 0.0),
                Vec3::new(0.4, -0.4, 0.0),
                Vec3::new(0.4, 0.4, 0.0),
                Vec3::new(-0.4, 0.4, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// Head in the middle, arms to either side
    fn figure() -> SceneTree {
        let mut tree = SceneTree::new(Some("Scene".into()));
        let root = tree.root();
        for (name, x, color) in [
            ("Head", 0.0, 0xffcc99),
            ("Arm_L", -1.0, 0x3366ff),
            ("Arm_R", 1.0, 0x3366ff),
        ] {
            tree.add_drawable(
                root,
                Some(name.into()),
                mat4_translation(Vec3::new(x, 0.0, 0.0)),
                quad(),
                Material::standard(Color::from_hex(color)).into(),
            );
        }
        tree
    }

    fn viewer() -> ModelViewer {
        let mut v = ModelViewer::new(ViewerConfig::default(), Box::new(NullRenderer));
        v.set_viewport(400.0, 400.0);
        v
    }

    fn loaded() -> ModelViewer {
        let mut v = viewer();
        v.complete_load(Ok(figure()));
        v
    }

    fn material_of(v: &ModelViewer, name: &str) -> MaterialSlot {
        let tree = v.scene().tree.as_ref().unwrap();
        let id = tree.find_drawable_by_name(name).unwrap();
        tree.material(id).unwrap().clone()
    }

    /// Material captured before `name` was first highlighted
    fn original_of(v: &ModelViewer, name: &str) -> MaterialSlot {
        let id = v.scene().tree.as_ref().unwrap().find_drawable_by_name(name).unwrap();
        v.scene().original_materials.get(&id).cloned().unwrap()
    }

    fn touch(points: &[(f32, f32)]) -> Vec<Point2> {
        points.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn test_load_reports_mesh_names() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut v = viewer();
        let sink = seen.clone();
        v.on_model_loaded(move |names| sink.borrow_mut().extend_from_slice(names));

        v.complete_load(Ok(figure()));

        assert!(v.is_loaded());
        assert_eq!(v.list_mesh_names(), vec!["Head", "Arm_L", "Arm_R"]);
        assert_eq!(*seen.borrow(), vec!["Head", "Arm_L", "Arm_R"]);
    }

    #[test]
    fn test_select_recolor_and_unknown_name() {
        let mut v = loaded();
        let arm_original = material_of(&v, "Arm_L");
        let head_original = material_of(&v, "Head");

        assert!(v.select_by_name("Arm_L"));
        assert_eq!(v.selected_mesh(), Some("Arm_L"));
        assert_eq!(
            material_of(&v, "Arm_L"),
            highlighted_slot(&arm_original, Color::from_hex(0x00ff00))
        );

        assert!(v.change_color("Arm_L", Color::from_hex(0xff0000)));
        assert_eq!(v.selected_mesh(), Some("Arm_L"));
        assert_eq!(
            material_of(&v, "Arm_L"),
            highlighted_slot(&arm_original, Color::from_hex(0xff0000))
        );
        assert_eq!(material_of(&v, "Head"), head_original);

        let before = material_of(&v, "Arm_L");
        assert!(!v.select_by_name("Leg"));
        assert_eq!(v.selected_mesh(), Some("Arm_L"));
        assert_eq!(material_of(&v, "Arm_L"), before);
    }

    #[test]
    fn test_reselecting_restores_exact_original() {
        let mut v = loaded();
        let head = material_of(&v, "Head");
        let arm = material_of(&v, "Arm_R");

        v.select_by_name("Head");
        v.select_by_name("Arm_R");
        assert_eq!(material_of(&v, "Head"), head);
        assert_ne!(material_of(&v, "Arm_R"), arm);

        v.select_by_name("Head");
        assert_eq!(material_of(&v, "Arm_R"), arm);
        assert_eq!(
            material_of(&v, "Head"),
            highlighted_slot(&head, Color::from_hex(0x00ff00))
        );
    }

    #[test]
    fn test_change_color_selects_unselected_mesh() {
        let mut v = loaded();
        v.select_by_name("Head");
        assert!(v.change_color("Arm_R", Color::from_hex(0x0000ff)));
        assert_eq!(v.selected_mesh(), Some("Arm_R"));
        // The new color sticks for later selections
        v.select_by_name("Head");
        let head = original_of(&v, "Head");
        assert_eq!(
            material_of(&v, "Head"),
            highlighted_slot(&head, Color::from_hex(0x0000ff))
        );
        assert!(!v.change_color("Leg", Color::WHITE));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut v = loaded();

        v.zoom(1000.0);
        assert!((v.scene().camera.distance() - 3.0 / 5.0).abs() < 1e-6);
        assert!((v.current_zoom() - 5.0).abs() < 1e-4);

        v.zoom(0.0001);
        assert!((v.scene().camera.distance() - 3.0 / 0.5).abs() < 1e-6);

        v.zoom(f32::NAN);
        assert!((v.current_zoom() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pinch_doubles_zoom() {
        let mut v = loaded();
        v.handle_touch(&TouchEvent::Start { touches: touch(&[(150.0, 200.0), (250.0, 200.0)]), time_ms: 0.0 });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(100.0, 200.0), (300.0, 200.0)]) });
        v.handle_touch(&TouchEvent::End { time_ms: 400.0 });

        assert!((v.current_zoom() - 2.0).abs() < 1e-5);
        assert!((v.scene().camera.distance() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_drag_rotates_model() {
        let mut v = loaded();
        v.handle_touch(&TouchEvent::Start { touches: touch(&[(10.0, 10.0)]), time_ms: 0.0 });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(35.0, 10.0)]) });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(60.0, 10.0)]) });
        v.handle_touch(&TouchEvent::End { time_ms: 500.0 });

        let rotation = v.scene().model.rotation;
        assert!((rotation.y - 0.5).abs() < 1e-5);
        assert_eq!(rotation.x, 0.0);
        assert_eq!(v.selected_mesh(), None);
    }

    #[test]
    fn test_tap_picks_once_and_miss_deselects() {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let mut v = loaded();
        let sink = clicks.clone();
        v.on_mesh_clicked(move |name| sink.borrow_mut().push(name.to_string()));

        v.handle_touch(&TouchEvent::Start { touches: touch(&[(200.0, 200.0)]), time_ms: 0.0 });
        v.handle_touch(&TouchEvent::End { time_ms: 80.0 });
        assert_eq!(*clicks.borrow(), vec!["Head"]);
        assert_eq!(v.selected_mesh(), Some("Head"));

        let head = original_of(&v, "Head");
        v.handle_touch(&TouchEvent::Start { touches: touch(&[(5.0, 5.0)]), time_ms: 1000.0 });
        v.handle_touch(&TouchEvent::End { time_ms: 1050.0 });
        assert_eq!(clicks.borrow().len(), 1);
        assert_eq!(v.selected_mesh(), None);
        assert_eq!(material_of(&v, "Head"), head);
    }

    #[test]
    fn test_gestures_can_be_disabled() {
        let config = ViewerConfig { enable_gestures: false, ..ViewerConfig::default() };
        let mut v = ModelViewer::new(config, Box::new(NullRenderer));
        v.complete_load(Ok(figure()));

        v.handle_touch(&TouchEvent::Start { touches: touch(&[(0.0, 0.0)]), time_ms: 0.0 });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(100.0, 0.0)]) });
        assert_eq!(v.scene().model.rotation, Vec3::ZERO);

        // The imperative surface still works
        assert!(v.select_by_name("Head"));
    }

    #[test]
    fn test_reset_view() {
        let config = ViewerConfig {
            initial_rotation: Vec3::new(0.0, 0.3, 0.0),
            ..ViewerConfig::default()
        };
        let mut v = ModelViewer::new(config, Box::new(NullRenderer));
        v.complete_load(Ok(figure()));
        let head = material_of(&v, "Head");

        v.rotate(Axis::X, 1.0);
        v.zoom(2.0);
        v.select_by_name("Head");
        v.handle_touch(&TouchEvent::Start { touches: touch(&[(0.0, 0.0), (100.0, 0.0)]), time_ms: 0.0 });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(0.0, 0.0), (100.0, 0.0)]) });
        v.handle_touch(&TouchEvent::Move { touches: touch(&[(20.0, 0.0), (120.0, 0.0)]) });
        assert_ne!(v.scene().model.position, Vec3::ZERO);

        v.reset_view();
        assert_eq!(v.scene().model.rotation, Vec3::new(0.0, 0.3, 0.0));
        assert_eq!(v.scene().model.position, Vec3::ZERO);
        assert_eq!(v.scene().camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(v.selected_mesh(), None);
        assert_eq!(material_of(&v, "Head"), head);
    }

    #[test]
    fn test_operations_are_noops_before_load() {
        let mut v = viewer();
        v.rotate(Axis::Y, 1.0);
        v.zoom(2.0);
        v.reset_view();
        v.select_at(200.0, 200.0);
        v.handle_touch(&TouchEvent::Start { touches: touch(&[(0.0, 0.0)]), time_ms: 0.0 });

        assert!(!v.select_by_name("Head"));
        assert!(!v.change_color("Head", Color::WHITE));
        assert!(v.list_mesh_names().is_empty());
        assert!(!v.frame());
        assert_eq!(v.scene().model.rotation, Vec3::ZERO);
        assert_eq!(v.scene().camera.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_failed_load_stays_inert() {
        let mut v = viewer();
        v.complete_load(Err(LoadError::EmptyScene));
        assert_eq!(v.status(), ViewerStatus::Failed);
        assert!(!v.select_by_name("Head"));
        assert!(!v.frame());
    }

    #[test]
    fn test_render_loop_runs_after_load_and_stops_on_unmount() {
        let mut v = loaded();
        assert!(v.frame());
        assert!(v.frame());
        assert_eq!(v.frames_rendered(), 2);

        v.unmount();
        v.unmount();
        assert_eq!(v.status(), ViewerStatus::Unmounted);
        assert!(!v.frame());
        assert!(v.list_mesh_names().is_empty());

        // A late load result is ignored
        v.complete_load(Ok(figure()));
        assert_eq!(v.status(), ViewerStatus::Unmounted);
        assert!(!v.scene().is_loaded());
    }

    #[test]
    fn test_unmount_before_load() {
        let mut v = viewer();
        v.unmount();
        assert_eq!(v.status(), ViewerStatus::Unmounted);
    }

    #[test]
    fn test_group_selection_highlights_first_drawable() {
        let mut tree = SceneTree::new(None);
        let root = tree.root();
        let body = tree.add_group(root, Some("Body".into()), mat4_identity());
        tree.add_drawable(body, None, mat4_identity(), quad(), Material::standard(Color::WHITE).into());
        let mut v = viewer();
        v.complete_load(Ok(tree));

        v.select_at(200.0, 200.0);
        assert_eq!(v.selected_mesh(), Some("Body"));
        assert_eq!(v.scene().original_materials.len(), 1);
    }
}
