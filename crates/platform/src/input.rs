//! Mouse input for the orbit controller.

use corelib::camera::Camera;
use corelib::orbit::OrbitController;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of a precise (touchpad) scroll that count as one wheel step.
const PIXELS_PER_STEP: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drag {
    Rotate,
    Pan,
}

impl Drag {
    pub fn for_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(Drag::Rotate),
            MouseButton::Right | MouseButton::Middle => Some(Drag::Pan),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct OrbitInput {
    drag: Option<Drag>,
    cursor: Option<(f64, f64)>,
}

impl OrbitInput {
    /// `allow_start` is false while the pointer is over UI.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState, allow_start: bool) {
        match state {
            ElementState::Pressed if allow_start && self.drag.is_none() => {
                self.drag = Drag::for_button(button);
            }
            ElementState::Released if self.drag == Drag::for_button(button) => {
                self.drag = None;
            }
            _ => {}
        }
    }

    pub fn on_cursor_moved(
        &mut self,
        x: f64,
        y: f64,
        height: f32,
        orbit: &mut OrbitController,
        camera: &Camera,
    ) {
        if let (Some(drag), Some((px, py))) = (self.drag, self.cursor) {
            let (dx, dy) = ((x - px) as f32, (y - py) as f32);
            match drag {
                Drag::Rotate => orbit.rotate_by_pixels(dx, dy, height),
                Drag::Pan => orbit.pan_by_pixels(dx, dy, height, camera),
            }
        }
        self.cursor = Some((x, y));
    }

    pub fn on_wheel(&mut self, delta: MouseScrollDelta, orbit: &mut OrbitController) {
        orbit.zoom_by_wheel(wheel_steps(delta));
    }

    pub fn on_cursor_left(&mut self) {
        self.cursor = None;
        self.drag = None;
    }
}

/// Positive values zoom in.
pub fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_STEP) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn buttons_map_to_drags() {
        assert_eq!(Drag::for_button(MouseButton::Left), Some(Drag::Rotate));
        assert_eq!(Drag::for_button(MouseButton::Right), Some(Drag::Pan));
        assert_eq!(Drag::for_button(MouseButton::Middle), Some(Drag::Pan));
        assert_eq!(Drag::for_button(MouseButton::Back), None);
    }

    #[test]
    fn drag_does_not_start_over_ui() {
        let mut input = OrbitInput::default();
        input.on_button(MouseButton::Left, ElementState::Pressed, false);
        assert_eq!(input.drag, None);
        input.on_button(MouseButton::Left, ElementState::Pressed, true);
        assert_eq!(input.drag, Some(Drag::Rotate));
        // Releasing another button keeps the drag.
        input.on_button(MouseButton::Right, ElementState::Released, true);
        assert_eq!(input.drag, Some(Drag::Rotate));
        input.on_button(MouseButton::Left, ElementState::Released, true);
        assert_eq!(input.drag, None);
    }

    #[test]
    fn wheel_steps_from_lines_and_pixels() {
        assert_eq!(wheel_steps(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        assert_eq!(
            wheel_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0))),
            -2.0
        );
    }
}
