// Pointer input model: where the pointer is, whether it is feeding the fire,
// and (for the inertia flame) how far it moved since the last frame.
// Visual: the flame follows `pointer`; `activation` turns the fuel on/off.

use std::sync::mpsc::{self, Receiver, Sender};

use cgmath::{vec2, Vector2};

/// Which button a press came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Host-agnostic input. Positions are normalised to the viewport, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Move { x: f32, y: f32 },
    Activate,
    Deactivate,
    Resize { width: usize, height: usize },
}

/// What the host wires its native events to. The core never sees native event names.
pub trait InputAdapter {
    fn on_move(&mut self, x: f32, y: f32);
    fn on_activate(&mut self);
    fn on_deactivate(&mut self);
    fn on_resize(&mut self, width: usize, height: usize);

    /// Primary press lights the fire, secondary press puts it out.
    fn on_press(&mut self, button: PointerButton) {
        match button {
            PointerButton::Primary => self.on_activate(),
            PointerButton::Secondary => self.on_deactivate(),
        }
    }

    fn on_touch_start(&mut self, x: f32, y: f32) {
        self.on_activate();
        self.on_move(x, y);
    }

    fn on_touch_end(&mut self) {
        self.on_deactivate();
    }
}

/// Sending half handed to the host. Events sent after the driver is gone are dropped.
#[derive(Clone)]
pub struct InputQueue {
    tx: Sender<InputEvent>,
}

impl InputQueue {
    fn send(&self, ev: InputEvent) {
        let _ = self.tx.send(ev);
    }
}

impl InputAdapter for InputQueue {
    fn on_move(&mut self, x: f32, y: f32) {
        self.send(InputEvent::Move { x, y });
    }
    fn on_activate(&mut self) {
        self.send(InputEvent::Activate);
    }
    fn on_deactivate(&mut self) {
        self.send(InputEvent::Deactivate);
    }
    fn on_resize(&mut self, width: usize, height: usize) {
        self.send(InputEvent::Resize { width, height });
    }
}

pub fn input_channel() -> (InputQueue, Receiver<InputEvent>) {
    let (tx, rx) = mpsc::channel();
    (InputQueue { tx }, rx)
}

/// Something worth reacting to beyond storing the new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Began,   // Idle -> Active
    Ended,   // Active -> Idle
    Resized, // viewport changed
}

/// Driver-owned snapshot of the pointer. Last write wins.
#[derive(Clone, Debug)]
pub struct InputState {
    pointer: Vector2<f32>,  // screen space, [0,1]², origin top-left
    activation: f32,        // 0.0 idle, 1.0 active; kept as a float
    previous: Vector2<f32>, // physics-space position at the last velocity update
    velocity: Vector2<f32>, // physics space, per frame
    viewport: (usize, usize),
}

impl InputState {
    /// Pointer starts at the centre of the viewport.
    pub fn new(start_active: bool, width: usize, height: usize) -> Self {
        let centre = vec2(0.5, 0.5);
        Self {
            pointer: centre,
            activation: if start_active { 1.0 } else { 0.0 },
            previous: centre,
            velocity: vec2(0.0, 0.0),
            viewport: (width.max(1), height.max(1)),
        }
    }

    pub fn apply(&mut self, ev: InputEvent) -> Option<Transition> {
        match ev {
            InputEvent::Move { x, y } => {
                // out-of-viewport coordinates are pinned to the edge
                self.pointer = vec2(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
                None
            }
            InputEvent::Activate => self.set_activation(1.0),
            InputEvent::Deactivate => self.set_activation(0.0),
            InputEvent::Resize { width, height } => {
                let next = (width.max(1), height.max(1));
                if next == self.viewport {
                    return None;
                }
                self.viewport = next;
                Some(Transition::Resized)
            }
        }
    }

    /// Drain everything the host queued since the last frame.
    pub fn drain(&mut self, rx: &Receiver<InputEvent>) -> Vec<Transition> {
        rx.try_iter().filter_map(|ev| self.apply(ev)).collect()
    }

    fn set_activation(&mut self, level: f32) -> Option<Transition> {
        let was_active = self.is_active();
        self.activation = level.clamp(0.0, 1.0);
        match (was_active, self.is_active()) {
            (false, true) => Some(Transition::Began),
            (true, false) => Some(Transition::Ended),
            _ => None,
        }
    }

    /// Once per rendered frame: velocity = now - last frame, no smoothing.
    pub fn update_velocity(&mut self) {
        let now = self.physics_pointer();
        self.velocity = now - self.previous;
        self.previous = now;
    }

    pub fn pointer(&self) -> Vector2<f32> {
        self.pointer
    }

    /// Pointer in uv space (origin bottom-left).
    pub fn physics_pointer(&self) -> Vector2<f32> {
        vec2(self.pointer.x, 1.0 - self.pointer.y)
    }

    pub fn activation(&self) -> f32 {
        self.activation
    }

    pub fn is_active(&self) -> bool {
        self.activation > 0.0
    }

    pub fn velocity(&self) -> Vector2<f32> {
        self.velocity
    }

    pub fn viewport(&self) -> (usize, usize) {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn press_and_touch_drive_activation() {
        let (mut q, rx) = input_channel();
        let mut state = InputState::new(false, 800, 600);
        assert!(!state.is_active());

        q.on_press(PointerButton::Primary);
        assert_eq!(state.drain(&rx), vec![Transition::Began]);
        assert_eq!(state.activation(), 1.0);

        // pressing again is not a new transition
        q.on_press(PointerButton::Primary);
        assert!(state.drain(&rx).is_empty());

        q.on_press(PointerButton::Secondary);
        assert_eq!(state.drain(&rx), vec![Transition::Ended]);

        q.on_touch_start(0.25, 0.75);
        assert_eq!(state.drain(&rx), vec![Transition::Began]);
        assert_abs_diff_eq!(state.pointer().x, 0.25);
        assert_abs_diff_eq!(state.pointer().y, 0.75);

        q.on_touch_end();
        assert_eq!(state.drain(&rx), vec![Transition::Ended]);
        assert!(!state.is_active());
    }

    #[test]
    fn moves_update_position_regardless_of_activation() {
        let mut state = InputState::new(false, 100, 100);
        state.apply(InputEvent::Move { x: 0.1, y: 0.9 });
        assert_abs_diff_eq!(state.pointer().x, 0.1);
        let p = state.physics_pointer();
        assert_abs_diff_eq!(p.y, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn positions_are_pinned_into_the_viewport() {
        let mut state = InputState::new(true, 100, 100);
        state.apply(InputEvent::Move { x: -0.4, y: 1.7 });
        assert_eq!(state.pointer(), vec2(0.0, 1.0));
    }

    #[test]
    fn velocity_is_the_per_frame_delta() {
        let mut state = InputState::new(true, 100, 100);
        state.apply(InputEvent::Move { x: 0.2, y: 0.5 });
        state.update_velocity();
        state.apply(InputEvent::Move { x: 0.8, y: 0.5 });
        state.update_velocity();
        assert_abs_diff_eq!(state.velocity().x, 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(state.velocity().y, 0.0, epsilon = 1e-6);

        // no motion, no velocity; nothing decays slowly
        state.update_velocity();
        assert_eq!(state.velocity(), vec2(0.0, 0.0));
    }

    #[test]
    fn only_the_last_move_before_a_frame_counts() {
        let (mut q, rx) = input_channel();
        let mut state = InputState::new(true, 100, 100);
        state.update_velocity();
        for x in [0.9, 0.1, 0.7, 0.6] {
            q.on_move(x, 0.5);
        }
        state.drain(&rx);
        state.update_velocity();
        assert_abs_diff_eq!(state.velocity().x, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn screen_down_is_physics_down() {
        let mut state = InputState::new(true, 100, 100);
        state.apply(InputEvent::Move { x: 0.5, y: 0.2 });
        state.update_velocity();
        state.apply(InputEvent::Move { x: 0.5, y: 0.6 });
        state.update_velocity();
        assert_abs_diff_eq!(state.velocity().y, -0.4, epsilon = 1e-6);
    }

    #[test]
    fn resize_changes_aspect_once() {
        let mut state = InputState::new(true, 800, 800);
        assert_abs_diff_eq!(state.aspect(), 1.0);
        let wide = InputEvent::Resize { width: 1600, height: 800 };
        assert_eq!(state.apply(wide), Some(Transition::Resized));
        assert_eq!(state.apply(wide), None);
        assert_abs_diff_eq!(state.aspect(), 2.0);
        // zero-height windows (minimised) never divide by zero
        state.apply(InputEvent::Resize { width: 10, height: 0 });
        assert!(state.aspect().is_finite());
    }
}
