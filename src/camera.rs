//! # Camera Module
//!
//! The observer: an explicit state value (position, yaw, pitch) passed by
//! reference wherever the pipeline needs it — required-set computation and
//! the draw step — plus the projection and a controller that folds
//! keyboard and mouse input into per-frame movement. There is no global
//! camera state.

use cgmath::{perspective, InnerSpace, Matrix4, Point3, Rad, Vector3};
use std::f32::consts::FRAC_PI_2;
use web_time::Duration;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Transformation from OpenGL clip space (z in [-1, 1]) to WGPU clip
/// space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch limit just shy of straight up/down to avoid gimbal lock.
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Movement speed steps in units per second, cycled with the speed key.
const SPEED_LEVELS: [f32; 3] = [10.0, 50.0, 200.0];

/// Mouse look sensitivity multiplier.
const MOUSE_SENSITIVITY: f32 = 0.1;

/// First-person observer state.
#[derive(Debug)]
pub struct Camera {
    /// World-space position.
    pub position: Point3<f32>,
    /// Horizontal rotation around Y, radians.
    pub yaw: Rad<f32>,
    /// Vertical rotation, radians, clamped short of ±π/2.
    pub pitch: Rad<f32>,
}

impl Camera {
    /// Creates a camera at `position` with the given orientation.
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Camera {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// The normalized view direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize()
    }

    /// The view matrix for the current state.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

/// Perspective projection parameters.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    /// Creates a projection for the given viewport.
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Projection {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Updates the aspect ratio after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// The projection matrix, corrected for WGPU's depth range.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Folds raw input events into camera movement.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    speed_index: usize,
}

impl CameraController {
    /// Creates a controller at the slowest speed level.
    pub fn new() -> Self {
        CameraController {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            speed_index: 0,
        }
    }

    /// Applies a keyboard event. Returns `true` if the key is one the
    /// controller handles.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.amount_right = amount;
                true
            }
            KeyCode::Space => {
                self.amount_up = amount;
                true
            }
            KeyCode::ShiftLeft => {
                self.amount_down = amount;
                true
            }
            KeyCode::Equal => {
                if state == ElementState::Pressed {
                    self.speed_index = (self.speed_index + 1) % SPEED_LEVELS.len();
                }
                true
            }
            _ => false,
        }
    }

    /// Accumulates a raw mouse motion delta.
    pub fn process_mouse(&mut self, delta_x: f64, delta_y: f64) {
        self.rotate_horizontal += delta_x as f32;
        self.rotate_vertical += delta_y as f32;
    }

    /// Advances the camera by one frame of accumulated input.
    ///
    /// Forward/strafe movement is horizontal (the pitch does not tilt the
    /// walk direction); vertical movement is its own axis.
    pub fn update_camera(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();
        let speed = SPEED_LEVELS[self.speed_index];

        let (yaw_sin, yaw_cos) = camera.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        camera.position += forward * (self.amount_forward - self.amount_backward) * speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * speed * dt;
        camera.position.y += (self.amount_up - self.amount_down) * speed * dt;

        camera.yaw += Rad(self.rotate_horizontal.to_radians() * MOUSE_SENSITIVITY);
        camera.pitch += Rad(-self.rotate_vertical.to_radians() * MOUSE_SENSITIVITY);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        if camera.pitch < -Rad(SAFE_FRAC_PI_2) {
            camera.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if camera.pitch > Rad(SAFE_FRAC_PI_2) {
            camera.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    #[test]
    fn forward_motion_stays_horizontal() {
        let mut camera = Camera::new(Point3::new(0.0, 100.0, 0.0), Deg(-90.0), Deg(-45.0));
        let mut controller = CameraController::new();
        controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed);

        controller.update_camera(&mut camera, Duration::from_secs(1));

        // Walking never changes altitude, even while looking down.
        assert_eq!(camera.position.y, 100.0);
        assert!(camera.position.z < 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut controller = CameraController::new();
        controller.process_mouse(0.0, -100_000.0);

        controller.update_camera(&mut camera, Duration::from_millis(16));

        assert!(camera.pitch.0 <= SAFE_FRAC_PI_2);
    }

    #[test]
    fn speed_key_cycles_levels() {
        let mut controller = CameraController::new();
        assert_eq!(controller.speed_index, 0);
        for expected in [1, 2, 0] {
            controller.process_keyboard(KeyCode::Equal, ElementState::Pressed);
            controller.process_keyboard(KeyCode::Equal, ElementState::Released);
            assert_eq!(controller.speed_index, expected);
        }
    }
}
