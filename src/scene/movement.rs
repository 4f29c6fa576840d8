use cgmath::{InnerSpace, Rad, Vector3};

use super::Camera;

const MAX_PITCH: Rad<f32> = Rad(89.0 * std::f32::consts::PI / 180.0);

/// First-person camera controller fed by the host application.
///
/// Input is only accumulated here; it is applied to the camera when the scene
/// model updates, so the camera never changes between two updates.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPersonMovement {
    /// Camera-local velocity in units per second: x right, y up, z forward.
    linear_velocity: Vector3<f32>,
    pending_yaw: f32,
    pending_pitch: f32,
}

impl Default for FirstPersonMovement {
    fn default() -> Self {
        Self {
            linear_velocity: Vector3::new(0.0, 0.0, 0.0),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }
}

impl FirstPersonMovement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3<f32>) {
        self.linear_velocity = velocity;
    }

    pub fn linear_velocity(&self) -> Vector3<f32> {
        self.linear_velocity
    }

    /// Queues a rotation; positive yaw turns right, positive pitch looks up.
    pub fn spin(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.pending_yaw += yaw.0;
        self.pending_pitch += pitch.0;
    }

    /// Drops queued rotation and stops movement.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_idle(&self) -> bool {
        self.pending_yaw == 0.0
            && self.pending_pitch == 0.0
            && self.linear_velocity.magnitude2() == 0.0
    }

    /// Applies queued rotation and `dt` seconds of movement to `camera`.
    pub fn apply(&mut self, camera: &mut Camera, world_up: Vector3<f32>, dt: f32) {
        if self.is_idle() {
            return;
        }

        if self.pending_yaw != 0.0 || self.pending_pitch != 0.0 {
            let direction = camera.direction.normalize();
            let current_pitch = direction.dot(world_up).clamp(-1.0, 1.0).asin();
            let pitch = (current_pitch + self.pending_pitch).clamp(-MAX_PITCH.0, MAX_PITCH.0);

            // Looking straight up or down leaves no heading; try the camera's
            // own up, then fixed world axes.
            let Some(flat) = [direction, camera.up, -Vector3::unit_z(), Vector3::unit_x()]
                .into_iter()
                .find_map(|v| horizontal(v, world_up))
            else {
                self.pending_yaw = 0.0;
                self.pending_pitch = 0.0;
                return;
            };
            let right = flat.cross(world_up).normalize();

            // Rotate the horizontal heading about the world up axis.
            let (sin_yaw, cos_yaw) = self.pending_yaw.sin_cos();
            let heading = flat * cos_yaw + right * sin_yaw;

            camera.direction = (heading * pitch.cos() + world_up * pitch.sin()).normalize();
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
        }

        if dt > 0.0 && self.linear_velocity.magnitude2() > 0.0 {
            let forward = camera.direction.normalize();
            let right = forward.cross(world_up).normalize();
            let up = right.cross(forward);
            let step = right * self.linear_velocity.x
                + up * self.linear_velocity.y
                + forward * self.linear_velocity.z;
            camera.position += step * dt;
        }
    }
}

/// `v` with its `world_up` component removed, normalized; `None` when parallel.
fn horizontal(v: Vector3<f32>, world_up: Vector3<f32>) -> Option<Vector3<f32>> {
    let flat = v - world_up * v.dot(world_up);
    (flat.magnitude2() > f32::EPSILON).then(|| flat.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn test_idle_movement_leaves_camera_untouched() {
        let mut camera = Camera::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.3, -0.2, -1.0));
        let before = camera;

        let mut movement = FirstPersonMovement::new();
        movement.apply(&mut camera, Vector3::unit_y(), 0.5);

        assert_eq!(camera, before);
    }

    #[test]
    fn test_forward_velocity_moves_along_direction() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let mut movement = FirstPersonMovement::new();
        movement.set_linear_velocity(Vector3::new(0.0, 0.0, 2.0));

        movement.apply(&mut camera, Vector3::unit_y(), 0.5);

        assert!((camera.position.z + 1.0).abs() < 1e-6);
        assert!(camera.position.x.abs() < 1e-6);
    }

    #[test]
    fn test_yaw_turns_right() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let mut movement = FirstPersonMovement::new();
        movement.spin(Rad(std::f32::consts::FRAC_PI_2), Rad(0.0));

        movement.apply(&mut camera, Vector3::unit_y(), 0.0);

        // Facing -Z, a quarter turn right faces +X.
        assert!((camera.direction - Vector3::unit_x()).magnitude() < 1e-5);
    }

    #[test]
    fn test_spin_while_looking_straight_up_stays_finite() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        let mut movement = FirstPersonMovement::new();
        movement.spin(Rad(0.1), Rad(0.0));

        movement.apply(&mut camera, Vector3::unit_y(), 0.0);

        let d = camera.direction;
        assert!(d.x.is_finite() && d.y.is_finite() && d.z.is_finite());
        assert!((d.magnitude() - 1.0).abs() < 1e-5);
        // Pitch is pulled back inside the clamp.
        assert!(d.dot(Vector3::unit_y()).asin() <= MAX_PITCH.0 + 1e-5);

        movement.set_linear_velocity(Vector3::new(1.0, 0.0, 1.0));
        movement.apply(&mut camera, Vector3::unit_y(), 1.0);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let mut movement = FirstPersonMovement::new();
        movement.spin(Rad(0.0), Rad(10.0));

        movement.apply(&mut camera, Vector3::unit_y(), 0.0);

        let pitch = camera.direction.dot(Vector3::unit_y()).asin();
        assert!(pitch <= MAX_PITCH.0 + 1e-5);
        assert!(pitch > 1.5);
    }
}
