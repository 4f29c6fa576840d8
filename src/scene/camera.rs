use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

/// Viewer camera: a position, a view direction and an up vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    /// A zero `direction` is replaced by -Z.
    pub fn new(position: Point3<f32>, direction: Vector3<f32>) -> Self {
        let direction = if direction.magnitude2() > f32::EPSILON {
            direction.normalize()
        } else {
            -Vector3::unit_z()
        };
        Self {
            position,
            direction,
            up: Vector3::unit_y(),
        }
    }

    /// Right-handed look-at from the camera position along its direction.
    pub fn view_matrix(&self, world_up: Vector3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.direction, world_up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 2.0, 8.0), Vector3::new(0.0, 0.0, -1.0))
    }
}

/// Periodic camera path used while camera animation is enabled.
///
/// The camera circles `centre` at `radius`, `height` above it, looking at the
/// point `look_height` above the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraAnimation {
    pub centre: Point3<f32>,
    pub radius: f32,
    pub height: f32,
    pub look_height: f32,
    /// Radians per second.
    pub angular_speed: f32,
}

impl Default for CameraAnimation {
    fn default() -> Self {
        Self {
            centre: Point3::origin(),
            radius: 8.0,
            height: 3.0,
            look_height: 1.0,
            angular_speed: 0.25,
        }
    }
}

impl CameraAnimation {
    /// Camera pose at `time_seconds` along the path.
    pub fn pose_at(&self, time_seconds: f32, up: Vector3<f32>) -> (Point3<f32>, Vector3<f32>) {
        let angle = time_seconds * self.angular_speed;
        let position = self.centre
            + Vector3::new(
                self.radius * angle.cos(),
                self.height,
                self.radius * angle.sin(),
            );
        let target = self.centre + up * self.look_height;

        let to_target = target - position;
        let direction = if to_target.magnitude2() > f32::EPSILON {
            to_target.normalize()
        } else {
            -Vector3::unit_z()
        };

        (position, direction)
    }

    /// Time for one full revolution, or `None` for a stationary path.
    pub fn period(&self) -> Option<f32> {
        if self.angular_speed == 0.0 {
            None
        } else {
            Some(std::f32::consts::TAU / self.angular_speed.abs())
        }
    }
}
