use cgmath::{Point3, Vector3};

/// Point light with a hard range cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub intensity: Vector3<f32>,
    pub range: f32,
}

impl Light {
    pub fn new(position: Point3<f32>, intensity: Vector3<f32>, range: f32) -> Self {
        Self {
            position,
            intensity,
            range,
        }
    }
}
