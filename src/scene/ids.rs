//! Internally assigned identifiers for scene entities.

/// Identifies a [`Mesh`](crate::geometry::Mesh) in the geometry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Identifies a [`Material`](super::Material) owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Identifies an [`Instance`](super::Instance) owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

impl MaterialId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl InstanceId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
