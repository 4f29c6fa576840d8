//! Scene construction from OBJ/MTL files and a built-in demo scene.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use super::{Material, MaterialId, MeshId, SceneBuilder};
use crate::{
    config::SceneConfig,
    error::SceneError,
    geometry::{primitives, Mesh, MeshCollection},
    scene::Context,
};

/// A scene model together with the geometry its instances refer to.
pub struct SceneAsset {
    pub context: Context,
    pub geometry: MeshCollection,
}

/// Loads an OBJ file (and its MTL library, if any) as a scene.
///
/// Every OBJ model becomes one mesh placed once with an identity transform.
/// Models without normals get smooth vertex normals; models without texture
/// coordinates get zeroes. Lights and camera come from `config`.
pub fn load_obj_scene(path: impl AsRef<Path>, config: &SceneConfig) -> Result<SceneAsset, SceneError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| SceneError::Obj {
        path: display.clone(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No usable MTL library for '{display}' ({err}); using default materials");
        Vec::new()
    });

    if models.is_empty() {
        return Err(SceneError::Empty(display));
    }

    let mut builder = SceneBuilder::from_config(config);
    for mtl in &materials {
        builder.push_material(convert_material(mtl));
    }

    let mut default_material: Option<MaterialId> = None;
    let mut geometry = MeshCollection::default();

    for (index, model) in models.iter().enumerate() {
        let mesh_id = MeshId(index as u32);
        geometry.push(convert_mesh(mesh_id, &model.mesh)?);

        let material_id = match model.mesh.material_id {
            Some(id) if id < materials.len() => MaterialId(id as u32),
            _ => *default_material
                .get_or_insert_with(|| builder.push_material(Material::fallback(MaterialId(0)))),
        };
        builder.add_instance(mesh_id, material_id, Matrix4::identity());
    }

    let context = builder.build(&geometry)?;
    let stats = context.statistics();
    log::info!(
        "Loaded '{}': {} meshes, {} materials, {} instances",
        display,
        geometry.len(),
        stats.material_count,
        stats.instance_count
    );

    Ok(SceneAsset { context, geometry })
}

fn convert_material(mtl: &tobj::Material) -> Material {
    let fallback = Material::fallback(MaterialId(0));
    let vector = |value: Option<[f32; 3]>, default: Vector3<f32>| {
        value.map(Vector3::from).unwrap_or(default)
    };

    let mut material = Material::new(
        MaterialId(0),
        vector(mtl.ambient, fallback.ambient_colour),
        vector(mtl.diffuse, fallback.diffuse_colour),
        vector(mtl.specular, fallback.specular_colour),
        mtl.shininess.unwrap_or(fallback.shininess),
    );
    if let Some(texture) = &mtl.diffuse_texture {
        material = material.with_diffuse_texture(texture.as_str());
    }
    if let Some(texture) = &mtl.specular_texture {
        material = material.with_specular_texture(texture.as_str());
    }
    material
}

fn convert_mesh(id: MeshId, mesh: &tobj::Mesh) -> Result<Mesh, SceneError> {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        Mesh::calculate_vertex_normals(&positions, &mesh.indices)
    };

    let texcoords = if mesh.texcoords.len() / 2 == positions.len() {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect()
    } else {
        vec![[0.0, 0.0]; positions.len()]
    };

    Mesh::new(id, positions, normals, texcoords, mesh.indices.clone())
}

/// A small procedural scene used when no OBJ file is configured.
pub fn demo_scene(config: &SceneConfig) -> SceneAsset {
    let floor_id = MeshId(0);
    let cube_id = MeshId(1);
    let geometry = MeshCollection::new(vec![
        primitives::plane(floor_id, 20.0, 20.0, 4, 4, 4.0),
        primitives::cube(cube_id),
    ]);

    let mut builder = SceneBuilder::from_config(config);
    let floor = builder.add_material(|m| {
        m.diffuse_colour = Vector3::new(0.6, 0.6, 0.55);
        m.ambient_colour = Vector3::new(0.3, 0.3, 0.3);
    });
    let shiny = builder.add_material(|m| {
        m.diffuse_colour = Vector3::new(0.8, 0.2, 0.2);
        m.specular_colour = Vector3::new(1.0, 1.0, 1.0);
        m.shininess = 64.0;
    });
    let matte = builder.add_material(|m| m.diffuse_colour = Vector3::new(0.2, 0.4, 0.8));

    builder.add_instance(floor_id, floor, Matrix4::identity());
    for (i, x) in [-4.0f32, 0.0, 4.0].into_iter().enumerate() {
        let material = if i % 2 == 0 { shiny } else { matte };
        let transform = Matrix4::from_translation(Vector3::new(x, 1.0, 0.0)) * Matrix4::from_scale(2.0);
        builder.add_instance(cube_id, material, transform);
    }

    match builder.build(&geometry) {
        Ok(context) => SceneAsset { context, geometry },
        Err(err) => unreachable!("demo scene references only its own meshes: {err}"),
    }
}
