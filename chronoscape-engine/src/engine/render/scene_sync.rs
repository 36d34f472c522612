//! Default draw: mirrors the host's retained scene into Bevy entities.
//!
//! Each scene node maps to one entity. Instanced batches ride the custom
//! star pipeline, tubes and polylines use unlit additive `StandardMaterial`s.
//! Nodes are only re-uploaded when their revision moves.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::bloom::{Bloom, BloomPrefilter};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{
    BLOOM_INTENSITY_SCALE, STAR_GEOMETRY_RADIUS, STAR_GEOMETRY_SUBDIVISIONS,
};

use crate::engine::camera::orbit_camera::GalaxyCamera;
use crate::engine::host::{
    BloomSettings, DrawTarget, HostCamera, InstancedBatch, NodeId, NodeKind, Polyline, Scene,
    SceneNode, SurfaceMaterial, SurfaceSize, TubeMesh,
};
use crate::engine::render::instanced_render_plugin::{StarInstance, StarInstances};

struct MirroredNode {
    entity: Entity,
    revision: u64,
    mesh: Option<Handle<Mesh>>,
    material: Option<Handle<StandardMaterial>>,
}

/// Bookkeeping for everything uploaded on behalf of the scene arena.
#[derive(Resource, Default)]
pub struct SceneMirror {
    nodes: HashMap<NodeId, MirroredNode>,
    star_mesh: Option<Handle<Mesh>>,
    bloom_requested: Option<BloomSettings>,
    bloom_applied: Option<BloomSettings>,
}

impl SceneMirror {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entity(&self, node: NodeId) -> Option<Entity> {
        self.nodes.get(&node).map(|mirrored| mirrored.entity)
    }

    pub fn bloom(&self) -> Option<BloomSettings> {
        self.bloom_applied
    }
}

/// [`DrawTarget`] backed by the Bevy world.
#[derive(SystemParam)]
pub struct BevyDrawTarget<'w, 's> {
    commands: Commands<'w, 's>,
    mirror: ResMut<'w, SceneMirror>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    cameras: Query<
        'w,
        's,
        (Entity, &'static mut Transform, &'static mut Projection),
        With<GalaxyCamera>,
    >,
}

impl BevyDrawTarget<'_, '_> {
    fn sync_camera(&mut self, camera: &HostCamera) {
        let Ok((_, mut transform, mut projection)) = self.cameras.single_mut() else {
            return;
        };

        let wanted = Transform::from_translation(camera.position).looking_at(camera.target, camera.up);
        transform.set_if_neq(wanted);

        if let Projection::Perspective(perspective) = projection.as_mut() {
            let fov = camera.fov_degrees.to_radians();
            if perspective.fov != fov || perspective.near != camera.near || perspective.far != camera.far
            {
                perspective.fov = fov;
                perspective.near = camera.near;
                perspective.far = camera.far;
            }
        }
    }

    fn star_mesh(&mut self) -> Handle<Mesh> {
        if let Some(handle) = &self.mirror.star_mesh {
            return handle.clone();
        }
        let handle = self.meshes.add(star_mesh());
        self.mirror.star_mesh = Some(handle.clone());
        handle
    }

    fn upsert(&mut self, id: NodeId, node: &SceneNode) {
        if let Some(mirrored) = self.mirror.nodes.get(&id) {
            if mirrored.revision == node.revision() {
                return;
            }
        }

        match &node.kind {
            NodeKind::Instances(batch) => self.upsert_instances(id, node, batch),
            NodeKind::Tube(tube) => self.upsert_mesh(id, node, tube_to_mesh(tube)),
            NodeKind::Line(line) => self.upsert_mesh(id, node, polyline_to_mesh(line)),
        }
    }

    fn upsert_instances(&mut self, id: NodeId, node: &SceneNode, batch: &InstancedBatch) {
        let instances = StarInstances(star_instances(batch, node.material.opacity));

        if let Some(mirrored) = self.mirror.nodes.get_mut(&id) {
            mirrored.revision = node.revision();
            self.commands.entity(mirrored.entity).insert(instances);
            return;
        }

        let mesh = self.star_mesh();
        let entity = self
            .commands
            .spawn((
                Name::new(node.label.clone()),
                Mesh3d(mesh),
                Transform::IDENTITY,
                instances,
                // Instances are scattered across the scene, the carrier's bounds are meaningless
                NoFrustumCulling,
            ))
            .id();
        debug!("Mirrored instanced node '{}' as {entity}", node.label);
        self.mirror.nodes.insert(
            id,
            MirroredNode {
                entity,
                revision: node.revision(),
                mesh: None,
                material: None,
            },
        );
    }

    fn upsert_mesh(&mut self, id: NodeId, node: &SceneNode, mesh: Mesh) {
        let material = standard_material(&node.material);

        if let Some(mirrored) = self.mirror.nodes.get_mut(&id) {
            mirrored.revision = node.revision();
            if let Some(existing) = mirrored.mesh.as_ref().and_then(|h| self.meshes.get_mut(h)) {
                *existing = mesh;
            }
            if let Some(existing) = mirrored
                .material
                .as_ref()
                .and_then(|h| self.materials.get_mut(h))
            {
                *existing = material;
            }
            return;
        }

        let mesh = self.meshes.add(mesh);
        let material = self.materials.add(material);
        let entity = self
            .commands
            .spawn((
                Name::new(node.label.clone()),
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
            ))
            .id();
        self.mirror.nodes.insert(
            id,
            MirroredNode {
                entity,
                revision: node.revision(),
                mesh: Some(mesh),
                material: Some(material),
            },
        );
    }
}

impl DrawTarget for BevyDrawTarget<'_, '_> {
    fn draw_scene(&mut self, scene: &Scene, camera: &HostCamera, _size: &SurfaceSize) {
        self.sync_camera(camera);
        for (id, node) in scene.iter() {
            self.upsert(id, node);
        }
    }

    fn release(&mut self, node: NodeId) {
        let Some(mirrored) = self.mirror.nodes.remove(&node) else {
            return;
        };
        self.commands.entity(mirrored.entity).despawn();
        if let Some(mesh) = mirrored.mesh {
            self.meshes.remove(&mesh);
        }
        if let Some(material) = mirrored.material {
            self.materials.remove(&material);
        }
    }

    fn apply_bloom(&mut self, settings: &BloomSettings) {
        self.mirror.bloom_requested = Some(*settings);
    }

    fn finish_frame(&mut self) {
        let requested = self.mirror.bloom_requested.take();
        if requested == self.mirror.bloom_applied {
            return;
        }
        let Ok((camera, _, _)) = self.cameras.single() else {
            return;
        };

        match requested {
            Some(settings) => {
                self.commands.entity(camera).insert(bevy_bloom(&settings));
            }
            None => {
                self.commands.entity(camera).remove::<Bloom>();
            }
        }
        self.mirror.bloom_applied = requested;
    }
}

/// Unit icosphere shared by every instanced batch.
pub fn star_mesh() -> Mesh {
    let sphere = Sphere::new(STAR_GEOMETRY_RADIUS);
    match sphere.mesh().ico(STAR_GEOMETRY_SUBDIVISIONS) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!("Icosphere unavailable ({err}), using a UV sphere");
            sphere.mesh().uv(16, 12)
        }
    }
}

/// Active slots of a batch as GPU instance records.
pub fn star_instances(batch: &InstancedBatch, opacity: f32) -> Vec<StarInstance> {
    (0..batch.count())
        .map(|index| {
            let position = batch.position(index);
            let color = batch.color(index);
            StarInstance {
                position_scale: [position.x, position.y, position.z, batch.scale(index)],
                color: [color.red, color.green, color.blue, opacity],
            }
        })
        .collect()
}

pub fn tube_to_mesh(tube: &TubeMesh) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, tube.positions.clone());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, tube.normals.clone());
    mesh.insert_indices(Indices::U32(tube.indices.clone()));
    mesh
}

pub fn polyline_to_mesh(line: &Polyline) -> Mesh {
    let positions: Vec<[f32; 3]> = line.points.iter().map(|p| p.to_array()).collect();
    let mut mesh = Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

pub fn standard_material(material: &SurfaceMaterial) -> StandardMaterial {
    let base_color = material.color.with_alpha(material.opacity);
    StandardMaterial {
        base_color: base_color.into(),
        alpha_mode: if material.additive {
            AlphaMode::Add
        } else if material.opacity < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        unlit: true,
        cull_mode: None,
        depth_bias: material.draw_order as f32,
        fog_enabled: true,
        ..default()
    }
}

pub fn bevy_bloom(settings: &BloomSettings) -> Bloom {
    Bloom {
        intensity: settings.intensity * BLOOM_INTENSITY_SCALE,
        prefilter: BloomPrefilter {
            threshold: settings.threshold,
            threshold_softness: settings.smoothing,
        },
        ..Bloom::NATURAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    #[test]
    fn test_star_instances_cover_active_slots_only() {
        let mut batch = InstancedBatch::new(4, 1.0);
        batch.set_instance(0, Vec3::new(1.0, 2.0, 3.0), 0.5);
        batch.set_color(0, LinearRgba::rgb(0.1, 0.2, 0.3));
        batch.set_count(2);

        let instances = star_instances(&batch, 0.95);

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].position_scale, [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(instances[0].color, [0.1, 0.2, 0.3, 0.95]);
    }

    #[test]
    fn test_tube_mesh_conversion_keeps_indices() {
        let tube = TubeMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        };
        let mesh = tube_to_mesh(&tube);

        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::TriangleList);
        assert_eq!(mesh.count_vertices(), 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(3));
    }

    #[test]
    fn test_polyline_becomes_line_strip() {
        let line = Polyline {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        };
        let mesh = polyline_to_mesh(&line);

        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineStrip);
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                assert_eq!(values[1], [1.0, 0.0, 0.0]);
            }
            other => panic!("unexpected positions: {other:?}"),
        }
    }

    #[test]
    fn test_glow_material_is_additive_and_unlit() {
        let material = standard_material(&SurfaceMaterial::glow(LinearRgba::RED, 0.2, 3));

        assert_eq!(material.alpha_mode, AlphaMode::Add);
        assert!(material.unlit);
        assert_eq!(material.depth_bias, 3.0);
        assert!((material.base_color.alpha() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_opaque_material_stays_opaque() {
        let material = standard_material(&SurfaceMaterial::default());
        assert_eq!(material.alpha_mode, AlphaMode::Opaque);
    }

    #[test]
    fn test_bloom_scales_intensity() {
        let bloom = bevy_bloom(&BloomSettings {
            intensity: 2.0,
            threshold: 0.1,
            smoothing: 0.5,
        });
        assert!((bloom.intensity - 2.0 * BLOOM_INTENSITY_SCALE).abs() < 1e-6);
        assert_eq!(bloom.prefilter.threshold, 0.1);
        assert_eq!(bloom.prefilter.threshold_softness, 0.5);
    }

    #[test]
    fn test_star_mesh_has_vertices() {
        assert!(star_mesh().count_vertices() > 0);
    }
}
