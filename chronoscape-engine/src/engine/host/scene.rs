//! Retained scene arena shared between the renderers and the draw target.
//!
//! Renderers own their nodes and address them by [`NodeId`]. Removal queues
//! the id so the draw target can free whatever it uploaded for it.

use bevy::color::LinearRgba;
use bevy::math::{Ray3d, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl NodeId {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub color: LinearRgba,
    pub opacity: f32,
    pub additive: bool,
    pub depth_write: bool,
    pub draw_order: i32,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            opacity: 1.0,
            additive: false,
            depth_write: true,
            draw_order: 0,
        }
    }
}

impl SurfaceMaterial {
    /// Additive, translucent, no depth write.
    pub fn glow(color: LinearRgba, opacity: f32, draw_order: i32) -> Self {
        Self {
            color,
            opacity,
            additive: true,
            depth_write: false,
            draw_order,
        }
    }
}

/// Many copies of one sphere, one slot per instance.
///
/// `transforms` holds `x, y, z, scale` per slot and `colors` holds linear
/// `r, g, b`. Only the first `count` slots are drawn or picked.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancedBatch {
    pub transforms: Vec<f32>,
    pub colors: Vec<f32>,
    count: usize,
    geometry_radius: f32,
}

impl InstancedBatch {
    pub const TRANSFORM_STRIDE: usize = 4;
    pub const COLOR_STRIDE: usize = 3;

    pub fn new(capacity: usize, geometry_radius: f32) -> Self {
        Self {
            transforms: vec![0.0; capacity * Self::TRANSFORM_STRIDE],
            colors: vec![0.0; capacity * Self::COLOR_STRIDE],
            count: capacity,
            geometry_radius,
        }
    }

    pub fn capacity(&self) -> usize {
        self.transforms.len() / Self::TRANSFORM_STRIDE
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn set_count(&mut self, count: usize) {
        self.count = count.min(self.capacity());
    }

    pub fn geometry_radius(&self) -> f32 {
        self.geometry_radius
    }

    pub fn set_instance(&mut self, index: usize, position: Vec3, scale: f32) {
        let offset = index * Self::TRANSFORM_STRIDE;
        self.transforms[offset..offset + Self::TRANSFORM_STRIDE]
            .copy_from_slice(&[position.x, position.y, position.z, scale]);
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let offset = index * Self::TRANSFORM_STRIDE;
        Vec3::from_slice(&self.transforms[offset..offset + 3])
    }

    pub fn scale(&self, index: usize) -> f32 {
        self.transforms[index * Self::TRANSFORM_STRIDE + 3]
    }

    pub fn set_color(&mut self, index: usize, color: LinearRgba) {
        let offset = index * Self::COLOR_STRIDE;
        self.colors[offset..offset + Self::COLOR_STRIDE]
            .copy_from_slice(&[color.red, color.green, color.blue]);
    }

    pub fn color(&self, index: usize) -> LinearRgba {
        let offset = index * Self::COLOR_STRIDE;
        LinearRgba::rgb(
            self.colors[offset],
            self.colors[offset + 1],
            self.colors[offset + 2],
        )
    }

    /// Nearest active instance hit by `ray`, with its ray distance.
    pub fn pick(&self, ray: &Ray3d) -> Option<(usize, f32)> {
        let direction = ray.direction.as_vec3();
        (0..self.count)
            .filter_map(|index| {
                let radius = self.geometry_radius * self.scale(index);
                ray_sphere_hit_t(ray.origin, direction, self.position(index), radius)
                    .map(|distance| (index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

// Ray-sphere intersection for a unit direction, returns the nearest t >= 0
pub fn ray_sphere_hit_t(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + root;
    (far >= 0.0).then_some(far)
}

/// Indexed triangle mesh, typically a tube swept along a curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Open line strip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Instances(InstancedBatch),
    Tube(TubeMesh),
    Line(Polyline),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub label: String,
    pub kind: NodeKind,
    pub material: SurfaceMaterial,
    revision: u64,
}

impl SceneNode {
    pub fn new(label: impl Into<String>, kind: NodeKind, material: SurfaceMaterial) -> Self {
        Self {
            label: label.into(),
            kind,
            material,
            revision: 0,
        }
    }

    /// Bumped on every mutable access through the arena.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn instances(&self) -> Option<&InstancedBatch> {
        match &self.kind {
            NodeKind::Instances(batch) => Some(batch),
            _ => None,
        }
    }

    pub fn instances_mut(&mut self) -> Option<&mut InstancedBatch> {
        match &mut self.kind {
            NodeKind::Instances(batch) => Some(batch),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    released: Vec<NodeId>,
    live: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.node = Some(node);
            return NodeId {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            slot,
            generation: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    /// Mutable access; marks the node as changed for the draw target.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let node = self
            .slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())?;
        node.revision += 1;
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a node and queue its id for release by the draw target.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let entry = self.slots.get_mut(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.released.push(id);
        self.live -= 1;
        Some(node)
    }

    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.node.as_ref().map(|node| {
                (
                    NodeId {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    node,
                )
            })
        })
    }

    pub fn drain_released(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.released)
    }

    pub fn pending_releases(&self) -> usize {
        self.released.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Dir3;

    fn line(label: &str) -> SceneNode {
        SceneNode::new(
            label,
            NodeKind::Line(Polyline::default()),
            SurfaceMaterial::default(),
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let mut scene = Scene::new();
        let a = scene.insert(line("a"));
        let b = scene.insert(line("b"));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(a).map(|n| n.label.as_str()), Some("a"));

        assert!(scene.remove(a).is_some());
        assert!(scene.remove(a).is_none());
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
        assert_eq!(scene.drain_released(), vec![a]);
        assert!(scene.drain_released().is_empty());
    }

    #[test]
    fn test_stale_id_after_slot_reuse() {
        let mut scene = Scene::new();
        let old = scene.insert(line("old"));
        scene.remove(old);
        let new = scene.insert(line("new"));

        assert_eq!(old.slot(), new.slot());
        assert_ne!(old, new);
        assert!(scene.get(old).is_none());
        assert_eq!(scene.get(new).map(|n| n.label.as_str()), Some("new"));
    }

    #[test]
    fn test_get_mut_bumps_revision() {
        let mut scene = Scene::new();
        let id = scene.insert(line("a"));
        assert_eq!(scene.get(id).map(SceneNode::revision), Some(0));
        scene.get_mut(id);
        scene.get_mut(id);
        assert_eq!(scene.get(id).map(SceneNode::revision), Some(2));
    }

    #[test]
    fn test_clear_queues_everything() {
        let mut scene = Scene::new();
        for label in ["a", "b", "c"] {
            scene.insert(line(label));
        }
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.pending_releases(), 3);
    }

    #[test]
    fn test_batch_count_clamps_to_capacity() {
        let mut batch = InstancedBatch::new(3, 1.0);
        assert_eq!(batch.count(), 3);
        batch.set_count(10);
        assert_eq!(batch.count(), 3);
        batch.set_count(1);
        assert_eq!(batch.count(), 1);
    }

    #[test]
    fn test_pick_nearest_active_instance() {
        let mut batch = InstancedBatch::new(3, 1.0);
        batch.set_instance(0, Vec3::new(0.0, 0.0, -10.0), 1.0);
        batch.set_instance(1, Vec3::new(0.0, 0.0, -5.0), 1.0);
        batch.set_instance(2, Vec3::new(0.0, 0.0, -2.0), 0.5);

        let ray = Ray3d::new(Vec3::ZERO, Dir3::NEG_Z);
        let (index, distance) = batch.pick(&ray).unwrap();
        assert_eq!(index, 2);
        assert!((distance - 1.5).abs() < 1e-5);

        batch.set_count(2);
        assert_eq!(batch.pick(&ray).map(|hit| hit.0), Some(1));

        let miss = Ray3d::new(Vec3::new(5.0, 0.0, 0.0), Dir3::NEG_Z);
        assert!(batch.pick(&miss).is_none());
    }

    #[test]
    fn test_sphere_behind_origin_misses() {
        assert!(ray_sphere_hit_t(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 5.0), 1.0).is_none());
        // Origin inside the sphere hits the far side.
        assert_eq!(ray_sphere_hit_t(Vec3::ZERO, Vec3::NEG_Z, Vec3::ZERO, 2.0), Some(2.0));
    }
}
