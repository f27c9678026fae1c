use crate::{GeoBone, TransformGroup};
use glam::Vec3;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Bone {
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,

    bind_rotation: Vec3,
    bind_position: Vec3,
    bind_scale: Vec3,

    pub rotation: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
    pub tracking_matrices: bool,

    changed: [bool; 3],
}

impl Bone {
    fn from_geo(geo: &GeoBone, parent: Option<usize>) -> Self {
        Self {
            name: geo.name.clone(),
            parent,
            children: Vec::new(),
            bind_rotation: geo.rotation,
            bind_position: geo.position,
            bind_scale: geo.scale,
            rotation: geo.rotation,
            position: geo.position,
            scale: geo.scale,
            tracking_matrices: geo.tracking_matrices,
            changed: [false; 3],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn bind_rotation(&self) -> Vec3 {
        self.bind_rotation
    }

    pub fn bind_position(&self) -> Vec3 {
        self.bind_position
    }

    pub fn bind_scale(&self) -> Vec3 {
        self.bind_scale
    }

    pub fn bind(&self, group: TransformGroup) -> Vec3 {
        match group {
            TransformGroup::Rotation => self.bind_rotation,
            TransformGroup::Position => self.bind_position,
            TransformGroup::Scale => self.bind_scale,
        }
    }

    pub fn transform(&self, group: TransformGroup) -> Vec3 {
        match group {
            TransformGroup::Rotation => self.rotation,
            TransformGroup::Position => self.position,
            TransformGroup::Scale => self.scale,
        }
    }

    pub fn set_transform(&mut self, group: TransformGroup, value: Vec3) {
        match group {
            TransformGroup::Rotation => self.rotation = value,
            TransformGroup::Position => self.position = value,
            TransformGroup::Scale => self.scale = value,
        }
    }

    /// Whether an animation drove this group during the current tick.
    pub fn has_changed(&self, group: TransformGroup) -> bool {
        self.changed[group.index()]
    }

    pub(crate) fn mark_changed(&mut self, group: TransformGroup) {
        self.changed[group.index()] = true;
    }

    pub(crate) fn reset_changed(&mut self) {
        self.changed = [false; 3];
    }

    pub fn reset_to_bind(&mut self) {
        self.rotation = self.bind_rotation;
        self.position = self.bind_position;
        self.scale = self.bind_scale;
    }
}

/// Bone arena. Parent and child links are indices into `bones`; names map to indices.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    bone_index: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `geo` and its descendants into the arena.
    ///
    /// Registering a name that already exists replaces that bone's bind pose in place and
    /// keeps its index.
    pub fn register(&mut self, geo: &GeoBone, parent: Option<usize>) -> usize {
        let index = match self.bone_index.get(&geo.name) {
            Some(&index) => {
                let children = std::mem::take(&mut self.bones[index].children);
                self.detach(index);
                self.bones[index] = Bone {
                    children,
                    ..Bone::from_geo(geo, parent)
                };
                index
            }
            None => {
                let index = self.bones.len();
                self.bones.push(Bone::from_geo(geo, parent));
                self.bone_index.insert(geo.name.clone(), index);
                index
            }
        };
        match parent {
            Some(parent) => {
                if !self.bones[parent].children.contains(&index) {
                    self.bones[parent].children.push(index);
                }
            }
            None => {
                if !self.roots.contains(&index) {
                    self.roots.push(index);
                }
            }
        }
        for child in &geo.children {
            self.register(child, Some(index));
        }
        index
    }

    fn detach(&mut self, index: usize) {
        match self.bones[index].parent {
            Some(parent) => self.bones[parent].children.retain(|&c| c != index),
            None => self.roots.retain(|&r| r != index),
        }
    }

    pub fn clear(&mut self) {
        self.bones.clear();
        self.bone_index.clear();
        self.roots.clear();
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub(crate) fn bones_mut(&mut self) -> &mut [Bone] {
        &mut self.bones
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_index.get(name).copied()
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.find_bone(name).map(|index| &self.bones[index])
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        let index = self.find_bone(name)?;
        self.bones.get_mut(index)
    }

    /// Indices in depth-first order, parents before children.
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.bones[index].children.iter().rev().copied());
        }
        order
    }

    pub fn reset_to_bind(&mut self) {
        for bone in &mut self.bones {
            bone.reset_to_bind();
        }
    }
}
