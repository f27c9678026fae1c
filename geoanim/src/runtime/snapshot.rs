use super::Bone;
use crate::TransformGroup;
use glam::Vec3;

/// Last-applied transform of one bone plus the bookkeeping that times its relaxation
/// back to the bind pose.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneSnapshot {
    pub rotation: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
    in_progress: [bool; 3],
    last_stopped: [f64; 3],
}

impl BoneSnapshot {
    pub fn new(rotation: Vec3, position: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            position,
            scale,
            in_progress: [true; 3],
            last_stopped: [0.0; 3],
        }
    }

    /// Seeded from the bone's bind pose.
    pub fn from_bone(bone: &Bone) -> Self {
        Self::new(bone.bind_rotation(), bone.bind_position(), bone.bind_scale())
    }

    pub fn get(&self, group: TransformGroup) -> Vec3 {
        match group {
            TransformGroup::Rotation => self.rotation,
            TransformGroup::Position => self.position,
            TransformGroup::Scale => self.scale,
        }
    }

    pub fn set(&mut self, group: TransformGroup, value: Vec3) {
        match group {
            TransformGroup::Rotation => self.rotation = value,
            TransformGroup::Position => self.position = value,
            TransformGroup::Scale => self.scale = value,
        }
    }

    pub fn is_in_progress(&self, group: TransformGroup) -> bool {
        self.in_progress[group.index()]
    }

    /// Tick at which an animation last stopped driving `group`.
    pub fn last_stopped(&self, group: TransformGroup) -> f64 {
        self.last_stopped[group.index()]
    }

    pub(crate) fn start(&mut self, group: TransformGroup) {
        self.in_progress[group.index()] = true;
    }

    pub(crate) fn stop(&mut self, group: TransformGroup, tick: f64) {
        self.in_progress[group.index()] = false;
        self.last_stopped[group.index()] = tick;
    }
}
