use crate::{EasingType, Error};
use crate::expression::Expression;
use glam::Vec3;
use std::collections::HashMap;
use std::sync::Arc;

/// Name given to the generated animations standing in for wait stages.
pub const WAIT_ANIMATION_NAME: &str = "internal.wait";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TransformGroup {
    Rotation,
    Position,
    Scale,
}

impl TransformGroup {
    pub const ALL: [TransformGroup; 3] = [
        TransformGroup::Rotation,
        TransformGroup::Position,
        TransformGroup::Scale,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Rotation => 0,
            Self::Position => 1,
            Self::Scale => 2,
        }
    }
}

/// A bone as delivered by the model loader: bind pose plus owned children.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoBone {
    pub name: String,
    pub rotation: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tracking_matrices: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<GeoBone>,
}

impl GeoBone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotation: Vec3::ZERO,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            tracking_matrices: false,
            children: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_child(mut self, child: GeoBone) -> Self {
        self.children.push(child);
        self
    }
}

/// The top-level bones of a loaded model.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BakedGeoModel {
    pub bones: Vec<GeoBone>,
}

#[derive(Clone, Debug)]
pub struct Keyframe {
    pub time: f64,
    pub value: Expression,
    /// Easing for the segment that ends at this keyframe.
    pub easing: Option<EasingType>,
    pub easing_args: Vec<Expression>,
}

impl Keyframe {
    pub fn new(time: f64, value: impl Into<Expression>) -> Self {
        Self {
            time,
            value: value.into(),
            easing: None,
            easing_args: Vec::new(),
        }
    }

    pub fn with_easing(mut self, easing: EasingType) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_easing_arg(mut self, arg: impl Into<Expression>) -> Self {
        self.easing_args.push(arg.into());
        self
    }
}

/// Time-ordered keyframes for one axis of one transform group.
#[derive(Clone, Debug, Default)]
pub struct KeyframeCurve {
    keyframes: Vec<Keyframe>,
}

impl KeyframeCurve {
    pub fn new(mut keyframes: Vec<Keyframe>) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keyframes }
    }

    /// Like [`KeyframeCurve::new`], but rejects keyframes placed at a non-finite or
    /// negative tick.
    pub fn try_new(keyframes: Vec<Keyframe>) -> Result<Self, Error> {
        if let Some(bad) = keyframes
            .iter()
            .find(|k| !k.time.is_finite() || k.time < 0.0)
        {
            return Err(Error::InvalidValue {
                message: format!("keyframe time {} is out of range", bad.time),
            });
        }
        Ok(Self::new(keyframes))
    }

    /// Builds a curve of constant keyframes from `(time, value)` pairs.
    pub fn linear(points: &[(f64, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(time, value)| Keyframe::new(time, value))
                .collect(),
        )
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn end_time(&self) -> f64 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyframeStack {
    pub x: KeyframeCurve,
    pub y: KeyframeCurve,
    pub z: KeyframeCurve,
}

impl KeyframeStack {
    pub fn new(x: KeyframeCurve, y: KeyframeCurve, z: KeyframeCurve) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> &KeyframeCurve {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct BoneAnimation {
    pub bone_name: String,
    pub rotation: KeyframeStack,
    pub position: KeyframeStack,
    pub scale: KeyframeStack,
}

impl BoneAnimation {
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            rotation: KeyframeStack::default(),
            position: KeyframeStack::default(),
            scale: KeyframeStack::default(),
        }
    }

    pub fn with_rotation(mut self, stack: KeyframeStack) -> Self {
        self.rotation = stack;
        self
    }

    pub fn with_position(mut self, stack: KeyframeStack) -> Self {
        self.position = stack;
        self
    }

    pub fn with_scale(mut self, stack: KeyframeStack) -> Self {
        self.scale = stack;
        self
    }

    pub fn stack(&self, group: TransformGroup) -> &KeyframeStack {
        match group {
            TransformGroup::Rotation => &self.rotation,
            TransformGroup::Position => &self.position,
            TransformGroup::Scale => &self.scale,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyframeEventKind {
    Sound,
    Particle,
    CustomInstruction,
}

/// A point in an animation's timeline at which the controller notifies its event handler.
#[derive(Clone, Debug, PartialEq)]
pub struct EventKeyframe {
    pub time: f64,
    pub kind: KeyframeEventKind,
    pub data: String,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LoopType {
    /// Use the loop type stored on the animation itself.
    #[default]
    Default,
    Once,
    Loop,
    HoldOnLastFrame,
}

impl LoopType {
    pub fn resolve(self, animation: &Animation) -> LoopType {
        match self {
            LoopType::Default => match animation.loop_type {
                LoopType::Default => LoopType::Once,
                other => other,
            },
            other => other,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    /// Length in ticks.
    pub length: f64,
    pub loop_type: LoopType,
    pub bone_animations: Vec<BoneAnimation>,
    pub events: Vec<EventKeyframe>,
}

impl Animation {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            loop_type: LoopType::Once,
            bone_animations: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_loop_type(mut self, loop_type: LoopType) -> Self {
        self.loop_type = loop_type;
        self
    }

    pub fn with_bone_animation(mut self, bone_animation: BoneAnimation) -> Self {
        self.bone_animations.push(bone_animation);
        self
    }

    pub fn with_event(mut self, time: f64, kind: KeyframeEventKind, data: impl Into<String>) -> Self {
        self.events.push(EventKeyframe {
            time,
            kind,
            data: data.into(),
        });
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    /// An animation with no curves that lasts `ticks`, used for wait stages.
    pub fn generate_wait_animation(ticks: f64) -> Self {
        Self::new(WAIT_ANIMATION_NAME, ticks.max(0.0))
    }

    pub fn bone_animation(&self, bone_name: &str) -> Option<&BoneAnimation> {
        self.bone_animations
            .iter()
            .find(|b| b.bone_name == bone_name)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Stage {
    Named { name: String, loop_type: LoopType },
    Wait { ticks: f64 },
}

/// An ordered animation request, expanded against a model into a queue of animations.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawAnimation {
    stages: Vec<Stage>,
}

impl RawAnimation {
    pub fn begin() -> Self {
        Self::default()
    }

    pub fn then(mut self, name: impl Into<String>, loop_type: LoopType) -> Self {
        self.stages.push(Stage::Named {
            name: name.into(),
            loop_type,
        });
        self
    }

    pub fn then_play(self, name: impl Into<String>) -> Self {
        self.then(name, LoopType::Once)
    }

    pub fn then_loop(self, name: impl Into<String>) -> Self {
        self.then(name, LoopType::Loop)
    }

    pub fn then_play_and_hold(self, name: impl Into<String>) -> Self {
        self.then(name, LoopType::HoldOnLastFrame)
    }

    pub fn then_wait(mut self, ticks: f64) -> Self {
        self.stages.push(Stage::Wait { ticks });
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Something being animated. Each animatable gets its own manager and snapshots.
pub trait Animatable {
    /// Ticks taken by an undriven bone to relax back to its bind pose.
    fn bone_reset_time(&self) -> f64 {
        1.0
    }

    /// Label used in log output.
    fn describe(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("animatable")
            .to_string()
    }
}

/// Resolves animation names for an animatable, e.g. a loaded animation file.
pub trait AnimationSource<A: ?Sized> {
    fn animation(&self, animatable: &A, name: &str) -> Option<Arc<Animation>>;
}

/// Animations indexed by name.
#[derive(Clone, Debug, Default)]
pub struct AnimationLibrary {
    animations: Vec<Arc<Animation>>,
    animation_index: HashMap<String, usize>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, animation: Animation) {
        let name = animation.name.clone();
        let animation = Arc::new(animation);
        match self.animation_index.get(&name) {
            Some(&index) => self.animations[index] = animation,
            None => {
                self.animation_index.insert(name, self.animations.len());
                self.animations.push(animation);
            }
        }
    }

    pub fn with(mut self, animation: Animation) -> Self {
        self.insert(animation);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Animation>> {
        let index = *self.animation_index.get(name)?;
        self.animations.get(index)
    }

    /// Animations in first-insertion order.
    pub fn animations(&self) -> &[Arc<Animation>] {
        &self.animations
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

impl<A: ?Sized> AnimationSource<A> for AnimationLibrary {
    fn animation(&self, _animatable: &A, name: &str) -> Option<Arc<Animation>> {
        self.get(name).cloned()
    }
}

impl<A: ?Sized> AnimationSource<A> for HashMap<String, Arc<Animation>> {
    fn animation(&self, _animatable: &A, name: &str) -> Option<Arc<Animation>> {
        self.get(name).cloned()
    }
}
