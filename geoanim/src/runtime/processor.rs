use super::controller::ControllerContext;
use super::{
    AnimatableManager, AnimationState, Bone, BoneSnapshot, MissingBonePolicy, QueuedAnimation,
    Skeleton, TICKS_PER_SECOND,
};
use crate::expression::{Variable, VariableScope};
use crate::{
    Animatable, Animation, AnimationSource, BakedGeoModel, EasingType, Error, GeoBone, LoopType,
    RawAnimation, Stage, TransformGroup,
};
use glam::Vec3;
use std::collections::VecDeque;
use std::sync::Arc;

/// Options for a single [`AnimationProcessor::tick_animation`] call.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TickOptions {
    /// Force-reset every controller so animations are resolved again.
    pub reload_animations: bool,
    pub missing_bones: MissingBonePolicy,
}

impl TickOptions {
    pub fn reload() -> Self {
        Self {
            reload_animations: true,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            missing_bones: MissingBonePolicy::Fail,
            ..Self::default()
        }
    }
}

/// Expands `raw` into queued animations. Any unresolvable stage discards the whole queue.
pub(crate) fn resolve_queue<A, M>(
    animatable: &A,
    model: &M,
    raw: &RawAnimation,
) -> Option<VecDeque<QueuedAnimation>>
where
    M: AnimationSource<A> + ?Sized,
{
    let mut queue = VecDeque::with_capacity(raw.stages().len());
    for stage in raw.stages() {
        let queued = match stage {
            Stage::Wait { ticks } => QueuedAnimation::new(
                Arc::new(Animation::generate_wait_animation(*ticks)),
                LoopType::Once,
            ),
            Stage::Named { name, loop_type } => match model.animation(animatable, name) {
                Some(animation) => QueuedAnimation::new(animation, *loop_type),
                None => {
                    log::warn!(
                        "{}",
                        Error::UnknownAnimation {
                            name: name.clone(),
                            animatable: std::any::type_name::<A>().to_string(),
                        }
                    );
                    return None;
                }
            },
        };
        queue.push_back(queued);
    }
    Some(queue)
}

/// Drives the controllers of animatables that share one model skeleton.
#[derive(Debug)]
pub struct AnimationProcessor {
    skeleton: Skeleton,
    scope: VariableScope,
    anim_time: Arc<Variable>,
    life_time: Arc<Variable>,
    limb_swing: Arc<Variable>,
    limb_swing_amount: Arc<Variable>,
    is_moving: Arc<Variable>,
    partial_tick: Arc<Variable>,
}

impl Default for AnimationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationProcessor {
    pub fn new() -> Self {
        Self::with_scope(VariableScope::new())
    }

    /// Uses `scope` for the `query.*` variables refreshed each tick.
    pub fn with_scope(mut scope: VariableScope) -> Self {
        let anim_time = scope.get_or_create("query.anim_time");
        let life_time = scope.get_or_create("query.life_time");
        let limb_swing = scope.get_or_create("query.limb_swing");
        let limb_swing_amount = scope.get_or_create("query.limb_swing_amount");
        let is_moving = scope.get_or_create("query.is_moving");
        let partial_tick = scope.get_or_create("query.partial_tick");
        Self {
            skeleton: Skeleton::new(),
            scope,
            anim_time,
            life_time,
            limb_swing,
            limb_swing_amount,
            is_moving,
            partial_tick,
        }
    }

    pub fn scope(&self) -> &VariableScope {
        &self.scope
    }

    /// Scope to parse keyframe expressions against.
    pub fn scope_mut(&mut self) -> &mut VariableScope {
        &mut self.scope
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn register_geo_bone(&mut self, bone: &GeoBone) {
        self.skeleton.register(bone, None);
    }

    /// Replaces the registered bones with the bones of `model`.
    pub fn set_active_model(&mut self, model: &BakedGeoModel) {
        self.skeleton.clear();
        for bone in &model.bones {
            self.register_geo_bone(bone);
        }
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.skeleton.bone(name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.skeleton.bone_mut(name)
    }

    pub fn registered_bones(&self) -> impl Iterator<Item = &Bone> {
        self.skeleton.bones().iter()
    }

    pub fn build_animation_queue<A, M>(
        &self,
        animatable: &A,
        model: &M,
        raw: &RawAnimation,
    ) -> Option<VecDeque<QueuedAnimation>>
    where
        M: AnimationSource<A> + ?Sized,
    {
        resolve_queue(animatable, model, raw)
    }

    /// Advances every controller of `manager` to `anim_time` and poses the skeleton.
    ///
    /// Controllers run before any bone is touched, so a strict missing-bone failure leaves
    /// the skeleton as it was.
    pub fn tick_animation<A, M>(
        &mut self,
        animatable: &A,
        model: &M,
        manager: &mut AnimatableManager<A>,
        anim_time: f64,
        state: &mut AnimationState,
        options: TickOptions,
    ) -> Result<(), Error>
    where
        A: Animatable,
        M: AnimationSource<A> + ?Sized,
    {
        for bone in self.skeleton.bones() {
            if !manager.snapshots.contains_key(bone.name()) {
                manager
                    .snapshots
                    .insert(bone.name().to_string(), BoneSnapshot::from_bone(bone));
            }
        }

        if options.reload_animations {
            log::debug!("reloading animations for {}", animatable.describe());
            for controller in &mut manager.controllers {
                controller.force_animation_reset();
            }
        }

        self.refresh_variables(anim_time, state);
        let first_tick = manager.is_first_tick();
        for controller in &mut manager.controllers {
            controller.process(&mut ControllerContext {
                animatable,
                source: model,
                skeleton: &self.skeleton,
                snapshots: &manager.snapshots,
                state: &mut *state,
                anim_time,
                anim_time_variable: &self.anim_time,
                missing_bones: options.missing_bones,
                first_tick,
            })?;
        }

        self.apply_controllers(animatable, manager);
        self.relax_undriven_bones(animatable.bone_reset_time(), anim_time, manager);

        for bone in self.skeleton.bones_mut() {
            bone.reset_changed();
        }
        manager.finish_first_tick();
        Ok(())
    }

    fn refresh_variables(&self, anim_time: f64, state: &AnimationState) {
        self.life_time.set(anim_time / TICKS_PER_SECOND);
        self.limb_swing.set(state.limb_swing);
        self.limb_swing_amount.set(state.limb_swing_amount);
        self.is_moving.set(if state.is_moving { 1.0 } else { 0.0 });
        self.partial_tick.set(state.partial_tick);
    }

    /// Later controllers win when several drive the same bone group.
    fn apply_controllers<A>(&mut self, animatable: &A, manager: &mut AnimatableManager<A>) {
        for controller in &manager.controllers {
            let easing_override = controller.easing_override(animatable);
            for (bone_name, queue) in controller.bone_queues() {
                let Some(bone) = self.skeleton.bone_mut(bone_name) else {
                    continue;
                };
                let Some(snapshot) = manager.snapshots.get_mut(bone_name) else {
                    continue;
                };
                for group in TransformGroup::ALL {
                    if !queue.has_group(group) {
                        continue;
                    }
                    // Axes without a point sit at bind within a driven group.
                    let bind = bone.bind(group);
                    let mut value = bind;
                    for (axis, point) in queue.group(group).iter().enumerate() {
                        let Some(point) = point else {
                            continue;
                        };
                        let mut animated = EasingType::lerp_with_override(point, easing_override);
                        if group == TransformGroup::Rotation {
                            animated += f64::from(bind[axis]);
                        }
                        value[axis] = animated as f32;
                    }
                    bone.set_transform(group, value);
                    bone.mark_changed(group);
                    snapshot.set(group, value);
                    snapshot.start(group);
                }
            }
        }
    }

    fn relax_undriven_bones<A>(
        &mut self,
        reset_time: f64,
        anim_time: f64,
        manager: &mut AnimatableManager<A>,
    ) {
        for bone in self.skeleton.bones_mut() {
            let Some(snapshot) = manager.snapshots.get_mut(bone.name()) else {
                continue;
            };
            for group in TransformGroup::ALL {
                if bone.has_changed(group) {
                    continue;
                }
                if snapshot.is_in_progress(group) {
                    snapshot.stop(group, anim_time);
                }
                let progress = if reset_time <= 0.0 {
                    1.0
                } else {
                    ((anim_time - snapshot.last_stopped(group)) / reset_time).clamp(0.0, 1.0)
                };
                let bind = bone.bind(group);
                if progress >= 1.0 {
                    bone.set_transform(group, bind);
                    snapshot.set(group, bind);
                } else {
                    bone.set_transform(group, relax(snapshot.get(group), bind, progress));
                }
            }
        }
    }
}

fn relax(from: Vec3, bind: Vec3, progress: f64) -> Vec3 {
    from.lerp(bind, progress as f32)
}
