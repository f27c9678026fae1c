use super::processor::resolve_queue;
use super::{AnimationPoint, AnimationState, BoneAnimationQueue, BoneSnapshot, Skeleton, sample};
use crate::expression::Variable;
use crate::{
    Animation, AnimationSource, Axis, EasingType, Error, EventKeyframe, LoopType, RawAnimation,
    TransformGroup,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

pub const TICKS_PER_SECOND: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct QueuedAnimation {
    pub animation: Arc<Animation>,
    pub loop_type: LoopType,
}

impl QueuedAnimation {
    pub fn new(animation: Arc<Animation>, loop_type: LoopType) -> Self {
        Self {
            animation,
            loop_type,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControllerState {
    Idle,
    Transitioning,
    Playing,
    LoopPending,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlayState {
    Continue,
    Stop,
}

/// What to do when an animation names a bone the skeleton does not have.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MissingBonePolicy {
    #[default]
    Skip,
    Fail,
}

/// Passed to the state handler once per tick.
pub struct AnimationEvent<'a, A> {
    pub animatable: &'a A,
    pub anim_time: f64,
    pub state: &'a mut AnimationState,
    pub controller: &'a mut AnimationController<A>,
}

impl<A> AnimationEvent<'_, A> {
    pub fn set_animation(&mut self, raw: RawAnimation) {
        self.controller.set_animation(raw);
    }

    pub fn is_moving(&self) -> bool {
        self.state.is_moving
    }
}

/// Decides, every tick, which animation the controller should be playing.
pub trait AnimationStateHandler<A>: Send {
    fn handle(&mut self, event: &mut AnimationEvent<'_, A>) -> PlayState;
}

pub trait EasingOverride<A>: Send {
    fn easing(&self, animatable: &A) -> Option<EasingType>;
}

impl<A, F> EasingOverride<A> for F
where
    F: Fn(&A) -> Option<EasingType> + Send,
{
    fn easing(&self, animatable: &A) -> Option<EasingType> {
        self(animatable)
    }
}

/// Multiplier applied to the controller clock.
pub trait AnimationSpeed<A>: Send {
    fn speed(&self, animatable: &A) -> f64;
}

impl<A, F> AnimationSpeed<A> for F
where
    F: Fn(&A) -> f64 + Send,
{
    fn speed(&self, animatable: &A) -> f64 {
        self(animatable)
    }
}

pub struct KeyframeEvent<'a, A> {
    pub animatable: &'a A,
    pub controller: &'a str,
    pub animation: &'a str,
    pub tick: f64,
    pub keyframe: &'a EventKeyframe,
}

pub trait KeyframeEventHandler<A>: Send {
    fn handle(&mut self, event: &KeyframeEvent<'_, A>);
}

pub(crate) struct ControllerContext<'a, A, M: ?Sized> {
    pub animatable: &'a A,
    pub source: &'a M,
    pub skeleton: &'a Skeleton,
    pub snapshots: &'a HashMap<String, BoneSnapshot>,
    pub state: &'a mut AnimationState,
    pub anim_time: f64,
    pub anim_time_variable: &'a Variable,
    pub missing_bones: MissingBonePolicy,
    pub first_tick: bool,
}

/// One independently progressing animation track of an animatable.
pub struct AnimationController<A> {
    name: String,
    state: ControllerState,
    queue: VecDeque<QueuedAnimation>,
    current: Option<QueuedAnimation>,
    current_raw: Option<RawAnimation>,
    pending: Option<RawAnimation>,
    needs_reload: bool,

    tick_offset: f64,
    tick: f64,
    transition_length: f64,
    transition_from: HashMap<String, BoneSnapshot>,
    bone_queues: HashMap<String, BoneAnimationQueue>,
    fired_events: HashSet<usize>,
    warned_bones: HashSet<String>,

    easing_override: Option<Box<dyn EasingOverride<A>>>,
    speed: Option<Box<dyn AnimationSpeed<A>>>,
    state_handler: Option<Box<dyn AnimationStateHandler<A>>>,
    event_handler: Option<Box<dyn KeyframeEventHandler<A>>>,

    triggers: HashMap<String, RawAnimation>,
    triggered: Option<String>,
}

impl<A> AnimationController<A> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ControllerState::Idle,
            queue: VecDeque::new(),
            current: None,
            current_raw: None,
            pending: None,
            needs_reload: false,
            tick_offset: 0.0,
            tick: 0.0,
            transition_length: 0.0,
            transition_from: HashMap::new(),
            bone_queues: HashMap::new(),
            fired_events: HashSet::new(),
            warned_bones: HashSet::new(),
            easing_override: None,
            speed: None,
            state_handler: None,
            event_handler: None,
            triggers: HashMap::new(),
            triggered: None,
        }
    }

    /// Ticks spent blending from the previous pose when the requested animation changes.
    pub fn with_transition_length(mut self, ticks: f64) -> Self {
        self.transition_length = ticks.max(0.0);
        self
    }

    pub fn with_easing_override<E: EasingOverride<A> + 'static>(mut self, easing: E) -> Self {
        self.easing_override = Some(Box::new(easing));
        self
    }

    pub fn with_speed<S: AnimationSpeed<A> + 'static>(mut self, speed: S) -> Self {
        self.speed = Some(Box::new(speed));
        self
    }

    pub fn with_state_handler<H: AnimationStateHandler<A> + 'static>(mut self, handler: H) -> Self {
        self.state_handler = Some(Box::new(handler));
        self
    }

    pub fn with_keyframe_event_handler<H: KeyframeEventHandler<A> + 'static>(
        mut self,
        handler: H,
    ) -> Self {
        self.event_handler = Some(Box::new(handler));
        self
    }

    pub fn with_trigger(mut self, name: impl Into<String>, raw: RawAnimation) -> Self {
        self.triggers.insert(name.into(), raw);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn transition_length(&self) -> f64 {
        self.transition_length
    }

    pub fn current_animation(&self) -> Option<&QueuedAnimation> {
        self.current.as_ref()
    }

    pub fn current_raw_animation(&self) -> Option<&RawAnimation> {
        self.current_raw.as_ref()
    }

    pub fn queued_animations(&self) -> &VecDeque<QueuedAnimation> {
        &self.queue
    }

    /// Controller clock computed during the last tick, in ticks since the current
    /// animation or transition started.
    pub fn animation_tick(&self) -> f64 {
        self.tick
    }

    pub fn bone_queues(&self) -> &HashMap<String, BoneAnimationQueue> {
        &self.bone_queues
    }

    pub fn bone_queue(&self, bone_name: &str) -> Option<&BoneAnimationQueue> {
        self.bone_queues.get(bone_name)
    }

    pub fn triggered_animation(&self) -> Option<&str> {
        self.triggered.as_deref()
    }

    pub fn easing_override(&self, animatable: &A) -> Option<EasingType> {
        self.easing_override.as_ref()?.easing(animatable)
    }

    /// Requests `raw`. Resolved against the model on the next tick; requesting the
    /// animation that is already playing changes nothing.
    pub fn set_animation(&mut self, raw: RawAnimation) {
        self.pending = Some(raw);
    }

    /// Starts the named trigger, overriding the state handler until it finishes.
    pub fn trigger_animation(&mut self, name: &str) -> bool {
        let Some(raw) = self.triggers.get(name).cloned() else {
            return false;
        };
        log::debug!("controller '{}' triggered '{name}'", self.name);
        self.triggered = Some(name.to_string());
        self.pending = Some(raw);
        self.needs_reload = true;
        true
    }

    pub fn stop(&mut self) {
        if self.state != ControllerState::Idle {
            log::debug!("controller '{}' stopped", self.name);
        }
        self.state = ControllerState::Idle;
        self.current = None;
        self.current_raw = None;
        self.pending = None;
        self.triggered = None;
        self.queue.clear();
        self.transition_from.clear();
        self.bone_queues.clear();
        self.fired_events.clear();
    }

    /// Drops all playback state. The last requested animation is resolved again on the
    /// next tick, picking up any reloaded animation data.
    pub fn force_animation_reset(&mut self) {
        let raw = self.pending.take().or_else(|| self.current_raw.take());
        let triggered = self.triggered.take();
        self.stop();
        self.pending = raw;
        self.triggered = triggered;
        self.needs_reload = true;
    }

    pub(crate) fn process<M>(&mut self, ctx: &mut ControllerContext<'_, A, M>) -> Result<(), Error>
    where
        M: AnimationSource<A> + ?Sized,
    {
        self.bone_queues.clear();

        if self.triggered.is_some() && self.pending.is_none() && self.state == ControllerState::Idle
        {
            log::debug!("controller '{}' finished triggered animation", self.name);
            self.triggered = None;
            self.needs_reload = true;
        }
        let handler = match self.triggered {
            Some(_) => None,
            None => self.state_handler.take(),
        };
        if let Some(mut handler) = handler {
            let play_state = handler.handle(&mut AnimationEvent {
                animatable: ctx.animatable,
                anim_time: ctx.anim_time,
                state: &mut *ctx.state,
                controller: self,
            });
            if self.state_handler.is_none() {
                self.state_handler = Some(handler);
            }
            if play_state == PlayState::Stop {
                self.stop();
                return Ok(());
            }
        }

        self.resolve_request(ctx);
        let speed = self
            .speed
            .as_ref()
            .map_or(1.0, |speed| speed.speed(ctx.animatable));
        self.advance(ctx, speed)
    }

    fn resolve_request<M>(&mut self, ctx: &ControllerContext<'_, A, M>)
    where
        M: AnimationSource<A> + ?Sized,
    {
        let Some(raw) = self.pending.take() else {
            return;
        };
        if raw.is_empty() {
            self.stop();
            return;
        }
        if !self.needs_reload && self.current_raw.as_ref() == Some(&raw) {
            return;
        }
        let Some(queue) = resolve_queue(ctx.animatable, ctx.source, &raw) else {
            self.stop();
            return;
        };
        let blend = self.transition_length > 0.0 && !ctx.first_tick && self.current.is_some();
        self.queue = queue;
        self.current_raw = Some(raw);
        self.needs_reload = false;
        self.current = None;
        self.transition_from.clear();
        if !blend {
            self.state = ControllerState::Idle;
            return;
        }
        let Some(next) = self.queue.pop_front() else {
            self.state = ControllerState::Idle;
            return;
        };
        for bone_animation in &next.animation.bone_animations {
            if let Some(snapshot) = ctx.snapshots.get(&bone_animation.bone_name) {
                self.transition_from
                    .insert(bone_animation.bone_name.clone(), snapshot.clone());
            }
        }
        self.start(next, ctx.anim_time, ControllerState::Transitioning);
    }

    fn start(&mut self, next: QueuedAnimation, anim_time: f64, state: ControllerState) {
        log::debug!(
            "controller '{}' {:?} -> {state:?} with '{}'",
            self.name,
            self.state,
            next.animation.name
        );
        self.current = Some(next);
        self.state = state;
        self.reset_clock(anim_time);
        self.fired_events.clear();
    }

    fn reset_clock(&mut self, anim_time: f64) {
        self.tick_offset = anim_time;
        self.tick = 0.0;
    }

    fn clock(&mut self, anim_time: f64, speed: f64) -> f64 {
        self.tick = speed * (anim_time - self.tick_offset).max(0.0);
        self.tick
    }

    fn advance<M>(&mut self, ctx: &mut ControllerContext<'_, A, M>, speed: f64) -> Result<(), Error>
    where
        M: AnimationSource<A> + ?Sized,
    {
        loop {
            match self.state {
                ControllerState::Idle => {
                    let Some(next) = self.queue.pop_front() else {
                        self.current = None;
                        return Ok(());
                    };
                    self.start(next, ctx.anim_time, ControllerState::Playing);
                }
                ControllerState::Transitioning => {
                    let tick = self.clock(ctx.anim_time, speed);
                    if tick >= self.transition_length {
                        log::debug!("controller '{}' finished transition", self.name);
                        self.state = ControllerState::Playing;
                        self.transition_from.clear();
                        self.reset_clock(ctx.anim_time);
                        continue;
                    }
                    return self.emit_transition(ctx, tick);
                }
                ControllerState::Playing => {
                    let Some(current) = self.current.clone() else {
                        self.state = ControllerState::Idle;
                        continue;
                    };
                    let animation = &current.animation;
                    let tick = self.clock(ctx.anim_time, speed);
                    self.check_bones(ctx, animation)?;
                    self.fire_events(ctx.animatable, animation, tick.min(animation.length));
                    if tick >= animation.length {
                        self.state = ControllerState::LoopPending;
                        continue;
                    }
                    return self.emit_animation(ctx, animation, tick);
                }
                ControllerState::LoopPending => {
                    let Some(current) = self.current.clone() else {
                        self.state = ControllerState::Idle;
                        continue;
                    };
                    let animation = &current.animation;
                    match current.loop_type.resolve(animation) {
                        LoopType::Loop if animation.length > 0.0 => {
                            self.reset_clock(ctx.anim_time);
                            self.fired_events.clear();
                            self.state = ControllerState::Playing;
                        }
                        LoopType::Loop => return Ok(()),
                        LoopType::HoldOnLastFrame => {
                            self.tick = animation.length;
                            return self.emit_animation(ctx, animation, animation.length);
                        }
                        LoopType::Once | LoopType::Default => {
                            log::debug!(
                                "controller '{}' finished '{}'",
                                self.name,
                                animation.name
                            );
                            self.current = None;
                            self.state = ControllerState::Idle;
                        }
                    }
                }
            }
        }
    }

    /// Whether the bone exists, or an error when it does not and the policy is strict.
    fn check_bone<M: ?Sized>(
        &mut self,
        ctx: &ControllerContext<'_, A, M>,
        animation: &Animation,
        bone_name: &str,
    ) -> Result<bool, Error> {
        if ctx.skeleton.find_bone(bone_name).is_some() {
            return Ok(true);
        }
        match ctx.missing_bones {
            MissingBonePolicy::Fail => Err(Error::MissingBone {
                animation: animation.name.clone(),
                bone: bone_name.to_string(),
            }),
            MissingBonePolicy::Skip => {
                if self.warned_bones.insert(bone_name.to_string()) {
                    log::warn!(
                        "animation '{}' drives unknown bone '{bone_name}', skipping",
                        animation.name
                    );
                }
                Ok(false)
            }
        }
    }

    /// Fails before any event is dispatched when a strict policy meets an unknown bone.
    fn check_bones<M: ?Sized>(
        &mut self,
        ctx: &ControllerContext<'_, A, M>,
        animation: &Animation,
    ) -> Result<(), Error> {
        for bone_animation in &animation.bone_animations {
            self.check_bone(ctx, animation, &bone_animation.bone_name)?;
        }
        Ok(())
    }

    fn emit_animation<M: ?Sized>(
        &mut self,
        ctx: &ControllerContext<'_, A, M>,
        animation: &Animation,
        tick: f64,
    ) -> Result<(), Error> {
        ctx.anim_time_variable.set(tick / TICKS_PER_SECOND);
        for bone_animation in &animation.bone_animations {
            if !self.check_bone(ctx, animation, &bone_animation.bone_name)? {
                continue;
            }
            let queue = self
                .bone_queues
                .entry(bone_animation.bone_name.clone())
                .or_default();
            for group in TransformGroup::ALL {
                let stack = bone_animation.stack(group);
                for axis in Axis::ALL {
                    if let Some(point) = sample(stack.axis(axis), tick) {
                        queue.push(group, axis, point);
                    }
                }
            }
        }
        Ok(())
    }

    /// Blends from the pose frozen when the transition started into the new animation's
    /// first frame.
    fn emit_transition<M: ?Sized>(
        &mut self,
        ctx: &ControllerContext<'_, A, M>,
        tick: f64,
    ) -> Result<(), Error> {
        let Some(current) = self.current.clone() else {
            return Ok(());
        };
        let animation = &current.animation;
        ctx.anim_time_variable.set(0.0);
        for bone_animation in &animation.bone_animations {
            if !self.check_bone(ctx, animation, &bone_animation.bone_name)? {
                continue;
            }
            let Some(bone) = ctx.skeleton.bone(&bone_animation.bone_name) else {
                continue;
            };
            let from = self
                .transition_from
                .get(&bone_animation.bone_name)
                .or_else(|| ctx.snapshots.get(&bone_animation.bone_name))
                .cloned()
                .unwrap_or_else(|| BoneSnapshot::from_bone(bone));
            let queue = self
                .bone_queues
                .entry(bone_animation.bone_name.clone())
                .or_default();
            for group in TransformGroup::ALL {
                let stack = bone_animation.stack(group);
                for axis in Axis::ALL {
                    let Some(target) = sample(stack.axis(axis), 0.0) else {
                        continue;
                    };
                    let mut start = f64::from(from.get(group)[axis.index()]);
                    if group == TransformGroup::Rotation {
                        start -= f64::from(bone.bind_rotation()[axis.index()]);
                    }
                    queue.push(
                        group,
                        axis,
                        AnimationPoint::new(start, target.value(), tick, self.transition_length),
                    );
                }
            }
        }
        Ok(())
    }

    fn fire_events(&mut self, animatable: &A, animation: &Animation, tick: f64) {
        for (index, keyframe) in animation.events.iter().enumerate() {
            if keyframe.time > tick || !self.fired_events.insert(index) {
                continue;
            }
            log::trace!(
                "controller '{}' fired {:?} event at {} in '{}'",
                self.name,
                keyframe.kind,
                keyframe.time,
                animation.name
            );
            if let Some(handler) = self.event_handler.as_mut() {
                handler.handle(&KeyframeEvent {
                    animatable,
                    controller: &self.name,
                    animation: &animation.name,
                    tick,
                    keyframe,
                });
            }
        }
    }
}

impl<A> fmt::Debug for AnimationController<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("name", &self.name)
            .field("state", &self.state)
            .field(
                "current",
                &self.current.as_ref().map(|c| c.animation.name.as_str()),
            )
            .field("queued", &self.queue.len())
            .field("tick", &self.tick)
            .field("transition_length", &self.transition_length)
            .field("triggered", &self.triggered)
            .finish()
    }
}
