use crate::{
    AnimatableManager, Animatable, Animation, AnimationController, AnimationEvent,
    AnimationLibrary, AnimationProcessor, AnimationState, AnimationStateHandler, BakedGeoModel,
    Bone, BoneAnimation, Error, GeoBone, KeyframeCurve, KeyframeEventKind, KeyframeStack,
    LoopType, PlayState, RawAnimation, TickOptions,
};
use glam::Vec3;
use std::sync::{Arc, Mutex};

pub(crate) fn assert_approx(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-6,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

pub(crate) fn assert_approx_f32(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

#[derive(Debug)]
pub(crate) struct TestMob {
    pub reset_time: f64,
}

impl TestMob {
    pub fn new() -> Self {
        Self { reset_time: 4.0 }
    }
}

impl Animatable for TestMob {
    fn bone_reset_time(&self) -> f64 {
        self.reset_time
    }
}

/// `body` at the root with `arm` and `head` children. `arm` rests rotated 10 degrees about X.
pub(crate) fn test_model() -> BakedGeoModel {
    BakedGeoModel {
        bones: vec![
            GeoBone::new("body")
                .with_position(Vec3::new(0.0, 12.0, 0.0))
                .with_child(GeoBone::new("arm").with_rotation(Vec3::new(10.0, 0.0, 5.0)))
                .with_child(GeoBone::new("head")),
        ],
    }
}

pub(crate) fn x_stack(points: &[(f64, f64)]) -> KeyframeStack {
    KeyframeStack::new(
        KeyframeCurve::linear(points),
        KeyframeCurve::default(),
        KeyframeCurve::default(),
    )
}

pub(crate) fn y_stack(points: &[(f64, f64)]) -> KeyframeStack {
    KeyframeStack::new(
        KeyframeCurve::default(),
        KeyframeCurve::linear(points),
        KeyframeCurve::default(),
    )
}

/// Animations over [`test_model`]:
///
/// - `swing`: 20 ticks, arm rotation X from 0 to 90.
/// - `raise`: 10 ticks, arm rotation X held at 30.
/// - `instant`: zero length, arm rotation X at 50.
/// - `spin`: 10 ticks looping, body rotation Y from 0 to 360.
/// - `wave`: 10 ticks, arm rotation X from 0 to 20, with events at 0 and 5.
pub(crate) fn test_library() -> AnimationLibrary {
    AnimationLibrary::new()
        .with(
            Animation::new("swing", 20.0)
                .with_bone_animation(BoneAnimation::new("arm").with_rotation(x_stack(&[
                    (0.0, 0.0),
                    (20.0, 90.0),
                ]))),
        )
        .with(
            Animation::new("raise", 10.0).with_bone_animation(
                BoneAnimation::new("arm").with_rotation(x_stack(&[(0.0, 30.0), (10.0, 30.0)])),
            ),
        )
        .with(
            Animation::new("instant", 0.0).with_bone_animation(
                BoneAnimation::new("arm").with_rotation(x_stack(&[(0.0, 50.0)])),
            ),
        )
        .with(
            Animation::new("spin", 10.0)
                .with_loop_type(LoopType::Loop)
                .with_bone_animation(
                    BoneAnimation::new("body")
                        .with_rotation(y_stack(&[(0.0, 0.0), (10.0, 360.0)])),
                ),
        )
        .with(
            Animation::new("wave", 10.0)
                .with_bone_animation(
                    BoneAnimation::new("arm").with_rotation(x_stack(&[(0.0, 0.0), (10.0, 20.0)])),
                )
                .with_event(5.0, KeyframeEventKind::Particle, "sparkle")
                .with_event(0.0, KeyframeEventKind::Sound, "whoosh"),
        )
}

/// Requests whatever the shared slot holds, every tick.
#[derive(Clone)]
pub(crate) struct Request(pub Arc<Mutex<RawAnimation>>);

impl Request {
    pub fn new(raw: RawAnimation) -> Self {
        Self(Arc::new(Mutex::new(raw)))
    }

    pub fn set(&self, raw: RawAnimation) {
        *self.0.lock().unwrap() = raw;
    }
}

impl<A> AnimationStateHandler<A> for Request {
    fn handle(&mut self, event: &mut AnimationEvent<'_, A>) -> PlayState {
        let raw = self.0.lock().unwrap().clone();
        event.set_animation(raw);
        PlayState::Continue
    }
}

pub(crate) struct AlwaysStop;

impl<A> AnimationStateHandler<A> for AlwaysStop {
    fn handle(&mut self, _event: &mut AnimationEvent<'_, A>) -> PlayState {
        PlayState::Stop
    }
}

/// A processor posed with [`test_model`] plus one animatable and its manager.
pub(crate) struct Rig {
    pub processor: AnimationProcessor,
    pub manager: AnimatableManager<TestMob>,
    pub mob: TestMob,
    pub library: AnimationLibrary,
    pub state: AnimationState,
}

impl Rig {
    pub fn new(controllers: Vec<AnimationController<TestMob>>) -> Self {
        let mut processor = AnimationProcessor::new();
        processor.set_active_model(&test_model());
        let mut manager = AnimatableManager::new();
        for controller in controllers {
            manager.add_controller(controller);
        }
        Self {
            processor,
            manager,
            mob: TestMob::new(),
            library: test_library(),
            state: AnimationState::default(),
        }
    }

    pub fn try_tick(&mut self, anim_time: f64, options: TickOptions) -> Result<(), Error> {
        self.processor.tick_animation(
            &self.mob,
            &self.library,
            &mut self.manager,
            anim_time,
            &mut self.state,
            options,
        )
    }

    pub fn tick(&mut self, anim_time: f64) {
        self.try_tick(anim_time, TickOptions::default()).unwrap();
    }

    pub fn bone(&self, name: &str) -> &Bone {
        self.processor.bone(name).unwrap()
    }

    pub fn controller(&self, name: &str) -> &AnimationController<TestMob> {
        self.manager.controller(name).unwrap()
    }

    pub fn controller_mut(&mut self, name: &str) -> &mut AnimationController<TestMob> {
        self.manager.controller_mut(name).unwrap()
    }

    /// Arm rotation X as an offset from its bind pose.
    pub fn arm_offset(&self) -> f32 {
        let arm = self.bone("arm");
        arm.rotation.x - arm.bind_rotation().x
    }
}
