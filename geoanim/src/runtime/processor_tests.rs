use super::test_support::{
    Request, Rig, TestMob, assert_approx_f32, test_library, test_model, x_stack,
};
use crate::expression::{Expression, FunctionRegistry};
use crate::{
    AnimationController, AnimationProcessor, BakedGeoModel, BoneAnimation, GeoBone, Keyframe,
    KeyframeCurve, KeyframeStack, LoopType, RawAnimation, TransformGroup, WAIT_ANIMATION_NAME,
};
use glam::Vec3;

fn playing(raw: RawAnimation) -> AnimationController<TestMob> {
    AnimationController::new("main").with_state_handler(Request::new(raw))
}

fn pose(rig: &Rig) -> Vec<(Vec3, Vec3, Vec3)> {
    rig.processor
        .registered_bones()
        .map(|b| (b.rotation, b.position, b.scale))
        .collect()
}

#[test]
fn model_registration_and_lookup() {
    let mut processor = AnimationProcessor::new();
    processor.set_active_model(&test_model());
    assert_eq!(processor.registered_bones().count(), 3);
    assert_eq!(
        processor.bone("body").unwrap().bind_position(),
        Vec3::new(0.0, 12.0, 0.0)
    );

    processor.register_geo_bone(&GeoBone::new("tail"));
    assert!(processor.bone("tail").is_some());
    assert_eq!(processor.skeleton().roots().len(), 2);

    processor.set_active_model(&BakedGeoModel {
        bones: vec![GeoBone::new("root")],
    });
    let names: Vec<&str> = processor.registered_bones().map(|b| b.name()).collect();
    assert_eq!(names, ["root"]);
    assert!(processor.bone("arm").is_none());
}

#[test]
fn build_queue_expands_waits() {
    let processor = AnimationProcessor::new();
    let library = test_library();
    let queue = processor
        .build_animation_queue(
            &TestMob::new(),
            &library,
            &RawAnimation::begin().then_loop("swing").then_wait(5.0),
        )
        .unwrap();

    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].animation.name, "swing");
    assert_eq!(queue[0].loop_type, LoopType::Loop);
    assert_eq!(queue[1].animation.name, WAIT_ANIMATION_NAME);
    assert_eq!(queue[1].animation.length, 5.0);
    assert!(queue[1].animation.bone_animations.is_empty());
}

#[test]
fn unresolvable_stage_yields_no_queue() {
    let processor = AnimationProcessor::new();
    let raw = RawAnimation::begin().then_play("walk").then_wait(5.0);
    assert!(
        processor
            .build_animation_queue(&TestMob::new(), &test_library(), &raw)
            .is_none()
    );
}

#[test]
fn rotation_is_offset_from_bind_and_undriven_axes_sit_at_bind() {
    let mut rig = Rig::new(vec![playing(RawAnimation::begin().then_play("swing"))]);
    rig.tick(0.0);
    rig.tick(10.0);

    let arm = rig.bone("arm");
    assert_approx_f32(arm.rotation.x, 55.0);
    assert_eq!(arm.rotation.y, 0.0);
    assert_eq!(arm.rotation.z, 5.0);
    assert_eq!(arm.position, arm.bind_position());

    let snapshot = rig.manager.snapshot("arm").unwrap();
    assert_eq!(snapshot.rotation, arm.rotation);
    assert!(snapshot.is_in_progress(TransformGroup::Rotation));
    assert!(!snapshot.is_in_progress(TransformGroup::Position));
}

#[test]
fn axes_dropped_by_the_next_animation_return_to_bind() {
    let request = Request::new(RawAnimation::begin().then_loop("nod_tilt"));
    let mut rig = Rig::new(vec![
        AnimationController::new("main").with_state_handler(request.clone()),
    ]);
    rig.library.insert(
        crate::Animation::new("nod_tilt", 10.0)
            .with_loop_type(LoopType::Loop)
            .with_bone_animation(BoneAnimation::new("head").with_rotation(KeyframeStack::new(
                KeyframeCurve::linear(&[(0.0, 30.0), (10.0, 30.0)]),
                KeyframeCurve::linear(&[(0.0, 30.0), (10.0, 30.0)]),
                KeyframeCurve::default(),
            ))),
    );
    rig.library.insert(
        crate::Animation::new("nod", 10.0)
            .with_loop_type(LoopType::Loop)
            .with_bone_animation(
                BoneAnimation::new("head").with_rotation(x_stack(&[(0.0, 5.0), (10.0, 5.0)])),
            ),
    );

    for tick in 0..=5 {
        rig.tick(f64::from(tick));
    }
    assert_eq!(rig.bone("head").rotation, Vec3::new(30.0, 30.0, 0.0));

    request.set(RawAnimation::begin().then_loop("nod"));
    rig.tick(6.0);
    assert_eq!(rig.bone("head").rotation, Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(
        rig.manager.snapshot("head").unwrap().rotation,
        Vec3::new(5.0, 0.0, 0.0)
    );

    rig.tick(60.0);
    assert_eq!(rig.bone("head").rotation, Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn undriven_bones_relax_to_bind_pose_exactly() {
    let mut rig = Rig::new(vec![playing(RawAnimation::begin().then_play("raise"))]);
    for tick in 0..=9 {
        rig.tick(f64::from(tick));
    }
    assert_approx_f32(rig.arm_offset(), 30.0);

    rig.tick(10.0);
    assert_approx_f32(rig.arm_offset(), 30.0);
    assert_eq!(
        rig.manager
            .snapshot("arm")
            .unwrap()
            .last_stopped(TransformGroup::Rotation),
        10.0
    );

    rig.tick(11.0);
    assert_approx_f32(rig.arm_offset(), 22.5);
    rig.tick(13.0);
    assert_approx_f32(rig.arm_offset(), 7.5);

    rig.tick(14.0);
    let arm = rig.bone("arm");
    assert_eq!(arm.rotation, arm.bind_rotation());
    assert_eq!(
        rig.manager.snapshot("arm").unwrap().rotation,
        arm.bind_rotation()
    );

    rig.tick(20.0);
    let arm = rig.bone("arm");
    assert_eq!(arm.rotation, arm.bind_rotation());
}

#[test]
fn non_positive_reset_time_snaps_immediately() {
    let mut rig = Rig::new(vec![playing(RawAnimation::begin().then_play("raise"))]);
    rig.mob.reset_time = 0.0;
    rig.tick(0.0);
    rig.tick(5.0);
    assert_approx_f32(rig.arm_offset(), 30.0);

    rig.tick(10.0);
    let arm = rig.bone("arm");
    assert_eq!(arm.rotation, arm.bind_rotation());
}

#[test]
fn repeated_tick_is_idempotent() {
    let mut rig = Rig::new(vec![
        playing(RawAnimation::begin().then_play("raise")),
        AnimationController::new("body")
            .with_state_handler(Request::new(RawAnimation::begin().then_loop("spin"))),
    ]);
    for tick in 0..=10 {
        rig.tick(f64::from(tick));
    }
    rig.tick(12.0);
    let first = pose(&rig);
    rig.tick(12.0);
    assert_eq!(pose(&rig), first);
}

#[test]
fn later_controllers_win_shared_bones() {
    let mut rig = Rig::new(vec![
        AnimationController::new("a")
            .with_state_handler(Request::new(RawAnimation::begin().then_play("raise"))),
        AnimationController::new("b")
            .with_state_handler(Request::new(RawAnimation::begin().then_play("swing"))),
    ]);
    rig.tick(0.0);
    rig.tick(5.0);
    // `a` alone would hold 30.
    assert_approx_f32(rig.arm_offset(), 22.5);
}

#[test]
fn first_tick_flag_clears_after_tick() {
    let mut rig = Rig::new(Vec::new());
    assert!(rig.manager.is_first_tick());
    rig.tick(0.0);
    assert!(!rig.manager.is_first_tick());
    assert_eq!(rig.manager.snapshots().len(), 3);
}

#[test]
fn query_variables_follow_tick_and_state() {
    let mut rig = Rig::new(vec![
        playing(RawAnimation::begin().then_loop("dynamic")),
        AnimationController::new("late"),
    ]);
    let registry = FunctionRegistry::new();
    let scope = rig.processor.scope_mut();
    let life = Expression::parse("query.life_time * 20", scope, &registry).unwrap();
    let swing = Expression::parse("query.limb_swing * 4", scope, &registry).unwrap();
    let clock = Expression::parse("query.anim_time * 20", scope, &registry).unwrap();

    let stack = |value: Expression| {
        KeyframeStack::new(
            KeyframeCurve::new(vec![Keyframe::new(0.0, value)]),
            KeyframeCurve::default(),
            KeyframeCurve::default(),
        )
    };
    rig.library.insert(
        crate::Animation::new("dynamic", 100.0).with_bone_animation(
            BoneAnimation::new("arm")
                .with_position(stack(life))
                .with_scale(stack(swing)),
        ),
    );
    rig.library.insert(
        crate::Animation::new("clock", 100.0)
            .with_bone_animation(BoneAnimation::new("head").with_position(stack(clock))),
    );

    rig.state.limb_swing = 0.25;
    rig.tick(0.0);
    rig.controller_mut("late")
        .set_animation(RawAnimation::begin().then_play("clock"));
    rig.tick(2.0);
    rig.tick(7.0);

    assert_approx_f32(rig.bone("arm").position.x, 7.0);
    assert_approx_f32(rig.bone("arm").scale.x, 1.0);
    assert_approx_f32(rig.bone("head").position.x, 5.0);
}
