use crate::{AnimationPoint, EasingType, lerp};

fn assert_approx(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-6,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

#[test]
fn lerp_hits_both_endpoints_exactly() {
    for (a, b) in [(0.0, 1.0), (-3.25, 17.5), (0.1, 0.7), (1.0e9, -1.0e-9)] {
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
    }
}

#[test]
fn every_easing_fixes_zero_and_one() {
    for easing in EasingType::ALL {
        assert_approx(easing.ease(0.0, None), 0.0);
        assert_approx(easing.ease(1.0, None), 1.0);
    }
}

#[test]
fn progress_is_clamped_before_easing() {
    for easing in EasingType::ALL {
        assert_eq!(easing.ease(-0.5, None), easing.ease(0.0, None), "{easing:?}");
        assert_eq!(easing.ease(1.5, None), easing.ease(1.0, None), "{easing:?}");
    }
}

#[test]
fn equal_endpoints_are_the_identity() {
    for easing in EasingType::ALL {
        for elapsed in [0.0, 0.3, 1.7, 2.0, 9.0] {
            let point = AnimationPoint::new(4.5, 4.5, elapsed, 2.0).with_easing(easing, None);
            assert_eq!(EasingType::lerp_with_override(&point, None), 4.5);
        }
    }
}

#[test]
fn zero_duration_resolves_to_end() {
    let point = AnimationPoint::new(1.0, 3.0, 0.0, 0.0);
    assert_eq!(point.value(), 3.0);
    assert_eq!(AnimationPoint::constant(-2.0).value(), -2.0);
}

#[test]
fn override_replaces_point_easing() {
    let point = AnimationPoint::new(0.0, 10.0, 1.0, 4.0).with_easing(EasingType::EaseInQuad, None);
    assert_approx(point.value(), 0.625);
    assert_approx(
        EasingType::lerp_with_override(&point, Some(EasingType::Linear)),
        2.5,
    );
}

#[test]
fn step_uses_its_argument_as_step_count() {
    assert_approx(EasingType::Step.ease(0.49, None), 0.0);
    assert_approx(EasingType::Step.ease(0.5, None), 0.5);
    assert_approx(EasingType::Step.ease(0.49, Some(5.0)), 0.4);
}

#[test]
fn back_overshoots_below_zero() {
    assert!(EasingType::EaseInBack.ease(0.2, None) < 0.0);
    assert!(EasingType::EaseOutBack.ease(0.8, None) > 1.0);
    assert_approx(EasingType::EaseInBack.ease(0.5, Some(0.0)), 0.125);
}

#[test]
fn in_out_is_symmetric() {
    for easing in [
        EasingType::EaseInOutSine,
        EasingType::EaseInOutCubic,
        EasingType::EaseInOutExpo,
        EasingType::EaseInOutCirc,
    ] {
        assert_approx(easing.ease(0.5, None), 0.5);
        let t = 0.2;
        assert_approx(easing.ease(t, None) + easing.ease(1.0 - t, None), 1.0);
    }
}

#[test]
fn names_round_trip_in_both_styles() {
    for easing in EasingType::ALL {
        assert_eq!(EasingType::from_name(easing.name()), Some(easing));
    }
    assert_eq!(
        EasingType::from_name("ease_in_out_bounce"),
        Some(EasingType::EaseInOutBounce)
    );
    assert_eq!(EasingType::from_name("LINEAR"), Some(EasingType::Linear));
    assert_eq!(EasingType::from_name("wobble"), None);
}
