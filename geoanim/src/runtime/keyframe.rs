use crate::expression::Expression;
use crate::{Axis, EasingType, KeyframeCurve, TransformGroup};

/// One interpolation request: the segment of a curve that brackets a query tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnimationPoint {
    pub start: f64,
    pub end: f64,
    /// Ticks elapsed since the start of the segment.
    pub elapsed: f64,
    pub duration: f64,
    pub easing: EasingType,
    pub easing_arg: Option<f64>,
}

impl AnimationPoint {
    pub fn new(start: f64, end: f64, elapsed: f64, duration: f64) -> Self {
        Self {
            start,
            end,
            elapsed,
            duration,
            easing: EasingType::Linear,
            easing_arg: None,
        }
    }

    /// A zero-length segment that always resolves to `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(value, value, 0.0, 0.0)
    }

    pub fn with_easing(mut self, easing: EasingType, arg: Option<f64>) -> Self {
        self.easing = easing;
        self.easing_arg = arg;
        self
    }

    pub fn value(&self) -> f64 {
        EasingType::lerp_with_override(self, None)
    }
}

/// Samples `curve` at `tick`, clamping to the first and last keyframes.
///
/// Returns `None` for an empty curve: the axis is not driven.
pub fn sample(curve: &KeyframeCurve, tick: f64) -> Option<AnimationPoint> {
    let frames = curve.keyframes();
    let first = frames.first()?;
    let index = frames.partition_point(|k| k.time <= tick);
    if index == 0 {
        return Some(AnimationPoint::constant(first.value.evaluate()));
    }
    if index >= frames.len() {
        let last = &frames[frames.len() - 1];
        return Some(AnimationPoint::constant(last.value.evaluate()));
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let arg = next.easing_args.first().map(Expression::evaluate);
    Some(
        AnimationPoint::new(
            prev.value.evaluate(),
            next.value.evaluate(),
            tick - prev.time,
            next.time - prev.time,
        )
        .with_easing(next.easing.unwrap_or_default(), arg),
    )
}

/// Pending points for one bone: at most one per transform group and axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneAnimationQueue {
    points: [[Option<AnimationPoint>; 3]; 3],
}

impl BoneAnimationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: TransformGroup, axis: Axis, point: AnimationPoint) {
        self.points[group.index()][axis.index()] = Some(point);
    }

    pub fn point(&self, group: TransformGroup, axis: Axis) -> Option<&AnimationPoint> {
        self.points[group.index()][axis.index()].as_ref()
    }

    /// Points for the x, y and z axes of `group`.
    pub fn group(&self, group: TransformGroup) -> &[Option<AnimationPoint>; 3] {
        &self.points[group.index()]
    }

    pub fn has_group(&self, group: TransformGroup) -> bool {
        self.points[group.index()].iter().any(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        TransformGroup::ALL.iter().all(|&g| !self.has_group(g))
    }

    pub fn clear(&mut self) {
        self.points = Default::default();
    }
}
