//! Easing curves applied to normalized segment progress before interpolation.

use crate::AnimationPoint;
use std::f64::consts::PI;

const DEFAULT_STEPS: f64 = 2.0;
const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;
const DEFAULT_ELASTIC_BOUNCINESS: f64 = 1.0;
const DEFAULT_BOUNCE_BOUNCINESS: f64 = 0.5;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum EasingType {
    #[default]
    Linear,
    Step,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Shape {
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Direction {
    In,
    Out,
    InOut,
}

impl EasingType {
    pub const ALL: [EasingType; 32] = [
        Self::Linear,
        Self::Step,
        Self::EaseInSine,
        Self::EaseOutSine,
        Self::EaseInOutSine,
        Self::EaseInQuad,
        Self::EaseOutQuad,
        Self::EaseInOutQuad,
        Self::EaseInCubic,
        Self::EaseOutCubic,
        Self::EaseInOutCubic,
        Self::EaseInQuart,
        Self::EaseOutQuart,
        Self::EaseInOutQuart,
        Self::EaseInQuint,
        Self::EaseOutQuint,
        Self::EaseInOutQuint,
        Self::EaseInExpo,
        Self::EaseOutExpo,
        Self::EaseInOutExpo,
        Self::EaseInCirc,
        Self::EaseOutCirc,
        Self::EaseInOutCirc,
        Self::EaseInBack,
        Self::EaseOutBack,
        Self::EaseInOutBack,
        Self::EaseInElastic,
        Self::EaseOutElastic,
        Self::EaseInOutElastic,
        Self::EaseInBounce,
        Self::EaseOutBounce,
        Self::EaseInOutBounce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Step => "step",
            Self::EaseInSine => "easeInSine",
            Self::EaseOutSine => "easeOutSine",
            Self::EaseInOutSine => "easeInOutSine",
            Self::EaseInQuad => "easeInQuad",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOutQuad => "easeInOutQuad",
            Self::EaseInCubic => "easeInCubic",
            Self::EaseOutCubic => "easeOutCubic",
            Self::EaseInOutCubic => "easeInOutCubic",
            Self::EaseInQuart => "easeInQuart",
            Self::EaseOutQuart => "easeOutQuart",
            Self::EaseInOutQuart => "easeInOutQuart",
            Self::EaseInQuint => "easeInQuint",
            Self::EaseOutQuint => "easeOutQuint",
            Self::EaseInOutQuint => "easeInOutQuint",
            Self::EaseInExpo => "easeInExpo",
            Self::EaseOutExpo => "easeOutExpo",
            Self::EaseInOutExpo => "easeInOutExpo",
            Self::EaseInCirc => "easeInCirc",
            Self::EaseOutCirc => "easeOutCirc",
            Self::EaseInOutCirc => "easeInOutCirc",
            Self::EaseInBack => "easeInBack",
            Self::EaseOutBack => "easeOutBack",
            Self::EaseInOutBack => "easeInOutBack",
            Self::EaseInElastic => "easeInElastic",
            Self::EaseOutElastic => "easeOutElastic",
            Self::EaseInOutElastic => "easeInOutElastic",
            Self::EaseInBounce => "easeInBounce",
            Self::EaseOutBounce => "easeOutBounce",
            Self::EaseInOutBounce => "easeInOutBounce",
        }
    }

    /// Accepts both `easeInOutSine` and `ease_in_out_sine`, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.replace('_', "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|easing| easing.name().to_ascii_lowercase() == wanted)
    }

    fn parts(self) -> Option<(Shape, Direction)> {
        use Direction::*;
        use Shape::*;
        let parts = match self {
            Self::Linear | Self::Step => return None,
            Self::EaseInSine => (Sine, In),
            Self::EaseOutSine => (Sine, Out),
            Self::EaseInOutSine => (Sine, InOut),
            Self::EaseInQuad => (Quad, In),
            Self::EaseOutQuad => (Quad, Out),
            Self::EaseInOutQuad => (Quad, InOut),
            Self::EaseInCubic => (Cubic, In),
            Self::EaseOutCubic => (Cubic, Out),
            Self::EaseInOutCubic => (Cubic, InOut),
            Self::EaseInQuart => (Quart, In),
            Self::EaseOutQuart => (Quart, Out),
            Self::EaseInOutQuart => (Quart, InOut),
            Self::EaseInQuint => (Quint, In),
            Self::EaseOutQuint => (Quint, Out),
            Self::EaseInOutQuint => (Quint, InOut),
            Self::EaseInExpo => (Expo, In),
            Self::EaseOutExpo => (Expo, Out),
            Self::EaseInOutExpo => (Expo, InOut),
            Self::EaseInCirc => (Circ, In),
            Self::EaseOutCirc => (Circ, Out),
            Self::EaseInOutCirc => (Circ, InOut),
            Self::EaseInBack => (Back, In),
            Self::EaseOutBack => (Back, Out),
            Self::EaseInOutBack => (Back, InOut),
            Self::EaseInElastic => (Elastic, In),
            Self::EaseOutElastic => (Elastic, Out),
            Self::EaseInOutElastic => (Elastic, InOut),
            Self::EaseInBounce => (Bounce, In),
            Self::EaseOutBounce => (Bounce, Out),
            Self::EaseInOutBounce => (Bounce, InOut),
        };
        Some(parts)
    }

    /// Maps progress in `[0, 1]` to eased progress. `arg` parameterizes `Step` (step count),
    /// `*Back` (overshoot), `*Elastic` and `*Bounce` (bounciness).
    pub fn ease(self, progress: f64, arg: Option<f64>) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Step => {
                let steps = arg.unwrap_or(DEFAULT_STEPS).floor().max(1.0);
                if t >= 1.0 { 1.0 } else { (t * steps).floor() / steps }
            }
            _ => match self.parts() {
                Some((shape, Direction::In)) => shape.ease_in(t, arg),
                Some((shape, Direction::Out)) => 1.0 - shape.ease_in(1.0 - t, arg),
                Some((shape, Direction::InOut)) => {
                    if t < 0.5 {
                        shape.ease_in(t * 2.0, arg) / 2.0
                    } else {
                        1.0 - shape.ease_in((1.0 - t) * 2.0, arg) / 2.0
                    }
                }
                None => t,
            },
        }
    }

    /// Interpolates `point`, using `easing_override` in place of the point's own easing
    /// when one is given.
    pub fn lerp_with_override(point: &AnimationPoint, easing_override: Option<EasingType>) -> f64 {
        let (easing, arg) = match easing_override {
            Some(easing) => (easing, None),
            None => (point.easing, point.easing_arg),
        };
        if point.duration <= 0.0 || point.elapsed >= point.duration {
            return point.end;
        }
        if point.elapsed <= 0.0 {
            return point.start;
        }
        let progress = (point.elapsed / point.duration).clamp(0.0, 1.0);
        lerp(point.start, point.end, easing.ease(progress, arg))
    }
}

impl Shape {
    fn ease_in(self, t: f64, arg: Option<f64>) -> f64 {
        match self {
            Self::Sine => 1.0 - (t * PI / 2.0).cos(),
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Quart => t.powi(4),
            Self::Quint => t.powi(5),
            Self::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Back => {
                let n = arg.unwrap_or(DEFAULT_BACK_OVERSHOOT);
                t * t * ((n + 1.0) * t - n)
            }
            Self::Elastic => {
                let n = arg.unwrap_or(DEFAULT_ELASTIC_BOUNCINESS);
                1.0 - (t * PI / 2.0).cos().powi(3) * (t * n * PI).cos()
            }
            Self::Bounce => 1.0 - bounce_out(1.0 - t, arg.unwrap_or(DEFAULT_BOUNCE_BOUNCINESS)),
        }
    }
}

/// Piecewise parabolas touching 1 at each bounce; `k` scales the rebound height.
fn bounce_out(x: f64, k: f64) -> f64 {
    let first = (121.0 / 16.0) * x * x;
    let second = (121.0 / 4.0) * k * (x - 6.0 / 11.0).powi(2) + 1.0 - k;
    let third = 121.0 * k * k * (x - 9.0 / 11.0).powi(2) + 1.0 - k * k;
    let fourth = 484.0 * k * k * k * (x - 10.5 / 11.0).powi(2) + 1.0 - k * k * k;
    first.min(second).min(third.min(fourth))
}

/// `lerp(a, b, 0) == a` and `lerp(a, b, 1) == b` exactly.
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    if t == 1.0 {
        return end;
    }
    start + (end - start) * t
}
