use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Expression;
use crate::Error;

/// Uniform random numbers in `[0, 1)` for the stochastic functions.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Draws from the thread-local generator of `rand`.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FunctionKind {
    Abs,
    Acos,
    Asin,
    Atan,
    Atan2,
    Ceil,
    Clamp,
    Cos,
    DieRoll,
    DieRollInteger,
    Exp,
    Floor,
    HermiteBlend,
    Lerp,
    LerpRotate,
    Ln,
    Max,
    Min,
    MinAngle,
    Mod,
    Pow,
    Random,
    RandomInteger,
    Round,
    Sin,
    Sqrt,
    Trunc,
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 27] = [
        Self::Abs,
        Self::Acos,
        Self::Asin,
        Self::Atan,
        Self::Atan2,
        Self::Ceil,
        Self::Clamp,
        Self::Cos,
        Self::DieRoll,
        Self::DieRollInteger,
        Self::Exp,
        Self::Floor,
        Self::HermiteBlend,
        Self::Lerp,
        Self::LerpRotate,
        Self::Ln,
        Self::Max,
        Self::Min,
        Self::MinAngle,
        Self::Mod,
        Self::Pow,
        Self::Random,
        Self::RandomInteger,
        Self::Round,
        Self::Sin,
        Self::Sqrt,
        Self::Trunc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Abs => "math.abs",
            Self::Acos => "math.acos",
            Self::Asin => "math.asin",
            Self::Atan => "math.atan",
            Self::Atan2 => "math.atan2",
            Self::Ceil => "math.ceil",
            Self::Clamp => "math.clamp",
            Self::Cos => "math.cos",
            Self::DieRoll => "math.die_roll",
            Self::DieRollInteger => "math.die_roll_integer",
            Self::Exp => "math.exp",
            Self::Floor => "math.floor",
            Self::HermiteBlend => "math.hermite_blend",
            Self::Lerp => "math.lerp",
            Self::LerpRotate => "math.lerprotate",
            Self::Ln => "math.ln",
            Self::Max => "math.max",
            Self::Min => "math.min",
            Self::MinAngle => "math.min_angle",
            Self::Mod => "math.mod",
            Self::Pow => "math.pow",
            Self::Random => "math.random",
            Self::RandomInteger => "math.random_integer",
            Self::Round => "math.round",
            Self::Sin => "math.sin",
            Self::Sqrt => "math.sqrt",
            Self::Trunc => "math.trunc",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Abs
            | Self::Acos
            | Self::Asin
            | Self::Atan
            | Self::Ceil
            | Self::Cos
            | Self::Exp
            | Self::Floor
            | Self::HermiteBlend
            | Self::Ln
            | Self::MinAngle
            | Self::Round
            | Self::Sin
            | Self::Sqrt
            | Self::Trunc => 1,
            Self::Atan2
            | Self::Max
            | Self::Min
            | Self::Mod
            | Self::Pow
            | Self::Random
            | Self::RandomInteger => 2,
            Self::Clamp | Self::DieRoll | Self::DieRollInteger | Self::Lerp | Self::LerpRotate => 3,
        }
    }

    pub fn is_stochastic(self) -> bool {
        matches!(
            self,
            Self::DieRoll | Self::DieRollInteger | Self::Random | Self::RandomInteger
        )
    }
}

/// A validated call: the argument count always matches the function's arity.
#[derive(Clone)]
pub struct Function {
    kind: FunctionKind,
    args: Vec<Expression>,
    random: Arc<dyn RandomSource>,
}

impl Function {
    pub fn new(
        kind: FunctionKind,
        args: Vec<Expression>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, Error> {
        if args.len() != kind.arity() {
            return Err(Error::Arity {
                function: kind.name().to_string(),
                expected: kind.arity(),
                actual: args.len(),
            });
        }
        Ok(Self { kind, args, random })
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    fn arg(&self, index: usize) -> f64 {
        self.args[index].evaluate()
    }

    pub fn evaluate(&self) -> f64 {
        match self.kind {
            FunctionKind::Abs => self.arg(0).abs(),
            FunctionKind::Acos => self.arg(0).acos().to_degrees(),
            FunctionKind::Asin => self.arg(0).asin().to_degrees(),
            FunctionKind::Atan => self.arg(0).atan().to_degrees(),
            FunctionKind::Atan2 => self.arg(0).atan2(self.arg(1)).to_degrees(),
            FunctionKind::Ceil => self.arg(0).ceil(),
            FunctionKind::Clamp => {
                let (value, min, max) = (self.arg(0), self.arg(1), self.arg(2));
                value.max(min).min(max)
            }
            FunctionKind::Cos => self.arg(0).to_radians().cos(),
            FunctionKind::DieRoll => self.roll(false),
            FunctionKind::DieRollInteger => self.roll(true),
            FunctionKind::Exp => self.arg(0).exp(),
            FunctionKind::Floor => self.arg(0).floor(),
            FunctionKind::HermiteBlend => {
                let t = self.arg(0);
                3.0 * t * t - 2.0 * t * t * t
            }
            FunctionKind::Lerp => lerp(self.arg(0), self.arg(1), self.arg(2)),
            FunctionKind::LerpRotate => {
                let (from, to, t) = (self.arg(0), self.arg(1), self.arg(2));
                let from = wrap_degrees(from);
                let to = wrap_degrees(to);
                let mut delta = to - from;
                if delta > 180.0 {
                    delta -= 360.0;
                } else if delta < -180.0 {
                    delta += 360.0;
                }
                from + delta * t
            }
            FunctionKind::Ln => self.arg(0).ln(),
            FunctionKind::Max => self.arg(0).max(self.arg(1)),
            FunctionKind::Min => self.arg(0).min(self.arg(1)),
            FunctionKind::MinAngle => wrap_degrees(self.arg(0)),
            FunctionKind::Mod => self.arg(0) % self.arg(1),
            FunctionKind::Pow => self.arg(0).powf(self.arg(1)),
            FunctionKind::Random => {
                let (low, high) = (self.arg(0), self.arg(1));
                low + self.random.next_f64() * (high - low)
            }
            FunctionKind::RandomInteger => {
                let (low, high) = (self.arg(0), self.arg(1));
                round_half_up(low + self.random.next_f64() * (high - low))
            }
            FunctionKind::Round => round_half_up(self.arg(0)),
            FunctionKind::Sin => self.arg(0).to_radians().sin(),
            FunctionKind::Sqrt => self.arg(0).sqrt(),
            FunctionKind::Trunc => self.arg(0).trunc(),
        }
    }

    /// Sums `arg0` independent draws in `[arg1, arg2)`, rounding each draw when `integer`.
    fn roll(&self, integer: bool) -> f64 {
        let count = self.arg(0);
        if !count.is_finite() {
            return 0.0;
        }
        let low = self.arg(1);
        let high = self.arg(2);
        let mut total = 0.0;
        let mut i = 0.0;
        while i < count {
            let draw = low + self.random.next_f64() * (high - low);
            total += if integer { round_half_up(draw) } else { draw };
            i += 1.0;
        }
        total
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("kind", &self.kind)
            .field("args", &self.args)
            .finish()
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Wraps an angle in degrees into `[-180, 180)`.
fn wrap_degrees(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Resolves function names to [`FunctionKind`]s and hands every built call the same
/// random source.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionKind>,
    random: Arc<dyn RandomSource>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::with_random(Arc::new(ThreadRandom))
    }

    pub fn with_random(random: Arc<dyn RandomSource>) -> Self {
        let functions = FunctionKind::ALL
            .iter()
            .map(|kind| (kind.name(), *kind))
            .collect();
        Self { functions, random }
    }

    pub fn lookup(&self, name: &str) -> Option<FunctionKind> {
        self.functions.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn build(&self, name: &str, args: Vec<Expression>) -> Result<Function, Error> {
        let kind = self.lookup(name).ok_or_else(|| Error::UnknownFunction {
            name: name.to_string(),
        })?;
        Function::new(kind, args, self.random.clone())
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .finish()
    }
}
