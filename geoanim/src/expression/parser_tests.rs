use super::{Expression, FunctionRegistry, VariableScope};
use crate::Error;

fn assert_approx(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-9,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn eval(source: &str) -> f64 {
    let mut scope = VariableScope::new();
    Expression::parse(source, &mut scope, &FunctionRegistry::new())
        .unwrap()
        .evaluate()
}

#[test]
fn arithmetic_precedence() {
    assert_approx(eval("1 + 2 * 3"), 7.0);
    assert_approx(eval("(1 + 2) * 3"), 9.0);
    assert_approx(eval("10 - 4 - 3"), 3.0);
    assert_approx(eval("2 ^ 3 ^ 2"), 512.0);
    assert_approx(eval("7 % 4"), 3.0);
    assert_approx(eval("-3 + 5"), 2.0);
    assert_approx(eval(".5 * 4"), 2.0);
    assert_approx(eval("0.25f * 8"), 2.0);
}

#[test]
fn comparisons_and_logic_yield_zero_or_one() {
    assert_approx(eval("3 > 2"), 1.0);
    assert_approx(eval("3 <= 2"), 0.0);
    assert_approx(eval("1 == 1 && 2 != 3"), 1.0);
    assert_approx(eval("0 || 0"), 0.0);
    assert_approx(eval("!0"), 1.0);
    assert_approx(eval("!5"), 0.0);
}

#[test]
fn ternary_binds_loosest_and_nests_to_the_right() {
    assert_approx(eval("1 > 2 ? 10 : 20"), 20.0);
    assert_approx(eval("0 ? 1 : 0 ? 2 : 3"), 3.0);
    assert_approx(eval("1 ? 2 + 3 : 4"), 5.0);
}

#[test]
fn functions_and_constants() {
    assert_approx(eval("math.clamp(15, 0, 10)"), 10.0);
    assert_approx(eval("Math.Max(2, math.abs(-7))"), 7.0);
    assert_approx(eval("math.cos(0) * math.pi"), std::f64::consts::PI);
    assert_approx(eval("math.lerp(0, 10, 0.25);"), 2.5);
}

#[test]
fn variables_are_bound_through_the_scope() {
    let mut scope = VariableScope::new();
    let registry = FunctionRegistry::new();
    let expression = Expression::parse(
        "query.ground_speed > 0 ? query.ground_speed * 2 : -1",
        &mut scope,
        &registry,
    )
    .unwrap();
    assert_approx(expression.evaluate(), -1.0);

    scope.set("query.ground_speed", 4.0);
    assert_approx(expression.evaluate(), 8.0);

    scope.set_supplier("query.ground_speed", || 0.5);
    assert_approx(expression.evaluate(), 1.0);
}

#[test]
fn variable_names_are_case_insensitive() {
    let mut scope = VariableScope::new();
    let registry = FunctionRegistry::new();
    let expression = Expression::parse("Query.Anim_Time", &mut scope, &registry).unwrap();
    scope.set("query.anim_time", 3.0);
    assert_approx(expression.evaluate(), 3.0);
}

#[test]
fn wrong_arity_is_reported_while_parsing() {
    let mut scope = VariableScope::new();
    let err = Expression::parse("math.pow(2)", &mut scope, &FunctionRegistry::new()).unwrap_err();
    assert!(matches!(err, Error::Arity { expected: 2, actual: 1, .. }));
}

#[test]
fn malformed_source_is_rejected() {
    let registry = FunctionRegistry::new();
    for source in ["1 +", "(1 + 2", "1 ? 2", "3 $ 4", "1 2", "math.min(1,)"] {
        let mut scope = VariableScope::new();
        let err = Expression::parse(source, &mut scope, &registry).unwrap_err();
        assert!(
            matches!(err, Error::ExpressionParse { .. }),
            "{source}: unexpected error {err:?}"
        );
    }
}

#[test]
fn variable_names_match_regardless_of_case() {
    let mut scope = VariableScope::new();
    let expression =
        Expression::parse("query.Speed * 2", &mut scope, &FunctionRegistry::new()).unwrap();
    scope.set("query.Speed", 3.0);
    assert_approx(expression.evaluate(), 6.0);
    scope.set("QUERY.SPEED", 4.0);
    assert_approx(expression.evaluate(), 8.0);
    assert_eq!(scope.len(), 1);
    assert_eq!(scope.get("query.speed").unwrap().name(), "query.speed");
}
