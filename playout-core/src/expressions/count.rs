use tracing::warn;

use super::{Scope, Value, evaluate};

/// Evaluates a `Multiple` count expression with `count` (the collection
/// size) and `random` (a value in `0..count`) in scope. Malformed
/// expressions log and yield 0; results are floored and never negative.
pub fn evaluate_count(expression: &str, count: usize, random: usize) -> usize {
    let mut scope = Scope::new();
    scope.insert("count", Value::Number(count as f64));
    scope.insert("random", Value::Number(random as f64));

    match evaluate(expression, &scope).and_then(|value| value.as_number()) {
        Ok(value) if value.is_finite() && value > 0.0 => value.floor() as usize,
        Ok(_) => 0,
        Err(error) => {
            warn!(%expression, %error, "Failed to evaluate count expression");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_variables() {
        assert_eq!(evaluate_count("count", 12, 3), 12);
        assert_eq!(evaluate_count("count / 2 + random", 12, 3), 9);
        assert_eq!(evaluate_count("random % 4 + 1", 12, 7), 4);
    }

    #[test]
    fn test_count_floors_and_clamps() {
        assert_eq!(evaluate_count("count / 5", 12, 0), 2);
        assert_eq!(evaluate_count("1 - count", 12, 0), 0);
        assert_eq!(evaluate_count("count > 3", 12, 0), 1);
    }

    #[test]
    fn test_malformed_count_is_zero() {
        assert_eq!(evaluate_count("count +", 12, 0), 0);
        assert_eq!(evaluate_count("count / 0", 12, 0), 0);
        assert_eq!(evaluate_count("episodes", 12, 0), 0);
    }
}
