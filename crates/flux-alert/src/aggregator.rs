use crate::model::{Aggregate, Operator};

/// 对一组样本求值，返回 `(triggered, value)`
///
/// `all` 未全部满足时，代表值取自不满足的样本；其余情况取自全部样本。
/// 代表值对 `gt` 取最大，对 `lt` 取最小。调用方保证 `values` 非空。
pub fn compute(operator: Operator, aggregate: Aggregate, values: &[f64], threshold: f64) -> (bool, f64) {
    debug_assert!(!values.is_empty(), "compute called without samples");

    let mean;
    let values = if aggregate == Aggregate::Average {
        mean = [values.iter().sum::<f64>() / values.len() as f64];
        &mean[..]
    } else {
        values
    };

    let (triggered, candidates): (bool, Vec<f64>) = match aggregate {
        Aggregate::All => {
            let failing: Vec<f64> = values
                .iter()
                .copied()
                .filter(|v| !operator.matches(*v, threshold))
                .collect();
            if failing.is_empty() {
                (true, values.to_vec())
            } else {
                (false, failing)
            }
        }
        Aggregate::Any | Aggregate::Average => (
            values.iter().any(|v| operator.matches(*v, threshold)),
            values.to_vec(),
        ),
    };

    let value = match operator {
        Operator::Gt => candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Operator::Lt => candidates.iter().copied().fold(f64::INFINITY, f64::min),
    };

    (triggered, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Aggregate::*;
    use Operator::*;

    fn range10() -> Vec<f64> {
        (0..10).map(f64::from).collect()
    }

    #[test]
    fn test_all_passing_uses_full_set() {
        assert_eq!(compute(Gt, All, &[5.0, 6.0, 7.0], 4.0), (true, 7.0));
        assert_eq!(compute(Lt, All, &range10(), 30.0), (true, 0.0));
    }

    #[test]
    fn test_all_failing_surfaces_offending_sample() {
        assert_eq!(compute(Gt, All, &[3.0, 6.0, 7.0], 4.0), (false, 3.0));
        assert_eq!(compute(Gt, All, &range10(), 5.0), (false, 5.0));
        assert_eq!(compute(Gt, All, &range10(), 50.0), (false, 9.0));
        assert_eq!(compute(Lt, All, &range10(), 3.0), (false, 3.0));
        assert_eq!(compute(Lt, All, &range10(), -3.0), (false, 0.0));
    }

    #[test]
    fn test_any() {
        assert_eq!(compute(Lt, Any, &[10.0, 2.0, 9.0], 5.0), (true, 2.0));
        assert_eq!(compute(Gt, Any, &range10(), 5.0), (true, 9.0));
        assert_eq!(compute(Gt, Any, &range10(), 50.0), (false, 9.0));
        assert_eq!(compute(Lt, Any, &range10(), -3.0), (false, 0.0));
    }

    #[test]
    fn test_average_collapses_first() {
        assert_eq!(compute(Gt, Average, &[1.0, 2.0, 3.0], 1.5), (true, 2.0));
        assert_eq!(compute(Gt, Average, &range10(), 5.0), (false, 4.5));
        assert_eq!(compute(Gt, Average, &range10(), 3.0), (true, 4.5));
        assert_eq!(compute(Lt, Average, &range10(), 5.0), (true, 4.5));
        assert_eq!(compute(Lt, Average, &range10(), 3.0), (false, 4.5));
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(compute(Gt, All, &[1.0], 0.0), (true, 1.0));
        assert_eq!(compute(Lt, Any, &[1.0], 0.0), (false, 1.0));
    }
}
