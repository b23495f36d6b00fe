//! Shared helpers for unit and integration tests.

use approx::abs_diff_eq;

use crate::grad_check::check_gradient;
use crate::nn::criterion::{Criterion, SquaredErrorLoss};
use crate::nn::module::{Differentiable, Forward};
use crate::types::{Matrix, Real};

/// Euclidean distance between two matrices of the same extent.
pub fn distance(a: &Matrix, b: &Matrix) -> Real {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<Real>()
        .sqrt()
}

/// True when `a` and `b` share an extent and lie within `tolerance` of each
/// other, elementwise.
pub fn is_close(a: &Matrix, b: &Matrix, tolerance: Real) -> bool {
    a.shape().matches(&b.shape())
        && a.as_slice()
            .iter()
            .zip(b.as_slice())
            .all(|(&x, &y)| abs_diff_eq!(x, y, epsilon = tolerance))
}

/// Checks a matrix against expected row-major data within a tolerance.
/// Panics with the offending index on mismatch.
pub fn check_matrix_near(actual: &Matrix, expected: &[Real], tolerance: Real) {
    assert_eq!(
        actual.numel(),
        expected.len(),
        "element count mismatch: {} vs {}",
        actual.numel(),
        expected.len()
    );
    for (i, (a, e)) in actual.as_slice().iter().zip(expected.iter()).enumerate() {
        assert!(
            abs_diff_eq!(*a, *e, epsilon = tolerance),
            "element {} differs: actual {:?}, expected {:?}, tolerance {:?}",
            i,
            a,
            e,
            tolerance
        );
    }
}

/// Runs the gradient checker over `module` with a random input and a random
/// squared-error target, asserting every discrepancy stays below `tolerance`.
///
/// This is the standard harness the gradient test suites drive each module
/// kind through.
pub fn check_module_gradients(module: &mut dyn Differentiable, epsilon: Real, tolerance: Real) {
    let input = Matrix::rand_of(module.input_shape());
    let target = Matrix::rand_of(module.output_shape());
    let loss = SquaredErrorLoss::new();

    let discrepancies = check_gradient(
        |m, x| {
            let prediction = m.forward(x)?;
            let value = loss.forward(&prediction, &target)?;
            let grad = loss.backward(&prediction, &target)?;
            m.backward(x, &grad)?;
            Ok(value)
        },
        module,
        &input,
        epsilon,
    )
    .expect("gradient check failed to run");

    assert!(
        !discrepancies.is_empty(),
        "gradient check produced no discrepancies"
    );
    for (index, discrepancy) in discrepancies.iter().enumerate() {
        assert!(
            *discrepancy < tolerance,
            "parameter element {} disagrees with the numerical gradient: {:e} >= {:e}",
            index,
            discrepancy,
            tolerance
        );
    }
}
