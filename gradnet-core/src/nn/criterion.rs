//! Terminal loss modules.

use crate::error::GradNetError;
use crate::types::{Matrix, Real};

/// A terminal loss: a scalar forward value and a gradient with respect to
/// the prediction. Loss modules are always the end of a network, so their
/// backward does not accumulate — it returns a fresh gradient each call.
pub trait Criterion {
    /// The scalar loss of `prediction` against `target`.
    fn forward(&self, prediction: &Matrix, target: &Matrix) -> Result<Real, GradNetError>;

    /// The gradient of the loss with respect to `prediction`.
    fn backward(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix, GradNetError>;
}

fn check_pair(
    prediction: &Matrix,
    target: &Matrix,
    operation: &str,
) -> Result<(), GradNetError> {
    if !prediction.shape().matches(&target.shape()) {
        return Err(GradNetError::ShapeMismatch {
            expected: target.shape(),
            actual: prediction.shape(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Forward operator of the squared-error loss: `0.5 * sum((p - t)^2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredErrorOp;

impl SquaredErrorOp {
    pub fn apply(&self, prediction: &Matrix, target: &Matrix) -> Result<Real, GradNetError> {
        let diff = prediction.sub(target)?;
        Ok(0.5 * diff.hadamard(&diff)?.sum())
    }
}

/// Gradient operator of the squared-error loss: `p - t`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredErrorGradient;

impl SquaredErrorGradient {
    pub fn apply(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix, GradNetError> {
        prediction.sub(target)
    }
}

/// The squared-error criterion, assembled from its op/gradient pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredErrorLoss {
    op: SquaredErrorOp,
    grad: SquaredErrorGradient,
}

impl SquaredErrorLoss {
    pub fn new() -> Self {
        SquaredErrorLoss {
            op: SquaredErrorOp,
            grad: SquaredErrorGradient,
        }
    }
}

impl Criterion for SquaredErrorLoss {
    fn forward(&self, prediction: &Matrix, target: &Matrix) -> Result<Real, GradNetError> {
        check_pair(prediction, target, "SquaredErrorLoss forward")?;
        self.op.apply(prediction, target)
    }

    fn backward(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix, GradNetError> {
        check_pair(prediction, target, "SquaredErrorLoss backward")?;
        self.grad.apply(prediction, target)
    }
}
