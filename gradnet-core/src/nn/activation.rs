//! Elementwise activation modules.

use crate::error::GradNetError;
use crate::nn::parameterized::{Gradient, NoParams, Op, ParameterizedModule};
use crate::shape::Shape;
use crate::types::{Matrix, Real};

/// Forward operator for the elementwise logistic function.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigmoidOp;

impl Op for SigmoidOp {
    type Params = NoParams;

    fn apply(
        &self,
        _params: &NoParams,
        input: &Matrix,
        output: &mut Matrix,
    ) -> Result<(), GradNetError> {
        *output = input.map(|x| 1.0 / (1.0 + (-x).exp()));
        Ok(())
    }
}

/// Backward operator of [`SigmoidOp`]: adds
/// `grad_output ⊙ output ⊙ (1 - output)` into `grad_input`, using the cached
/// forward output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigmoidGradient;

impl Gradient for SigmoidGradient {
    type Op = SigmoidOp;

    fn apply(
        &self,
        _params: &NoParams,
        _grad_params: &NoParams,
        _input: &Matrix,
        output: &Matrix,
        grad_output: &Matrix,
        grad_input: &mut Matrix,
    ) -> Result<(), GradNetError> {
        let one_minus = output.map(|y| 1.0 - y);
        grad_input.accumulate(&grad_output.hadamard(&one_minus)?.hadamard(output)?)?;
        Ok(())
    }
}

/// Elementwise logistic activation. Has no parameters; its flatten results
/// are empty.
pub type SigmoidModule = ParameterizedModule<SigmoidOp, SigmoidGradient>;

impl SigmoidModule {
    /// A sigmoid over length-`size` vectors.
    pub fn new(size: usize) -> Self {
        Self::with_shape(Shape::Vector(size))
    }

    /// A sigmoid over tensors of an arbitrary extent.
    pub fn with_shape(shape: Shape) -> Self {
        Self::assemble(SigmoidOp, SigmoidGradient, NoParams, NoParams, shape, shape)
    }
}

/// The logistic function on a scalar, exposed for loss and test code.
pub fn sigmoid(x: Real) -> Real {
    1.0 / (1.0 + (-x).exp())
}
