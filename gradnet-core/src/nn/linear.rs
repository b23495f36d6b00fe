//! Linear transforms, including the tied-weight transposed variant.

use crate::error::GradNetError;
use crate::nn::module::ParameterList;
use crate::nn::parameterized::{Gradient, Op, ParameterBundle, ParameterizedModule};
use crate::shape::Shape;
use crate::types::Matrix;
use crate::variable::Variable;

/// Parameter bundle of a linear transform: a `input x output` weight matrix
/// and an output-sized bias vector. The same bundle type doubles as the
/// gradient accumulator.
#[derive(Debug, Clone)]
pub struct LinearParams {
    pub weight: Variable,
    pub bias: Variable,
}

impl LinearParams {
    /// Uniformly-initialized parameters for an `input -> output` transform.
    pub fn with_extent(input: usize, output: usize) -> Self {
        LinearParams {
            weight: Variable::rand(Shape::Matrix(input, output)),
            bias: Variable::rand(Shape::Vector(output)),
        }
    }

    /// Zero-filled storage of the same extents, for gradient accumulation.
    pub fn zeros(input: usize, output: usize) -> Self {
        LinearParams {
            weight: Variable::zeros(Shape::Matrix(input, output)),
            bias: Variable::zeros(Shape::Vector(output)),
        }
    }

    /// Wraps existing storage handles. Sharing a handle here is how weights
    /// get tied across modules.
    pub fn new(weight: Variable, bias: Variable) -> Self {
        LinearParams { weight, bias }
    }

    /// Extent of the input axis (weight rows).
    pub fn input_extent(&self) -> usize {
        self.weight.shape().rows()
    }

    /// Extent of the output axis (weight columns).
    pub fn output_extent(&self) -> usize {
        self.weight.shape().cols()
    }
}

impl ParameterBundle for LinearParams {
    fn flatten(&self) -> ParameterList {
        ParameterList::from_views(vec![self.weight.share(), self.bias.share()])
    }

    fn clear(&self) {
        self.weight.zero();
        self.bias.zero();
    }
}

/// Forward operator `output = weight^T * input + bias`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearOp;

impl Op for LinearOp {
    type Params = LinearParams;

    fn apply(
        &self,
        params: &LinearParams,
        input: &Matrix,
        output: &mut Matrix,
    ) -> Result<(), GradNetError> {
        *output = params
            .weight
            .read()
            .tr_matmul(input)?
            .add(&params.bias.read())?;
        Ok(())
    }
}

/// Backward operator of [`LinearOp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearGradient;

impl Gradient for LinearGradient {
    type Op = LinearOp;

    fn apply(
        &self,
        params: &LinearParams,
        grad_params: &LinearParams,
        input: &Matrix,
        _output: &Matrix,
        grad_output: &Matrix,
        grad_input: &mut Matrix,
    ) -> Result<(), GradNetError> {
        grad_params
            .weight
            .write()
            .accumulate(&input.matmul_tr(grad_output)?)?;
        grad_params.bias.write().accumulate(grad_output)?;
        grad_input.accumulate(&params.weight.read().matmul(grad_output)?)?;
        Ok(())
    }
}

/// A fully-connected layer over column vectors.
pub type LinearModule = ParameterizedModule<LinearOp, LinearGradient>;

impl LinearModule {
    /// A fresh `input -> output` layer with uniform random parameters.
    pub fn new(input: usize, output: usize) -> Self {
        Self::assemble(
            LinearOp,
            LinearGradient,
            LinearParams::with_extent(input, output),
            LinearParams::zeros(input, output),
            Shape::Vector(input),
            Shape::Vector(output),
        )
    }

    /// Builds a layer over caller-provided bundles, e.g. to alias another
    /// module's storage.
    ///
    /// # Errors
    /// [`GradNetError::AliasShapeMismatch`] if the bias extent disagrees with
    /// the weight's output axis, or the bundles disagree with each other.
    pub fn from_bundles(
        params: LinearParams,
        grad_params: LinearParams,
    ) -> Result<Self, GradNetError> {
        let output = params.output_extent();
        if !params.bias.shape().matches(&Shape::Vector(output)) {
            return Err(GradNetError::AliasShapeMismatch {
                existing: params.bias.shape(),
                requested: Shape::Vector(output),
            });
        }
        let input = params.input_extent();
        Self::from_parts(
            LinearOp,
            LinearGradient,
            params,
            grad_params,
            Shape::Vector(input),
            Shape::Vector(output),
        )
    }
}

/// Forward operator `output = weight * input + bias`, the transpose-dual of
/// [`LinearOp`]. Used with a weight shared from a `LinearModule` it realizes
/// a tied-weight decoder; only the bias is separate storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransposedLinearOp;

impl Op for TransposedLinearOp {
    type Params = LinearParams;

    fn apply(
        &self,
        params: &LinearParams,
        input: &Matrix,
        output: &mut Matrix,
    ) -> Result<(), GradNetError> {
        *output = params
            .weight
            .read()
            .matmul(input)?
            .add(&params.bias.read())?;
        Ok(())
    }
}

/// Backward operator of [`TransposedLinearOp`]: the matrix-transpose dual of
/// [`LinearGradient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransposedLinearGradient;

impl Gradient for TransposedLinearGradient {
    type Op = TransposedLinearOp;

    fn apply(
        &self,
        params: &LinearParams,
        grad_params: &LinearParams,
        input: &Matrix,
        _output: &Matrix,
        grad_output: &Matrix,
        grad_input: &mut Matrix,
    ) -> Result<(), GradNetError> {
        // (input * grad_output^T)^T, written without the outer transpose
        grad_params
            .weight
            .write()
            .accumulate(&grad_output.matmul_tr(input)?)?;
        grad_params.bias.write().accumulate(grad_output)?;
        grad_input.accumulate(&params.weight.read().tr_matmul(grad_output)?)?;
        Ok(())
    }
}

/// A linear layer running a (possibly shared) weight in the transposed
/// direction: maps the owning layer's output extent back to its input extent.
pub type TransposedLinearModule = ParameterizedModule<TransposedLinearOp, TransposedLinearGradient>;

impl TransposedLinearModule {
    /// A decoder tied to `encoder`: aliases the encoder's weight storage and
    /// gradient-weight storage (no copies), with a fresh bias sized to the
    /// decoder output.
    pub fn tied(encoder: &LinearModule) -> Self {
        let weight = encoder.params().weight.share();
        let grad_weight = encoder.grad_params().weight.share();
        let decoder_output = weight.shape().rows();
        let decoder_input = weight.shape().cols();
        Self::assemble(
            TransposedLinearOp,
            TransposedLinearGradient,
            LinearParams::new(weight, Variable::rand(Shape::Vector(decoder_output))),
            LinearParams::new(grad_weight, Variable::zeros(Shape::Vector(decoder_output))),
            Shape::Vector(decoder_input),
            Shape::Vector(decoder_output),
        )
    }

    /// Builds a transposed layer over caller-provided bundles.
    ///
    /// # Errors
    /// [`GradNetError::AliasShapeMismatch`] if the bias extent disagrees with
    /// the weight's input axis, or the bundles disagree with each other.
    pub fn from_bundles(
        params: LinearParams,
        grad_params: LinearParams,
    ) -> Result<Self, GradNetError> {
        let output = params.input_extent();
        if !params.bias.shape().matches(&Shape::Vector(output)) {
            return Err(GradNetError::AliasShapeMismatch {
                existing: params.bias.shape(),
                requested: Shape::Vector(output),
            });
        }
        let input = params.output_extent();
        Self::from_parts(
            TransposedLinearOp,
            TransposedLinearGradient,
            params,
            grad_params,
            Shape::Vector(input),
            Shape::Vector(output),
        )
    }
}
