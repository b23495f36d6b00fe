//! Generic combinator pairing a forward operator with its gradient operator.

use std::fmt::Debug;

use crate::error::GradNetError;
use crate::nn::module::{Differentiable, Forward, ParameterList};
use crate::shape::Shape;
use crate::types::Matrix;

/// A named set of parameter storage, plus the operations every bundle needs.
///
/// One bundle type serves both as the parameter set and as the matching
/// gradient-accumulator set of a [`ParameterizedModule`]; the two instances
/// must agree elementwise in shape. Mutation goes through the interior
/// mutability of the contained [`crate::variable::Variable`]s.
pub trait ParameterBundle: Debug + Send + Sync {
    /// The bundle's storage as an ordered list of views, field by field.
    fn flatten(&self) -> ParameterList;

    /// Zeroes every tensor in the bundle.
    fn clear(&self);
}

/// The empty bundle, for modules without learnable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl ParameterBundle for NoParams {
    fn flatten(&self) -> ParameterList {
        ParameterList::new()
    }

    fn clear(&self) {}
}

/// A stateless forward operator over a parameter bundle.
pub trait Op: Debug + Send + Sync {
    type Params: ParameterBundle;

    /// Computes `output` from the parameters and `input`. The output buffer
    /// arrives pre-sized to the module's declared output shape.
    fn apply(
        &self,
        params: &Self::Params,
        input: &Matrix,
        output: &mut Matrix,
    ) -> Result<(), GradNetError>;
}

/// The backward operator dual to an [`Op`].
pub trait Gradient: Debug + Send + Sync {
    type Op: Op;

    /// Adds this operator's contributions into `grad_params` and
    /// `grad_input`. `output` is the buffer the paired [`Op`] produced in the
    /// most recent forward pass (some gradients, like the logistic one, are
    /// cheapest in terms of the output).
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        params: &<Self::Op as Op>::Params,
        grad_params: &<Self::Op as Op>::Params,
        input: &Matrix,
        output: &Matrix,
        grad_output: &Matrix,
        grad_input: &mut Matrix,
    ) -> Result<(), GradNetError>;
}

/// Pairs a forward operator and its gradient operator with a parameter bundle
/// and a gradient-accumulator bundle of matching shape.
///
/// Concrete layers (`LinearModule`, `TransposedLinearModule`,
/// `SigmoidModule`) are instantiations of this combinator.
#[derive(Debug)]
pub struct ParameterizedModule<O: Op, G: Gradient<Op = O>> {
    op: O,
    grad: G,
    params: O::Params,
    grad_params: O::Params,
    output: Matrix,
    grad_input: Matrix,
    input_shape: Shape,
    output_shape: Shape,
}

impl<O: Op, G: Gradient<Op = O>> ParameterizedModule<O, G> {
    /// Assembles a module from its operators, bundles and declared shapes.
    ///
    /// # Errors
    /// [`GradNetError::AliasShapeMismatch`] if the gradient bundle's storage
    /// does not match the parameter bundle's, view for view.
    pub fn from_parts(
        op: O,
        grad: G,
        params: O::Params,
        grad_params: O::Params,
        input_shape: Shape,
        output_shape: Shape,
    ) -> Result<Self, GradNetError> {
        let flat = params.flatten();
        let dflat = grad_params.flatten();
        if flat.len() != dflat.len() {
            return Err(GradNetError::InternalError(format!(
                "parameter bundle has {} storages but gradient bundle has {}",
                flat.len(),
                dflat.len()
            )));
        }
        for (p, d) in flat.views().iter().zip(dflat.views()) {
            if !p.shape().matches(&d.shape()) {
                return Err(GradNetError::AliasShapeMismatch {
                    existing: p.shape(),
                    requested: d.shape(),
                });
            }
        }
        Ok(Self::assemble(
            op,
            grad,
            params,
            grad_params,
            input_shape,
            output_shape,
        ))
    }

    /// Assembles a module whose bundles are matched by construction (the
    /// concrete layer constructors). Zeroes the gradient bundle.
    pub(crate) fn assemble(
        op: O,
        grad: G,
        params: O::Params,
        grad_params: O::Params,
        input_shape: Shape,
        output_shape: Shape,
    ) -> Self {
        grad_params.clear();
        ParameterizedModule {
            op,
            grad,
            params,
            grad_params,
            output: Matrix::zeros_of(output_shape),
            grad_input: Matrix::zeros_of(input_shape),
            input_shape,
            output_shape,
        }
    }

    /// The parameter bundle.
    pub fn params(&self) -> &O::Params {
        &self.params
    }

    /// The gradient-accumulator bundle.
    pub fn grad_params(&self) -> &O::Params {
        &self.grad_params
    }

    /// The output buffer produced by the most recent forward pass.
    pub fn output(&self) -> &Matrix {
        &self.output
    }

    /// The accumulated input gradient.
    pub fn grad_input(&self) -> &Matrix {
        &self.grad_input
    }

    fn check_input(&self, input: &Matrix, operation: &str) -> Result<(), GradNetError> {
        if !input.shape().matches(&self.input_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.input_shape,
                actual: input.shape(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

impl<O: Op, G: Gradient<Op = O>> Forward for ParameterizedModule<O, G> {
    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "forward")?;
        self.op.apply(&self.params, input, &mut self.output)?;
        Ok(self.output.clone())
    }
}

impl<O: Op, G: Gradient<Op = O>> Differentiable for ParameterizedModule<O, G> {
    fn backward(&mut self, input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "backward")?;
        if !grad_output.shape().matches(&self.output_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.output_shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }
        self.grad.apply(
            &self.params,
            &self.grad_params,
            input,
            &self.output,
            grad_output,
            &mut self.grad_input,
        )?;
        Ok(self.grad_input.clone())
    }

    fn clear(&mut self) {
        self.grad_input.zero();
        self.grad_params.clear();
    }

    fn flatten_parameters(&self) -> ParameterList {
        self.params.flatten()
    }

    fn flatten_deriv_parameters(&self) -> ParameterList {
        self.grad_params.flatten()
    }
}
