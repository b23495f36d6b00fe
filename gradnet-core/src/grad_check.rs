//! Numerical verification of analytical gradients via central differences.

use log::{debug, trace};
use thiserror::Error;

use crate::error::GradNetError;
use crate::nn::module::Differentiable;
use crate::types::{Matrix, Real};

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("gradient check requires a module with at least one learnable parameter")]
    EmptyParameterSet,

    #[error(
        "parameter list has {params} elements but gradient-parameter list has {derivs}; \
         the two traversals must pair 1:1"
    )]
    MismatchedParameterLists { params: usize, derivs: usize },

    #[error(
        "non-finite gradient at parameter element {element_index}: \
         numerical {numerical}, analytical {analytical}"
    )]
    NonFiniteGradient {
        element_index: usize,
        numerical: Real,
        analytical: Real,
    },

    #[error("evaluation failed during gradient check: {0}")]
    EvalError(GradNetError),
}

impl From<GradNetError> for GradCheckError {
    fn from(err: GradNetError) -> Self {
        GradCheckError::EvalError(err)
    }
}

/// Compares a module's accumulated analytical gradients against central
/// finite differences of the loss.
///
/// `eval` runs one full forward/loss/backward pass over `module` for the
/// given input and returns the scalar loss; the checker itself calls
/// [`Differentiable::clear`] before every evaluation, so `eval` must not.
///
/// The procedure: flatten both parameter traversals; run one clean
/// evaluation to accumulate the analytical gradient and copy it out; then,
/// for every scalar parameter element in traversal order, perturb by
/// `+epsilon` and `-epsilon` (restoring the original value in between and
/// afterwards), re-evaluate the loss each time, and record the absolute
/// discrepancy between `(f+ - f-) / (2 * epsilon)` and the analytical value.
///
/// Returns the ordered sequence of discrepancies, one per parameter element.
///
/// # Errors
/// [`GradCheckError::EmptyParameterSet`] when the module has no learnable
/// parameters — a check that can never fail is reported, not silently
/// passed. [`GradCheckError::NonFiniteGradient`] when either side of a
/// comparison is NaN or infinite.
pub fn check_gradient<M, F>(
    mut eval: F,
    module: &mut M,
    input: &Matrix,
    epsilon: Real,
) -> Result<Vec<Real>, GradCheckError>
where
    M: Differentiable + ?Sized,
    F: FnMut(&mut M, &Matrix) -> Result<Real, GradNetError>,
{
    let params = module.flatten_parameters();
    let dparams = module.flatten_deriv_parameters();
    if params.numel() == 0 {
        return Err(GradCheckError::EmptyParameterSet);
    }
    if params.numel() != dparams.numel() {
        return Err(GradCheckError::MismatchedParameterLists {
            params: params.numel(),
            derivs: dparams.numel(),
        });
    }

    // one clean pass to accumulate the analytical gradient, copied out so
    // the perturbation loop below cannot disturb it
    module.clear();
    eval(module, input)?;
    let analytical = dparams.to_vec();

    let mut discrepancies = Vec::with_capacity(analytical.len());
    for index in 0..params.numel() {
        let original = params.get(index)?;

        params.set(index, original + epsilon)?;
        module.clear();
        let loss_plus = eval(module, input)?;
        params.set(index, original)?;

        params.set(index, original - epsilon)?;
        module.clear();
        let loss_minus = eval(module, input)?;
        params.set(index, original)?;

        let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
        if !numerical.is_finite() || !analytical[index].is_finite() {
            return Err(GradCheckError::NonFiniteGradient {
                element_index: index,
                numerical,
                analytical: analytical[index],
            });
        }

        let discrepancy = (numerical - analytical[index]).abs();
        trace!(
            "grad check element {}: numerical {:e}, analytical {:e}, discrepancy {:e}",
            index,
            numerical,
            analytical[index],
            discrepancy
        );
        discrepancies.push(discrepancy);
    }

    let max = discrepancies.iter().cloned().fold(0.0, Real::max);
    debug!(
        "grad check complete: {} elements, max discrepancy {:e}",
        discrepancies.len(),
        max
    );
    Ok(discrepancies)
}
