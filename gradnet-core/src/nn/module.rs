//! The forward/backward module contract and the flattened parameter view.

use std::fmt::Debug;

use crate::error::GradNetError;
use crate::shape::Shape;
use crate::types::{Matrix, Real};
use crate::variable::Variable;

/// The base capability of every network component: a forward transform from
/// an input tensor to an output tensor with declared extents.
pub trait Forward: Debug + Send + Sync {
    /// The input extent this module accepts.
    fn input_shape(&self) -> Shape;

    /// The output extent this module produces.
    fn output_shape(&self) -> Shape;

    /// Performs a forward pass.
    ///
    /// The result is a pure function of the current parameters and `input`;
    /// the module fills an internally owned output buffer whose shape equals
    /// [`Forward::output_shape`] and returns a copy of it.
    ///
    /// # Errors
    /// [`GradNetError::ShapeMismatch`] if `input`'s extent differs from the
    /// declared input shape.
    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError>;
}

/// A [`Forward`] module that can also run the analytically-derived backward
/// transform, accumulating gradients.
pub trait Differentiable: Forward {
    /// Performs a backward pass.
    ///
    /// Given the same `input` used in the most recent forward pass and the
    /// gradient of the loss with respect to this module's output, this
    /// *accumulates* (adds, never overwrites) into the module's internal
    /// `grad_input` buffer and its gradient-parameter storage, and returns a
    /// copy of the accumulated `grad_input`. Accumulation is what lets a
    /// composite route several backward contributions into one upstream
    /// module.
    fn backward(&mut self, input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError>;

    /// Zeroes `grad_input` and the gradient-parameter storage. Call this
    /// before every training or checking pass; otherwise gradients from
    /// separate passes silently sum.
    fn clear(&mut self);

    /// The module's learnable parameters as an ordered list of storage
    /// views. Composites concatenate their children's lists in child order;
    /// storage aliased between children appears exactly once.
    fn flatten_parameters(&self) -> ParameterList;

    /// The gradient accumulators paired 1:1, in the same traversal order,
    /// with [`Differentiable::flatten_parameters`].
    fn flatten_deriv_parameters(&self) -> ParameterList;
}

/// An ordered sequence of views over parameter storage.
///
/// Each entry is a [`Variable`] handle (a view, not a copy). Scalar elements
/// are addressed across the whole list by a single linear index: view order,
/// then row-major element order within each view. The order is deterministic,
/// so element `i` of a module's parameter list always pairs with element `i`
/// of its gradient-parameter list.
///
/// Pushing a view whose storage is already present is a no-op: tied weights
/// are listed once, at the position of their first owner.
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    views: Vec<Variable>,
}

impl ParameterList {
    /// An empty list (the flatten result of parameter-free modules).
    pub fn new() -> Self {
        ParameterList { views: Vec::new() }
    }

    /// Builds a list from views, applying the aliased-storage dedup rule.
    pub fn from_views(views: Vec<Variable>) -> Self {
        let mut list = ParameterList::new();
        for view in views {
            list.push(view);
        }
        list
    }

    /// Appends a view unless its storage is already listed.
    pub fn push(&mut self, view: Variable) {
        if !self
            .views
            .iter()
            .any(|existing| Variable::same_storage(existing, &view))
        {
            self.views.push(view);
        }
    }

    /// Appends every view of `other`, applying the dedup rule.
    pub fn extend(&mut self, other: ParameterList) {
        for view in other.views {
            self.push(view);
        }
    }

    /// The ordered storage views.
    pub fn views(&self) -> &[Variable] {
        &self.views
    }

    /// Number of views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True when no storage is listed.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Total number of scalar elements across all views.
    pub fn numel(&self) -> usize {
        self.views.iter().map(|v| v.numel()).sum()
    }

    fn locate(&self, index: usize) -> Result<(usize, usize), GradNetError> {
        let mut remaining = index;
        for (slot, view) in self.views.iter().enumerate() {
            if remaining < view.numel() {
                return Ok((slot, remaining));
            }
            remaining -= view.numel();
        }
        Err(GradNetError::IndexOutOfBounds {
            index,
            len: self.numel(),
        })
    }

    /// Scalar element at the list-wide linear index.
    pub fn get(&self, index: usize) -> Result<Real, GradNetError> {
        let (slot, offset) = self.locate(index)?;
        self.views[slot].get(offset)
    }

    /// Overwrites the scalar element at the list-wide linear index, writing
    /// through to the live storage.
    pub fn set(&self, index: usize, value: Real) -> Result<(), GradNetError> {
        let (slot, offset) = self.locate(index)?;
        self.views[slot].set(offset, value)
    }

    /// Snapshots every element, in traversal order, into an owned vector.
    pub fn to_vec(&self) -> Vec<Real> {
        let mut out = Vec::with_capacity(self.numel());
        for view in &self.views {
            out.extend_from_slice(view.read().as_slice());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_indexing_spans_views() {
        let a = Variable::from_matrix(&Matrix::vector(vec![1.0, 2.0]));
        let b = Variable::from_matrix(&Matrix::vector(vec![3.0, 4.0, 5.0]));
        let list = ParameterList::from_views(vec![a, b]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.numel(), 5);
        assert_eq!(list.get(0).unwrap(), 1.0);
        assert_eq!(list.get(2).unwrap(), 3.0);
        assert_eq!(list.get(4).unwrap(), 5.0);
        assert!(list.get(5).is_err());
    }

    #[test]
    fn test_set_writes_through_to_storage() {
        let a = Variable::zeros(Shape::Vector(2));
        let list = ParameterList::from_views(vec![a.share()]);
        list.set(1, 7.0).unwrap();
        assert_eq!(a.get(1).unwrap(), 7.0);
    }

    #[test]
    fn test_snapshot_order() {
        let a = Variable::from_matrix(&Matrix::vector(vec![1.0, 2.0]));
        let b = Variable::from_matrix(&Matrix::vector(vec![3.0]));
        let list = ParameterList::from_views(vec![a, b]);
        assert_eq!(list.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_aliased_storage_listed_once() {
        let a = Variable::zeros(Shape::Vector(2));
        let tied = a.share();
        let b = Variable::zeros(Shape::Vector(3));
        let mut list = ParameterList::new();
        list.push(a);
        list.push(tied);
        list.push(b);
        assert_eq!(list.len(), 2);
        assert_eq!(list.numel(), 5);
    }

    #[test]
    fn test_extend_dedups_across_lists() {
        let a = Variable::zeros(Shape::Vector(2));
        let b = Variable::zeros(Shape::Vector(1));
        let first = ParameterList::from_views(vec![a.share(), b.share()]);
        let second = ParameterList::from_views(vec![a.share()]);
        let mut merged = ParameterList::new();
        merged.extend(first);
        merged.extend(second);
        assert_eq!(merged.len(), 2);
    }
}
