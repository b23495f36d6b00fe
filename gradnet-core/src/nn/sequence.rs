//! Chaining composite: each child feeds the next.

use std::collections::HashMap;
use std::ops::Index;

use crate::error::GradNetError;
use crate::nn::module::{Differentiable, Forward, ParameterList};
use crate::shape::Shape;
use crate::types::Matrix;

/// An ordered chain of differentiable children.
///
/// `forward` threads child `k`'s output into child `k + 1`, caching every
/// intermediate output; `backward` walks the chain in reverse, feeding child
/// `k - 1`'s cached output as the `input` argument and finishing with the
/// true network input at the first child.
///
/// Children may be registered under names for sub-network introspection,
/// e.g. reading the "encoder" half of an autoencoder.
#[derive(Debug)]
pub struct SequenceModule {
    children: Vec<Box<dyn Differentiable>>,
    names: HashMap<String, usize>,
    outputs: Vec<Matrix>,
    grad_input: Matrix,
    input_shape: Shape,
    output_shape: Shape,
}

impl SequenceModule {
    /// Builds a chain from anonymous children.
    ///
    /// # Errors
    /// [`GradNetError::EmptyModuleList`] on an empty list;
    /// [`GradNetError::ShapeMismatch`] when a child's output extent differs
    /// from its successor's input extent.
    pub fn new(children: Vec<Box<dyn Differentiable>>) -> Result<Self, GradNetError> {
        Self::with_index(children, HashMap::new())
    }

    /// Builds a chain from `(name, child)` pairs; children stay addressable
    /// by name afterwards.
    pub fn with_names(
        children: Vec<(&str, Box<dyn Differentiable>)>,
    ) -> Result<Self, GradNetError> {
        let mut names = HashMap::new();
        let mut modules = Vec::with_capacity(children.len());
        for (index, (name, module)) in children.into_iter().enumerate() {
            if names.insert(name.to_string(), index).is_some() {
                return Err(GradNetError::InternalError(format!(
                    "duplicate child name {:?} in sequence",
                    name
                )));
            }
            modules.push(module);
        }
        Self::with_index(modules, names)
    }

    fn with_index(
        children: Vec<Box<dyn Differentiable>>,
        names: HashMap<String, usize>,
    ) -> Result<Self, GradNetError> {
        let first = children.first().ok_or(GradNetError::EmptyModuleList)?;
        let input_shape = first.input_shape();
        let output_shape = children[children.len() - 1].output_shape();
        for pair in children.windows(2) {
            if !pair[0].output_shape().matches(&pair[1].input_shape()) {
                return Err(GradNetError::ShapeMismatch {
                    expected: pair[1].input_shape(),
                    actual: pair[0].output_shape(),
                    operation: "SequenceModule construction".to_string(),
                });
            }
        }
        Ok(SequenceModule {
            outputs: Vec::with_capacity(children.len()),
            grad_input: Matrix::zeros_of(input_shape),
            children,
            names,
            input_shape,
            output_shape,
        })
    }

    /// Number of children in the chain.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Always false: construction rejects empty chains.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The child at `index`.
    pub fn child(&self, index: usize) -> Option<&(dyn Differentiable + 'static)> {
        self.children.get(index).map(|c| c.as_ref())
    }

    /// The child registered under `name`.
    pub fn child_by_name(&self, name: &str) -> Option<&(dyn Differentiable + 'static)> {
        self.names.get(name).and_then(|&index| self.child(index))
    }

    /// The cached output of the child at `index`, from the most recent
    /// forward pass.
    pub fn output_at(&self, index: usize) -> Option<&Matrix> {
        self.outputs.get(index)
    }

    /// The cached output of the child registered under `name`.
    pub fn output_by_name(&self, name: &str) -> Option<&Matrix> {
        self.names.get(name).and_then(|&index| self.output_at(index))
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

impl Index<usize> for SequenceModule {
    type Output = dyn Differentiable;

    /// Panics when `index` is out of range.
    fn index(&self, index: usize) -> &Self::Output {
        self.child(index).expect("sequence child index out of range")
    }
}

impl Index<&str> for SequenceModule {
    type Output = dyn Differentiable;

    /// Panics when no child was registered under `name`.
    fn index(&self, name: &str) -> &Self::Output {
        self.child_by_name(name)
            .expect("no sequence child registered under that name")
    }
}

impl Forward for SequenceModule {
    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "forward")?;
        self.outputs.clear();
        let mut current = input.clone();
        for child in self.children.iter_mut() {
            current = child.forward(&current)?;
            self.outputs.push(current.clone());
        }
        Ok(current)
    }
}

impl Differentiable for SequenceModule {
    fn backward(&mut self, input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "backward")?;
        if !grad_output.shape().matches(&self.output_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.output_shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }
        if self.outputs.len() != self.children.len() {
            return Err(GradNetError::InternalError(
                "SequenceModule::backward called before forward".to_string(),
            ));
        }

        // walk back to the second child on cached outputs, then hand the
        // true network input to the first child
        let mut ginput = grad_output.clone();
        for k in (1..self.children.len()).rev() {
            ginput = self.children[k].backward(&self.outputs[k - 1], &ginput)?;
        }
        ginput = self.children[0].backward(input, &ginput)?;

        self.grad_input.accumulate(&ginput)?;
        Ok(self.grad_input.clone())
    }

    fn clear(&mut self) {
        self.grad_input.zero();
        for child in self.children.iter_mut() {
            child.clear();
        }
    }

    fn flatten_parameters(&self) -> ParameterList {
        let mut params = ParameterList::new();
        for child in &self.children {
            params.extend(child.flatten_parameters());
        }
        params
    }

    fn flatten_deriv_parameters(&self) -> ParameterList {
        let mut params = ParameterList::new();
        for child in &self.children {
            params.extend(child.flatten_deriv_parameters());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::activation::SigmoidModule;
    use crate::nn::linear::LinearModule;

    #[test]
    fn test_shapes_follow_first_and_last_child() {
        let seq = SequenceModule::new(vec![
            Box::new(LinearModule::new(3, 5)),
            Box::new(SigmoidModule::new(5)),
        ])
        .unwrap();
        assert_eq!(seq.input_shape(), Shape::Vector(3));
        assert_eq!(seq.output_shape(), Shape::Vector(5));
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_construction_rejects_misfit_children() {
        let result = SequenceModule::new(vec![
            Box::new(LinearModule::new(3, 5)),
            Box::new(SigmoidModule::new(4)),
        ]);
        assert!(matches!(result, Err(GradNetError::ShapeMismatch { .. })));
        assert!(matches!(
            SequenceModule::new(vec![]),
            Err(GradNetError::EmptyModuleList)
        ));
    }

    #[test]
    fn test_named_lookup() {
        let seq = SequenceModule::with_names(vec![
            ("encoder", Box::new(LinearModule::new(3, 5)) as Box<dyn Differentiable>),
            ("squash", Box::new(SigmoidModule::new(5))),
        ])
        .unwrap();
        assert_eq!(seq.child_by_name("encoder").unwrap().output_shape(), Shape::Vector(5));
        assert!(seq.child_by_name("decoder").is_none());
        assert_eq!(seq["squash"].input_shape(), Shape::Vector(5));
        assert_eq!(seq[0usize].input_shape(), Shape::Vector(3));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = SequenceModule::with_names(vec![
            ("layer", Box::new(LinearModule::new(3, 5)) as Box<dyn Differentiable>),
            ("layer", Box::new(SigmoidModule::new(5))),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_forward_caches_sub_outputs() {
        let mut seq = SequenceModule::with_names(vec![
            ("encoder", Box::new(LinearModule::new(3, 5)) as Box<dyn Differentiable>),
            ("squash", Box::new(SigmoidModule::new(5))),
        ])
        .unwrap();
        let input = Matrix::vector(vec![0.1, 0.2, 0.3]);
        let output = seq.forward(&input).unwrap();
        assert_eq!(seq.output_by_name("squash").unwrap(), &output);
        assert_eq!(seq.output_by_name("encoder").unwrap().shape(), Shape::Vector(5));
    }

    #[test]
    fn test_backward_before_forward_is_an_error() {
        let mut seq = SequenceModule::new(vec![
            Box::new(LinearModule::new(2, 2)) as Box<dyn Differentiable>,
        ])
        .unwrap();
        let input = Matrix::vector(vec![1.0, 2.0]);
        let grad = Matrix::ones(2, 1);
        assert!(seq.backward(&input, &grad).is_err());
    }
}
