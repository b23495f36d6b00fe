//! Partitioning composite: each child consumes its own slice of the input.

use crate::error::GradNetError;
use crate::nn::module::{Differentiable, Forward, ParameterList};
use crate::shape::Shape;
use crate::types::Matrix;

/// Partitions its input into contiguous slices, one per child; each child
/// consumes only its slice, and the outputs are concatenated in child order.
///
/// `backward` partitions `grad_output` the same way, hands every child its
/// matching *input slice*, and writes each child's input gradient into the
/// corresponding disjoint slice of the overall `grad_input` — no summation,
/// because the slices never overlap.
#[derive(Debug)]
pub struct JoinModule {
    children: Vec<Box<dyn Differentiable>>,
    input_shape: Shape,
    output_shape: Shape,
    output: Matrix,
    grad_input: Matrix,
}

impl JoinModule {
    /// Builds the composite. The overall input extent is the sum of the
    /// children's input extents; likewise for outputs.
    ///
    /// # Errors
    /// [`GradNetError::EmptyModuleList`] on an empty list.
    pub fn new(children: Vec<Box<dyn Differentiable>>) -> Result<Self, GradNetError> {
        if children.is_empty() {
            return Err(GradNetError::EmptyModuleList);
        }
        // both axes are partitioned along the primary axis; children must
        // consume and produce vector extents
        for child in &children {
            for shape in [child.input_shape(), child.output_shape()] {
                if shape.canonical().dims() != 1 {
                    return Err(GradNetError::ShapeMismatch {
                        expected: Shape::Vector(shape.rows()),
                        actual: shape,
                        operation: "JoinModule construction".to_string(),
                    });
                }
            }
        }
        let input_total = children.iter().map(|c| c.input_shape().rows()).sum();
        let output_total = children.iter().map(|c| c.output_shape().rows()).sum();
        let input_shape = Shape::Vector(input_total);
        let output_shape = Shape::Vector(output_total);
        Ok(JoinModule {
            children,
            input_shape,
            output_shape,
            output: Matrix::zeros_of(output_shape),
            grad_input: Matrix::zeros_of(input_shape),
        })
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Always false: construction rejects empty child lists.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
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

impl Forward for JoinModule {
    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "forward")?;
        let mut parts = Vec::with_capacity(self.children.len());
        let mut offset = 0;
        for child in self.children.iter_mut() {
            let extent = child.input_shape().rows();
            let slice = input.row_range(offset, extent)?;
            parts.push(child.forward(&slice)?);
            offset += extent;
        }
        self.output = Matrix::concat_rows(&parts)?;
        Ok(self.output.clone())
    }
}

impl Differentiable for JoinModule {
    fn backward(&mut self, input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "backward")?;
        if !grad_output.shape().matches(&self.output_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.output_shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }

        let mut input_offset = 0;
        let mut output_offset = 0;
        for child in self.children.iter_mut() {
            let input_extent = child.input_shape().rows();
            let output_extent = child.output_shape().rows();
            let input_slice = input.row_range(input_offset, input_extent)?;
            let grad_slice = grad_output.row_range(output_offset, output_extent)?;
            let child_grad = child.backward(&input_slice, &grad_slice)?;
            self.grad_input
                .accumulate_rows(input_offset, &child_grad)?;
            input_offset += input_extent;
            output_offset += output_extent;
        }
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
