//! Broadcasting composite: every child sees the same input.

use crate::error::GradNetError;
use crate::nn::module::{Differentiable, Forward, ParameterList};
use crate::shape::Shape;
use crate::types::Matrix;

/// Identity passthrough module: forwards its input and hands back its
/// gradient unchanged. Useful as a wiring element in concat and join
/// topologies when one slice of a tensor should flow through untouched.
#[derive(Debug)]
pub struct InputModule {
    shape: Shape,
    grad_input: Matrix,
}

impl InputModule {
    pub fn new(shape: Shape) -> Self {
        InputModule {
            shape,
            grad_input: Matrix::zeros_of(shape),
        }
    }
}

impl Forward for InputModule {
    fn input_shape(&self) -> Shape {
        self.shape
    }

    fn output_shape(&self) -> Shape {
        self.shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        if !input.shape().matches(&self.shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape,
                actual: input.shape(),
                operation: "forward".to_string(),
            });
        }
        Ok(input.clone())
    }
}

impl Differentiable for InputModule {
    fn backward(&mut self, _input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        if !grad_output.shape().matches(&self.shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }
        self.grad_input.accumulate(grad_output)?;
        Ok(self.grad_input.clone())
    }

    fn clear(&mut self) {
        self.grad_input.zero();
    }

    fn flatten_parameters(&self) -> ParameterList {
        ParameterList::new()
    }

    fn flatten_deriv_parameters(&self) -> ParameterList {
        ParameterList::new()
    }
}

/// Applies every child to the *same* input and concatenates their outputs
/// along the primary axis, in child order.
///
/// `backward` splits `grad_output` into contiguous slices matching each
/// child's output extent and *sums* the children's input gradients, since
/// every child saw the same input.
#[derive(Debug)]
pub struct ConcatModule {
    children: Vec<Box<dyn Differentiable>>,
    input_shape: Shape,
    output_shape: Shape,
    output: Matrix,
    grad_input: Matrix,
}

impl ConcatModule {
    /// Builds the composite.
    ///
    /// # Errors
    /// [`GradNetError::EmptyModuleList`] on an empty list;
    /// [`GradNetError::IncompatibleShapes`] when the children disagree on
    /// their input extent.
    pub fn new(children: Vec<Box<dyn Differentiable>>) -> Result<Self, GradNetError> {
        let first = children.first().ok_or(GradNetError::EmptyModuleList)?;
        let input_shape = first.input_shape();
        let mut total = 0;
        for child in &children {
            if !child.input_shape().matches(&input_shape) {
                return Err(GradNetError::IncompatibleShapes {
                    left: input_shape,
                    right: child.input_shape(),
                    operation: "ConcatModule construction".to_string(),
                });
            }
            // outputs are concatenated along the primary axis; children must
            // produce vector extents
            let output = child.output_shape();
            if output.canonical().dims() != 1 {
                return Err(GradNetError::ShapeMismatch {
                    expected: Shape::Vector(output.rows()),
                    actual: output,
                    operation: "ConcatModule construction".to_string(),
                });
            }
            total += output.rows();
        }
        let output_shape = Shape::Vector(total);
        Ok(ConcatModule {
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

impl Forward for ConcatModule {
    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "forward")?;
        let mut parts = Vec::with_capacity(self.children.len());
        for child in self.children.iter_mut() {
            parts.push(child.forward(input)?);
        }
        self.output = Matrix::concat_rows(&parts)?;
        Ok(self.output.clone())
    }
}

impl Differentiable for ConcatModule {
    fn backward(&mut self, input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        self.check_input(input, "backward")?;
        if !grad_output.shape().matches(&self.output_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.output_shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }

        let mut offset = 0;
        for child in self.children.iter_mut() {
            let extent = child.output_shape().rows();
            let slice = grad_output.row_range(offset, extent)?;
            let child_grad = child.backward(input, &slice)?;
            self.grad_input.accumulate(&child_grad)?;
            offset += extent;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::Mat;
    use crate::nn::linear::LinearModule;
    use crate::utils::testing::check_matrix_near;

    fn block_identity(rows: usize, cols: usize, row_offset: usize) -> Mat<f64> {
        let mut m = Mat::zeros(rows, cols);
        for j in 0..cols {
            m.set(row_offset + j, j, 1.0).unwrap();
        }
        m
    }

    #[test]
    fn test_output_extent_is_sum_of_children() {
        let concat = ConcatModule::new(vec![
            Box::new(LinearModule::new(10, 5)) as Box<dyn Differentiable>,
            Box::new(LinearModule::new(10, 5)),
        ])
        .unwrap();
        assert_eq!(concat.input_shape(), Shape::Vector(10));
        assert_eq!(concat.output_shape(), Shape::Vector(10));
    }

    #[test]
    fn test_construction_rejects_disagreeing_inputs() {
        let result = ConcatModule::new(vec![
            Box::new(LinearModule::new(10, 5)) as Box<dyn Differentiable>,
            Box::new(LinearModule::new(9, 5)),
        ]);
        assert!(matches!(
            result,
            Err(GradNetError::IncompatibleShapes { .. })
        ));
    }

    #[test]
    fn test_identity_decomposition() {
        // two complementary block-identity weights recombine the input
        let linear1 = LinearModule::new(10, 5);
        linear1.params().weight.assign(&block_identity(10, 5, 0)).unwrap();
        linear1.params().bias.zero();

        let linear2 = LinearModule::new(10, 5);
        linear2.params().weight.assign(&block_identity(10, 5, 5)).unwrap();
        linear2.params().bias.zero();

        let mut concat =
            ConcatModule::new(vec![Box::new(linear1), Box::new(linear2)]).unwrap();

        let input =
            Matrix::vector(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let output = concat.forward(&input).unwrap();
        check_matrix_near(&output, input.as_slice(), 1e-12);
    }

    #[test]
    fn test_backward_sums_child_contributions() {
        let linear1 = LinearModule::new(10, 5);
        linear1.params().weight.set_identity();
        linear1.params().bias.zero();
        let linear2 = LinearModule::new(10, 5);
        linear2.params().weight.set_identity();
        linear2.params().bias.zero();

        let mut concat =
            ConcatModule::new(vec![Box::new(linear1), Box::new(linear2)]).unwrap();
        concat.clear();

        let input =
            Matrix::vector(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        concat.forward(&input).unwrap();
        let grad_input = concat.backward(&input, &Matrix::ones(10, 1)).unwrap();
        check_matrix_near(
            &grad_input,
            &[2.0, 2.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            1e-12,
        );
    }

    #[test]
    fn test_input_module_round_trip() {
        let mut passthrough = InputModule::new(Shape::Vector(3));
        let input = Matrix::vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(passthrough.forward(&input).unwrap(), input);
        let grad = passthrough.backward(&input, &Matrix::ones(3, 1)).unwrap();
        check_matrix_near(&grad, &[1.0, 1.0, 1.0], 1e-12);
        assert!(passthrough.flatten_parameters().is_empty());
    }
}
