//! Shape-reinterpreting composite.

use crate::error::GradNetError;
use crate::nn::module::{Differentiable, Forward, ParameterList};
use crate::shape::Shape;
use crate::types::Matrix;

/// Bijectively reinterprets tensors between two shapes with equal element
/// count, row-major. `backward` reinterprets `grad_output` back into the
/// input shape. No parameters.
#[derive(Debug)]
pub struct ReshapeModule {
    input_shape: Shape,
    output_shape: Shape,
    grad_input: Matrix,
}

impl ReshapeModule {
    /// Builds a reinterpretation between `input_shape` and `output_shape`.
    ///
    /// # Errors
    /// [`GradNetError::InvalidReshape`] when the element counts differ.
    pub fn new(input_shape: Shape, output_shape: Shape) -> Result<Self, GradNetError> {
        if input_shape.numel() != output_shape.numel() {
            return Err(GradNetError::InvalidReshape {
                from: input_shape,
                to: output_shape,
            });
        }
        Ok(ReshapeModule {
            input_shape,
            output_shape,
            grad_input: Matrix::zeros_of(input_shape),
        })
    }
}

impl Forward for ReshapeModule {
    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn forward(&mut self, input: &Matrix) -> Result<Matrix, GradNetError> {
        if !input.shape().matches(&self.input_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.input_shape,
                actual: input.shape(),
                operation: "forward".to_string(),
            });
        }
        input.reshaped(self.output_shape)
    }
}

impl Differentiable for ReshapeModule {
    fn backward(&mut self, _input: &Matrix, grad_output: &Matrix) -> Result<Matrix, GradNetError> {
        if !grad_output.shape().matches(&self.output_shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.output_shape,
                actual: grad_output.shape(),
                operation: "backward".to_string(),
            });
        }
        self.grad_input
            .accumulate(&grad_output.reshaped(self.input_shape)?)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::Mat;
    use crate::utils::testing::check_matrix_near;

    #[test]
    fn test_construction_validates_element_count() {
        assert!(ReshapeModule::new(Shape::Matrix(3, 3), Shape::Vector(9)).is_ok());
        assert!(matches!(
            ReshapeModule::new(Shape::Matrix(3, 3), Shape::Vector(8)),
            Err(GradNetError::InvalidReshape { .. })
        ));
    }

    #[test]
    fn test_forward_reinterprets_row_major() {
        let mut reshape = ReshapeModule::new(Shape::Matrix(2, 3), Shape::Vector(6)).unwrap();
        let input = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let output = reshape.forward(&input).unwrap();
        assert_eq!(output.shape(), Shape::Vector(6));
        check_matrix_near(&output, input.as_slice(), 1e-12);
    }

    #[test]
    fn test_backward_round_trips_gradient() {
        let mut reshape = ReshapeModule::new(Shape::Matrix(2, 2), Shape::Vector(4)).unwrap();
        reshape.clear();
        let input = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        reshape.forward(&input).unwrap();
        let grad = reshape
            .backward(&input, &Matrix::vector(vec![0.1, 0.2, 0.3, 0.4]))
            .unwrap();
        assert_eq!(grad.shape(), Shape::Matrix(2, 2));
        check_matrix_near(&grad, &[0.1, 0.2, 0.3, 0.4], 1e-12);
        assert!(reshape.flatten_parameters().is_empty());
    }
}
