//! Constructors for [`Mat`].

use rand::distributions::{Distribution, Standard};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::GradNetError;
use crate::shape::Shape;
use crate::types::Element;

use super::Mat;

impl<T: Element> Mat<T> {
    /// Creates a matrix from a row-major data vector.
    ///
    /// # Errors
    /// Returns [`GradNetError::MatrixCreationError`] if the data length does
    /// not match `rows * cols`.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self, GradNetError> {
        if data.len() != rows * cols {
            return Err(GradNetError::MatrixCreationError {
                data_len: data.len(),
                rows,
                cols,
            });
        }
        Ok(Mat { data, rows, cols })
    }

    /// Creates a matrix from a list of equal-length rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GradNetError> {
        if rows.is_empty() {
            return Err(GradNetError::EmptyMatrixList);
        }
        let n_rows = rows.len();
        let n_cols = rows[0].len();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(GradNetError::MatrixCreationError {
                    data_len: row.len(),
                    rows: 1,
                    cols: n_cols,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Mat {
            data,
            rows: n_rows,
            cols: n_cols,
        })
    }

    /// Creates a column vector (an `n x 1` matrix) from a data vector.
    pub fn vector(data: Vec<T>) -> Self {
        let rows = data.len();
        Mat {
            data,
            rows,
            cols: 1,
        }
    }

    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Mat {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
        }
    }

    /// A `rows x cols` matrix of ones.
    pub fn ones(rows: usize, cols: usize) -> Self {
        Mat {
            data: vec![T::one(); rows * cols],
            rows,
            cols,
        }
    }

    /// A `rows x cols` matrix filled with `value`.
    pub fn full(rows: usize, cols: usize, value: T) -> Self {
        Mat {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// The `rows x cols` identity pattern (short diagonal for non-square).
    pub fn eye(rows: usize, cols: usize) -> Self {
        let mut m = Self::zeros(rows, cols);
        m.set_identity();
        m
    }

    /// A zero matrix with the extent of `shape`.
    pub fn zeros_of(shape: Shape) -> Self {
        Self::zeros(shape.rows(), shape.cols())
    }
}

impl<T: Element> Mat<T>
where
    Standard: Distribution<T>,
{
    /// A matrix of uniform samples in `[0, 1)`.
    pub fn rand(rows: usize, cols: usize) -> Self {
        let mut rng = rand::thread_rng();
        let data: Vec<T> = (0..rows * cols).map(|_| rng.gen::<T>()).collect();
        Mat { data, rows, cols }
    }

    /// A uniform random matrix with the extent of `shape`.
    pub fn rand_of(shape: Shape) -> Self {
        Self::rand(shape.rows(), shape.cols())
    }
}

impl<T: Element> Mat<T>
where
    StandardNormal: Distribution<T>,
{
    /// A matrix of standard normal samples.
    pub fn randn(rows: usize, cols: usize) -> Self {
        let mut rng = rand::thread_rng();
        let data: Vec<T> = (0..rows * cols)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();
        Mat { data, rows, cols }
    }

    /// A standard normal random matrix with the extent of `shape`.
    pub fn randn_of(shape: Shape) -> Self {
        Self::randn(shape.rows(), shape.cols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_validates_length() {
        assert!(Mat::from_vec(vec![1.0, 2.0, 3.0], 2, 2).is_err());
        let m = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(m.at(1, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_from_rows() {
        let m = Mat::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.shape(), Shape::Matrix(2, 2));
        assert_eq!(m.at(0, 1).unwrap(), 2.0);
        assert!(Mat::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(Mat::<f64>::from_rows(vec![]).is_err());
    }

    #[test]
    fn test_vector() {
        let v = Mat::vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.shape(), Shape::Vector(3));
        assert_eq!(v.at(2, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_zeros_ones_full_eye() {
        assert!(Mat::<f64>::zeros(2, 3).is_zero());
        assert!(Mat::<f64>::ones(2, 3).as_slice().iter().all(|&x| x == 1.0));
        assert!(Mat::<f64>::full(1, 4, 7.0)
            .as_slice()
            .iter()
            .all(|&x| x == 7.0));
        let e = Mat::<f64>::eye(10, 5);
        assert_eq!(e.at(4, 4).unwrap(), 1.0);
        assert_eq!(e.at(5, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_random_shapes() {
        let r = Mat::<f64>::rand_of(Shape::Vector(6));
        assert_eq!(r.shape(), Shape::Vector(6));
        assert!(r.as_slice().iter().all(|&x| (0.0..1.0).contains(&x)));
        let n = Mat::<f64>::randn_of(Shape::Matrix(2, 2));
        assert_eq!(n.shape(), Shape::Matrix(2, 2));
    }
}
