//! Products, elementwise arithmetic and slicing for [`Mat`].

use crate::error::GradNetError;
use crate::shape::Shape;
use crate::types::Element;

use super::Mat;

impl<T: Element> Mat<T> {
    fn check_same_extent(&self, rhs: &Mat<T>, operation: &str) -> Result<(), GradNetError> {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            return Err(GradNetError::IncompatibleShapes {
                left: self.shape(),
                right: rhs.shape(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Matrix product `self * rhs`.
    pub fn matmul(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        if self.cols != rhs.rows {
            return Err(GradNetError::IncompatibleShapes {
                left: self.shape(),
                right: rhs.shape(),
                operation: "matmul".to_string(),
            });
        }
        let mut out = Mat::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == T::zero() {
                    continue;
                }
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a * rhs.data[k * rhs.cols + j];
                }
            }
        }
        Ok(out)
    }

    /// Transposed product `self^T * rhs`, without materializing the transpose.
    pub fn tr_matmul(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        if self.rows != rhs.rows {
            return Err(GradNetError::IncompatibleShapes {
                left: self.shape(),
                right: rhs.shape(),
                operation: "tr_matmul".to_string(),
            });
        }
        let mut out = Mat::zeros(self.cols, rhs.cols);
        for k in 0..self.rows {
            for i in 0..self.cols {
                let a = self.data[k * self.cols + i];
                if a == T::zero() {
                    continue;
                }
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a * rhs.data[k * rhs.cols + j];
                }
            }
        }
        Ok(out)
    }

    /// Product against a transposed right-hand side, `self * rhs^T`.
    pub fn matmul_tr(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        if self.cols != rhs.cols {
            return Err(GradNetError::IncompatibleShapes {
                left: self.shape(),
                right: rhs.shape(),
                operation: "matmul_tr".to_string(),
            });
        }
        let mut out = Mat::zeros(self.rows, rhs.rows);
        for i in 0..self.rows {
            for j in 0..rhs.rows {
                let mut acc = T::zero();
                for k in 0..self.cols {
                    acc += self.data[i * self.cols + k] * rhs.data[j * rhs.cols + k];
                }
                out.data[i * rhs.rows + j] = acc;
            }
        }
        Ok(out)
    }

    /// The transpose of this matrix.
    pub fn transpose(&self) -> Mat<T> {
        let mut out = Mat::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Elementwise sum.
    pub fn add(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        self.check_same_extent(rhs, "add")?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| a + b)
            .collect();
        Ok(Mat {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Elementwise difference.
    pub fn sub(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        self.check_same_extent(rhs, "sub")?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| a - b)
            .collect();
        Ok(Mat {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Mat<T>) -> Result<Mat<T>, GradNetError> {
        self.check_same_extent(rhs, "hadamard")?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| a * b)
            .collect();
        Ok(Mat {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Adds `rhs` into this matrix in place.
    pub fn accumulate(&mut self, rhs: &Mat<T>) -> Result<(), GradNetError> {
        self.check_same_extent(rhs, "accumulate")?;
        for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += b;
        }
        Ok(())
    }

    /// Adds `rhs` into the row band starting at `row_offset`. The band must
    /// lie entirely within this matrix and match `rhs`'s column count.
    pub fn accumulate_rows(&mut self, row_offset: usize, rhs: &Mat<T>) -> Result<(), GradNetError> {
        if rhs.cols != self.cols || row_offset + rhs.rows > self.rows {
            return Err(GradNetError::IncompatibleShapes {
                left: self.shape(),
                right: rhs.shape(),
                operation: format!("accumulate_rows(offset={})", row_offset),
            });
        }
        let start = row_offset * self.cols;
        for (a, &b) in self.data[start..start + rhs.data.len()]
            .iter_mut()
            .zip(rhs.data.iter())
        {
            *a += b;
        }
        Ok(())
    }

    /// Copies out the row band `[row_offset, row_offset + n_rows)`.
    pub fn row_range(&self, row_offset: usize, n_rows: usize) -> Result<Mat<T>, GradNetError> {
        if row_offset + n_rows > self.rows {
            return Err(GradNetError::IndexOutOfBounds {
                index: (row_offset + n_rows) * self.cols,
                len: self.data.len(),
            });
        }
        let start = row_offset * self.cols;
        let end = start + n_rows * self.cols;
        Ok(Mat {
            data: self.data[start..end].to_vec(),
            rows: n_rows,
            cols: self.cols,
        })
    }

    /// Stacks matrices along the primary axis, in order. All parts must share
    /// a column count.
    pub fn concat_rows(parts: &[Mat<T>]) -> Result<Mat<T>, GradNetError> {
        let first = parts.first().ok_or(GradNetError::EmptyMatrixList)?;
        let cols = first.cols;
        let mut rows = 0;
        let mut data = Vec::new();
        for part in parts {
            if part.cols != cols {
                return Err(GradNetError::IncompatibleShapes {
                    left: first.shape(),
                    right: part.shape(),
                    operation: "concat_rows".to_string(),
                });
            }
            rows += part.rows;
            data.extend_from_slice(&part.data);
        }
        Ok(Mat { data, rows, cols })
    }

    /// Reinterprets this matrix's elements, row-major, as `shape`.
    ///
    /// # Errors
    /// Returns [`GradNetError::InvalidReshape`] if element counts differ.
    pub fn reshaped(&self, shape: Shape) -> Result<Mat<T>, GradNetError> {
        if shape.numel() != self.numel() {
            return Err(GradNetError::InvalidReshape {
                from: self.shape(),
                to: shape,
            });
        }
        Ok(Mat {
            data: self.data.clone(),
            rows: shape.rows(),
            cols: shape.cols(),
        })
    }

    /// Applies `f` to every element, returning a new matrix.
    pub fn map<F: Fn(T) -> T>(&self, f: F) -> Mat<T> {
        Mat {
            data: self.data.iter().map(|&x| f(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Sum of all elements.
    pub fn sum(&self) -> T {
        self.data.iter().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul() {
        // [1 2 3; 4 5 6] * [10; 20; 30] = [140; 320]
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let x = Mat::vector(vec![10.0, 20.0, 30.0]);
        let y = a.matmul(&x).unwrap();
        assert_eq!(y.as_slice(), &[140.0, 320.0]);
        assert!(x.matmul(&a).is_err());
    }

    #[test]
    fn test_tr_matmul_matches_explicit_transpose() {
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2).unwrap();
        let x = Mat::vector(vec![10.0, 20.0, 30.0]);
        let fast = a.tr_matmul(&x).unwrap();
        let slow = a.transpose().matmul(&x).unwrap();
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_matmul_tr_matches_explicit_transpose() {
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Mat::from_vec(vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0], 3, 2).unwrap();
        let fast = a.matmul_tr(&b).unwrap();
        let slow = a.matmul(&b.transpose()).unwrap();
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_transpose() {
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), Shape::Matrix(3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_elementwise() {
        let a = Mat::vector(vec![1.0, 2.0, 3.0]);
        let b = Mat::vector(vec![4.0, 5.0, 6.0]);
        assert_eq!(a.add(&b).unwrap().as_slice(), &[5.0, 7.0, 9.0]);
        assert_eq!(b.sub(&a).unwrap().as_slice(), &[3.0, 3.0, 3.0]);
        assert_eq!(a.hadamard(&b).unwrap().as_slice(), &[4.0, 10.0, 18.0]);
        let c = Mat::vector(vec![1.0, 2.0]);
        assert!(a.add(&c).is_err());
    }

    #[test]
    fn test_accumulate() {
        let mut a = Mat::vector(vec![1.0, 1.0]);
        a.accumulate(&Mat::vector(vec![2.0, 3.0])).unwrap();
        assert_eq!(a.as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_row_slicing() {
        let a = Mat::vector(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let mid = a.row_range(1, 3).unwrap();
        assert_eq!(mid.as_slice(), &[1.0, 2.0, 3.0]);
        assert!(a.row_range(3, 3).is_err());

        let mut b = Mat::<f64>::zeros(5, 1);
        b.accumulate_rows(2, &Mat::vector(vec![1.0, 1.0])).unwrap();
        b.accumulate_rows(2, &Mat::vector(vec![1.0, 1.0])).unwrap();
        assert_eq!(b.as_slice(), &[0.0, 0.0, 2.0, 2.0, 0.0]);
        assert!(b.accumulate_rows(4, &Mat::vector(vec![1.0, 1.0])).is_err());
    }

    #[test]
    fn test_concat_rows() {
        let a = Mat::vector(vec![1.0, 2.0]);
        let b = Mat::vector(vec![3.0]);
        let joined = Mat::concat_rows(&[a, b]).unwrap();
        assert_eq!(joined.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(joined.shape(), Shape::Vector(3));
        assert!(Mat::<f64>::concat_rows(&[]).is_err());
    }

    #[test]
    fn test_reshaped() {
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let v = a.reshaped(Shape::Vector(6)).unwrap();
        assert_eq!(v.as_slice(), a.as_slice());
        assert_eq!(v.shape(), Shape::Vector(6));
        assert!(a.reshaped(Shape::Vector(5)).is_err());
        // round trip restores the original
        assert_eq!(v.reshaped(Shape::Matrix(2, 3)).unwrap(), a);
    }

    #[test]
    fn test_map_and_sum() {
        let a = Mat::vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.map(|x| x * 2.0).as_slice(), &[2.0, 4.0, 6.0]);
        assert_eq!(a.sum(), 6.0);
    }
}
