//! Ownership handles over mutable tensor storage.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::GradNetError;
use crate::shape::Shape;
use crate::types::{Matrix, Real};

/// An ownership handle around a mutable [`Matrix`] buffer.
///
/// `Variable` uses `Arc<RwLock<Matrix>>` internally so that:
/// 1. **Exclusive ownership** is the default: each constructor allocates a
///    fresh buffer that dies with its last handle.
/// 2. **Shared aliasing** via [`Variable::share`] hands out another handle to
///    the *same* buffer without copying element storage. Mutation through any
///    handle is immediately visible through every alias, and the buffer lives
///    as long as the longest-lived handle.
///
/// The shape is fixed when the storage is allocated; there is no reshape
/// operation on a `Variable`, so aliases can never disagree about extent.
pub struct Variable {
    storage: Arc<RwLock<Matrix>>,
    shape: Shape,
}

impl Variable {
    /// Allocates exclusively-owned, zero-filled storage of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Variable {
            storage: Arc::new(RwLock::new(Matrix::zeros_of(shape))),
            shape,
        }
    }

    /// Allocates exclusively-owned storage of uniform `[0, 1)` samples.
    pub fn rand(shape: Shape) -> Self {
        Variable {
            storage: Arc::new(RwLock::new(Matrix::rand_of(shape))),
            shape,
        }
    }

    /// Allocates exclusively-owned storage initialized from a copy of
    /// `value`. The new buffer does not alias `value`.
    pub fn from_matrix(value: &Matrix) -> Self {
        Variable {
            storage: Arc::new(RwLock::new(value.clone())),
            shape: value.shape(),
        }
    }

    /// Creates a new handle aliasing this Variable's storage.
    ///
    /// No element storage is allocated or copied; the returned handle and
    /// `self` observe each other's mutations immediately.
    pub fn share(&self) -> Variable {
        Variable {
            storage: Arc::clone(&self.storage),
            shape: self.shape,
        }
    }

    /// The shape the storage was allocated with.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Total number of scalar elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Acquires a read lock on the underlying matrix.
    ///
    /// Panics if the lock is poisoned.
    pub fn read(&self) -> RwLockReadGuard<'_, Matrix> {
        self.storage.read().expect("RwLock poisoned")
    }

    /// Acquires a write lock on the underlying matrix.
    ///
    /// Panics if the lock is poisoned.
    pub fn write(&self) -> RwLockWriteGuard<'_, Matrix> {
        self.storage.write().expect("RwLock poisoned")
    }

    /// Fills the storage with `value`, visible through every alias.
    pub fn fill(&self, value: Real) {
        self.write().fill(value);
    }

    /// Zeroes the storage.
    pub fn zero(&self) {
        self.write().zero();
    }

    /// Fills the storage with ones.
    pub fn ones(&self) {
        self.fill(1.0);
    }

    /// Writes the identity pattern into the storage.
    pub fn set_identity(&self) {
        self.write().set_identity();
    }

    /// Overwrites the storage with a copy of `value`.
    ///
    /// # Errors
    /// Returns [`GradNetError::ShapeMismatch`] if `value`'s extent differs
    /// from the allocated shape.
    pub fn assign(&self, value: &Matrix) -> Result<(), GradNetError> {
        if !value.shape().matches(&self.shape) {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape,
                actual: value.shape(),
                operation: "Variable::assign".to_string(),
            });
        }
        *self.write() = value.clone();
        Ok(())
    }

    /// Copies the current storage contents out into an owned matrix.
    pub fn to_matrix(&self) -> Matrix {
        self.read().clone()
    }

    /// Element at a linear (row-major) index.
    pub fn get(&self, index: usize) -> Result<Real, GradNetError> {
        self.read().get_linear(index)
    }

    /// Overwrites the element at a linear (row-major) index, visible through
    /// every alias.
    pub fn set(&self, index: usize, value: Real) -> Result<(), GradNetError> {
        self.write().set_linear(index, value)
    }

    /// True when `a` and `b` alias the same underlying buffer.
    pub fn same_storage(a: &Variable, b: &Variable) -> bool {
        Arc::ptr_eq(&a.storage, &b.storage)
    }
}

impl Clone for Variable {
    /// Cloning a `Variable` clones the handle, not the buffer: the clone
    /// aliases the same storage, exactly like [`Variable::share`].
    fn clone(&self) -> Self {
        self.share()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({}, {:?})", self.shape, self.read().as_slice())
    }
}
