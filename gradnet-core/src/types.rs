use std::fmt::Debug;
use std::iter::Sum;

use num_traits::{Float, NumAssign};

/// Trait bound for the scalar element type of a dense matrix.
///
/// Every operation the dense layer needs is folded into this single bound so
/// that `Mat<T>` impl blocks stay readable. The `Send + Sync + 'static`
/// requirements let matrices travel inside shared, lockable storage.
pub trait Element: Float + NumAssign + Sum + Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Float + NumAssign + Sum + Debug + Send + Sync + 'static {}

/// The scalar type used throughout the module layer.
///
/// The dense layer stays generic over [`Element`]; everything above it
/// (variables, modules, the gradient checker) is instantiated at `f64` so
/// that central-difference estimates keep enough precision at small epsilon.
pub type Real = f64;

/// A dense matrix of [`Real`] elements, the tensor type the module layer
/// exchanges. Vectors are represented as `n x 1` matrices.
pub type Matrix = crate::dense::Mat<Real>;
