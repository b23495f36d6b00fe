//! The module layer: contracts, concrete layers and composites.

pub mod activation;
pub mod concat;
pub mod criterion;
pub mod join;
pub mod linear;
pub mod module;
pub mod parameterized;
pub mod reshape;
pub mod sequence;

pub use activation::SigmoidModule;
pub use concat::{ConcatModule, InputModule};
pub use criterion::{Criterion, SquaredErrorLoss};
pub use join::JoinModule;
pub use linear::{LinearModule, LinearParams, TransposedLinearModule};
pub use module::{Differentiable, Forward, ParameterList};
pub use parameterized::{Gradient, NoParams, Op, ParameterBundle, ParameterizedModule};
pub use reshape::ReshapeModule;
pub use sequence::SequenceModule;
