use std::fmt;

/// Describes the extent of a tensor handled by the module layer.
///
/// The variant carries the dimensionality explicitly: a `Vector` is a
/// one-dimensional extent, a `Matrix` a two-dimensional one. There is no
/// implicit numeric conversion between the two; code that needs to treat an
/// `n x 1` matrix and a length-`n` vector as the same extent goes through
/// [`Shape::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// One-dimensional extent of the given length.
    Vector(usize),
    /// Two-dimensional extent, `rows x cols`.
    Matrix(usize, usize),
}

impl Shape {
    /// Number of dimensions (1 or 2).
    pub fn dims(&self) -> usize {
        match self {
            Shape::Vector(_) => 1,
            Shape::Matrix(_, _) => 2,
        }
    }

    /// Total number of scalar elements.
    pub fn numel(&self) -> usize {
        match self {
            Shape::Vector(n) => *n,
            Shape::Matrix(rows, cols) => rows * cols,
        }
    }

    /// Extent along the primary axis. Vectors report their length.
    pub fn rows(&self) -> usize {
        match self {
            Shape::Vector(n) => *n,
            Shape::Matrix(rows, _) => *rows,
        }
    }

    /// Extent along the secondary axis. Vectors report 1.
    pub fn cols(&self) -> usize {
        match self {
            Shape::Vector(_) => 1,
            Shape::Matrix(_, cols) => *cols,
        }
    }

    /// Canonical form: a single-column matrix collapses to a vector.
    ///
    /// Storage does not distinguish an `n x 1` matrix from a length-`n`
    /// vector, so shape comparisons in module wiring go through this form.
    pub fn canonical(self) -> Shape {
        match self {
            Shape::Matrix(rows, 1) => Shape::Vector(rows),
            other => other,
        }
    }

    /// Semantic equality used by shape validation: structural equality up to
    /// the `n x 1` / length-`n` canonicalization.
    pub fn matches(&self, other: &Shape) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Vector(n) => write!(f, "({})", n),
            Shape::Matrix(rows, cols) => write!(f, "({}, {})", rows, cols),
        }
    }
}
