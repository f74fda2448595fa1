use thiserror::Error;

/// Two rules (or the variables carrying them) were asked to merge but do not
/// describe compatible sub-domains.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot merge `{left}` with `{right}`")]
pub struct IncompatibleRuleError {
    pub left: String,
    pub right: String,
}

impl IncompatibleRuleError {
    pub fn new<L: ToString, R: ToString>(left: &L, right: &R) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// A rule could not be constructed from the given bounds or values
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidRuleError {
    /// Neither bound of an interval was set
    #[error("an interval rule needs at least one bound")]
    UnboundedInterval,
    /// An interval bound was NaN
    #[error("interval bounds cannot be NaN")]
    NanBound,
    /// The lower bound was not below the upper bound
    #[error("interval lower bound {lower} must be below upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },
    /// A one-of rule was given no values
    #[error("a one-of rule needs at least one value")]
    EmptyValueSet,
}

/// Inputs that must agree in shape did not
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeMismatchError {
    /// A density grid must hold `n * n` points
    #[error("a grid with {n_points} points is not square")]
    NonSquareGrid { n_points: usize },
    /// Grid points must be listed x-major over strictly ascending axes
    #[error("grid point {index} breaks the x-major ascending grid order")]
    UnorderedGrid { index: usize },
    /// Density values must align with grid points
    #[error("{n_values} density values for {n_points} grid points")]
    ValuesLength { n_points: usize, n_values: usize },
    /// Composite densities require identical grids
    #[error("density {index} does not share the composite's grid")]
    GridMismatch { index: usize },
    /// A composite needs at least one member
    #[error("cannot build a composite from zero members")]
    EmptyComposite,
    /// Per-sample weights must align with embedding coordinates
    #[error("{n_weights} weights for {n_points} embedding points")]
    WeightsLength { n_points: usize, n_weights: usize },
    /// A feature column does not match the table's number of samples
    #[error(
        "column `{variable}` has {found} values but the table has {expected} \
         samples"
    )]
    ColumnLength {
        variable: String,
        expected: usize,
        found: usize,
    },
    /// The adjacency graph covers a different number of samples
    #[error("adjacency over {n_nodes} samples but values for {n_values}")]
    AdjacencyLength { n_nodes: usize, n_values: usize },
}
