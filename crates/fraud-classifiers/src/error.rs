use std::error::Error;
use std::fmt;

/// Domain failures raised by the pipeline.
///
/// Public functions return `anyhow::Result`; these variants travel inside the
/// `anyhow::Error` and can be recovered with `downcast_ref::<PipelineError>()`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Named column is not present in the dataset header
    MissingColumn(String),
    /// Label value outside {0, 1}
    NonBinaryLabel { row: usize, value: f64 },
    /// Two row-aligned inputs disagree in length
    LengthMismatch { expected: usize, actual: usize },
    /// Operation received no rows
    EmptyInput(&'static str),
    /// A class has too few members for a stratified split
    InsufficientClassMembers { class: i32, count: usize },
    /// A class has too few members for SMOTE neighbour search
    InsufficientNeighbors { class: i32, n_samples: usize, k_neighbors: usize },
    /// `predict`/`predict_proba` called before `fit`
    ModelNotFitted(String),
    /// Feature count differs from the one seen during fit
    FeatureMismatch { expected: usize, actual: usize },
    /// Operation needs both classes but only one is present
    SingleClass(&'static str),
    InvalidParameter(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::MissingColumn(name) => {
                write!(f, "Column '{}' not found in dataset", name)
            }
            PipelineError::NonBinaryLabel { row, value } => write!(
                f,
                "Label at row {} is {}, expected 0 or 1",
                row + 1,
                value
            ),
            PipelineError::LengthMismatch { expected, actual } => write!(
                f,
                "Inputs must have equal length: expected {}, got {}",
                expected, actual
            ),
            PipelineError::EmptyInput(what) => write!(f, "{} must not be empty", what),
            PipelineError::InsufficientClassMembers { class, count } => write!(
                f,
                "The least populated class in y ({}) has only {} member(s), which is too few. \
                 The minimum number of members in any class cannot be less than 2",
                class, count
            ),
            PipelineError::InsufficientNeighbors {
                class,
                n_samples,
                k_neighbors,
            } => write!(
                f,
                "Class {} has {} sample(s) but SMOTE needs more than k_neighbors = {}",
                class, n_samples, k_neighbors
            ),
            PipelineError::ModelNotFitted(name) => write!(
                f,
                "This {} instance is not fitted yet. Call 'fit' before using this model",
                name
            ),
            PipelineError::FeatureMismatch { expected, actual } => write!(
                f,
                "X has {} features, but the model was fitted with {} features",
                actual, expected
            ),
            PipelineError::SingleClass(context) => write!(
                f,
                "Only one class present in y_true: {} is not defined in that case",
                context
            ),
            PipelineError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl Error for PipelineError {}
