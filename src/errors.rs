use thiserror::Error;

/// A result type for GMM estimation
pub type Result<T> = std::result::Result<T, GmmError>;

/// An error when fitting a Gaussian mixture model
#[derive(Error, Debug)]
pub enum GmmError {
    /// When construction input is malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// When matrix shapes disagree
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// When the model reaches a numerically degenerate state
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

// The only linear algebra performed is the factorization of a covariance,
// so a linalg failure is by contract a singular covariance.
impl From<linfa_linalg::LinalgError> for GmmError {
    fn from(error: linfa_linalg::LinalgError) -> GmmError {
        GmmError::NumericalInstability(error.to_string())
    }
}
