//! This library fits a Gaussian Mixture Model (GMM) on planar point clouds
//! with the Expectation-Maximization (EM) algorithm.
//!
//! The estimator is caller-driven: construction extracts the points of a
//! [`PointSource`] and draws a random starting mixture from them, then each
//! [`Gmm::iterate`] call alternates the E-step (posterior membership
//! responsibilities) and the M-step (weight, mean and covariance
//! re-estimation). The data log-likelihood, the EM objective, can be queried
//! at any time and is non-decreasing across iterations. A hard-labeled view
//! of the points, one series per cluster plus the current centers, is
//! available for an external charting collaborator.
//!
//! # Implementation
//!
//! * Mixture state is held in [ndarray](https://docs.rs/ndarray/latest/ndarray/)
//!   arrays; each component covariance is Cholesky-factorized with
//!   [linfa-linalg](https://docs.rs/linfa-linalg/latest/linfa_linalg/) when a
//!   mixture is committed, so density evaluation only costs one triangular
//!   product per point.
//! * Degenerate numerical situations (singular covariance, component with no
//!   remaining point, mixture density underflow) surface as
//!   [`GmmError::NumericalInstability`]; the model is never silently
//!   regularized, and a failed [`Gmm::iterate`] call leaves the previous
//!   valid state intact so the caller can restart with another seed or
//!   fewer clusters.
//! * Initialization randomness is injectable through
//!   [`GmmParams::with_rng`] for reproducibility.
//!
//! # Example
//!
//! ```no_run
//! use gmix::Gmm;
//! use ndarray::array;
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! // two point series, one per physical cluster
//! let series = vec![
//!     array![[-5.2, -4.8], [-4.9, -5.1], [-5.0, -4.6], [-4.7, -5.3]],
//!     array![[4.8, 5.1], [5.3, 4.9], [5.0, 5.2], [4.6, 4.8]],
//! ];
//! let rng = Xoshiro256Plus::seed_from_u64(42);
//! let mut gmm = Gmm::params(2).set_bound(10.).with_rng(rng).fit(&series)?;
//! gmm.iterate(20)?;
//! println!("log-likelihood = {}", gmm.log_likelihood()?);
//! let classified = gmm.classified_series()?;
//! for k in 0..classified.n_clusters() {
//!     println!("cluster {}: {} points", k, classified.cluster(k).nrows());
//! }
//! # Ok::<(), gmix::GmmError>(())
//! ```
mod algorithm;
mod dataset;
mod errors;
mod mixture;
mod multivariate_normal;
mod parameters;

pub use algorithm::*;
pub use dataset::*;
pub use errors::*;
pub use mixture::*;
pub use multivariate_normal::*;
pub use parameters::*;
