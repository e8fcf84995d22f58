use crate::errors::{GmmError, Result};
use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// A single multivariate normal distribution `N(mean, covariance)`.
///
/// The covariance is factorized once at construction: the upper triangular
/// Cholesky factor of the precision matrix and its log determinant are kept
/// so that a density evaluation only costs one triangular product per point.
/// Construction fails when the covariance is not square, does not match the
/// mean, or is singular.
#[derive(Debug)]
pub struct MultivariateNormal<F: Float> {
    mean: Array1<F>,
    covariance: Array2<F>,
    precision_chol: Array2<F>,
    log_det: F,
}

impl<F: Float> Clone for MultivariateNormal<F> {
    fn clone(&self) -> Self {
        Self {
            mean: self.mean.to_owned(),
            covariance: self.covariance.to_owned(),
            precision_chol: self.precision_chol.to_owned(),
            log_det: self.log_det,
        }
    }
}

impl<F: Float> MultivariateNormal<F> {
    pub fn new(mean: Array1<F>, covariance: Array2<F>) -> Result<MultivariateNormal<F>> {
        let n_features = mean.len();
        if covariance.nrows() != covariance.ncols() {
            return Err(GmmError::DimensionMismatch(format!(
                "covariance must be square, got {}x{}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if covariance.nrows() != n_features {
            return Err(GmmError::DimensionMismatch(format!(
                "mean has {} coordinates but covariance is {}x{}",
                n_features,
                covariance.nrows(),
                covariance.ncols()
            )));
        }

        let covariance_chol = covariance.cholesky()?;
        // A zero pivot passes the factorization but makes the determinant
        // vanish; reject it before the triangular solve divides by it.
        if covariance_chol
            .diag()
            .iter()
            .any(|d| !(*d > F::zero()) || !d.is_finite())
        {
            return Err(GmmError::NumericalInstability(
                "covariance matrix is singular (determinant is zero)".to_string(),
            ));
        }
        let sol = covariance_chol.solve_triangular(&Array::eye(n_features), UPLO::Lower)?;
        let precision_chol = sol.t().to_owned();
        // ln det(precision_chol) = -0.5 * ln det(covariance)
        let log_det = precision_chol.diag().mapv(|v| v.ln()).sum();

        Ok(MultivariateNormal {
            mean,
            covariance,
            precision_chol,
            log_det,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<F> {
        &self.covariance
    }

    /// Density of the distribution at a single point.
    pub fn pdf<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Result<F> {
        let x = x.to_owned().insert_axis(Axis(0));
        Ok(self.pdfs(&x)?[0])
    }

    /// Densities of the distribution at each row of `x`.
    pub fn pdfs<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Result<Array1<F>> {
        if x.ncols() != self.dim() {
            return Err(GmmError::DimensionMismatch(format!(
                "points have {} coordinates, distribution has {}",
                x.ncols(),
                self.dim()
            )));
        }
        // (x - mean).L^-T has the squared Mahalanobis distance as row norm
        let diff = (&x.to_owned() - &self.mean).dot(&self.precision_chol);
        let quad = diff.mapv(|v| v * v).sum_axis(Axis(1));
        let cst = F::cast(self.dim() as f64 * f64::ln(2. * std::f64::consts::PI));
        let minus_half = F::cast(-0.5);
        let log_det = self.log_det;
        Ok(quad.mapv(|v| (minus_half * (v + cst) + log_det).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array1, Array2};

    fn check_pdf(mean: Array1<f64>, covariance: Array2<f64>, x: Array1<f64>, expected: f64) {
        let mvn = MultivariateNormal::new(mean, covariance).unwrap();
        assert_abs_diff_eq!(expected, mvn.pdf(&x).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_pdf_at_mean() {
        // no exponential term at the mean: 1 / ((2 pi)^(d/2) sqrt(det))
        check_pdf(
            array![0., 0.],
            array![[1., 0.], [0., 1.]],
            array![0., 0.],
            1. / (2. * std::f64::consts::PI),
        );
    }

    #[test]
    fn test_pdf() {
        check_pdf(
            array![0., 0.],
            array![[1., 0.], [0., 1.]],
            array![1., 1.],
            0.05854983152431917,
        );
        check_pdf(
            array![0., 0.],
            array![[1., 0.], [0., 1.]],
            array![1., 2.],
            0.013064233284684921,
        );
        check_pdf(
            array![0.5, -0.2],
            array![[2.0, 0.3], [0.3, 0.5]],
            array![-1., 2.],
            0.00014842259203296995,
        );
    }

    #[test]
    fn test_pdfs_matches_pdf() {
        let mvn =
            MultivariateNormal::new(array![1., -1.], array![[2., 0.5], [0.5, 1.]]).unwrap();
        let x = array![[0., 0.], [1., -1.], [3., 2.]];
        let all = mvn.pdfs(&x).unwrap();
        for (row, expected) in x.rows().into_iter().zip(all.iter()) {
            assert_abs_diff_eq!(mvn.pdf(&row).unwrap(), *expected, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let err = MultivariateNormal::new(array![0., 0.], Array::eye(3)).unwrap_err();
        assert!(matches!(err, GmmError::DimensionMismatch(_)));

        let err =
            MultivariateNormal::new(array![0., 0.], Array::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, GmmError::DimensionMismatch(_)));

        let mvn = MultivariateNormal::new(array![0., 0.], Array::eye(2)).unwrap();
        let err = mvn.pdf(&array![0., 0., 0.]).unwrap_err();
        assert!(matches!(err, GmmError::DimensionMismatch(_)));
    }

    #[test]
    fn test_singular_covariance() {
        // rank one
        let err =
            MultivariateNormal::new(array![0., 0.], array![[1., 1.], [1., 1.]]).unwrap_err();
        assert!(matches!(err, GmmError::NumericalInstability(_)));
        // indefinite
        let err =
            MultivariateNormal::new(array![0., 0.], array![[1., 2.], [2., 1.]]).unwrap_err();
        assert!(matches!(err, GmmError::NumericalInstability(_)));
    }
}
