use crate::errors::{GmmError, Result};
use crate::multivariate_normal::MultivariateNormal;
use linfa::Float;
use ndarray::{s, Array1, Array2, Array3, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::Rng, rand_distr::Uniform, RandomExt};

/// A Gaussian mixture: component weights plus one validated normal
/// distribution per component.
///
/// Committing a `Mixture` proves it is usable: the constructor factorizes
/// every covariance, so a singular component is rejected before it can
/// replace a valid model state.
#[derive(Debug)]
pub struct Mixture<F: Float> {
    weights: Array1<F>,
    components: Vec<MultivariateNormal<F>>,
}

impl<F: Float> Clone for Mixture<F> {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.to_owned(),
            components: self.components.clone(),
        }
    }
}

impl<F: Float> Mixture<F> {
    pub fn new(
        weights: Array1<F>,
        means: Array2<F>,
        covariances: Array3<F>,
    ) -> Result<Mixture<F>> {
        let n_clusters = weights.len();
        if n_clusters == 0 {
            return Err(GmmError::InvalidArgument(
                "mixture must have at least one component".to_string(),
            ));
        }
        if means.nrows() != n_clusters || covariances.shape()[0] != n_clusters {
            return Err(GmmError::InvalidArgument(format!(
                "mismatched component counts: {} weights, {} means, {} covariances",
                n_clusters,
                means.nrows(),
                covariances.shape()[0]
            )));
        }
        let mut components = Vec::with_capacity(n_clusters);
        for (mean, covariance) in means.rows().into_iter().zip(covariances.outer_iter()) {
            components.push(MultivariateNormal::new(
                mean.to_owned(),
                covariance.to_owned(),
            )?);
        }
        Ok(Mixture {
            weights,
            components,
        })
    }

    /// Draw a starting mixture for `n_clusters` components from the data.
    ///
    /// Means are drawn uniformly at random within `[-bound, bound]` on each
    /// coordinate, weights are all `1 / n_clusters`, and each component
    /// covariance is the coarse global scatter of all points around that
    /// component's mean, averaged by the point count.
    pub fn random_init<D: Data<Elem = F>, R: Rng + ?Sized>(
        points: &ArrayBase<D, Ix2>,
        n_clusters: usize,
        bound: F,
        rng: &mut R,
    ) -> Result<Mixture<F>> {
        let n_samples = points.nrows();
        let n_features = points.ncols();
        if n_samples == 0 {
            return Err(GmmError::InvalidArgument("empty point set".to_string()));
        }
        if n_clusters == 0 {
            return Err(GmmError::InvalidArgument(
                "number of clusters must be at least 1".to_string(),
            ));
        }
        if !(bound > F::zero()) {
            return Err(GmmError::InvalidArgument(format!(
                "coordinate bound must be positive, got {}",
                bound
            )));
        }

        let means = Array2::random_using((n_clusters, n_features), Uniform::new(0., 1.), rng)
            .mapv(|v| F::cast(2. * v - 1.) * bound);
        let weights = Array1::from_elem(n_clusters, F::one() / F::cast(n_clusters as f64));
        let mut covariances = Array3::zeros((n_clusters, n_features, n_features));
        for k in 0..n_clusters {
            let diff = &points.to_owned() - &means.row(k);
            covariances
                .slice_mut(s![k, .., ..])
                .assign(&(diff.t().dot(&diff) / F::cast(n_samples as f64)));
        }
        Self::new(weights, means, covariances)
    }

    pub fn n_clusters(&self) -> usize {
        self.weights.len()
    }

    pub fn dim(&self) -> usize {
        self.components[0].dim()
    }

    pub fn weights(&self) -> &Array1<F> {
        &self.weights
    }

    pub fn component(&self, k: usize) -> &MultivariateNormal<F> {
        &self.components[k]
    }

    /// Component means stacked as a `(n_clusters, dim)` array.
    pub fn means(&self) -> Array2<F> {
        let mut means = Array2::zeros((self.n_clusters(), self.dim()));
        for (mut row, component) in means.rows_mut().into_iter().zip(&self.components) {
            row.assign(component.mean());
        }
        means
    }

    /// Component covariances stacked as a `(n_clusters, dim, dim)` array.
    pub fn covariances(&self) -> Array3<F> {
        let mut covariances = Array3::zeros((self.n_clusters(), self.dim(), self.dim()));
        for (k, component) in self.components.iter().enumerate() {
            covariances
                .slice_mut(s![k, .., ..])
                .assign(component.covariance());
        }
        covariances
    }

    /// Per-point, per-component weighted densities `pi_k * N(x_n; mu_k, Sigma_k)`
    /// as a `(n_points, n_clusters)` array.
    pub fn weighted_densities<D: Data<Elem = F>>(
        &self,
        points: &ArrayBase<D, Ix2>,
    ) -> Result<Array2<F>> {
        let mut densities = Array2::zeros((points.nrows(), self.n_clusters()));
        for (k, (weight, component)) in self.weights.iter().zip(&self.components).enumerate() {
            let pdf = component.pdfs(points)?;
            densities.column_mut(k).assign(&pdf.mapv(|v| v * *weight));
        }
        Ok(densities)
    }

    /// Data log-likelihood `sum_n ln sum_k pi_k N(x_n; mu_k, Sigma_k)`.
    pub fn log_likelihood<D: Data<Elem = F>>(&self, points: &ArrayBase<D, Ix2>) -> Result<F> {
        let density = self.weighted_densities(points)?.sum_axis(Axis(1));
        if let Some(n) = density.iter().position(|v| !(*v > F::zero())) {
            return Err(GmmError::NumericalInstability(format!(
                "mixture density underflowed to zero for point #{}",
                n
            )));
        }
        Ok(density.mapv(|v| v.ln()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    fn square_corners() -> Array2<f64> {
        array![[0., 0.], [0., 2.], [2., 0.], [2., 2.]]
    }

    #[test]
    fn test_random_init() {
        let points = square_corners();
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let mixture = Mixture::random_init(&points, 3, 5., &mut rng).unwrap();

        assert_eq!(3, mixture.n_clusters());
        assert_abs_diff_eq!(1., mixture.weights().sum(), epsilon = 1e-9);
        for w in mixture.weights() {
            assert_abs_diff_eq!(1. / 3., *w, epsilon = 1e-9);
        }

        let means = mixture.means();
        for m in means.iter() {
            assert!((-5. ..=5.).contains(m));
        }

        // each covariance is the global scatter around the drawn mean
        for k in 0..3 {
            let diff = &points - &means.row(k);
            let expected = diff.t().dot(&diff) / 4.;
            assert_abs_diff_eq!(expected, *mixture.component(k).covariance(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_random_init_bad_args() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let empty: Array2<f64> = Array2::zeros((0, 2));
        let err = Mixture::random_init(&empty, 2, 5., &mut rng).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));

        let err = Mixture::random_init(&square_corners(), 0, 5., &mut rng).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));

        let err = Mixture::random_init(&square_corners(), 2, -1., &mut rng).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));
    }

    #[test]
    fn test_new_mismatched_counts() {
        let err = Mixture::new(
            array![0.5, 0.5],
            array![[0., 0.]],
            array![[[1., 0.], [0., 1.]]],
        )
        .unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));
    }

    #[test]
    fn test_log_likelihood_single_gaussian() {
        let mixture = Mixture::new(
            array![1.],
            array![[0., 0.]],
            array![[[1., 0.], [0., 1.]]],
        )
        .unwrap();
        let points = array![[0., 0.]];
        // ln pdf at the mean of a unit gaussian: -ln(2 pi)
        assert_abs_diff_eq!(
            -f64::ln(2. * std::f64::consts::PI),
            mixture.log_likelihood(&points).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_weighted_densities_symmetry() {
        let mixture = Mixture::new(
            array![0.5, 0.5],
            array![[-1., 0.], [1., 0.]],
            array![[[1., 0.], [0., 1.]], [[1., 0.], [0., 1.]]],
        )
        .unwrap();
        // a point equidistant from both components splits evenly
        let densities = mixture.weighted_densities(&array![[0., 0.]]).unwrap();
        assert_abs_diff_eq!(densities[[0, 0]], densities[[0, 1]], epsilon = 1e-15);
    }
}
