use crate::dataset::ClassifiedSeries;
use crate::errors::{GmmError, Result};
use crate::mixture::Mixture;
use crate::parameters::GmmParams;
use linfa::Float;
use log::trace;
use ndarray::{s, Array1, Array2, Array3, Axis};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;

/// Gaussian mixture model estimator driven by Expectation-Maximization.
///
/// The estimator owns the flattened point store, the current mixture and the
/// responsibility matrix of the last E-step. Iteration is caller-driven:
/// each [`Gmm::iterate`] step runs one E-step then one M-step, and a step is
/// committed only once both halves succeed, so a failed call leaves the
/// previous valid state in place and the caller may re-initialize with a
/// different seed or a smaller number of clusters.
#[derive(Debug)]
pub struct Gmm<F: Float> {
    points: Array2<F>,
    mixture: Mixture<F>,
    responsibilities: Option<Array2<F>>,
}

impl<F: Float> Gmm<F> {
    /// Parameters constructor with an entropy-seeded random generator.
    pub fn params(n_clusters: usize) -> GmmParams<F, Xoshiro256Plus> {
        GmmParams::new(n_clusters)
    }

    pub(crate) fn from_parts(points: Array2<F>, mixture: Mixture<F>) -> Gmm<F> {
        Gmm {
            points,
            mixture,
            responsibilities: None,
        }
    }

    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    pub fn n_clusters(&self) -> usize {
        self.mixture.n_clusters()
    }

    pub fn points(&self) -> &Array2<F> {
        &self.points
    }

    pub fn mixture(&self) -> &Mixture<F> {
        &self.mixture
    }

    /// Responsibility matrix committed by the last E-step, if any step has
    /// run yet.
    pub fn responsibilities(&self) -> Option<&Array2<F>> {
        self.responsibilities.as_ref()
    }

    /// Run `steps` EM iterations, each one E-step followed by one M-step.
    pub fn iterate(&mut self, steps: usize) -> Result<()> {
        if steps == 0 {
            return Err(GmmError::InvalidArgument(
                "steps must be a positive integer".to_string(),
            ));
        }
        for step in 0..steps {
            let responsibilities = self.expectation()?;
            let mixture = self.maximization(&responsibilities)?;
            self.responsibilities = Some(responsibilities);
            self.mixture = mixture;
            trace!("EM step {} committed", step);
        }
        Ok(())
    }

    // E-step: posterior membership probabilities of every point for every
    // component, normalized by the mixture density of the point.
    fn expectation(&self) -> Result<Array2<F>> {
        let weighted = self.mixture.weighted_densities(&self.points)?;
        let norm = weighted.sum_axis(Axis(1));
        if let Some(n) = norm.iter().position(|v| !(*v > F::zero())) {
            return Err(GmmError::NumericalInstability(format!(
                "mixture density underflowed to zero for point #{}",
                n
            )));
        }
        Ok(&weighted / &norm.insert_axis(Axis(1)))
    }

    // M-step: closed-form weight/mean/covariance updates, all read from the
    // same frozen responsibility snapshot. The returned mixture is fully
    // validated (every covariance factorized) before the caller commits it.
    fn maximization(&self, responsibilities: &Array2<F>) -> Result<Mixture<F>> {
        let nk = responsibilities.sum_axis(Axis(0));
        if nk.min().unwrap() < &(F::cast(10.) * F::epsilon()) {
            return Err(GmmError::NumericalInstability(format!(
                "cluster #{} has no more point. Consider decreasing number of clusters \
                 or changing initialization.",
                nk.argmin().unwrap() + 1
            )));
        }

        let nk_col = nk.to_owned().insert_axis(Axis(1));
        let means = responsibilities.t().dot(&self.points) / nk_col;

        let n_features = self.points.ncols();
        let mut covariances = Array3::zeros((self.n_clusters(), n_features, n_features));
        for k in 0..self.n_clusters() {
            let diff = &self.points - &means.row(k);
            let weighted = &diff.t() * &responsibilities.index_axis(Axis(1), k);
            covariances
                .slice_mut(s![k, .., ..])
                .assign(&(weighted.dot(&diff) / nk[k]));
        }

        let weights = nk.mapv(|v| v / F::cast(self.n_points() as f64));
        Mixture::new(weights, means, covariances)
    }

    /// Data log-likelihood of the current mixture, the EM objective.
    pub fn log_likelihood(&self) -> Result<F> {
        self.mixture.log_likelihood(&self.points)
    }

    /// Hard cluster label per point: `argmax_k` of the responsibilities,
    /// ties broken by the lowest index. Uses the responsibilities of the
    /// last E-step, or recomputes them from the current mixture when no
    /// step has run yet.
    pub fn predict(&self) -> Result<Array1<usize>> {
        let labels = match self.responsibilities.as_ref() {
            Some(responsibilities) => hard_labels(responsibilities),
            None => hard_labels(&self.expectation()?),
        };
        Ok(labels)
    }

    /// Classified view for presentation: one point series per cluster plus
    /// the current component means. Recomputed on demand, never persisted.
    pub fn classified_series(&self) -> Result<ClassifiedSeries<F>> {
        let labels = self.predict()?;
        Ok(ClassifiedSeries::new(
            &self.points,
            &labels,
            self.mixture.means(),
        ))
    }
}

fn hard_labels<F: Float>(responsibilities: &Array2<F>) -> Array1<usize> {
    responsibilities.map_axis(Axis(1), |row| row.argmax().unwrap_or(0))
}
