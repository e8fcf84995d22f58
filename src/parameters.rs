use crate::algorithm::Gmm;
use crate::dataset::{flatten_series, PointSource};
use crate::errors::Result;
use crate::mixture::Mixture;
use linfa::Float;
use log::debug;
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Parameters of the GMM estimator: number of components, coordinate bound
/// for the random starting means, and the random generator used for
/// reproducibility.
pub struct GmmParams<F: Float, R: Rng + Clone> {
    n_clusters: usize,
    bound: F,
    rng: R,
}

impl<F: Float> GmmParams<F, Xoshiro256Plus> {
    pub fn new(n_clusters: usize) -> GmmParams<F, Xoshiro256Plus> {
        Self::new_with_rng(n_clusters, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng + Clone> GmmParams<F, R> {
    pub fn new_with_rng(n_clusters: usize, rng: R) -> GmmParams<F, R> {
        GmmParams {
            n_clusters,
            bound: F::cast(10.),
            rng,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn bound(&self) -> F {
        self.bound
    }

    /// Set the half-width `B` of the `[-B, B]` square the starting means are
    /// drawn from.
    pub fn set_bound(mut self, bound: F) -> Self {
        self.bound = bound;
        self
    }

    /// Set the random generator used to draw the starting mixture.
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> GmmParams<F, R2> {
        GmmParams {
            n_clusters: self.n_clusters,
            bound: self.bound,
            rng,
        }
    }

    /// Extract the points of `source` and build an estimator with a random
    /// starting mixture.
    pub fn fit(&self, source: &impl PointSource<F>) -> Result<Gmm<F>> {
        let points = flatten_series(source)?;
        let mut rng = self.rng.clone();
        debug!(
            "GMM fit: {} points, {} clusters, bound {}",
            points.nrows(),
            self.n_clusters,
            self.bound
        );
        let mixture = Mixture::random_init(&points, self.n_clusters, self.bound, &mut rng)?;
        Ok(Gmm::from_parts(points, mixture))
    }
}
